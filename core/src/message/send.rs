//! message/send.rs
//!
//! Message construction.
//!
//! Design notes:
//! - `build` does every check that can fail without touching the body: key kinds,
//!   scheme names, compression level, chunk size, and the encrypter itself (the body
//!   cipher and the `Encryption` descriptor exist once `build` returns).
//! - `encode` streams the plaintext once. The signer hashes on the read side; the
//!   writer chain is `envelope <- encrypt <- compress`.
//! - `Auth` is assembled only after the chain has been closed outermost-first.

use std::io::{self, Read, Write};
use std::time::Duration;

use crate::compression::{CompressingWriter, CompressionScheme};
use crate::config::{validate_chunk_size, MessageConfig};
use crate::crypto::{AuthenticatedCipher, PrivateKey};
use crate::encryption::Encrypter;
use crate::message::auth::{Auth, PendingAuth, Signer};
use crate::message::envelope::ChunkWriter;
use crate::message::header::{CompressionInfo, FileInfo, Header};
use crate::message::stages::{close_writers, BoxedWriter, EncryptingWriter, SigningReader};
use crate::message::wire::{self, PacketType};
use crate::scheme::{Algorithm, Schemes};
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::MessageError;
use crate::utils::now_unix;

/// Collects options for one message.
pub struct MessageBuilder<'s> {
    schemes: &'s Schemes,
    config: MessageConfig,
    signer: Option<PrivateKey>,
    expires_in: Option<Duration>,
    compression: Option<(String, Option<i32>)>,
    encrypter: Option<Box<dyn Encrypter + 's>>,
    file: FileInfo,
    time: Option<i64>,
    chunk_size: Option<usize>,
}

impl<'s> MessageBuilder<'s> {
    pub fn new(schemes: &'s Schemes) -> Self {
        Self::with_config(schemes, MessageConfig::default())
    }

    /// Chunk size and default compression come from `config`.
    pub fn with_config(schemes: &'s Schemes, config: MessageConfig) -> Self {
        let compression = config.compression.clone().map(|name| (name, config.compression_level));
        Self {
            schemes,
            config,
            signer: None,
            expires_in: None,
            compression,
            encrypter: None,
            file: FileInfo::default(),
            time: None,
            chunk_size: None,
        }
    }

    pub fn sign(mut self, key: PrivateKey) -> Self {
        self.signer = Some(key);
        self
    }

    /// Signature validity, counted from the message time.
    pub fn expires_in(mut self, validity: Duration) -> Self {
        self.expires_in = Some(validity);
        self
    }

    pub fn compress(mut self, name: &str, level: Option<i32>) -> Self {
        self.compression = Some((name.to_string(), level));
        self
    }

    pub fn no_compression(mut self) -> Self {
        self.compression = None;
        self
    }

    pub fn encrypt(mut self, encrypter: impl Encrypter + 's) -> Self {
        self.encrypter = Some(Box::new(encrypter));
        self
    }

    pub fn file(mut self, file: FileInfo) -> Self {
        self.file = file;
        self
    }

    /// Signing time (unix seconds); defaults to now for signed messages.
    pub fn time(mut self, unix: i64) -> Self {
        self.time = Some(unix);
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }

    /// Validate every option and prepare the body cipher.
    pub fn build<R: Read>(self, reader: R) -> Result<PendingMessage<R>, MessageError> {
        let chunk_size = self.chunk_size.unwrap_or(self.config.chunk_size);
        validate_chunk_size(chunk_size)?;

        let compression = match &self.compression {
            Some((name, level)) => {
                let scheme = self.schemes.compression.by_name(name)?;
                let level = scheme.validate_level(*level)?;
                Some((scheme, level))
            }
            None => None,
        };

        let time = match (&self.signer, self.time) {
            (_, Some(t)) => t,
            (Some(_), None) => now_unix(),
            (None, None) => 0,
        };
        let expires = match self.expires_in {
            Some(validity) => Some(
                i64::try_from(validity.as_secs())
                    .ok()
                    .and_then(|secs| time.checked_add(secs))
                    .ok_or_else(|| MessageError::Config(format!("validity {validity:?} overflows the timestamp")))?,
            ),
            None => None,
        };
        let signer = match self.signer {
            Some(key) => Some(Signer::new(self.schemes, key, time, expires)?),
            None => None,
        };

        let mut header = Header {
            sender: signer.as_ref().map(Signer::issuer),
            time,
            encryption: None,
            compression: compression
                .as_ref()
                .map(|(scheme, level)| CompressionInfo { algorithm: scheme.encode(), level: *level }),
            file: self.file,
        };

        let cipher = match &self.encrypter {
            Some(encrypter) => {
                let context = header.aad_context()?;
                let (cipher, descriptor) = encrypter.encrypt(&context)?;
                header.encryption = Some(descriptor);
                Some(cipher)
            }
            None => None,
        };

        tracing::debug!(
            signed = signer.is_some(),
            encryption = header.encryption.as_ref().map(|e| e.kind()),
            compression = compression.as_ref().map(|(s, _)| s.name()),
            chunk_size,
            "message built"
        );

        Ok(PendingMessage { header, reader, signer, compression, cipher, chunk_size })
    }
}

/// A validated message whose body has not been streamed yet.
pub struct PendingMessage<R> {
    header: Header,
    reader: R,
    signer: Option<Signer>,
    compression: Option<(Algorithm<dyn CompressionScheme>, Option<i32>)>,
    cipher: Option<Box<dyn AuthenticatedCipher>>,
    chunk_size: usize,
}

/// What `encode` wrote, with the finished auth trailer.
#[derive(Debug, Clone)]
pub struct EncodedMessage {
    pub header: Header,
    pub auth: Auth,
    pub telemetry: TelemetrySnapshot,
}

impl<R: Read> PendingMessage<R> {
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Write the full record: prefix, header, body chunks, auth.
    pub fn encode<W: Write>(self, writer: &mut W) -> Result<EncodedMessage, MessageError> {
        let PendingMessage { header, reader, signer, compression, cipher, chunk_size } = self;
        let mut timer = TelemetryTimer::new();
        let mut counters = TelemetryCounters::default();

        counters.add_overhead(wire::write_prefix(writer, PacketType::Message)?);
        counters.add_overhead(timer.time(Stage::Encode, || wire::write_item(writer, &header))?);

        let encrypted = cipher.is_some();
        let mut source = SigningReader::new(reader, signer.as_ref().map(Signer::digest_state));
        let mut errors = Vec::new();
        let outcome = {
            let sink: &mut dyn Write = &mut *writer;
            let mut chain: BoxedWriter<'_> = ChunkWriter::boxed(sink, chunk_size);
            if let Some(cipher) = cipher {
                chain = Box::new(EncryptingWriter::new(chain, cipher));
            }
            if let Some((scheme, level)) = &compression {
                chain = Box::new(CompressingWriter::new(scheme, *level, chain)?);
            }
            if let Err(e) = io::copy(&mut source, &mut chain) {
                errors.push(MessageError::from(e));
            }
            close_writers(chain)
        };
        errors.extend(outcome.errors);
        MessageError::join(errors)?;

        let (digest, read_report) = source.finish();
        counters.record(&read_report);
        timer.add_stage_time(read_report.stage.unwrap_or(Stage::Read), read_report.elapsed);
        for report in &outcome.reports {
            counters.record(report);
            if let Some(stage) = report.stage {
                timer.add_stage_time(stage, report.elapsed);
            }
        }

        if encrypted && outcome.tag.is_none() {
            return Err(MessageError::Config("body cipher closed without a tag".into()));
        }
        let signature = match (&signer, digest) {
            (Some(signer), Some(digest)) => Some(timer.time(Stage::Finalize, || signer.sign(&digest))?),
            _ => None,
        };
        let auth = PendingAuth::closed(outcome.tag, signature).finish();
        counters.add_overhead(wire::write_item(writer, &auth)?);
        writer.flush()?;

        timer.finish();
        let telemetry = TelemetrySnapshot::from(&counters, &timer);
        tracing::debug!(
            plaintext = telemetry.bytes_plaintext,
            output = telemetry.output_bytes(),
            chunks = telemetry.chunks,
            "message encoded"
        );
        Ok(EncodedMessage { header, auth, telemetry })
    }

    /// Encode into a fresh buffer.
    pub fn encode_to_vec(self) -> Result<(Vec<u8>, EncodedMessage), MessageError> {
        let mut out = Vec::new();
        let encoded = self.encode(&mut out)?;
        Ok((out, encoded))
    }
}
