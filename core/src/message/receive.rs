//! message/receive.rs
//!
//! Message opening.
//!
//! Design notes:
//! - `decode` reads the prefix and the header item only; the body stays in the reader.
//! - Every secret the header calls for is resolved before any cryptographic work, so a
//!   missing passphrase or key costs nothing and leaves the reader untouched.
//! - Plaintext reaches the sink while it streams. It is untrusted until `decrypt`
//!   returns `Ok`; tag, signature and body errors are joined, never short-circuited.

use std::io::{self, BufReader, Read, Write};

use zeroize::Zeroizing;

use crate::compression::DecompressingReader;
use crate::crypto::{tags_match, Fingerprint, KeyProvider, PassphraseProvider, PrivateKey, PublicKey};
use crate::encryption::{EncryptionMethod, Unlock};
use crate::message::auth::{verifier_digest, Auth};
use crate::message::envelope::{ChunkReader, FrameError};
use crate::message::header::Header;
use crate::message::stages::{close_readers, BoxedReader, DecryptingReader, VerifyingWriter};
use crate::message::wire::{self, PacketType};
use crate::scheme::Schemes;
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::{MessageError, MissingSecret};
use crate::utils::now_unix;

/// Secrets and policy for opening one message.
#[derive(Default)]
pub struct DecryptOptions<'k> {
    passphrase: Option<Box<dyn PassphraseProvider + 'k>>,
    recipient: Option<PrivateKey>,
    keys: Option<&'k dyn KeyProvider>,
    derived_key: Option<Zeroizing<Vec<u8>>>,
    issuer: Option<PublicKey>,
    require_signature: bool,
    now: Option<i64>,
}

impl<'k> DecryptOptions<'k> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consulted only when the message is passphrase-encrypted.
    pub fn passphrase(mut self, provider: impl PassphraseProvider + 'k) -> Self {
        self.passphrase = Some(Box::new(provider));
        self
    }

    /// KEM key for secret encryption, PKE key for group encryption. Used as given.
    pub fn recipient(mut self, key: PrivateKey) -> Self {
        self.recipient = Some(key);
        self
    }

    /// Fallback lookup for recipient and issuer keys by fingerprint.
    pub fn keys(mut self, keys: &'k dyn KeyProvider) -> Self {
        self.keys = Some(keys);
        self
    }

    pub fn derived_key(mut self, key: &[u8]) -> Self {
        self.derived_key = Some(Zeroizing::new(key.to_vec()));
        self
    }

    pub fn issuer(mut self, key: PublicKey) -> Self {
        self.issuer = Some(key);
        self
    }

    /// Fail instead of reporting `Unverified` when no issuer key is available.
    pub fn require_signature(mut self, required: bool) -> Self {
        self.require_signature = required;
        self
    }

    /// Clock used for the signature validity window; defaults to the system clock.
    pub fn now(mut self, unix: i64) -> Self {
        self.now = Some(unix);
        self
    }

    fn issuer_key(&self, sender: &Fingerprint) -> Option<&PublicKey> {
        self.issuer.as_ref().or_else(|| self.keys.and_then(|k| k.public_key(sender)))
    }

    fn recipient_key(&self, candidates: &[Fingerprint]) -> Option<&PrivateKey> {
        if let Some(key) = &self.recipient {
            return Some(key);
        }
        let keys = self.keys?;
        candidates.iter().find_map(|fp| keys.private_key(fp))
    }

    fn unlock(&self, header: &Header) -> Result<Option<Unlock<'_>>, MessageError> {
        let Some(encryption) = &header.encryption else {
            return Ok(None);
        };
        let unlock = match &encryption.method {
            EncryptionMethod::Passphrase { .. } => {
                let provider =
                    self.passphrase.as_ref().ok_or(MessageError::MissingSecret(MissingSecret::Passphrase))?;
                Unlock::Passphrase(provider.passphrase()?)
            }
            EncryptionMethod::Secret { recipient, .. } => Unlock::Recipient(
                self.recipient_key(std::slice::from_ref(recipient))
                    .ok_or(MessageError::MissingSecret(MissingSecret::RecipientKey))?,
            ),
            EncryptionMethod::Group { .. } => Unlock::Recipient(
                self.recipient_key(&encryption.bound_recipients())
                    .ok_or(MessageError::MissingSecret(MissingSecret::RecipientKey))?,
            ),
            EncryptionMethod::Derived => Unlock::Derived(
                self.derived_key
                    .as_deref()
                    .map(Vec::as_slice)
                    .ok_or(MessageError::MissingSecret(MissingSecret::DerivedKey))?,
            ),
        };
        Ok(Some(unlock))
    }
}

/// Outcome of signature checking for a message that opened cleanly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verification {
    Verified { issuer: Fingerprint, created: i64, expires: Option<i64> },
    /// Signed, but no issuer key was available to check it.
    Unverified { sender: Fingerprint },
    Unsigned,
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified { .. })
    }
}

#[derive(Debug, Clone)]
pub struct OpenedMessage {
    pub header: Header,
    pub auth: Auth,
    pub verification: Verification,
    pub telemetry: TelemetrySnapshot,
}

/// A record whose header has been read and validated.
pub struct IncomingMessage<'s, R> {
    schemes: &'s Schemes,
    reader: BufReader<R>,
    header: Header,
    header_len: usize,
}

impl<'s, R: Read> IncomingMessage<'s, R> {
    /// Read the record prefix and the header. Unknown scheme names fail here.
    pub fn decode(reader: R, schemes: &'s Schemes) -> Result<Self, MessageError> {
        let mut reader = BufReader::new(reader);
        wire::read_prefix(&mut reader, PacketType::Message)?;
        let (header, len): (Header, usize) = wire::read_item(&mut reader)?;
        header.validate(schemes)?;
        tracing::debug!(
            signed = header.is_signed(),
            encryption = header.encryption.as_ref().map(|e| e.kind()),
            compressed = header.is_compressed(),
            header_len = len,
            "header decoded"
        );
        Ok(Self { schemes, reader, header, header_len: wire::PREFIX_LEN + len })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Stream the plaintext into `sink`, then check the tag and the signature.
    pub fn decrypt<W: Write>(self, options: DecryptOptions<'_>, sink: W) -> Result<OpenedMessage, MessageError> {
        let IncomingMessage { schemes, mut reader, header, header_len } = self;
        let mut timer = TelemetryTimer::new();
        let mut counters = TelemetryCounters::default();
        counters.add_overhead(header_len);

        let issuer = match header.sender.filter(|fp| !fp.is_empty()) {
            Some(sender) => match options.issuer_key(&sender) {
                Some(key) => Some(key),
                None if options.require_signature => {
                    return Err(MessageError::MissingSecret(MissingSecret::IssuerKey))
                }
                None => None,
            },
            None if options.require_signature => {
                tracing::warn!("signature required but message is unsigned");
                return Err(MessageError::SignatureInvalid);
            }
            None => None,
        };
        let digest = match issuer {
            Some(key) => Some(verifier_digest(schemes, key)?),
            None => None,
        };
        let unlock = options.unlock(&header)?;

        let cipher = match (&header.encryption, unlock) {
            (Some(encryption), Some(unlock)) => {
                let context = header.aad_context()?;
                Some(timer.time(Stage::Decrypt, || encryption.open(schemes, unlock, &context))?)
            }
            _ => None,
        };
        let compression = match &header.compression {
            Some(info) => Some(info.resolve(schemes)?),
            None => None,
        };

        let mut errors = Vec::new();
        let mut plaintext = VerifyingWriter::new(sink, digest);
        let outcome = {
            let source: &mut dyn Read = &mut reader;
            let mut chain: BoxedReader<'_> = ChunkReader::boxed(source);
            if let Some(cipher) = cipher {
                chain = Box::new(DecryptingReader::new(chain, cipher));
            }
            if let Some(scheme) = &compression {
                chain = Box::new(DecompressingReader::new(scheme, chain)?);
            }
            if let Err(e) = io::copy(&mut chain, &mut plaintext) {
                errors.push(MessageError::from(e));
            }
            close_readers(chain)
        };
        let framing_failed = outcome.errors.iter().any(|e| matches!(e, MessageError::Frame(_)));
        errors.extend(outcome.errors);

        let digest = match plaintext.finish() {
            Ok((digest, report)) => {
                counters.record(&report);
                timer.add_stage_time(report.stage.unwrap_or(Stage::Write), report.elapsed);
                digest
            }
            Err(e) => {
                errors.push(e.into());
                None
            }
        };
        for report in &outcome.reports {
            counters.record(report);
            if let Some(stage) = report.stage {
                timer.add_stage_time(stage, report.elapsed);
            }
        }

        // Without a clean terminator the trailer position is unknown.
        let auth = if framing_failed {
            None
        } else {
            match wire::read_item::<_, Auth>(&mut reader) {
                Ok((auth, len)) => {
                    counters.add_overhead(len);
                    Some(auth)
                }
                Err(e) => {
                    errors.push(e);
                    None
                }
            }
        };

        let mut verification = Verification::Unsigned;
        if let Some(auth) = &auth {
            if let Err(e) = check_tag(&header, auth, outcome.tag.as_deref()) {
                errors.push(e);
            }
            match timer.time(Stage::Finalize, || {
                check_signature(&header, auth, issuer, digest.as_deref(), options.now.unwrap_or_else(now_unix))
            }) {
                Ok(v) => verification = v,
                Err(e) => errors.push(e),
            }
        }
        MessageError::join(dedup_frame_errors(errors))?;
        let auth = auth.unwrap_or_default();

        timer.finish();
        let telemetry = TelemetrySnapshot::from(&counters, &timer);
        tracing::debug!(
            plaintext = telemetry.bytes_plaintext,
            chunks = telemetry.chunks,
            verified = verification.is_verified(),
            "message opened"
        );
        Ok(OpenedMessage { header, auth, verification, telemetry })
    }

    /// Open into a fresh buffer.
    pub fn decrypt_to_vec(self, options: DecryptOptions<'_>) -> Result<(Vec<u8>, OpenedMessage), MessageError> {
        let mut out = Vec::new();
        let opened = self.decrypt(options, &mut out)?;
        Ok((out, opened))
    }
}

/// Every stage below a broken frame sees the same failure; report it once.
fn dedup_frame_errors(errors: Vec<MessageError>) -> Vec<MessageError> {
    let mut seen: Vec<FrameError> = Vec::new();
    errors
        .into_iter()
        .filter(|e| match e {
            MessageError::Frame(f) if seen.contains(f) => false,
            MessageError::Frame(f) => {
                seen.push(f.clone());
                true
            }
            _ => true,
        })
        .collect()
}

fn check_tag(header: &Header, auth: &Auth, computed: Option<&[u8]>) -> Result<(), MessageError> {
    match (header.is_encrypted(), computed, auth.tag.as_deref()) {
        (false, _, None) => Ok(()),
        (true, Some(computed), Some(stored)) if tags_match(stored, computed) => Ok(()),
        _ => {
            tracing::warn!(encrypted = header.is_encrypted(), "body tag mismatch");
            Err(MessageError::TagMismatch)
        }
    }
}

fn check_signature(
    header: &Header,
    auth: &Auth,
    issuer: Option<&PublicKey>,
    digest: Option<&[u8]>,
    now: i64,
) -> Result<Verification, MessageError> {
    let sender = match header.sender.filter(|fp| !fp.is_empty()) {
        Some(sender) => sender,
        None if auth.signature.is_none() => return Ok(Verification::Unsigned),
        None => {
            tracing::warn!("signature present on an unsigned header");
            return Err(MessageError::SignatureInvalid);
        }
    };
    let Some(record) = &auth.signature else {
        tracing::warn!(sender = %sender, "signed header without a signature record");
        return Err(MessageError::SignatureInvalid);
    };
    match (issuer, digest) {
        (Some(issuer), Some(digest)) => {
            record.verify(header, issuer, digest, now)?;
            Ok(Verification::Verified { issuer: record.issuer, created: record.created, expires: record.expires })
        }
        _ => Ok(Verification::Unverified { sender }),
    }
}
