//! message/stages.rs
//!
//! Stream-transform stages and their ordered close.
//!
//! Design notes:
//! - Write path, innermost first: envelope <- encrypt <- compress. Bytes written to the
//!   outermost stage flow inward to the sink.
//! - Read path, innermost first: envelope -> decrypt -> decompress. The outermost reader
//!   is pulled into the plaintext sink.
//! - The signer sits on the plaintext reader (send) and the verifier on the plaintext
//!   writer (receive); neither is part of a chain.
//! - `close` consumes a stage and hands back its inner stage, so a chain is closed
//!   outermost-first. Close errors are collected, never short-circuited.

use std::io::{self, Read, Write};

use crate::crypto::{AuthenticatedCipher, DigestState};
use crate::telemetry::{Stage, StageClock, StageReport};
use crate::types::MessageError;

/// What a stage produced when it closed.
#[derive(Debug, PartialEq, Eq)]
pub enum StageArtifact {
    None,
    Tag(Vec<u8>),
}

/// Result of closing one stage.
pub struct Closed<T> {
    /// Next stage inward; `None` for the innermost stage or if closing consumed it.
    pub inner: Option<T>,
    pub report: StageReport,
    pub result: Result<StageArtifact, MessageError>,
}

pub trait WriteStage<'a>: Write + 'a {
    fn stage(&self) -> Stage;
    fn close(self: Box<Self>) -> Closed<BoxedWriter<'a>>;
}

pub trait ReadStage<'a>: Read + 'a {
    fn stage(&self) -> Stage;
    fn close(self: Box<Self>) -> Closed<BoxedReader<'a>>;
}

pub type BoxedWriter<'a> = Box<dyn WriteStage<'a> + 'a>;
pub type BoxedReader<'a> = Box<dyn ReadStage<'a> + 'a>;

/// Everything a closed chain produced.
#[derive(Default)]
pub struct ChainOutcome {
    pub tag: Option<Vec<u8>>,
    pub reports: Vec<StageReport>,
    pub errors: Vec<MessageError>,
}

impl ChainOutcome {
    fn absorb(&mut self, report: StageReport, result: Result<StageArtifact, MessageError>) {
        match result {
            Ok(StageArtifact::Tag(tag)) => self.tag = Some(tag),
            Ok(StageArtifact::None) => {}
            Err(e) => {
                tracing::debug!(stage = ?report.stage, error = %e, "stage close failed");
                self.errors.push(e);
            }
        }
        self.reports.push(report);
    }
}

/// Close every write stage, outermost first.
pub fn close_writers(outer: BoxedWriter<'_>) -> ChainOutcome {
    let mut outcome = ChainOutcome::default();
    let mut next = Some(outer);
    while let Some(stage) = next.take() {
        let closed = stage.close();
        outcome.absorb(closed.report, closed.result);
        next = closed.inner;
    }
    outcome
}

/// Close every read stage, outermost first.
pub fn close_readers(outer: BoxedReader<'_>) -> ChainOutcome {
    let mut outcome = ChainOutcome::default();
    let mut next = Some(outer);
    while let Some(stage) = next.take() {
        let closed = stage.close();
        outcome.absorb(closed.report, closed.result);
        next = closed.inner;
    }
    outcome
}

/// Encrypts everything written through it; the tag is the close artifact.
pub struct EncryptingWriter<'a> {
    inner: BoxedWriter<'a>,
    cipher: Box<dyn AuthenticatedCipher>,
    scratch: Vec<u8>,
    report: StageReport,
    clock: StageClock,
}

impl<'a> EncryptingWriter<'a> {
    pub fn new(inner: BoxedWriter<'a>, cipher: Box<dyn AuthenticatedCipher>) -> Self {
        Self {
            inner,
            cipher,
            scratch: Vec::new(),
            report: StageReport::new(Stage::Encrypt),
            clock: StageClock::default(),
        }
    }
}

impl Write for EncryptingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.scratch.clear();
        self.scratch.extend_from_slice(buf);
        let (cipher, scratch) = (&mut self.cipher, &mut self.scratch);
        self.clock.run(|| cipher.encrypt_in_place(scratch));
        self.inner.write_all(&self.scratch)?;
        self.report.add_io(buf.len(), buf.len());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<'a> WriteStage<'a> for EncryptingWriter<'a> {
    fn stage(&self) -> Stage {
        Stage::Encrypt
    }

    fn close(self: Box<Self>) -> Closed<BoxedWriter<'a>> {
        let EncryptingWriter { inner, cipher, mut report, clock, .. } = *self;
        report.elapsed = clock.spent();
        Closed { inner: Some(inner), report, result: Ok(StageArtifact::Tag(cipher.finish())) }
    }
}

/// Decrypts everything read through it; the computed tag is the close artifact.
///
/// Close drains whatever the outer stage left unread through the cipher, so the tag
/// always covers the whole body and the envelope reaches its terminator.
pub struct DecryptingReader<'a> {
    inner: BoxedReader<'a>,
    cipher: Box<dyn AuthenticatedCipher>,
    report: StageReport,
    clock: StageClock,
}

impl<'a> DecryptingReader<'a> {
    pub fn new(inner: BoxedReader<'a>, cipher: Box<dyn AuthenticatedCipher>) -> Self {
        Self { inner, cipher, report: StageReport::new(Stage::Decrypt), clock: StageClock::default() }
    }
}

impl Read for DecryptingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        let (cipher, data) = (&mut self.cipher, &mut buf[..n]);
        self.clock.run(|| cipher.decrypt_in_place(data));
        self.report.add_io(n, n);
        Ok(n)
    }
}

impl<'a> ReadStage<'a> for DecryptingReader<'a> {
    fn stage(&self) -> Stage {
        Stage::Decrypt
    }

    fn close(mut self: Box<Self>) -> Closed<BoxedReader<'a>> {
        let mut rest = [0u8; 4096];
        let mut drained = 0u64;
        let drain = loop {
            match self.read(&mut rest) {
                Ok(0) => break Ok(()),
                Ok(n) => drained += n as u64,
                Err(e) => break Err(MessageError::from(e)),
            }
        };
        if drained > 0 {
            tracing::debug!(drained, "ciphertext left unread by the outer stage");
        }
        let DecryptingReader { inner, cipher, mut report, clock } = *self;
        report.elapsed = clock.spent();
        let result = drain.map(|()| StageArtifact::Tag(cipher.finish()));
        Closed { inner: Some(inner), report, result }
    }
}

/// Plaintext source on the send path. Hashes what the envelope pulls when signing.
pub struct SigningReader<R> {
    inner: R,
    digest: Option<DigestState>,
    report: StageReport,
    clock: StageClock,
}

impl<R: Read> SigningReader<R> {
    pub fn new(inner: R, digest: Option<DigestState>) -> Self {
        let stage = if digest.is_some() { Stage::Sign } else { Stage::Read };
        Self { inner, digest, report: StageReport::new(stage), clock: StageClock::default() }
    }

    /// Digest of every byte read, if signing.
    pub fn finish(self) -> (Option<Vec<u8>>, StageReport) {
        let mut report = self.report;
        report.elapsed = self.clock.spent();
        (self.digest.map(DigestState::finalize), report)
    }
}

impl<R: Read> Read for SigningReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if let Some(d) = self.digest.as_mut() {
            let data = &buf[..n];
            self.clock.run(|| d.update(data));
        }
        self.report.add_io(n, n);
        Ok(n)
    }
}

/// Plaintext sink on the receive path. Hashes what the decoder writes when verifying.
pub struct VerifyingWriter<W> {
    inner: W,
    digest: Option<DigestState>,
    report: StageReport,
    clock: StageClock,
}

impl<W: Write> VerifyingWriter<W> {
    pub fn new(inner: W, digest: Option<DigestState>) -> Self {
        let stage = if digest.is_some() { Stage::Verify } else { Stage::Write };
        Self { inner, digest, report: StageReport::new(stage), clock: StageClock::default() }
    }

    pub fn finish(mut self) -> io::Result<(Option<Vec<u8>>, StageReport)> {
        self.inner.flush()?;
        let mut report = self.report;
        report.elapsed = self.clock.spent();
        Ok((self.digest.map(DigestState::finalize), report))
    }
}

impl<W: Write> Write for VerifyingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        if let Some(d) = self.digest.as_mut() {
            let data = &buf[..n];
            self.clock.run(|| d.update(data));
        }
        self.report.add_io(n, n);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
