//! telemetry/counters.rs
//! Mutable counters used while a message is streamed.
//!
//! Each stage keeps its own `StageReport` and hands it over when closed; the pipeline
//! merges reports here and converts the result into an immutable snapshot.

use std::io::{self, Read, Write};
use std::ops::AddAssign;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::timers::Stage;

/// What one stage observed between construction and close.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StageReport {
    pub stage: Option<Stage>,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub chunks: u64,
    pub overhead: u64,
    pub elapsed: Duration,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self { stage: Some(stage), ..Self::default() }
    }

    #[inline]
    pub fn add_io(&mut self, bytes_in: usize, bytes_out: usize) {
        self.bytes_in += bytes_in as u64;
        self.bytes_out += bytes_out as u64;
    }
}

/// Byte-counting pass-through for readers and writers.
pub struct Tally<T> {
    inner: T,
    bytes: u64,
}

impl<T> Tally<T> {
    pub fn new(inner: T) -> Self {
        Self { inner, bytes: 0 }
    }

    pub fn byte_count(&self) -> u64 {
        self.bytes
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Write> Write for Tally<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bytes += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<T: Read> Read for Tally<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes += n as u64;
        Ok(n)
    }
}

/// Deterministic counters collected during stream processing.
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub chunks: u64,
    pub bytes_plaintext: u64,
    pub bytes_compressed: u64,
    pub bytes_ciphertext: u64,
    pub bytes_body: u64,
    pub bytes_overhead: u64,
    pub compressed: bool,
    pub encrypted: bool,
}

impl TelemetryCounters {
    /// Record the header, trailer, or any other structural bytes.
    pub fn add_overhead(&mut self, len: usize) {
        self.bytes_overhead += len as u64;
    }

    /// Fold a closed stage's report into the message totals.
    pub fn record(&mut self, report: &StageReport) {
        match report.stage {
            Some(Stage::Read) | Some(Stage::Sign) => self.bytes_plaintext += report.bytes_in,
            Some(Stage::Write) | Some(Stage::Verify) => self.bytes_plaintext += report.bytes_out,
            Some(Stage::Compress) => {
                self.compressed = true;
                self.bytes_compressed += report.bytes_out;
            }
            Some(Stage::Decompress) => {
                self.compressed = true;
                self.bytes_compressed += report.bytes_in;
            }
            Some(Stage::Encrypt) => {
                self.encrypted = true;
                self.bytes_ciphertext += report.bytes_out;
            }
            Some(Stage::Decrypt) => {
                self.encrypted = true;
                self.bytes_ciphertext += report.bytes_in;
            }
            Some(Stage::Encode) | Some(Stage::Decode) => {
                self.chunks += report.chunks;
                // Payload side: input when encoding, output when decoding.
                self.bytes_body += report.bytes_in.min(report.bytes_out);
                self.bytes_overhead += report.overhead;
            }
            Some(Stage::Finalize) | None => {}
        }
    }

    /// Bytes entering the body cipher (plaintext when uncompressed).
    pub fn cipher_input_bytes(&self) -> u64 {
        if self.compressed { self.bytes_compressed } else { self.bytes_plaintext }
    }

    pub fn framing_overhead_bytes(&self) -> u64 {
        self.bytes_overhead
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.chunks += other.chunks;
        self.bytes_plaintext += other.bytes_plaintext;
        self.bytes_compressed += other.bytes_compressed;
        self.bytes_ciphertext += other.bytes_ciphertext;
        self.bytes_body += other.bytes_body;
        self.bytes_overhead += other.bytes_overhead;
        self.compressed |= other.compressed;
        self.encrypted |= other.encrypted;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
