//! compression/stream.rs
//! Compression as write/read stages of the body chain.
//!
//! Design notes:
//! - The encoder wraps the encrypt stage (or the envelope), so compression sees
//!   plaintext and emits what the cipher consumes.
//! - The decoder pulls from the decrypt stage. Decoders do not drain the source on
//!   close; the decrypt stage or the envelope below deals with leftover bytes.

use std::io::{self, Read, Write};

use crate::compression::types::{CompressionScheme, StreamDecoder, StreamEncoder};
use crate::message::stages::{BoxedReader, BoxedWriter, Closed, ReadStage, StageArtifact, WriteStage};
use crate::scheme::Algorithm;
use crate::telemetry::{Stage, StageClock, StageReport, Tally};

pub struct CompressingWriter<'a> {
    encoder: Box<dyn StreamEncoder<'a> + 'a>,
    report: StageReport,
    clock: StageClock,
}

impl<'a> CompressingWriter<'a> {
    pub fn new(
        scheme: &Algorithm<dyn CompressionScheme>,
        level: Option<i32>,
        inner: BoxedWriter<'a>,
    ) -> Result<Self, crate::compression::CompressionError> {
        let level = scheme.validate_level(level)?;
        let encoder = scheme.encoder(Tally::new(inner), level)?;
        tracing::debug!(scheme = scheme.name(), ?level, "compression stage installed");
        Ok(Self { encoder, report: StageReport::new(Stage::Compress), clock: StageClock::default() })
    }
}

impl Write for CompressingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let encoder = &mut self.encoder;
        let n = self.clock.run(|| encoder.write(buf))?;
        self.report.bytes_in += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}

impl<'a> WriteStage<'a> for CompressingWriter<'a> {
    fn stage(&self) -> Stage {
        Stage::Compress
    }

    fn close(self: Box<Self>) -> Closed<BoxedWriter<'a>> {
        let CompressingWriter { encoder, mut report, mut clock } = *self;
        let finished = clock.run(|| encoder.finish());
        report.elapsed = clock.spent();
        match finished {
            Ok(sink) => {
                report.bytes_out = sink.byte_count();
                Closed { inner: Some(sink.into_inner()), report, result: Ok(StageArtifact::None) }
            }
            // The encoder owned the sink; the inner stages go down with it.
            Err(e) => Closed { inner: None, report, result: Err(e.into()) },
        }
    }
}

pub struct DecompressingReader<'a> {
    decoder: Box<dyn StreamDecoder<'a> + 'a>,
    report: StageReport,
    clock: StageClock,
}

impl<'a> DecompressingReader<'a> {
    pub fn new(
        scheme: &Algorithm<dyn CompressionScheme>,
        inner: BoxedReader<'a>,
    ) -> Result<Self, crate::compression::CompressionError> {
        let decoder = scheme.decoder(Tally::new(inner))?;
        tracing::debug!(scheme = scheme.name(), "decompression stage installed");
        Ok(Self { decoder, report: StageReport::new(Stage::Decompress), clock: StageClock::default() })
    }
}

impl Read for DecompressingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let decoder = &mut self.decoder;
        let n = self.clock.run(|| decoder.read(buf))?;
        self.report.bytes_out += n as u64;
        Ok(n)
    }
}

impl<'a> ReadStage<'a> for DecompressingReader<'a> {
    fn stage(&self) -> Stage {
        Stage::Decompress
    }

    fn close(self: Box<Self>) -> Closed<BoxedReader<'a>> {
        let DecompressingReader { decoder, mut report, clock } = *self;
        report.elapsed = clock.spent();
        let source = decoder.into_source();
        report.bytes_in = source.byte_count();
        Closed { inner: Some(source.into_inner()), report, result: Ok(StageArtifact::None) }
    }
}
