//! compression/codecs/zstd.rs
//!
//! Zstd streaming codec.
//!
//! Design notes:
//! - One zstd frame per message body; the frame epilogue is written at close.
//! - The decoder stops with an error if the body ends inside a frame.

use std::io::BufReader;
use std::ops::RangeInclusive;

use crate::compression::types::{
    CompressionError, CompressionScheme, DecoderSource, EncoderSink, StreamDecoder, StreamEncoder,
};
use crate::scheme::Scheme;

pub const DEFAULT_LEVEL_ZSTD: i32 = 6;
const NAME: &str = "ZSTD";

pub struct Zstd;

impl Scheme for Zstd {
    fn name(&self) -> &'static str {
        NAME
    }
}

impl CompressionScheme for Zstd {
    fn level_range(&self) -> Option<RangeInclusive<i32>> {
        Some(1..=22)
    }

    fn default_level(&self) -> Option<i32> {
        Some(DEFAULT_LEVEL_ZSTD)
    }

    fn encoder<'a>(
        &self,
        sink: EncoderSink<'a>,
        level: Option<i32>,
    ) -> Result<Box<dyn StreamEncoder<'a> + 'a>, CompressionError> {
        let level = level.unwrap_or(DEFAULT_LEVEL_ZSTD);
        let encoder = zstd::stream::write::Encoder::new(sink, level)
            .map_err(|e| CompressionError::CodecInitFailed { scheme: NAME, msg: e.to_string() })?;
        Ok(Box::new(encoder))
    }

    fn decoder<'a>(&self, source: DecoderSource<'a>) -> Result<Box<dyn StreamDecoder<'a> + 'a>, CompressionError> {
        let decoder = zstd::stream::read::Decoder::new(source)
            .map_err(|e| CompressionError::CodecInitFailed { scheme: NAME, msg: e.to_string() })?;
        Ok(Box::new(decoder))
    }
}

impl<'a> StreamEncoder<'a> for zstd::stream::write::Encoder<'static, EncoderSink<'a>> {
    fn finish(self: Box<Self>) -> Result<EncoderSink<'a>, CompressionError> {
        zstd::stream::write::Encoder::finish(*self)
            .map_err(|e| CompressionError::CodecProcessFailed { scheme: NAME, msg: e.to_string() })
    }
}

impl<'a> StreamDecoder<'a> for zstd::stream::read::Decoder<'static, BufReader<DecoderSource<'a>>> {
    fn into_source(self: Box<Self>) -> DecoderSource<'a> {
        zstd::stream::read::Decoder::finish(*self).into_inner()
    }
}
