//! codecs/lz4.rs
//! LZ4 frame codec (lz4_flex). No levels.
use std::ops::RangeInclusive;

use lz4_flex::frame::{FrameDecoder, FrameEncoder};

use crate::compression::types::{
    CompressionError, CompressionScheme, DecoderSource, EncoderSink, StreamDecoder, StreamEncoder,
};
use crate::scheme::Scheme;

const NAME: &str = "LZ4";

pub struct Lz4;

impl Scheme for Lz4 {
    fn name(&self) -> &'static str {
        NAME
    }
}

impl CompressionScheme for Lz4 {
    fn level_range(&self) -> Option<RangeInclusive<i32>> {
        None
    }

    fn default_level(&self) -> Option<i32> {
        None
    }

    fn encoder<'a>(
        &self,
        sink: EncoderSink<'a>,
        _level: Option<i32>,
    ) -> Result<Box<dyn StreamEncoder<'a> + 'a>, CompressionError> {
        Ok(Box::new(FrameEncoder::new(sink)))
    }

    fn decoder<'a>(&self, source: DecoderSource<'a>) -> Result<Box<dyn StreamDecoder<'a> + 'a>, CompressionError> {
        Ok(Box::new(FrameDecoder::new(source)))
    }
}

impl<'a> StreamEncoder<'a> for FrameEncoder<EncoderSink<'a>> {
    fn finish(self: Box<Self>) -> Result<EncoderSink<'a>, CompressionError> {
        FrameEncoder::finish(*self)
            .map_err(|e| CompressionError::CodecProcessFailed { scheme: NAME, msg: e.to_string() })
    }
}

impl<'a> StreamDecoder<'a> for FrameDecoder<DecoderSource<'a>> {
    fn into_source(self: Box<Self>) -> DecoderSource<'a> {
        FrameDecoder::into_inner(*self)
    }
}
