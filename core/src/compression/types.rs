//! compression/types.rs
//! Codec capability trait, stream handles, and errors.

use std::io::{self, Read, Write};
use std::ops::RangeInclusive;

use thiserror::Error;

use crate::message::stages::{BoxedReader, BoxedWriter};
use crate::scheme::Scheme;
use crate::telemetry::Tally;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompressionError {
    #[error("{scheme} level {level} outside {min}..={max}")]
    UnsupportedLevel { scheme: &'static str, level: i32, min: i32, max: i32 },

    #[error("{scheme} does not take a compression level")]
    LevelNotAccepted { scheme: &'static str },

    #[error("codec {scheme} init failed: {msg}")]
    CodecInitFailed { scheme: &'static str, msg: String },

    #[error("codec {scheme} process failed: {msg}")]
    CodecProcessFailed { scheme: &'static str, msg: String },
}

impl CompressionError {
    /// Detected before any bytes flow.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CompressionError::UnsupportedLevel { .. } | CompressionError::LevelNotAccepted { .. }
        )
    }
}

impl From<CompressionError> for io::Error {
    fn from(e: CompressionError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, e)
    }
}

pub type EncoderSink<'a> = Tally<BoxedWriter<'a>>;
pub type DecoderSource<'a> = Tally<BoxedReader<'a>>;

/// A live compressor writing into the next stage.
pub trait StreamEncoder<'a>: Write + 'a {
    /// Flush the codec trailer and hand back the sink.
    fn finish(self: Box<Self>) -> Result<EncoderSink<'a>, CompressionError>;
}

/// A live decompressor pulling from the previous stage.
pub trait StreamDecoder<'a>: Read + 'a {
    fn into_source(self: Box<Self>) -> DecoderSource<'a>;
}

/// Registry-resolvable compression codec.
pub trait CompressionScheme: Scheme {
    /// Accepted levels; `None` if the codec takes no level.
    fn level_range(&self) -> Option<RangeInclusive<i32>>;

    fn default_level(&self) -> Option<i32>;

    /// Resolve the level to use, rejecting anything the codec cannot honour.
    fn validate_level(&self, level: Option<i32>) -> Result<Option<i32>, CompressionError> {
        match (self.level_range(), level) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(CompressionError::LevelNotAccepted { scheme: self.name() }),
            (Some(_), None) => Ok(self.default_level()),
            (Some(range), Some(level)) if range.contains(&level) => Ok(Some(level)),
            (Some(range), Some(level)) => Err(CompressionError::UnsupportedLevel {
                scheme: self.name(),
                level,
                min: *range.start(),
                max: *range.end(),
            }),
        }
    }

    /// `level` has already been through `validate_level`.
    fn encoder<'a>(
        &self,
        sink: EncoderSink<'a>,
        level: Option<i32>,
    ) -> Result<Box<dyn StreamEncoder<'a> + 'a>, CompressionError>;

    fn decoder<'a>(&self, source: DecoderSource<'a>) -> Result<Box<dyn StreamDecoder<'a> + 'a>, CompressionError>;
}
