//! Deflate (zlib wrapper) and gzip via flate2 with streaming enc/dec.

use std::ops::RangeInclusive;

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;

use crate::compression::types::{
    CompressionError, CompressionScheme, DecoderSource, EncoderSink, StreamDecoder, StreamEncoder,
};
use crate::scheme::Scheme;

pub const DEFAULT_LEVEL_DEFLATE: i32 = 6;

fn flate_level(level: Option<i32>) -> Compression {
    match level {
        Some(l @ 0..=9) => Compression::new(l as u32),
        _ => Compression::new(DEFAULT_LEVEL_DEFLATE as u32),
    }
}

macro_rules! flate_scheme {
    ($scheme:ident, $name:literal, $enc:ident, $dec:ident) => {
        pub struct $scheme;

        impl Scheme for $scheme {
            fn name(&self) -> &'static str {
                $name
            }
        }

        impl CompressionScheme for $scheme {
            fn level_range(&self) -> Option<RangeInclusive<i32>> {
                Some(0..=9)
            }

            fn default_level(&self) -> Option<i32> {
                Some(DEFAULT_LEVEL_DEFLATE)
            }

            fn encoder<'a>(
                &self,
                sink: EncoderSink<'a>,
                level: Option<i32>,
            ) -> Result<Box<dyn StreamEncoder<'a> + 'a>, CompressionError> {
                Ok(Box::new($enc::new(sink, flate_level(level))))
            }

            fn decoder<'a>(
                &self,
                source: DecoderSource<'a>,
            ) -> Result<Box<dyn StreamDecoder<'a> + 'a>, CompressionError> {
                Ok(Box::new($dec::new(source)))
            }
        }

        impl<'a> StreamEncoder<'a> for $enc<EncoderSink<'a>> {
            fn finish(self: Box<Self>) -> Result<EncoderSink<'a>, CompressionError> {
                $enc::finish(*self)
                    .map_err(|e| CompressionError::CodecProcessFailed { scheme: $name, msg: e.to_string() })
            }
        }

        impl<'a> StreamDecoder<'a> for $dec<DecoderSource<'a>> {
            fn into_source(self: Box<Self>) -> DecoderSource<'a> {
                $dec::into_inner(*self)
            }
        }
    };
}

flate_scheme!(Deflate, "DEFLATE", ZlibEncoder, ZlibDecoder);
flate_scheme!(Gzip, "GZIP", GzEncoder, GzDecoder);
