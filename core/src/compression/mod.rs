//! compression/mod.rs
//! Streaming compression and decompression of the message body.
//!
//! Design notes:
//! - Codecs are registry schemes addressed by name (`ZSTD`, `LZ4`, `DEFLATE`, `GZIP`).
//! - Level bounds are checked before the first byte is written.
//! - A codec runs as one stage in the body chain: compress innermost on write,
//!   decompress last on read.

pub mod types;
pub mod codecs;
pub mod stream;

use std::sync::Arc;

pub use types::*;
pub use stream::*;
pub use codecs::{DEFAULT_LEVEL_DEFLATE, DEFAULT_LEVEL_ZSTD};

use crate::scheme::Registry;

pub(crate) fn register_standard(registry: &mut Registry<dyn CompressionScheme>) {
    registry.register(Arc::new(codecs::zstd::Zstd));
    registry.register(Arc::new(codecs::lz4::Lz4));
    registry.register(Arc::new(codecs::deflate::Deflate));
    registry.register(Arc::new(codecs::deflate::Gzip));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::Schemes;

    #[test]
    fn level_validation() {
        let schemes = Schemes::standard();
        let zstd = schemes.compression.by_name("zstd").unwrap();
        assert_eq!(zstd.validate_level(None).unwrap(), Some(DEFAULT_LEVEL_ZSTD));
        assert_eq!(zstd.validate_level(Some(19)).unwrap(), Some(19));
        let err = zstd.validate_level(Some(40)).unwrap_err();
        assert!(err.is_configuration());

        let lz4 = schemes.compression.by_name("LZ4").unwrap();
        assert_eq!(lz4.validate_level(None).unwrap(), None);
        assert!(matches!(lz4.validate_level(Some(1)), Err(CompressionError::LevelNotAccepted { .. })));

        let gzip = schemes.compression.by_name("gzip").unwrap();
        assert!(gzip.validate_level(Some(10)).is_err());
    }
}
