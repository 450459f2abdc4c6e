//! compression/codecs/mod.rs
//! Concrete codecs behind `CompressionScheme`.

pub mod deflate;
pub mod lz4;
pub mod zstd;

pub use deflate::DEFAULT_LEVEL_DEFLATE;
pub use zstd::DEFAULT_LEVEL_ZSTD;
