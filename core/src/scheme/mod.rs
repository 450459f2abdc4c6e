//! scheme/mod.rs
//! Named algorithm registries and the wire codec for algorithm-typed fields.
//!
//! Design notes:
//! - One `Registry<S>` per algorithm family, keyed by the upper-cased scheme name.
//! - `Schemes` is the composition root: built once, shared read-only afterwards.
//! - On the wire a scheme is only its name; decoding re-resolves it through the
//!   registry of the expected family and fails with `SchemeError::Unknown`.

pub mod types;
pub mod algorithm;
pub mod registry;

pub use types::*;
pub use algorithm::*;
pub use registry::*;
