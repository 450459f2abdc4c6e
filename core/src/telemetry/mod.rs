//! telemetry/mod.rs
//! Per-message counters, stage timers, and immutable snapshots.
//!
//! Notes:
//! - Stages count their own bytes and hand a `StageReport` over at close; nothing is shared
//!   between stages while the body streams.
//! - Snapshots are plain serde data, safe to log or export.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
