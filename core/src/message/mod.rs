//! message/mod.rs
//! The message record and the two pipelines over it.
//!
//! Record layout: `[packet type][version][Header][body chunks][Auth]`. Header and Auth
//! are CBOR maps; the body is the envelope chunk stream.

pub mod armor;
pub mod auth;
pub mod envelope;
pub mod header;
pub mod receive;
pub mod send;
pub mod stages;
pub mod wire;

pub use armor::{armor, dearmor, ArmorError, ArmorWriter};
pub use auth::{Auth, PendingAuth, SignatureRecord, Signer};
pub use envelope::FrameError;
pub use header::{CompressionInfo, FileInfo, Header};
pub use receive::{DecryptOptions, IncomingMessage, OpenedMessage, Verification};
pub use send::{EncodedMessage, MessageBuilder, PendingMessage};
pub use wire::PacketType;
