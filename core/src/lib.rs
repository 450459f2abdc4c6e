//! pqseal-core
//!
//! Post-quantum secure messaging: streaming sign, compress and encrypt into one
//! self-describing record, and the matching decrypt, decompress and verify.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;
pub mod config;

// Schemes and primitives
pub mod scheme;
pub mod crypto;
pub mod compression;
pub mod encryption;

// Record and pipelines
pub mod message;
pub mod telemetry;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::config::MessageConfig;
    pub use crate::crypto::{Fingerprint, KeyProvider, Keyring, PassphraseProvider, PrivateKey, PublicKey};
    pub use crate::encryption::{DerivedEncrypter, Encrypter, GroupEncrypter, PassphraseEncrypter, SecretEncrypter};
    pub use crate::message::{
        DecryptOptions, EncodedMessage, FileInfo, Header, IncomingMessage, MessageBuilder, OpenedMessage,
        PacketType, Verification,
    };
    pub use crate::scheme::{Schemes, SchemeFamily};
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::{ErrorClass, MessageError, MissingSecret};
}
