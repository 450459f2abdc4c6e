// ## src/crypto/mod.rs

pub mod types;
pub mod aad;
pub mod aead;
pub mod expand;
pub mod hash;
pub mod kdf;
pub mod kem;
pub mod keys;
pub mod nonce;
pub mod pke;
pub mod sign;

pub use types::*;
pub use aad::build_aad;
pub use aead::{tags_match, AeadScheme, AuthenticatedCipher};
pub use expand::ExpandScheme;
pub use hash::{DigestAlg, DigestState, HashScheme};
pub use kdf::{KdfCost, KdfScheme};
pub use kem::{KemScheme, KeyPairBytes};
pub use keys::*;
pub use nonce::{fresh_nonce, random_bytes};
pub use pke::PkeScheme;
pub use sign::SignatureScheme;
