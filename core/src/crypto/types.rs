// ## src/crypto/types.rs

use thiserror::Error;

/// Symmetric key length used by every body cipher and key wrap.
pub const KEY_LEN_32: usize = 32;

/// Tag length produced by the streaming ciphers.
pub const TAG_LEN_32: usize = 32;

/// Shared secret length handed to the expanders for group messages.
pub const SHARED_SECRET_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Invalid key length provided to a cipher or key decoder.
    #[error("invalid key length: expected={expected}, actual={actual}")]
    InvalidKeyLen { expected: usize, actual: usize },

    /// Nonce length does not match what the cipher requires.
    #[error("invalid nonce length: expected={expected}, actual={actual}")]
    InvalidNonceLen { expected: usize, actual: usize },

    /// Malformed encoded key, ciphertext or signature.
    #[error("malformed {0}")]
    Malformed(&'static str),

    /// Passphrase derivation refused an empty secret.
    #[error("passphrase must not be empty")]
    EmptyPassphrase,

    /// KDF cost parameters do not belong to the scheme, or are out of range.
    #[error("invalid {scheme} cost parameters: {msg}")]
    InvalidCost { scheme: &'static str, msg: String },

    /// KEM decapsulation or PKE unwrap failed.
    #[error("{0} failed")]
    Decapsulation(&'static str),

    /// One-shot AEAD tag mismatch (key wrap).
    #[error("AEAD tag mismatch")]
    TagMismatch,

    /// Signature did not verify.
    #[error("signature verification failed")]
    BadSignature,

    /// General derivation or runtime error with context.
    #[error("crypto failure: {0}")]
    Failure(String),
}
