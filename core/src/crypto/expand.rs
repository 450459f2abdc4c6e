//! crypto/expand.rs
//! Key expansion from high-entropy secrets (no work factor).
//!
//! Design notes:
//! - Extract with the salt, expand with `info` for domain separation.
//! - BLAKE3 uses derive-key mode with a fixed context, then absorbs the
//!   length-prefixed salt, the secret and `info` before reading the XOF.

use std::sync::Arc;

use hkdf::Hkdf;
use sha2::{Sha256, Sha512};

use crate::crypto::types::CryptoError;
use crate::scheme::{Registry, Scheme};

pub trait ExpandScheme: Scheme {
    /// Fill `out` with key material bound to `salt` and `info`.
    fn expand(&self, secret: &[u8], salt: &[u8], info: &[u8], out: &mut [u8]) -> Result<(), CryptoError>;
}

struct HkdfSha256;

impl Scheme for HkdfSha256 {
    fn name(&self) -> &'static str {
        "HKDF-SHA256"
    }
}

impl ExpandScheme for HkdfSha256 {
    fn expand(&self, secret: &[u8], salt: &[u8], info: &[u8], out: &mut [u8]) -> Result<(), CryptoError> {
        Hkdf::<Sha256>::new(Some(salt), secret)
            .expand(info, out)
            .map_err(|_| CryptoError::Failure("HKDF expand failed (SHA-256)".into()))
    }
}

struct HkdfSha512;

impl Scheme for HkdfSha512 {
    fn name(&self) -> &'static str {
        "HKDF-SHA512"
    }
}

impl ExpandScheme for HkdfSha512 {
    fn expand(&self, secret: &[u8], salt: &[u8], info: &[u8], out: &mut [u8]) -> Result<(), CryptoError> {
        Hkdf::<Sha512>::new(Some(salt), secret)
            .expand(info, out)
            .map_err(|_| CryptoError::Failure("HKDF expand failed (SHA-512)".into()))
    }
}

struct Blake3Derive;

impl Blake3Derive {
    const CONTEXT: &'static str = "pqseal v1 BLAKE3-DERIVE";
}

impl Scheme for Blake3Derive {
    fn name(&self) -> &'static str {
        "BLAKE3-DERIVE"
    }
}

impl ExpandScheme for Blake3Derive {
    fn expand(&self, secret: &[u8], salt: &[u8], info: &[u8], out: &mut [u8]) -> Result<(), CryptoError> {
        let mut h = blake3::Hasher::new_derive_key(Self::CONTEXT);
        h.update(&(salt.len() as u64).to_le_bytes());
        h.update(salt);
        h.update(&(secret.len() as u64).to_le_bytes());
        h.update(secret);
        h.update(info);
        h.finalize_xof().fill(out);
        Ok(())
    }
}

pub fn register_standard(registry: &mut Registry<dyn ExpandScheme>) {
    registry.register(Arc::new(HkdfSha256));
    registry.register(Arc::new(HkdfSha512));
    registry.register(Arc::new(Blake3Derive));
}
