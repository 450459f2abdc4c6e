// ## src/crypto/aad.rs

//! Associated data for body ciphers.
//!
//! Layout (all lengths little-endian):
//! `AAD_DOMAIN || u32 len || header context || u16 len || cipher name || u32 count || fingerprints`
//!
//! The header context is the CBOR encoding of every header field known before encryption.
//! The descriptor binding (cipher name, ordered recipient set) is appended so a descriptor
//! cannot be swapped or have recipients substituted without breaking the tag.

use crate::constants::AAD_DOMAIN;
use crate::crypto::keys::Fingerprint;

#[inline]
pub fn build_aad(context: &[u8], cipher: &str, recipients: &[Fingerprint]) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        AAD_DOMAIN.len() + 4 + context.len() + 2 + cipher.len() + 4 + recipients.len() * 32,
    );
    out.extend_from_slice(AAD_DOMAIN);
    out.extend_from_slice(&(context.len() as u32).to_le_bytes());
    out.extend_from_slice(context);
    out.extend_from_slice(&(cipher.len() as u16).to_le_bytes());
    out.extend_from_slice(cipher.as_bytes());
    out.extend_from_slice(&(recipients.len() as u32).to_le_bytes());
    for fp in recipients {
        out.extend_from_slice(fp.as_bytes());
    }
    out
}
