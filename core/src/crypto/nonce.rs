// ## src/crypto/nonce.rs

//! crypto/nonce.rs
//! Random nonces and salts.
//!
//! Design:
//! - Every message gets a fresh random nonce of the cipher's nonce size from the OS RNG.
//! - One nonce per message key; the streaming ciphers never need per-chunk nonces.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::crypto::types::CryptoError;

/// Fill `len` bytes from the OS RNG.
#[inline]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    OsRng.fill_bytes(&mut out);
    out
}

/// Fresh nonce sized for the selected cipher.
#[inline]
pub fn fresh_nonce(nonce_len: usize) -> Vec<u8> {
    random_bytes(nonce_len)
}

#[inline]
pub fn validate_nonce_len(expected: usize, nonce: &[u8]) -> Result<(), CryptoError> {
    if nonce.len() != expected {
        return Err(CryptoError::InvalidNonceLen { expected, actual: nonce.len() });
    }
    Ok(())
}

/// All-zero salts are refused.
#[inline]
pub fn validate_salt(salt: &[u8]) -> Result<(), CryptoError> {
    if salt.is_empty() || salt.iter().all(|&b| b == 0) {
        return Err(CryptoError::Failure("salt must not be empty or all-zero".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonces_have_requested_length() {
        assert_eq!(fresh_nonce(24).len(), 24);
        assert!(validate_nonce_len(16, &fresh_nonce(16)).is_ok());
        assert!(validate_nonce_len(16, &fresh_nonce(12)).is_err());
    }

    #[test]
    fn zero_salt_rejected() {
        assert!(validate_salt(&[0u8; 16]).is_err());
        assert!(validate_salt(&[]).is_err());
        assert!(validate_salt(&random_bytes(16)).is_ok());
    }
}
