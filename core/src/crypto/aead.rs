//! crypto/aead.rs
//! Streaming authenticated ciphers for message bodies.
//!
//! Design notes:
//! - Encrypt-then-MAC: a stream cipher keyed with one subkey, a MAC keyed with another.
//!   Both subkeys are derived from the 32-byte message key, never used directly.
//! - The MAC absorbs the associated data, then every ciphertext byte in order, then
//!   both lengths (u64 LE). The tag is only available once the body is complete.
//! - Ciphertext length equals plaintext length; the tag travels in the trailer.
//! - Tag comparison is constant-time (`tags_match`).

use std::sync::Arc;

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::XChaCha20;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::crypto::types::{CryptoError, KEY_LEN_32, TAG_LEN_32};
use crate::scheme::{Registry, Scheme};

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Incremental cipher state for one message body.
pub trait AuthenticatedCipher: Send {
    /// Encrypt `buf` in place and absorb the resulting ciphertext.
    fn encrypt_in_place(&mut self, buf: &mut [u8]);

    /// Absorb `buf` as ciphertext, then decrypt it in place.
    fn decrypt_in_place(&mut self, buf: &mut [u8]);

    /// Tag over the associated data and all ciphertext processed so far.
    fn finish(self: Box<Self>) -> Vec<u8>;
}

pub trait AeadScheme: Scheme {
    fn key_size(&self) -> usize;
    fn nonce_size(&self) -> usize;
    fn tag_size(&self) -> usize;

    fn new_cipher(
        &self,
        key: &[u8],
        nonce: &[u8],
        associated_data: &[u8],
    ) -> Result<Box<dyn AuthenticatedCipher>, CryptoError>;
}

/// Constant-time tag comparison.
#[inline]
pub fn tags_match(expected: &[u8], actual: &[u8]) -> bool {
    expected.len() == actual.len() && bool::from(expected.ct_eq(actual))
}

enum Keystream {
    XChaCha20(XChaCha20),
    Aes256Ctr(Aes256Ctr),
}

impl Keystream {
    #[inline]
    fn apply(&mut self, buf: &mut [u8]) {
        match self {
            Keystream::XChaCha20(c) => c.apply_keystream(buf),
            Keystream::Aes256Ctr(c) => c.apply_keystream(buf),
        }
    }
}

enum MacState {
    Blake3(Box<blake3::Hasher>),
    HmacSha256(HmacSha256),
}

impl MacState {
    #[inline]
    fn update(&mut self, data: &[u8]) {
        match self {
            MacState::Blake3(h) => { h.update(data); }
            MacState::HmacSha256(m) => m.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            MacState::Blake3(h) => h.finalize().as_bytes().to_vec(),
            MacState::HmacSha256(m) => m.finalize().into_bytes().to_vec(),
        }
    }
}

struct EtmCipher {
    keystream: Keystream,
    mac: MacState,
    ad_len: u64,
    ct_len: u64,
}

impl EtmCipher {
    fn new(keystream: Keystream, mut mac: MacState, associated_data: &[u8]) -> Self {
        mac.update(associated_data);
        Self { keystream, mac, ad_len: associated_data.len() as u64, ct_len: 0 }
    }
}

impl AuthenticatedCipher for EtmCipher {
    fn encrypt_in_place(&mut self, buf: &mut [u8]) {
        self.keystream.apply(buf);
        self.mac.update(buf);
        self.ct_len += buf.len() as u64;
    }

    fn decrypt_in_place(&mut self, buf: &mut [u8]) {
        self.mac.update(buf);
        self.ct_len += buf.len() as u64;
        self.keystream.apply(buf);
    }

    fn finish(self: Box<Self>) -> Vec<u8> {
        let EtmCipher { mut mac, ad_len, ct_len, .. } = *self;
        mac.update(&ad_len.to_le_bytes());
        mac.update(&ct_len.to_le_bytes());
        mac.finalize()
    }
}

fn check_lengths(key: &[u8], nonce: &[u8], nonce_len: usize) -> Result<(), CryptoError> {
    if key.len() != KEY_LEN_32 {
        return Err(CryptoError::InvalidKeyLen { expected: KEY_LEN_32, actual: key.len() });
    }
    if nonce.len() != nonce_len {
        return Err(CryptoError::InvalidNonceLen { expected: nonce_len, actual: nonce.len() });
    }
    Ok(())
}

/// XChaCha20 keystream with a keyed BLAKE3 MAC. 24-byte nonce.
struct XChaCha20Blake3;

impl XChaCha20Blake3 {
    const NONCE_LEN: usize = 24;
    const ENC_CONTEXT: &'static str = "pqseal v1 XCHACHA20-BLAKE3 encryption key";
    const MAC_CONTEXT: &'static str = "pqseal v1 XCHACHA20-BLAKE3 authentication key";
}

impl Scheme for XChaCha20Blake3 {
    fn name(&self) -> &'static str {
        "XCHACHA20-BLAKE3"
    }
}

impl AeadScheme for XChaCha20Blake3 {
    fn key_size(&self) -> usize { KEY_LEN_32 }
    fn nonce_size(&self) -> usize { Self::NONCE_LEN }
    fn tag_size(&self) -> usize { TAG_LEN_32 }

    fn new_cipher(
        &self,
        key: &[u8],
        nonce: &[u8],
        associated_data: &[u8],
    ) -> Result<Box<dyn AuthenticatedCipher>, CryptoError> {
        check_lengths(key, nonce, Self::NONCE_LEN)?;
        let enc_key = Zeroizing::new(blake3::derive_key(Self::ENC_CONTEXT, key));
        let mac_key = Zeroizing::new(blake3::derive_key(Self::MAC_CONTEXT, key));

        let cipher = XChaCha20::new_from_slices(enc_key.as_slice(), nonce)
            .map_err(|_| CryptoError::Failure("XChaCha20 init failed".into()))?;
        let mac = blake3::Hasher::new_keyed(&mac_key);

        Ok(Box::new(EtmCipher::new(
            Keystream::XChaCha20(cipher),
            MacState::Blake3(Box::new(mac)),
            associated_data,
        )))
    }
}

/// AES-256 in CTR mode with HMAC-SHA256. 16-byte initial counter block.
struct Aes256CtrHmacSha256;

impl Aes256CtrHmacSha256 {
    const NONCE_LEN: usize = 16;
}

impl Scheme for Aes256CtrHmacSha256 {
    fn name(&self) -> &'static str {
        "AES256CTR-HMAC-SHA256"
    }
}

impl AeadScheme for Aes256CtrHmacSha256 {
    fn key_size(&self) -> usize { KEY_LEN_32 }
    fn nonce_size(&self) -> usize { Self::NONCE_LEN }
    fn tag_size(&self) -> usize { TAG_LEN_32 }

    fn new_cipher(
        &self,
        key: &[u8],
        nonce: &[u8],
        associated_data: &[u8],
    ) -> Result<Box<dyn AuthenticatedCipher>, CryptoError> {
        check_lengths(key, nonce, Self::NONCE_LEN)?;

        let hk = Hkdf::<Sha256>::new(None, key);
        let mut enc_key = Zeroizing::new([0u8; KEY_LEN_32]);
        let mut mac_key = Zeroizing::new([0u8; KEY_LEN_32]);
        hk.expand(b"pqseal v1 AES256CTR encryption key", enc_key.as_mut_slice())
            .map_err(|_| CryptoError::Failure("HKDF expand failed (SHA-256)".into()))?;
        hk.expand(b"pqseal v1 HMAC-SHA256 authentication key", mac_key.as_mut_slice())
            .map_err(|_| CryptoError::Failure("HKDF expand failed (SHA-256)".into()))?;

        let cipher = Aes256Ctr::new_from_slices(enc_key.as_slice(), nonce)
            .map_err(|_| CryptoError::Failure("AES-256-CTR init failed".into()))?;
        let mac = <HmacSha256 as Mac>::new_from_slice(mac_key.as_slice())
            .map_err(|_| CryptoError::Failure("HMAC init failed".into()))?;

        Ok(Box::new(EtmCipher::new(
            Keystream::Aes256Ctr(cipher),
            MacState::HmacSha256(mac),
            associated_data,
        )))
    }
}

pub fn register_standard(registry: &mut Registry<dyn AeadScheme>) {
    registry.register(Arc::new(XChaCha20Blake3));
    registry.register(Arc::new(Aes256CtrHmacSha256));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::SchemeFamily;

    fn registry() -> Registry<dyn AeadScheme> {
        let mut r: Registry<dyn AeadScheme> = Registry::new(SchemeFamily::Aead);
        register_standard(&mut r);
        r
    }

    #[test]
    fn chunked_encryption_matches_single_pass_and_decrypts() {
        for name in ["XCHACHA20-BLAKE3", "AES256CTR-HMAC-SHA256"] {
            let aead = registry().by_name(name).unwrap();
            let key = [7u8; 32];
            let nonce = vec![3u8; aead.nonce_size()];
            let plain: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();

            let mut whole = plain.clone();
            let mut c = aead.new_cipher(&key, &nonce, b"ad").unwrap();
            c.encrypt_in_place(&mut whole);
            let tag_whole = c.finish();

            let mut pieces = plain.clone();
            let mut c = aead.new_cipher(&key, &nonce, b"ad").unwrap();
            for chunk in pieces.chunks_mut(77) {
                c.encrypt_in_place(chunk);
            }
            assert_eq!(pieces, whole, "{name}");
            assert_eq!(c.finish(), tag_whole, "{name}");

            let mut d = aead.new_cipher(&key, &nonce, b"ad").unwrap();
            d.decrypt_in_place(&mut whole);
            assert_eq!(whole, plain, "{name}");
            assert!(tags_match(&tag_whole, &d.finish()));
        }
    }

    #[test]
    fn associated_data_changes_tag() {
        let aead = registry().by_name("XCHACHA20-BLAKE3").unwrap();
        let nonce = [0u8; 24];
        let tag_a = aead.new_cipher(&[1; 32], &nonce, b"a").unwrap().finish();
        let tag_b = aead.new_cipher(&[1; 32], &nonce, b"b").unwrap().finish();
        assert!(!tags_match(&tag_a, &tag_b));
    }

    #[test]
    fn rejects_bad_lengths() {
        let aead = registry().by_name("AES256CTR-HMAC-SHA256").unwrap();
        assert!(matches!(
            aead.new_cipher(&[0; 16], &[0; 16], b"").err(),
            Some(CryptoError::InvalidKeyLen { expected: 32, actual: 16 })
        ));
        assert!(matches!(
            aead.new_cipher(&[0; 32], &[0; 12], b"").err(),
            Some(CryptoError::InvalidNonceLen { expected: 16, actual: 12 })
        ));
    }
}
