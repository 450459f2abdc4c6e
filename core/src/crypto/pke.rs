//! crypto/pke.rs
//! Public-key encryption of short payloads (message keys) to a recipient.
//!
//! Design notes:
//! - KEM encapsulation to the recipient key, HKDF-SHA256 over the shared secret to a
//!   32-byte wrap key, then one-shot AEAD of the payload.
//! - Layout: `kem_ciphertext || wrap_nonce || sealed_payload_and_tag`.
//! - Any failure to unwrap (wrong key, tampering) is reported as a decapsulation failure.

use std::sync::Arc;

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce as AesNonce};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::constants::info;
use crate::crypto::kem::{KemScheme, KeyPairBytes, MlKem1024Scheme, MlKem768Scheme};
use crate::crypto::nonce::fresh_nonce;
use crate::crypto::types::{CryptoError, KEY_LEN_32};
use crate::scheme::{Registry, Scheme};

pub trait PkeScheme: Scheme {
    /// Underlying KEM; recipient keys are KEM keys.
    fn kem(&self) -> &dyn KemScheme;

    fn generate(&self) -> KeyPairBytes {
        self.kem().generate()
    }

    fn encrypt(&self, public_key: &[u8], plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, CryptoError>;

    fn decrypt(
        &self,
        private_key: &[u8],
        ciphertext: &[u8],
        associated_data: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError>;
}

/// One-shot AEAD used for the wrap step.
#[derive(Copy, Clone, Debug)]
enum WrapCipher {
    Aes256Gcm,
    XChaCha20Poly1305,
}

impl WrapCipher {
    fn nonce_len(self) -> usize {
        match self {
            WrapCipher::Aes256Gcm => 12,
            WrapCipher::XChaCha20Poly1305 => 24,
        }
    }

    fn seal(self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let invalid = CryptoError::InvalidKeyLen { expected: KEY_LEN_32, actual: key.len() };
        let payload = Payload { msg: plaintext, aad };
        match self {
            WrapCipher::Aes256Gcm => Aes256Gcm::new_from_slice(key)
                .map_err(|_| invalid)?
                .encrypt(AesNonce::from_slice(nonce), payload)
                .map_err(|_| CryptoError::Failure("AES-GCM seal failed".into())),
            WrapCipher::XChaCha20Poly1305 => XChaCha20Poly1305::new_from_slice(key)
                .map_err(|_| invalid)?
                .encrypt(XNonce::from_slice(nonce), payload)
                .map_err(|_| CryptoError::Failure("XChaCha20-Poly1305 seal failed".into())),
        }
    }

    fn open(self, key: &[u8], nonce: &[u8], aad: &[u8], sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let invalid = CryptoError::InvalidKeyLen { expected: KEY_LEN_32, actual: key.len() };
        let payload = Payload { msg: sealed, aad };
        match self {
            WrapCipher::Aes256Gcm => Aes256Gcm::new_from_slice(key)
                .map_err(|_| invalid)?
                .decrypt(AesNonce::from_slice(nonce), payload)
                .map_err(|_| CryptoError::TagMismatch),
            WrapCipher::XChaCha20Poly1305 => XChaCha20Poly1305::new_from_slice(key)
                .map_err(|_| invalid)?
                .decrypt(XNonce::from_slice(nonce), payload)
                .map_err(|_| CryptoError::TagMismatch),
        }
    }
}

struct KemWrap {
    name: &'static str,
    kem: Box<dyn KemScheme>,
    wrap: WrapCipher,
}

impl KemWrap {
    fn wrap_key(&self, shared: &[u8], kem_ct: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN_32]>, CryptoError> {
        let mut key = Zeroizing::new([0u8; KEY_LEN_32]);
        let mut label = Vec::with_capacity(info::WRAP_KEY.len() + self.name.len());
        label.extend_from_slice(info::WRAP_KEY);
        label.extend_from_slice(self.name.as_bytes());
        Hkdf::<Sha256>::new(Some(kem_ct), shared)
            .expand(&label, key.as_mut_slice())
            .map_err(|_| CryptoError::Failure("HKDF expand failed (SHA-256)".into()))?;
        Ok(key)
    }
}

impl Scheme for KemWrap {
    fn name(&self) -> &'static str {
        self.name
    }
}

impl PkeScheme for KemWrap {
    fn kem(&self) -> &dyn KemScheme {
        self.kem.as_ref()
    }

    fn encrypt(&self, public_key: &[u8], plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let (kem_ct, shared) = self.kem.encapsulate(public_key)?;
        let key = self.wrap_key(&shared, &kem_ct)?;
        let nonce = fresh_nonce(self.wrap.nonce_len());
        let sealed = self.wrap.seal(key.as_slice(), &nonce, associated_data, plaintext)?;

        let mut out = Vec::with_capacity(kem_ct.len() + nonce.len() + sealed.len());
        out.extend_from_slice(&kem_ct);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn decrypt(
        &self,
        private_key: &[u8],
        ciphertext: &[u8],
        associated_data: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let ct_len = self.kem.ciphertext_size();
        let nonce_len = self.wrap.nonce_len();
        if ciphertext.len() < ct_len + nonce_len {
            return Err(CryptoError::Malformed("pke ciphertext"));
        }
        let (kem_ct, rest) = ciphertext.split_at(ct_len);
        let (nonce, sealed) = rest.split_at(nonce_len);

        let shared = self.kem.decapsulate(private_key, kem_ct)?;
        let key = self.wrap_key(&shared, kem_ct)?;
        self.wrap
            .open(key.as_slice(), nonce, associated_data, sealed)
            .map(Zeroizing::new)
            .map_err(|_| CryptoError::Decapsulation(self.name))
    }
}

pub fn register_standard(registry: &mut Registry<dyn PkeScheme>) {
    registry.register(Arc::new(KemWrap {
        name: "ML-KEM-768-AES256GCM",
        kem: Box::new(MlKem768Scheme),
        wrap: WrapCipher::Aes256Gcm,
    }));
    registry.register(Arc::new(KemWrap {
        name: "ML-KEM-1024-XCHACHA20POLY1305",
        kem: Box::new(MlKem1024Scheme),
        wrap: WrapCipher::XChaCha20Poly1305,
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::SchemeFamily;

    fn registry() -> Registry<dyn PkeScheme> {
        let mut r: Registry<dyn PkeScheme> = Registry::new(SchemeFamily::Pke);
        register_standard(&mut r);
        r
    }

    #[test]
    fn wrap_unwrap_with_each_scheme() {
        for name in ["ML-KEM-768-AES256GCM", "ML-KEM-1024-XCHACHA20POLY1305"] {
            let pke = registry().by_name(name).unwrap();
            let (pk, sk) = pke.generate();
            let ct = pke.encrypt(&pk, &[9u8; 32], b"recipient").unwrap();
            let pt = pke.decrypt(&sk, &ct, b"recipient").unwrap();
            assert_eq!(pt.as_slice(), &[9u8; 32]);
            assert!(pke.decrypt(&sk, &ct, b"someone else").is_err(), "{name}");
        }
    }

    #[test]
    fn wrong_recipient_fails_closed() {
        let pke = registry().by_name("ml-kem-768-aes256gcm").unwrap();
        let (pk, _) = pke.generate();
        let (_, other_sk) = pke.generate();
        let ct = pke.encrypt(&pk, b"key", b"").unwrap();
        assert_eq!(
            pke.decrypt(&other_sk, &ct, b"").unwrap_err(),
            CryptoError::Decapsulation("ML-KEM-768-AES256GCM")
        );
    }
}
