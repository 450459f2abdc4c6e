//! crypto/sign.rs
//! Detached signature schemes.
//!
//! Each scheme names the digest the pipelines hash plaintext with before signing.

use std::sync::Arc;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use pqcrypto_dilithium::dilithium3 as dilithium;
use pqcrypto_traits::sign::{DetachedSignature as _, PublicKey as _, SecretKey as _};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::crypto::kem::KeyPairBytes;
use crate::crypto::types::CryptoError;
use crate::scheme::{Registry, Scheme};

pub trait SignatureScheme: Scheme {
    /// Name of the hash scheme the signed digest is computed with.
    fn digest(&self) -> &'static str;

    fn generate(&self) -> KeyPairBytes;

    fn sign(&self, private_key: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError>;

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError>;
}

struct Dilithium3;

impl Scheme for Dilithium3 {
    fn name(&self) -> &'static str {
        "DILITHIUM3"
    }
}

impl SignatureScheme for Dilithium3 {
    fn digest(&self) -> &'static str {
        "SHA3-512"
    }

    fn generate(&self) -> KeyPairBytes {
        let (pk, sk) = dilithium::keypair();
        (pk.as_bytes().to_vec(), Zeroizing::new(sk.as_bytes().to_vec()))
    }

    fn sign(&self, private_key: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let sk = dilithium::SecretKey::from_bytes(private_key)
            .map_err(|_| CryptoError::Malformed("dilithium private key"))?;
        Ok(dilithium::detached_sign(message, &sk).as_bytes().to_vec())
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let pk = dilithium::PublicKey::from_bytes(public_key)
            .map_err(|_| CryptoError::Malformed("dilithium public key"))?;
        let sig = dilithium::DetachedSignature::from_bytes(signature)
            .map_err(|_| CryptoError::Malformed("dilithium signature"))?;
        dilithium::verify_detached_signature(&sig, message, &pk).map_err(|_| CryptoError::BadSignature)
    }
}

struct Ed25519;

impl Scheme for Ed25519 {
    fn name(&self) -> &'static str {
        "ED25519"
    }
}

impl SignatureScheme for Ed25519 {
    fn digest(&self) -> &'static str {
        "SHA512"
    }

    fn generate(&self) -> KeyPairBytes {
        let sk = SigningKey::generate(&mut OsRng);
        (sk.verifying_key().to_bytes().to_vec(), Zeroizing::new(sk.to_bytes().to_vec()))
    }

    fn sign(&self, private_key: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let bytes: Zeroizing<[u8; 32]> = Zeroizing::new(
            private_key
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLen { expected: 32, actual: private_key.len() })?,
        );
        let sk = SigningKey::from_bytes(&bytes);
        Ok(sk.sign(message).to_bytes().to_vec())
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let pk: [u8; 32] = public_key
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLen { expected: 32, actual: public_key.len() })?;
        let vk = VerifyingKey::from_bytes(&pk).map_err(|_| CryptoError::Malformed("ed25519 public key"))?;
        let sig = ed25519_dalek::Signature::from_slice(signature)
            .map_err(|_| CryptoError::Malformed("ed25519 signature"))?;
        vk.verify_strict(message, &sig).map_err(|_| CryptoError::BadSignature)
    }
}

pub fn register_standard(registry: &mut Registry<dyn SignatureScheme>) {
    registry.register(Arc::new(Dilithium3));
    registry.register(Arc::new(Ed25519));
}
