//! crypto/kem.rs
//! Key encapsulation (ML-KEM).
//!
//! Design notes:
//! - Keys and ciphertexts cross this boundary as raw encoded bytes; each scheme checks sizes.
//! - ML-KEM decapsulation uses implicit rejection: a foreign ciphertext or key yields an
//!   unrelated shared secret, which surfaces later as a tag mismatch.

use std::sync::Arc;

use ml_kem::kem::{Decapsulate, Encapsulate};
use ml_kem::{Ciphertext, EncodedSizeUser, KemCore, MlKem1024, MlKem768};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::crypto::types::{CryptoError, SHARED_SECRET_LEN};
use crate::scheme::{Registry, Scheme};

/// Raw encoded key pair: (public, private).
pub type KeyPairBytes = (Vec<u8>, Zeroizing<Vec<u8>>);

pub trait KemScheme: Scheme {
    fn public_key_size(&self) -> usize;
    fn private_key_size(&self) -> usize;
    fn ciphertext_size(&self) -> usize;

    fn shared_secret_size(&self) -> usize {
        SHARED_SECRET_LEN
    }

    fn generate(&self) -> KeyPairBytes;

    /// Returns (ciphertext, shared secret).
    fn encapsulate(&self, public_key: &[u8]) -> Result<(Vec<u8>, Zeroizing<Vec<u8>>), CryptoError>;

    fn decapsulate(&self, private_key: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError>;
}

macro_rules! ml_kem_scheme {
    ($ty:ident, $kem:ty, $name:literal, $pk:literal, $sk:literal, $ct:literal) => {
        pub(crate) struct $ty;

        impl Scheme for $ty {
            fn name(&self) -> &'static str {
                $name
            }
        }

        impl KemScheme for $ty {
            fn public_key_size(&self) -> usize { $pk }
            fn private_key_size(&self) -> usize { $sk }
            fn ciphertext_size(&self) -> usize { $ct }

            fn generate(&self) -> KeyPairBytes {
                let (dk, ek) = <$kem>::generate(&mut OsRng);
                (ek.as_bytes().to_vec(), Zeroizing::new(dk.as_bytes().to_vec()))
            }

            fn encapsulate(&self, public_key: &[u8]) -> Result<(Vec<u8>, Zeroizing<Vec<u8>>), CryptoError> {
                if public_key.len() != $pk {
                    return Err(CryptoError::InvalidKeyLen { expected: $pk, actual: public_key.len() });
                }
                let ek = <$kem as KemCore>::EncapsulationKey::from_bytes(
                    &public_key.try_into().map_err(|_| CryptoError::Malformed("ml-kem public key"))?,
                );
                let (ct, shared) = ek
                    .encapsulate(&mut OsRng)
                    .map_err(|_| CryptoError::Failure(concat!($name, " encapsulation failed").into()))?;
                Ok((ct.as_slice().to_vec(), Zeroizing::new(shared.as_slice().to_vec())))
            }

            fn decapsulate(&self, private_key: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
                if private_key.len() != $sk {
                    return Err(CryptoError::InvalidKeyLen { expected: $sk, actual: private_key.len() });
                }
                let dk = <$kem as KemCore>::DecapsulationKey::from_bytes(
                    &private_key.try_into().map_err(|_| CryptoError::Malformed("ml-kem private key"))?,
                );
                let ct: Ciphertext<$kem> = ciphertext
                    .try_into()
                    .map_err(|_| CryptoError::Malformed("ml-kem ciphertext"))?;
                let shared = dk
                    .decapsulate(&ct)
                    .map_err(|_| CryptoError::Decapsulation($name))?;
                Ok(Zeroizing::new(shared.as_slice().to_vec()))
            }
        }
    };
}

ml_kem_scheme!(MlKem768Scheme, MlKem768, "ML-KEM-768", 1184, 2400, 1088);
ml_kem_scheme!(MlKem1024Scheme, MlKem1024, "ML-KEM-1024", 1568, 3168, 1568);

pub fn register_standard(registry: &mut Registry<dyn KemScheme>) {
    registry.register(Arc::new(MlKem768Scheme));
    registry.register(Arc::new(MlKem1024Scheme));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encapsulate_decapsulate_agree() {
        for kem in [&MlKem768Scheme as &dyn KemScheme, &MlKem1024Scheme] {
            let (pk, sk) = kem.generate();
            assert_eq!(pk.len(), kem.public_key_size());
            assert_eq!(sk.len(), kem.private_key_size());
            let (ct, shared) = kem.encapsulate(&pk).unwrap();
            assert_eq!(ct.len(), kem.ciphertext_size());
            let again = kem.decapsulate(&sk, &ct).unwrap();
            assert_eq!(shared.as_slice(), again.as_slice());
        }
    }

    #[test]
    fn foreign_key_yields_different_secret() {
        let kem = MlKem768Scheme;
        let (pk, _) = kem.generate();
        let (_, other_sk) = kem.generate();
        let (ct, shared) = kem.encapsulate(&pk).unwrap();
        let wrong = kem.decapsulate(&other_sk, &ct).unwrap();
        assert_ne!(shared.as_slice(), wrong.as_slice());
    }

    #[test]
    fn short_public_key_rejected() {
        assert!(matches!(
            MlKem1024Scheme.encapsulate(&[0u8; 10]),
            Err(CryptoError::InvalidKeyLen { expected: 1568, actual: 10 })
        ));
    }
}
