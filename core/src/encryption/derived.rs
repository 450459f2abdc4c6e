//! encryption/derived.rs
//! Caller-supplied body key (negotiated out of band). The descriptor names only the cipher.

use zeroize::Zeroizing;

use crate::config::MessageConfig;
use crate::crypto::{AeadScheme, AuthenticatedCipher, CryptoError};
use crate::encryption::{seal_body, Encrypter, Encryption, EncryptionMethod};
use crate::scheme::{Algorithm, Schemes};
use crate::types::MessageError;

pub struct DerivedEncrypter {
    key: Zeroizing<Vec<u8>>,
    cipher: Algorithm<dyn AeadScheme>,
}

impl DerivedEncrypter {
    pub fn new(schemes: &Schemes, key: &[u8]) -> Result<Self, MessageError> {
        Self::with_config(schemes, &MessageConfig::default(), key)
    }

    pub fn with_config(schemes: &Schemes, config: &MessageConfig, key: &[u8]) -> Result<Self, MessageError> {
        let cipher = schemes.aead.by_name(&config.cipher)?;
        if key.len() != cipher.key_size() {
            return Err(CryptoError::InvalidKeyLen { expected: cipher.key_size(), actual: key.len() }.into());
        }
        Ok(Self { key: Zeroizing::new(key.to_vec()), cipher })
    }
}

impl Encrypter for DerivedEncrypter {
    fn cipher(&self) -> &Algorithm<dyn AeadScheme> {
        &self.cipher
    }

    fn encrypt(&self, context: &[u8]) -> Result<(Box<dyn AuthenticatedCipher>, Encryption), MessageError> {
        let (live, nonce) = seal_body(&self.cipher, &self.key, context, &[])?;
        Ok((live, Encryption { cipher: self.cipher.encode(), nonce, method: EncryptionMethod::Derived }))
    }
}
