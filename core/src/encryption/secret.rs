//! encryption/secret.rs
//! Single recipient: a KEM shared secret expanded into the body key.

use serde_bytes::ByteBuf;
use zeroize::Zeroizing;

use crate::config::MessageConfig;
use crate::constants::info;
use crate::crypto::{AeadScheme, AuthenticatedCipher, ExpandScheme, KemScheme, PrivateKey, PublicKey};
use crate::encryption::{expand_body_key, seal_body, Encrypter, Encryption, EncryptionMethod};
use crate::scheme::{Algorithm, SchemeName, Schemes};
use crate::types::MessageError;

pub struct SecretEncrypter {
    recipient: PublicKey,
    kem: Algorithm<dyn KemScheme>,
    expand: Algorithm<dyn ExpandScheme>,
    cipher: Algorithm<dyn AeadScheme>,
}

impl SecretEncrypter {
    pub fn new(schemes: &Schemes, recipient: &PublicKey) -> Result<Self, MessageError> {
        Self::with_config(schemes, &MessageConfig::default(), recipient)
    }

    /// `recipient` must be a KEM key.
    pub fn with_config(
        schemes: &Schemes,
        config: &MessageConfig,
        recipient: &PublicKey,
    ) -> Result<Self, MessageError> {
        let kem = recipient.algorithm().kem()?.clone();
        Ok(Self {
            recipient: recipient.clone(),
            kem,
            expand: schemes.expand.by_name(&config.expand)?,
            cipher: schemes.aead.by_name(&config.cipher)?,
        })
    }
}

impl Encrypter for SecretEncrypter {
    fn cipher(&self) -> &Algorithm<dyn AeadScheme> {
        &self.cipher
    }

    fn encrypt(&self, context: &[u8]) -> Result<(Box<dyn AuthenticatedCipher>, Encryption), MessageError> {
        let (ciphertext, shared) = self.kem.encapsulate(self.recipient.as_bytes())?;
        let key = expand_body_key(&self.expand, &shared, &ciphertext, info::SECRET_KEY, &self.cipher)?;
        let (live, nonce) = seal_body(&self.cipher, &key, context, &[])?;
        let method = EncryptionMethod::Secret {
            kem: self.kem.encode(),
            expand: self.expand.encode(),
            recipient: self.recipient.fingerprint(),
            ciphertext: ByteBuf::from(ciphertext),
        };
        Ok((live, Encryption { cipher: self.cipher.encode(), nonce, method }))
    }
}

/// Decapsulate with the supplied key as given.
///
/// A key of another KEM or a malformed ciphertext is reported as `TagMismatch`, the
/// same outcome ML-KEM's implicit rejection produces for a wrong key of the right size.
pub(crate) fn recover_key(
    kem: &SchemeName,
    expand: &Algorithm<dyn ExpandScheme>,
    ciphertext: &[u8],
    key: &PrivateKey,
    cipher: &Algorithm<dyn AeadScheme>,
) -> Result<Zeroizing<Vec<u8>>, MessageError> {
    let scheme = key.algorithm().kem()?;
    if scheme.name() != kem.as_str() {
        tracing::debug!(expected = %kem, actual = scheme.name(), "recipient key scheme differs from descriptor");
    }
    let shared = scheme.decapsulate(key.secret_bytes(), ciphertext).map_err(|e| {
        tracing::warn!(error = %e, "decapsulation failed");
        MessageError::TagMismatch
    })?;
    expand_body_key(expand, &shared, ciphertext, info::SECRET_KEY, cipher)
}
