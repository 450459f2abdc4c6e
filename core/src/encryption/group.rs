//! encryption/group.rs
//!
//! Multiple recipients: one random shared secret, sealed to each recipient's PKE key.
//!
//! Design notes:
//! - Every wrapped copy is bound to its recipient fingerprint as PKE associated data.
//! - The ordered recipient list is part of the body AD (see `build_aad`).
//! - Unwrapping tries the entry matching the key's fingerprint first, then every other
//!   entry; a key that opens none of them is `TagMismatch`.

use serde_bytes::ByteBuf;
use zeroize::Zeroizing;

use crate::config::MessageConfig;
use crate::constants::info;
use crate::crypto::{
    random_bytes, AeadScheme, AuthenticatedCipher, ExpandScheme, Fingerprint, PkeScheme, PrivateKey, PublicKey,
    KEY_LEN_32,
};
use crate::encryption::{expand_body_key, seal_body, Encrypter, Encryption, EncryptionMethod, GroupRecipient};
use crate::scheme::{Algorithm, Schemes};
use crate::types::MessageError;

pub struct GroupEncrypter {
    recipients: Vec<(PublicKey, Algorithm<dyn PkeScheme>)>,
    expand: Algorithm<dyn ExpandScheme>,
    cipher: Algorithm<dyn AeadScheme>,
}

impl GroupEncrypter {
    pub fn new(schemes: &Schemes, recipients: &[PublicKey]) -> Result<Self, MessageError> {
        Self::with_config(schemes, &MessageConfig::default(), recipients)
    }

    /// Every recipient must be a PKE key; duplicates are dropped, order is kept.
    /// Each entry is wrapped with its own key's PKE scheme; `config` picks the expander and body cipher.
    pub fn with_config(
        schemes: &Schemes,
        config: &MessageConfig,
        recipients: &[PublicKey],
    ) -> Result<Self, MessageError> {
        if recipients.is_empty() {
            return Err(MessageError::Config("group encryption needs at least one recipient".into()));
        }
        let mut resolved: Vec<(PublicKey, Algorithm<dyn PkeScheme>)> = Vec::with_capacity(recipients.len());
        for key in recipients {
            let scheme = key.algorithm().pke()?.clone();
            if resolved.iter().any(|(k, _)| k.fingerprint() == key.fingerprint()) {
                continue;
            }
            resolved.push((key.clone(), scheme));
        }
        Ok(Self {
            recipients: resolved,
            expand: schemes.expand.by_name(&config.expand)?,
            cipher: schemes.aead.by_name(&config.cipher)?,
        })
    }

    pub fn recipients(&self) -> impl Iterator<Item = Fingerprint> + '_ {
        self.recipients.iter().map(|(k, _)| k.fingerprint())
    }
}

impl Encrypter for GroupEncrypter {
    fn cipher(&self) -> &Algorithm<dyn AeadScheme> {
        &self.cipher
    }

    fn encrypt(&self, context: &[u8]) -> Result<(Box<dyn AuthenticatedCipher>, Encryption), MessageError> {
        let shared = Zeroizing::new(random_bytes(KEY_LEN_32));
        let mut entries = Vec::with_capacity(self.recipients.len());
        for (key, scheme) in &self.recipients {
            let fingerprint = key.fingerprint();
            let wrapped = scheme.encrypt(key.as_bytes(), &shared, fingerprint.as_bytes())?;
            entries.push(GroupRecipient { fingerprint, scheme: scheme.encode(), wrapped: ByteBuf::from(wrapped) });
        }
        let bound: Vec<Fingerprint> = entries.iter().map(|e| e.fingerprint).collect();
        let body_key = expand_body_key(&self.expand, &shared, &[], info::GROUP_KEY, &self.cipher)?;
        let (live, nonce) = seal_body(&self.cipher, &body_key, context, &bound)?;
        tracing::debug!(recipients = entries.len(), "group secret wrapped");
        let method = EncryptionMethod::Group { expand: self.expand.encode(), recipients: entries };
        Ok((live, Encryption { cipher: self.cipher.encode(), nonce, method }))
    }
}

pub(crate) fn recover_key(
    recipients: &[GroupRecipient],
    expand: &Algorithm<dyn ExpandScheme>,
    key: &PrivateKey,
    cipher: &Algorithm<dyn AeadScheme>,
) -> Result<Zeroizing<Vec<u8>>, MessageError> {
    let scheme = key.algorithm().pke()?;
    let own = key.fingerprint();
    let (mine, others): (Vec<&GroupRecipient>, Vec<&GroupRecipient>) =
        recipients.iter().partition(|r| r.fingerprint == own);

    for entry in mine.into_iter().chain(others) {
        if let Ok(shared) = scheme.decrypt(key.secret_bytes(), &entry.wrapped, entry.fingerprint.as_bytes()) {
            return expand_body_key(expand, &shared, &[], info::GROUP_KEY, cipher);
        }
    }
    tracing::warn!(recipient = %own, entries = recipients.len(), "no group entry opened");
    Err(MessageError::TagMismatch)
}
