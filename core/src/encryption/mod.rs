//! encryption/mod.rs
//!
//! Confidentiality strategies for the message body.
//!
//! Design notes:
//! - Each encrypter yields a live body cipher plus the `Encryption` descriptor that lets
//!   the receiver rebuild it. The descriptor never carries key material in the clear.
//! - Body associated data = header context + cipher name + (group only) the ordered
//!   recipient fingerprints, so recipients cannot be swapped or substituted.
//! - Opening a descriptor takes an `Unlock` the receive pipeline resolved beforehand;
//!   missing secrets never reach this module.

pub mod passphrase;
pub mod secret;
pub mod group;
pub mod derived;

use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use zeroize::Zeroizing;

use crate::crypto::{
    build_aad, fresh_nonce, AeadScheme, AuthenticatedCipher, ExpandScheme, Fingerprint, KdfCost,
    PrivateKey,
};
use crate::scheme::{Algorithm, SchemeName, Schemes};
use crate::types::MessageError;

pub use derived::DerivedEncrypter;
pub use group::GroupEncrypter;
pub use passphrase::PassphraseEncrypter;
pub use secret::SecretEncrypter;

/// Produces the body cipher on the send path.
pub trait Encrypter {
    fn cipher(&self) -> &Algorithm<dyn AeadScheme>;

    /// `context` is the header AD context (`Header::aad_context`).
    fn encrypt(&self, context: &[u8]) -> Result<(Box<dyn AuthenticatedCipher>, Encryption), MessageError>;
}

/// Per-recipient entry of a group descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecipient {
    pub fingerprint: Fingerprint,
    pub scheme: SchemeName,
    /// Shared secret sealed to this recipient.
    pub wrapped: ByteBuf,
}

/// How the body key is obtained.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionMethod {
    Passphrase { kdf: SchemeName, cost: KdfCost, salt: ByteBuf },
    Secret { kem: SchemeName, expand: SchemeName, recipient: Fingerprint, ciphertext: ByteBuf },
    Group { expand: SchemeName, recipients: Vec<GroupRecipient> },
    Derived,
}

/// Serializable descriptor carried in the header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encryption {
    pub cipher: SchemeName,
    pub nonce: ByteBuf,
    pub method: EncryptionMethod,
}

/// Secret material matching the descriptor variant.
pub enum Unlock<'k> {
    Passphrase(Zeroizing<String>),
    /// KEM key for `Secret`, PKE key for `Group`.
    Recipient(&'k PrivateKey),
    Derived(&'k [u8]),
}

impl Encryption {
    pub fn kind(&self) -> &'static str {
        match self.method {
            EncryptionMethod::Passphrase { .. } => "passphrase",
            EncryptionMethod::Secret { .. }     => "secret",
            EncryptionMethod::Group { .. }      => "group",
            EncryptionMethod::Derived           => "derived",
        }
    }

    /// Fingerprints bound into the associated data.
    pub fn bound_recipients(&self) -> Vec<Fingerprint> {
        match &self.method {
            EncryptionMethod::Group { recipients, .. } => recipients.iter().map(|r| r.fingerprint).collect(),
            _ => Vec::new(),
        }
    }

    /// Resolve every scheme name and check the nonce length.
    pub fn validate(&self, schemes: &Schemes) -> Result<Algorithm<dyn AeadScheme>, MessageError> {
        let cipher = Algorithm::decode(&self.cipher, &schemes.aead)?;
        crate::crypto::nonce::validate_nonce_len(cipher.nonce_size(), &self.nonce)?;
        match &self.method {
            EncryptionMethod::Passphrase { kdf, cost, .. } => {
                Algorithm::decode(kdf, &schemes.kdf)?.validate_cost(cost)?;
            }
            EncryptionMethod::Secret { kem, expand, .. } => {
                Algorithm::decode(kem, &schemes.kem)?;
                Algorithm::decode(expand, &schemes.expand)?;
            }
            EncryptionMethod::Group { expand, recipients } => {
                Algorithm::decode(expand, &schemes.expand)?;
                for r in recipients {
                    Algorithm::decode(&r.scheme, &schemes.pke)?;
                }
            }
            EncryptionMethod::Derived => {}
        }
        Ok(cipher)
    }

    /// Rebuild the body cipher from the descriptor and the caller's secret.
    pub fn open(
        &self,
        schemes: &Schemes,
        unlock: Unlock<'_>,
        context: &[u8],
    ) -> Result<Box<dyn AuthenticatedCipher>, MessageError> {
        let cipher = self.validate(schemes)?;
        let key = match (&self.method, unlock) {
            (EncryptionMethod::Passphrase { kdf, cost, salt }, Unlock::Passphrase(pass)) => {
                let kdf = Algorithm::decode(kdf, &schemes.kdf)?;
                passphrase::derive_key(&kdf, cost, salt, &pass, &cipher)?
            }
            (EncryptionMethod::Secret { kem, expand, ciphertext, .. }, Unlock::Recipient(key)) => {
                let expand = Algorithm::decode(expand, &schemes.expand)?;
                secret::recover_key(kem, &expand, ciphertext, key, &cipher)?
            }
            (EncryptionMethod::Group { expand, recipients }, Unlock::Recipient(key)) => {
                let expand = Algorithm::decode(expand, &schemes.expand)?;
                group::recover_key(recipients, &expand, key, &cipher)?
            }
            (EncryptionMethod::Derived, Unlock::Derived(key)) => Zeroizing::new(key.to_vec()),
            (_, _) => {
                return Err(MessageError::Config(format!(
                    "secret does not match {} encryption",
                    self.kind()
                )))
            }
        };
        let aad = build_aad(context, cipher.name(), &self.bound_recipients());
        tracing::debug!(kind = self.kind(), cipher = cipher.name(), "body cipher opened");
        Ok(cipher.new_cipher(&key, &self.nonce, &aad)?)
    }
}

/// Fresh nonce, bound AD, and a live cipher for `key`.
pub(crate) fn seal_body(
    cipher: &Algorithm<dyn AeadScheme>,
    key: &[u8],
    context: &[u8],
    recipients: &[Fingerprint],
) -> Result<(Box<dyn AuthenticatedCipher>, ByteBuf), MessageError> {
    let nonce = fresh_nonce(cipher.nonce_size());
    let aad = build_aad(context, cipher.name(), recipients);
    let live = cipher.new_cipher(key, &nonce, &aad)?;
    Ok((live, ByteBuf::from(nonce)))
}

/// Body key from a shared secret; `info` is suffixed with the cipher name.
pub(crate) fn expand_body_key(
    expand: &Algorithm<dyn ExpandScheme>,
    shared: &[u8],
    salt: &[u8],
    info: &[u8],
    cipher: &Algorithm<dyn AeadScheme>,
) -> Result<Zeroizing<Vec<u8>>, MessageError> {
    let mut label = info.to_vec();
    label.extend_from_slice(cipher.name().as_bytes());
    let mut key = Zeroizing::new(vec![0u8; cipher.key_size()]);
    expand.expand(shared, salt, &label, &mut key)?;
    Ok(key)
}
