//! encryption/passphrase.rs
//! Body key stretched from a passphrase with a memory-hard KDF.
//!
//! A wrong passphrase is not detected here: it derives a different key and shows up
//! as a tag mismatch once the body has been drained.

use serde_bytes::ByteBuf;
use zeroize::Zeroizing;

use crate::config::MessageConfig;
use crate::constants::defaults::SALT_LEN;
use crate::crypto::nonce::validate_salt;
use crate::crypto::{
    random_bytes, AeadScheme, AuthenticatedCipher, CryptoError, KdfCost, KdfScheme, PassphraseProvider,
};
use crate::encryption::{seal_body, Encrypter, Encryption, EncryptionMethod};
use crate::scheme::{Algorithm, Schemes};
use crate::types::MessageError;

pub struct PassphraseEncrypter {
    passphrase: Zeroizing<String>,
    kdf: Algorithm<dyn KdfScheme>,
    cost: KdfCost,
    cipher: Algorithm<dyn AeadScheme>,
}

impl PassphraseEncrypter {
    pub fn new<P: PassphraseProvider + ?Sized>(schemes: &Schemes, passphrase: &P) -> Result<Self, MessageError> {
        Self::with_config(schemes, &MessageConfig::default(), passphrase)
    }

    /// Asks the provider once, up front; an empty passphrase is refused here.
    pub fn with_config<P: PassphraseProvider + ?Sized>(
        schemes: &Schemes,
        config: &MessageConfig,
        passphrase: &P,
    ) -> Result<Self, MessageError> {
        let kdf = schemes.kdf.by_name(&config.kdf)?;
        let cipher = schemes.aead.by_name(&config.cipher)?;
        let cost = match &config.kdf_cost {
            Some(cost) => cost.clone(),
            None => kdf.default_cost(),
        };
        kdf.validate_cost(&cost)?;
        let passphrase = passphrase.passphrase()?;
        if passphrase.is_empty() {
            return Err(CryptoError::EmptyPassphrase.into());
        }
        Ok(Self { passphrase, kdf, cost, cipher })
    }

    /// Override the work factor.
    pub fn cost(mut self, cost: KdfCost) -> Result<Self, MessageError> {
        self.kdf.validate_cost(&cost)?;
        self.cost = cost;
        Ok(self)
    }
}

impl Encrypter for PassphraseEncrypter {
    fn cipher(&self) -> &Algorithm<dyn AeadScheme> {
        &self.cipher
    }

    fn encrypt(&self, context: &[u8]) -> Result<(Box<dyn AuthenticatedCipher>, Encryption), MessageError> {
        let salt = random_bytes(SALT_LEN);
        let key = derive_key(&self.kdf, &self.cost, &salt, &self.passphrase, &self.cipher)?;
        let (live, nonce) = seal_body(&self.cipher, &key, context, &[])?;
        let method = EncryptionMethod::Passphrase {
            kdf: self.kdf.encode(),
            cost: self.cost.clone(),
            salt: ByteBuf::from(salt),
        };
        Ok((live, Encryption { cipher: self.cipher.encode(), nonce, method }))
    }
}

pub(crate) fn derive_key(
    kdf: &Algorithm<dyn KdfScheme>,
    cost: &KdfCost,
    salt: &[u8],
    passphrase: &str,
    cipher: &Algorithm<dyn AeadScheme>,
) -> Result<Zeroizing<Vec<u8>>, MessageError> {
    validate_salt(salt)?;
    let mut key = Zeroizing::new(vec![0u8; cipher.key_size()]);
    kdf.derive(passphrase.as_bytes(), salt, cost, &mut key)?;
    Ok(key)
}
