//! config.rs
//! Scheme choices and sizing for message construction.
//!
//! Loadable from JSON; every field has a default so partial documents work.

use serde::{Deserialize, Serialize};

use crate::constants::{defaults, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use crate::crypto::KdfCost;
use crate::scheme::Schemes;
use crate::types::MessageError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Body cipher for every encrypter.
    pub cipher: String,
    /// Passphrase KDF.
    pub kdf: String,
    /// `None` uses the KDF's own default cost.
    pub kdf_cost: Option<KdfCost>,
    /// Expander turning KEM/group secrets into body keys.
    pub expand: String,
    pub chunk_size: usize,
    /// Compression applied when the builder is not told otherwise.
    pub compression: Option<String>,
    pub compression_level: Option<i32>,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            cipher: defaults::CIPHER.to_string(),
            kdf: defaults::KDF.to_string(),
            kdf_cost: None,
            expand: defaults::EXPAND.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            compression: None,
            compression_level: None,
        }
    }
}

impl MessageConfig {
    pub fn from_json(text: &str) -> Result<Self, MessageError> {
        serde_json::from_str(text).map_err(|e| MessageError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, MessageError> {
        serde_json::to_string_pretty(self).map_err(|e| MessageError::Config(e.to_string()))
    }

    /// Resolve every name and bound the chunk size.
    pub fn validate(&self, schemes: &Schemes) -> Result<(), MessageError> {
        validate_chunk_size(self.chunk_size)?;
        schemes.aead.by_name(&self.cipher)?;
        schemes.expand.by_name(&self.expand)?;
        let kdf = schemes.kdf.by_name(&self.kdf)?;
        if let Some(cost) = &self.kdf_cost {
            kdf.validate_cost(cost)?;
        }
        if let Some(name) = &self.compression {
            schemes.compression.by_name(name)?.validate_level(self.compression_level)?;
        }
        Ok(())
    }
}

pub(crate) fn validate_chunk_size(chunk_size: usize) -> Result<(), MessageError> {
    if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&chunk_size) {
        return Err(MessageError::Config(format!(
            "chunk size {chunk_size} outside {MIN_CHUNK_SIZE}..={MAX_CHUNK_SIZE}"
        )));
    }
    Ok(())
}
