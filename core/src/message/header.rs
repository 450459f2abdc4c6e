//! message/header.rs
//!
//! Message header and the associated-data context derived from it.
//!
//! Design notes:
//! - Every field is optional; an all-absent header is a plain message.
//! - Optional fields are omitted from the CBOR map, never written as null.
//! - The AD context covers every header field fixed before encryption. The
//!   `Encryption` descriptor binds itself separately (cipher name, recipients).

use serde::{Deserialize, Serialize};

use crate::crypto::Fingerprint;
use crate::encryption::Encryption;
use crate::message::wire::{self, PacketType};
use crate::scheme::{Algorithm, SchemeName, Schemes};
use crate::compression::CompressionScheme;
use crate::types::MessageError;
use crate::utils::is_zero_i64;

/// Optional file metadata. All-zero means absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub created: i64,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub modified: i64,
}

impl FileInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn with_times(mut self, created: i64, modified: i64) -> Self {
        self.created = created;
        self.modified = modified;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.created == 0 && self.modified == 0
    }
}

/// Compression algorithm and the level it ran at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionInfo {
    pub algorithm: SchemeName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
}

impl CompressionInfo {
    pub fn resolve(&self, schemes: &Schemes) -> Result<Algorithm<dyn CompressionScheme>, MessageError> {
        Ok(Algorithm::decode(&self.algorithm, &schemes.compression)?)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Signer fingerprint; absent means unsigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Fingerprint>,
    /// Signing time, unix seconds.
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<Encryption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<CompressionInfo>,
    #[serde(default, skip_serializing_if = "FileInfo::is_empty")]
    pub file: FileInfo,
}

#[derive(Serialize)]
struct AadContext<'h> {
    packet: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    sender: Option<&'h Fingerprint>,
    time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    compression: Option<&'h CompressionInfo>,
    file: &'h FileInfo,
}

impl Header {
    pub fn is_signed(&self) -> bool {
        self.sender.is_some_and(|fp| !fp.is_empty())
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_some()
    }

    pub fn is_compressed(&self) -> bool {
        self.compression.is_some()
    }

    /// CBOR of the header fields authenticated by the body cipher.
    pub fn aad_context(&self) -> Result<Vec<u8>, MessageError> {
        wire::to_cbor(&AadContext {
            packet: PacketType::Message.into(),
            sender: self.sender.as_ref(),
            time: self.time,
            compression: self.compression.as_ref(),
            file: &self.file,
        })
    }

    /// Resolve every scheme name the header carries.
    pub fn validate(&self, schemes: &Schemes) -> Result<(), MessageError> {
        if let Some(info) = &self.compression {
            info.resolve(schemes)?.validate_level(info.level)?;
        }
        if let Some(enc) = &self.encryption {
            enc.validate(schemes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_header_encodes_as_empty_map() {
        let bytes = wire::to_cbor(&Header::default()).unwrap();
        assert_eq!(bytes, [0xa0]);
        let (back, _): (Header, usize) = wire::read_item(&bytes[..]).unwrap();
        assert_eq!(back, Header::default());
    }

    #[test]
    fn aad_context_tracks_header_fields() {
        let plain = Header::default();
        let named = Header { file: FileInfo::new("notes.txt"), ..Header::default() };
        assert_ne!(plain.aad_context().unwrap(), named.aad_context().unwrap());

        let timed = Header { time: 42, ..Header::default() };
        assert_ne!(plain.aad_context().unwrap(), timed.aad_context().unwrap());
    }

    #[test]
    fn unknown_compression_is_a_scheme_error() {
        let schemes = Schemes::standard();
        let header = Header {
            compression: Some(CompressionInfo { algorithm: "brotli".into(), level: None }),
            ..Header::default()
        };
        assert!(matches!(header.validate(&schemes), Err(MessageError::Scheme(_))));
    }
}
