//! message/auth.rs
//!
//! Integrity artifacts written after the body.
//!
//! Design notes:
//! - `Auth` is only reachable through `PendingAuth::finish`, and a `PendingAuth` is only
//!   built once the body chain has been drained and closed.
//! - The signature covers a statement, not the raw digest: domain label, scheme name,
//!   plaintext digest, issuer fingerprint, creation time, optional expiry.
//! - Verification checks the issuer and creation time against the header before the
//!   signature itself, and the validity window last.

use serde::{Deserialize, Serialize};

use crate::constants::SIGNATURE_DOMAIN;
use crate::crypto::{DigestState, Fingerprint, HashScheme, PrivateKey, PublicKey, SignatureScheme};
use crate::message::header::Header;
use crate::scheme::{Algorithm, SchemeName, Schemes};
use crate::types::MessageError;

/// Signature value with its issuer and validity window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub scheme: SchemeName,
    pub issuer: Fingerprint,
    #[serde(with = "serde_bytes")]
    pub signature: Vec<u8>,
    pub created: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
}

/// Trailer of a message record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    /// Body cipher tag; present iff the message is encrypted.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_bytes")]
    pub tag: Option<Vec<u8>>,
    /// Present iff the header names a sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureRecord>,
}

/// Artifacts collected when the body chain closed, not yet sealed into `Auth`.
#[derive(Debug)]
pub struct PendingAuth {
    tag: Option<Vec<u8>>,
    signature: Option<SignatureRecord>,
}

impl PendingAuth {
    pub(crate) fn closed(tag: Option<Vec<u8>>, signature: Option<SignatureRecord>) -> Self {
        Self { tag, signature }
    }

    pub fn finish(self) -> Auth {
        Auth { tag: self.tag, signature: self.signature }
    }
}

fn statement(
    scheme: &str,
    digest: &[u8],
    issuer: &Fingerprint,
    created: i64,
    expires: Option<i64>,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(SIGNATURE_DOMAIN.len() + 2 + scheme.len() + 4 + digest.len() + 32 + 17);
    out.extend_from_slice(SIGNATURE_DOMAIN);
    out.extend_from_slice(&(scheme.len() as u16).to_le_bytes());
    out.extend_from_slice(scheme.as_bytes());
    out.extend_from_slice(&(digest.len() as u32).to_le_bytes());
    out.extend_from_slice(digest);
    out.extend_from_slice(issuer.as_bytes());
    out.extend_from_slice(&created.to_le_bytes());
    match expires {
        Some(t) => {
            out.push(1);
            out.extend_from_slice(&t.to_le_bytes());
        }
        None => out.push(0),
    }
    out
}

/// Signing key plus the validity window of the signature it will produce.
pub struct Signer {
    key: PrivateKey,
    scheme: Algorithm<dyn SignatureScheme>,
    digest: Algorithm<dyn HashScheme>,
    created: i64,
    expires: Option<i64>,
}

impl Signer {
    /// Rejects anything but a signing key.
    pub fn new(schemes: &Schemes, key: PrivateKey, created: i64, expires: Option<i64>) -> Result<Self, MessageError> {
        let scheme = key.algorithm().signature()?.clone();
        let digest = schemes.hash.by_name(scheme.digest())?;
        Ok(Self { key, scheme, digest, created, expires })
    }

    pub fn issuer(&self) -> Fingerprint {
        self.key.fingerprint()
    }

    pub fn digest_state(&self) -> DigestState {
        self.digest.hasher()
    }

    pub fn sign(&self, digest: &[u8]) -> Result<SignatureRecord, MessageError> {
        let issuer = self.issuer();
        let msg = statement(self.scheme.name(), digest, &issuer, self.created, self.expires);
        let signature = self.scheme.sign(self.key.secret_bytes(), &msg)?;
        Ok(SignatureRecord {
            scheme: self.scheme.encode(),
            issuer,
            signature,
            created: self.created,
            expires: self.expires,
        })
    }
}

/// Digest state matching what `issuer` signs with.
pub fn verifier_digest(schemes: &Schemes, issuer: &PublicKey) -> Result<DigestState, MessageError> {
    let scheme = issuer.algorithm().signature()?;
    Ok(schemes.hash.by_name(scheme.digest())?.hasher())
}

impl SignatureRecord {
    /// Check this record against the header, the issuer key and the plaintext digest.
    pub fn verify(&self, header: &Header, issuer: &PublicKey, digest: &[u8], now: i64) -> Result<(), MessageError> {
        let scheme = issuer.algorithm().signature()?;
        let bound = header.sender == Some(self.issuer)
            && issuer.fingerprint() == self.issuer
            && header.time == self.created
            && scheme.name() == self.scheme.as_str();
        if !bound {
            tracing::warn!(issuer = %self.issuer, "signature record does not match header or issuer key");
            return Err(MessageError::SignatureInvalid);
        }
        let msg = statement(scheme.name(), digest, &self.issuer, self.created, self.expires);
        scheme.verify(issuer.as_bytes(), &msg, &self.signature).map_err(|e| {
            tracing::warn!(issuer = %self.issuer, error = %e, "signature rejected");
            MessageError::SignatureInvalid
        })?;
        match self.expires {
            Some(expires) if expires < now => Err(MessageError::SignatureExpired { expires, now }),
            _ => Ok(()),
        }
    }
}
