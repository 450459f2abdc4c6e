//! crypto/keys.rs
//! Typed key objects, fingerprints, and the key/passphrase collaborator traits.
//!
//! Design notes:
//! - A key knows its scheme (`KeyAlgorithm`); callers ask for the capability they need
//!   (`kem`, `pke`, `signature`) and get `WrongKeyType` on a mismatch.
//! - Private key bytes live in `Zeroizing` buffers; a private key also carries its public half
//!   so fingerprints never need the secret.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_256};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::constants::FINGERPRINT_LEN;
use crate::crypto::{KemScheme, PkeScheme, SignatureScheme};
use crate::scheme::Algorithm;
use crate::types::MessageError;

/// Stable 32-byte identifier of a public key.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    pub const fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    /// SHA3-256 over `scheme name || 0x00 || public key bytes`.
    pub fn compute(scheme: &str, public_key: &[u8]) -> Self {
        let mut h = Sha3_256::new();
        h.update(scheme.as_bytes());
        h.update([0u8]);
        h.update(public_key);
        Self(h.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// All-zero means "no fingerprint" on the wire.
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; FINGERPRINT_LEN]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", hex::encode(&self.0[..8]))
    }
}

impl TryFrom<&[u8]> for Fingerprint {
    type Error = MessageError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; FINGERPRINT_LEN] = bytes.try_into().map_err(|_| {
            MessageError::Encoding(format!("fingerprint must be {FINGERPRINT_LEN} bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let buf = serde_bytes::ByteBuf::deserialize(deserializer)?;
        let arr: [u8; FINGERPRINT_LEN] = buf
            .as_slice()
            .try_into()
            .map_err(|_| serde::de::Error::invalid_length(buf.len(), &"32 bytes"))?;
        Ok(Self(arr))
    }
}

/// Capability a key provides.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyKind {
    Kem,
    Pke,
    Signature,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyKind::Kem => "kem",
            KeyKind::Pke => "pke",
            KeyKind::Signature => "signature",
        })
    }
}

/// Scheme a key belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Kem(Algorithm<dyn KemScheme>),
    Pke(Algorithm<dyn PkeScheme>),
    Signature(Algorithm<dyn SignatureScheme>),
}

impl KeyAlgorithm {
    pub fn kind(&self) -> KeyKind {
        match self {
            KeyAlgorithm::Kem(_) => KeyKind::Kem,
            KeyAlgorithm::Pke(_) => KeyKind::Pke,
            KeyAlgorithm::Signature(_) => KeyKind::Signature,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KeyAlgorithm::Kem(a) => a.name(),
            KeyAlgorithm::Pke(a) => a.name(),
            KeyAlgorithm::Signature(a) => a.name(),
        }
    }

    fn wrong(&self, expected: KeyKind) -> MessageError {
        MessageError::WrongKeyType { expected, actual: self.kind() }
    }

    pub fn kem(&self) -> Result<&Algorithm<dyn KemScheme>, MessageError> {
        match self {
            KeyAlgorithm::Kem(a) => Ok(a),
            _ => Err(self.wrong(KeyKind::Kem)),
        }
    }

    pub fn pke(&self) -> Result<&Algorithm<dyn PkeScheme>, MessageError> {
        match self {
            KeyAlgorithm::Pke(a) => Ok(a),
            _ => Err(self.wrong(KeyKind::Pke)),
        }
    }

    pub fn signature(&self) -> Result<&Algorithm<dyn SignatureScheme>, MessageError> {
        match self {
            KeyAlgorithm::Signature(a) => Ok(a),
            _ => Err(self.wrong(KeyKind::Signature)),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    algorithm: KeyAlgorithm,
    bytes: Vec<u8>,
    fingerprint: Fingerprint,
}

impl PublicKey {
    pub fn new(algorithm: KeyAlgorithm, bytes: Vec<u8>) -> Self {
        let fingerprint = Fingerprint::compute(algorithm.name(), &bytes);
        Self { algorithm, bytes, fingerprint }
    }

    pub fn algorithm(&self) -> &KeyAlgorithm {
        &self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("algorithm", &self.algorithm.name())
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

#[derive(Clone)]
pub struct PrivateKey {
    public: PublicKey,
    secret: Zeroizing<Vec<u8>>,
}

impl PrivateKey {
    pub fn new(public: PublicKey, secret: Zeroizing<Vec<u8>>) -> Self {
        Self { public, secret }
    }

    pub fn generate_kem(scheme: &Algorithm<dyn KemScheme>) -> Self {
        let (pk, sk) = scheme.generate();
        Self::new(PublicKey::new(KeyAlgorithm::Kem(scheme.clone()), pk), sk)
    }

    pub fn generate_pke(scheme: &Algorithm<dyn PkeScheme>) -> Self {
        let (pk, sk) = scheme.generate();
        Self::new(PublicKey::new(KeyAlgorithm::Pke(scheme.clone()), pk), sk)
    }

    pub fn generate_signing(scheme: &Algorithm<dyn SignatureScheme>) -> Self {
        let (pk, sk) = scheme.generate();
        Self::new(PublicKey::new(KeyAlgorithm::Signature(scheme.clone()), pk), sk)
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn algorithm(&self) -> &KeyAlgorithm {
        self.public.algorithm()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.public.fingerprint()
    }

    pub fn secret_bytes(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm().name())
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

/// Looks keys up by fingerprint.
pub trait KeyProvider {
    fn public_key(&self, fingerprint: &Fingerprint) -> Option<&PublicKey>;
    fn private_key(&self, fingerprint: &Fingerprint) -> Option<&PrivateKey>;
}

/// In-memory `KeyProvider`.
#[derive(Default, Debug)]
pub struct Keyring {
    public: BTreeMap<Fingerprint, PublicKey>,
    private: BTreeMap<Fingerprint, PrivateKey>,
}

impl Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_public(&mut self, key: PublicKey) {
        self.public.insert(key.fingerprint(), key);
    }

    /// Also registers the public half.
    pub fn add_private(&mut self, key: PrivateKey) {
        self.add_public(key.public_key().clone());
        self.private.insert(key.fingerprint(), key);
    }

    pub fn len(&self) -> usize {
        self.public.len()
    }

    pub fn is_empty(&self) -> bool {
        self.public.is_empty()
    }
}

impl KeyProvider for Keyring {
    fn public_key(&self, fingerprint: &Fingerprint) -> Option<&PublicKey> {
        self.public.get(fingerprint)
    }

    fn private_key(&self, fingerprint: &Fingerprint) -> Option<&PrivateKey> {
        self.private.get(fingerprint)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PassphraseError {
    #[error("passphrase entry declined")]
    Declined,

    #[error("passphrase unavailable: {0}")]
    Unavailable(String),
}

/// Supplies a passphrase on demand.
pub trait PassphraseProvider {
    fn passphrase(&self) -> Result<Zeroizing<String>, PassphraseError>;
}

impl PassphraseProvider for str {
    fn passphrase(&self) -> Result<Zeroizing<String>, PassphraseError> {
        Ok(Zeroizing::new(self.to_owned()))
    }
}

impl PassphraseProvider for String {
    fn passphrase(&self) -> Result<Zeroizing<String>, PassphraseError> {
        self.as_str().passphrase()
    }
}

impl<F> PassphraseProvider for F
where
    F: Fn() -> Result<Zeroizing<String>, PassphraseError>,
{
    fn passphrase(&self) -> Result<Zeroizing<String>, PassphraseError> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::Schemes;

    #[test]
    fn fingerprint_depends_on_scheme_and_bytes() {
        let a = Fingerprint::compute("ED25519", b"key");
        let b = Fingerprint::compute("DILITHIUM3", b"key");
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 64);
        assert!(!a.is_empty());
        assert!(Fingerprint::default().is_empty());
    }

    #[test]
    fn wrong_capability_is_reported() {
        let schemes = Schemes::standard();
        let key = PrivateKey::generate_signing(&schemes.signature.by_name("ED25519").unwrap());
        let err = key.algorithm().kem().unwrap_err();
        assert!(matches!(
            err,
            MessageError::WrongKeyType { expected: KeyKind::Kem, actual: KeyKind::Signature }
        ));
    }

    #[test]
    fn keyring_finds_both_halves() {
        let schemes = Schemes::standard();
        let key = PrivateKey::generate_kem(&schemes.kem.by_name("ML-KEM-768").unwrap());
        let fp = key.fingerprint();
        let mut ring = Keyring::new();
        ring.add_private(key);
        assert!(ring.private_key(&fp).is_some());
        assert_eq!(ring.public_key(&fp).map(PublicKey::fingerprint), Some(fp));
    }

    #[test]
    fn closures_provide_passphrases() {
        let declined = || -> Result<Zeroizing<String>, PassphraseError> { Err(PassphraseError::Declined) };
        assert_eq!(declined.passphrase().unwrap_err(), PassphraseError::Declined);
        assert_eq!("pw".passphrase().unwrap().as_str(), "pw");
    }
}
