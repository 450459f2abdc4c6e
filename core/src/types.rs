use std::io;

use thiserror::Error;

use crate::compression::CompressionError;
use crate::crypto::{CryptoError, KeyKind, PassphraseError};
use crate::message::armor::ArmorError;
use crate::message::envelope::FrameError;
use crate::message::wire::PacketType;
use crate::scheme::SchemeError;
use crate::utils::enum_name_or_hex;

/// Which secret the caller failed to supply.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MissingSecret {
    Passphrase,
    RecipientKey,
    DerivedKey,
    IssuerKey,
}

/// Coarse taxonomy of failures.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad names, levels, costs; detected before any stream work.
    Configuration,
    /// Caller may retry with the missing input.
    MissingSecret,
    /// Tampering, wrong key, truncation. Emitted plaintext is untrusted.
    Integrity,
    Io,
    /// Caller broke an API contract.
    Contract,
}

/// Unified error for both pipelines.
/// - `From<T>` impls enable `?` across layers.
/// - Finalization failures are joined into `Multiple`, never short-circuited.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("io: {0}")]
    Io(#[source] io::Error),

    #[error(transparent)]
    Scheme(#[from] SchemeError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Compression(#[from] CompressionError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Armor(#[from] ArmorError),

    #[error("record encoding: {0}")]
    Encoding(String),

    #[error("wrong packet type: expected {expected:?}, got {}", packet_name(.actual))]
    WrongPacketType { expected: PacketType, actual: u8 },

    #[error("unsupported record version {0}")]
    UnsupportedVersion(u8),

    #[error("missing secret: {0:?}")]
    MissingSecret(MissingSecret),

    #[error("wrong key type: expected {expected} key, got {actual} key")]
    WrongKeyType { expected: KeyKind, actual: KeyKind },

    #[error("authentication tag mismatch")]
    TagMismatch,

    #[error("signature invalid")]
    SignatureInvalid,

    #[error("signature expired at {expires} (now {now})")]
    SignatureExpired { expires: i64, now: i64 },

    #[error(transparent)]
    Passphrase(#[from] PassphraseError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{}", join_display(.0))]
    Multiple(Vec<MessageError>),
}

fn packet_name(raw: &u8) -> String {
    enum_name_or_hex::<PacketType>(*raw)
}

fn join_display(errors: &[MessageError]) -> String {
    let parts: Vec<String> = errors.iter().map(ToString::to_string).collect();
    format!("{} errors: {}", errors.len(), parts.join("; "))
}

impl MessageError {
    pub fn class(&self) -> ErrorClass {
        use MessageError::*;
        match self {
            Io(_) => ErrorClass::Io,
            Scheme(_) | Config(_) | WrongPacketType { .. } | UnsupportedVersion(_) => ErrorClass::Configuration,
            Crypto(e) => match e {
                CryptoError::InvalidCost { .. }
                | CryptoError::InvalidKeyLen { .. }
                | CryptoError::InvalidNonceLen { .. } => ErrorClass::Configuration,
                CryptoError::EmptyPassphrase => ErrorClass::MissingSecret,
                CryptoError::Failure(_) => ErrorClass::Contract,
                CryptoError::Malformed(_)
                | CryptoError::Decapsulation(_)
                | CryptoError::TagMismatch
                | CryptoError::BadSignature => ErrorClass::Integrity,
            },
            Compression(e) if e.is_configuration() => ErrorClass::Configuration,
            Compression(_) | Frame(_) | Armor(_) | Encoding(_) => ErrorClass::Integrity,
            MessageError::MissingSecret(_) | Passphrase(_) => ErrorClass::MissingSecret,
            WrongKeyType { .. } => ErrorClass::Contract,
            TagMismatch | SignatureInvalid | SignatureExpired { .. } => ErrorClass::Integrity,
            Multiple(errors) => {
                if errors.iter().any(|e| e.class() == ErrorClass::Integrity) {
                    ErrorClass::Integrity
                } else {
                    errors.first().map_or(ErrorClass::Contract, MessageError::class)
                }
            }
        }
    }

    /// True if `pred` holds for this error or any joined error.
    pub fn any(&self, pred: &dyn Fn(&MessageError) -> bool) -> bool {
        match self {
            MessageError::Multiple(errors) => errors.iter().any(|e| e.any(pred)),
            other => pred(other),
        }
    }

    pub fn is_tag_mismatch(&self) -> bool {
        self.any(&|e| matches!(e, MessageError::TagMismatch))
    }

    pub fn is_signature_invalid(&self) -> bool {
        self.any(&|e| matches!(e, MessageError::SignatureInvalid))
    }

    /// Fold collected errors: none is `Ok`, one is itself, more become `Multiple`.
    pub fn join(errors: Vec<MessageError>) -> Result<(), MessageError> {
        let mut flat = Vec::with_capacity(errors.len());
        for e in errors {
            match e {
                MessageError::Multiple(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Ok(()),
            1 => Err(flat.remove(0)),
            _ => Err(MessageError::Multiple(flat)),
        }
    }

    /// Carry this error through an `io::Read`/`io::Write` boundary.
    pub fn into_io(self) -> io::Error {
        match self {
            MessageError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}

/// Recovers typed errors that travelled inside `io::Error` payloads.
impl From<io::Error> for MessageError {
    fn from(e: io::Error) -> Self {
        let typed = e.get_ref().is_some_and(|inner| {
            inner.is::<FrameError>() || inner.is::<CompressionError>() || inner.is::<MessageError>()
        });
        if !typed {
            return MessageError::Io(e);
        }
        let kind = e.kind();
        let Some(inner) = e.into_inner() else {
            return MessageError::Io(io::Error::from(kind));
        };
        let inner = match inner.downcast::<FrameError>() {
            Ok(f) => return MessageError::Frame(*f),
            Err(other) => other,
        };
        let inner = match inner.downcast::<CompressionError>() {
            Ok(c) => return MessageError::Compression(*c),
            Err(other) => other,
        };
        match inner.downcast::<MessageError>() {
            Ok(m) => *m,
            Err(other) => MessageError::Io(io::Error::new(kind, other)),
        }
    }
}

impl From<ciborium::de::Error<io::Error>> for MessageError {
    fn from(e: ciborium::de::Error<io::Error>) -> Self {
        match e {
            ciborium::de::Error::Io(io) => MessageError::from(io),
            other => MessageError::Encoding(other.to_string()),
        }
    }
}

impl From<ciborium::ser::Error<io::Error>> for MessageError {
    fn from(e: ciborium::ser::Error<io::Error>) -> Self {
        match e {
            ciborium::ser::Error::Io(io) => MessageError::from(io),
            other => MessageError::Encoding(other.to_string()),
        }
    }
}
