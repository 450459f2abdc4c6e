use std::fmt;
use thiserror::Error;

/// Every registry-resolvable implementation exposes its normalized name.
pub trait Scheme: Send + Sync + 'static {
    /// Upper-case name used on the wire.
    fn name(&self) -> &'static str;
}

/// Algorithm families known to the registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchemeFamily {
    Hash,
    Aead,
    Kdf,
    Expand,
    Kem,
    Pke,
    Signature,
    Compression,
}

impl SchemeFamily {
    pub const ALL: [SchemeFamily; 8] = [
        SchemeFamily::Hash,
        SchemeFamily::Aead,
        SchemeFamily::Kdf,
        SchemeFamily::Expand,
        SchemeFamily::Kem,
        SchemeFamily::Pke,
        SchemeFamily::Signature,
        SchemeFamily::Compression,
    ];
}

impl fmt::Display for SchemeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemeFamily::Hash        => "hash",
            SchemeFamily::Aead        => "aead",
            SchemeFamily::Kdf         => "kdf",
            SchemeFamily::Expand      => "expand",
            SchemeFamily::Kem         => "kem",
            SchemeFamily::Pke         => "pke",
            SchemeFamily::Signature   => "signature",
            SchemeFamily::Compression => "compression",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemeError {
    /// Name not present in the registry of the expected family.
    #[error("unknown {family} scheme: {name}")]
    Unknown { family: SchemeFamily, name: String },
}
