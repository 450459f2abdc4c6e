//! scheme/registry.rs
//! Per-family registries and the `Schemes` composition root.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::compression::{self, CompressionScheme};
use crate::crypto::{
    self, AeadScheme, ExpandScheme, HashScheme, KdfScheme, KemScheme, PkeScheme, SignatureScheme,
};
use crate::scheme::algorithm::Algorithm;
use crate::scheme::types::{Scheme, SchemeError, SchemeFamily};
use crate::utils::normalize_name;

/// Name -> implementation map for one algorithm family.
pub struct Registry<S: ?Sized> {
    family: SchemeFamily,
    schemes: BTreeMap<String, Arc<S>>,
}

impl<S: ?Sized + Scheme> Registry<S> {
    pub fn new(family: SchemeFamily) -> Self {
        Self { family, schemes: BTreeMap::new() }
    }

    pub fn family(&self) -> SchemeFamily {
        self.family
    }

    /// Register a scheme under its normalized name.
    ///
    /// # Panics
    /// - The scheme reports a name that is not already normalized.
    /// - A scheme with the same name is already registered.
    pub fn register(&mut self, scheme: Arc<S>) {
        let name = scheme.name();
        let key = normalize_name(name);
        assert_eq!(key, name, "{} scheme name must be upper-case: {:?}", self.family, name);
        if self.schemes.contains_key(&key) {
            panic!("duplicate {} scheme registration: {}", self.family, key);
        }
        self.schemes.insert(key, scheme);
    }

    /// Case-insensitive lookup.
    pub fn by_name(&self, name: &str) -> Result<Algorithm<S>, SchemeError> {
        let key = normalize_name(name);
        self.schemes
            .get(&key)
            .map(|s| Algorithm::new(Arc::clone(s)))
            .ok_or(SchemeError::Unknown { family: self.family, name: key })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemes.contains_key(&normalize_name(name))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}

/// Closed view over a scheme of any family.
#[derive(Clone, Debug)]
pub enum AnyScheme {
    Hash(Algorithm<dyn HashScheme>),
    Aead(Algorithm<dyn AeadScheme>),
    Kdf(Algorithm<dyn KdfScheme>),
    Expand(Algorithm<dyn ExpandScheme>),
    Kem(Algorithm<dyn KemScheme>),
    Pke(Algorithm<dyn PkeScheme>),
    Signature(Algorithm<dyn SignatureScheme>),
    Compression(Algorithm<dyn CompressionScheme>),
}

impl AnyScheme {
    pub fn family(&self) -> SchemeFamily {
        match self {
            AnyScheme::Hash(_)        => SchemeFamily::Hash,
            AnyScheme::Aead(_)        => SchemeFamily::Aead,
            AnyScheme::Kdf(_)         => SchemeFamily::Kdf,
            AnyScheme::Expand(_)      => SchemeFamily::Expand,
            AnyScheme::Kem(_)         => SchemeFamily::Kem,
            AnyScheme::Pke(_)         => SchemeFamily::Pke,
            AnyScheme::Signature(_)   => SchemeFamily::Signature,
            AnyScheme::Compression(_) => SchemeFamily::Compression,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnyScheme::Hash(a)        => a.name(),
            AnyScheme::Aead(a)        => a.name(),
            AnyScheme::Kdf(a)         => a.name(),
            AnyScheme::Expand(a)      => a.name(),
            AnyScheme::Kem(a)         => a.name(),
            AnyScheme::Pke(a)         => a.name(),
            AnyScheme::Signature(a)   => a.name(),
            AnyScheme::Compression(a) => a.name(),
        }
    }
}

/// Every registry the pipelines resolve names against.
///
/// Populate once at start-up, then share by reference (or `Arc`); nothing
/// mutates it per message.
pub struct Schemes {
    pub hash: Registry<dyn HashScheme>,
    pub aead: Registry<dyn AeadScheme>,
    pub kdf: Registry<dyn KdfScheme>,
    pub expand: Registry<dyn ExpandScheme>,
    pub kem: Registry<dyn KemScheme>,
    pub pke: Registry<dyn PkeScheme>,
    pub signature: Registry<dyn SignatureScheme>,
    pub compression: Registry<dyn CompressionScheme>,
}

impl Schemes {
    /// Registries with nothing registered.
    pub fn empty() -> Self {
        Self {
            hash: Registry::new(SchemeFamily::Hash),
            aead: Registry::new(SchemeFamily::Aead),
            kdf: Registry::new(SchemeFamily::Kdf),
            expand: Registry::new(SchemeFamily::Expand),
            kem: Registry::new(SchemeFamily::Kem),
            pke: Registry::new(SchemeFamily::Pke),
            signature: Registry::new(SchemeFamily::Signature),
            compression: Registry::new(SchemeFamily::Compression),
        }
    }

    /// Every scheme shipped with this crate.
    pub fn standard() -> Self {
        let mut schemes = Self::empty();
        crypto::hash::register_standard(&mut schemes.hash);
        crypto::aead::register_standard(&mut schemes.aead);
        crypto::kdf::register_standard(&mut schemes.kdf);
        crypto::expand::register_standard(&mut schemes.expand);
        crypto::kem::register_standard(&mut schemes.kem);
        crypto::pke::register_standard(&mut schemes.pke);
        crypto::sign::register_standard(&mut schemes.signature);
        compression::register_standard(&mut schemes.compression);
        tracing::debug!(
            hash = schemes.hash.len(),
            aead = schemes.aead.len(),
            kdf = schemes.kdf.len(),
            kem = schemes.kem.len(),
            signature = schemes.signature.len(),
            compression = schemes.compression.len(),
            "standard schemes registered"
        );
        schemes
    }

    /// Resolve a name in the given family.
    pub fn lookup(&self, family: SchemeFamily, name: &str) -> Result<AnyScheme, SchemeError> {
        Ok(match family {
            SchemeFamily::Hash        => AnyScheme::Hash(self.hash.by_name(name)?),
            SchemeFamily::Aead        => AnyScheme::Aead(self.aead.by_name(name)?),
            SchemeFamily::Kdf         => AnyScheme::Kdf(self.kdf.by_name(name)?),
            SchemeFamily::Expand      => AnyScheme::Expand(self.expand.by_name(name)?),
            SchemeFamily::Kem         => AnyScheme::Kem(self.kem.by_name(name)?),
            SchemeFamily::Pke         => AnyScheme::Pke(self.pke.by_name(name)?),
            SchemeFamily::Signature   => AnyScheme::Signature(self.signature.by_name(name)?),
            SchemeFamily::Compression => AnyScheme::Compression(self.compression.by_name(name)?),
        })
    }

    /// Names registered in one family.
    pub fn names(&self, family: SchemeFamily) -> Vec<&str> {
        match family {
            SchemeFamily::Hash        => self.hash.names().collect(),
            SchemeFamily::Aead        => self.aead.names().collect(),
            SchemeFamily::Kdf         => self.kdf.names().collect(),
            SchemeFamily::Expand      => self.expand.names().collect(),
            SchemeFamily::Kem         => self.kem.names().collect(),
            SchemeFamily::Pke         => self.pke.names().collect(),
            SchemeFamily::Signature   => self.signature.names().collect(),
            SchemeFamily::Compression => self.compression.names().collect(),
        }
    }
}

impl Default for Schemes {
    fn default() -> Self {
        Self::standard()
    }
}
