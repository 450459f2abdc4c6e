//! scheme/algorithm.rs
//!
//! Wire codec for algorithm-typed fields.
//!
//! Design notes:
//! - `Algorithm<S>` holds a resolved scheme; it serializes as the bare normalized name.
//! - `SchemeName` is the decoded, not-yet-resolved form. Deserialization normalizes
//!   case, resolution happens against an explicit registry (`Algorithm::decode`).

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::scheme::registry::Registry;
use crate::scheme::types::{Scheme, SchemeError};
use crate::utils::normalize_name;

/// Normalized scheme name as carried on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SchemeName(String);

impl SchemeName {
    pub fn new(name: &str) -> Self {
        Self(normalize_name(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SchemeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for SchemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SchemeName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(&raw))
    }
}

/// A scheme resolved through a registry.
pub struct Algorithm<S: ?Sized> {
    scheme: Arc<S>,
}

impl<S: ?Sized + Scheme> Algorithm<S> {
    pub fn new(scheme: Arc<S>) -> Self {
        Self { scheme }
    }

    pub fn name(&self) -> &'static str {
        self.scheme.name()
    }

    pub fn scheme(&self) -> &S {
        &self.scheme
    }

    /// Wire form: just the normalized name.
    pub fn encode(&self) -> SchemeName {
        SchemeName::new(self.name())
    }

    /// Re-resolve a wire name through the registry of the expected family.
    pub fn decode(name: &SchemeName, registry: &Registry<S>) -> Result<Self, SchemeError> {
        registry.by_name(name.as_str())
    }
}

impl<S: ?Sized> Clone for Algorithm<S> {
    fn clone(&self) -> Self {
        Self { scheme: Arc::clone(&self.scheme) }
    }
}

impl<S: ?Sized> Deref for Algorithm<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.scheme
    }
}

impl<S: ?Sized + Scheme> PartialEq for Algorithm<S> {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl<S: ?Sized + Scheme> Eq for Algorithm<S> {}

impl<S: ?Sized + Scheme> fmt::Debug for Algorithm<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Algorithm({})", self.name())
    }
}

impl<S: ?Sized + Scheme> fmt::Display for Algorithm<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<S: ?Sized + Scheme> Serialize for Algorithm<S> {
    fn serialize<Z: Serializer>(&self, serializer: Z) -> Result<Z::Ok, Z::Error> {
        serializer.serialize_str(self.name())
    }
}
