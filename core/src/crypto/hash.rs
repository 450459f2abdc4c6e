//! crypto/hash.rs
//! Streaming digest schemes used for signatures and fingerprints.

use std::sync::Arc;

use sha2::{Digest as _, Sha256, Sha512};
use sha3::{Sha3_256, Sha3_512};

use crate::scheme::{Registry, Scheme};

/// Supported digest algorithms.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DigestAlg {
    Sha256,
    Sha512,
    Sha3_256,
    Sha3_512,
    Blake3, // UNKEYED Blake3
}

/// Internal hashing state.
pub enum DigestState {
    Sha256(Sha256),
    Sha512(Sha512),
    Sha3_256(Sha3_256),
    Sha3_512(Sha3_512),
    Blake3(Box<blake3::Hasher>),
}

impl DigestState {
    pub fn new(alg: DigestAlg) -> Self {
        match alg {
            DigestAlg::Sha256   => DigestState::Sha256(Sha256::new()),
            DigestAlg::Sha512   => DigestState::Sha512(Sha512::new()),
            DigestAlg::Sha3_256 => DigestState::Sha3_256(Sha3_256::new()),
            DigestAlg::Sha3_512 => DigestState::Sha3_512(Sha3_512::new()),
            DigestAlg::Blake3   => DigestState::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        match self {
            DigestState::Sha256(h)   => h.update(data),
            DigestState::Sha512(h)   => h.update(data),
            DigestState::Sha3_256(h) => h.update(data),
            DigestState::Sha3_512(h) => h.update(data),
            // Blake3 update returns &mut Hasher; discard it
            DigestState::Blake3(h)   => { h.update(data); }
        }
    }

    #[inline]
    pub fn finalize(self) -> Vec<u8> {
        match self {
            DigestState::Sha256(h)   => h.finalize().to_vec(),
            DigestState::Sha512(h)   => h.finalize().to_vec(),
            DigestState::Sha3_256(h) => h.finalize().to_vec(),
            DigestState::Sha3_512(h) => h.finalize().to_vec(),
            DigestState::Blake3(h)   => h.finalize().as_bytes().to_vec(),
        }
    }
}

pub trait HashScheme: Scheme {
    fn output_size(&self) -> usize;

    /// Fresh incremental state.
    fn hasher(&self) -> DigestState;

    fn digest(&self, data: &[u8]) -> Vec<u8> {
        let mut state = self.hasher();
        state.update(data);
        state.finalize()
    }
}

struct StandardHash {
    name: &'static str,
    alg: DigestAlg,
    output_size: usize,
}

impl Scheme for StandardHash {
    fn name(&self) -> &'static str {
        self.name
    }
}

impl HashScheme for StandardHash {
    fn output_size(&self) -> usize {
        self.output_size
    }

    fn hasher(&self) -> DigestState {
        DigestState::new(self.alg)
    }
}

pub fn register_standard(registry: &mut Registry<dyn HashScheme>) {
    for (name, alg, output_size) in [
        ("SHA256", DigestAlg::Sha256, 32),
        ("SHA512", DigestAlg::Sha512, 64),
        ("SHA3-256", DigestAlg::Sha3_256, 32),
        ("SHA3-512", DigestAlg::Sha3_512, 64),
        ("BLAKE3", DigestAlg::Blake3, 32),
    ] {
        registry.register(Arc::new(StandardHash { name, alg, output_size }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::SchemeFamily;

    #[test]
    fn output_sizes_match_digests() {
        let mut registry: Registry<dyn HashScheme> = Registry::new(SchemeFamily::Hash);
        register_standard(&mut registry);
        for name in ["SHA256", "SHA512", "SHA3-256", "SHA3-512", "BLAKE3"] {
            let hash = registry.by_name(name).unwrap();
            assert_eq!(hash.digest(b"abc").len(), hash.output_size(), "{name}");
        }
    }

    #[test]
    fn incremental_matches_one_shot() {
        let mut state = DigestState::new(DigestAlg::Sha3_512);
        state.update(b"hello ");
        state.update(b"world");
        let mut whole = DigestState::new(DigestAlg::Sha3_512);
        whole.update(b"hello world");
        assert_eq!(state.finalize(), whole.finalize());
    }
}
