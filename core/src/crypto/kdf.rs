// ## src/crypto/kdf.rs

//! crypto/kdf.rs
//! Password-based key derivation (memory-hard).
//!
//! Design:
//! - `derive(passphrase, salt, cost) -> key`; the salt is random per message and the
//!   cost parameters travel with the encryption descriptor.
//! - Each scheme owns its cost shape; a foreign cost variant is a configuration error.
//! - Costs arrive from untrusted records, so work factors are capped (`kdf_limits`)
//!   before any memory is committed.
//! - Empty passphrases are refused before any work is done.

use std::sync::Arc;

use argon2::{Argon2, Params as Argon2Params, Version};
use serde::{Deserialize, Serialize};

use crate::constants::{defaults, kdf_limits};
use crate::crypto::types::{CryptoError, KEY_LEN_32};
use crate::scheme::{Registry, Scheme};

/// Work-factor parameters, tagged by scheme shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KdfCost {
    Argon2 { m_cost: u32, t_cost: u32, p_cost: u32 },
    Scrypt { log_n: u8, r: u32, p: u32 },
}

pub trait KdfScheme: Scheme {
    fn default_cost(&self) -> KdfCost;

    /// Reject cost parameters the scheme cannot run with.
    fn validate_cost(&self, cost: &KdfCost) -> Result<(), CryptoError>;

    /// Fill `out` with key material derived from `passphrase` and `salt`.
    fn derive(
        &self,
        passphrase: &[u8],
        salt: &[u8],
        cost: &KdfCost,
        out: &mut [u8],
    ) -> Result<(), CryptoError>;
}

struct Argon2id;

impl Argon2id {
    fn params(&self, cost: &KdfCost, out_len: Option<usize>) -> Result<Argon2Params, CryptoError> {
        match *cost {
            KdfCost::Argon2 { m_cost, t_cost, p_cost } => {
                if m_cost > kdf_limits::ARGON2_MAX_M_COST
                    || t_cost > kdf_limits::ARGON2_MAX_T_COST
                    || p_cost > kdf_limits::ARGON2_MAX_P_COST
                {
                    return Err(CryptoError::InvalidCost {
                        scheme: "ARGON2ID",
                        msg: format!("cost m={m_cost} t={t_cost} p={p_cost} exceeds the accepted maximum"),
                    });
                }
                Argon2Params::new(m_cost, t_cost, p_cost, out_len)
                    .map_err(|e| CryptoError::InvalidCost { scheme: "ARGON2ID", msg: e.to_string() })
            }
            KdfCost::Scrypt { .. } => Err(CryptoError::InvalidCost {
                scheme: "ARGON2ID",
                msg: "scrypt parameters given".into(),
            }),
        }
    }
}

impl Scheme for Argon2id {
    fn name(&self) -> &'static str {
        "ARGON2ID"
    }
}

impl KdfScheme for Argon2id {
    fn default_cost(&self) -> KdfCost {
        KdfCost::Argon2 {
            m_cost: defaults::ARGON2_M_COST,
            t_cost: defaults::ARGON2_T_COST,
            p_cost: defaults::ARGON2_P_COST,
        }
    }

    fn validate_cost(&self, cost: &KdfCost) -> Result<(), CryptoError> {
        self.params(cost, None).map(|_| ())
    }

    fn derive(
        &self,
        passphrase: &[u8],
        salt: &[u8],
        cost: &KdfCost,
        out: &mut [u8],
    ) -> Result<(), CryptoError> {
        if passphrase.is_empty() {
            return Err(CryptoError::EmptyPassphrase);
        }
        let params = self.params(cost, Some(out.len()))?;
        Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params)
            .hash_password_into(passphrase, salt, out)
            .map_err(|e| CryptoError::Failure(format!("argon2id: {e}")))
    }
}

struct Scrypt;

impl Scrypt {
    fn params(&self, cost: &KdfCost, out_len: usize) -> Result<scrypt::Params, CryptoError> {
        match *cost {
            KdfCost::Scrypt { log_n, r, p } => {
                let memory = (128 * u64::from(r)).checked_shl(u32::from(log_n)).unwrap_or(u64::MAX);
                if log_n > kdf_limits::SCRYPT_MAX_LOG_N
                    || p > kdf_limits::SCRYPT_MAX_P
                    || memory > kdf_limits::SCRYPT_MAX_MEMORY
                {
                    return Err(CryptoError::InvalidCost {
                        scheme: "SCRYPT",
                        msg: format!("cost log_n={log_n} r={r} p={p} exceeds the accepted maximum"),
                    });
                }
                scrypt::Params::new(log_n, r, p, out_len)
                    .map_err(|e| CryptoError::InvalidCost { scheme: "SCRYPT", msg: e.to_string() })
            }
            KdfCost::Argon2 { .. } => Err(CryptoError::InvalidCost {
                scheme: "SCRYPT",
                msg: "argon2 parameters given".into(),
            }),
        }
    }
}

impl Scheme for Scrypt {
    fn name(&self) -> &'static str {
        "SCRYPT"
    }
}

impl KdfScheme for Scrypt {
    fn default_cost(&self) -> KdfCost {
        KdfCost::Scrypt {
            log_n: defaults::SCRYPT_LOG_N,
            r: defaults::SCRYPT_R,
            p: defaults::SCRYPT_P,
        }
    }

    fn validate_cost(&self, cost: &KdfCost) -> Result<(), CryptoError> {
        self.params(cost, KEY_LEN_32).map(|_| ())
    }

    fn derive(
        &self,
        passphrase: &[u8],
        salt: &[u8],
        cost: &KdfCost,
        out: &mut [u8],
    ) -> Result<(), CryptoError> {
        if passphrase.is_empty() {
            return Err(CryptoError::EmptyPassphrase);
        }
        let params = self.params(cost, out.len())?;
        scrypt::scrypt(passphrase, salt, &params, out)
            .map_err(|e| CryptoError::Failure(format!("scrypt: {e}")))
    }
}

pub fn register_standard(registry: &mut Registry<dyn KdfScheme>) {
    registry.register(Arc::new(Argon2id));
    registry.register(Arc::new(Scrypt));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::SchemeFamily;

    fn registry() -> Registry<dyn KdfScheme> {
        let mut r: Registry<dyn KdfScheme> = Registry::new(SchemeFamily::Kdf);
        register_standard(&mut r);
        r
    }

    fn cheap(name: &str) -> KdfCost {
        match name {
            "ARGON2ID" => KdfCost::Argon2 { m_cost: 8 * 1024, t_cost: 1, p_cost: 1 },
            _ => KdfCost::Scrypt { log_n: 4, r: 8, p: 1 },
        }
    }

    #[test]
    fn derivation_is_deterministic_and_salted() {
        for name in ["ARGON2ID", "SCRYPT"] {
            let kdf = registry().by_name(name).unwrap();
            let cost = cheap(name);
            let (mut a, mut b, mut c) = ([0u8; 32], [0u8; 32], [0u8; 32]);
            kdf.derive(b"pw", &[1u8; 16], &cost, &mut a).unwrap();
            kdf.derive(b"pw", &[1u8; 16], &cost, &mut b).unwrap();
            kdf.derive(b"pw", &[2u8; 16], &cost, &mut c).unwrap();
            assert_eq!(a, b, "{name}");
            assert_ne!(a, c, "{name}");
        }
    }

    #[test]
    fn empty_passphrase_rejected() {
        let kdf = registry().by_name("scrypt").unwrap();
        let mut out = [0u8; 32];
        let err = kdf.derive(b"", &[1u8; 16], &cheap("SCRYPT"), &mut out).unwrap_err();
        assert_eq!(err, CryptoError::EmptyPassphrase);
    }

    #[test]
    fn foreign_cost_shape_rejected() {
        let kdf = registry().by_name("ARGON2ID").unwrap();
        assert!(kdf.validate_cost(&cheap("SCRYPT")).is_err());
        assert!(kdf.validate_cost(&kdf.default_cost()).is_ok());
    }

    #[test]
    fn oversized_costs_rejected() {
        let scrypt = registry().by_name("SCRYPT").unwrap();
        assert!(scrypt.validate_cost(&KdfCost::Scrypt { log_n: 20, r: 8, p: 1 }).is_ok());
        for cost in [
            KdfCost::Scrypt { log_n: 21, r: 1, p: 1 },
            KdfCost::Scrypt { log_n: 44, r: 8, p: 1 },
            KdfCost::Scrypt { log_n: 18, r: 64, p: 1 },
            KdfCost::Scrypt { log_n: 10, r: 8, p: 64 },
        ] {
            assert!(matches!(scrypt.validate_cost(&cost), Err(CryptoError::InvalidCost { .. })), "{cost:?}");
        }

        let argon = registry().by_name("ARGON2ID").unwrap();
        for cost in [
            KdfCost::Argon2 { m_cost: 4 * 1024 * 1024, t_cost: 1, p_cost: 1 },
            KdfCost::Argon2 { m_cost: 8 * 1024, t_cost: 1_000, p_cost: 1 },
            KdfCost::Argon2 { m_cost: 8 * 1024, t_cost: 1, p_cost: 255 },
        ] {
            assert!(matches!(argon.validate_cost(&cost), Err(CryptoError::InvalidCost { .. })), "{cost:?}");
        }
    }

    #[test]
    fn cost_serializes_tagged() {
        let json = serde_json::to_string(&KdfCost::Scrypt { log_n: 4, r: 8, p: 1 }).unwrap();
        assert_eq!(json, r#"{"type":"scrypt","log_n":4,"r":8,"p":1}"#);
    }
}
