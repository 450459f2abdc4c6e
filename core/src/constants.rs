/// Record format version carried right after the packet type byte.
pub const RECORD_V1: u8 = 1;

/// Default plaintext bytes buffered per envelope chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024; // 64 KiB
/// Smallest chunk size accepted by the builder.
pub const MIN_CHUNK_SIZE: usize = 512;
/// Max chunk size sanity bound (32 MiB). Decoders reject longer chunk prefixes.
pub const MAX_CHUNK_SIZE: usize = 32 * 1024 * 1024;

/// Length of every key fingerprint.
pub const FINGERPRINT_LEN: usize = 32;

/// Domain label mixed into every signed statement.
pub const SIGNATURE_DOMAIN: &[u8] = b"pqseal/v1/signature";
/// Domain label for the associated data of the body cipher.
pub const AAD_DOMAIN: &[u8] = b"pqseal/v1/body";

/// HKDF-style info strings used by the expanders.
pub mod info {
    pub const SECRET_KEY: &[u8] = b"pqseal/v1/secret";
    pub const GROUP_KEY: &[u8] = b"pqseal/v1/group";
    pub const WRAP_KEY: &[u8] = b"pqseal/v1/wrap";
}

/// Defaults when the caller does not name a scheme.
pub mod defaults {
    pub const CIPHER: &str = "XCHACHA20-BLAKE3";
    pub const KDF: &str = "ARGON2ID";
    pub const EXPAND: &str = "HKDF-SHA256";

    /// Argon2id cost: 64 MiB, 3 passes, 1 lane.
    pub const ARGON2_M_COST: u32 = 64 * 1024;
    pub const ARGON2_T_COST: u32 = 3;
    pub const ARGON2_P_COST: u32 = 1;

    /// scrypt cost: N = 2^15, r = 8, p = 1.
    pub const SCRYPT_LOG_N: u8 = 15;
    pub const SCRYPT_R: u32 = 8;
    pub const SCRYPT_P: u32 = 1;

    /// Passphrase salt length.
    pub const SALT_LEN: usize = 16;
}

/// Upper bounds on KDF work factors accepted from a record or a config.
pub mod kdf_limits {
    /// Argon2id memory, in KiB (1 GiB).
    pub const ARGON2_MAX_M_COST: u32 = 1024 * 1024;
    pub const ARGON2_MAX_T_COST: u32 = 16;
    pub const ARGON2_MAX_P_COST: u32 = 16;

    pub const SCRYPT_MAX_LOG_N: u8 = 20;
    pub const SCRYPT_MAX_P: u32 = 16;
    /// scrypt memory, 128 * r * N bytes (1 GiB).
    pub const SCRYPT_MAX_MEMORY: u64 = 1 << 30;
}

/// ASCII armor framing.
pub mod armor {
    pub const PREFIX: &str = "PQSEAL";
    pub const LINE_WIDTH: usize = 64;
}
