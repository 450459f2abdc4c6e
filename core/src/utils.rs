use std::fmt;
use num_enum::TryFromPrimitive;

/// Canonical form of a scheme name: trimmed and upper-cased.
#[inline]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

pub fn fmt_bytes(b: &[u8]) -> String {
    if b.iter().all(|&c| c.is_ascii_graphic() || c == b' ') {
        format!("b\"{}\"", String::from_utf8_lossy(b))
    } else {
        format!("0x{}", hex::encode(b))
    }
}

/// Current wall clock as unix seconds.
#[inline]
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

pub(crate) fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}
