//! message/wire.rs
//!
//! Record container shared by every packet kind.
//!
//! Layout: `[packet type u8][version u8][CBOR items and body chunks...]`.
//!
//! Design notes:
//! - The discriminator is checked before anything else is parsed.
//! - CBOR items are read straight off the stream; ciborium consumes exactly one item,
//!   leaving whatever follows (the body) unread.

use std::io::{Read, Write};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::constants::RECORD_V1;
use crate::telemetry::Tally;
use crate::types::MessageError;

/// Record kinds sharing the container format.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
pub enum PacketType {
    Message    = 0x01,
    PublicKey  = 0x02,
    PrivateKey = 0x03,
}

impl PacketType {
    pub fn label(self) -> &'static str {
        match self {
            PacketType::Message    => "MESSAGE",
            PacketType::PublicKey  => "PUBLIC KEY",
            PacketType::PrivateKey => "PRIVATE KEY",
        }
    }
}

pub const PREFIX_LEN: usize = 2;

pub fn write_prefix<W: Write + ?Sized>(w: &mut W, packet: PacketType) -> Result<usize, MessageError> {
    w.write_all(&[packet.into(), RECORD_V1])?;
    Ok(PREFIX_LEN)
}

/// Read and check the record prefix.
pub fn read_prefix<R: Read + ?Sized>(r: &mut R, expected: PacketType) -> Result<(), MessageError> {
    let mut prefix = [0u8; PREFIX_LEN];
    r.read_exact(&mut prefix)?;
    let [packet, version] = prefix;
    if packet != u8::from(expected) {
        return Err(MessageError::WrongPacketType { expected, actual: packet });
    }
    if version != RECORD_V1 {
        return Err(MessageError::UnsupportedVersion(version));
    }
    Ok(())
}

/// CBOR-encode `item` into a buffer.
pub fn to_cbor<T: Serialize>(item: &T) -> Result<Vec<u8>, MessageError> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(item, &mut out)?;
    Ok(out)
}

/// Write one CBOR item, returning its encoded length.
pub fn write_item<W: Write + ?Sized, T: Serialize>(w: &mut W, item: &T) -> Result<usize, MessageError> {
    let bytes = to_cbor(item)?;
    w.write_all(&bytes)?;
    Ok(bytes.len())
}

/// Read one CBOR item, returning it with its encoded length.
pub fn read_item<R: Read, T: DeserializeOwned>(r: R) -> Result<(T, usize), MessageError> {
    let mut counted = Tally::new(r);
    let item = ciborium::de::from_reader(&mut counted)?;
    Ok((item, counted.byte_count() as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_rejects_other_packets() {
        let mut buf = Vec::new();
        write_prefix(&mut buf, PacketType::PublicKey).unwrap();
        let err = read_prefix(&mut &buf[..], PacketType::Message).unwrap_err();
        assert!(matches!(err, MessageError::WrongPacketType { actual: 0x02, .. }));
        assert!(err.to_string().contains("PublicKey"));

        let err = read_prefix(&mut &[0x01, 0x09][..], PacketType::Message).unwrap_err();
        assert!(matches!(err, MessageError::UnsupportedVersion(9)));
    }

    #[test]
    fn item_reader_stops_after_one_item() {
        let mut buf = Vec::new();
        let len = write_item(&mut buf, &("hi", 7u32)).unwrap();
        buf.extend_from_slice(b"tail");
        let mut src = &buf[..];
        let ((s, n), read): ((String, u32), usize) = read_item(&mut src).unwrap();
        assert_eq!((s.as_str(), n, read), ("hi", 7, len));
        assert_eq!(src, b"tail");
    }
}
