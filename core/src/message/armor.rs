//! message/armor.rs
//!
//! ASCII armor for text-only channels.
//!
//! ```text
//! -----BEGIN PQSEAL MESSAGE-----
//! <base64, 64 columns>
//! =<base64 of the big-endian CRC-32 of the binary>
//! -----END PQSEAL MESSAGE-----
//! ```
//!
//! The armor is a transparent envelope: the binary record inside is unchanged.

use std::io::{self, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use byteorder::{BigEndian, ByteOrder};
use crc32fast::Hasher;
use thiserror::Error;

use crate::constants::armor::{LINE_WIDTH, PREFIX};
use crate::message::wire::PacketType;

/// Binary bytes per full armor line.
const LINE_BYTES: usize = LINE_WIDTH / 4 * 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArmorError {
    #[error("armor: missing BEGIN line")]
    MissingBegin,

    #[error("armor: missing END line")]
    MissingEnd,

    #[error("armor: expected label {expected:?}, got {actual:?}")]
    LabelMismatch { expected: String, actual: String },

    #[error("armor: BEGIN and END labels differ")]
    UnbalancedLabels,

    #[error("armor: missing checksum line")]
    MissingChecksum,

    #[error("armor: checksum mismatch (expected {expected:08x}, computed {actual:08x})")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("armor: bad base64: {0}")]
    Base64(String),
}

fn crc_bytes(crc: u32) -> [u8; 4] {
    let mut out = [0u8; 4];
    BigEndian::write_u32(&mut out, crc);
    out
}

fn begin_line(label: &str) -> String {
    format!("-----BEGIN {PREFIX} {label}-----")
}

fn end_line(label: &str) -> String {
    format!("-----END {PREFIX} {label}-----")
}

/// Streaming armor encoder over any writer.
pub struct ArmorWriter<W: Write> {
    inner: W,
    label: &'static str,
    pending: Vec<u8>,
    crc: Hasher,
}

impl<W: Write> ArmorWriter<W> {
    /// Writes the BEGIN line immediately.
    pub fn new(mut inner: W, packet: PacketType) -> io::Result<Self> {
        let label = packet.label();
        writeln!(inner, "{}", begin_line(label))?;
        Ok(Self { inner, label, pending: Vec::with_capacity(LINE_BYTES), crc: Hasher::new() })
    }

    fn emit_line(&mut self, bytes: &[u8]) -> io::Result<()> {
        let line = STANDARD.encode(bytes);
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(b"\n")
    }

    /// Flush the last partial line, the checksum and the END line.
    pub fn finish(mut self) -> io::Result<W> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.emit_line(&rest)?;
        }
        let crc = self.crc.clone().finalize();
        writeln!(self.inner, "={}", STANDARD.encode(crc_bytes(crc)))?;
        writeln!(self.inner, "{}", end_line(self.label))?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for ArmorWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.crc.update(buf);
        let mut rest = buf;
        while !rest.is_empty() {
            let take = (LINE_BYTES - self.pending.len()).min(rest.len());
            self.pending.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.pending.len() == LINE_BYTES {
                let mut line = std::mem::take(&mut self.pending);
                self.emit_line(&line)?;
                line.clear();
                self.pending = line;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Armor a complete binary record.
pub fn armor(bytes: &[u8], packet: PacketType) -> String {
    let mut out = String::with_capacity(bytes.len() * 4 / 3 + 128);
    out.push_str(&begin_line(packet.label()));
    out.push('\n');
    for line in bytes.chunks(LINE_BYTES) {
        out.push_str(&STANDARD.encode(line));
        out.push('\n');
    }
    out.push('=');
    out.push_str(&STANDARD.encode(crc_bytes(crc32fast::hash(bytes))));
    out.push('\n');
    out.push_str(&end_line(packet.label()));
    out.push('\n');
    out
}

fn parse_label<'t>(line: &'t str, kind: &str) -> Option<&'t str> {
    line.strip_prefix("-----")?
        .strip_suffix("-----")?
        .strip_prefix(kind)?
        .strip_prefix(' ')?
        .strip_prefix(PREFIX)?
        .strip_prefix(' ')
}

/// Strip the armor and check label and checksum. Text around the block is ignored.
pub fn dearmor(text: &str, expected: PacketType) -> Result<Vec<u8>, ArmorError> {
    let mut lines = text.lines().map(str::trim);
    let label = lines
        .by_ref()
        .find_map(|l| parse_label(l, "BEGIN"))
        .ok_or(ArmorError::MissingBegin)?;
    if label != expected.label() {
        return Err(ArmorError::LabelMismatch { expected: expected.label().into(), actual: label.into() });
    }

    let mut body = String::new();
    let mut checksum = None;
    let mut end = None;
    for line in lines.by_ref() {
        if let Some(l) = parse_label(line, "END") {
            end = Some(l);
            break;
        }
        match line.strip_prefix('=') {
            Some(c) => checksum = Some(c),
            None if checksum.is_none() => body.push_str(line),
            None => {}
        }
    }
    match end {
        None => return Err(ArmorError::MissingEnd),
        Some(l) if l != label => return Err(ArmorError::UnbalancedLabels),
        Some(_) => {}
    }

    let bytes = STANDARD.decode(body.as_bytes()).map_err(|e| ArmorError::Base64(e.to_string()))?;
    let checksum = checksum.ok_or(ArmorError::MissingChecksum)?;
    let raw = STANDARD.decode(checksum).map_err(|e| ArmorError::Base64(e.to_string()))?;
    if raw.len() != 4 {
        return Err(ArmorError::Base64("checksum is not 4 bytes".into()));
    }
    let expected_crc = BigEndian::read_u32(&raw);
    let actual = crc32fast::hash(&bytes);
    if expected_crc != actual {
        tracing::warn!(expected = expected_crc, actual, "armor checksum mismatch");
        return Err(ArmorError::ChecksumMismatch { expected: expected_crc, actual });
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_matches_one_shot_armor() {
        let data: Vec<u8> = (0..200u16).map(|i| (i * 7) as u8).collect();
        let mut w = ArmorWriter::new(Vec::new(), PacketType::Message).unwrap();
        for piece in data.chunks(13) {
            w.write_all(piece).unwrap();
        }
        let streamed = String::from_utf8(w.finish().unwrap()).unwrap();
        assert_eq!(streamed, armor(&data, PacketType::Message));
        assert!(streamed.lines().all(|l| l.len() <= LINE_WIDTH + 10));
        assert!(streamed.starts_with("-----BEGIN PQSEAL MESSAGE-----\n"));
    }

    #[test]
    fn lines_wrap_at_sixty_four_columns() {
        let text = armor(&[0u8; 100], PacketType::PublicKey);
        let body: Vec<&str> = text.lines().skip(1).take(2).collect();
        assert_eq!(body[0].len(), LINE_WIDTH);
        assert_eq!(body[1].len(), LINE_WIDTH);
    }

    #[test]
    fn dearmor_checks_label_and_checksum() {
        let text = armor(b"record bytes", PacketType::Message);
        assert_eq!(dearmor(&text, PacketType::Message).unwrap(), b"record bytes");
        assert!(matches!(dearmor(&text, PacketType::PrivateKey), Err(ArmorError::LabelMismatch { .. })));

        let tampered = text.replacen("cmVjb3Jk", "cmVjb3Je", 1);
        assert!(matches!(dearmor(&tampered, PacketType::Message), Err(ArmorError::ChecksumMismatch { .. })));

        let cut: String = text.lines().take(2).collect::<Vec<_>>().join("\n");
        assert_eq!(dearmor(&cut, PacketType::Message), Err(ArmorError::MissingEnd));
    }
}
