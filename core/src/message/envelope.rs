//! message/envelope.rs
//!
//! Length-prefixed chunk framing for the message body.
//!
//! Wire form: `(leb128(len) || len bytes)*  leb128(0)`.
//!
//! Design notes:
//! - The writer buffers up to `chunk_size` bytes and emits one chunk per full buffer;
//!   close flushes the remainder and writes the zero-length terminator.
//! - The reader yields chunk payloads until the terminator. EOF anywhere before it
//!   (inside a prefix, inside a chunk, or between chunks) is `TruncatedStream`.
//! - Closing a reader that still holds unread payload is also `TruncatedStream`: the
//!   consumer stopped short, so the body was not fully accounted for.
//! - Prefixes above `MAX_CHUNK_SIZE` are rejected before any allocation.

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::constants::MAX_CHUNK_SIZE;
use crate::message::stages::{BoxedReader, BoxedWriter, Closed, ReadStage, StageArtifact, WriteStage};
use crate::telemetry::{Stage, StageReport};
use crate::types::MessageError;

/// Longest LEB128 encoding of a u64.
const MAX_VARINT_LEN: usize = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("truncated stream: body ended before the terminating chunk")]
    TruncatedStream,

    #[error("chunk length {len} exceeds limit {max}")]
    ChunkTooLarge { len: u64, max: usize },

    #[error("malformed chunk length prefix")]
    BadLength,
}

impl From<FrameError> for io::Error {
    fn from(e: FrameError) -> Self {
        let kind = match e {
            FrameError::TruncatedStream => io::ErrorKind::UnexpectedEof,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, e)
    }
}

/// Append the LEB128 encoding of `v`.
#[inline]
pub fn encode_varint(mut v: u64, out: &mut Vec<u8>) -> usize {
    let start = out.len();
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
    out.len() - start
}

/// Read one LEB128 value. Returns `(value, encoded_len)`.
pub fn read_varint<R: Read + ?Sized>(r: &mut R) -> Result<(u64, usize), FrameError> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        let mut byte = [0u8; 1];
        r.read_exact(&mut byte).map_err(|_| FrameError::TruncatedStream)?;
        let b = byte[0];
        if i == MAX_VARINT_LEN - 1 && b > 0x01 {
            return Err(FrameError::BadLength);
        }
        value |= u64::from(b & 0x7f) << (7 * i);
        if b & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(FrameError::BadLength)
}

/// Innermost write stage: chunks bytes into the record sink.
pub struct ChunkWriter<'a> {
    sink: &'a mut dyn Write,
    buf: Vec<u8>,
    prefix: Vec<u8>,
    chunk_size: usize,
    report: StageReport,
}

impl<'a> ChunkWriter<'a> {
    pub fn new(sink: &'a mut dyn Write, chunk_size: usize) -> Self {
        Self {
            sink,
            buf: Vec::with_capacity(chunk_size),
            prefix: Vec::with_capacity(MAX_VARINT_LEN),
            chunk_size,
            report: StageReport::new(Stage::Encode),
        }
    }

    pub fn boxed(sink: &'a mut dyn Write, chunk_size: usize) -> BoxedWriter<'a> {
        Box::new(Self::new(sink, chunk_size))
    }

    fn emit(&mut self, data_from_buf: bool, data: &[u8]) -> io::Result<()> {
        let payload: &[u8] = if data_from_buf { &self.buf } else { data };
        self.prefix.clear();
        let prefix_len = encode_varint(payload.len() as u64, &mut self.prefix);
        self.sink.write_all(&self.prefix)?;
        self.sink.write_all(payload)?;
        tracing::trace!(len = payload.len(), "chunk emitted");
        self.report.chunks += 1;
        self.report.overhead += prefix_len as u64;
        self.report.bytes_out += (prefix_len + payload.len()) as u64;
        Ok(())
    }

    fn emit_buffered(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        self.emit(true, &[])?;
        self.buf.clear();
        Ok(())
    }

    fn write_terminator(&mut self) -> io::Result<()> {
        self.sink.write_all(&[0u8])?;
        self.report.overhead += 1;
        self.report.bytes_out += 1;
        self.sink.flush()
    }
}

impl Write for ChunkWriter<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.report.bytes_in += data.len() as u64;
        let mut rest = data;
        while !rest.is_empty() {
            // Bypass the buffer for whole chunks when nothing is pending.
            if self.buf.is_empty() && rest.len() >= self.chunk_size {
                let (chunk, tail) = rest.split_at(self.chunk_size);
                self.emit(false, chunk)?;
                rest = tail;
                continue;
            }
            let take = (self.chunk_size - self.buf.len()).min(rest.len());
            self.buf.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.buf.len() == self.chunk_size {
                self.emit_buffered()?;
            }
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

impl<'a> WriteStage<'a> for ChunkWriter<'a> {
    fn stage(&self) -> Stage {
        Stage::Encode
    }

    fn close(mut self: Box<Self>) -> Closed<BoxedWriter<'a>> {
        let result = self
            .emit_buffered()
            .and_then(|()| self.write_terminator())
            .map(|()| StageArtifact::None)
            .map_err(MessageError::from);
        Closed { inner: None, report: self.report.clone(), result }
    }
}

/// Innermost read stage: yields chunk payloads from the record source.
pub struct ChunkReader<'a> {
    source: &'a mut dyn Read,
    remaining: usize,
    done: bool,
    report: StageReport,
}

impl<'a> ChunkReader<'a> {
    pub fn new(source: &'a mut dyn Read) -> Self {
        Self { source, remaining: 0, done: false, report: StageReport::new(Stage::Decode) }
    }

    pub fn boxed(source: &'a mut dyn Read) -> BoxedReader<'a> {
        Box::new(Self::new(source))
    }

    /// True once the terminator has been consumed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    fn next_chunk(&mut self) -> Result<(), FrameError> {
        let (len, prefix_len) = read_varint(&mut *self.source)?;
        self.report.overhead += prefix_len as u64;
        self.report.bytes_in += prefix_len as u64;
        if len == 0 {
            self.done = true;
            return Ok(());
        }
        if len > MAX_CHUNK_SIZE as u64 {
            return Err(FrameError::ChunkTooLarge { len, max: MAX_CHUNK_SIZE });
        }
        self.report.chunks += 1;
        self.remaining = len as usize;
        Ok(())
    }
}

impl Read for ChunkReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.remaining == 0 {
            if self.done {
                return Ok(0);
            }
            self.next_chunk()?;
        }
        let want = self.remaining.min(buf.len());
        let n = self.source.read(&mut buf[..want])?;
        if n == 0 {
            return Err(FrameError::TruncatedStream.into());
        }
        self.remaining -= n;
        self.report.bytes_in += n as u64;
        self.report.bytes_out += n as u64;
        Ok(n)
    }
}

impl<'a> ReadStage<'a> for ChunkReader<'a> {
    fn stage(&self) -> Stage {
        Stage::Decode
    }

    /// Consumes up to the terminator so the record trailer can be read next.
    fn close(mut self: Box<Self>) -> Closed<BoxedReader<'a>> {
        let mut unread = 0u64;
        let mut sink = [0u8; 4096];
        let drained = loop {
            match self.read(&mut sink) {
                Ok(0) => break Ok(()),
                Ok(n) => unread += n as u64,
                Err(e) => break Err(MessageError::from(e)),
            }
        };
        let result = match drained {
            Err(e) => Err(e),
            Ok(()) if unread > 0 => {
                tracing::debug!(unread, "body closed with unread chunk data");
                Err(FrameError::TruncatedStream.into())
            }
            Ok(()) => Ok(StageArtifact::None),
        };
        Closed { inner: None, report: self.report.clone(), result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(data: &[u8], chunk_size: usize) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut w = ChunkWriter::boxed(&mut out, chunk_size);
            w.write_all(data).unwrap();
            let closed = w.close();
            assert!(closed.result.is_ok());
        }
        out
    }

    fn decode(mut bytes: &[u8]) -> (Vec<u8>, Result<StageArtifact, MessageError>) {
        let mut r = ChunkReader::boxed(&mut bytes);
        let mut out = Vec::new();
        let read = r.read_to_end(&mut out);
        let closed = r.close();
        match read {
            Ok(_) => (out, closed.result),
            Err(e) => (out, Err(e.into())),
        }
    }

    #[test]
    fn varint_encodes_leb128() {
        let mut out = Vec::new();
        assert_eq!(encode_varint(300, &mut out), 2);
        assert_eq!(out, [0xac, 0x02]);
        assert_eq!(read_varint(&mut &out[..]).unwrap(), (300, 2));
        let mut big = Vec::new();
        encode_varint(u64::MAX, &mut big);
        assert_eq!(read_varint(&mut &big[..]).unwrap(), (u64::MAX, 10));
    }

    #[test]
    fn empty_body_is_just_the_terminator() {
        let bytes = encode(b"", 16);
        assert_eq!(bytes, [0u8]);
        let (out, res) = decode(&bytes);
        assert!(out.is_empty());
        assert!(res.is_ok());
    }

    #[test]
    fn chunks_split_at_chunk_size() {
        let data: Vec<u8> = (0..40u8).collect();
        let bytes = encode(&data, 16);
        // 16 + 16 + 8, each with a one-byte prefix, plus the terminator.
        assert_eq!(bytes.len(), 40 + 3 + 1);
        assert_eq!(bytes[0], 16);
        let (out, res) = decode(&bytes);
        assert_eq!(out, data);
        assert!(res.is_ok());
    }

    #[test]
    fn missing_terminator_is_truncated() {
        let mut bytes = encode(b"hello", 16);
        bytes.pop();
        let (_, res) = decode(&bytes);
        assert!(matches!(res, Err(MessageError::Frame(FrameError::TruncatedStream))));
    }

    #[test]
    fn eof_inside_chunk_is_truncated() {
        let bytes = encode(b"hello world", 64);
        let (_, res) = decode(&bytes[..5]);
        assert!(matches!(res, Err(MessageError::Frame(FrameError::TruncatedStream))));
    }

    #[test]
    fn unread_payload_on_close_is_truncated() {
        let bytes = encode(b"hello world", 64);
        let mut src = &bytes[..];
        let mut r = ChunkReader::boxed(&mut src);
        let mut first = [0u8; 4];
        r.read_exact(&mut first).unwrap();
        let closed = r.close();
        assert!(matches!(closed.result, Err(MessageError::Frame(FrameError::TruncatedStream))));
    }

    #[test]
    fn oversized_prefix_rejected() {
        let mut bytes = Vec::new();
        encode_varint(MAX_CHUNK_SIZE as u64 + 1, &mut bytes);
        let (_, res) = decode(&bytes);
        assert!(matches!(res, Err(MessageError::Frame(FrameError::ChunkTooLarge { .. }))));
    }
}
