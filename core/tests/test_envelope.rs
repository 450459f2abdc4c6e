#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use proptest::prelude::*;

    use pqseal_core::message::envelope::{encode_varint, read_varint, ChunkReader, ChunkWriter, FrameError};
    use pqseal_core::message::stages::{close_readers, close_writers};
    use pqseal_core::types::MessageError;

    fn frame(payload: &[u8], chunk_size: usize) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let sink: &mut dyn Write = &mut out;
            let mut w = ChunkWriter::boxed(sink, chunk_size);
            w.write_all(payload).unwrap();
            let outcome = close_writers(w);
            assert!(outcome.errors.is_empty());
        }
        out
    }

    fn unframe(mut record: &[u8]) -> Result<(Vec<u8>, usize), MessageError> {
        let source: &mut dyn Read = &mut record;
        let mut r = ChunkReader::boxed(source);
        let mut out = Vec::new();
        let read = r.read_to_end(&mut out).map_err(MessageError::from);
        let outcome = close_readers(r);
        read?;
        MessageError::join(outcome.errors)?;
        Ok((out, record.len()))
    }

    #[test]
    fn empty_payload_is_one_terminator() {
        assert_eq!(frame(b"", 512), [0u8]);
        let (out, rest) = unframe(&[0u8, 0xaa]).unwrap();
        assert!(out.is_empty());
        assert_eq!(rest, 1, "bytes after the terminator stay unread");
    }

    #[test]
    fn chunk_boundaries() {
        let payload = vec![1u8; 1_100];
        let framed = frame(&payload, 512);
        // 512 -> 0x80 0x04, 76 -> 0x4c
        assert_eq!(&framed[..2], &[0x80, 0x04]);
        assert_eq!(framed[2 + 512..2 + 512 + 2], [0x80, 0x04]);
        assert_eq!(framed.len(), 2 + 512 + 2 + 512 + 1 + 76 + 1);
        assert_eq!(unframe(&framed).unwrap().0, payload);
    }

    #[test]
    fn missing_terminator_is_truncation() {
        let mut framed = frame(b"hello", 512);
        framed.pop();
        let err = unframe(&framed).unwrap_err();
        assert!(err.any(&|e| matches!(e, MessageError::Frame(FrameError::TruncatedStream))));
    }

    #[test]
    fn oversized_prefix_is_rejected() {
        let mut framed = Vec::new();
        encode_varint(64 * 1024 * 1024, &mut framed);
        framed.extend_from_slice(&[0u8; 16]);
        let err = unframe(&framed).unwrap_err();
        assert!(err.any(&|e| matches!(e, MessageError::Frame(FrameError::ChunkTooLarge { .. }))));
    }

    #[test]
    fn leb128_known_values() {
        for (value, bytes) in [(0u64, vec![0x00]), (127, vec![0x7f]), (128, vec![0x80, 0x01]), (300, vec![0xac, 0x02])] {
            let mut out = Vec::new();
            assert_eq!(encode_varint(value, &mut out), bytes.len());
            assert_eq!(out, bytes);
            assert_eq!(read_varint(&mut &bytes[..]).unwrap(), (value, bytes.len()));
        }
        assert_eq!(read_varint(&mut &[0x80u8][..]), Err(FrameError::TruncatedStream));
    }

    proptest! {
        #[test]
        fn prop_any_payload_survives_framing(
            payload in proptest::collection::vec(any::<u8>(), 0..4_000),
            chunk_size in 512usize..1_500,
        ) {
            let framed = frame(&payload, chunk_size);
            prop_assert_eq!(unframe(&framed).unwrap().0, payload);
        }
    }
}
