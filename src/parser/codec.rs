//! Field decoding: UTF-16LE text, little-endian integers, zlib chunks.

use super::header::{Result, UmdError};
use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::UTF_16LE;
use flate2::read::ZlibDecoder;
use log::trace;
use memchr::memmem;
use std::io::Read;

/// Newline as the format mis-encodes it inside content chunks.
const BROKEN_NEWLINE: [u8; 2] = [0x29, 0x20];

/// UTF-16LE newline.
const NEWLINE: [u8; 2] = [0x0A, 0x00];

/// Decode UTF-16LE text. A byte order mark is kept as an ordinary character
/// and malformed sequences become U+FFFD.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let (text, _had_errors) = UTF_16LE.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Read a little-endian u32 from the first four bytes, if present.
pub fn read_u32(bytes: &[u8]) -> Option<u32> {
    (bytes.len() >= 4).then(|| LittleEndian::read_u32(&bytes[..4]))
}

/// Split a table of little-endian u32 values.
pub fn read_u32_table(role: &'static str, id: u32, bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return Err(UmdError::InvalidTableLength {
            role,
            id,
            len: bytes.len(),
        });
    }

    let mut values = vec![0; bytes.len() / 4];
    LittleEndian::read_u32_into(bytes, &mut values);
    Ok(values)
}

/// Inflate one zlib-compressed content chunk.
pub fn inflate(id: u32, payload: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(payload.len() * 4);
    ZlibDecoder::new(payload)
        .read_to_end(&mut out)
        .map_err(|source| UmdError::DecompressionFailure { id, source })?;
    trace!("Inflated chunk {}: {} -> {} bytes", id, payload.len(), out.len());
    Ok(out)
}

/// Replace every `29 20` with `0A 00`, left to right without overlap.
///
/// Matches are taken at any byte position, not only on UTF-16 code unit
/// boundaries. Returns the number of replacements.
pub fn repair_newlines(buf: &mut [u8]) -> usize {
    let positions: Vec<usize> = memmem::find_iter(buf, &BROKEN_NEWLINE).collect();
    for &pos in &positions {
        buf[pos..pos + NEWLINE.len()].copy_from_slice(&NEWLINE);
    }
    positions.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use proptest::prelude::*;
    use std::io::Write;

    fn utf16(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    #[test]
    fn test_decode_utf16le() {
        assert_eq!(decode_utf16le(&utf16("第一章")), "第一章");
        assert_eq!(decode_utf16le(&[]), "");
    }

    #[test]
    fn test_decode_keeps_bom_character() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(utf16("狐"));
        assert_eq!(decode_utf16le(&bytes), "\u{FEFF}狐");
    }

    #[test]
    fn test_decode_odd_length() {
        let mut bytes = utf16("A");
        bytes.push(0x42);
        assert_eq!(decode_utf16le(&bytes), "A\u{FFFD}");
    }

    #[test]
    fn test_read_u32() {
        assert_eq!(read_u32(&[0x01, 0x02, 0x03, 0x04, 0xFF]), Some(0x0403_0201));
        assert_eq!(read_u32(&[0x01, 0x02, 0x03]), None);
    }

    #[test]
    fn test_read_u32_table() {
        let table = read_u32_table("offsets", 1, &[0, 0, 0, 0, 16, 0, 0, 0]).unwrap();
        assert_eq!(table, vec![0, 16]);

        let err = read_u32_table("offsets", 1, &[0, 0, 0]).unwrap_err();
        assert!(matches!(err, UmdError::InvalidTableLength { len: 3, .. }));
    }

    #[test]
    fn test_inflate() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"hello umd").unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(inflate(3, &compressed).unwrap(), b"hello umd");
    }

    #[test]
    fn test_inflate_rejects_garbage() {
        let err = inflate(42, &[0x00, 0x01, 0x02, 0x03]).unwrap_err();
        assert!(matches!(err, UmdError::DecompressionFailure { id: 42, .. }));
    }

    #[test]
    fn test_repair_adjacent_patterns() {
        let mut buf = vec![0x29, 0x20, 0x29, 0x20];
        assert_eq!(repair_newlines(&mut buf), 2);
        assert_eq!(buf, vec![0x0A, 0x00, 0x0A, 0x00]);
        assert_eq!(repair_newlines(&mut buf), 0);
    }

    #[test]
    fn test_repair_ignores_code_unit_boundaries() {
        // Units 0x2941 and 0x0020: the match straddles them.
        let mut buf = vec![0x41, 0x29, 0x20, 0x00];
        assert_eq!(repair_newlines(&mut buf), 1);
        assert_eq!(buf, vec![0x41, 0x0A, 0x00, 0x00]);
    }

    #[test]
    fn test_repair_overlapping_candidates() {
        let mut buf = vec![0x29, 0x29, 0x20, 0x20];
        assert_eq!(repair_newlines(&mut buf), 1);
        assert_eq!(buf, vec![0x29, 0x0A, 0x00, 0x20]);
    }

    proptest! {
        #[test]
        fn prop_repair_is_idempotent(mut buf in proptest::collection::vec(
            prop_oneof![Just(0x29u8), Just(0x20u8), Just(0x0Au8), Just(0x00u8), any::<u8>()],
            0..256,
        )) {
            repair_newlines(&mut buf);
            let once = buf.clone();
            prop_assert_eq!(repair_newlines(&mut buf), 0);
            prop_assert_eq!(buf, once);
        }
    }
}
