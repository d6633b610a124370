//! This module contains the pure, stateless kernels for LEB128 (Little-Endian
//! Base 128) variable-length integer encoding and decoding.
//!
//! Every value in an FTDC delta stream, whether a delta or a zero-run count, is
//! stored as one of these varints. The decoder is fully panic-free.

use num_traits::{PrimInt, Unsigned};
use std::io::Cursor;

use crate::error::FtdcError;

//==================================================================================
// 1. Public API for Single-Value Operations
//==================================================================================

/// Encodes a single unsigned integer into a LEB128 byte sequence, writing to a buffer.
pub fn encode_one<T>(value: T, buffer: &mut Vec<u8>)
where
    T: PrimInt + Unsigned,
{
    let zero = T::zero();
    let mut current_value = value;
    loop {
        // `to_u8` cannot fail on a value masked to 7 bits.
        let low_bits = (current_value & T::from(0x7Fu8).unwrap_or(zero)).to_u8().unwrap_or(0);
        current_value = current_value >> 7;
        if current_value == zero {
            buffer.push(low_bits);
            break;
        }
        buffer.push(low_bits | 0x80);
    }
}

/// Decodes a single unsigned integer from a LEB128 byte stream cursor.
///
/// Running out of bytes mid-value is a `TruncatedPayload`; a value wider than
/// `T` is an `OverflowError`.
pub fn decode_one<T>(cursor: &mut Cursor<&[u8]>) -> Result<T, FtdcError>
where
    T: PrimInt + Unsigned,
{
    let mut result = T::zero();
    let mut shift = 0;
    let total_bits = std::mem::size_of::<T>() * 8;

    loop {
        let pos = cursor.position() as usize;
        let byte = *cursor.get_ref().get(pos).ok_or_else(|| {
            FtdcError::TruncatedPayload(format!("unexpected end of buffer inside varint at byte {}", pos))
        })?;
        cursor.set_position((pos + 1) as u64);

        if shift >= total_bits {
            return Err(FtdcError::OverflowError(format!(
                "varint at byte {} exceeds {} bits",
                pos, total_bits
            )));
        }

        let seven_bit_payload = T::from(byte & 0x7F).ok_or_else(|| {
            FtdcError::OverflowError("failed to widen 7-bit varint payload".to_string())
        })?;
        result = result | (seven_bit_payload << shift);

        if byte & 0x80 == 0 {
            // The last group may only use the bits that remain in `T`.
            if shift + 7 > total_bits && (byte >> (total_bits - shift)) > 0 {
                return Err(FtdcError::OverflowError(format!(
                    "varint at byte {} exceeds {} bits",
                    pos, total_bits
                )));
            }
            return Ok(result);
        }

        shift += 7;
    }
}

//==================================================================================
// 2. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_u64(value: u64) -> u64 {
        let mut buf = Vec::new();
        encode_one(value, &mut buf);
        let mut cursor = Cursor::new(buf.as_slice());
        let decoded = decode_one::<u64>(&mut cursor).unwrap();
        assert_eq!(cursor.position() as usize, buf.len());
        decoded
    }

    #[test]
    fn test_leb128_known_encodings() {
        let mut buf = Vec::new();
        encode_one(624485u64, &mut buf);
        assert_eq!(buf, vec![0xE5, 0x8E, 0x26]);

        buf.clear();
        encode_one(0u64, &mut buf);
        assert_eq!(buf, vec![0x00]);

        buf.clear();
        encode_one(127u32, &mut buf);
        assert_eq!(buf, vec![0x7F]);

        buf.clear();
        encode_one(128u32, &mut buf);
        assert_eq!(buf, vec![0x80, 0x01]);
    }

    #[test]
    fn test_leb128_roundtrip_boundaries() {
        for value in [0, 1, 127, 128, 16_383, 16_384, u32::MAX as u64, u64::MAX - 1, u64::MAX] {
            assert_eq!(roundtrip_u64(value), value);
        }
    }

    #[test]
    fn test_decode_truncated_buffer() {
        let bytes = [0xE5u8, 0x8E];
        let mut cursor = Cursor::new(&bytes[..]);
        let result = decode_one::<u64>(&mut cursor);
        assert!(matches!(result, Err(FtdcError::TruncatedPayload(_))));
    }

    #[test]
    fn test_decode_overflow_error() {
        // This represents a value larger than u64::MAX
        let encoded_bytes = vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        let mut cursor = Cursor::new(encoded_bytes.as_slice());
        let result = decode_one::<u64>(&mut cursor);
        match result {
            Err(FtdcError::OverflowError(msg)) => assert!(msg.contains("64 bits")),
            other => panic!("Expected OverflowError, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_overlong_continuation_error() {
        let encoded_bytes = vec![0x80u8; 11];
        let mut cursor = Cursor::new(encoded_bytes.as_slice());
        assert!(matches!(
            decode_one::<u64>(&mut cursor),
            Err(FtdcError::OverflowError(_))
        ));
    }

    #[test]
    fn test_sequential_decode_advances_cursor() {
        let mut buf = Vec::new();
        encode_one(300u64, &mut buf);
        encode_one(5u64, &mut buf);
        let mut cursor = Cursor::new(buf.as_slice());
        assert_eq!(decode_one::<u64>(&mut cursor).unwrap(), 300);
        assert_eq!(decode_one::<u64>(&mut cursor).unwrap(), 5);
        assert_eq!(cursor.position() as usize, buf.len());
    }
}
