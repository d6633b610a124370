//! This module contains the pure, stateless kernels for zlib (deflate)
//! compression and decompression of FTDC chunk payloads.
//!
//! It is a safe, panic-free wrapper around the `flate2` crate. Decompression is
//! driven through the low-level `Decompress` state machine rather than a `Read`
//! adapter so that a stream which stops before its end marker is reported as an
//! error instead of silently yielding a short buffer.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use crate::error::FtdcError;

/// Size of the optional uncompressed-length prefix, in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

//==================================================================================
// 1. Core Logic
//==================================================================================

/// Inflates a complete zlib stream into `output_buf`, refusing to grow it past `max_output` bytes.
fn decompress_slice(
    input_bytes: &[u8],
    output_buf: &mut Vec<u8>,
    max_output: usize,
) -> Result<(), FtdcError> {
    let mut inflater = Decompress::new(true);
    if output_buf.capacity() == 0 {
        output_buf.reserve(input_bytes.len().saturating_mul(4).clamp(64, max_output.max(64)));
    }

    loop {
        if output_buf.len() > max_output {
            return Err(FtdcError::DecompressionError(format!(
                "zlib stream inflates past the {}-byte limit",
                max_output
            )));
        }
        if output_buf.len() == output_buf.capacity() {
            // One spare byte past the limit is enough to detect an overrun.
            let headroom = max_output.saturating_add(1) - output_buf.len();
            output_buf.reserve_exact(output_buf.capacity().max(64).min(headroom));
        }

        let in_before = inflater.total_in();
        let out_before = inflater.total_out();

        // `None` keeps the inflater resumable when the output buffer fills mid-stream.
        let status = inflater
            .decompress_vec(&input_bytes[in_before as usize..], output_buf, FlushDecompress::None)
            .map_err(|e| FtdcError::DecompressionError(e.to_string()))?;

        match status {
            Status::StreamEnd => return Ok(()),
            Status::Ok | Status::BufError => {
                let stalled = inflater.total_in() == in_before && inflater.total_out() == out_before;
                if stalled && output_buf.len() < output_buf.capacity() {
                    return Err(FtdcError::DecompressionError(format!(
                        "zlib stream ended early after {} of {} input bytes",
                        inflater.total_in(),
                        input_bytes.len()
                    )));
                }
            }
        }
    }
}

//==================================================================================
// 2. Public API
//==================================================================================

/// Compresses a byte slice into a zlib stream.
pub fn encode(input_bytes: &[u8], level: u32) -> Result<Vec<u8>, FtdcError> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(input_bytes.len() / 2 + 16), Compression::new(level));
    encoder.write_all(input_bytes)?;
    Ok(encoder.finish()?)
}

/// Compresses a byte slice and prepends its uncompressed length as a little-endian `u32`.
pub fn encode_prefixed(input_bytes: &[u8], level: u32) -> Result<Vec<u8>, FtdcError> {
    let uncompressed_len = u32::try_from(input_bytes.len()).map_err(|_| {
        FtdcError::OverflowError(format!(
            "payload of {} bytes does not fit a u32 length prefix",
            input_bytes.len()
        ))
    })?;
    let mut output_buf = uncompressed_len.to_le_bytes().to_vec();
    output_buf.extend_from_slice(&encode(input_bytes, level)?);
    Ok(output_buf)
}

/// Inflates a bare zlib stream of at most `max_output` bytes.
pub fn decode(input_bytes: &[u8], max_output: usize) -> Result<Vec<u8>, FtdcError> {
    let mut output_buf = Vec::new();
    decompress_slice(input_bytes, &mut output_buf, max_output)?;
    Ok(output_buf)
}

/// Inflates a zlib stream that is preceded by its uncompressed length.
pub fn decode_prefixed(input_bytes: &[u8], max_output: usize) -> Result<Vec<u8>, FtdcError> {
    let header = input_bytes.get(..LENGTH_PREFIX_SIZE).ok_or_else(|| {
        FtdcError::DecompressionError(
            "Input stream too short to contain size header.".to_string(),
        )
    })?;
    let mut len_bytes = [0u8; LENGTH_PREFIX_SIZE];
    len_bytes.copy_from_slice(header);
    let uncompressed_len = u32::from_le_bytes(len_bytes) as usize;
    if uncompressed_len > max_output {
        return Err(FtdcError::DecompressionError(format!(
            "size header declares {} bytes, above the {}-byte limit",
            uncompressed_len, max_output
        )));
    }

    // Deflate cannot expand data by more than ~1032x; never trust the header beyond that.
    let mut output_buf =
        Vec::with_capacity(uncompressed_len.min(input_bytes.len().saturating_mul(1032)));
    decompress_slice(&input_bytes[LENGTH_PREFIX_SIZE..], &mut output_buf, max_output)?;

    if output_buf.len() != uncompressed_len {
        return Err(FtdcError::DecompressionError(format!(
            "Decompressed size does not match header. Expected {}, got {}.",
            uncompressed_len,
            output_buf.len()
        )));
    }
    Ok(output_buf)
}

//==================================================================================
// 3. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 1 << 20;

    #[test]
    fn test_zlib_roundtrip_simple_text() {
        let original_bytes =
            b"hello world, this is a test of zlib compression. hello world, this is a test."
                .to_vec();
        let compressed_bytes = encode(&original_bytes, 6).unwrap();
        assert!(compressed_bytes.len() < original_bytes.len());
        assert_eq!(decode(&compressed_bytes, LIMIT).unwrap(), original_bytes);
    }

    #[test]
    fn test_zlib_roundtrip_large_output_grows_buffer() {
        let original_bytes = vec![42u8; 100_000];
        let compressed_bytes = encode(&original_bytes, 9).unwrap();
        assert!(compressed_bytes.len() < 1_000);
        assert_eq!(decode(&compressed_bytes, LIMIT).unwrap(), original_bytes);
    }

    #[test]
    fn test_zlib_highly_compressible_stream_spans_many_refills() {
        // Inflates to several hundred times its compressed size.
        let original_bytes = vec![0u8; 512 * 1024];
        let compressed_bytes = encode(&original_bytes, 9).unwrap();
        assert!(compressed_bytes.len() * 100 < original_bytes.len());
        assert_eq!(decode(&compressed_bytes, LIMIT).unwrap(), original_bytes);
    }

    #[test]
    fn test_zlib_output_cap_is_enforced() {
        let original_bytes = vec![7u8; 10_000];
        let compressed_bytes = encode(&original_bytes, 9).unwrap();
        assert_eq!(decode(&compressed_bytes, 10_000).unwrap().len(), 10_000);

        let err = decode(&compressed_bytes, 9_999).unwrap_err();
        assert!(matches!(err, FtdcError::DecompressionError(_)));
        assert!(err.to_string().contains("9999-byte limit"), "{}", err);
    }

    #[test]
    fn test_prefixed_header_above_cap_is_rejected() {
        let prefixed = encode_prefixed(&[1u8; 2_048], 6).unwrap();
        let err = decode_prefixed(&prefixed, 1_024).unwrap_err();
        assert!(err.to_string().contains("above the 1024-byte limit"), "{}", err);
    }

    #[test]
    fn test_zlib_decompress_invalid_data() {
        let invalid_bytes = vec![1, 2, 3, 4, 5];
        assert!(matches!(
            decode(&invalid_bytes, LIMIT),
            Err(FtdcError::DecompressionError(_))
        ));
    }

    #[test]
    fn test_zlib_decompress_truncated_stream() {
        let original_bytes: Vec<u8> = (0..4096u32).flat_map(|v| v.to_le_bytes()).collect();
        let compressed_bytes = encode(&original_bytes, 6).unwrap();
        let truncated = &compressed_bytes[..compressed_bytes.len() / 2];
        assert!(matches!(decode(truncated, LIMIT), Err(FtdcError::DecompressionError(_))));
    }

    #[test]
    fn test_zlib_decompress_empty_input() {
        assert!(matches!(decode(&[], LIMIT), Err(FtdcError::DecompressionError(_))));
    }

    #[test]
    fn test_prefixed_roundtrip_and_size_check() {
        let original_bytes = b"abcabcabcabcabc".to_vec();
        let mut prefixed = encode_prefixed(&original_bytes, 6).unwrap();
        assert_eq!(&prefixed[..4], &(original_bytes.len() as u32).to_le_bytes());
        assert_eq!(decode_prefixed(&prefixed, LIMIT).unwrap(), original_bytes);

        prefixed[0] = prefixed[0].wrapping_add(1);
        let err = decode_prefixed(&prefixed, LIMIT).unwrap_err();
        assert!(err.to_string().contains("does not match header"));
    }

    #[test]
    fn test_prefixed_too_short() {
        assert!(matches!(
            decode_prefixed(&[1, 2], LIMIT),
            Err(FtdcError::DecompressionError(_))
        ));
    }
}
