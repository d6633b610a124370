//! Decodes a chunk's compressed payload into one value column per metric slot.
//!
//! Decompressed layout (all integers little-endian):
//!
//! ```text
//! nMetrics: u32 | nDeltas: u32 | nMetrics x i64 initial values | delta stream
//! ```
//!
//! The delta stream holds `nMetrics * nDeltas` varint-coded deltas, walked in the
//! order set by `CodecPolicy::delta_order`, with zero runs expanded by
//! `kernels::delta::DeltaStream`. Reconstruction is checked: a sum that leaves the
//! `i64` range is an error, never a wraparound.

use crate::bridge::format::{INITIAL_VALUE_SIZE, PAYLOAD_HEADER_SIZE};
use crate::config::{DeltaOrder, FtdcConfig};
use crate::error::FtdcError;
use crate::kernels::delta::DeltaStream;
use crate::kernels::zlib;

/// Per-slot value columns recovered from one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    /// `nDeltas + 1`.
    pub sample_count: usize,
    /// One column per slot, each `sample_count` long.
    pub columns: Vec<Vec<i64>>,
}

/// Inflates `compressed` and decodes it, expecting exactly `expected_slots` metrics.
pub fn decode_payload(
    compressed: &[u8],
    expected_slots: usize,
    config: &FtdcConfig,
) -> Result<DecodedPayload, FtdcError> {
    let raw = if config.codec.length_prefixed_payload {
        zlib::decode_prefixed(compressed, config.max_payload_size)?
    } else {
        zlib::decode(compressed, config.max_payload_size)?
    };
    decode_raw_payload(&raw, expected_slots, config)
}

/// Decodes an already-inflated payload.
pub fn decode_raw_payload(
    raw: &[u8],
    expected_slots: usize,
    config: &FtdcConfig,
) -> Result<DecodedPayload, FtdcError> {
    // --- 1. Header ---
    let header = raw.get(..PAYLOAD_HEADER_SIZE).ok_or_else(|| {
        FtdcError::TruncatedPayload(format!(
            "payload is {} bytes, too short for its {}-byte header",
            raw.len(),
            PAYLOAD_HEADER_SIZE
        ))
    })?;
    let n_metrics = read_u32_le(&header[0..4]) as usize;
    let n_deltas = read_u32_le(&header[4..8]) as usize;

    if n_metrics != expected_slots {
        return Err(FtdcError::SchemaError(format!(
            "payload declares {} metrics but the reference document flattens to {}",
            n_metrics, expected_slots
        )));
    }

    let sample_count = n_deltas + 1;
    if sample_count > config.max_samples_per_chunk as usize {
        return Err(FtdcError::MalformedChunk(format!(
            "payload declares {} samples, above the limit of {}",
            sample_count, config.max_samples_per_chunk
        )));
    }

    // --- 2. Initial values ---
    let initial_end = n_metrics
        .checked_mul(INITIAL_VALUE_SIZE)
        .and_then(|len| len.checked_add(PAYLOAD_HEADER_SIZE))
        .ok_or_else(|| FtdcError::OverflowError(format!("{} metrics overflow usize", n_metrics)))?;
    let initial_bytes = raw.get(PAYLOAD_HEADER_SIZE..initial_end).ok_or_else(|| {
        FtdcError::TruncatedPayload(format!(
            "payload is {} bytes, but {} initial values need {}",
            raw.len(),
            n_metrics,
            initial_end
        ))
    })?;

    let mut columns: Vec<Vec<i64>> = initial_bytes
        .chunks_exact(INITIAL_VALUE_SIZE)
        .map(|bytes| {
            let mut column = Vec::with_capacity(sample_count);
            column.push(read_i64_le(bytes));
            column
        })
        .collect();

    // --- 3. Delta stream ---
    let codec = config.codec.delta_codec();
    let mut stream = DeltaStream::new(&raw[initial_end..], codec);
    let expected_deltas = n_metrics * n_deltas;
    let mut decoded = 0usize;

    let mut next = |stream: &mut DeltaStream<'_>| -> Result<i64, FtdcError> {
        let delta = stream.next_delta().map_err(|e| match e {
            FtdcError::TruncatedPayload(msg) => FtdcError::TruncatedPayload(format!(
                "{} after {} of {} deltas",
                msg, decoded, expected_deltas
            )),
            other => other,
        })?;
        decoded += 1;
        Ok(delta)
    };

    match config.codec.delta_order {
        DeltaOrder::SampleMajor => {
            for _ in 0..n_deltas {
                for column in columns.iter_mut() {
                    apply_delta(column, next(&mut stream)?)?;
                }
            }
        }
        DeltaOrder::MetricMajor => {
            for column in columns.iter_mut() {
                for _ in 0..n_deltas {
                    apply_delta(column, next(&mut stream)?)?;
                }
            }
        }
    }

    if stream.pending_zeros() > 0 {
        return Err(FtdcError::MalformedChunk(format!(
            "zero run overruns the declared {} deltas by {}",
            expected_deltas,
            stream.pending_zeros()
        )));
    }
    if stream.remaining_bytes() > 0 {
        log::debug!(
            "ignoring {} trailing payload bytes after {} {} deltas",
            stream.remaining_bytes(),
            expected_deltas,
            codec.name()
        );
    }

    Ok(DecodedPayload {
        sample_count,
        columns,
    })
}

/// Appends `last + delta` to `column`. Columns always hold their initial value.
fn apply_delta(column: &mut Vec<i64>, delta: i64) -> Result<(), FtdcError> {
    let previous = column[column.len() - 1];
    let value = previous.checked_add(delta).ok_or_else(|| {
        FtdcError::OverflowError(format!(
            "sample {}: {} + {} leaves the i64 range",
            column.len(),
            previous,
            delta
        ))
    })?;
    column.push(value);
    Ok(())
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

fn read_i64_le(bytes: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    i64::from_le_bytes(buf)
}
