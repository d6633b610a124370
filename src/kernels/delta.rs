//! This module contains the kernels for the FTDC delta stream: the swappable
//! raw-varint-to-delta codecs and a reader that expands zero runs.
//!
//! On disk, a delta stream is a sequence of LEB128 varints. Each varint is mapped
//! to a signed delta by a `DeltaCodec`. Whenever that delta is zero, the varint
//! after it is not a delta but a repeat count `r`: the zero is applied and then
//! `r` further zeros follow before normal decoding resumes. A stream holding
//! "zero, 5" therefore expands to six zero deltas.

use std::io::Cursor;

use crate::error::FtdcError;
use crate::kernels::{leb128, zigzag};
use crate::traits::DeltaCodec;

//==================================================================================
// 1. Delta Codecs
//==================================================================================

/// Zig-zag mapping: `(v >> 1) ^ -(v & 1)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZigZagDeltas;

impl DeltaCodec for ZigZagDeltas {
    fn decode_delta(&self, raw: u64) -> i64 {
        zigzag::decode_val(raw)
    }

    fn encode_delta(&self, delta: i64) -> u64 {
        zigzag::encode_val(delta)
    }

    fn name(&self) -> &'static str {
        "zigzag"
    }
}

/// Two's-complement reinterpretation of the raw varint.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainDeltas;

impl DeltaCodec for PlainDeltas {
    fn decode_delta(&self, raw: u64) -> i64 {
        raw as i64
    }

    fn encode_delta(&self, delta: i64) -> u64 {
        delta as u64
    }

    fn name(&self) -> &'static str {
        "plain"
    }
}

//==================================================================================
// 2. Zero-Run Aware Stream Reader
//==================================================================================

/// Pulls signed deltas one at a time out of a raw delta stream, expanding zero runs.
pub struct DeltaStream<'a> {
    cursor: Cursor<&'a [u8]>,
    codec: &'a dyn DeltaCodec,
    pending_zeros: u64,
}

impl<'a> DeltaStream<'a> {
    pub fn new(bytes: &'a [u8], codec: &'a dyn DeltaCodec) -> Self {
        Self {
            cursor: Cursor::new(bytes),
            codec,
            pending_zeros: 0,
        }
    }

    /// Returns the next delta. Running out of bytes is a `TruncatedPayload`.
    pub fn next_delta(&mut self) -> Result<i64, FtdcError> {
        if self.pending_zeros > 0 {
            self.pending_zeros -= 1;
            return Ok(0);
        }

        let raw: u64 = leb128::decode_one(&mut self.cursor)?;
        let delta = self.codec.decode_delta(raw);
        if delta == 0 {
            self.pending_zeros = leb128::decode_one(&mut self.cursor)?;
        }
        Ok(delta)
    }

    /// Zeros announced by the last run marker that have not been consumed yet.
    pub fn pending_zeros(&self) -> u64 {
        self.pending_zeros
    }

    /// Bytes left in the stream after the current position.
    pub fn remaining_bytes(&self) -> usize {
        let len = self.cursor.get_ref().len();
        len.saturating_sub(self.cursor.position() as usize)
    }
}

//==================================================================================
// 3. Encoder (used to build fixtures and benchmark inputs)
//==================================================================================

/// Encodes a flat sequence of deltas, collapsing each run of zeros into a single
/// zero followed by the count of additional zeros.
pub fn encode_stream(deltas: &[i64], codec: &dyn DeltaCodec, output_buf: &mut Vec<u8>) {
    let mut i = 0;
    while i < deltas.len() {
        let delta = deltas[i];
        leb128::encode_one(codec.encode_delta(delta), output_buf);
        i += 1;
        if delta == 0 {
            let run = deltas[i..].iter().take_while(|&&d| d == 0).count();
            leb128::encode_one(run as u64, output_buf);
            i += run;
        }
    }
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
