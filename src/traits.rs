//! This module defines shared traits used across different kernels.

/// A trait that maps a signed integer type to its unsigned counterpart.
pub trait HasUnsigned {
    type Unsigned;
}

/// A trait that maps an unsigned integer type to its signed counterpart.
pub trait HasSigned {
    type Signed;
}

// Implement the traits for all primitive integer types.
macro_rules! impl_signed_unsigned_pair {
    ($S:ty, $U:ty) => {
        impl HasUnsigned for $S {
            type Unsigned = $U;
        }
        impl HasSigned for $U {
            type Signed = $S;
        }
    };
}

impl_signed_unsigned_pair!(i8, u8);
impl_signed_unsigned_pair!(i16, u16);
impl_signed_unsigned_pair!(i32, u32);
impl_signed_unsigned_pair!(i64, u64);
impl_signed_unsigned_pair!(i128, u128);

/// The swappable mapping between a raw varint read from a delta stream and the
/// signed delta it stands for.
///
/// A zero *decoded* delta is what triggers the run-length escape, so the mapping
/// must send exactly one raw value to zero.
pub trait DeltaCodec: Send + Sync {
    /// Maps a raw varint to a signed delta.
    fn decode_delta(&self, raw: u64) -> i64;

    /// Maps a signed delta to the raw varint that `decode_delta` inverts.
    fn encode_delta(&self, delta: i64) -> u64;

    /// A short name used in log lines.
    fn name(&self) -> &'static str;
}
