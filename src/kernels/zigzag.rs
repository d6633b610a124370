//! This module contains the pure, stateless kernels for Zig-zag encoding and
//! decoding.
//!
//! Zig-zag is a lossless, bitwise mapping of signed integers onto unsigned ones
//! so that small magnitudes of either sign become small varints:
//! `0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, ...`.

use num_traits::{PrimInt, Signed, Unsigned};

use crate::traits::{HasSigned, HasUnsigned};

//==================================================================================
// 1. Generic Core Logic
//==================================================================================

/// Encodes a single signed integer using the Zig-zag algorithm.
pub fn encode_val<T>(n: T) -> T::Unsigned
where
    T: PrimInt + Signed + HasUnsigned + bytemuck::Pod,
    T::Unsigned: bytemuck::Pod,
{
    let bits = std::mem::size_of::<T>() * 8;
    // `>>` on a signed primitive is arithmetic, which is what spreads the sign bit.
    let shifted = (n << 1) ^ (n >> (bits - 1));
    bytemuck::cast(shifted)
}

/// Decodes a single unsigned integer back to its signed representation.
pub fn decode_val<U>(n: U) -> U::Signed
where
    U: PrimInt + Unsigned + HasSigned + bytemuck::Pod,
    U::Signed: PrimInt + Signed + bytemuck::Pod,
{
    // The formula is (n >> 1) ^ -(n & 1)
    let signed_shifted: U::Signed = bytemuck::cast(n >> 1);
    let signed_lsb: U::Signed = bytemuck::cast(n & U::one());
    signed_shifted ^ (-signed_lsb)
}

//==================================================================================
// 2. Unit Tests
//==================================================================================
