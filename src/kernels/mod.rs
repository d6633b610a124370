//! This module serves as the public home for the collection of pure, stateless
//! kernels the FTDC payload decoder is built from.
//!
//! Each kernel is panic-free and reports failures through `FtdcError`. The
//! `chunk_pipeline::payload` module composes them in the order the format
//! dictates: inflate, read the fixed header, then walk the delta stream.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Entropy layer: the zlib container around every chunk payload.
pub mod zlib;

/// Bit-width layer: variable-length integers and signed/unsigned mapping.
pub mod leb128;
pub mod zigzag;

/// Value layer: delta codecs and the zero-run aware delta stream.
pub mod delta;
