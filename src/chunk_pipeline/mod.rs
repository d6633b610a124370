//! This module serves as the public API for the FTDC decode pipeline.
//!
//! It composes the lower-level kernels into the stages a metric chunk passes
//! through on its way from raw bytes to a `Chunk`: framing, classification,
//! reference flattening and payload reconstruction.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Splits a byte source into length-prefixed documents.
pub mod stream;

/// Routes each document by its type discriminator.
pub mod classifier;

/// Turns a reference document into its ordered metric leaves.
pub mod flatten;

/// Inflates and delta-decodes a chunk payload.
pub mod payload;

/// The "General Contractor": joins flattened keys with decoded columns.
pub mod orchestrator;

/// The pull-based state machine callers drive.
pub mod iterator;

pub mod models;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================

pub use self::iterator::{ChunkIterator, DecodeStats, IteratorState};
pub use self::models::{Chunk, Metric};
pub use self::orchestrator::{decode_chunk, decode_document};

#[cfg(test)]
pub(crate) mod test_support;
