//! This file is the root of the `ftdc_reader` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`chunk_pipeline`,
//!     `kernels`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the handful of types a caller needs to decode an FTDC stream.
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//! use ftdc_reader::ChunkIterator;
//!
//! # fn main() -> Result<(), ftdc_reader::FtdcError> {
//! let file = File::open("metrics.2024-01-01T00-00-00Z-00000")?;
//! let mut chunks = ChunkIterator::new(BufReader::new(file));
//! while chunks.advance() {
//!     if let Some(chunk) = chunks.current() {
//!         println!("{} metrics x {} samples", chunk.len(), chunk.sample_count);
//!     }
//! }
//! if let Some(e) = chunks.take_error() {
//!     return Err(e);
//! }
//! # Ok(())
//! # }
//! ```

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod bridge;
pub mod chunk_pipeline;
pub mod config;
pub mod error;
pub mod kernels;
pub mod traits;

#[doc(hidden)]
pub use log as __log;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use bridge::{decode_all, dump, DumpSummary, MetricWriter};
pub use chunk_pipeline::{Chunk, ChunkIterator, DecodeStats, IteratorState, Metric};
pub use config::{CodecPolicy, FtdcConfig, OutputFormat};
pub use error::FtdcError;
