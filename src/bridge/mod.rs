// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the outward-facing API of the ftdc-reader library. It wraps the
// pull-based `chunk_pipeline` engine and turns decoded chunks into bytes on a sink.
// The CLI binary talks only to this layer.
//
// Data Flow (Dump):
//
//   1. [Stateless API (dump)]              -> Receives `impl Read` + `impl Write`
//         |
//         `-> a. Builds a `ChunkIterator` over the reader with the shared config
//         |
//         `-> b. Pulls one `Chunk` per `advance()`
//
//   2. [Metric Writer (MetricWriter)]      -> Receives each `Chunk`
//         |
//         `-> Emits one `MetricRecord {key, values}` per metric, as a JSON line
//             or a BSON document, in Chunk-then-Metric order
//
//   3. [Stateless API (dump)]              -> Flushes the sink, then returns either
//                                             a `DumpSummary` or the terminal error
//
// ====================================================================================
pub mod format;
pub mod stateless_api;
pub mod writer;

// --- Low-Level Stateless API (for the CLI and testing) ---
pub use stateless_api::{decode_all, dump, DumpSummary};

// --- Output Encoding ---
pub use writer::MetricWriter;
