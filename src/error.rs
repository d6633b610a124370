// In: src/error.rs

//! This module defines the single, unified error type for the entire ftdc-reader library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Every core decode error is terminal for a `ChunkIterator`: once one is raised the
//! byte offsets of everything after it can no longer be trusted.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FtdcError {
    // =========================================================================
    // === Core Decode Errors (Framing, Classification, Payload)
    // =========================================================================
    /// The byte source ended in the middle of a length-prefixed document.
    #[error("Truncated stream: {0}")]
    TruncatedStream(String),

    /// A document is structurally invalid: bad length, unparseable BSON, or a
    /// missing/wrong-typed required field.
    #[error("Malformed chunk: {0}")]
    MalformedChunk(String),

    /// The flattened reference document does not line up with the payload header.
    #[error("Schema mismatch: {0}")]
    SchemaError(String),

    #[error("Decompression failed: {0}")]
    DecompressionError(String),

    /// The decompressed payload ran out of bytes before all declared values were read.
    #[error("Truncated payload: {0}")]
    TruncatedPayload(String),

    #[error("Integer overflow: {0}")]
    OverflowError(String),

    // =========================================================================
    // === Boundary Errors (Output Formatting, CLI)
    // =========================================================================
    #[error("Unsupported output format '{0}'. Supported formats are JSON, BSON")]
    UnsupportedFormat(String),

    #[error("failed to open file '{path}': {source}")]
    FileOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the underlying I/O subsystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, during config loading or JSON output.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error while encoding an output record as BSON.
    #[error("BSON encoding error: {0}")]
    BsonEncode(#[from] bson::ser::Error),
}

impl FtdcError {
    /// True for the errors raised by the decode pipeline itself, as opposed to
    /// errors at the I/O or output boundary.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            FtdcError::TruncatedStream(_)
                | FtdcError::MalformedChunk(_)
                | FtdcError::SchemaError(_)
                | FtdcError::DecompressionError(_)
                | FtdcError::TruncatedPayload(_)
                | FtdcError::OverflowError(_)
        )
    }

    /// Prefixes the message of a core decode error with the offset of the
    /// document it was raised for. Other variants pass through unchanged.
    pub fn at_offset(self, offset: u64) -> Self {
        let locate = |msg: String| format!("chunk at offset {}: {}", offset, msg);
        match self {
            FtdcError::TruncatedStream(m) => FtdcError::TruncatedStream(locate(m)),
            FtdcError::MalformedChunk(m) => FtdcError::MalformedChunk(locate(m)),
            FtdcError::SchemaError(m) => FtdcError::SchemaError(locate(m)),
            FtdcError::DecompressionError(m) => FtdcError::DecompressionError(locate(m)),
            FtdcError::TruncatedPayload(m) => FtdcError::TruncatedPayload(locate(m)),
            FtdcError::OverflowError(m) => FtdcError::OverflowError(locate(m)),
            other => other,
        }
    }
}
