// In: src/bridge/format.rs

//! Defines all on-disk structures and constants for the FTDC format.
//! This is the single source of truth for both the document framing and the
//! chunk payload layout, and for the shape of the records the bridge emits.

use serde::Serialize;

use crate::error::FtdcError;

//==================================================================================
// I. Document Framing
//==================================================================================

/// Size of the little-endian `i32` length that prefixes every document.
pub const DOCUMENT_LENGTH_PREFIX_SIZE: usize = 4;
/// The smallest valid BSON document: the length prefix plus a terminating NUL.
pub const MIN_DOCUMENT_SIZE: usize = 5;
/// The server's internal BSON object limit (16 MiB user limit plus 16 KiB headroom).
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024 + 16 * 1024;

//==================================================================================
// II. Document Fields & Type Discriminator
//==================================================================================

/// The identifying timestamp of a document (a BSON UTC datetime).
pub const FIELD_ID: &str = "_id";
/// The type discriminator (see `DocumentKind`).
pub const FIELD_TYPE: &str = "type";
/// The embedded metadata or reference/schema document.
pub const FIELD_DOC: &str = "doc";
/// The compressed binary payload of a metric chunk.
pub const FIELD_DATA: &str = "data";

/// The value of a document's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Schema/context information captured once per file.
    Metadata,
    /// A batch of metric samples.
    MetricChunk,
    /// Metadata deltas written periodically by newer servers.
    PeriodicMetadata,
}

impl TryFrom<i64> for DocumentKind {
    type Error = FtdcError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DocumentKind::Metadata),
            1 => Ok(DocumentKind::MetricChunk),
            2 => Ok(DocumentKind::PeriodicMetadata),
            other => Err(FtdcError::MalformedChunk(format!(
                "unknown document type discriminator {}",
                other
            ))),
        }
    }
}

//==================================================================================
// III. Chunk Payload Layout
//==================================================================================

/// `nMetrics: u32` followed by `nDeltas: u32`, both little-endian.
pub const PAYLOAD_HEADER_SIZE: usize = 8;
/// Width of each initial sample value (a little-endian `i64`).
pub const INITIAL_VALUE_SIZE: usize = 8;
/// Default upper bound on `nDeltas + 1`.
pub const DEFAULT_MAX_SAMPLES_PER_CHUNK: u32 = 1 << 20;
/// Default upper bound on an inflated chunk payload.
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 64 * 1024 * 1024;
/// Path segment appended to a timestamp key for its increment slot.
pub const TIMESTAMP_INCREMENT_SUFFIX: &str = "inc";

//==================================================================================
// IV. Emitted Records
//==================================================================================

/// The structured record written for every metric: `{key, values}`.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricRecord<'a> {
    pub key: &'a str,
    pub values: &'a [i64],
}
