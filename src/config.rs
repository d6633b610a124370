// In: src/config.rs

//! The single source of truth for all ftdc-reader decode configuration.
//!
//! This module defines the unified `FtdcConfig` struct, which is designed to be
//! created once at the application boundary (e.g., from CLI flags or a JSON file)
//! and then passed down through the system via a shared, read-only `Arc<FtdcConfig>`.
//!
//! The `CodecPolicy` sub-struct gathers every layout assumption the payload decoder
//! makes, so that each one can be switched and tested independently.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bridge::format::{
    DEFAULT_MAX_DOCUMENT_SIZE, DEFAULT_MAX_PAYLOAD_SIZE, DEFAULT_MAX_SAMPLES_PER_CHUNK,
};
use crate::error::FtdcError;
use crate::kernels::delta::{PlainDeltas, ZigZagDeltas};
use crate::traits::DeltaCodec;

//==================================================================================
// I. Output Format
//==================================================================================

/// Defines the wire encoding used by the bridge when emitting metric records.
///
/// Deserialization goes through `FromStr`, so config files accept the same
/// case-insensitive names as the command line.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum OutputFormat {
    /// **Default:** One compact JSON object per line.
    #[default]
    Json,

    /// Concatenated BSON documents, one per metric.
    Bson,
}

impl FromStr for OutputFormat {
    type Err = FtdcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "JSON" => Ok(OutputFormat::Json),
            "BSON" => Ok(OutputFormat::Bson),
            _ => Err(FtdcError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = FtdcError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("JSON"),
            OutputFormat::Bson => f.write_str("BSON"),
        }
    }
}

//==================================================================================
// II. Codec Policy
//==================================================================================

/// How a raw varint from the delta stream is turned into a signed delta.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeltaEncoding {
    /// **Default:** `(v >> 1) ^ -(v & 1)`.
    #[default]
    #[serde(rename = "zigzag", alias = "zig_zag")]
    ZigZag,
    /// The varint is reinterpreted as a two's-complement `i64`.
    Plain,
}

/// The nesting of the two delta loops.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeltaOrder {
    /// **Default:** samples are the outer loop, the metric index varies fastest.
    #[default]
    SampleMajor,
    /// All deltas for metric 0, then all deltas for metric 1, and so on.
    MetricMajor,
}

/// Whether non-numeric reference leaves occupy a slot in the payload.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeafSlotPolicy {
    /// **Default:** non-numeric leaves are invisible to payload alignment.
    #[default]
    Skip,
    /// Every leaf consumes a slot; slots of non-numeric leaves are decoded and dropped.
    Positional,
}

/// How a BSON timestamp leaf maps onto metric slots.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimestampLayout {
    /// **Default:** one slot holding the seconds since the epoch.
    #[default]
    Epoch,
    /// Two slots, `key` (seconds) followed by `key.inc` (increment).
    SecondsAndIncrement,
}

/// Every layout assumption the payload decoder makes, in one place.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CodecPolicy {
    #[serde(default)]
    pub delta_encoding: DeltaEncoding,

    #[serde(default)]
    pub delta_order: DeltaOrder,

    #[serde(default)]
    pub leaf_slots: LeafSlotPolicy,

    #[serde(default)]
    pub timestamp_layout: TimestampLayout,

    /// If true, the compressed payload starts with a little-endian `u32` holding
    /// the uncompressed length, as server-written files do.
    #[serde(default)]
    pub length_prefixed_payload: bool,
}

impl CodecPolicy {
    /// Resolves the configured delta encoding to its codec implementation.
    pub fn delta_codec(&self) -> &'static dyn DeltaCodec {
        match self.delta_encoding {
            DeltaEncoding::ZigZag => &ZigZagDeltas,
            DeltaEncoding::Plain => &PlainDeltas,
        }
    }
}

//==================================================================================
// III. The Unified FtdcConfig
//==================================================================================

/// The single, unified configuration for decoding and emitting an FTDC stream.
/// This struct is created once and shared throughout the system via an `Arc`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct FtdcConfig {
    /// The encoding the bridge uses for emitted metric records.
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Upper bound, in bytes, on a single framed document (length prefix included).
    /// Anything larger is rejected as malformed before its body is read.
    #[serde(default = "default_max_document_size")]
    pub max_document_size: usize,

    /// Upper bound on `nDeltas + 1` from a payload header, checked before any
    /// per-metric buffers are allocated.
    #[serde(default = "default_max_samples_per_chunk")]
    pub max_samples_per_chunk: u32,

    /// Upper bound, in bytes, on an inflated chunk payload.
    #[serde(default = "default_max_payload_size")]
    pub max_payload_size: usize,

    /// Payload layout switches.
    #[serde(default)]
    pub codec: CodecPolicy,
}

// Default implementation to make constructing the config easier.
impl Default for FtdcConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            max_document_size: default_max_document_size(),
            max_samples_per_chunk: default_max_samples_per_chunk(),
            max_payload_size: default_max_payload_size(),
            codec: CodecPolicy::default(),
        }
    }
}

impl FtdcConfig {
    /// Parses a config from a JSON string. Missing fields take their defaults.
    ///
    /// An unknown `output_format` is reported as `UnsupportedFormat`, exactly as
    /// it is for the `-o` flag.
    pub fn from_json_str(json: &str) -> Result<Self, FtdcError> {
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        let output_format = match value.as_object_mut().and_then(|o| o.remove("output_format")) {
            Some(serde_json::Value::String(name)) => Some(name.parse::<OutputFormat>()?),
            Some(other) => return Err(FtdcError::UnsupportedFormat(other.to_string())),
            None => None,
        };

        let mut config: FtdcConfig = serde_json::from_value(value)?;
        if let Some(format) = output_format {
            config.output_format = format;
        }
        Ok(config)
    }

    /// Loads a config from a JSON file on disk.
    pub fn from_json_file(path: &Path) -> Result<Self, FtdcError> {
        let text = std::fs::read_to_string(path).map_err(|source| FtdcError::FileOpen {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

/// Helper for `serde` to provide a default for `max_document_size`.
fn default_max_document_size() -> usize {
    DEFAULT_MAX_DOCUMENT_SIZE
}

/// Helper for `serde` to provide a default for `max_samples_per_chunk`.
fn default_max_samples_per_chunk() -> u32 {
    DEFAULT_MAX_SAMPLES_PER_CHUNK
}

/// Helper for `serde` to provide a default for `max_payload_size`.
fn default_max_payload_size() -> usize {
    DEFAULT_MAX_PAYLOAD_SIZE
}
