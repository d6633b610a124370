// In: src/chunk_pipeline/orchestrator/core.rs

use crate::chunk_pipeline::classifier::{classify, ClassifiedDocument, DataChunk, MetadataDocument};
use crate::chunk_pipeline::flatten::flatten;
use crate::chunk_pipeline::models::{Chunk, Metric};
use crate::chunk_pipeline::payload::decode_payload;
use crate::chunk_pipeline::stream::RawDocument;
use crate::config::FtdcConfig;
use crate::error::FtdcError;

//==================================================================================
// 1. Public Orchestration API
//==================================================================================

/// What a single framed document decodes to.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedDocument {
    Metadata(MetadataDocument),
    Chunk(Chunk),
}

/// Classifies one raw document and, if it is a metric chunk, decodes it fully.
pub fn decode_document(raw: &RawDocument, config: &FtdcConfig) -> Result<DecodedDocument, FtdcError> {
    match classify(raw)? {
        ClassifiedDocument::Metadata(meta) => Ok(DecodedDocument::Metadata(meta)),
        ClassifiedDocument::Data(data) => decode_chunk(data, config).map(DecodedDocument::Chunk),
    }
}

/// Turns a classified data document into a `Chunk`.
///
/// The coordinator runs three steps in order:
/// 1. Flatten the reference document into its ordered leaves.
/// 2. Decode the payload against the slot count those leaves imply.
/// 3. Pair each slot with its column, keeping only numeric leaves.
pub fn decode_chunk(data: DataChunk, config: &FtdcConfig) -> Result<Chunk, FtdcError> {
    // 1. Flatten.
    let reference = flatten(&data.reference, &config.codec).map_err(|e| e.at_offset(data.offset))?;
    let slot_count = reference.slot_count();

    // 2. Decode the payload, attaching the document offset to any failure.
    let decoded =
        decode_payload(&data.payload, slot_count, config).map_err(|e| e.at_offset(data.offset))?;

    // 3. Assemble. `decode_payload` guarantees one column per slot.
    let metrics: Vec<Metric> = reference
        .into_slots()
        .zip(decoded.columns)
        .filter(|(leaf, _)| leaf.is_numeric())
        .map(|(leaf, values)| Metric {
            key: leaf.key,
            values,
        })
        .collect();

    Ok(Chunk {
        captured_at_ms: data.captured_at.timestamp_millis(),
        sample_count: decoded.sample_count,
        metrics,
    })
}
