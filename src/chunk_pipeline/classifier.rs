//! Parses a framed document as BSON and routes it by its `type` discriminator.
//!
//! Required fields:
//! - `_id`: UTC datetime, for every document
//! - `type`: int32 or int64, for every document
//! - `doc`: embedded document, for every document
//! - `data`: binary, for metric chunks only

use bson::{DateTime, Document, RawBinaryRef, RawBsonRef, RawDocumentBuf};

use crate::bridge::format::{DocumentKind, FIELD_DATA, FIELD_DOC, FIELD_ID, FIELD_TYPE};
use crate::chunk_pipeline::stream::RawDocument;
use crate::error::FtdcError;

/// A document carrying schema/context information, passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataDocument {
    pub captured_at: DateTime,
    pub kind: DocumentKind,
    pub doc: Document,
}

/// A metric batch awaiting flattening and payload decode.
#[derive(Debug, Clone, PartialEq)]
pub struct DataChunk {
    /// Offset of the source document, kept for diagnostics.
    pub offset: u64,
    pub captured_at: DateTime,
    /// The nested reference document whose leaves name the metrics. Kept as raw
    /// BSON so repeated field names each keep their own slot.
    pub reference: RawDocumentBuf,
    /// The compressed payload.
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedDocument {
    Metadata(MetadataDocument),
    Data(DataChunk),
}

/// Parses `raw` and classifies it.
pub fn classify(raw: &RawDocument) -> Result<ClassifiedDocument, FtdcError> {
    let offset = raw.offset();
    let document = bson::RawDocument::from_bytes(raw.as_bytes()).map_err(|e| invalid_bson(offset, e))?;

    let captured_at = match lookup(document, offset, FIELD_ID)? {
        Some(RawBsonRef::DateTime(dt)) => dt,
        other => return Err(wrong_field(offset, FIELD_ID, "a UTC datetime", other)),
    };

    let discriminator = match lookup(document, offset, FIELD_TYPE)? {
        Some(RawBsonRef::Int32(v)) => i64::from(v),
        Some(RawBsonRef::Int64(v)) => v,
        other => return Err(wrong_field(offset, FIELD_TYPE, "an integer", other)),
    };
    let kind = DocumentKind::try_from(discriminator).map_err(|e| {
        FtdcError::MalformedChunk(format!("document at offset {}: {}", offset, e))
    })?;

    let doc = match lookup(document, offset, FIELD_DOC)? {
        Some(RawBsonRef::Document(d)) => d,
        other => return Err(wrong_field(offset, FIELD_DOC, "an embedded document", other)),
    };

    match kind {
        DocumentKind::Metadata | DocumentKind::PeriodicMetadata => {
            let doc = Document::try_from(doc).map_err(|e| invalid_bson(offset, e))?;
            Ok(ClassifiedDocument::Metadata(MetadataDocument {
                captured_at,
                kind,
                doc,
            }))
        }
        DocumentKind::MetricChunk => {
            let payload = match lookup(document, offset, FIELD_DATA)? {
                Some(RawBsonRef::Binary(RawBinaryRef { bytes, .. })) => bytes.to_vec(),
                other => return Err(wrong_field(offset, FIELD_DATA, "binary data", other)),
            };
            Ok(ClassifiedDocument::Data(DataChunk {
                offset,
                captured_at,
                reference: doc.to_owned(),
                payload,
            }))
        }
    }
}

fn lookup<'a>(
    document: &'a bson::RawDocument,
    offset: u64,
    name: &str,
) -> Result<Option<RawBsonRef<'a>>, FtdcError> {
    document.get(name).map_err(|e| invalid_bson(offset, e))
}

fn invalid_bson(offset: u64, error: impl std::fmt::Display) -> FtdcError {
    FtdcError::MalformedChunk(format!("document at offset {} is not valid BSON: {}", offset, error))
}

fn wrong_field(offset: u64, field: &str, expected: &str, found: Option<RawBsonRef<'_>>) -> FtdcError {
    let found = match found {
        Some(value) => format!("{:?}", value.element_type()),
        None => "nothing".to_string(),
    };
    FtdcError::MalformedChunk(format!(
        "document at offset {}: field '{}' must be {}, found {}",
        offset, field, expected, found
    ))
}
