//! Fixture builders shared by the pipeline's unit tests.

use bson::{doc, spec::BinarySubtype, Binary, Bson, DateTime, Document};

use crate::config::{CodecPolicy, DeltaOrder};
use crate::kernels::delta::encode_stream;
use crate::kernels::zlib;

/// Builds an uncompressed payload from explicit parts.
pub fn raw_payload_from_parts(n_metrics: u32, n_deltas: u32, initial: &[i64], deltas: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&n_metrics.to_le_bytes());
    out.extend_from_slice(&n_deltas.to_le_bytes());
    for value in initial {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out.extend_from_slice(deltas);
    out
}

/// Encodes equal-length value columns into an uncompressed payload laid out per `policy`.
pub fn encode_raw_payload(columns: &[Vec<i64>], policy: &CodecPolicy) -> Vec<u8> {
    let samples = columns.first().map_or(1, |c| c.len());
    let n_deltas = samples.saturating_sub(1);
    let column_deltas: Vec<Vec<i64>> = columns
        .iter()
        .map(|c| c.windows(2).map(|w| w[1].wrapping_sub(w[0])).collect())
        .collect();

    let deltas: Vec<i64> = match policy.delta_order {
        DeltaOrder::SampleMajor => (0..n_deltas)
            .flat_map(|s| column_deltas.iter().map(move |d| d[s]))
            .collect(),
        DeltaOrder::MetricMajor => column_deltas.concat(),
    };

    let mut stream = Vec::new();
    encode_stream(&deltas, policy.delta_codec(), &mut stream);
    let initial: Vec<i64> = columns.iter().map(|c| c[0]).collect();
    raw_payload_from_parts(columns.len() as u32, n_deltas as u32, &initial, &stream)
}

/// Encodes and compresses columns, adding the length prefix when the policy asks for one.
pub fn compressed_payload(columns: &[Vec<i64>], policy: &CodecPolicy) -> Vec<u8> {
    let raw = encode_raw_payload(columns, policy);
    let compressed = if policy.length_prefixed_payload {
        zlib::encode_prefixed(&raw, 6)
    } else {
        zlib::encode(&raw, 6)
    };
    compressed.unwrap()
}

pub fn metadata_document(captured_at_ms: i64, body: Document) -> Document {
    doc! {
        "_id": DateTime::from_millis(captured_at_ms),
        "type": 0,
        "doc": body,
    }
}

pub fn data_document(captured_at_ms: i64, reference: Document, payload: Vec<u8>) -> Document {
    doc! {
        "_id": DateTime::from_millis(captured_at_ms),
        "type": 1,
        "doc": reference,
        "data": binary(payload),
    }
}

pub fn binary(bytes: Vec<u8>) -> Bson {
    Bson::Binary(Binary {
        subtype: BinarySubtype::Generic,
        bytes,
    })
}

/// Serializes documents back to back, as they appear in a file.
pub fn to_bytes(documents: &[Document]) -> Vec<u8> {
    let mut out = Vec::new();
    for document in documents {
        document.to_writer(&mut out).unwrap();
    }
    out
}

/// The two-metric, three-sample stream used across the pipeline tests.
pub fn server_status_stream() -> Vec<u8> {
    let reference = doc! {
        "serverStatus": {
            "uptime": 100i64,
            "connections": { "current": 5i64 },
        }
    };
    let payload = compressed_payload(&[vec![100, 101, 102], vec![5, 5, 7]], &CodecPolicy::default());
    to_bytes(&[
        metadata_document(1_000, doc! { "buildInfo": { "version": "7.0.2" } }),
        data_document(2_000, reference, payload),
    ])
}
