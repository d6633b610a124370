//! Builds FTDC byte streams for the integration tests from the crate's public kernels.

#![allow(dead_code)]

use bson::{doc, spec::BinarySubtype, Binary, Bson, DateTime, Document};
use ftdc_reader::kernels::delta::{encode_stream, ZigZagDeltas};
use ftdc_reader::kernels::zlib;

/// Sample-major, zig-zag coded, zlib compressed payload for equal-length columns.
pub fn payload(columns: &[Vec<i64>]) -> Vec<u8> {
    let samples = columns.first().map_or(1, |c| c.len());
    let n_deltas = samples - 1;

    let mut raw = Vec::new();
    raw.extend_from_slice(&(columns.len() as u32).to_le_bytes());
    raw.extend_from_slice(&(n_deltas as u32).to_le_bytes());
    for column in columns {
        raw.extend_from_slice(&column[0].to_le_bytes());
    }

    let mut deltas = Vec::with_capacity(columns.len() * n_deltas);
    for s in 1..samples {
        for column in columns {
            deltas.push(column[s].wrapping_sub(column[s - 1]));
        }
    }
    encode_stream(&deltas, &ZigZagDeltas, &mut raw);
    zlib::encode(&raw, 6).unwrap()
}

pub fn metadata(captured_at_ms: i64, body: Document) -> Document {
    doc! { "_id": DateTime::from_millis(captured_at_ms), "type": 0, "doc": body }
}

pub fn data(captured_at_ms: i64, reference: Document, payload: Vec<u8>) -> Document {
    let data = Bson::Binary(Binary {
        subtype: BinarySubtype::Generic,
        bytes: payload,
    });
    doc! {
        "_id": DateTime::from_millis(captured_at_ms),
        "type": 1,
        "doc": reference,
        "data": data,
    }
}

pub fn file_bytes(documents: &[Document]) -> Vec<u8> {
    let mut out = Vec::new();
    for document in documents {
        document.to_writer(&mut out).unwrap();
    }
    out
}

/// A metadata document, then one chunk of 2 metrics x 3 samples.
pub fn server_status_file() -> Vec<u8> {
    file_bytes(&[
        metadata(1_000, doc! { "buildInfo": { "version": "7.0.2" } }),
        data(
            2_000,
            doc! { "serverStatus": { "uptime": 100i64, "connections": { "current": 5i64 } } },
            payload(&[vec![100, 101, 102], vec![5, 5, 7]]),
        ),
    ])
}
