// In: src/bridge/stateless_api.rs

use std::io::{Read, Write};
use std::sync::Arc;

use crate::bridge::writer::MetricWriter;
use crate::chunk_pipeline::iterator::{ChunkIterator, DecodeStats};
use crate::chunk_pipeline::models::Chunk;
use crate::config::{FtdcConfig, OutputFormat};
use crate::error::FtdcError;

/// What a completed `dump` wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpSummary {
    pub chunks: u64,
    pub records: u64,
    pub stats: DecodeStats,
}

/// Decodes every chunk of `reader` into memory.
/// This is the convenience counterpart to driving a `ChunkIterator` by hand.
pub fn decode_all<R: Read>(reader: R, config: Arc<FtdcConfig>) -> Result<Vec<Chunk>, FtdcError> {
    ChunkIterator::with_config(reader, config).collect()
}

/// Streams every metric of every chunk in `reader` to `writer` as `format`.
///
/// Records for chunks decoded before a failure are flushed to `writer` before the
/// error is returned. Nothing already written is rolled back.
pub fn dump<R: Read, W: Write>(
    reader: R,
    writer: W,
    format: OutputFormat,
    config: Arc<FtdcConfig>,
) -> Result<DumpSummary, FtdcError> {
    let mut chunks = ChunkIterator::with_config(reader, config);
    let mut out = MetricWriter::new(writer, format);
    let mut summary = DumpSummary::default();

    while chunks.advance() {
        if let Some(chunk) = chunks.current() {
            out.write_chunk(chunk)?;
            summary.chunks += 1;
        }
    }
    out.flush()?;

    summary.records = out.records_written();
    summary.stats = chunks.stats();
    log_metric!(
        "event" = "dump_finished",
        "format" = format,
        "chunks" = summary.chunks,
        "records" = summary.records
    );

    match chunks.take_error() {
        Some(e) => Err(e),
        None => Ok(summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk_pipeline::test_support::server_status_stream;

    #[test]
    fn test_decode_all_collects_every_chunk() {
        let bytes = server_status_stream();
        let chunks = decode_all(bytes.as_slice(), Arc::new(FtdcConfig::default())).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 2);
    }

    #[test]
    fn test_dump_reports_summary() {
        let bytes = server_status_stream();
        let mut out = Vec::new();
        let summary = dump(
            bytes.as_slice(),
            &mut out,
            OutputFormat::Json,
            Arc::new(FtdcConfig::default()),
        )
        .unwrap();
        assert_eq!(summary.chunks, 1);
        assert_eq!(summary.records, 2);
        assert_eq!(summary.stats.metadata_documents, 1);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_dump_keeps_output_written_before_a_failure() {
        let mut bytes = server_status_stream();
        bytes.extend_from_slice(&[0x40, 0, 0, 0, 1, 2]);
        let mut out = Vec::new();
        let err = dump(
            bytes.as_slice(),
            &mut out,
            OutputFormat::Json,
            Arc::new(FtdcConfig::default()),
        )
        .unwrap_err();
        assert!(matches!(err, FtdcError::TruncatedStream(_)));
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("{\"key\":\"serverStatus.uptime\",\"values\":[100,101,102]}\n"));
        assert_eq!(text.lines().count(), 2);
    }
}
