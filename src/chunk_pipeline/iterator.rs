// In: src/chunk_pipeline/iterator.rs

//! The pull-based front door of the decode pipeline.
//!
//! `ChunkIterator` owns the document cursor and walks it one `advance()` at a
//! time. Metadata documents are absorbed internally; every data document either
//! becomes the new `current()` chunk or moves the iterator into its terminal
//! `Failed` state. There is no resynchronization after a corrupt document.

use std::io::Read;
use std::sync::Arc;

use crate::chunk_pipeline::classifier::MetadataDocument;
use crate::chunk_pipeline::models::Chunk;
use crate::chunk_pipeline::orchestrator::{decode_document, DecodedDocument};
use crate::chunk_pipeline::stream::DocumentStream;
use crate::config::FtdcConfig;
use crate::error::FtdcError;

//==================================================================================
// I. State & Counters
//==================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorState {
    /// Nothing has been read yet.
    Start,
    /// `current()` holds a freshly decoded chunk.
    Ready,
    /// The source ended cleanly. Terminal.
    Exhausted,
    /// A decode error occurred. Terminal.
    Failed,
}

impl IteratorState {
    pub fn is_terminal(self) -> bool {
        matches!(self, IteratorState::Exhausted | IteratorState::Failed)
    }
}

/// Running totals over everything the iterator has consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub documents: u64,
    pub metadata_documents: u64,
    pub chunks: u64,
    pub samples: u64,
    pub bytes: u64,
}

//==================================================================================
// II. The Iterator
//==================================================================================

pub struct ChunkIterator<R: Read> {
    documents: DocumentStream<R>,
    config: Arc<FtdcConfig>,
    state: IteratorState,
    current: Option<Chunk>,
    error: Option<FtdcError>,
    metadata: Option<MetadataDocument>,
    stats: DecodeStats,
}

impl<R: Read> ChunkIterator<R> {
    /// Creates an iterator over `source` with the default configuration.
    pub fn new(source: R) -> Self {
        Self::with_config(source, Arc::new(FtdcConfig::default()))
    }

    pub fn with_config(source: R, config: Arc<FtdcConfig>) -> Self {
        Self {
            documents: DocumentStream::with_limit(source, config.max_document_size),
            config,
            state: IteratorState::Start,
            current: None,
            error: None,
            metadata: None,
            stats: DecodeStats::default(),
        }
    }

    /// Moves to the next metric chunk.
    ///
    /// Returns `true` if a chunk is ready in `current()`. Returns `false` both at a
    /// clean end of stream and on failure; `error()` tells the two apart. Once the
    /// iterator is terminal every call returns `false` without touching the source.
    pub fn advance(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.current = None;

        loop {
            let raw = match self.documents.next_document() {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    self.state = IteratorState::Exhausted;
                    log_metric!(
                        "event" = "stream_exhausted",
                        "documents" = self.stats.documents,
                        "chunks" = self.stats.chunks
                    );
                    return false;
                }
                Err(e) => return self.fail(e),
            };
            self.stats.documents += 1;
            self.stats.bytes += raw.len() as u64;

            match decode_document(&raw, &self.config) {
                Ok(DecodedDocument::Metadata(meta)) => {
                    log::debug!(
                        "metadata document ({:?}) at offset {}",
                        meta.kind,
                        raw.offset()
                    );
                    self.stats.metadata_documents += 1;
                    self.metadata = Some(meta);
                }
                Ok(DecodedDocument::Chunk(chunk)) => {
                    self.stats.chunks += 1;
                    self.stats.samples += chunk.sample_count as u64;
                    log_metric!(
                        "event" = "chunk_decoded",
                        "offset" = raw.offset(),
                        "metrics" = chunk.len(),
                        "samples" = chunk.sample_count
                    );
                    self.current = Some(chunk);
                    self.state = IteratorState::Ready;
                    return true;
                }
                Err(e) => return self.fail(e),
            }
        }
    }

    fn fail(&mut self, error: FtdcError) -> bool {
        log::warn!(
            "decode stopped after {} documents at offset {}: {}",
            self.stats.documents,
            self.documents.offset(),
            error
        );
        self.error = Some(error);
        self.current = None;
        self.state = IteratorState::Failed;
        false
    }

    /// The chunk produced by the last successful `advance()`, valid only in `Ready`.
    pub fn current(&self) -> Option<&Chunk> {
        match self.state {
            IteratorState::Ready => self.current.as_ref(),
            _ => None,
        }
    }

    /// Moves the current chunk out to the caller.
    pub fn take_current(&mut self) -> Option<Chunk> {
        match self.state {
            IteratorState::Ready => self.current.take(),
            _ => None,
        }
    }

    /// The terminal error, or `None` while healthy or after a clean end.
    pub fn error(&self) -> Option<&FtdcError> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<FtdcError> {
        self.error.take()
    }

    pub fn state(&self) -> IteratorState {
        self.state
    }

    /// The most recent metadata document seen, if any.
    pub fn metadata(&self) -> Option<&MetadataDocument> {
        self.metadata.as_ref()
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    pub fn config(&self) -> &FtdcConfig {
        &self.config
    }
}

impl<R: Read> Iterator for ChunkIterator<R> {
    type Item = Result<Chunk, FtdcError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.advance() {
            return self.take_current().map(Ok);
        }
        // A failure is reported exactly once.
        self.take_error().map(Err)
    }
}

//==================================================================================
// III. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::format::DocumentKind;
    use crate::chunk_pipeline::test_support::*;
    use crate::config::CodecPolicy;
    use bson::doc;

    fn expected_server_status() -> Chunk {
        use crate::chunk_pipeline::models::Metric;
        Chunk {
            captured_at_ms: 2_000,
            sample_count: 3,
            metrics: vec![
                Metric {
                    key: "serverStatus.uptime".to_string(),
                    values: vec![100, 101, 102],
                },
                Metric {
                    key: "serverStatus.connections.current".to_string(),
                    values: vec![5, 5, 7],
                },
            ],
        }
    }

    #[test]
    fn test_metadata_then_chunk_yields_one_chunk() {
        let bytes = server_status_stream();
        let mut iter = ChunkIterator::new(bytes.as_slice());
        assert_eq!(iter.state(), IteratorState::Start);
        assert!(iter.current().is_none());

        assert!(iter.advance());
        assert_eq!(iter.state(), IteratorState::Ready);
        assert_eq!(iter.current(), Some(&expected_server_status()));
        assert_eq!(iter.metadata().map(|m| m.kind), Some(DocumentKind::Metadata));

        assert!(!iter.advance());
        assert_eq!(iter.state(), IteratorState::Exhausted);
        assert!(iter.current().is_none());
        assert!(iter.error().is_none());

        let stats = iter.stats();
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.metadata_documents, 1);
        assert_eq!(stats.chunks, 1);
        assert_eq!(stats.samples, 3);
        assert_eq!(stats.bytes, bytes.len() as u64);
    }

    #[test]
    fn test_empty_input_is_clean_end() {
        let mut iter = ChunkIterator::new(&[][..]);
        assert!(!iter.advance());
        assert_eq!(iter.state(), IteratorState::Exhausted);
        assert!(iter.error().is_none());
        assert_eq!(ChunkIterator::new(&[][..]).count(), 0);
    }

    #[test]
    fn test_metadata_only_input_yields_nothing() {
        let bytes = to_bytes(&[
            metadata_document(1, doc! { "a": 1 }),
            metadata_document(2, doc! { "a": 2 }),
        ]);
        let mut iter = ChunkIterator::new(bytes.as_slice());
        assert!(!iter.advance());
        assert!(iter.error().is_none());
        assert_eq!(iter.metadata().map(|m| m.captured_at.timestamp_millis()), Some(2));
    }

    #[test]
    fn test_truncated_tail_fails_without_partial_chunk() {
        let mut bytes = server_status_stream();
        let last_len = bytes.len();
        let good = to_bytes(&[data_document(
            3_000,
            doc! { "x": 1 },
            compressed_payload(&[vec![1, 2]], &CodecPolicy::default()),
        )]);
        bytes.extend_from_slice(&good[..good.len() - 5]);

        let mut iter = ChunkIterator::new(bytes.as_slice());
        assert!(iter.advance());
        assert!(!iter.advance());
        assert_eq!(iter.state(), IteratorState::Failed);
        assert!(iter.current().is_none());
        assert!(iter.take_current().is_none());
        assert!(matches!(iter.error(), Some(FtdcError::TruncatedStream(_))));
        assert_eq!(iter.stats().bytes, last_len as u64);
    }

    #[test]
    fn test_failure_is_sticky() {
        let mut bytes = to_bytes(&[data_document(
            0,
            doc! { "a": 1, "b": 2 },
            compressed_payload(&[vec![1, 2]], &CodecPolicy::default()),
        )]);
        // A healthy chunk after the bad one is never reached.
        bytes.extend(server_status_stream());

        let mut iter = ChunkIterator::new(bytes.as_slice());
        assert!(!iter.advance());
        assert!(matches!(iter.error(), Some(FtdcError::SchemaError(_))));
        for _ in 0..3 {
            assert!(!iter.advance());
            assert_eq!(iter.state(), IteratorState::Failed);
        }
        assert_eq!(iter.stats().documents, 1);
    }

    #[test]
    fn test_iterator_adapter_yields_error_once() {
        let mut bytes = server_status_stream();
        bytes.extend_from_slice(&[0xFF, 0xFF]);

        let mut iter = ChunkIterator::new(bytes.as_slice());
        assert_eq!(iter.next().map(|r| r.is_ok()), Some(true));
        assert!(matches!(iter.next(), Some(Err(FtdcError::TruncatedStream(_)))));
        assert!(iter.next().is_none());
        assert_eq!(iter.state(), IteratorState::Failed);
        assert!(iter.error().is_none());
    }

    #[test]
    fn test_chunks_are_decoded_independently() {
        let first = compressed_payload(&[vec![1, 2, 3]], &CodecPolicy::default());
        let second = compressed_payload(&[vec![9], vec![8]], &CodecPolicy::default());
        let bytes = to_bytes(&[
            data_document(10, doc! { "a": 0 }, first),
            data_document(20, doc! { "b": 0, "c": { "d": 0 } }, second),
        ]);
        let chunks: Vec<Chunk> = ChunkIterator::new(bytes.as_slice())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].keys().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(chunks[1].keys().collect::<Vec<_>>(), vec!["b", "c.d"]);
        assert_eq!(chunks[1].sample_count, 1);
        assert_eq!(chunks[1].metric("c.d").map(|m| m.values.clone()), Some(vec![8]));
    }

    #[test]
    fn test_document_size_limit_comes_from_config() {
        let bytes = server_status_stream();
        let config = FtdcConfig {
            max_document_size: 16,
            ..FtdcConfig::default()
        };
        let mut iter = ChunkIterator::with_config(bytes.as_slice(), Arc::new(config));
        assert!(!iter.advance());
        assert!(matches!(iter.error(), Some(FtdcError::MalformedChunk(_))));
    }
}
