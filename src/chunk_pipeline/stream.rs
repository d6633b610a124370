//! Splits a byte source into length-prefixed documents.
//!
//! Each record starts with a little-endian `i32` length that covers the whole
//! record, prefix included. The stream is forward-only: once it reports an error
//! or reaches the end it yields nothing more.

use std::io::{ErrorKind, Read};

use crate::bridge::format::{DEFAULT_MAX_DOCUMENT_SIZE, DOCUMENT_LENGTH_PREFIX_SIZE, MIN_DOCUMENT_SIZE};
use crate::error::FtdcError;

/// The undecoded bytes of one framed document, length prefix included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    offset: u64,
    bytes: Vec<u8>,
}

impl RawDocument {
    /// Byte offset of the document's length prefix within the source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A lazy, forward-only sequence of `RawDocument`s read from `R`.
pub struct DocumentStream<R: Read> {
    source: R,
    offset: u64,
    max_document_size: usize,
    finished: bool,
}

impl<R: Read> DocumentStream<R> {
    pub fn new(source: R) -> Self {
        Self::with_limit(source, DEFAULT_MAX_DOCUMENT_SIZE)
    }

    /// Creates a stream that rejects any document declaring more than `max_document_size` bytes.
    pub fn with_limit(source: R, max_document_size: usize) -> Self {
        Self {
            source,
            offset: 0,
            max_document_size,
            finished: false,
        }
    }

    /// Number of bytes consumed from the source so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads the next document.
    ///
    /// Returns `Ok(None)` when the source ends exactly on a record boundary, and
    /// on every call after the stream has finished or failed.
    pub fn next_document(&mut self) -> Result<Option<RawDocument>, FtdcError> {
        if self.finished {
            return Ok(None);
        }
        let result = self.read_document();
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result
    }

    fn read_document(&mut self) -> Result<Option<RawDocument>, FtdcError> {
        let mut prefix = [0u8; DOCUMENT_LENGTH_PREFIX_SIZE];
        let got = read_fully(&mut self.source, &mut prefix)?;
        if got == 0 {
            return Ok(None);
        }
        if got < DOCUMENT_LENGTH_PREFIX_SIZE {
            return Err(FtdcError::TruncatedStream(format!(
                "source ended after {} of {} length bytes at offset {}",
                got, DOCUMENT_LENGTH_PREFIX_SIZE, self.offset
            )));
        }

        let declared = i32::from_le_bytes(prefix);
        if declared < MIN_DOCUMENT_SIZE as i32 || declared as usize > self.max_document_size {
            return Err(FtdcError::MalformedChunk(format!(
                "document at offset {} declares length {} (allowed {}..={})",
                self.offset, declared, MIN_DOCUMENT_SIZE, self.max_document_size
            )));
        }
        let declared = declared as usize;
        let body_len = declared - DOCUMENT_LENGTH_PREFIX_SIZE;

        let mut bytes = Vec::with_capacity(declared);
        bytes.extend_from_slice(&prefix);
        let read = (&mut self.source)
            .take(body_len as u64)
            .read_to_end(&mut bytes)?;
        if read < body_len {
            return Err(FtdcError::TruncatedStream(format!(
                "document at offset {} declares {} bytes but only {} remain",
                self.offset,
                declared,
                read + DOCUMENT_LENGTH_PREFIX_SIZE
            )));
        }

        let document = RawDocument {
            offset: self.offset,
            bytes,
        };
        self.offset += declared as u64;
        Ok(Some(document))
    }
}

impl<R: Read> Iterator for DocumentStream<R> {
    type Item = Result<RawDocument, FtdcError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_document().transpose()
    }
}

/// Fills as much of `buf` as the source allows, returning the number of bytes read.
fn read_fully<R: Read>(source: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
