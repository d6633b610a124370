// In: src/bridge/writer.rs

//! Serializes decoded metrics onto a byte sink in the selected `OutputFormat`.
//!
//! - `JSON`: one compact `{"key":..,"values":[..]}` object per line.
//! - `BSON`: one BSON document per metric, concatenated with no separator.

use std::io::Write;

use crate::bridge::format::MetricRecord;
use crate::chunk_pipeline::models::{Chunk, Metric};
use crate::config::OutputFormat;
use crate::error::FtdcError;

pub struct MetricWriter<W: Write> {
    sink: W,
    format: OutputFormat,
    records_written: u64,
}

impl<W: Write> MetricWriter<W> {
    pub fn new(sink: W, format: OutputFormat) -> Self {
        Self {
            sink,
            format,
            records_written: 0,
        }
    }

    /// Writes a single metric record.
    pub fn write_metric(&mut self, metric: &Metric) -> Result<(), FtdcError> {
        let record = MetricRecord {
            key: &metric.key,
            values: &metric.values,
        };
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.sink, &record)?;
                self.sink.write_all(b"\n")?;
            }
            OutputFormat::Bson => {
                let bytes = bson::to_vec(&record)?;
                self.sink.write_all(&bytes)?;
            }
        }
        self.records_written += 1;
        Ok(())
    }

    /// Writes every metric of `chunk`, in order. Returns the number of records written.
    pub fn write_chunk(&mut self, chunk: &Chunk) -> Result<usize, FtdcError> {
        for metric in &chunk.metrics {
            self.write_metric(metric)?;
        }
        Ok(chunk.metrics.len())
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn flush(&mut self) -> Result<(), FtdcError> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
