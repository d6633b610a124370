//! The decoded values the pipeline hands to its caller.

use serde::{Deserialize, Serialize};

/// One metric's full time series within a chunk.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Metric {
    /// Dotted path of the leaf in the reference document, e.g. `serverStatus.uptime`.
    pub key: String,
    /// One value per sample, oldest first.
    pub values: Vec<i64>,
}

/// A fully decoded metric chunk.
///
/// Every `Metric` holds exactly `sample_count` values. A chunk is built fresh for
/// each data document and shares nothing with the chunks before or after it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The `_id` of the source document, in milliseconds since the Unix epoch.
    pub captured_at_ms: i64,
    /// Number of samples in the chunk (`nDeltas + 1`).
    pub sample_count: usize,
    /// Metrics in reference-document order.
    pub metrics: Vec<Metric>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Looks a metric up by its dotted key.
    pub fn metric(&self, key: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|m| m.key.as_str())
    }
}
