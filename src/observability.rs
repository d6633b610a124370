//! This module provides observability hooks for the decode pipeline.
//!
//! The `log_metric!` macro emits one structured key/value line per call through
//! the `log` facade at debug level, so it costs nothing unless a logger is
//! installed with debug enabled (the CLI does this for `--verbose`).

/// Logs a structured key-value metric line at debug level.
///
/// # Example
/// ```
/// use ftdc_reader::log_metric;
/// let samples = 300;
/// log_metric!("event"="chunk_decoded", "samples"=&samples);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        if $crate::__log::log_enabled!($crate::__log::Level::Debug) {
            // Collect each pair as a JSON string fragment
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+

            $crate::__log::debug!("FTDC_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}
