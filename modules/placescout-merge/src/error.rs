use thiserror::Error;

/// Configuration is the only fatal error class in the merge core.
/// Per-record anomalies degrade to singleton clusters instead.
#[derive(Debug, Error, PartialEq)]
pub enum MergeError {
    #[error("match threshold {0} is outside 0.0..=1.0")]
    InvalidThreshold(f64),

    #[error("source priority list is empty")]
    EmptyPriority,
}
