use thiserror::Error;

/// Track processing error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    /// A `$GNSS` record that could not be decoded; aborts the load
    #[error("Error parsing line: '{line}', {reason}")]
    MalformedRecord { line: String, reason: String },

    #[error("Trim refused: {0}")]
    GuardRefused(String),

    #[error("Track has no freefall samples")]
    NoFreefall,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TrackError {
    pub(crate) fn malformed(line: &str, reason: impl Into<String>) -> Self {
        TrackError::MalformedRecord {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for track operations
pub type TrackResult<T> = Result<T, TrackError>;
