use thiserror::Error;

/// Input rejected at the engine boundary. Never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("malformed {kind} identifier: {value:?}")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("watch percentage {0} is outside 0..=100")]
    PercentageOutOfRange(f64),

    #[error("watch percentage is not a finite number")]
    PercentageNotFinite,
}

#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Timeout or connectivity failure; the caller may retry the whole call.
    #[error("Transient store error: {0}")]
    Transient(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Enrollment has not been completed")]
    NotCompleted,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrackingError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrackingError::Transient(_))
    }
}

pub type Result<T> = std::result::Result<T, TrackingError>;
