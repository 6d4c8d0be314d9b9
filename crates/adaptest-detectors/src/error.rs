//! Detector error types.
//!
//! These errors represent failures when acquiring or invoking a
//! face-detection backend. The monitor only distinguishes fatal
//! acquisition failures from transient per-frame ones, so the
//! classification lives here rather than in string matching.

use thiserror::Error;

/// Errors that can occur when interacting with a detection backend.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// The detection model could not be acquired at all.
    #[error("detection model unavailable: {0}")]
    ModelUnavailable(String),

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The frame could not be interpreted by the backend.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Inference ran but failed.
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    /// The backend returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl DetectorError {
    /// Returns `true` if this error means the session cannot be proctored
    /// at all, as opposed to costing a single frame.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DetectorError::ModelUnavailable(_) | DetectorError::AuthenticationFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        assert!(DetectorError::ModelUnavailable("down".into()).is_fatal());
        assert!(DetectorError::AuthenticationFailed("bad key".into()).is_fatal());
        assert!(!DetectorError::InferenceFailed("oom".into()).is_fatal());
        assert!(!DetectorError::Timeout(10).is_fatal());
        assert!(!DetectorError::NetworkError("reset".into()).is_fatal());
    }
}
