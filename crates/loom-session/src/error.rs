//! Error types for loom sessions

use loom_core::LoomError;

/// Session error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Tree operation failed
    #[error("tree error: {0}")]
    Loom(#[from] LoomError),

    /// Every generation request failed
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Persistence failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Failure reported by a generation back-end
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("backend returned no text")]
    Empty,

    /// Branch task was cancelled or panicked before completing
    #[error("generation aborted: {0}")]
    Aborted(String),
}

/// Record store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Background task ended abnormally
    #[error("task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_core::NodeId;

    #[test]
    fn errors_convert_into_session_error() {
        let err: SessionError = LoomError::NodeNotFound(NodeId::new(4)).into();
        assert_eq!(err.to_string(), "tree error: node not found: 4");

        let err: SessionError = GenerationError::Timeout(500).into();
        assert!(err.to_string().contains("500 ms"));

        let err: SessionError = GenerationError::Aborted("task cancelled".into()).into();
        assert_eq!(
            err.to_string(),
            "generation failed: generation aborted: task cancelled"
        );
    }
}
