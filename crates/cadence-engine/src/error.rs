//! Engine errors.

use thiserror::Error;

/// Engine error types.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Storage backend is unreachable or the connection URI is invalid.
    #[error("Engine connection failed: {0}")]
    Connection(String),

    /// A call was made before the engine signalled readiness.
    #[error("Engine is not ready")]
    NotReady,

    /// Persisted-store read or write failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// No handler has been defined for the named job.
    #[error("No handler defined for job: {0}")]
    UnknownJob(String),

    /// A job handler returned a failure.
    #[error("Handler failed: {0}")]
    HandlerFailed(String),
}
