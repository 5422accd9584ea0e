//! Engine lifecycle and job events.

use uuid::Uuid;

/// Events emitted by a job engine over its broadcast channel.
///
/// Subscribers that lag are allowed to miss events; the channel is
/// fire-and-forget from the engine's point of view.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Storage connection established, prior locks recovered.
    Ready,
    /// A handler invocation is about to begin.
    JobStart { name: String, id: Uuid },
    /// A handler invocation finished (either way).
    JobComplete { name: String, id: Uuid },
    /// A handler invocation finished successfully.
    JobSuccess { name: String, id: Uuid },
    /// A handler invocation returned an error.
    JobFail {
        name: String,
        id: Uuid,
        error: String,
    },
    /// Persisted entries were removed by a cancel call.
    Removed { count: u64 },
}
