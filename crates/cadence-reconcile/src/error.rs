//! Reconciliation errors.

use thiserror::Error;

use cadence_engine::EngineError;

/// Which reconciliation phase an engine call failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePhase {
    /// Defining job handlers on the engine.
    Defining,
    /// Awaiting engine readiness.
    AwaitingReady,
    /// The full stale-state sweep.
    Sweeping,
    /// Applying intents.
    Applying,
    /// Starting the engine's processing loop.
    Starting,
}

impl std::fmt::Display for ReconcilePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReconcilePhase::Defining => "defining handlers",
            ReconcilePhase::AwaitingReady => "awaiting engine readiness",
            ReconcilePhase::Sweeping => "sweeping stale entries",
            ReconcilePhase::Applying => "applying intents",
            ReconcilePhase::Starting => "starting processing loop",
        };
        f.write_str(name)
    }
}

/// An engine call failed during startup reconciliation. Fatal: the
/// engine's processing loop is never started on a half-applied
/// configuration.
#[derive(Debug, Error)]
#[error("Reconciliation failed while {phase}: {source}")]
pub struct ReconcileError {
    /// The phase the failure occurred in.
    pub phase: ReconcilePhase,
    /// The underlying engine failure.
    #[source]
    pub source: EngineError,
}

impl ReconcileError {
    pub(crate) fn in_phase(phase: ReconcilePhase) -> impl FnOnce(EngineError) -> ReconcileError {
        move |source| ReconcileError { phase, source }
    }
}
