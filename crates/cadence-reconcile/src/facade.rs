//! Scheduler facade.

use std::sync::Arc;

use tokio::sync::broadcast;

use cadence_engine::{CancelFilter, EngineError, EngineEvent, JobEngine, PersistedEntry};

/// The handle exposed to the host process once reconciliation reaches
/// `Started`: ad-hoc enqueueing and introspection against the live engine.
///
/// Thin wrapper over the engine connection; no independent state. Clones
/// share the same engine and stay valid for the process lifetime.
#[derive(Clone)]
pub struct SchedulerFacade {
    engine: Arc<dyn JobEngine>,
}

impl SchedulerFacade {
    /// Wrap a started engine.
    pub fn new(engine: Arc<dyn JobEngine>) -> Self {
        Self { engine }
    }

    /// Enqueue an immediate one-shot invocation of `name`.
    pub async fn now(
        &self,
        name: &str,
        data: Option<serde_json::Value>,
    ) -> Result<(), EngineError> {
        self.engine.now(name, data).await
    }

    /// Cancel persisted entries matching `filter`.
    pub async fn cancel(&self, filter: &CancelFilter) -> Result<u64, EngineError> {
        self.engine.cancel(filter).await
    }

    /// Snapshot of persisted entries.
    pub async fn entries(&self) -> Result<Vec<PersistedEntry>, EngineError> {
        self.engine.entries().await
    }

    /// Subscribe to engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.engine.subscribe()
    }

    /// Stop the engine's processing loop.
    pub async fn stop(&self) -> Result<(), EngineError> {
        self.engine.stop().await
    }

    /// The underlying engine handle.
    pub fn engine(&self) -> &Arc<dyn JobEngine> {
        &self.engine
    }
}
