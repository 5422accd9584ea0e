//! Startup reconciliation.
//!
//! Persisted schedule rows are declarative: they must reflect only the
//! current configuration, never accumulate stale rows from a previous
//! process version that removed or renamed a job. The reconciler therefore
//! sweeps every persisted row after the engine reports ready, then
//! re-applies the parsed intents in declared order, and only then starts
//! the engine's processing loop. The brief window with zero scheduled jobs
//! is the price of idempotence across restarts.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use cadence_catalog::JobCatalog;
use cadence_config::{IntentKind, ScheduleIntent};
use cadence_engine::{CancelFilter, EngineError, JobContext, JobEngine, JobHandler};

use crate::error::{ReconcileError, ReconcilePhase};

/// Reconciler lifecycle. `Failed` and `Started` are terminal; `Failed`
/// guarantees the engine's processing loop was never started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    Idle,
    Loading,
    AwaitingEngineReady,
    Sweeping,
    Applying,
    Started,
    Failed,
}

/// Handler wrapper that adds invocation logging around the underlying job.
///
/// Forwards the inner result unchanged; failures are the engine's to
/// report, not this wrapper's to swallow.
struct LoggedHandler {
    name: String,
    inner: Arc<dyn JobHandler>,
}

#[async_trait]
impl JobHandler for LoggedHandler {
    async fn run(&self, job: &JobContext) -> Result<(), EngineError> {
        info!(job = %self.name, id = %job.id, "job dequeued");
        self.inner.run(job).await
    }
}

/// Owns the startup sequencing; the only component that talks to the
/// engine during reconciliation.
pub struct Reconciler {
    state: ReconcilerState,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            state: ReconcilerState::Idle,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ReconcilerState {
        self.state
    }

    /// Run the full startup sequence: define handlers, await readiness,
    /// sweep, apply intents in order, start the processing loop.
    ///
    /// Sequential by design; the sweep-before-create ordering is
    /// load-bearing, so no engine calls run in parallel here.
    pub async fn run(
        &mut self,
        engine: &Arc<dyn JobEngine>,
        catalog: &JobCatalog,
        intents: &[ScheduleIntent],
    ) -> Result<(), ReconcileError> {
        match self.try_run(engine, catalog, intents).await {
            Ok(()) => {
                self.state = ReconcilerState::Started;
                info!(intents = intents.len(), jobs = catalog.len(), "reconciliation complete");
                Ok(())
            }
            Err(e) => {
                self.state = ReconcilerState::Failed;
                Err(e)
            }
        }
    }

    async fn try_run(
        &mut self,
        engine: &Arc<dyn JobEngine>,
        catalog: &JobCatalog,
        intents: &[ScheduleIntent],
    ) -> Result<(), ReconcileError> {
        self.state = ReconcilerState::Loading;
        for spec in catalog.iter() {
            let wrapped = Arc::new(LoggedHandler {
                name: spec.name.clone(),
                inner: spec.handler.clone(),
            });
            engine
                .define_handler(&spec.name, spec.default_options.clone(), wrapped)
                .await
                .map_err(ReconcileError::in_phase(ReconcilePhase::Defining))?;
        }

        self.state = ReconcilerState::AwaitingEngineReady;
        engine
            .ready()
            .await
            .map_err(ReconcileError::in_phase(ReconcilePhase::AwaitingReady))?;

        self.state = ReconcilerState::Sweeping;
        let removed = engine
            .cancel(&CancelFilter::all())
            .await
            .map_err(ReconcileError::in_phase(ReconcilePhase::Sweeping))?;
        if removed > 0 {
            info!(removed, "swept stale persisted entries");
        }

        self.state = ReconcilerState::Applying;
        for intent in intents {
            apply_intent(engine, catalog, intent)
                .await
                .map_err(ReconcileError::in_phase(ReconcilePhase::Applying))?;
        }

        engine
            .start()
            .await
            .map_err(ReconcileError::in_phase(ReconcilePhase::Starting))?;
        Ok(())
    }
}

async fn apply_intent(
    engine: &Arc<dyn JobEngine>,
    catalog: &JobCatalog,
    intent: &ScheduleIntent,
) -> Result<(), EngineError> {
    if !catalog.contains(&intent.job_name) {
        // No handler to bind: a targeted cancel, never a create.
        debug!(job = %intent.job_name, "intent references unknown job, cancelling only");
        engine.cancel(&CancelFilter::name(&intent.job_name)).await?;
        return Ok(());
    }

    if !intent.enabled {
        // Redundant after the full sweep, but required when a sweep is
        // per-name scoped in partial-reconciliation setups.
        engine.cancel(&CancelFilter::name(&intent.job_name)).await?;
        return Ok(());
    }

    match intent.kind {
        IntentKind::Recurring => {
            engine
                .every(
                    &intent.spec,
                    &intent.job_name,
                    intent.data.clone(),
                    intent.options.clone(),
                )
                .await
        }
        IntentKind::OneTimeAt => {
            engine
                .schedule(&intent.spec, &intent.job_name, intent.data.clone())
                .await
        }
    }
}
