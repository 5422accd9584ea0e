//! # Cadence
//!
//! Configuration-driven scheduling front end over a persistent
//! job-execution engine. A declarative description of scheduled work —
//! "run job X every N seconds", "run job Y at a calendar expression",
//! with optional payload data, per-job options, and enable/disable
//! toggles — becomes a concrete set of idempotent registrations against
//! the engine, reconciled at startup against whatever a previous run
//! persisted.
//!
//! ## Startup pipeline
//!
//! 1. validate the [`SchedulerOptions`] (fail fast, before any engine
//!    interaction)
//! 2. construct the engine from the derived [`EngineSettings`]
//! 3. bridge engine events into structured logs
//! 4. load the [`JobCatalog`] from the jobs source (a missing directory
//!    means zero jobs)
//! 5. parse the `every` / `schedule` sections into ordered intents and
//!    reconcile: define handlers, await readiness, sweep every persisted
//!    row, apply intents in declared order, start the processing loop
//!
//! The returned [`SchedulerFacade`] is the live engine handle for ad-hoc
//! enqueueing and introspection.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

pub use cadence_catalog::{
    CatalogError, FsJobSource, HandlerRegistry, JobCatalog, JobSource, JobSpec, MemoryJobSource,
};
pub use cadence_config::{
    ConfigError, ConfigLoader, IntentKind, ScheduleIntent, SchedulerOptions, parse,
};
pub use cadence_engine::{
    CancelFilter, EngineError, EngineEvent, EngineSettings, EntryKind, JobContext, JobEngine,
    JobHandler, JobOptions, MemoryEngine, PersistedEntry,
};
pub use cadence_reconcile::{
    ReconcileError, ReconcilePhase, Reconciler, ReconcilerState, SchedulerFacade,
};

pub mod events;

/// Startup failure. Every variant is fatal: the host process should
/// crash/restart rather than run with partially applied schedules.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Register the scheduler: validate, connect, load, parse, reconcile.
///
/// `connect` builds the engine from the settings derived from `options`;
/// it is only invoked after validation passes. The facade is returned
/// once the engine's processing loop is running.
pub async fn register<F>(
    options: SchedulerOptions,
    registry: HandlerRegistry,
    connect: F,
) -> Result<SchedulerFacade, RegisterError>
where
    F: FnOnce(&EngineSettings) -> Result<Arc<dyn JobEngine>, EngineError>,
{
    options.validate()?;

    let settings = options.engine_settings();
    let engine = connect(&settings)?;
    events::spawn_event_bridge(engine.subscribe());

    let jobs_root = ConfigLoader::expand_path(&options.jobs_source);
    let source = FsJobSource::new(jobs_root);
    let catalog = JobCatalog::load(&source, &registry).await?;

    let intents = parse(&options.every, &options.schedule);
    info!(
        jobs = catalog.len(),
        intents = intents.len(),
        "registering scheduler"
    );

    let mut reconciler = Reconciler::new();
    reconciler.run(&engine, &catalog, &intents).await?;

    Ok(SchedulerFacade::new(engine))
}

/// [`register`] wired to the bundled in-memory engine.
pub async fn register_with_memory_engine(
    options: SchedulerOptions,
    registry: HandlerRegistry,
) -> Result<SchedulerFacade, RegisterError> {
    register(options, registry, |settings| {
        let engine = MemoryEngine::new(settings.clone())?;
        Ok(Arc::new(engine) as Arc<dyn JobEngine>)
    })
    .await
}
