//! # Cadence Reconcile
//!
//! Startup reconciliation: registers all discovered job handlers on the
//! engine, sweeps stale persisted entries, applies parsed scheduling
//! intents in declared order, and starts the engine's processing loop.
//! Exposes the resulting engine handle through [`SchedulerFacade`].

pub mod error;
pub mod facade;
pub mod reconciler;

pub use error::{ReconcileError, ReconcilePhase};
pub use facade::SchedulerFacade;
pub use reconciler::{Reconciler, ReconcilerState};
