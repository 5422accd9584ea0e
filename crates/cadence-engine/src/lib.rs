//! # Cadence Engine
//!
//! The job-execution engine contract consumed by the reconciliation core,
//! plus an in-memory reference backend.
//!
//! ## Features
//!
//! - `JobEngine` trait: define handlers, cancel by filter, create
//!   recurring/one-time entries, start/stop the worker loop
//! - Lifecycle and job events over a broadcast channel
//! - Interval / calendar-phrase / cron spec parsing for the reference
//!   backend
//! - `MemoryEngine` for tests and embedded use

pub mod engine;
pub mod error;
pub mod event;
pub mod memory;
pub mod timespec;

pub use engine::{
    CancelFilter, EngineSettings, EntryKind, JobContext, JobEngine, JobHandler, JobOptions,
    PersistedEntry,
};
pub use error::EngineError;
pub use event::EngineEvent;
pub use memory::MemoryEngine;
pub use timespec::TimeSpec;
