//! Job specification.

use std::sync::Arc;

use cadence_engine::{JobHandler, JobOptions};

/// A discovered job: name, handler, and the default options the handler is
/// defined with on the engine.
///
/// Immutable after catalog load; the handler is shared by `Arc`, never
/// copied.
#[derive(Clone)]
pub struct JobSpec {
    /// Unique, non-empty job name.
    pub name: String,
    /// The job implementation.
    pub handler: Arc<dyn JobHandler>,
    /// Options the handler is defined with (manifest extras).
    pub default_options: JobOptions,
}

impl std::fmt::Debug for JobSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSpec")
            .field("name", &self.name)
            .field("default_options", &self.default_options)
            .finish_non_exhaustive()
    }
}
