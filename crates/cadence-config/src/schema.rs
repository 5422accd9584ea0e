//! Scheduler configuration schema.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use cadence_engine::EngineSettings;

use crate::error::ConfigError;

/// Declarative scheduler configuration.
///
/// `every` and `schedule` map interval / calendar-expression keys to
/// polymorphic leaf values (bare job name, list, job map with data, or
/// singular record); see the parser module for the accepted shapes. Map
/// order is insertion order and determines apply order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerOptions {
    /// Storage connection string for the job engine. Required.
    #[serde(default)]
    pub connection_uri: String,

    /// Storage collection for persisted entries.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Directory scanned for job manifests. Required (a missing directory
    /// yields zero jobs; an empty setting is a configuration bug).
    #[serde(default)]
    pub jobs_source: String,

    /// Worker loop poll resolution.
    #[serde(default = "default_process_every")]
    pub process_every: String,

    /// Global cap on concurrently running jobs.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: u32,

    /// Per-job concurrency default.
    #[serde(default = "default_default_concurrency")]
    pub default_concurrency: u32,

    /// Global lock cap (0 = unlimited).
    #[serde(default)]
    pub lock_limit: u32,

    /// Per-job lock cap default (0 = unlimited).
    #[serde(default)]
    pub default_lock_limit: u32,

    /// Default lock lifetime in milliseconds.
    #[serde(default = "default_lock_lifetime_ms")]
    pub default_lock_lifetime_ms: u64,

    /// Recurring job declarations: interval key → leaf value.
    #[serde(default)]
    pub every: Map<String, Value>,

    /// One-time job declarations: calendar-expression key → leaf value.
    #[serde(default)]
    pub schedule: Map<String, Value>,
}

fn default_collection() -> String {
    "cadenceJobs".to_string()
}

fn default_process_every() -> String {
    "30 seconds".to_string()
}

fn default_max_concurrency() -> u32 {
    20
}

fn default_default_concurrency() -> u32 {
    5
}

fn default_lock_lifetime_ms() -> u64 {
    10_000
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            connection_uri: String::new(),
            collection: default_collection(),
            jobs_source: String::new(),
            process_every: default_process_every(),
            max_concurrency: default_max_concurrency(),
            default_concurrency: default_default_concurrency(),
            lock_limit: 0,
            default_lock_limit: 0,
            default_lock_lifetime_ms: default_lock_lifetime_ms(),
            every: Map::new(),
            schedule: Map::new(),
        }
    }
}

impl SchedulerOptions {
    /// Fail-fast validation, run before any engine interaction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection_uri.trim().is_empty() {
            return Err(ConfigError::MissingField("connection_uri".into()));
        }
        if self.jobs_source.trim().is_empty() {
            return Err(ConfigError::MissingField("jobs_source".into()));
        }
        if self.process_every.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "process_every".into(),
                message: "must not be empty".into(),
            });
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_concurrency".into(),
                message: "must be greater than 0".into(),
            });
        }
        Ok(())
    }

    /// Engine-wide settings derived from this configuration.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            connection_uri: self.connection_uri.clone(),
            collection: self.collection.clone(),
            process_every: self.process_every.clone(),
            max_concurrency: self.max_concurrency,
            default_concurrency: self.default_concurrency,
            lock_limit: self.lock_limit,
            default_lock_limit: self.default_lock_limit,
            default_lock_lifetime_ms: self.default_lock_lifetime_ms,
        }
    }
}
