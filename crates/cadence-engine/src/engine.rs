//! The job-execution engine contract.
//!
//! Everything above this crate treats the engine as a black box: handlers
//! are defined on it, persisted entries are created through `every` /
//! `schedule` and removed through `cancel`, and the worker loop is started
//! with `start`. Locking, storage, and concurrency control live behind the
//! trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::EngineError;
use crate::event::EngineEvent;

/// Per-definition options attached to a job handler or a persisted entry.
///
/// All fields are optional; absent fields fall back to the engine-wide
/// defaults in [`EngineSettings`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOptions {
    /// Maximum concurrent invocations of this job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<u32>,
    /// Maximum locks this job may hold at once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_limit: Option<u32>,
    /// Lock lifetime in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_lifetime_ms: Option<u64>,
    /// Relative priority among due jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    /// Timezone for calendar-based specs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl JobOptions {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay `other` on top of `self`: set fields in `other` win.
    pub fn merged_with(&self, other: &JobOptions) -> JobOptions {
        JobOptions {
            concurrency: other.concurrency.or(self.concurrency),
            lock_limit: other.lock_limit.or(self.lock_limit),
            lock_lifetime_ms: other.lock_lifetime_ms.or(self.lock_lifetime_ms),
            priority: other.priority.or(self.priority),
            timezone: other.timezone.clone().or_else(|| self.timezone.clone()),
        }
    }
}

/// Engine-wide settings derived from the scheduler configuration.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Storage connection string.
    pub connection_uri: String,
    /// Storage collection / table name for persisted entries.
    pub collection: String,
    /// Poll resolution of the worker loop, e.g. `"30 seconds"`.
    pub process_every: String,
    /// Global cap on concurrently running jobs.
    pub max_concurrency: u32,
    /// Per-job concurrency when the definition does not override it.
    pub default_concurrency: u32,
    /// Global lock cap (0 = unlimited).
    pub lock_limit: u32,
    /// Per-job lock cap when the definition does not override it.
    pub default_lock_limit: u32,
    /// Default lock lifetime in milliseconds.
    pub default_lock_lifetime_ms: u64,
}

/// Context handed to a job handler for one invocation.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Persisted entry id this invocation fired from.
    pub id: Uuid,
    /// Job name.
    pub name: String,
    /// Payload data attached at scheduling time.
    pub data: Option<serde_json::Value>,
    /// When the engine fired this invocation.
    pub fired_at: DateTime<Utc>,
}

/// A job implementation.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Execute one invocation.
    async fn run(&self, job: &JobContext) -> Result<(), EngineError>;
}

/// Filter for cancel calls. An empty filter matches every persisted row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CancelFilter {
    /// Restrict to entries with this job name.
    pub name: Option<String>,
}

impl CancelFilter {
    /// Match every persisted entry.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match entries for one job name.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Whether an entry name passes this filter.
    pub fn matches(&self, entry_name: &str) -> bool {
        match &self.name {
            Some(n) => n == entry_name,
            None => true,
        }
    }
}

/// Kind of a persisted schedule entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Re-enqueued automatically on a fixed interval or cron spec.
    Recurring,
    /// Enqueued once for a future point computed from a calendar expression.
    OneTime,
}

/// A stored scheduled/recurring job row, owned by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedEntry {
    /// Row id.
    pub id: Uuid,
    /// Job name; resolved against defined handlers at fire time.
    pub name: String,
    /// Recurring or one-time.
    pub kind: EntryKind,
    /// The opaque interval/when string the entry was created with.
    pub spec: String,
    /// Payload forwarded to the handler.
    pub data: Option<serde_json::Value>,
    /// Per-entry option overrides.
    pub options: Option<JobOptions>,
    /// Next fire time, if the spec could be resolved.
    pub next_run_at: Option<DateTime<Utc>>,
    /// Last fire time.
    pub last_run_at: Option<DateTime<Utc>>,
    /// Number of completed invocations.
    pub run_count: u64,
    /// Error message from the most recent failed invocation.
    pub last_error: Option<String>,
}

/// The persistent job-execution engine.
#[async_trait]
pub trait JobEngine: Send + Sync {
    /// Bind a handler (and its default options) to a job name.
    async fn define_handler(
        &self,
        name: &str,
        options: JobOptions,
        handler: Arc<dyn JobHandler>,
    ) -> Result<(), EngineError>;

    /// Resolve once storage is connected and prior locks are recovered.
    ///
    /// Callers must await this before cancel/create/start calls; backends
    /// may reject earlier calls with [`EngineError::NotReady`].
    async fn ready(&self) -> Result<(), EngineError>;

    /// Cancel persisted entries matching `filter`; returns removed count.
    async fn cancel(&self, filter: &CancelFilter) -> Result<u64, EngineError>;

    /// Create (or upsert, keyed by job name) a recurring entry.
    async fn every(
        &self,
        spec: &str,
        name: &str,
        data: Option<serde_json::Value>,
        options: Option<JobOptions>,
    ) -> Result<(), EngineError>;

    /// Create a one-time entry for the point named by `when`.
    async fn schedule(
        &self,
        when: &str,
        name: &str,
        data: Option<serde_json::Value>,
    ) -> Result<(), EngineError>;

    /// Enqueue an immediate one-shot invocation.
    async fn now(&self, name: &str, data: Option<serde_json::Value>) -> Result<(), EngineError>;

    /// Start the internal polling/worker loop.
    async fn start(&self) -> Result<(), EngineError>;

    /// Stop the internal polling/worker loop.
    async fn stop(&self) -> Result<(), EngineError>;

    /// Subscribe to lifecycle and job events.
    fn subscribe(&self) -> broadcast::Receiver<EngineEvent>;

    /// Snapshot of all persisted entries, in creation order.
    async fn entries(&self) -> Result<Vec<PersistedEntry>, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_filter_all_matches_everything() {
        let filter = CancelFilter::all();
        assert!(filter.matches("say-hello"));
        assert!(filter.matches(""));
    }

    #[test]
    fn test_cancel_filter_by_name() {
        let filter = CancelFilter::name("say-hello");
        assert!(filter.matches("say-hello"));
        assert!(!filter.matches("other"));
    }

    #[test]
    fn test_job_options_merge() {
        let defaults = JobOptions {
            concurrency: Some(5),
            lock_lifetime_ms: Some(10_000),
            ..Default::default()
        };
        let overrides = JobOptions {
            concurrency: Some(2),
            timezone: Some("UTC".into()),
            ..Default::default()
        };

        let merged = defaults.merged_with(&overrides);
        assert_eq!(merged.concurrency, Some(2));
        assert_eq!(merged.lock_lifetime_ms, Some(10_000));
        assert_eq!(merged.timezone.as_deref(), Some("UTC"));
    }

    #[test]
    fn test_job_options_is_empty() {
        assert!(JobOptions::default().is_empty());
        let opts = JobOptions {
            priority: Some(1),
            ..Default::default()
        };
        assert!(!opts.is_empty());
    }
}
