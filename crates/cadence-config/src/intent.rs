//! Scheduling intents.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use cadence_engine::JobOptions;

/// Whether an intent describes a recurring or a one-time entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentKind {
    /// Re-created on a fixed interval by the engine.
    Recurring,
    /// Enqueued once for a future calendar point.
    OneTimeAt,
}

/// The normalized, engine-agnostic description of one desired scheduling
/// action, produced from a single configuration leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleIntent {
    /// Recurring or one-time.
    pub kind: IntentKind,
    /// Target job name. Must resolve against the catalog at apply time,
    /// else the intent degrades to a targeted cancel.
    pub job_name: String,
    /// Opaque interval/when string, routed to the engine unparsed.
    pub spec: String,
    /// Payload forwarded to the handler at fire time.
    pub data: Option<Value>,
    /// Per-entry option overrides (e.g. timezone).
    pub options: Option<JobOptions>,
    /// `false` marks the intent for cancellation instead of creation.
    pub enabled: bool,
}

impl ScheduleIntent {
    /// A minimal enabled intent with no data or options.
    pub fn new(kind: IntentKind, spec: impl Into<String>, job_name: impl Into<String>) -> Self {
        Self {
            kind,
            job_name: job_name.into(),
            spec: spec.into(),
            data: None,
            options: None,
            enabled: true,
        }
    }
}
