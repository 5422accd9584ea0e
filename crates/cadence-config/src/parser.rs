//! Schedule configuration parser.
//!
//! The `every` / `schedule` sections support four levels of terseness per
//! leaf, so the common case stays terse while the complex case keeps full
//! control:
//!
//! 1. a bare job name: `"10 seconds" = "say-hello"`
//! 2. a list of any of the other shapes, sharing the outer key
//! 3. a map of job names to `{data?, options?, enabled?}` sub-maps
//! 4. a singular record `{job|interval, data?, options?, enabled?}`
//!
//! Shapes are disambiguated structurally by a closed classifier in a fixed
//! precedence order, never by reflection over arbitrary keys. An `enabled`,
//! `interval`, or `job` key directly at the leaf level selects the record
//! shape; everything else object-shaped is a job map, including the
//! doubly-nested historical form where job names sit one level deeper.
//!
//! Leaves that match no shape are dropped silently (permissive legacy
//! contract), with a debug trace.

use serde_json::{Map, Value};
use tracing::debug;

use cadence_engine::JobOptions;

use crate::intent::{IntentKind, ScheduleIntent};

/// One configuration leaf, classified.
enum LeafShape<'a> {
    BareName(&'a str),
    ListOf(&'a [Value]),
    IntervalJobRecord(&'a Map<String, Value>),
    JobDataMap(&'a Map<String, Value>),
}

const RECORD_KEYS: [&str; 3] = ["interval", "job", "enabled"];

fn classify(value: &Value) -> Option<LeafShape<'_>> {
    match value {
        Value::String(name) => Some(LeafShape::BareName(name)),
        Value::Array(items) => Some(LeafShape::ListOf(items)),
        Value::Object(map) => {
            if RECORD_KEYS.iter().any(|k| map.contains_key(*k)) {
                Some(LeafShape::IntervalJobRecord(map))
            } else {
                Some(LeafShape::JobDataMap(map))
            }
        }
        _ => None,
    }
}

/// Parse the merged `every` and `schedule` sections into an ordered intent
/// sequence. Pure; emission order is map insertion order (keys, then
/// sub-keys, then list index), `every` before `schedule`, and is the apply
/// order downstream.
pub fn parse(every: &Map<String, Value>, schedule: &Map<String, Value>) -> Vec<ScheduleIntent> {
    let mut intents = Vec::new();
    for (spec, value) in every {
        resolve_leaf(IntentKind::Recurring, spec, value, &mut intents);
    }
    for (spec, value) in schedule {
        resolve_leaf(IntentKind::OneTimeAt, spec, value, &mut intents);
    }
    intents
}

fn resolve_leaf(kind: IntentKind, spec: &str, value: &Value, out: &mut Vec<ScheduleIntent>) {
    match classify(value) {
        Some(LeafShape::BareName(name)) => {
            out.push(ScheduleIntent::new(kind, spec, name));
        }
        Some(LeafShape::ListOf(items)) => {
            for item in items {
                // List elements resolve by the non-list rules; a nested
                // list is not a recognized shape.
                if item.is_array() {
                    debug!(spec, "dropping nested list in schedule configuration");
                    continue;
                }
                resolve_leaf(kind, spec, item, out);
            }
        }
        Some(LeafShape::IntervalJobRecord(map)) => emit_record(kind, spec, map, out),
        Some(LeafShape::JobDataMap(map)) => emit_job_map(kind, spec, map, out),
        None => {
            debug!(spec, "dropping unrecognized schedule leaf");
        }
    }
}

/// Rule 4: `{job|interval, data?, options?, enabled?}`.
fn emit_record(kind: IntentKind, spec: &str, map: &Map<String, Value>, out: &mut Vec<ScheduleIntent>) {
    let name = map
        .get("job")
        .or_else(|| map.get("interval"))
        .and_then(Value::as_str);
    let Some(name) = name else {
        debug!(spec, "dropping record leaf without a job/interval name");
        return;
    };

    out.push(ScheduleIntent {
        kind,
        job_name: name.to_string(),
        spec: spec.to_string(),
        data: map.get("data").cloned(),
        options: parse_options(map.get("options")),
        enabled: map.get("enabled").and_then(Value::as_bool).unwrap_or(true),
    });
}

/// Rule 3: job name → `{data?, options?, enabled?}` sub-map, including the
/// doubly-nested historical form and the value-is-a-job-name string form.
fn emit_job_map(kind: IntentKind, spec: &str, map: &Map<String, Value>, out: &mut Vec<ScheduleIntent>) {
    for (job_name, sub) in map {
        match sub {
            // `{whatever = "say-hello"}`: the value is the job name.
            Value::String(name) => {
                out.push(ScheduleIntent::new(kind, spec, name));
            }
            Value::Object(sub_map) => {
                if sub_map.is_empty() || has_intent_fields(sub_map) {
                    emit_job_entry(kind, spec, job_name, sub_map, out);
                } else {
                    // Doubly nested: job names sit one level deeper.
                    for (inner_name, inner) in sub_map {
                        match inner {
                            Value::Object(inner_map) => {
                                emit_job_entry(kind, spec, inner_name, inner_map, out);
                            }
                            _ => {
                                debug!(spec, job = %inner_name, "dropping malformed nested entry");
                            }
                        }
                    }
                }
            }
            _ => {
                debug!(spec, job = %job_name, "dropping malformed job map entry");
            }
        }
    }
}

fn has_intent_fields(map: &Map<String, Value>) -> bool {
    map.contains_key("data") || map.contains_key("options") || map.contains_key("enabled")
}

fn emit_job_entry(
    kind: IntentKind,
    spec: &str,
    job_name: &str,
    fields: &Map<String, Value>,
    out: &mut Vec<ScheduleIntent>,
) {
    out.push(ScheduleIntent {
        kind,
        job_name: job_name.to_string(),
        spec: spec.to_string(),
        data: fields.get("data").cloned(),
        options: parse_options(fields.get("options")),
        enabled: fields.get("enabled").and_then(Value::as_bool).unwrap_or(true),
    });
}

fn parse_options(value: Option<&Value>) -> Option<JobOptions> {
    let value = value?;
    match serde_json::from_value::<JobOptions>(value.clone()) {
        Ok(options) => Some(options),
        Err(e) => {
            debug!(error = %e, "dropping unparseable options on schedule leaf");
            None
        }
    }
}
