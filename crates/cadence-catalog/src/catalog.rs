//! Job catalog: normalize raw source entries into a name → spec mapping.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{info, warn};

use cadence_engine::JobOptions;

use crate::error::CatalogError;
use crate::job::JobSpec;
use crate::registry::HandlerRegistry;
use crate::source::{JobSource, RawJobEntry};

/// The set of discovered jobs. Built once at startup, read-only after.
#[derive(Debug)]
pub struct JobCatalog {
    jobs: HashMap<String, JobSpec>,
}

impl JobCatalog {
    /// Load and normalize all entries from `source`, resolving handler ids
    /// against `registry`.
    ///
    /// A source that yields zero entries produces an empty catalog; a
    /// source that exists but cannot be read, a manifest that does not
    /// parse, or a manifest naming an unknown handler aborts the load.
    pub async fn load(
        source: &dyn JobSource,
        registry: &HandlerRegistry,
    ) -> Result<JobCatalog, CatalogError> {
        let mut jobs = HashMap::new();

        for raw in source.entries().await? {
            let spec = normalize(raw, registry)?;
            if jobs.contains_key(&spec.name) {
                warn!(job = %spec.name, "duplicate job name, later entry replaces earlier");
            }
            jobs.insert(spec.name.clone(), spec);
        }

        info!(jobs = jobs.len(), "job catalog loaded");
        Ok(JobCatalog { jobs })
    }

    /// Look up a job by name.
    pub fn get(&self, name: &str) -> Option<&JobSpec> {
        self.jobs.get(name)
    }

    /// Whether the catalog contains `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    /// All specs, unordered.
    pub fn iter(&self) -> impl Iterator<Item = &JobSpec> {
        self.jobs.values()
    }

    /// Number of jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Turn a raw entry into a [`JobSpec`].
///
/// A bare string manifest is a handler id; the discovery key is the job
/// name. A record manifest takes its name from the `name` field (falling
/// back to the key) and its handler from `handler`; all remaining fields
/// become the definition's default options.
fn normalize(raw: RawJobEntry, registry: &HandlerRegistry) -> Result<JobSpec, CatalogError> {
    match raw.manifest {
        Value::String(handler_id) => {
            if raw.key.is_empty() {
                return Err(CatalogError::EmptyName(raw.key));
            }
            let handler =
                registry
                    .get(&handler_id)
                    .ok_or_else(|| CatalogError::UnknownHandler {
                        job: raw.key.clone(),
                        handler: handler_id.clone(),
                    })?;
            Ok(JobSpec {
                name: raw.key,
                handler,
                default_options: JobOptions::default(),
            })
        }
        Value::Object(mut map) => {
            let name = match map.remove("name") {
                Some(Value::String(n)) if !n.is_empty() => n,
                Some(_) => return Err(CatalogError::EmptyName(raw.key)),
                None if !raw.key.is_empty() => raw.key.clone(),
                None => return Err(CatalogError::EmptyName(raw.key)),
            };
            let handler_id = match map.remove("handler") {
                Some(Value::String(h)) => h,
                _ => {
                    return Err(CatalogError::BadManifest {
                        path: raw.key,
                        message: "record manifest requires a string 'handler' field".into(),
                    });
                }
            };
            let handler = registry
                .get(&handler_id)
                .ok_or_else(|| CatalogError::UnknownHandler {
                    job: name.clone(),
                    handler: handler_id.clone(),
                })?;

            // Remaining keys are the definition's default options.
            let default_options: JobOptions = serde_json::from_value(Value::Object(map))
                .map_err(|e| CatalogError::BadManifest {
                    path: name.clone(),
                    message: e.to_string(),
                })?;

            Ok(JobSpec {
                name,
                handler,
                default_options,
            })
        }
        other => Err(CatalogError::BadManifest {
            path: raw.key,
            message: format!("manifest must be a string or object, got: {other}"),
        }),
    }
}
