//! In-memory reference engine.
//!
//! Implements the full [`JobEngine`] contract against a process-local row
//! store: upsert-by-name recurring entries, one-time entries, cancel by
//! filter, and a polling worker loop bounded by a concurrency semaphore.
//! Used by the integration tests and as the default backend for embedded
//! deployments that do not need durable storage.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock, Semaphore, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::engine::{
    CancelFilter, EngineSettings, EntryKind, JobContext, JobEngine, JobHandler, JobOptions,
    PersistedEntry,
};
use crate::error::EngineError;
use crate::event::EngineEvent;
use crate::timespec::TimeSpec;

const EVENT_CAPACITY: usize = 256;

struct HandlerEntry {
    options: JobOptions,
    handler: Arc<dyn JobHandler>,
}

struct Inner {
    settings: EngineSettings,
    handlers: RwLock<HashMap<String, HandlerEntry>>,
    entries: RwLock<Vec<PersistedEntry>>,
    events: broadcast::Sender<EngineEvent>,
    ready: AtomicBool,
    running: AtomicBool,
    run_permits: Arc<Semaphore>,
}

/// In-memory [`JobEngine`] implementation.
pub struct MemoryEngine {
    inner: Arc<Inner>,
    poll_loop: Mutex<Option<JoinHandle<()>>>,
}

impl MemoryEngine {
    /// Create an engine from settings.
    ///
    /// The connection URI is validated eagerly; there is no external
    /// storage to reach, but an empty URI is still a configuration bug.
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        if settings.connection_uri.trim().is_empty() {
            return Err(EngineError::Connection(
                "connection URI must not be empty".into(),
            ));
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let permits = settings.max_concurrency.max(1) as usize;

        Ok(Self {
            inner: Arc::new(Inner {
                settings,
                handlers: RwLock::new(HashMap::new()),
                entries: RwLock::new(Vec::new()),
                events,
                ready: AtomicBool::new(false),
                running: AtomicBool::new(false),
                run_permits: Arc::new(Semaphore::new(permits)),
            }),
            poll_loop: Mutex::new(None),
        })
    }

    /// Whether the worker loop is running.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Names and default options of all defined handlers.
    pub async fn defined_jobs(&self) -> Vec<(String, JobOptions)> {
        let handlers = self.inner.handlers.read().await;
        handlers
            .iter()
            .map(|(name, entry)| (name.clone(), entry.options.clone()))
            .collect()
    }

    fn poll_interval(&self) -> std::time::Duration {
        match TimeSpec::parse(&self.inner.settings.process_every) {
            Some(TimeSpec::Interval(d)) => d
                .to_std()
                .unwrap_or(std::time::Duration::from_secs(30)),
            _ => std::time::Duration::from_secs(30),
        }
    }
}

impl Inner {
    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Entry and loop operations require a prior `ready()` call.
    fn ensure_ready(&self) -> Result<(), EngineError> {
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(EngineError::NotReady)
        }
    }

    /// Claim due entries: advance (or retire) their fire time under the
    /// write lock so a slow handler cannot be fired twice, and return
    /// invocation snapshots ordered by effective priority (entry options
    /// overlaid on the definition defaults, highest first).
    async fn claim_due(&self) -> Vec<(Uuid, String, Option<serde_json::Value>)> {
        let now = Utc::now();
        let mut due = Vec::new();
        {
            let mut entries = self.entries.write().await;
            for entry in entries.iter_mut() {
                let Some(next) = entry.next_run_at else {
                    continue;
                };
                if next > now {
                    continue;
                }

                entry.next_run_at = match entry.kind {
                    EntryKind::Recurring => {
                        TimeSpec::parse(&entry.spec).and_then(|s| s.next_after(now))
                    }
                    EntryKind::OneTime => None,
                };
                due.push((entry.id, entry.name.clone(), entry.data.clone(), entry.options.clone()));
            }
        }

        let handlers = self.handlers.read().await;
        // Stable sort: equal priorities keep claim order.
        due.sort_by_key(|(_, name, _, options)| {
            let defaults = handlers
                .get(name)
                .map(|h| h.options.clone())
                .unwrap_or_default();
            let effective = match options {
                Some(o) => defaults.merged_with(o),
                None => defaults,
            };
            std::cmp::Reverse(effective.priority.unwrap_or(0))
        });

        due.into_iter().map(|(id, name, data, _)| (id, name, data)).collect()
    }

    async fn run_one(
        self: Arc<Self>,
        id: Uuid,
        name: String,
        data: Option<serde_json::Value>,
    ) {
        let handler = {
            let handlers = self.handlers.read().await;
            handlers.get(&name).map(|h| h.handler.clone())
        };

        let fired_at = Utc::now();
        self.emit(EngineEvent::JobStart {
            name: name.clone(),
            id,
        });

        let result = match handler {
            Some(handler) => {
                let ctx = JobContext {
                    id,
                    name: name.clone(),
                    data,
                    fired_at,
                };
                handler.run(&ctx).await
            }
            None => Err(EngineError::UnknownJob(name.clone())),
        };

        let error = result.as_ref().err().map(|e| e.to_string());
        {
            let mut entries = self.entries.write().await;
            if let Some(entry) = entries.iter_mut().find(|e| e.id == id) {
                entry.last_run_at = Some(fired_at);
                entry.run_count += 1;
                entry.last_error = error.clone();
            }
        }

        self.emit(EngineEvent::JobComplete {
            name: name.clone(),
            id,
        });
        match error {
            None => self.emit(EngineEvent::JobSuccess { name, id }),
            Some(error) => {
                warn!(job = %name, %error, "job invocation failed");
                self.emit(EngineEvent::JobFail { name, id, error });
            }
        }
    }
}

#[async_trait]
impl JobEngine for MemoryEngine {
    async fn define_handler(
        &self,
        name: &str,
        options: JobOptions,
        handler: Arc<dyn JobHandler>,
    ) -> Result<(), EngineError> {
        let mut handlers = self.inner.handlers.write().await;
        if handlers.contains_key(name) {
            debug!(job = name, "redefining handler");
        }
        handlers.insert(name.to_string(), HandlerEntry { options, handler });
        Ok(())
    }

    async fn ready(&self) -> Result<(), EngineError> {
        // Nothing to connect; readiness is immediate.
        self.inner.ready.store(true, Ordering::SeqCst);
        self.inner.emit(EngineEvent::Ready);
        Ok(())
    }

    async fn cancel(&self, filter: &CancelFilter) -> Result<u64, EngineError> {
        self.inner.ensure_ready()?;
        let mut entries = self.inner.entries.write().await;
        let before = entries.len();
        entries.retain(|e| !filter.matches(&e.name));
        let removed = (before - entries.len()) as u64;

        if removed > 0 {
            self.inner.emit(EngineEvent::Removed { count: removed });
        }
        Ok(removed)
    }

    async fn every(
        &self,
        spec: &str,
        name: &str,
        data: Option<serde_json::Value>,
        options: Option<JobOptions>,
    ) -> Result<(), EngineError> {
        self.inner.ensure_ready()?;
        let next_run_at = TimeSpec::parse(spec).and_then(|s| s.next_after(Utc::now()));
        if next_run_at.is_none() {
            debug!(job = name, spec, "unparseable recurring spec, entry will never fire");
        }

        let mut entries = self.inner.entries.write().await;
        // Recurring entries are keyed by job name: the last write wins.
        if let Some(entry) = entries
            .iter_mut()
            .find(|e| e.name == name && e.kind == EntryKind::Recurring)
        {
            entry.spec = spec.to_string();
            entry.data = data;
            entry.options = options;
            entry.next_run_at = next_run_at;
            return Ok(());
        }

        entries.push(PersistedEntry {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind: EntryKind::Recurring,
            spec: spec.to_string(),
            data,
            options,
            next_run_at,
            last_run_at: None,
            run_count: 0,
            last_error: None,
        });
        Ok(())
    }

    async fn schedule(
        &self,
        when: &str,
        name: &str,
        data: Option<serde_json::Value>,
    ) -> Result<(), EngineError> {
        self.inner.ensure_ready()?;
        let next_run_at = TimeSpec::parse(when).and_then(|s| s.next_after(Utc::now()));
        if next_run_at.is_none() {
            debug!(job = name, when, "unparseable schedule spec, entry will never fire");
        }

        let mut entries = self.inner.entries.write().await;
        entries.push(PersistedEntry {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind: EntryKind::OneTime,
            spec: when.to_string(),
            data,
            options: None,
            next_run_at,
            last_run_at: None,
            run_count: 0,
            last_error: None,
        });
        Ok(())
    }

    async fn now(&self, name: &str, data: Option<serde_json::Value>) -> Result<(), EngineError> {
        self.inner.ensure_ready()?;
        let mut entries = self.inner.entries.write().await;
        entries.push(PersistedEntry {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind: EntryKind::OneTime,
            spec: "now".to_string(),
            data,
            options: None,
            next_run_at: Some(Utc::now()),
            last_run_at: None,
            run_count: 0,
            last_error: None,
        });
        Ok(())
    }

    async fn start(&self) -> Result<(), EngineError> {
        self.inner.ensure_ready()?;
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let inner = self.inner.clone();
        let period = self.poll_interval();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            while inner.running.load(Ordering::SeqCst) {
                ticker.tick().await;

                for (id, name, data) in inner.claim_due().await {
                    let Ok(permit) = inner.run_permits.clone().acquire_owned().await else {
                        return;
                    };
                    let task_inner = inner.clone();
                    tokio::spawn(async move {
                        task_inner.run_one(id, name, data).await;
                        drop(permit);
                    });
                }
            }
        });

        *self.poll_loop.lock().await = Some(handle);
        debug!(period = ?period, "worker loop started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), EngineError> {
        self.inner.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.poll_loop.lock().await.take() {
            handle.abort();
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.events.subscribe()
    }

    async fn entries(&self) -> Result<Vec<PersistedEntry>, EngineError> {
        Ok(self.inner.entries.read().await.clone())
    }
}
