//! End-to-end scheduler registration tests against the in-memory engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{Timelike, Utc};
use serde_json::json;
use tempfile::TempDir;

use cadence::{
    EngineError, EntryKind, HandlerRegistry, JobContext, JobEngine, JobHandler, MemoryEngine,
    RegisterError, SchedulerOptions, register, register_with_memory_engine,
};

struct CountingHandler {
    runs: AtomicU64,
}

impl CountingHandler {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            runs: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl JobHandler for CountingHandler {
    async fn run(&self, _job: &JobContext) -> Result<(), EngineError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Jobs directory with bare-string manifests for the given names, plus a
/// registry binding them all to counting handlers.
fn jobs_fixture(names: &[&str]) -> (TempDir, HandlerRegistry, Arc<CountingHandler>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let dir = TempDir::new().unwrap();
    let handler = CountingHandler::new();
    let mut registry = HandlerRegistry::new();
    registry.register("counting", handler.clone());

    for name in names {
        std::fs::write(
            dir.path().join(format!("{name}.job.json")),
            r#""counting""#,
        )
        .unwrap();
    }
    (dir, registry, handler)
}

fn options(jobs_dir: &TempDir) -> SchedulerOptions {
    SchedulerOptions {
        connection_uri: "memory://tests".into(),
        jobs_source: jobs_dir.path().display().to_string(),
        process_every: "50 ms".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn scenario_a_single_every_entry() {
    let (dir, registry, _) = jobs_fixture(&["say-hello"]);
    let mut opts = options(&dir);
    opts.every = match json!({"10 seconds": "say-hello"}) {
        serde_json::Value::Object(m) => m,
        _ => unreachable!(),
    };

    let facade = register_with_memory_engine(opts, registry).await.unwrap();
    let entries = facade.entries().await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "say-hello");
    assert_eq!(entries[0].kind, EntryKind::Recurring);
    assert_eq!(entries[0].spec, "10 seconds");
    facade.stop().await.unwrap();
}

#[tokio::test]
async fn scenario_b_every_with_data() {
    let (dir, registry, _) = jobs_fixture(&["say-hello"]);
    let mut opts = options(&dir);
    opts.every = match json!({"10 seconds": {"say-hello": {"data": {"userId": 1}}}}) {
        serde_json::Value::Object(m) => m,
        _ => unreachable!(),
    };

    let facade = register_with_memory_engine(opts, registry).await.unwrap();
    let entries = facade.entries().await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].data.as_ref().unwrap()["userId"], json!(1));
    facade.stop().await.unwrap();
}

#[tokio::test]
async fn scenario_c_schedule_two_jobs_at_next_3am() {
    let (dir, registry, _) = jobs_fixture(&["say-hello", "i-am-your-father"]);
    let mut opts = options(&dir);
    opts.schedule = match json!({"every day at 3am": ["say-hello", "i-am-your-father"]}) {
        serde_json::Value::Object(m) => m,
        _ => unreachable!(),
    };

    let facade = register_with_memory_engine(opts, registry).await.unwrap();
    let entries = facade.entries().await.unwrap();

    assert_eq!(entries.len(), 2);
    let now = Utc::now();
    for entry in &entries {
        assert_eq!(entry.kind, EntryKind::OneTime);
        let next = entry.next_run_at.unwrap();
        assert_eq!(next.hour(), 3);
        assert_eq!(next.minute(), 0);
        assert!(next > now);
        assert!(next - now <= chrono::Duration::hours(24));
    }
    assert_eq!(entries[0].name, "say-hello");
    assert_eq!(entries[1].name, "i-am-your-father");
    facade.stop().await.unwrap();
}

#[tokio::test]
async fn scenario_d_mixed_sections_in_declared_order() {
    let (dir, registry, _) = jobs_fixture(&["say-hello", "cleanup", "report"]);
    let mut opts = options(&dir);
    opts.every = match json!({"10 seconds": "say-hello", "5 minutes": "cleanup"}) {
        serde_json::Value::Object(m) => m,
        _ => unreachable!(),
    };
    opts.schedule = match json!({"every day at 3am": "report"}) {
        serde_json::Value::Object(m) => m,
        _ => unreachable!(),
    };

    let facade = register_with_memory_engine(opts, registry).await.unwrap();
    let entries = facade.entries().await.unwrap();

    let summary: Vec<(&str, EntryKind)> = entries
        .iter()
        .map(|e| (e.name.as_str(), e.kind))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("say-hello", EntryKind::Recurring),
            ("cleanup", EntryKind::Recurring),
            ("report", EntryKind::OneTime),
        ]
    );
    facade.stop().await.unwrap();
}

/// Register against a pre-built shared engine instead of a fresh one.
async fn register_shared(
    opts: SchedulerOptions,
    registry: HandlerRegistry,
    engine: &Arc<dyn JobEngine>,
) -> cadence::SchedulerFacade {
    let shared = engine.clone();
    register(opts, registry, move |_| Ok(shared)).await.unwrap()
}

#[tokio::test]
async fn reconciliation_is_idempotent_across_restarts() {
    let (dir, _, handler) = jobs_fixture(&["say-hello"]);
    let engine: Arc<dyn JobEngine> =
        Arc::new(MemoryEngine::new(options(&dir).engine_settings()).unwrap());

    for _ in 0..2 {
        let mut opts = options(&dir);
        opts.every = match json!({"10 seconds": "say-hello"}) {
            serde_json::Value::Object(m) => m,
            _ => unreachable!(),
        };
        let registry = HandlerRegistry::new().with("counting", handler.clone());
        let facade = register_shared(opts, registry, &engine).await;
        facade.stop().await.unwrap();
    }

    let entries = engine.entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "say-hello");
}

#[tokio::test]
async fn sweep_removes_entries_for_renamed_jobs() {
    let (dir, _, handler) = jobs_fixture(&["old-job", "new-job"]);
    let engine: Arc<dyn JobEngine> =
        Arc::new(MemoryEngine::new(options(&dir).engine_settings()).unwrap());

    for name in ["old-job", "new-job"] {
        let mut opts = options(&dir);
        opts.every = match json!({"10 seconds": name}) {
            serde_json::Value::Object(m) => m,
            _ => unreachable!(),
        };
        let registry = HandlerRegistry::new().with("counting", handler.clone());
        let facade = register_shared(opts, registry, &engine).await;
        facade.stop().await.unwrap();
    }

    let entries = engine.entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "new-job");
}

#[tokio::test]
async fn disabled_intent_creates_nothing() {
    let (dir, registry, _) = jobs_fixture(&["say-hello"]);
    let mut opts = options(&dir);
    opts.every = match json!({"10 seconds": {"say-hello": {"enabled": false}}}) {
        serde_json::Value::Object(m) => m,
        _ => unreachable!(),
    };

    let facade = register_with_memory_engine(opts, registry).await.unwrap();
    assert!(facade.entries().await.unwrap().is_empty());
    facade.stop().await.unwrap();
}

#[tokio::test]
async fn unknown_job_name_does_not_crash() {
    let (dir, registry, _) = jobs_fixture(&[]);
    let mut opts = options(&dir);
    opts.every = match json!({"10 seconds": "ghost"}) {
        serde_json::Value::Object(m) => m,
        _ => unreachable!(),
    };

    let facade = register_with_memory_engine(opts, registry).await.unwrap();
    assert!(facade.entries().await.unwrap().is_empty());
    facade.stop().await.unwrap();
}

#[tokio::test]
async fn missing_jobs_directory_is_zero_jobs() {
    let registry = HandlerRegistry::new();
    let opts = SchedulerOptions {
        connection_uri: "memory://tests".into(),
        jobs_source: "/definitely/not/a/real/jobs/dir".into(),
        ..Default::default()
    };

    let facade = register_with_memory_engine(opts, registry).await.unwrap();
    assert!(facade.entries().await.unwrap().is_empty());
    facade.stop().await.unwrap();
}

#[tokio::test]
async fn missing_connection_uri_fails_before_engine_construction() {
    let registry = HandlerRegistry::new();
    let opts = SchedulerOptions {
        jobs_source: "./jobs".into(),
        ..Default::default()
    };

    let result = register(opts, registry, |_| {
        panic!("engine must not be constructed when validation fails")
    })
    .await;
    assert!(matches!(result, Err(RegisterError::Config(_))));
}

#[tokio::test]
async fn missing_jobs_source_fails_fast() {
    let registry = HandlerRegistry::new();
    let opts = SchedulerOptions {
        connection_uri: "memory://tests".into(),
        ..Default::default()
    };

    let result = register_with_memory_engine(opts, registry).await;
    assert!(matches!(result, Err(RegisterError::Config(_))));
}

#[tokio::test]
async fn facade_now_enqueues_and_handler_runs() {
    let (dir, registry, handler) = jobs_fixture(&["say-hello"]);
    let opts = options(&dir);

    let facade = register_with_memory_engine(opts, registry).await.unwrap();
    facade.now("say-hello", Some(json!({"greeting": "hi"}))).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(400)).await;
    facade.stop().await.unwrap();

    assert!(handler.runs.load(Ordering::SeqCst) >= 1);
    let entries = facade.entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].run_count >= 1);
}
