//! Lifecycle tests: cadence, pause/resume, graceful shutdown, and plan-dir
//! bootstrap. Timing tests run under tokio's paused clock.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use pulsar_lang::{PlanOptions, compile, parse_rule_set, write_artifacts};
use pulsar_runtime::lifecycle::{PulsarRuntime, RunOptions, load_plan_dir};
use pulsar_runtime::store::MemoryStore;

const RULES: &str = r#"
schema_version: 1
rules:
  - name: heat
    conditions:
      all:
        - condition: { type: comparison, sensor: temperature, operator: ">", value: 50 }
    actions:
      - set_value: { key: alert, value: 1 }
"#;

fn compiled() -> pulsar_lang::CompileOutput {
    let (set, _) = parse_rule_set("rules.yaml", RULES).unwrap();
    let valid: BTreeSet<String> = ["temperature", "alert"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let generated_at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    compile(&set, &valid, &PlanOptions::default(), generated_at).unwrap()
}

fn options() -> RunOptions {
    RunOptions {
        cycle_time: Duration::from_millis(100),
        buffer_capacity: 16,
    }
}

#[tokio::test(start_paused = true)]
async fn cadence_runs_cycles_until_shutdown() {
    let store = Arc::new(MemoryStore::new());
    store.set("temperature", "60").await;

    let runtime = PulsarRuntime::start(compiled().plan, store.clone(), options())
        .await
        .unwrap();
    let metrics = runtime.metrics();

    tokio::time::sleep(Duration::from_millis(550)).await;
    runtime.shutdown();
    runtime.wait().await.unwrap();

    assert!(metrics.cycles() >= 5, "cycles = {}", metrics.cycles());
    assert_eq!(store.get("alert").await.as_deref(), Some("1"));
}

#[tokio::test(start_paused = true)]
async fn passive_runtime_ticks_without_evaluating() {
    let store = Arc::new(MemoryStore::new());
    store.set("temperature", "60").await;

    let runtime = PulsarRuntime::start(compiled().plan, store.clone(), options())
        .await
        .unwrap();
    let metrics = runtime.metrics();

    runtime.set_active(false);
    tokio::time::sleep(Duration::from_millis(550)).await;
    let cycles_while_paused = metrics.cycles();
    assert!(metrics.ticks_paused() > 0);
    assert_eq!(store.get("alert").await, None);

    // Resume: evaluation picks up cleanly.
    runtime.set_active(true);
    tokio::time::sleep(Duration::from_millis(550)).await;
    assert!(metrics.cycles() > cycles_while_paused);
    assert_eq!(store.get("alert").await.as_deref(), Some("1"));

    runtime.shutdown();
    runtime.wait().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_without_cycles_is_clean() {
    let store = Arc::new(MemoryStore::new());
    let runtime = PulsarRuntime::start(compiled().plan, store, options())
        .await
        .unwrap();
    runtime.shutdown();
    runtime.wait().await.unwrap();
}

#[tokio::test]
async fn rejects_zero_cycle_time() {
    let store = Arc::new(MemoryStore::new());
    let opts = RunOptions {
        cycle_time: Duration::ZERO,
        buffer_capacity: 16,
    };
    assert!(PulsarRuntime::start(compiled().plan, store, opts).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn start_from_dir_loads_emitted_artifacts() {
    let out = compiled();
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path(), &out.plan, &out.manifest).unwrap();

    let (plan, manifest) = load_plan_dir(dir.path()).unwrap();
    assert_eq!(plan, out.plan);
    assert_eq!(manifest, out.manifest);

    let runtime = PulsarRuntime::start_from_dir(dir.path(), "mem://").await.unwrap();
    runtime.shutdown();
    runtime.wait().await.unwrap();
}

#[tokio::test]
async fn missing_plan_dir_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = PulsarRuntime::start_from_dir(dir.path(), "mem://").await;
    assert!(err.is_err());
}

#[tokio::test]
async fn corrupt_plan_file_is_fatal() {
    let out = compiled();
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path(), &out.plan, &out.manifest).unwrap();
    std::fs::write(dir.path().join(pulsar_lang::PLAN_FILE_NAME), b"not json").unwrap();
    assert!(load_plan_dir(dir.path()).is_err());
}

#[tokio::test]
async fn unsupported_store_scheme_is_fatal() {
    let out = compiled();
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path(), &out.plan, &out.manifest).unwrap();
    let err = PulsarRuntime::start_from_dir(dir.path(), "redis://localhost").await;
    assert!(err.is_err());
}
