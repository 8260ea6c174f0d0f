use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use pulsar_config::PulsarConfig;
use pulsar_runtime::lifecycle::{PulsarRuntime, RunOptions, load_plan_dir, wait_for_signal};
use pulsar_runtime::store::build_store;
use pulsar_runtime::tracing_init::init_tracing;

pub struct RunArgs {
    pub plan: PathBuf,
    pub store: Option<String>,
    pub cycle_ms: Option<u64>,
    pub buffer_capacity: Option<usize>,
    pub config: Option<PathBuf>,
}

pub async fn run(args: RunArgs) -> ExitCode {
    match try_run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn try_run(args: RunArgs) -> anyhow::Result<()> {
    let (settings, settings_dir) = match &args.config {
        Some(path) => {
            let base = path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            (PulsarConfig::load(path)?, base)
        }
        None => (PulsarConfig::default(), PathBuf::from(".")),
    };

    let _log_guard = init_tracing(&settings.logging, &settings_dir)?;

    let (plan, manifest) = load_plan_dir(&args.plan)?;
    tracing::info!(
        domain = "conf",
        rules = plan.rules.len(),
        layers = plan.layer_count,
        generated_at = manifest.header.generated_at_utc.as_str(),
        "plan loaded"
    );

    // Precedence: CLI flag > settings file > plan default.
    let cycle_time = Duration::from_millis(
        args.cycle_ms
            .or(settings.runtime.cycle_time.map(|d| d.as_millis()))
            .unwrap_or(plan.cycle_time_ms),
    );
    let buffer_capacity = args
        .buffer_capacity
        .or(settings.runtime.buffer_capacity)
        .unwrap_or(plan.buffer_capacity);
    let connection = args
        .store
        .or(settings.runtime.store)
        .ok_or_else(|| anyhow::anyhow!("no store connection given (use --store or pulsar.toml)"))?;

    let store = build_store(&connection)?;
    let runtime = PulsarRuntime::start(
        plan,
        store,
        RunOptions {
            cycle_time,
            buffer_capacity,
        },
    )
    .await?;

    wait_for_signal(runtime.cancel_token()).await;
    runtime.shutdown();
    runtime.wait().await?;

    Ok(())
}
