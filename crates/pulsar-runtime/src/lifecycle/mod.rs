mod bootstrap;
mod signal;
mod types;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use orion_error::compat_prelude::*;
use orion_error::prelude::*;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use pulsar_lang::plan::ExecutionPlan;

use crate::error::{RuntimeReason, RuntimeResult};
use crate::metrics::RuntimeMetrics;
use crate::orchestrator::Orchestrator;
use crate::store::{SensorStore, build_store};

pub use bootstrap::load_plan_dir;
pub use signal::wait_for_signal;

use types::TaskGroup;

// ---------------------------------------------------------------------------
// RunOptions
// ---------------------------------------------------------------------------

/// Effective runtime parameters after layering CLI flags and settings over
/// the compiled defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub cycle_time: Duration,
    pub buffer_capacity: usize,
}

// ---------------------------------------------------------------------------
// PulsarRuntime — the top-level lifecycle handle
// ---------------------------------------------------------------------------

/// Manages the full lifecycle of the evaluation runtime: bootstrap, run,
/// and graceful shutdown.
///
/// Task groups are stored in start order and joined in reverse (LIFO)
/// during [`wait`](Self::wait). The orchestrator is currently the only
/// group, but the ordering contract keeps future groups (e.g. a store
/// reconnector) drain-safe.
pub struct PulsarRuntime {
    cancel: CancellationToken,
    activity_tx: watch::Sender<bool>,
    groups: Vec<TaskGroup>,
    metrics: Arc<RuntimeMetrics>,
}

impl PulsarRuntime {
    /// Bootstrap the runtime from an in-memory plan and a store handle.
    #[tracing::instrument(name = "runtime.start", skip_all, fields(rules = plan.rules.len()))]
    pub async fn start(
        plan: ExecutionPlan,
        store: Arc<dyn SensorStore>,
        opts: RunOptions,
    ) -> RuntimeResult<Self> {
        if opts.cycle_time.is_zero() {
            return StructError::from(RuntimeReason::Bootstrap)
                .with_detail("cycle time must be greater than zero")
                .err();
        }
        if opts.buffer_capacity == 0 {
            return StructError::from(RuntimeReason::Bootstrap)
                .with_detail("buffer capacity must be greater than zero")
                .err();
        }

        let rule_names: Vec<String> = plan.rules.iter().map(|r| r.name.clone()).collect();
        let metrics = Arc::new(RuntimeMetrics::new(&rule_names));

        let cancel = CancellationToken::new();
        let (activity_tx, activity_rx) = watch::channel(true);

        let orchestrator = Orchestrator::new(
            Arc::new(plan),
            store,
            Arc::clone(&metrics),
            opts.cycle_time,
            opts.buffer_capacity,
            activity_rx,
            cancel.child_token(),
        );

        let mut group = TaskGroup::new("orchestrator");
        group.push(tokio::spawn(orchestrator.run()));

        ps_info!(
            sys,
            rules = rule_names.len(),
            cycle_ms = opts.cycle_time.as_millis() as u64,
            buffer_capacity = opts.buffer_capacity,
            "runtime bootstrap complete"
        );

        Ok(Self {
            cancel,
            activity_tx,
            groups: vec![group],
            metrics,
        })
    }

    /// Bootstrap from a compiler output directory and a store connection
    /// string, using the cadence defaults the plan carries.
    pub async fn start_from_dir(plan_dir: &Path, store_connection: &str) -> RuntimeResult<Self> {
        let (plan, _manifest) = load_plan_dir(plan_dir)?;
        let store = build_store(store_connection).owe(RuntimeReason::Bootstrap)?;
        let opts = RunOptions {
            cycle_time: Duration::from_millis(plan.cycle_time_ms),
            buffer_capacity: plan.buffer_capacity,
        };
        Self::start(plan, store, opts).await
    }

    /// Request graceful shutdown of all tasks.
    pub fn shutdown(&self) {
        ps_info!(sys, "initiating graceful shutdown");
        self.cancel.cancel();
    }

    /// Flip the active/passive signal. While passive, the orchestrator
    /// ticks without evaluating and temporal buffers are retained.
    pub fn set_active(&self, active: bool) {
        ps_info!(sys, active = active, "activity signal changed");
        let _ = self.activity_tx.send(active);
    }

    /// Wait for all task groups to complete after shutdown, logging the
    /// final counter snapshot.
    pub async fn wait(mut self) -> RuntimeResult<()> {
        while let Some(group) = self.groups.pop() {
            let name = group.name;
            ps_debug!(sys, task_group = name, "waiting for task group to finish");
            group.wait().await?;
            ps_debug!(sys, task_group = name, "task group finished");
        }
        ps_info!(sys, "final counters:\n{}", self.metrics.render_text());
        Ok(())
    }

    /// Returns a clone of the root cancellation token (for signal
    /// integration).
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn metrics(&self) -> Arc<RuntimeMetrics> {
        Arc::clone(&self.metrics)
    }
}
