use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use pulsar_core::rule::{RuleOutcome, execute_rule};
use pulsar_core::snapshot::Snapshot;
use pulsar_core::temporal::TemporalStore;
use pulsar_core::value::Value;
use pulsar_lang::plan::ExecutionPlan;

use crate::metrics::RuntimeMetrics;
use crate::store::SensorStore;

// ---------------------------------------------------------------------------
// Orchestrator — the fixed-cadence evaluation loop
// ---------------------------------------------------------------------------

/// Runs the compiled plan every `cycle_time` against the sensor store.
///
/// Each cycle: read the union of input sensors, append the readings to the
/// per-sensor ring buffers, execute groups in coordinator order against
/// the working snapshot, then flush the accumulated writes in one batch
/// and publish any messages. Rules in a group are independent by
/// construction; this implementation evaluates them sequentially, which
/// the plan contract explicitly permits.
///
/// Cycles never overlap. When a cycle overruns the cadence the next one
/// starts immediately and the skew counter increments. While the activity
/// signal is false the loop ticks without evaluating; buffers are
/// retained so temporal state survives a passive period.
pub struct Orchestrator {
    plan: Arc<ExecutionPlan>,
    store: Arc<dyn SensorStore>,
    buffers: TemporalStore,
    metrics: Arc<RuntimeMetrics>,
    cycle_time: Duration,
    active_rx: watch::Receiver<bool>,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        plan: Arc<ExecutionPlan>,
        store: Arc<dyn SensorStore>,
        metrics: Arc<RuntimeMetrics>,
        cycle_time: Duration,
        buffer_capacity: usize,
        active_rx: watch::Receiver<bool>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            plan,
            store,
            buffers: TemporalStore::new(buffer_capacity),
            metrics,
            cycle_time,
            active_rx,
            cancel,
        }
    }

    /// Run the cadence loop until cancelled.
    ///
    /// Cancellation is cooperative: an in-flight cycle runs to completion,
    /// bounded by a hard deadline of twice the cycle time, after which it
    /// is abandoned and the loop exits.
    #[tracing::instrument(name = "orchestrator", skip_all)]
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut interval = tokio::time::interval(self.cycle_time);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let hard_deadline = self.cycle_time * 2;
        let cancel = self.cancel.clone();

        ps_info!(
            sys,
            rules = self.plan.rules.len(),
            groups = self.plan.groups.len(),
            cycle_ms = self.cycle_time.as_millis() as u64,
            "orchestrator started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if !*self.active_rx.borrow() {
                        self.metrics.inc_tick_paused();
                        continue;
                    }
                    let started = Instant::now();
                    let now_ms = chrono::Utc::now().timestamp_millis();
                    let metrics = Arc::clone(&self.metrics);
                    {
                        let cycle_fut = self.run_cycle_at(now_ms);
                        tokio::pin!(cycle_fut);
                        tokio::select! {
                            _ = &mut cycle_fut => {}
                            _ = async {
                                cancel.cancelled().await;
                                tokio::time::sleep(hard_deadline).await;
                            } => {
                                metrics.inc_cycle_aborted();
                                ps_warn!(
                                    cycle,
                                    deadline_ms = hard_deadline.as_millis() as u64,
                                    "in-flight cycle exceeded shutdown deadline, abandoned"
                                );
                                break;
                            }
                        }
                    }
                    if started.elapsed() > self.cycle_time {
                        self.metrics.inc_cycle_skewed();
                        ps_debug!(
                            cycle,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "cycle overran cadence, next starts immediately"
                        );
                    }
                }
                _ = cancel.cancelled() => {
                    break;
                }
            }
        }

        ps_info!(sys, cycles = self.metrics.cycles(), "orchestrator stopped");
        Ok(())
    }

    /// Run one evaluation cycle with an explicit timestamp. The cadence
    /// loop passes the wall clock; deterministic replays and tests pass
    /// their own.
    pub async fn run_cycle_at(&mut self, now_ms: i64) {
        self.metrics.inc_cycle();

        // 1. Read the snapshot.
        let raw = match self.store.get_many(&self.plan.input_sensors).await {
            Ok(raw) => raw,
            Err(e) => {
                self.metrics.inc_store_read_error();
                ps_warn!(store, error = %e, "snapshot read failed, cycle skipped");
                return;
            }
        };
        let mut snapshot = Snapshot::from_store_values(&raw);

        // 2. Append every numeric reading to its ring buffer. Writes from
        // this cycle reach buffers only when read back next cycle.
        for key in raw.keys() {
            if let Some(n) = snapshot.get_number(key) {
                self.buffers.record(key, now_ms, n);
            }
        }

        // 3. Execute groups in coordinator order.
        let mut writes: Vec<(String, f64)> = Vec::new();
        let mut messages: Vec<(String, String)> = Vec::new();
        for &group_idx in &self.plan.coordinator.group_order {
            let group = &self.plan.groups[group_idx];
            for &rule_idx in &group.rules {
                let rule = &self.plan.rules[rule_idx];
                match execute_rule(rule, &mut snapshot, &self.buffers) {
                    Ok(RuleOutcome::NotFired) => {}
                    Ok(RuleOutcome::Fired {
                        writes: w,
                        messages: m,
                    }) => {
                        self.metrics.inc_rule_fired(&rule.name);
                        writes.extend(w);
                        messages.extend(m);
                    }
                    Err(e) => {
                        self.metrics.inc_rule_error(&rule.name);
                        ps_warn!(
                            cycle,
                            rule = rule.name.as_str(),
                            error = %e,
                            "rule evaluation error, outputs discarded"
                        );
                    }
                }
            }
        }

        // 4. Flush writes in one batch, then publish. For a sensor written
        // more than once, group order decides: the last writer wins.
        if !writes.is_empty() {
            let count = writes.len();
            let mut batch: HashMap<String, String> = HashMap::new();
            for (key, value) in writes {
                batch.insert(key, Value::Number(value).to_store());
            }
            match self.store.set_many(batch).await {
                Ok(()) => self.metrics.add_writes_flushed(count),
                Err(e) => {
                    self.metrics.inc_store_write_error();
                    ps_warn!(store, error = %e, "write flush failed, outputs dropped");
                }
            }
        }
        for (channel, message) in messages {
            match self.store.publish(&channel, &message).await {
                Ok(()) => self.metrics.add_messages_published(1),
                Err(e) => {
                    self.metrics.inc_publish_error();
                    ps_warn!(store, channel = channel.as_str(), error = %e, "publish failed");
                }
            }
        }
    }

    /// Buffer introspection for diagnostics.
    pub fn temporal_sensor_count(&self) -> usize {
        self.buffers.sensor_count()
    }
}
