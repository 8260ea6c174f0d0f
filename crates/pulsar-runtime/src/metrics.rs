use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared runtime counters.
///
/// Counters are lock-free atomics. Per-rule label sets are fixed at
/// startup to keep hot-path updates allocation-free; counters for rule
/// names outside the compiled plan are silently dropped.
pub struct RuntimeMetrics {
    cycles_total: AtomicU64,
    cycles_skewed_total: AtomicU64,
    cycles_aborted_total: AtomicU64,
    ticks_paused_total: AtomicU64,

    store_read_errors_total: AtomicU64,
    store_write_errors_total: AtomicU64,
    publish_errors_total: AtomicU64,

    writes_flushed_total: AtomicU64,
    messages_published_total: AtomicU64,

    rule_fired_total: BTreeMap<String, AtomicU64>,
    rule_errors_total: BTreeMap<String, AtomicU64>,
}

impl RuntimeMetrics {
    pub fn new(rule_names: &[String]) -> Self {
        let make_rule_map = || {
            rule_names
                .iter()
                .map(|name| (name.clone(), AtomicU64::new(0)))
                .collect::<BTreeMap<_, _>>()
        };

        Self {
            cycles_total: AtomicU64::new(0),
            cycles_skewed_total: AtomicU64::new(0),
            cycles_aborted_total: AtomicU64::new(0),
            ticks_paused_total: AtomicU64::new(0),
            store_read_errors_total: AtomicU64::new(0),
            store_write_errors_total: AtomicU64::new(0),
            publish_errors_total: AtomicU64::new(0),
            writes_flushed_total: AtomicU64::new(0),
            messages_published_total: AtomicU64::new(0),
            rule_fired_total: make_rule_map(),
            rule_errors_total: make_rule_map(),
        }
    }

    pub fn inc_cycle(&self) {
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cycle_skewed(&self) {
        self.cycles_skewed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cycle_aborted(&self) {
        self.cycles_aborted_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tick_paused(&self) {
        self.ticks_paused_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_store_read_error(&self) {
        self.store_read_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_store_write_error(&self) {
        self.store_write_errors_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_publish_error(&self) {
        self.publish_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_writes_flushed(&self, count: usize) {
        self.writes_flushed_total
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn add_messages_published(&self, count: usize) {
        self.messages_published_total
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn inc_rule_fired(&self, rule: &str) {
        if let Some(v) = self.rule_fired_total.get(rule) {
            v.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn inc_rule_error(&self, rule: &str) {
        if let Some(v) = self.rule_errors_total.get(rule) {
            v.fetch_add(1, Ordering::Relaxed);
        }
    }

    // -- read side (tests, shutdown report) ---------------------------------

    pub fn cycles(&self) -> u64 {
        self.cycles_total.load(Ordering::Relaxed)
    }

    pub fn cycles_skewed(&self) -> u64 {
        self.cycles_skewed_total.load(Ordering::Relaxed)
    }

    pub fn cycles_aborted(&self) -> u64 {
        self.cycles_aborted_total.load(Ordering::Relaxed)
    }

    pub fn ticks_paused(&self) -> u64 {
        self.ticks_paused_total.load(Ordering::Relaxed)
    }

    pub fn store_read_errors(&self) -> u64 {
        self.store_read_errors_total.load(Ordering::Relaxed)
    }

    pub fn store_write_errors(&self) -> u64 {
        self.store_write_errors_total.load(Ordering::Relaxed)
    }

    pub fn writes_flushed(&self) -> u64 {
        self.writes_flushed_total.load(Ordering::Relaxed)
    }

    pub fn messages_published(&self) -> u64 {
        self.messages_published_total.load(Ordering::Relaxed)
    }

    pub fn rule_fired(&self, rule: &str) -> u64 {
        self.rule_fired_total
            .get(rule)
            .map_or(0, |v| v.load(Ordering::Relaxed))
    }

    pub fn rule_errors(&self, rule: &str) -> u64 {
        self.rule_errors_total
            .get(rule)
            .map_or(0, |v| v.load(Ordering::Relaxed))
    }

    /// One-line-per-counter text summary, logged at shutdown.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "cycles_total {}", self.cycles());
        let _ = writeln!(out, "cycles_skewed_total {}", self.cycles_skewed());
        let _ = writeln!(out, "cycles_aborted_total {}", self.cycles_aborted());
        let _ = writeln!(out, "ticks_paused_total {}", self.ticks_paused());
        let _ = writeln!(out, "store_read_errors_total {}", self.store_read_errors());
        let _ = writeln!(
            out,
            "store_write_errors_total {}",
            self.store_write_errors()
        );
        let _ = writeln!(out, "writes_flushed_total {}", self.writes_flushed());
        let _ = writeln!(
            out,
            "messages_published_total {}",
            self.messages_published()
        );
        for (rule, v) in &self.rule_fired_total {
            let _ = writeln!(out, "rule_fired_total{{rule=\"{rule}\"}} {}", v.load(Ordering::Relaxed));
        }
        for (rule, v) in &self.rule_errors_total {
            let _ = writeln!(
                out,
                "rule_errors_total{{rule=\"{rule}\"}} {}",
                v.load(Ordering::Relaxed)
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_rule_counters_fixed_at_startup() {
        let metrics = RuntimeMetrics::new(&["known".to_string()]);
        metrics.inc_rule_fired("known");
        metrics.inc_rule_fired("unknown");
        assert_eq!(metrics.rule_fired("known"), 1);
        assert_eq!(metrics.rule_fired("unknown"), 0);
    }

    #[test]
    fn render_text_lists_rules() {
        let metrics = RuntimeMetrics::new(&["a".to_string(), "b".to_string()]);
        metrics.inc_cycle();
        metrics.inc_rule_error("b");
        let text = metrics.render_text();
        assert!(text.contains("cycles_total 1"));
        assert!(text.contains("rule_errors_total{rule=\"b\"} 1"));
    }
}
