use serde::{Deserialize, Serialize};

use crate::ast::{CmpOp, Expr};

// ---------------------------------------------------------------------------
// ExecutionPlan — the on-disk compilation artifact
// ---------------------------------------------------------------------------

/// Compiled rule set: the frozen, ordered evaluation program the runtime
/// loads at start and never mutates. Serialization is deterministic for
/// identical compiler inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub schema_version: u32,
    /// Default evaluation cadence, from the system configuration. The
    /// runtime may override it per invocation.
    pub cycle_time_ms: u64,
    /// Default per-sensor ring-buffer capacity.
    pub buffer_capacity: usize,
    /// All rules in final emission order (layer, then source tie-break).
    pub rules: Vec<RulePlan>,
    pub groups: Vec<GroupPlan>,
    pub coordinator: CoordinatorPlan,
    /// Union of sensors any rule reads; the orchestrator's per-cycle
    /// snapshot set.
    pub input_sensors: Vec<String>,
    /// Sensors appearing in `threshold_over_time` conditions.
    pub temporal_sensors: Vec<String>,
    pub layer_count: usize,
}

impl ExecutionPlan {
    /// An empty rule set compiles to an empty plan.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RulePlan — one compiled rule
// ---------------------------------------------------------------------------

/// The executable representation of a single rule. The evaluation sequence
/// is fixed: temporal buffers for `temporal_reads` are populated by the
/// orchestrator at cycle start, conditions evaluate with short-circuit
/// semantics, and actions run in source order when conditions hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulePlan {
    pub name: String,
    pub layer: usize,
    pub condition: ConditionPlan,
    pub actions: Vec<ActionPlan>,
    /// Sensors this rule reads (conditions and value expressions).
    pub reads: Vec<String>,
    /// Sensors this rule writes via `set_value`.
    pub writes: Vec<String>,
    /// `(sensor, threshold, duration_ms)` for each temporal condition.
    pub temporal_reads: Vec<TemporalRead>,
    pub source_file: String,
    pub source_line: u32,
}

impl RulePlan {
    pub fn uses_temporal(&self) -> bool {
        !self.temporal_reads.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalRead {
    pub sensor: String,
    pub threshold: f64,
    pub duration_ms: u64,
}

// ---------------------------------------------------------------------------
// ConditionPlan
// ---------------------------------------------------------------------------

/// Lowered condition group. `all` must hold entirely; `any`, when
/// non-empty, must hold for at least one member. Evaluation short-circuits
/// left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConditionPlan {
    pub all: Vec<CondNode>,
    pub any: Vec<CondNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CondNode {
    Compare {
        sensor: String,
        op: CmpOp,
        value: f64,
    },
    Expr {
        expr: Expr,
    },
    ThresholdOverTime {
        sensor: String,
        threshold: f64,
        duration_ms: u64,
    },
    Group(ConditionPlan),
}

// ---------------------------------------------------------------------------
// ActionPlan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPlan {
    SetValue { key: String, value: ValueSource },
    Publish { channel: String, message: String },
}

/// The value side of a lowered `set_value`: a literal, or a post-validation
/// expression tree evaluated against the current-cycle snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    Literal(f64),
    Expr(Expr),
}

// ---------------------------------------------------------------------------
// Groups & coordinator
// ---------------------------------------------------------------------------

/// An execution unit: rule indices (into `ExecutionPlan::rules`) that are
/// mutually independent and may evaluate concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPlan {
    pub index: usize,
    /// Layer span covered by this group. Equal min/max when
    /// `group_parallel_rules` is set.
    pub layer_min: usize,
    pub layer_max: usize,
    pub rules: Vec<usize>,
}

/// Group invocation order. Groups run strictly sequentially; rules within a
/// group may run concurrently when `parallel_within_group` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorPlan {
    pub group_order: Vec<usize>,
    pub parallel_within_group: bool,
}
