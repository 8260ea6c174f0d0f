mod emit;
mod groups;


use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::analyze::{self, DEFAULT_MAX_CHAIN_DEPTH, DependencyError, LayeredPlan};
use crate::ast::{Action, Condition, ConditionGroup, Rule, RuleSet, ValueSpec};
use crate::checker::{self, CheckError, Severity};
use crate::expr;
use crate::manifest::{Manifest, ManifestHeader, ManifestRule};
use crate::plan::{
    ActionPlan, CondNode, ConditionPlan, CoordinatorPlan, ExecutionPlan, RulePlan, TemporalRead,
    ValueSource,
};

pub use emit::{MANIFEST_FILE_NAME, PLAN_FILE_NAME, write_artifacts};

// ---------------------------------------------------------------------------
// Options & results
// ---------------------------------------------------------------------------

/// Size caps and policy knobs for plan generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOptions {
    pub max_rules_per_group: usize,
    pub max_lines_per_group: usize,
    /// When true, a group draws rules from a single layer; when false,
    /// groups may span layers as long as producers precede consumers.
    pub group_parallel_rules: bool,
    pub max_chain_depth: usize,
    /// Runtime defaults stamped into the emitted plan, taken from the
    /// system configuration.
    pub cycle_time_ms: u64,
    pub buffer_capacity: usize,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            max_rules_per_group: 100,
            max_lines_per_group: 400,
            group_parallel_rules: true,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            cycle_time_ms: 100,
            buffer_capacity: 100,
        }
    }
}

/// Why compilation was aborted. Both variants carry every finding so a
/// single pass reports all problems.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileFailure {
    Validation(Vec<CheckError>),
    Dependency(DependencyError),
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(errors) => {
                writeln!(f, "{} validation error(s):", errors.len())?;
                for e in errors {
                    writeln!(f, "  {e}")?;
                }
                Ok(())
            }
            Self::Dependency(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for CompileFailure {}

/// A successful compilation: the plan, its manifest, and any non-fatal
/// findings (duplicate producers, deep chains, unknown output sensors).
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    pub plan: ExecutionPlan,
    pub manifest: Manifest,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// compile
// ---------------------------------------------------------------------------

/// Compile a parsed rule set into an execution plan and manifest.
///
/// Validation runs first and aborts with every finding; the dependency
/// analyzer then layers the rules or aborts with every cycle. A successful
/// return implies the rule set was fully valid, so callers never invoke the
/// checker separately.
///
/// `generated_at` stamps the manifest header; passing a fixed instant makes
/// the output byte-identical across runs for identical inputs.
pub fn compile(
    set: &RuleSet,
    valid_sensors: &BTreeSet<String>,
    opts: &PlanOptions,
    generated_at: DateTime<Utc>,
) -> Result<CompileOutput, CompileFailure> {
    let findings = checker::check_rule_set(set, valid_sensors);
    let (errors, check_warnings) = checker::split_by_severity(findings);
    if !errors.is_empty() {
        return Err(CompileFailure::Validation(errors));
    }

    let layered = analyze::analyze(set, opts.max_chain_depth)
        .map_err(CompileFailure::Dependency)?;

    let mut warnings: Vec<String> = check_warnings.iter().map(|w| w.to_string()).collect();
    warnings.extend(layered.warnings.iter().map(|w| w.to_string()));

    // Emission order: layer by layer, tie-break order within each.
    let order: Vec<usize> = layered.layers.iter().flatten().copied().collect();

    let mut rules = Vec::with_capacity(order.len());
    for &idx in &order {
        rules.push(lower_rule(&set.rules[idx], &layered, idx)?);
    }

    let groups = if opts.group_parallel_rules {
        groups::build_parallel(&rules, opts)
    } else {
        groups::build_sequential(&rules, opts)
    };
    let coordinator = CoordinatorPlan {
        group_order: (0..groups.len()).collect(),
        parallel_within_group: opts.group_parallel_rules,
    };

    let input_sensors: BTreeSet<String> = rules.iter().flat_map(|r| r.reads.clone()).collect();
    let temporal_sensors: BTreeSet<String> = rules
        .iter()
        .flat_map(|r| r.temporal_reads.iter().map(|t| t.sensor.clone()))
        .collect();

    let layer_count = layered.layers.len();
    let plan = ExecutionPlan {
        schema_version: set.schema_version,
        cycle_time_ms: opts.cycle_time_ms,
        buffer_capacity: opts.buffer_capacity,
        rules,
        groups,
        coordinator,
        input_sensors: input_sensors.into_iter().collect(),
        temporal_sensors: temporal_sensors.into_iter().collect(),
        layer_count,
    };

    let manifest = build_manifest(set, &layered, &order, &plan, generated_at);

    Ok(CompileOutput {
        plan,
        manifest,
        warnings,
    })
}

// ---------------------------------------------------------------------------
// Rule lowering
// ---------------------------------------------------------------------------

fn lower_rule(
    rule: &Rule,
    layered: &LayeredPlan,
    idx: usize,
) -> Result<RulePlan, CompileFailure> {
    let meta = &layered.meta[idx];
    let condition = lower_group(&rule.name, &rule.conditions)?;

    let mut temporal_reads = Vec::new();
    collect_temporal(&rule.conditions, &mut temporal_reads);

    let actions = rule
        .actions
        .iter()
        .map(|a| lower_action(&rule.name, a))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RulePlan {
        name: rule.name.clone(),
        layer: meta.layer,
        condition,
        actions,
        reads: meta.inputs.iter().cloned().collect(),
        writes: meta.outputs.iter().cloned().collect(),
        temporal_reads,
        source_file: rule.provenance.file.clone(),
        source_line: rule.provenance.line,
    })
}

fn lower_group(rule: &str, group: &ConditionGroup) -> Result<ConditionPlan, CompileFailure> {
    Ok(ConditionPlan {
        all: group
            .all
            .iter()
            .map(|c| lower_condition(rule, c))
            .collect::<Result<_, _>>()?,
        any: group
            .any
            .iter()
            .map(|c| lower_condition(rule, c))
            .collect::<Result<_, _>>()?,
    })
}

fn lower_condition(rule: &str, cond: &Condition) -> Result<CondNode, CompileFailure> {
    match cond {
        Condition::Comparison {
            sensor, op, value, ..
        } => Ok(CondNode::Compare {
            sensor: sensor.clone(),
            op: *op,
            value: *value,
        }),
        Condition::Expression { source, line } => Ok(CondNode::Expr {
            expr: lower_expr(rule, source, *line)?,
        }),
        Condition::ThresholdOverTime {
            sensor,
            threshold,
            duration,
            ..
        } => Ok(CondNode::ThresholdOverTime {
            sensor: sensor.clone(),
            threshold: *threshold,
            duration_ms: duration.as_millis(),
        }),
        Condition::Group(inner) => Ok(CondNode::Group(lower_group(rule, inner)?)),
    }
}

fn lower_action(rule: &str, action: &Action) -> Result<ActionPlan, CompileFailure> {
    match action {
        Action::SetValue { key, value, line } => {
            let value = match value {
                ValueSpec::Literal(v) => ValueSource::Literal(*v),
                ValueSpec::Expression(source) => {
                    ValueSource::Expr(lower_expr(rule, source, *line)?)
                }
            };
            Ok(ActionPlan::SetValue {
                key: key.clone(),
                value,
            })
        }
        Action::SendMessage {
            channel, message, ..
        } => Ok(ActionPlan::Publish {
            channel: channel.clone(),
            message: message.clone(),
        }),
    }
}

/// Parse an expression string into the tree carried by the plan. The
/// checker has already accepted it; a failure here is still reported as a
/// validation error rather than panicking.
fn lower_expr(rule: &str, source: &str, line: u32) -> Result<crate::ast::Expr, CompileFailure> {
    expr::parse_expr(source).map_err(|msg| {
        CompileFailure::Validation(vec![CheckError {
            severity: Severity::Error,
            rule: Some(rule.to_string()),
            line: Some(line),
            message: msg,
        }])
    })
}

fn collect_temporal(group: &ConditionGroup, out: &mut Vec<TemporalRead>) {
    for cond in group.all.iter().chain(group.any.iter()) {
        match cond {
            Condition::ThresholdOverTime {
                sensor,
                threshold,
                duration,
                ..
            } => out.push(TemporalRead {
                sensor: sensor.clone(),
                threshold: *threshold,
                duration_ms: duration.as_millis(),
            }),
            Condition::Group(inner) => collect_temporal(inner, out),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Manifest assembly
// ---------------------------------------------------------------------------

fn build_manifest(
    set: &RuleSet,
    layered: &LayeredPlan,
    order: &[usize],
    plan: &ExecutionPlan,
    generated_at: DateTime<Utc>,
) -> Manifest {
    let mut rules = BTreeMap::new();
    for &idx in order {
        let rule = &set.rules[idx];
        let meta = &layered.meta[idx];
        rules.insert(
            rule.name.clone(),
            ManifestRule {
                name: rule.name.clone(),
                source_file: rule.provenance.file.clone(),
                source_line: rule.provenance.line,
                layer: meta.layer,
                description: rule.description.clone(),
                dependencies: meta.producers.iter().cloned().collect(),
                input_sensors: meta.inputs.iter().cloned().collect(),
                output_sensors: meta.outputs.iter().cloned().collect(),
                uses_temporal: meta.uses_temporal,
            },
        );
    }

    Manifest {
        header: ManifestHeader {
            schema_version: set.schema_version,
            generated_at_utc: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            total_rules: set.rules.len(),
            layer_count: plan.layer_count,
        },
        rules,
    }
}
