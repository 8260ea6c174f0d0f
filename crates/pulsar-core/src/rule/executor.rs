use orion_error::prelude::*;

use pulsar_lang::plan::{ActionPlan, CondNode, ConditionPlan, RulePlan, ValueSource};

use crate::error::{CoreReason, CoreResult};
use crate::snapshot::Snapshot;
use crate::temporal::TemporalStore;

use super::eval::{eval_bool, eval_number};

// ---------------------------------------------------------------------------
// RuleOutcome
// ---------------------------------------------------------------------------

/// What one rule did this cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// Conditions did not hold (including the absent-sensor and NaN cases).
    NotFired,
    /// Conditions held and every action evaluated.
    Fired {
        /// `(sensor, value)` in action order, already applied to the
        /// snapshot.
        writes: Vec<(String, f64)>,
        /// `(channel, message)` in action order.
        messages: Vec<(String, String)>,
    },
}

// ---------------------------------------------------------------------------
// execute_rule
// ---------------------------------------------------------------------------

/// Evaluate one compiled rule against the working snapshot.
///
/// Condition groups short-circuit: `all` stops at the first false member,
/// `any` at the first true one. When the conditions hold, actions run in
/// source order; their writes become visible in the snapshot immediately
/// (later actions and groups observe them) and are returned for the
/// end-of-cycle flush. A fault anywhere discards the whole rule's
/// outputs; writes already applied are rolled back.
pub fn execute_rule(
    rule: &RulePlan,
    snapshot: &mut Snapshot,
    buffers: &TemporalStore,
) -> CoreResult<RuleOutcome> {
    let fired = eval_group(rule, &rule.condition, snapshot, buffers)?;
    if !fired {
        return Ok(RuleOutcome::NotFired);
    }

    let mut writes: Vec<(String, f64)> = Vec::new();
    let mut messages: Vec<(String, String)> = Vec::new();
    // Prior values of overwritten keys, so a fault can discard the rule's
    // outputs after some writes already landed in the snapshot.
    let mut undo: Vec<(String, Option<crate::value::Value>)> = Vec::new();

    for action in &rule.actions {
        match action {
            ActionPlan::SetValue { key, value } => {
                match eval_value(rule, key, value, snapshot) {
                    Ok(v) => {
                        undo.push((key.clone(), snapshot.get(key).cloned()));
                        snapshot.set_number(key, v);
                        writes.push((key.clone(), v));
                    }
                    Err(e) => {
                        for (key, prior) in undo.into_iter().rev() {
                            snapshot.restore(&key, prior);
                        }
                        return Err(e);
                    }
                }
            }
            ActionPlan::Publish { channel, message } => {
                messages.push((channel.clone(), message.clone()));
            }
        }
    }

    Ok(RuleOutcome::Fired { writes, messages })
}

/// Evaluate a `set_value` source against the current snapshot, which at
/// this point already includes writes from earlier layers and from this
/// rule's earlier actions.
fn eval_value(
    rule: &RulePlan,
    key: &str,
    value: &ValueSource,
    snapshot: &Snapshot,
) -> CoreResult<f64> {
    match value {
        ValueSource::Literal(v) => Ok(*v),
        ValueSource::Expr(expr) => match eval_number(expr, snapshot) {
            Ok(Some(v)) => Ok(v),
            Ok(None) => StructError::from(CoreReason::Action)
                .with_detail(format!(
                    "rule `{}`: value_expression for `{key}` references an absent sensor",
                    rule.name
                ))
                .err(),
            Err(fault) => StructError::from(CoreReason::Action)
                .with_detail(format!(
                    "rule `{}`: value_expression for `{key}`: {fault}",
                    rule.name
                ))
                .err(),
        },
    }
}

// ---------------------------------------------------------------------------
// Condition evaluation
// ---------------------------------------------------------------------------

fn eval_group(
    rule: &RulePlan,
    group: &ConditionPlan,
    snapshot: &Snapshot,
    buffers: &TemporalStore,
) -> CoreResult<bool> {
    for cond in &group.all {
        if !eval_condition(rule, cond, snapshot, buffers)? {
            return Ok(false);
        }
    }
    if group.any.is_empty() {
        return Ok(true);
    }
    for cond in &group.any {
        if eval_condition(rule, cond, snapshot, buffers)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn eval_condition(
    rule: &RulePlan,
    cond: &CondNode,
    snapshot: &Snapshot,
    buffers: &TemporalStore,
) -> CoreResult<bool> {
    match cond {
        CondNode::Compare { sensor, op, value } => {
            // Absent or non-numeric sensors make the comparison false.
            let Some(current) = snapshot.get_number(sensor) else {
                return Ok(false);
            };
            if current.is_nan() {
                return Ok(false);
            }
            Ok(op.holds(current, *value))
        }
        CondNode::Expr { expr } => match eval_bool(expr, snapshot) {
            Ok(Some(b)) => Ok(b),
            Ok(None) => Ok(false),
            Err(fault) => StructError::from(CoreReason::Eval)
                .with_detail(format!("rule `{}`: {fault}", rule.name))
                .err(),
        },
        CondNode::ThresholdOverTime {
            sensor,
            threshold,
            duration_ms,
        } => Ok(buffers.threshold_maintained(sensor, *threshold, *duration_ms)),
        CondNode::Group(inner) => eval_group(rule, inner, snapshot, buffers),
    }
}
