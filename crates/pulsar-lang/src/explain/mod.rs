mod display;
mod format;

#[cfg(test)]
mod tests;

use crate::manifest::Manifest;
use crate::plan::{CondNode, ConditionPlan, ExecutionPlan, RulePlan};

pub use format::{format_action, format_condition, format_expr};

// ---------------------------------------------------------------------------
// RuleExplanation
// ---------------------------------------------------------------------------

/// Human-readable explanation of one compiled rule, assembled from the
/// plan and the manifest. Consumed by the `explain` CLI command and by
/// documentation tooling.
#[derive(Debug)]
pub struct RuleExplanation {
    pub name: String,
    pub description: Option<String>,
    pub source: String,
    pub layer: usize,
    pub group: Option<usize>,
    /// Condition lines, indented to show all/any nesting.
    pub conditions: Vec<String>,
    pub actions: Vec<String>,
    pub depends_on: Vec<String>,
    pub reads: Vec<String>,
    pub writes: Vec<String>,
    /// `sensor > threshold over window` lines for temporal conditions.
    pub temporal: Vec<String>,
}

/// Build explanations for every rule in a compiled plan, in emission
/// order.
pub fn explain_plan(plan: &ExecutionPlan, manifest: &Manifest) -> Vec<RuleExplanation> {
    plan.rules
        .iter()
        .enumerate()
        .map(|(idx, rule)| explain_rule(plan, manifest, idx, rule))
        .collect()
}

fn explain_rule(
    plan: &ExecutionPlan,
    manifest: &Manifest,
    idx: usize,
    rule: &RulePlan,
) -> RuleExplanation {
    let group = plan
        .groups
        .iter()
        .find(|g| g.rules.contains(&idx))
        .map(|g| g.index);
    let entry = manifest.rules.get(&rule.name);

    let mut conditions = Vec::new();
    render_group(&rule.condition, 0, &mut conditions);

    RuleExplanation {
        name: rule.name.clone(),
        description: entry.and_then(|e| e.description.clone()),
        source: format!("{}:{}", rule.source_file, rule.source_line),
        layer: rule.layer,
        group,
        conditions,
        actions: rule.actions.iter().map(format::format_action).collect(),
        depends_on: entry.map(|e| e.dependencies.clone()).unwrap_or_default(),
        reads: rule.reads.clone(),
        writes: rule.writes.clone(),
        temporal: rule
            .temporal_reads
            .iter()
            .map(|t| {
                format!(
                    "{} > {} over {}",
                    t.sensor,
                    format::format_number(t.threshold),
                    crate::ast::DurationMs::from_millis(t.duration_ms)
                )
            })
            .collect(),
    }
}

/// Flatten a condition tree into indented lines, one leaf per line under
/// its `all`/`any` header.
fn render_group(group: &ConditionPlan, depth: usize, out: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    if !group.all.is_empty() {
        out.push(format!("{indent}all of:"));
        for node in &group.all {
            render_node(node, depth + 1, out);
        }
    }
    if !group.any.is_empty() {
        out.push(format!("{indent}any of:"));
        for node in &group.any {
            render_node(node, depth + 1, out);
        }
    }
}

fn render_node(node: &CondNode, depth: usize, out: &mut Vec<String>) {
    match node {
        CondNode::Group(inner) => render_group(inner, depth, out),
        leaf => out.push(format!("{}{}", "  ".repeat(depth), format::format_condition(leaf))),
    }
}
