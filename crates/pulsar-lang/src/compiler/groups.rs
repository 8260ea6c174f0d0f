use crate::plan::{CondNode, ConditionPlan, GroupPlan, RulePlan};

use super::PlanOptions;

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Split rules into execution groups, one layer at a time. Layers larger
/// than the caps split across multiple groups, preserving order.
pub(super) fn build_parallel(rules: &[RulePlan], opts: &PlanOptions) -> Vec<GroupPlan> {
    let mut groups = Vec::new();
    let mut start = 0;
    while start < rules.len() {
        let layer = rules[start].layer;
        let end = rules[start..]
            .iter()
            .position(|r| r.layer != layer)
            .map(|off| start + off)
            .unwrap_or(rules.len());
        chunk_into_groups(rules, start..end, opts, &mut groups);
        start = end;
    }
    groups
}

/// Split rules into groups that may span layers. Emission order already
/// places every producer before its consumers, so packing greedily keeps
/// the ordering guarantee.
pub(super) fn build_sequential(rules: &[RulePlan], opts: &PlanOptions) -> Vec<GroupPlan> {
    let mut groups = Vec::new();
    chunk_into_groups(rules, 0..rules.len(), opts, &mut groups);
    groups
}

fn chunk_into_groups(
    rules: &[RulePlan],
    range: std::ops::Range<usize>,
    opts: &PlanOptions,
    groups: &mut Vec<GroupPlan>,
) {
    let mut members: Vec<usize> = Vec::new();
    let mut lines = 0usize;

    for idx in range {
        let cost = rule_cost(&rules[idx]);
        let would_overflow = !members.is_empty()
            && (members.len() >= opts.max_rules_per_group
                || lines + cost > opts.max_lines_per_group);
        if would_overflow {
            push_group(rules, std::mem::take(&mut members), groups);
            lines = 0;
        }
        members.push(idx);
        lines += cost;
    }
    if !members.is_empty() {
        push_group(rules, members, groups);
    }
}

fn push_group(rules: &[RulePlan], members: Vec<usize>, groups: &mut Vec<GroupPlan>) {
    let layer_min = members.iter().map(|&i| rules[i].layer).min().unwrap_or(0);
    let layer_max = members.iter().map(|&i| rules[i].layer).max().unwrap_or(0);
    groups.push(GroupPlan {
        index: groups.len(),
        layer_min,
        layer_max,
        rules: members,
    });
}

/// Emitted-size estimate for one rule: condition nodes + actions +
/// temporal touches, plus fixed dispatch overhead.
pub(super) fn rule_cost(rule: &RulePlan) -> usize {
    condition_nodes(&rule.condition) + rule.actions.len() + rule.temporal_reads.len() + 2
}

fn condition_nodes(plan: &ConditionPlan) -> usize {
    plan.all
        .iter()
        .chain(plan.any.iter())
        .map(|node| match node {
            CondNode::Group(inner) => 1 + condition_nodes(inner),
            _ => 1,
        })
        .sum()
}
