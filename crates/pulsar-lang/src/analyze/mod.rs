mod graph;


use std::collections::BTreeSet;
use std::fmt;

use crate::ast::{Action, Condition, ConditionGroup, Rule, RuleSet, ValueSpec};
use crate::expr;

pub use graph::find_cycles;

/// Producer chains longer than this are flagged as warnings.
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 10;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Per-rule analysis results, parallel to the rule set's rule order.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMeta {
    pub name: String,
    pub layer: usize,
    pub inputs: BTreeSet<String>,
    pub outputs: BTreeSet<String>,
    /// Direct producer rules (rules writing a sensor this rule reads).
    pub producers: BTreeSet<String>,
    /// Transitive closure of `producers`.
    pub transitive_producers: BTreeSet<String>,
    pub uses_temporal: bool,
}

/// Topologically layered rule set. `layers[n]` holds indices (into the
/// original rule order) of rules at producer-depth `n`, sorted by
/// `(source_file, line, name)` for deterministic output.
#[derive(Debug, Clone, PartialEq)]
pub struct LayeredPlan {
    pub layers: Vec<Vec<usize>>,
    pub meta: Vec<RuleMeta>,
    pub warnings: Vec<AnalyzerWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerWarning {
    /// More than one rule writes the same sensor. The group-order last
    /// writer wins at runtime; both rules count as producers for
    /// dependency purposes.
    DuplicateProducer { sensor: String, rules: Vec<String> },
    /// A producer chain exceeds the configured depth.
    DeepDependencyChain { chain: Vec<String> },
}

impl fmt::Display for AnalyzerWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateProducer { sensor, rules } => write!(
                f,
                "sensor `{sensor}` is written by multiple rules ({}); last writer in group order wins",
                rules.join(", ")
            ),
            Self::DeepDependencyChain { chain } => write!(
                f,
                "dependency chain of depth {} exceeds the configured maximum: {}",
                chain.len(),
                chain.join(" -> ")
            ),
        }
    }
}

/// Cyclic producer/consumer relationships. Every distinct cycle found is
/// reported, each as the ordered list of rule names around the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyError {
    pub cycles: Vec<Vec<String>>,
}

impl fmt::Display for DependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rule dependency cycle(s) detected:")?;
        for cycle in &self.cycles {
            let mut closed = cycle.clone();
            if let Some(first) = cycle.first() {
                closed.push(first.clone());
            }
            writeln!(f, "  {}", closed.join(" -> "))?;
        }
        Ok(())
    }
}

impl std::error::Error for DependencyError {}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

/// Discover inter-rule data flow through shared sensors, reject cycles,
/// and assign layers. O(N + E) over rule count and producer edges.
pub fn analyze(set: &RuleSet, max_chain_depth: usize) -> Result<LayeredPlan, DependencyError> {
    let n = set.rules.len();
    let mut warnings = Vec::new();

    let inputs: Vec<BTreeSet<String>> = set.rules.iter().map(collect_inputs).collect();
    let outputs: Vec<BTreeSet<String>> = set.rules.iter().map(collect_outputs).collect();

    // producers: sensor -> rule indices, in rule order.
    let mut producers: std::collections::BTreeMap<&str, Vec<usize>> = Default::default();
    for (idx, outs) in outputs.iter().enumerate() {
        for sensor in outs {
            producers.entry(sensor.as_str()).or_default().push(idx);
        }
    }
    for (sensor, rules) in &producers {
        if rules.len() > 1 {
            warnings.push(AnalyzerWarning::DuplicateProducer {
                sensor: sensor.to_string(),
                rules: rules.iter().map(|&i| set.rules[i].name.clone()).collect(),
            });
        }
    }

    // Edges: producer rule -> consumer rule. Self-production is not a
    // dependency.
    let mut producers_of: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    let mut consumers_of: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    for (consumer, ins) in inputs.iter().enumerate() {
        for sensor in ins {
            if let Some(rules) = producers.get(sensor.as_str()) {
                for &producer in rules {
                    if producer != consumer {
                        producers_of[consumer].insert(producer);
                        consumers_of[producer].insert(consumer);
                    }
                }
            }
        }
    }

    let cycles = graph::find_cycles(&consumers_of);
    if !cycles.is_empty() {
        return Err(DependencyError {
            cycles: cycles
                .into_iter()
                .map(|cycle| cycle.into_iter().map(|i| set.rules[i].name.clone()).collect())
                .collect(),
        });
    }

    let layer = graph::assign_layers(&producers_of, &consumers_of);
    let transitive = transitive_producers(set, &producers_of, &layer);

    // Group indices by layer with a deterministic in-layer order.
    let layer_count = layer.iter().copied().max().map_or(0, |max| max + 1);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); layer_count];
    for (idx, &l) in layer.iter().enumerate() {
        layers[l].push(idx);
    }
    for bucket in &mut layers {
        bucket.sort_by(|&a, &b| tie_break_key(&set.rules[a]).cmp(&tie_break_key(&set.rules[b])));
    }

    deep_chain_warnings(
        set,
        &producers_of,
        &consumers_of,
        &layer,
        max_chain_depth,
        &mut warnings,
    );

    let meta = (0..n)
        .map(|idx| RuleMeta {
            name: set.rules[idx].name.clone(),
            layer: layer[idx],
            inputs: inputs[idx].clone(),
            outputs: outputs[idx].clone(),
            producers: producers_of[idx]
                .iter()
                .map(|&p| set.rules[p].name.clone())
                .collect(),
            transitive_producers: transitive[idx].clone(),
            uses_temporal: uses_temporal(&set.rules[idx].conditions),
        })
        .collect();

    Ok(LayeredPlan {
        layers,
        meta,
        warnings,
    })
}

fn tie_break_key(rule: &Rule) -> (&str, u32, &str) {
    (&rule.provenance.file, rule.provenance.line, &rule.name)
}

// ---------------------------------------------------------------------------
// Sensor collection
// ---------------------------------------------------------------------------

/// Sensors a rule reads: every condition reference plus value-expression
/// references, so the cycle snapshot covers action evaluation too.
pub fn collect_inputs(rule: &Rule) -> BTreeSet<String> {
    let mut inputs = BTreeSet::new();
    collect_group_inputs(&rule.conditions, &mut inputs);
    for action in &rule.actions {
        if let Action::SetValue {
            value: ValueSpec::Expression(source),
            ..
        } = action
            && let Ok(parsed) = expr::parse_expr(source)
        {
            inputs.extend(expr::referenced_sensors(&parsed));
        }
    }
    inputs
}

fn collect_group_inputs(group: &ConditionGroup, inputs: &mut BTreeSet<String>) {
    for cond in group.all.iter().chain(group.any.iter()) {
        match cond {
            Condition::Comparison { sensor, .. } | Condition::ThresholdOverTime { sensor, .. } => {
                inputs.insert(sensor.clone());
            }
            Condition::Expression { source, .. } => {
                if let Ok(parsed) = expr::parse_expr(source) {
                    inputs.extend(expr::referenced_sensors(&parsed));
                }
            }
            Condition::Group(inner) => collect_group_inputs(inner, inputs),
        }
    }
}

/// Sensors a rule writes via `set_value`.
pub fn collect_outputs(rule: &Rule) -> BTreeSet<String> {
    rule.actions
        .iter()
        .filter_map(|a| match a {
            Action::SetValue { key, .. } => Some(key.clone()),
            Action::SendMessage { .. } => None,
        })
        .collect()
}

fn uses_temporal(group: &ConditionGroup) -> bool {
    group.all.iter().chain(group.any.iter()).any(|c| match c {
        Condition::ThresholdOverTime { .. } => true,
        Condition::Group(inner) => uses_temporal(inner),
        _ => false,
    })
}

// ---------------------------------------------------------------------------
// Transitive producers & deep chains
// ---------------------------------------------------------------------------

fn transitive_producers(
    set: &RuleSet,
    producers_of: &[BTreeSet<usize>],
    layer: &[usize],
) -> Vec<BTreeSet<String>> {
    let n = producers_of.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| layer[i]);

    let mut transitive: Vec<BTreeSet<String>> = vec![BTreeSet::new(); n];
    for idx in order {
        let mut acc = BTreeSet::new();
        for &p in &producers_of[idx] {
            acc.insert(set.rules[p].name.clone());
            acc.extend(transitive[p].iter().cloned());
        }
        transitive[idx] = acc;
    }
    transitive
}

fn deep_chain_warnings(
    set: &RuleSet,
    producers_of: &[BTreeSet<usize>],
    consumers_of: &[BTreeSet<usize>],
    layer: &[usize],
    max_chain_depth: usize,
    warnings: &mut Vec<AnalyzerWarning>,
) {
    for idx in 0..set.rules.len() {
        // Only chain tips warn, so a single long chain yields one finding.
        if layer[idx] + 1 <= max_chain_depth || !consumers_of[idx].is_empty() {
            continue;
        }
        let mut chain = vec![idx];
        let mut cursor = idx;
        while layer[cursor] > 0 {
            let Some(&next) = producers_of[cursor]
                .iter()
                .find(|&&p| layer[p] + 1 == layer[cursor])
            else {
                break;
            };
            chain.push(next);
            cursor = next;
        }
        chain.reverse();
        warnings.push(AnalyzerWarning::DeepDependencyChain {
            chain: chain.into_iter().map(|i| set.rules[i].name.clone()).collect(),
        });
    }
}
