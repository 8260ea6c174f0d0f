mod provenance;
mod raw;


use std::fmt;
use std::path::Path;

use crate::ast::{
    Action, CmpOp, Condition, ConditionGroup, Provenance, Rule, RuleSet, ValueSpec,
};

use provenance::LineScanner;
use raw::{RawAction, RawCondition, RawConditionEntry, RawGroup, RawRuleSet};

// ---------------------------------------------------------------------------
// DslError
// ---------------------------------------------------------------------------

/// Error surfaced to rule authors, carrying source position where the YAML
/// layer provides one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DslError {
    /// Malformed YAML: the document could not be scanned at all.
    Parse {
        path: String,
        line: u32,
        column: u32,
        detail: String,
    },
    /// Well-formed YAML with the wrong shape (missing/unknown/ill-typed
    /// fields).
    Schema {
        path: String,
        line: Option<u32>,
        detail: String,
    },
}

impl fmt::Display for DslError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse {
                path,
                line,
                column,
                detail,
            } => write!(f, "{path}:{line}:{column}: {detail}"),
            Self::Schema {
                path,
                line: Some(line),
                detail,
            } => write!(f, "{path}:{line}: {detail}"),
            Self::Schema {
                path,
                line: None,
                detail,
            } => write!(f, "{path}: {detail}"),
        }
    }
}

impl std::error::Error for DslError {}

/// A non-fatal observation made while parsing (unknown top-level or rule
/// fields, which are preserved but reported).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Parse a rules document from text, attributing line provenance to every
/// rule, condition, and action.
pub fn parse_rule_set(
    path: impl AsRef<Path>,
    text: &str,
) -> Result<(RuleSet, Vec<ParseWarning>), DslError> {
    let path = path.as_ref().display().to_string();

    // Pass 1: YAML well-formedness. Scanner errors carry a location.
    let value: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| parse_error(&path, &e))?;

    // Pass 2: document shape.
    let raw: RawRuleSet = serde_yaml::from_value(value).map_err(|e| DslError::Schema {
        path: path.clone(),
        line: e.location().map(|l| l.line() as u32),
        detail: e.to_string(),
    })?;

    let mut warnings = Vec::new();
    for key in raw.extra.keys() {
        warnings.push(ParseWarning {
            path: path.clone(),
            message: format!("unknown top-level field `{key}` ignored"),
        });
    }

    let mut scanner = LineScanner::new(text);
    let mut rules = Vec::with_capacity(raw.rules.len());
    for raw_rule in raw.rules {
        for key in raw_rule.extra.keys() {
            warnings.push(ParseWarning {
                path: path.clone(),
                message: format!(
                    "rule `{}`: unknown field `{key}` ignored",
                    raw_rule.name
                ),
            });
        }

        let line = scanner.find_entry("name", &raw_rule.name);
        let conditions = convert_group(&path, raw_rule.conditions, &mut scanner)?;
        let actions = raw_rule
            .actions
            .into_iter()
            .map(|a| convert_action(&path, a, &mut scanner))
            .collect::<Result<Vec<_>, _>>()?;

        rules.push(Rule {
            name: raw_rule.name,
            description: raw_rule.description,
            conditions,
            actions,
            provenance: Provenance {
                file: path.clone(),
                line,
            },
        });
    }

    Ok((
        RuleSet {
            schema_version: raw.schema_version,
            rules,
        },
        warnings,
    ))
}

/// Read and parse a rules file.
pub fn load_rule_set(path: impl AsRef<Path>) -> anyhow::Result<(RuleSet, Vec<ParseWarning>)> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    parse_rule_set(path, &text).map_err(Into::into)
}

fn parse_error(path: &str, e: &serde_yaml::Error) -> DslError {
    let (line, column) = e
        .location()
        .map(|l| (l.line() as u32, l.column() as u32))
        .unwrap_or((0, 0));
    DslError::Parse {
        path: path.to_string(),
        line,
        column,
        detail: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Raw → AST conversion
// ---------------------------------------------------------------------------

fn convert_group(
    path: &str,
    raw: RawGroup,
    scanner: &mut LineScanner<'_>,
) -> Result<ConditionGroup, DslError> {
    let all = raw
        .all
        .into_iter()
        .map(|e| convert_entry(path, e, scanner))
        .collect::<Result<Vec<_>, _>>()?;
    let any = raw
        .any
        .into_iter()
        .map(|e| convert_entry(path, e, scanner))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ConditionGroup { all, any })
}

fn convert_entry(
    path: &str,
    entry: RawConditionEntry,
    scanner: &mut LineScanner<'_>,
) -> Result<Condition, DslError> {
    match entry {
        RawConditionEntry::Wrapped(wrapped) => convert_condition(path, wrapped.condition, scanner),
        RawConditionEntry::Group(group) => {
            Ok(Condition::Group(convert_group(path, group, scanner)?))
        }
    }
}

fn convert_condition(
    path: &str,
    raw: RawCondition,
    scanner: &mut LineScanner<'_>,
) -> Result<Condition, DslError> {
    match raw {
        RawCondition::Comparison {
            sensor,
            operator,
            value,
        } => {
            let line = scanner.find_entry("type", "comparison");
            let op = CmpOp::parse(&operator).ok_or_else(|| DslError::Schema {
                path: path.to_string(),
                line: Some(line),
                detail: format!("unknown comparison operator `{operator}`"),
            })?;
            Ok(Condition::Comparison {
                sensor,
                op,
                value,
                line,
            })
        }
        RawCondition::Expression { expression } => {
            let line = scanner.find_entry("type", "expression");
            Ok(Condition::Expression {
                source: expression,
                line,
            })
        }
        RawCondition::ThresholdOverTime {
            sensor,
            threshold,
            duration_ms,
        } => {
            let line = scanner.find_entry("type", "threshold_over_time");
            Ok(Condition::ThresholdOverTime {
                sensor,
                threshold,
                duration: duration_ms,
                line,
            })
        }
    }
}

fn convert_action(
    path: &str,
    raw: RawAction,
    scanner: &mut LineScanner<'_>,
) -> Result<Action, DslError> {
    match raw {
        RawAction::SetValue(sv) => {
            let line = scanner.find_containing("set_value");
            let value = match (sv.value, sv.value_expression) {
                (Some(v), None) => ValueSpec::Literal(v),
                (None, Some(e)) => ValueSpec::Expression(e),
                (Some(_), Some(_)) => {
                    return Err(DslError::Schema {
                        path: path.to_string(),
                        line: Some(line),
                        detail: "set_value has both `value` and `value_expression`".to_string(),
                    });
                }
                // Neither present parses; the validator reports it with the
                // rule name attached.
                (None, None) => ValueSpec::Expression(String::new()),
            };
            Ok(Action::SetValue {
                key: sv.key,
                value,
                line,
            })
        }
        RawAction::SendMessage(sm) => {
            let line = scanner.find_containing("send_message");
            Ok(Action::SendMessage {
                channel: sm.channel,
                message: sm.message,
                line,
            })
        }
    }
}
