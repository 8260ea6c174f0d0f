use std::collections::{BTreeSet, HashSet};

use crate::ast::{Action, Condition, ConditionGroup, Rule, RuleSet, ValueSpec};
use crate::expr;

use super::{CheckError, Severity};

pub(super) fn check_unique_names(set: &RuleSet, errors: &mut Vec<CheckError>) {
    let mut seen = HashSet::new();
    for rule in &set.rules {
        if !seen.insert(rule.name.as_str()) {
            errors.push(CheckError {
                severity: Severity::Error,
                rule: Some(rule.name.clone()),
                line: Some(rule.provenance.line),
                message: "duplicate rule name".to_string(),
            });
        }
    }
}

/// Check a single rule: structure, sensor references, operators, durations,
/// expressions, action fields.
pub(super) fn check_rule(
    rule: &Rule,
    valid_sensors: &BTreeSet<String>,
    errors: &mut Vec<CheckError>,
) {
    let name = &rule.name;

    if rule.conditions.is_empty() {
        errors.push(error(
            name,
            Some(rule.provenance.line),
            "must have at least one condition in `all` or `any`",
        ));
    }
    if rule.actions.is_empty() {
        errors.push(error(
            name,
            Some(rule.provenance.line),
            "must have at least one action",
        ));
    }

    check_group(name, &rule.conditions, valid_sensors, errors);
    for action in &rule.actions {
        check_action(name, action, valid_sensors, errors);
    }
}

fn check_group(
    name: &str,
    group: &ConditionGroup,
    valid_sensors: &BTreeSet<String>,
    errors: &mut Vec<CheckError>,
) {
    for cond in group.all.iter().chain(group.any.iter()) {
        check_condition(name, cond, valid_sensors, errors);
    }
}

fn check_condition(
    name: &str,
    cond: &Condition,
    valid_sensors: &BTreeSet<String>,
    errors: &mut Vec<CheckError>,
) {
    match cond {
        Condition::Comparison { sensor, line, .. } => {
            check_sensor(name, sensor, *line, valid_sensors, errors);
        }
        Condition::Expression { source, line } => {
            let report = expr::analyze(source);
            for msg in &report.errors {
                errors.push(error(name, Some(*line), msg));
            }
            if report.is_valid() && !report.is_boolean {
                errors.push(error(
                    name,
                    Some(*line),
                    &format!("condition expression must contain a comparison: `{source}`"),
                ));
            }
            for sensor in &report.referenced_sensors {
                check_sensor(name, sensor, *line, valid_sensors, errors);
            }
        }
        Condition::ThresholdOverTime {
            sensor,
            duration,
            line,
            ..
        } => {
            check_sensor(name, sensor, *line, valid_sensors, errors);
            if duration.as_millis() == 0 {
                errors.push(error(
                    name,
                    Some(*line),
                    "threshold_over_time duration must be greater than zero",
                ));
            }
        }
        Condition::Group(inner) => {
            check_group(name, inner, valid_sensors, errors);
        }
    }
}

fn check_action(
    name: &str,
    action: &Action,
    valid_sensors: &BTreeSet<String>,
    errors: &mut Vec<CheckError>,
) {
    match action {
        Action::SetValue { key, value, line } => {
            if key.trim().is_empty() {
                errors.push(error(name, Some(*line), "set_value key must be non-empty"));
            } else if !valid_sensors.contains(key) {
                // Writes to sensors outside the configured universe still
                // run; readers cannot legally reference them.
                errors.push(CheckError {
                    severity: Severity::Warning,
                    rule: Some(name.to_string()),
                    line: Some(*line),
                    message: format!("set_value key `{key}` is not in valid_sensors"),
                });
            }
            if let ValueSpec::Expression(source) = value {
                if source.trim().is_empty() {
                    errors.push(error(
                        name,
                        Some(*line),
                        "set_value must specify `value` or a non-empty `value_expression`",
                    ));
                    return;
                }
                let report = expr::analyze(source);
                for msg in &report.errors {
                    errors.push(error(name, Some(*line), msg));
                }
                if report.is_valid() && report.is_boolean {
                    errors.push(error(
                        name,
                        Some(*line),
                        &format!("value_expression must be arithmetic, not boolean: `{source}`"),
                    ));
                }
                for sensor in &report.referenced_sensors {
                    check_sensor(name, sensor, *line, valid_sensors, errors);
                }
            }
        }
        Action::SendMessage {
            channel,
            message,
            line,
        } => {
            if channel.trim().is_empty() {
                errors.push(error(
                    name,
                    Some(*line),
                    "send_message channel must be non-empty",
                ));
            }
            if message.is_empty() {
                errors.push(error(
                    name,
                    Some(*line),
                    "send_message message must be non-empty",
                ));
            }
        }
    }
}

fn check_sensor(
    name: &str,
    sensor: &str,
    line: u32,
    valid_sensors: &BTreeSet<String>,
    errors: &mut Vec<CheckError>,
) {
    if !valid_sensors.contains(sensor) {
        errors.push(error(
            name,
            Some(line),
            &format!("unknown sensor `{sensor}`"),
        ));
    }
}

fn error(rule: &str, line: Option<u32>, message: &str) -> CheckError {
    CheckError {
        severity: Severity::Error,
        rule: Some(rule.to_string()),
        line,
        message: message.to_string(),
    }
}
