mod rules;


use std::collections::BTreeSet;

use crate::ast::RuleSet;

/// Rule-set schema versions this compiler understands.
pub const SUPPORTED_SCHEMA_VERSIONS: &[u32] = &[1];

/// Severity of a semantic check finding. Warnings never abort compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Semantic check finding with optional rule context and source line.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckError {
    pub severity: Severity,
    pub rule: Option<String>,
    pub line: Option<u32>,
    pub message: String,
}

impl std::fmt::Display for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(line) = self.line {
            write!(f, "line {line}: ")?;
        }
        match &self.rule {
            Some(r) => write!(f, "rule `{}`: {}", r, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Perform all semantic checks on a parsed rule set against the configured
/// sensor universe. Findings are collected, never fail-fast, so one compile
/// pass reports every structural issue. Returns an empty Vec when all
/// checks pass.
pub fn check_rule_set(set: &RuleSet, valid_sensors: &BTreeSet<String>) -> Vec<CheckError> {
    let mut errors = Vec::new();

    if !SUPPORTED_SCHEMA_VERSIONS.contains(&set.schema_version) {
        errors.push(CheckError {
            severity: Severity::Error,
            rule: None,
            line: None,
            message: format!(
                "unsupported schema_version {} (supported: {:?})",
                set.schema_version, SUPPORTED_SCHEMA_VERSIONS
            ),
        });
    }

    rules::check_unique_names(set, &mut errors);
    for rule in &set.rules {
        rules::check_rule(rule, valid_sensors, &mut errors);
    }

    errors
}

/// Convenience partition: (errors, warnings).
pub fn split_by_severity(findings: Vec<CheckError>) -> (Vec<CheckError>, Vec<CheckError>) {
    findings
        .into_iter()
        .partition(|e| e.severity == Severity::Error)
}
