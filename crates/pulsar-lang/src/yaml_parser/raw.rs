use std::collections::BTreeMap;

use serde::Deserialize;

use crate::ast::DurationMs;

// ---------------------------------------------------------------------------
// Raw YAML structure (intermediate representation)
// ---------------------------------------------------------------------------
//
// Strictness contract: condition and action blocks reject unknown fields;
// the document and rule levels are lenient; unknown keys are collected and
// surfaced as warnings.

#[derive(Debug, Deserialize)]
pub(super) struct RawRuleSet {
    pub schema_version: u32,
    pub rules: Vec<RawRule>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawRule {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub conditions: RawGroup,
    pub actions: Vec<RawAction>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawGroup {
    #[serde(default)]
    pub all: Vec<RawConditionEntry>,
    #[serde(default)]
    pub any: Vec<RawConditionEntry>,
}

/// A list element under `all:`/`any:`: either a `condition:` wrapper or a
/// nested group.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum RawConditionEntry {
    Wrapped(RawWrapped),
    Group(RawGroup),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawWrapped {
    pub condition: RawCondition,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub(super) enum RawCondition {
    Comparison {
        sensor: String,
        operator: String,
        value: f64,
    },
    Expression {
        expression: String,
    },
    ThresholdOverTime {
        sensor: String,
        threshold: f64,
        #[serde(alias = "duration")]
        duration_ms: DurationMs,
    },
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(super) enum RawAction {
    SetValue(RawSetValue),
    SendMessage(RawSendMessage),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawSetValue {
    pub key: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub value_expression: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawSendMessage {
    pub channel: String,
    pub message: String,
}
