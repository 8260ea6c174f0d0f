use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};

use super::*;
use crate::compiler::{PlanOptions, compile};
use crate::expr::parse_expr;
use crate::yaml_parser::parse_rule_set;

const RULES: &str = r#"
schema_version: 1
rules:
  - name: overheat
    description: Sustained high temperature raises an alert
    conditions:
      all:
        - condition:
            type: threshold_over_time
            sensor: temperature
            threshold: 50
            duration_ms: 500ms
      any:
        - condition: { type: comparison, sensor: mode, operator: "==", value: 1 }
        - condition:
            type: expression
            expression: "abs(temperature - setpoint) > 5"
    actions:
      - set_value: { key: "alerts:temperature", value: 1 }
      - send_message: { channel: ops, message: "overheat" }
  - name: escalate
    conditions:
      all:
        - condition: { type: comparison, sensor: "alerts:temperature", operator: "==", value: 1 }
    actions:
      - set_value: { key: escalated, value: 1 }
"#;

fn explanations() -> Vec<RuleExplanation> {
    let (set, _) = parse_rule_set("rules.yaml", RULES).unwrap();
    let valid: BTreeSet<String> = [
        "temperature",
        "setpoint",
        "mode",
        "alerts:temperature",
        "escalated",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let out = compile(
        &set,
        &valid,
        &PlanOptions::default(),
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
    )
    .unwrap();
    explain_plan(&out.plan, &out.manifest)
}

#[test]
fn explains_every_rule_in_emission_order() {
    let expls = explanations();
    assert_eq!(expls.len(), 2);
    assert_eq!(expls[0].name, "overheat");
    assert_eq!(expls[1].name, "escalate");
    assert_eq!(expls[1].layer, 1);
    assert_eq!(expls[1].depends_on, vec!["overheat"]);
}

#[test]
fn condition_tree_renders_all_and_any() {
    let expls = explanations();
    let conditions = expls[0].conditions.join("\n");
    assert!(conditions.contains("all of:"));
    assert!(conditions.contains("any of:"));
    assert!(conditions.contains("temperature > 50 sustained for 500ms"));
    assert!(conditions.contains("mode == 1"));
    assert!(conditions.contains("abs(temperature - setpoint) > 5"));
}

#[test]
fn actions_render_both_kinds() {
    let expls = explanations();
    assert_eq!(expls[0].actions[0], "set alerts:temperature = 1");
    assert!(expls[0].actions[1].contains("publish"));
    assert!(expls[0].actions[1].contains("ops"));
}

#[test]
fn display_includes_lineage_and_sensors() {
    let expls = explanations();
    let text = expls[1].to_string();
    assert!(text.contains("rule escalate"));
    assert!(text.contains("depends on: overheat"));
    assert!(text.contains("reads: alerts:temperature"));
    assert!(text.contains("writes: escalated"));
}

#[test]
fn format_expr_roundtrips_through_parser() {
    let sources = [
        "(temperature - 32) * (5.0 / 9.0) > 10",
        "abs(delta) > 2",
        "min(a, b) < max(a, b)",
        "-offset + 3 > 0",
    ];
    for src in sources {
        let parsed = parse_expr(src).unwrap();
        let rendered = format_expr(&parsed);
        let reparsed = parse_expr(&rendered).unwrap();
        assert_eq!(parsed, reparsed, "{src} -> {rendered}");
    }
}
