use pulsar_lang::ast::CmpOp;
use pulsar_lang::expr::parse_expr;
use pulsar_lang::plan::{ActionPlan, CondNode, ConditionPlan, RulePlan, ValueSource};

use crate::snapshot::Snapshot;
use crate::temporal::TemporalStore;

use super::{RuleOutcome, execute_rule};

fn rule(name: &str, condition: ConditionPlan, actions: Vec<ActionPlan>) -> RulePlan {
    RulePlan {
        name: name.to_string(),
        layer: 0,
        condition,
        actions,
        reads: vec![],
        writes: vec![],
        temporal_reads: vec![],
        source_file: "test.yaml".to_string(),
        source_line: 1,
    }
}

fn cmp(sensor: &str, op: CmpOp, value: f64) -> CondNode {
    CondNode::Compare {
        sensor: sensor.to_string(),
        op,
        value,
    }
}

fn set(key: &str, value: f64) -> ActionPlan {
    ActionPlan::SetValue {
        key: key.to_string(),
        value: ValueSource::Literal(value),
    }
}

fn set_expr(key: &str, src: &str) -> ActionPlan {
    ActionPlan::SetValue {
        key: key.to_string(),
        value: ValueSource::Expr(parse_expr(src).unwrap()),
    }
}

fn all(conds: Vec<CondNode>) -> ConditionPlan {
    ConditionPlan {
        all: conds,
        any: vec![],
    }
}

fn snap(pairs: &[(&str, f64)]) -> Snapshot {
    let mut s = Snapshot::new();
    for (k, v) in pairs {
        s.set_number(k, *v);
    }
    s
}

#[test]
fn fires_and_applies_writes_to_snapshot() {
    let r = rule(
        "heat",
        all(vec![cmp("temperature", CmpOp::Gt, 50.0)]),
        vec![set("alert", 1.0)],
    );
    let mut s = snap(&[("temperature", 55.0)]);
    let buffers = TemporalStore::new(4);

    let outcome = execute_rule(&r, &mut s, &buffers).unwrap();
    let RuleOutcome::Fired { writes, messages } = outcome else {
        panic!("expected fire");
    };
    assert_eq!(writes, vec![("alert".to_string(), 1.0)]);
    assert!(messages.is_empty());
    assert_eq!(s.get_number("alert"), Some(1.0));
}

#[test]
fn does_not_fire_below_threshold() {
    let r = rule(
        "heat",
        all(vec![cmp("temperature", CmpOp::Gt, 50.0)]),
        vec![set("alert", 1.0)],
    );
    let mut s = snap(&[("temperature", 45.0)]);
    let buffers = TemporalStore::new(4);
    assert_eq!(
        execute_rule(&r, &mut s, &buffers).unwrap(),
        RuleOutcome::NotFired
    );
    assert_eq!(s.get_number("alert"), None);
}

#[test]
fn absent_sensor_condition_is_false() {
    let r = rule(
        "heat",
        all(vec![cmp("missing", CmpOp::Gt, 0.0)]),
        vec![set("alert", 1.0)],
    );
    let mut s = snap(&[]);
    let buffers = TemporalStore::new(4);
    assert_eq!(
        execute_rule(&r, &mut s, &buffers).unwrap(),
        RuleOutcome::NotFired
    );
}

#[test]
fn all_and_any_combine() {
    let condition = ConditionPlan {
        all: vec![cmp("a", CmpOp::Gt, 0.0)],
        any: vec![cmp("b", CmpOp::Gt, 10.0), cmp("c", CmpOp::Gt, 10.0)],
    };
    let r = rule("mixed", condition, vec![set("out", 1.0)]);
    let buffers = TemporalStore::new(4);

    // all true, one any true -> fires
    let mut s = snap(&[("a", 1.0), ("b", 0.0), ("c", 11.0)]);
    assert!(matches!(
        execute_rule(&r, &mut s, &buffers).unwrap(),
        RuleOutcome::Fired { .. }
    ));

    // all true, no any true -> does not fire
    let mut s = snap(&[("a", 1.0), ("b", 0.0), ("c", 0.0)]);
    assert_eq!(
        execute_rule(&r, &mut s, &buffers).unwrap(),
        RuleOutcome::NotFired
    );

    // all false -> does not fire regardless of any
    let mut s = snap(&[("a", -1.0), ("b", 11.0), ("c", 11.0)]);
    assert_eq!(
        execute_rule(&r, &mut s, &buffers).unwrap(),
        RuleOutcome::NotFired
    );
}

#[test]
fn nested_group_condition() {
    let condition = ConditionPlan {
        all: vec![CondNode::Group(ConditionPlan {
            all: vec![],
            any: vec![cmp("a", CmpOp::Gt, 1.0), cmp("b", CmpOp::Gt, 1.0)],
        })],
        any: vec![],
    };
    let r = rule("nested", condition, vec![set("out", 1.0)]);
    let buffers = TemporalStore::new(4);
    let mut s = snap(&[("a", 0.0), ("b", 2.0)]);
    assert!(matches!(
        execute_rule(&r, &mut s, &buffers).unwrap(),
        RuleOutcome::Fired { .. }
    ));
}

#[test]
fn value_expression_sees_current_snapshot() {
    let r = rule(
        "convert",
        all(vec![cmp("temperature", CmpOp::Gt, 0.0)]),
        vec![set_expr("converted", "(temperature - 32) * (5.0 / 9.0)")],
    );
    let mut s = snap(&[("temperature", 100.0)]);
    let buffers = TemporalStore::new(4);
    let RuleOutcome::Fired { writes, .. } = execute_rule(&r, &mut s, &buffers).unwrap() else {
        panic!("expected fire");
    };
    assert!((writes[0].1 - 37.777_777_777_777_78).abs() < 1e-9);
}

#[test]
fn later_action_sees_earlier_write_of_same_rule() {
    let r = rule(
        "chain",
        all(vec![cmp("a", CmpOp::Gt, 0.0)]),
        vec![set("first", 10.0), set_expr("second", "first * 2")],
    );
    let mut s = snap(&[("a", 1.0)]);
    let buffers = TemporalStore::new(4);
    let RuleOutcome::Fired { writes, .. } = execute_rule(&r, &mut s, &buffers).unwrap() else {
        panic!("expected fire");
    };
    assert_eq!(writes[1], ("second".to_string(), 20.0));
}

#[test]
fn action_fault_discards_all_writes() {
    let r = rule(
        "faulty",
        all(vec![cmp("a", CmpOp::Gt, 0.0)]),
        vec![set("first", 10.0), set_expr("second", "missing_sensor + 1")],
    );
    let mut s = snap(&[("a", 1.0)]);
    let buffers = TemporalStore::new(4);
    let err = execute_rule(&r, &mut s, &buffers).unwrap_err();
    assert!(err.to_string().contains("faulty") || format!("{err:?}").contains("faulty"));
    // The first write was rolled back.
    assert_eq!(s.get_number("first"), None);
}

#[test]
fn condition_expression_fault_is_error() {
    let condition = ConditionPlan {
        all: vec![CondNode::Expr {
            // Lowered plans never contain non-boolean condition
            // expressions; a corrupted plan must still fail safely.
            expr: parse_expr("a + 1").unwrap(),
        }],
        any: vec![],
    };
    let r = rule("corrupt", condition, vec![set("out", 1.0)]);
    let mut s = snap(&[("a", 1.0)]);
    let buffers = TemporalStore::new(4);
    assert!(execute_rule(&r, &mut s, &buffers).is_err());
}

#[test]
fn threshold_condition_uses_buffers() {
    let condition = ConditionPlan {
        all: vec![CondNode::ThresholdOverTime {
            sensor: "temperature".to_string(),
            threshold: 50.0,
            duration_ms: 500,
        }],
        any: vec![],
    };
    let r = rule("temporal", condition, vec![set("alert", 1.0)]);
    let mut s = snap(&[("temperature", 55.0)]);

    let mut buffers = TemporalStore::new(16);
    for i in 0..5 {
        buffers.record("temperature", i * 100, 55.0);
    }
    assert!(matches!(
        execute_rule(&r, &mut s, &buffers).unwrap(),
        RuleOutcome::Fired { .. }
    ));

    // One low sample inside the window blocks the alert.
    let mut buffers = TemporalStore::new(16);
    for (i, v) in [55.0, 55.0, 49.0, 55.0, 55.0].iter().enumerate() {
        buffers.record("temperature", i as i64 * 100, *v);
    }
    let mut s = snap(&[("temperature", 55.0)]);
    assert_eq!(
        execute_rule(&r, &mut s, &buffers).unwrap(),
        RuleOutcome::NotFired
    );
}

#[test]
fn publish_actions_collected_in_order() {
    let r = rule(
        "notify",
        all(vec![cmp("a", CmpOp::Gt, 0.0)]),
        vec![
            ActionPlan::Publish {
                channel: "ops".to_string(),
                message: "first".to_string(),
            },
            ActionPlan::Publish {
                channel: "ops".to_string(),
                message: "second".to_string(),
            },
        ],
    );
    let mut s = snap(&[("a", 1.0)]);
    let buffers = TemporalStore::new(4);
    let RuleOutcome::Fired { messages, .. } = execute_rule(&r, &mut s, &buffers).unwrap() else {
        panic!("expected fire");
    };
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].1, "first");
    assert_eq!(messages[1].1, "second");
}

#[test]
fn nan_snapshot_value_makes_comparison_false() {
    let r = rule(
        "nan_guard",
        all(vec![cmp("x", CmpOp::Ne, 1.0)]),
        vec![set("out", 1.0)],
    );
    let mut s = snap(&[("x", f64::NAN)]);
    let buffers = TemporalStore::new(4);
    assert_eq!(
        execute_rule(&r, &mut s, &buffers).unwrap(),
        RuleOutcome::NotFired
    );
}
