use crate::ast::{ArithOp, DurationMs, Expr};
use crate::plan::{ActionPlan, CondNode, ValueSource};

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// Render an expression tree back to DSL-style text. Parentheses are
/// emitted around every binary operation, so output is unambiguous even
/// when it differs from the author's original spelling.
pub fn format_expr(expr: &Expr) -> String {
    match expr {
        Expr::Number(n) => format_number(*n),
        Expr::Sensor(name) => name.clone(),
        Expr::Neg(inner) => format!("-{}", format_operand(inner)),
        Expr::Arith { op, left, right } => format!(
            "{} {} {}",
            format_operand(left),
            format_arith(*op),
            format_operand(right)
        ),
        Expr::Cmp { op, left, right } => format!(
            "{} {} {}",
            format_operand(left),
            op.as_str(),
            format_operand(right)
        ),
        Expr::Func { name, args } => {
            let args: Vec<String> = args.iter().map(format_expr).collect();
            format!("{name}({})", args.join(", "))
        }
    }
}

fn format_operand(expr: &Expr) -> String {
    match expr {
        Expr::Arith { .. } | Expr::Cmp { .. } => format!("({})", format_expr(expr)),
        _ => format_expr(expr),
    }
}

fn format_arith(op: ArithOp) -> &'static str {
    match op {
        ArithOp::Add => "+",
        ArithOp::Sub => "-",
        ArithOp::Mul => "*",
        ArithOp::Div => "/",
    }
}

pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// ---------------------------------------------------------------------------
// Conditions & actions
// ---------------------------------------------------------------------------

pub fn format_condition(node: &CondNode) -> String {
    match node {
        CondNode::Compare { sensor, op, value } => {
            format!("{sensor} {} {}", op.as_str(), format_number(*value))
        }
        CondNode::Expr { expr } => format_expr(expr),
        CondNode::ThresholdOverTime {
            sensor,
            threshold,
            duration_ms,
        } => format!(
            "{sensor} > {} sustained for {}",
            format_number(*threshold),
            DurationMs::from_millis(*duration_ms)
        ),
        CondNode::Group(_) => "(nested group)".to_string(),
    }
}

pub fn format_action(action: &ActionPlan) -> String {
    match action {
        ActionPlan::SetValue { key, value } => match value {
            ValueSource::Literal(v) => format!("set {key} = {}", format_number(*v)),
            ValueSource::Expr(expr) => format!("set {key} = {}", format_expr(expr)),
        },
        ActionPlan::Publish { channel, message } => {
            format!("publish {message:?} on {channel}")
        }
    }
}
