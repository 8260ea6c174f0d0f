mod parser;


use std::collections::BTreeSet;

use crate::ast::Expr;

pub use parser::parse_expr;

/// Pure functions callable from expressions. Anything else that looks like
/// a call is rejected.
pub const FUNCTIONS: &[&str] = &[
    "abs", "min", "max", "round", "floor", "ceiling", "sqrt", "sin", "cos", "tan", "log", "exp",
    "pow",
];

pub fn is_function(name: &str) -> bool {
    FUNCTIONS.contains(&name)
}

// ---------------------------------------------------------------------------
// ExprReport
// ---------------------------------------------------------------------------

/// Result of analyzing one expression string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExprReport {
    /// Every identifier that is neither a function name nor a literal.
    pub referenced_sensors: BTreeSet<String>,
    /// True when the expression has a top-level comparison.
    pub is_boolean: bool,
    pub errors: Vec<String>,
}

impl ExprReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

/// Parse and analyze an expression string.
///
/// Parse failures produce a single-error report; a parsed tree is then
/// checked for unknown function names. Boolean-ness (exactly: the root is
/// a comparison) is reported, not enforced; the validator decides whether
/// a given context requires a boolean or an arithmetic expression.
pub fn analyze(src: &str) -> ExprReport {
    let expr = match parse_expr(src) {
        Ok(expr) => expr,
        Err(msg) => {
            return ExprReport {
                errors: vec![msg],
                ..ExprReport::default()
            };
        }
    };

    let mut report = ExprReport {
        is_boolean: matches!(expr, Expr::Cmp { .. }),
        ..ExprReport::default()
    };
    collect(&expr, &mut report);
    report
}

fn collect(expr: &Expr, report: &mut ExprReport) {
    match expr {
        Expr::Number(_) => {}
        Expr::Sensor(name) => {
            report.referenced_sensors.insert(name.clone());
        }
        Expr::Neg(inner) => collect(inner, report),
        Expr::Arith { left, right, .. } | Expr::Cmp { left, right, .. } => {
            collect(left, report);
            collect(right, report);
        }
        Expr::Func { name, args } => {
            if !is_function(name) {
                report.errors.push(format!(
                    "unknown function `{name}` (allowed: {})",
                    FUNCTIONS.join(", ")
                ));
            }
            for arg in args {
                collect(arg, report);
            }
        }
    }
}

/// Collect the sensors referenced by an already-parsed expression tree.
pub fn referenced_sensors(expr: &Expr) -> BTreeSet<String> {
    let mut report = ExprReport::default();
    collect(expr, &mut report);
    report.referenced_sensors
}
