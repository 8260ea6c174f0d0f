use pulsar_lang::ast::{ArithOp, CmpOp, Expr};

use crate::snapshot::Snapshot;

// ---------------------------------------------------------------------------
// Expression evaluation
// ---------------------------------------------------------------------------
//
// Arithmetic is double-precision IEEE-754 throughout: division by zero and
// domain errors produce inf/NaN and propagate. Missing sensors are not
// faults; they make the enclosing condition false. Faults are reserved
// for type-level problems the compiler could not rule out (a string value
// where a number is needed, a bad arity reaching the runtime).

/// A type-level evaluation failure, counted against the rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalFault {
    pub message: String,
}

impl EvalFault {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for EvalFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Evaluate an expression to a number. `Ok(None)` means a referenced
/// sensor was absent from the snapshot (benign); `Err` is a fault.
pub fn eval_number(expr: &Expr, snapshot: &Snapshot) -> Result<Option<f64>, EvalFault> {
    match expr {
        Expr::Number(n) => Ok(Some(*n)),
        Expr::Sensor(name) => match snapshot.get(name) {
            None => Ok(None),
            Some(value) => match value.as_number() {
                Some(n) => Ok(Some(n)),
                None => Err(EvalFault::new(format!(
                    "sensor `{name}` holds non-numeric value {value:?}"
                ))),
            },
        },
        Expr::Neg(inner) => Ok(eval_number(inner, snapshot)?.map(|n| -n)),
        Expr::Arith { op, left, right } => {
            let (Some(l), Some(r)) = (
                eval_number(left, snapshot)?,
                eval_number(right, snapshot)?,
            ) else {
                return Ok(None);
            };
            Ok(Some(match op {
                ArithOp::Add => l + r,
                ArithOp::Sub => l - r,
                ArithOp::Mul => l * r,
                ArithOp::Div => l / r,
            }))
        }
        Expr::Cmp { .. } => Err(EvalFault::new(
            "comparison used where a numeric value is required",
        )),
        Expr::Func { name, args } => eval_func(name, args, snapshot),
    }
}

/// Evaluate a boolean expression (a top-level comparison). `Ok(None)`
/// means a referenced sensor was absent; a NaN on either side makes the
/// comparison false.
pub fn eval_bool(expr: &Expr, snapshot: &Snapshot) -> Result<Option<bool>, EvalFault> {
    match expr {
        Expr::Cmp { op, left, right } => {
            let (Some(l), Some(r)) = (
                eval_number(left, snapshot)?,
                eval_number(right, snapshot)?,
            ) else {
                return Ok(None);
            };
            if l.is_nan() || r.is_nan() {
                return Ok(Some(false));
            }
            Ok(Some(op.holds(l, r)))
        }
        _ => Err(EvalFault::new(
            "expression has no top-level comparison, cannot evaluate as condition",
        )),
    }
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

fn eval_func(name: &str, args: &[Expr], snapshot: &Snapshot) -> Result<Option<f64>, EvalFault> {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        match eval_number(arg, snapshot)? {
            Some(v) => values.push(v),
            None => return Ok(None),
        }
    }

    let unary = |values: &[f64]| -> Result<f64, EvalFault> {
        match values {
            [v] => Ok(*v),
            _ => Err(EvalFault::new(format!(
                "{name}() expects 1 argument, got {}",
                values.len()
            ))),
        }
    };

    let result = match name {
        "abs" => unary(&values)?.abs(),
        "min" => fold_extremum(name, &values, f64::min)?,
        "max" => fold_extremum(name, &values, f64::max)?,
        "round" => unary(&values)?.round(),
        "floor" => unary(&values)?.floor(),
        "ceiling" => unary(&values)?.ceil(),
        "sqrt" => unary(&values)?.sqrt(),
        "sin" => unary(&values)?.sin(),
        "cos" => unary(&values)?.cos(),
        "tan" => unary(&values)?.tan(),
        "log" => unary(&values)?.ln(),
        "exp" => unary(&values)?.exp(),
        "pow" => match values.as_slice() {
            [x, y] => x.powf(*y),
            _ => {
                return Err(EvalFault::new(format!(
                    "pow() expects 2 arguments, got {}",
                    values.len()
                )));
            }
        },
        _ => return Err(EvalFault::new(format!("unknown function `{name}`"))),
    };
    Ok(Some(result))
}

fn fold_extremum(
    name: &str,
    values: &[f64],
    pick: fn(f64, f64) -> f64,
) -> Result<f64, EvalFault> {
    match values {
        [] => Err(EvalFault::new(format!("{name}() expects at least 1 argument"))),
        [first, rest @ ..] => Ok(rest.iter().fold(*first, |acc, &v| pick(acc, v))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pulsar_lang::expr::parse_expr;

    fn snap(pairs: &[(&str, f64)]) -> Snapshot {
        let mut s = Snapshot::new();
        for (k, v) in pairs {
            s.set_number(k, *v);
        }
        s
    }

    fn num(src: &str, snapshot: &Snapshot) -> Option<f64> {
        eval_number(&parse_expr(src).unwrap(), snapshot).unwrap()
    }

    fn boolean(src: &str, snapshot: &Snapshot) -> Option<bool> {
        eval_bool(&parse_expr(src).unwrap(), snapshot).unwrap()
    }

    #[test]
    fn arithmetic_follows_precedence() {
        let s = snap(&[("a", 2.0), ("b", 3.0)]);
        assert_eq!(num("a + b * 2", &s), Some(8.0));
        assert_eq!(num("(a + b) * 2", &s), Some(10.0));
        assert_eq!(num("-a + 5", &s), Some(3.0));
    }

    #[test]
    fn fahrenheit_conversion_is_precise() {
        let s = snap(&[("temperature", 100.0)]);
        let v = num("(temperature - 32) * (5.0 / 9.0)", &s).unwrap();
        assert!((v - 37.777_777_777_777_78).abs() < 1e-9);
    }

    #[test]
    fn comparison_yields_bool() {
        let s = snap(&[("temperature", 100.0)]);
        assert_eq!(boolean("(temperature - 32) * (5.0 / 9.0) > 10", &s), Some(true));
        assert_eq!(boolean("temperature < 50", &s), Some(false));
    }

    #[test]
    fn missing_sensor_is_none_not_fault() {
        let s = snap(&[]);
        assert_eq!(num("ghost + 1", &s), None);
        assert_eq!(boolean("ghost > 1", &s), None);
    }

    #[test]
    fn division_by_zero_propagates_ieee() {
        let s = snap(&[("a", 1.0), ("z", 0.0)]);
        assert_eq!(num("a / z", &s), Some(f64::INFINITY));
        let nan = num("z / z", &s).unwrap();
        assert!(nan.is_nan());
    }

    #[test]
    fn nan_comparison_is_false() {
        let s = snap(&[("z", 0.0)]);
        assert_eq!(boolean("z / z > 1", &s), Some(false));
        assert_eq!(boolean("z / z != 1", &s), Some(false));
    }

    #[test]
    fn string_sensor_in_arithmetic_is_fault() {
        let raw = std::collections::HashMap::from([("mode".to_string(), "auto".to_string())]);
        let s = Snapshot::from_store_values(&raw);
        let err = eval_number(&parse_expr("mode + 1").unwrap(), &s).unwrap_err();
        assert!(err.message.contains("mode"));
    }

    #[test]
    fn functions_evaluate() {
        let s = snap(&[("x", 9.0), ("y", -4.5)]);
        assert_eq!(num("sqrt(x)", &s), Some(3.0));
        assert_eq!(num("abs(y)", &s), Some(4.5));
        assert_eq!(num("min(x, abs(y))", &s), Some(4.5));
        assert_eq!(num("max(x, abs(y), 100)", &s), Some(100.0));
        assert_eq!(num("pow(2, 8)", &s), Some(256.0));
        assert_eq!(num("ceiling(4.1)", &s), Some(5.0));
        assert_eq!(num("floor(4.9)", &s), Some(4.0));
        assert_eq!(num("round(4.5)", &s), Some(5.0));
        let e = num("exp(1)", &s).unwrap();
        assert!((e - std::f64::consts::E).abs() < 1e-12);
        assert_eq!(num("log(exp(1))", &s), Some(1.0));
        assert_eq!(num("sin(0)", &s), Some(0.0));
        assert_eq!(num("cos(0)", &s), Some(1.0));
        assert_eq!(num("tan(0)", &s), Some(0.0));
    }

    #[test]
    fn sqrt_of_negative_is_nan_propagation() {
        let s = snap(&[("y", -4.0)]);
        assert!(num("sqrt(y)", &s).unwrap().is_nan());
        assert_eq!(boolean("sqrt(y) > 0", &s), Some(false));
    }

    #[test]
    fn wrong_arity_is_fault() {
        let s = snap(&[("x", 1.0)]);
        assert!(eval_number(&parse_expr("pow(x)").unwrap(), &s).is_err());
        assert!(eval_number(&parse_expr("abs(x, x)").unwrap(), &s).is_err());
    }

    #[test]
    fn non_boolean_condition_is_fault() {
        let s = snap(&[("x", 1.0)]);
        assert!(eval_bool(&parse_expr("x + 1").unwrap(), &s).is_err());
    }
}
