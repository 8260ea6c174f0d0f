use std::fmt;

// ---------------------------------------------------------------------------
// Value — one sensor reading in a cycle snapshot
// ---------------------------------------------------------------------------

/// Store values are strings on the wire; readings that parse as doubles
/// become `Number`, everything else stays `Str` for equality comparisons.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    /// Parse a raw store string: numeric when possible, string otherwise.
    pub fn from_store(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Str(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Wire representation written back to the store. Numbers use the
    /// shortest round-trippable form.
    pub fn to_store(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_store())
    }
}

/// Integral doubles render without a trailing `.0` so `1` written as a
/// number reads back as `1`.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_strings_become_numbers() {
        assert_eq!(Value::from_store("42"), Value::Number(42.0));
        assert_eq!(Value::from_store("-3.5"), Value::Number(-3.5));
        assert_eq!(Value::from_store(" 7 "), Value::Number(7.0));
    }

    #[test]
    fn non_numeric_strings_stay_strings() {
        assert_eq!(Value::from_store("open"), Value::Str("open".to_string()));
    }

    #[test]
    fn store_representation_roundtrips_integers() {
        assert_eq!(Value::Number(1.0).to_store(), "1");
        assert_eq!(Value::Number(37.5).to_store(), "37.5");
        assert_eq!(Value::from_store(&Value::Number(1.0).to_store()), Value::Number(1.0));
    }
}
