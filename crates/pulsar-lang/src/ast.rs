use std::fmt;
use std::str::FromStr;

use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

/// A complete parsed rules document.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    pub schema_version: u32,
    pub rules: Vec<Rule>,
}

/// `rule { name description? conditions actions }`
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub description: Option<String>,
    pub conditions: ConditionGroup,
    pub actions: Vec<Action>,
    pub provenance: Provenance,
}

/// Source location attached to every rule for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub file: String,
    /// 1-based line of the rule's `name:` entry.
    pub line: u32,
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// `conditions { all?: [...] any?: [...] }`
///
/// True iff every member of `all` holds AND, when `any` is non-empty, at
/// least one member of `any` holds. Both lists empty is rejected at the
/// root by the validator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionGroup {
    pub all: Vec<Condition>,
    pub any: Vec<Condition>,
}

impl ConditionGroup {
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.any.is_empty()
    }
}

/// A single condition. Closed sum; the plan generator dispatches on the tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `sensor <op> value` against the current snapshot.
    Comparison {
        sensor: String,
        op: CmpOp,
        value: f64,
        line: u32,
    },
    /// Arithmetic expression over sensors that yields a boolean.
    Expression { source: String, line: u32 },
    /// Every sample of `sensor` within the trailing window strictly
    /// exceeds `threshold`, and at least one sample exists.
    ThresholdOverTime {
        sensor: String,
        threshold: f64,
        duration: DurationMs,
        line: u32,
    },
    /// Nested group with the same all/any semantics as the root.
    Group(ConditionGroup),
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// An action executed when the rule's conditions hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Write `key` to the store, from a literal or a value expression.
    SetValue {
        key: String,
        value: ValueSpec,
        line: u32,
    },
    /// Publish `message` on the store's pub-sub `channel`.
    SendMessage {
        channel: String,
        message: String,
        line: u32,
    },
}

/// The value side of a `set_value` action.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSpec {
    Literal(f64),
    Expression(String),
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    /// Parse a DSL operator token. `=` is accepted as a synonym for `==`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "=" | "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
        }
    }

    pub fn holds(&self, left: f64, right: f64) -> bool {
        match self {
            Self::Lt => left < right,
            Self::Le => left <= right,
            Self::Gt => left > right,
            Self::Ge => left >= right,
            Self::Eq => left == right,
            Self::Ne => left != right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// Post-validation expression syntax tree. Carried inside the execution
/// plan so the runtime never re-parses expression strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Number literal (integer or float).
    Number(f64),
    /// Sensor reference.
    Sensor(String),
    /// Unary negation.
    Neg(Box<Expr>),
    /// Arithmetic operation.
    Arith {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Comparison yielding a boolean.
    Cmp {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Allow-listed function call: `name(args...)`, ≥1 argument.
    Func { name: String, args: Vec<Expr> },
}

// ---------------------------------------------------------------------------
// DurationMs
// ---------------------------------------------------------------------------

/// A duration parsed from `"500ms"`, `"5s"`, `"2m"`, `"1h"`, or a bare
/// integer meaning milliseconds. Stored as milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DurationMs(u64);

impl DurationMs {
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl FromStr for DurationMs {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            anyhow::bail!("empty duration string");
        }

        let idx = s
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(s.len());
        if idx == 0 {
            anyhow::bail!("missing numeric part in {s:?}");
        }
        let value: u64 = s[..idx]
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid number in duration: {s:?}"))?;

        let ms = match &s[idx..] {
            "" | "ms" => value,
            "s" => value * 1000,
            "m" => value * 60_000,
            "h" => value * 3_600_000,
            suffix => {
                anyhow::bail!("unsupported duration suffix {suffix:?} in {s:?} (expected ms/s/m/h)")
            }
        };

        Ok(Self(ms))
    }
}

impl fmt::Display for DurationMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.0;
        if ms == 0 {
            return write!(f, "0ms");
        }
        if ms.is_multiple_of(3_600_000) {
            write!(f, "{}h", ms / 3_600_000)
        } else if ms.is_multiple_of(60_000) {
            write!(f, "{}m", ms / 60_000)
        } else if ms.is_multiple_of(1000) {
            write!(f, "{}s", ms / 1000)
        } else {
            write!(f, "{ms}ms")
        }
    }
}

impl Serialize for DurationMs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DurationMs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl de::Visitor<'_> for Visitor {
            type Value = DurationMs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer millisecond count or a string like \"500ms\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<DurationMs, E> {
                Ok(DurationMs(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<DurationMs, E> {
                u64::try_from(v)
                    .map(DurationMs)
                    .map_err(|_| E::custom(format!("negative duration: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<DurationMs, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
