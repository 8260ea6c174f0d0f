use std::collections::HashMap;

use crate::value::Value;

// ---------------------------------------------------------------------------
// Snapshot — the working view of the store for one cycle
// ---------------------------------------------------------------------------

/// Current-cycle sensor values. Built from the store read at cycle start;
/// `set_value` writes land here immediately so later groups observe them,
/// and are also accumulated into the cycle's write set for the final flush.
#[derive(Debug, Default)]
pub struct Snapshot {
    values: HashMap<String, Value>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from raw store strings. Numeric strings become
    /// numbers; everything else stays a string.
    pub fn from_store_values(raw: &HashMap<String, String>) -> Self {
        Self {
            values: raw
                .iter()
                .map(|(k, v)| (k.clone(), Value::from_store(v)))
                .collect(),
        }
    }

    pub fn get(&self, sensor: &str) -> Option<&Value> {
        self.values.get(sensor)
    }

    /// Numeric view of a sensor; `None` for absent or non-numeric values.
    pub fn get_number(&self, sensor: &str) -> Option<f64> {
        self.values.get(sensor).and_then(Value::as_number)
    }

    pub fn set_number(&mut self, sensor: &str, value: f64) {
        self.values.insert(sensor.to_string(), Value::Number(value));
    }

    /// Put back a prior value (or remove the key when there was none).
    /// Used to discard a rule's writes after a mid-rule fault.
    pub fn restore(&mut self, sensor: &str, prior: Option<Value>) {
        match prior {
            Some(value) => {
                self.values.insert(sensor.to_string(), value);
            }
            None => {
                self.values.remove(sensor);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
