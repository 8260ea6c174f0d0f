use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use pulsar_lang::ast::DurationMs;

use crate::validate;

// ---------------------------------------------------------------------------
// Raw YAML structure (intermediate representation)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SystemConfigRaw {
    schema_version: u32,
    valid_sensors: Vec<String>,
    #[serde(default = "default_cycle_time", alias = "cycle_time_ms")]
    cycle_time: DurationMs,
    #[serde(default = "default_buffer_capacity")]
    buffer_capacity: usize,
}

fn default_cycle_time() -> DurationMs {
    DurationMs::from_millis(100)
}

fn default_buffer_capacity() -> usize {
    100
}

// ---------------------------------------------------------------------------
// SystemConfig (resolved, validated)
// ---------------------------------------------------------------------------

/// Global system configuration: the sensor universe plus runtime cadence
/// and temporal-buffer defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemConfig {
    pub schema_version: u32,
    pub valid_sensors: Vec<String>,
    pub cycle_time: DurationMs,
    pub buffer_capacity: usize,
}

impl SystemConfig {
    /// Read and parse a system config YAML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        content.parse()
    }

    /// The sensor universe as a set, for validation and compilation.
    pub fn sensor_set(&self) -> BTreeSet<String> {
        self.valid_sensors.iter().cloned().collect()
    }
}

impl FromStr for SystemConfig {
    type Err = anyhow::Error;

    fn from_str(yaml: &str) -> anyhow::Result<Self> {
        let raw: SystemConfigRaw = serde_yaml::from_str(yaml)?;

        let config = SystemConfig {
            schema_version: raw.schema_version,
            valid_sensors: raw.valid_sensors,
            cycle_time: raw.cycle_time,
            buffer_capacity: raw.buffer_capacity,
        };

        validate::validate_system(&config)?;

        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_YAML: &str = r#"
schema_version: 1
valid_sensors:
  - temperature
  - humidity
  - "alerts:temperature"
cycle_time: 100ms
buffer_capacity: 200
"#;

    #[test]
    fn load_full_yaml() {
        let cfg: SystemConfig = FULL_YAML.parse().unwrap();
        assert_eq!(cfg.schema_version, 1);
        assert_eq!(cfg.valid_sensors.len(), 3);
        assert_eq!(cfg.cycle_time.as_millis(), 100);
        assert_eq!(cfg.buffer_capacity, 200);
        assert!(cfg.sensor_set().contains("alerts:temperature"));
    }

    #[test]
    fn defaults_apply_when_omitted() {
        let cfg: SystemConfig = "schema_version: 1\nvalid_sensors: [a]\n".parse().unwrap();
        assert_eq!(cfg.cycle_time.as_millis(), 100);
        assert_eq!(cfg.buffer_capacity, 100);
    }

    #[test]
    fn cycle_time_ms_alias_accepted() {
        let cfg: SystemConfig = "schema_version: 1\nvalid_sensors: [a]\ncycle_time_ms: 50\n"
            .parse()
            .unwrap();
        assert_eq!(cfg.cycle_time.as_millis(), 50);
    }

    #[test]
    fn reject_zero_schema_version() {
        assert!("schema_version: 0\nvalid_sensors: [a]\n"
            .parse::<SystemConfig>()
            .is_err());
    }

    #[test]
    fn reject_empty_sensor_list() {
        assert!("schema_version: 1\nvalid_sensors: []\n"
            .parse::<SystemConfig>()
            .is_err());
    }

    #[test]
    fn reject_blank_sensor() {
        assert!("schema_version: 1\nvalid_sensors: [a, \"  \"]\n"
            .parse::<SystemConfig>()
            .is_err());
    }

    #[test]
    fn reject_duplicate_sensor() {
        let err = "schema_version: 1\nvalid_sensors: [a, b, a]\n"
            .parse::<SystemConfig>()
            .unwrap_err();
        assert!(err.to_string().contains('a'), "{err}");
    }

    #[test]
    fn reject_zero_cycle_time() {
        assert!("schema_version: 1\nvalid_sensors: [a]\ncycle_time: 0\n"
            .parse::<SystemConfig>()
            .is_err());
    }

    #[test]
    fn reject_zero_buffer_capacity() {
        assert!("schema_version: 1\nvalid_sensors: [a]\nbuffer_capacity: 0\n"
            .parse::<SystemConfig>()
            .is_err());
    }

    #[test]
    fn missing_required_field_fails() {
        assert!("valid_sensors: [a]\n".parse::<SystemConfig>().is_err());
    }
}
