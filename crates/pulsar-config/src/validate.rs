use std::collections::BTreeSet;

use crate::system::SystemConfig;

/// Cross-field validation for a parsed [`SystemConfig`].
pub fn validate_system(config: &SystemConfig) -> anyhow::Result<()> {
    if config.schema_version == 0 {
        anyhow::bail!("schema_version must be greater than zero");
    }
    if config.valid_sensors.is_empty() {
        anyhow::bail!("valid_sensors must not be empty");
    }

    let mut seen = BTreeSet::new();
    for sensor in &config.valid_sensors {
        if sensor.trim().is_empty() {
            anyhow::bail!("valid_sensors contains a blank entry");
        }
        if !seen.insert(sensor.as_str()) {
            anyhow::bail!("valid_sensors contains duplicate entry `{sensor}`");
        }
    }

    if config.cycle_time.as_millis() == 0 {
        anyhow::bail!("cycle_time must be greater than zero");
    }
    if config.buffer_capacity == 0 {
        anyhow::bail!("buffer_capacity must be greater than zero");
    }

    Ok(())
}
