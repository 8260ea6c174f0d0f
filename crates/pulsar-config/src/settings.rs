use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use pulsar_lang::ast::DurationMs;

use crate::logging::LoggingConfig;

// ---------------------------------------------------------------------------
// PulsarConfig — optional runtime settings file (pulsar.toml)
// ---------------------------------------------------------------------------

/// Runtime settings loaded from an optional `pulsar.toml`. Every section
/// has defaults; CLI flags override individual fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PulsarConfig {
    pub runtime: RuntimeSettings,
    pub logging: LoggingConfig,
}

/// `[runtime]` section: store connection and cadence overrides. `None`
/// defers to the compiled system configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Store connection string, e.g. `mem://`.
    pub store: Option<String>,
    pub cycle_time: Option<DurationMs>,
    pub buffer_capacity: Option<usize>,
}

impl PulsarConfig {
    /// Read and parse a `pulsar.toml` file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        content.parse()
    }
}

impl FromStr for PulsarConfig {
    type Err = anyhow::Error;

    fn from_str(toml_str: &str) -> anyhow::Result<Self> {
        let config: PulsarConfig = toml::from_str(toml_str)?;
        if let Some(cycle) = config.runtime.cycle_time
            && cycle.as_millis() == 0
        {
            anyhow::bail!("runtime.cycle_time must be greater than zero");
        }
        if config.runtime.buffer_capacity == Some(0) {
            anyhow::bail!("runtime.buffer_capacity must be greater than zero");
        }
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
