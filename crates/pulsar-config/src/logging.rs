use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};

// ---------------------------------------------------------------------------
// LogLevel
// ---------------------------------------------------------------------------

/// Verbosity threshold for the `[logging]` section. Parsed from its name,
/// case-insensitively, so `"DEBUG"` and `"debug"` both work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => anyhow::bail!(
                "unknown log level {other:?} (expected error/warn/info/debug/trace)"
            ),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// LoggingConfig
// ---------------------------------------------------------------------------

/// `[logging]` section of `pulsar.toml`. Every field has a default, so the
/// section may be omitted entirely; unknown keys are rejected, matching
/// how the DSL treats its strict blocks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Base verbosity for everything.
    pub level: LogLevel,
    /// Extra tracing filter directives layered over `level`, e.g.
    /// `"pulsar_runtime::orchestrator=trace,winnow=off"`.
    pub filter: Option<String>,
    /// Optional log file. Relative paths resolve against the settings
    /// file's directory.
    pub file: Option<PathBuf>,
    /// `plain` for humans, `json` for log pipelines.
    pub format: LogFormat,
}

impl LoggingConfig {
    /// The full directive string handed to the tracing filter: the base
    /// level, then any extra directives.
    pub fn directives(&self) -> String {
        match self.filter.as_deref().map(str::trim) {
            Some(extra) if !extra.is_empty() => format!("{},{extra}", self.level),
            _ => self.level.to_string(),
        }
    }

    /// Resolve the configured log file against `base_dir`.
    pub fn log_file(&self, base_dir: &Path) -> Option<PathBuf> {
        self.file.as_ref().map(|p| {
            if p.is_relative() {
                base_dir.join(p)
            } else {
                p.clone()
            }
        })
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("Warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn defaults_are_plain_info() {
        let cfg = LoggingConfig::default();
        assert_eq!(cfg.level, LogLevel::Info);
        assert_eq!(cfg.format, LogFormat::Plain);
        assert_eq!(cfg.directives(), "info");
        assert!(cfg.file.is_none());
    }

    #[test]
    fn directives_append_filter_after_level() {
        let cfg: LoggingConfig =
            toml::from_str("level = \"debug\"\nfilter = \"winnow=off\"\n").unwrap();
        assert_eq!(cfg.directives(), "debug,winnow=off");
    }

    #[test]
    fn blank_filter_is_ignored() {
        let cfg: LoggingConfig = toml::from_str("filter = \"  \"\n").unwrap();
        assert_eq!(cfg.directives(), "info");
    }

    #[test]
    fn log_file_resolves_relative_paths() {
        let cfg: LoggingConfig = toml::from_str("file = \"logs/pulsar.log\"\n").unwrap();
        let resolved = cfg.log_file(Path::new("/etc/pulsar")).unwrap();
        assert_eq!(resolved, Path::new("/etc/pulsar/logs/pulsar.log"));
    }

    #[test]
    fn log_file_keeps_absolute_paths() {
        let cfg: LoggingConfig = toml::from_str("file = \"/var/log/pulsar.log\"\n").unwrap();
        let resolved = cfg.log_file(Path::new("/etc/pulsar")).unwrap();
        assert_eq!(resolved, Path::new("/var/log/pulsar.log"));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<LoggingConfig>("modules = {}\n").is_err());
    }

    #[test]
    fn bad_level_surfaces_in_deserialize() {
        let err = toml::from_str::<LoggingConfig>("level = \"shouty\"\n").unwrap_err();
        assert!(err.to_string().contains("shouty"));
    }
}
