use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Manifest — ground truth for tooling and tests
// ---------------------------------------------------------------------------

/// Machine-readable summary of a compiled plan, emitted alongside it as
/// `rules.manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub header: ManifestHeader,
    /// Keyed by rule name; sorted keys keep the document deterministic.
    pub rules: BTreeMap<String, ManifestRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestHeader {
    pub schema_version: u32,
    /// RFC 3339 UTC timestamp supplied by the caller at emission time.
    pub generated_at_utc: String,
    pub total_rules: usize,
    pub layer_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRule {
    pub name: String,
    pub source_file: String,
    pub source_line: u32,
    pub layer: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Direct producer rules, exactly as discovered by the analyzer.
    pub dependencies: Vec<String>,
    pub input_sensors: Vec<String>,
    pub output_sensors: Vec<String>,
    pub uses_temporal: bool,
}
