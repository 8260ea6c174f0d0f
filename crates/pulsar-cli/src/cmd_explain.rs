use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;

use pulsar_config::SystemConfig;
use pulsar_lang::explain::explain_plan;
use pulsar_lang::{CompileFailure, PlanOptions, compile, parse_rule_set};

use crate::exit;

/// Compile a rule set in memory and print a human-readable explanation of
/// every rule: conditions, actions, layer/group placement, lineage.
pub fn run(rules: PathBuf, config: PathBuf) -> ExitCode {
    let rules_text = match std::fs::read_to_string(&rules) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("failed to read {}: {e}", rules.display());
            return exit::code(exit::IO);
        }
    };
    let config_text = match std::fs::read_to_string(&config) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("failed to read {}: {e}", config.display());
            return exit::code(exit::IO);
        }
    };

    let system: SystemConfig = match config_text.parse() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {e}", config.display());
            return exit::code(exit::VALIDATION);
        }
    };
    let (set, _) = match parse_rule_set(&rules, &rules_text) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{e}");
            return exit::code(exit::VALIDATION);
        }
    };

    let output = match compile(&set, &system.sensor_set(), &PlanOptions::default(), Utc::now()) {
        Ok(output) => output,
        Err(failure) => {
            eprintln!("{failure}");
            return match failure {
                CompileFailure::Validation(_) => exit::code(exit::VALIDATION),
                CompileFailure::Dependency(_) => exit::code(exit::DEPENDENCY),
            };
        }
    };

    for explanation in explain_plan(&output.plan, &output.manifest) {
        print!("{explanation}");
    }
    ExitCode::SUCCESS
}
