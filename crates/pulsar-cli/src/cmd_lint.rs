use std::path::PathBuf;
use std::process::ExitCode;

use pulsar_config::SystemConfig;
use pulsar_lang::analyze::{DEFAULT_MAX_CHAIN_DEPTH, analyze};
use pulsar_lang::checker::{check_rule_set, split_by_severity};
use pulsar_lang::parse_rule_set;

use crate::exit;

/// Parse, validate, and analyze a rule set, printing every finding
/// without emitting a plan.
pub fn run(rules: PathBuf, config: PathBuf, max_chain_depth: Option<usize>) -> ExitCode {
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

    let (set, parse_warnings) = match parse_rule_set(&rules, &rules_text) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{e}");
            return exit::code(exit::VALIDATION);
        }
    };
    for warning in &parse_warnings {
        eprintln!("warning: {warning}");
    }

    let (errors, warnings) = split_by_severity(check_rule_set(&set, &system.sensor_set()));
    for finding in errors.iter().chain(warnings.iter()) {
        eprintln!("{finding}");
    }
    if !errors.is_empty() {
        eprintln!("\n{} error(s), {} warning(s)", errors.len(), warnings.len());
        return exit::code(exit::VALIDATION);
    }

    let mut warning_count = parse_warnings.len() + warnings.len();
    match analyze(&set, max_chain_depth.unwrap_or(DEFAULT_MAX_CHAIN_DEPTH)) {
        Ok(layered) => {
            for warning in &layered.warnings {
                eprintln!("warning: {warning}");
            }
            warning_count += layered.warnings.len();
            if warning_count == 0 {
                eprintln!("No issues found.");
            } else {
                eprintln!("\n0 error(s), {warning_count} warning(s)");
            }
            println!(
                "{} rule(s), {} layer(s)",
                set.rules.len(),
                layered.layers.len()
            );
            ExitCode::SUCCESS
        }
        Err(dep) => {
            eprintln!("{dep}");
            exit::code(exit::DEPENDENCY)
        }
    }
}
