use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;

use pulsar_config::SystemConfig;
use pulsar_lang::{CompileFailure, PlanOptions, compile, parse_rule_set, write_artifacts};

use crate::exit;

pub struct CompileArgs {
    pub rules: PathBuf,
    pub config: PathBuf,
    pub output: PathBuf,
    pub max_rules_per_group: Option<usize>,
    pub max_lines_per_group: Option<usize>,
    pub max_chain_depth: Option<usize>,
    pub sequential_groups: bool,
}

pub fn run(args: CompileArgs) -> ExitCode {
    // I/O first: unreadable inputs are exit 4, before any validation.
    let rules_text = match std::fs::read_to_string(&args.rules) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("failed to read {}: {e}", args.rules.display());
            return exit::code(exit::IO);
        }
    };
    let config_text = match std::fs::read_to_string(&args.config) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("failed to read {}: {e}", args.config.display());
            return exit::code(exit::IO);
        }
    };

    let system: SystemConfig = match config_text.parse() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {e}", args.config.display());
            return exit::code(exit::VALIDATION);
        }
    };

    let (set, parse_warnings) = match parse_rule_set(&args.rules, &rules_text) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{e}");
            return exit::code(exit::VALIDATION);
        }
    };
    for warning in &parse_warnings {
        eprintln!("warning: {warning}");
    }

    let mut opts = PlanOptions {
        group_parallel_rules: !args.sequential_groups,
        cycle_time_ms: system.cycle_time.as_millis(),
        buffer_capacity: system.buffer_capacity,
        ..PlanOptions::default()
    };
    if let Some(n) = args.max_rules_per_group {
        opts.max_rules_per_group = n;
    }
    if let Some(n) = args.max_lines_per_group {
        opts.max_lines_per_group = n;
    }
    if let Some(n) = args.max_chain_depth {
        opts.max_chain_depth = n;
    }

    let output = match compile(&set, &system.sensor_set(), &opts, Utc::now()) {
        Ok(output) => output,
        Err(failure) => {
            eprintln!("{failure}");
            return match failure {
                CompileFailure::Validation(_) => exit::code(exit::VALIDATION),
                CompileFailure::Dependency(_) => exit::code(exit::DEPENDENCY),
            };
        }
    };

    for warning in &output.warnings {
        eprintln!("warning: {warning}");
    }

    if let Err(e) = write_artifacts(&args.output, &output.plan, &output.manifest) {
        eprintln!("{e}");
        return exit::code(exit::IO);
    }

    println!(
        "compiled {} rule(s) into {} group(s) across {} layer(s) -> {}",
        output.plan.rules.len(),
        output.plan.groups.len(),
        output.plan.layer_count,
        args.output.display()
    );
    ExitCode::SUCCESS
}
