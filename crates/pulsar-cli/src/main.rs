use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod cmd_compile;
mod cmd_explain;
mod cmd_lint;
mod cmd_run;
mod exit;

#[derive(Parser)]
#[command(name = "pulsar", about = "Pulsar rules engine for sensor-driven reactive systems")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a YAML rule set into an execution plan and manifest
    Compile {
        /// Path to the rules YAML file
        #[arg(long)]
        rules: PathBuf,

        /// Path to the system config YAML file
        #[arg(long)]
        config: PathBuf,

        /// Output directory for execution_plan.json and rules.manifest.json
        #[arg(long)]
        output: PathBuf,

        /// Maximum rules per execution group
        #[arg(long)]
        max_rules_per_group: Option<usize>,

        /// Maximum emitted operations per execution group
        #[arg(long)]
        max_lines_per_group: Option<usize>,

        /// Producer-chain depth above which a warning is reported
        #[arg(long)]
        max_chain_depth: Option<usize>,

        /// Allow groups to span layers instead of one layer per group
        #[arg(long)]
        sequential_groups: bool,
    },

    /// Run a compiled plan against a sensor store
    Run {
        /// Directory containing the compiled plan
        #[arg(long)]
        plan: PathBuf,

        /// Store connection string (e.g. mem://)
        #[arg(long)]
        store: Option<String>,

        /// Override the plan's cycle time, in milliseconds
        #[arg(long)]
        cycle_ms: Option<u64>,

        /// Override the plan's per-sensor ring-buffer capacity
        #[arg(long)]
        buffer_capacity: Option<usize>,

        /// Optional pulsar.toml with [runtime] and [logging] settings
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Explain compiled rules in human-readable form
    Explain {
        /// Path to the rules YAML file
        #[arg(long)]
        rules: PathBuf,

        /// Path to the system config YAML file
        #[arg(long)]
        config: PathBuf,
    },

    /// Validate and analyze a rule set without emitting a plan
    Lint {
        /// Path to the rules YAML file
        #[arg(long)]
        rules: PathBuf,

        /// Path to the system config YAML file
        #[arg(long)]
        config: PathBuf,

        /// Producer-chain depth above which a warning is reported
        #[arg(long)]
        max_chain_depth: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            rules,
            config,
            output,
            max_rules_per_group,
            max_lines_per_group,
            max_chain_depth,
            sequential_groups,
        } => cmd_compile::run(cmd_compile::CompileArgs {
            rules,
            config,
            output,
            max_rules_per_group,
            max_lines_per_group,
            max_chain_depth,
            sequential_groups,
        }),
        Commands::Run {
            plan,
            store,
            cycle_ms,
            buffer_capacity,
            config,
        } => {
            cmd_run::run(cmd_run::RunArgs {
                plan,
                store,
                cycle_ms,
                buffer_capacity,
                config,
            })
            .await
        }
        Commands::Explain { rules, config } => cmd_explain::run(rules, config),
        Commands::Lint {
            rules,
            config,
            max_chain_depth,
        } => cmd_lint::run(rules, config, max_chain_depth),
    }
}
