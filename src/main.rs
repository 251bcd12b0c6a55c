//! DeFi Metrics Studio CLI
//!
//! Joins metric series, flattens breakdowns, rolls protocols up into
//! parents and merges per-chain protocol payloads.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use defi_metrics_studio::aggregator::BreakdownAxis;
use defi_metrics_studio::commands::{
    display_schema, display_version, execute_flatten, execute_join, execute_merge, execute_rollup,
    validate_flatten_args, validate_join_args, validate_merge_args, validate_output_file,
    validate_rollup_args, ChainInput, FlattenArgs, JoinArgs, MergeArgs, RollupArgs,
};

/// DeFi Metrics Studio - aggregation of DeFi metric payloads
#[derive(Parser, Debug)]
#[command(name = "defi-metrics")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true, env = "DEFI_METRICS_VERBOSE")]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Join labelled series into one row per timestamp
    Join {
        /// Series JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for joined rows
        #[arg(short, long, default_value = "joined.json")]
        output: PathBuf,

        /// Sort rows by timestamp
        #[arg(long)]
        sort: bool,
    },

    /// Flatten a nested breakdown into per-group series
    Flatten {
        /// Breakdown or overview JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for flattened rows
        #[arg(short, long, default_value = "flattened.json")]
        output: PathBuf,

        /// Grouping axis
        #[arg(long = "by", value_enum, default_value = "version")]
        by: BreakdownAxis,
    },

    /// Roll child protocols up into their parents
    Rollup {
        /// Entity list or overview JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Parent-protocol directory JSON file
        #[arg(short, long)]
        directory: PathBuf,

        /// Output path for rolled-up rows
        #[arg(short, long, default_value = "rollup.json")]
        output: PathBuf,

        /// Skip zero-valued children when summing
        #[arg(long)]
        zero_as_missing: bool,
    },

    /// Merge per-chain payloads into one record per entity
    Merge {
        /// Chain payload as CHAIN=PATH, or a path named after its chain (repeatable)
        #[arg(short, long = "input", required = true)]
        inputs: Vec<String>,

        /// Chains to merge (comma separated); omit or use "All" to pass through
        #[arg(long, value_delimiter = ',')]
        chains: Vec<String>,

        /// Output path for merged entities
        #[arg(short, long, default_value = "merged.json")]
        output: PathBuf,

        /// Derive pf/ps on merged records
        #[arg(long)]
        ratios: bool,

        /// Merge protocol TVL lists instead of metric summaries
        #[arg(long)]
        tvl: bool,
    },

    /// Validate an output JSON file
    Validate {
        /// Path to output JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Join { input, output, sort } => {
            let args = JoinArgs { input, output, sort };
            validate_join_args(&args)?;
            execute_join(args)?;
        }

        Commands::Flatten { input, output, by } => {
            let args = FlattenArgs {
                input,
                output,
                axis: by,
            };
            validate_flatten_args(&args)?;
            execute_flatten(args)?;
        }

        Commands::Rollup {
            input,
            directory,
            output,
            zero_as_missing,
        } => {
            let args = RollupArgs {
                input,
                directory,
                output,
                zero_as_missing,
            };
            validate_rollup_args(&args)?;
            execute_rollup(args)?;
        }

        Commands::Merge {
            inputs,
            chains,
            output,
            ratios,
            tvl,
        } => {
            let args = MergeArgs {
                inputs: inputs.iter().map(|s| ChainInput::parse(s)).collect(),
                chains,
                output,
                ratios,
                tvl,
            };
            validate_merge_args(&args)?;
            execute_merge(args)?;
        }

        Commands::Validate { file } => {
            validate_output_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
