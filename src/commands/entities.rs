//! Entity table commands.
//!
//! The rollup command:
//! 1. Reads an entity list and the parent directory
//! 2. Computes the grand 24h total for dominance
//! 3. Groups children under their parents and rolls them up
//! 4. Writes the top-level rows
//!
//! The merge command reads one payload per chain and merges entities by
//! name. A chain file that cannot be read is treated as an empty payload so
//! the remaining chains still merge.

use super::models::{ChainInput, MergeArgs, RollupArgs};
use crate::aggregator::{
    grand_total_24h, is_all_chains, merge_across_chains, merge_tvl_across_chains, rollup_by_parent,
    MergeOptions, RollupOptions,
};
use crate::output::{read_json_value, write_document};
use crate::parser::schema::{ChainPayload, OutputDocument};
use crate::parser::{parse_chain_payload, parse_directory, parse_entities};
use crate::utils::config::ZeroHandling;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::time::Instant;

/// Execute the rollup command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Input or directory file missing or not JSON
/// * Directory has no usable parent list
/// * Output write errors
pub fn execute_rollup(args: RollupArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Step 1/4: Reading entities from {}...", args.input.display());
    let raw = read_json_value(&args.input).context("Failed to read entity input")?;
    let entities = parse_entities(&raw);

    let raw_directory = read_json_value(&args.directory).context("Failed to read parent directory")?;
    let directory = parse_directory(&raw_directory).context("Failed to parse parent directory")?;

    debug!("Parsed {} entities and {} parents", entities.len(), directory.len());

    info!("Step 2/4: Computing grand total...");
    let options = RollupOptions {
        grand_total_24h: grand_total_24h(&entities),
        zero_handling: if args.zero_as_missing {
            ZeroHandling::TreatAsMissing
        } else {
            ZeroHandling::Contribute
        },
    };
    debug!("Grand 24h total: {:?}", options.grand_total_24h);

    info!("Step 3/4: Rolling up children...");
    let rows = rollup_by_parent(&entities, &directory, &options);

    info!("Step 4/4: Writing {} rows...", rows.len());
    let document = OutputDocument::new("rollup", rows);
    write_document(&document, &args.output).context("Failed to write rollup rows")?;

    info!("✓ Rollup written to: {}", args.output.display());
    info!("Rollup completed in {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

/// Execute the merge command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Output write errors (unreadable chain files are not errors)
pub fn execute_merge(args: MergeArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Step 1/3: Reading {} chain payloads...", args.inputs.len());
    let payloads: Vec<ChainPayload> = args.inputs.iter().map(load_chain_payload).collect();

    if is_all_chains(&args.chains) {
        info!("Step 2/3: Chain selection covers all chains, skipping merge");
    } else {
        info!("Step 2/3: Merging across {} chains...", args.chains.len());
    }

    if args.tvl {
        let merged = merge_tvl_across_chains(&payloads, &args.chains);
        info!("Step 3/3: Writing {} entities...", merged.len());
        write_document(&OutputDocument::new("merge-tvl", merged), &args.output)
            .context("Failed to write merged entities")?;
    } else {
        let options = MergeOptions {
            compute_ratios: args.ratios,
        };
        let merged = merge_across_chains(&payloads, &args.chains, &options);
        info!("Step 3/3: Writing {} entities...", merged.len());
        write_document(&OutputDocument::new("merge", merged), &args.output)
            .context("Failed to write merged entities")?;
    }

    info!("✓ Merged entities written to: {}", args.output.display());
    info!("Merge completed in {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

/// Read one chain's payload, degrading to empty on any failure
///
/// **Private** - internal helper for execute_merge
fn load_chain_payload(input: &ChainInput) -> ChainPayload {
    match read_json_value(&input.path) {
        Ok(raw) => parse_chain_payload(&input.chain, &raw),
        Err(e) => {
            warn!(
                "Could not read payload for chain {} ({}): {}. Using an empty payload",
                input.chain,
                input.path.display(),
                e
            );
            ChainPayload::empty(input.chain.clone())
        }
    }
}

/// Validate rollup arguments
///
/// **Public** - can be called before execute_rollup for early validation
pub fn validate_rollup_args(args: &RollupArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Entity input path cannot be empty");
    }
    if args.directory.as_os_str().is_empty() {
        anyhow::bail!("Parent directory path cannot be empty");
    }
    if args.output == args.input || args.output == args.directory {
        anyhow::bail!("Output path must differ from the input paths");
    }
    Ok(())
}

/// Validate merge arguments
///
/// **Public** - can be called before execute_merge for early validation
pub fn validate_merge_args(args: &MergeArgs) -> Result<()> {
    if args.inputs.is_empty() {
        anyhow::bail!("At least one chain payload is required");
    }
    if let Some(bad) = args.inputs.iter().find(|i| i.chain.trim().is_empty()) {
        anyhow::bail!("Cannot determine the chain for input {}", bad.path.display());
    }
    if args.chains.iter().any(|c| c.trim().is_empty()) {
        anyhow::bail!("Chain names cannot be blank");
    }
    if args.inputs.iter().any(|i| i.path == args.output) {
        anyhow::bail!("Output path must differ from the input paths");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_rollup_args_missing_directory() {
        let args = RollupArgs {
            input: PathBuf::from("entities.json"),
            ..Default::default()
        };
        assert!(validate_rollup_args(&args).is_err());
    }

    #[test]
    fn test_validate_merge_args_requires_inputs() {
        assert!(validate_merge_args(&MergeArgs::default()).is_err());
    }

    #[test]
    fn test_validate_merge_args_blank_chain() {
        let args = MergeArgs {
            inputs: vec![ChainInput::parse("ethereum.json")],
            chains: vec!["  ".to_string()],
            ..Default::default()
        };
        assert!(validate_merge_args(&args).is_err());
    }

    #[test]
    fn test_load_missing_chain_degrades_to_empty() {
        let payload = load_chain_payload(&ChainInput::parse("ethereum=/definitely/not/here.json"));
        assert_eq!(payload.chain, "ethereum");
        assert!(payload.entities.is_empty());
    }

    #[test]
    fn test_chain_input_parse() {
        assert_eq!(
            ChainInput::parse("arbitrum=data/arb.json"),
            ChainInput {
                chain: "arbitrum".to_string(),
                path: PathBuf::from("data/arb.json"),
            }
        );
        assert_eq!(ChainInput::parse("data/Base.json").chain, "Base");
    }
}
