//! Chart series commands.
//!
//! The join command:
//! 1. Reads a file of labelled series
//! 2. Joins them into one row per timestamp
//! 3. Writes the rows with the label legend
//!
//! The flatten command reads a nested breakdown and writes one series per
//! group along the chosen axis.

use super::models::{FlattenArgs, JoinArgs};
use crate::aggregator::{flatten_breakdown, join_series, join_series_sorted};
use crate::output::{read_json_value, write_document};
use crate::parser::schema::OutputDocument;
use crate::parser::{parse_breakdown, parse_named_series};
use anyhow::{Context, Result};
use log::{debug, info};
use std::time::Instant;

/// Execute the join command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Input file missing or not JSON
/// * Input is neither a label map nor a series list
/// * Output write errors
pub fn execute_join(args: JoinArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Step 1/3: Reading series from {}...", args.input.display());
    let raw = read_json_value(&args.input).context("Failed to read series input")?;
    let series = parse_named_series(&raw).context("Failed to parse series input")?;

    debug!("Parsed {} series", series.len());

    info!("Step 2/3: Joining series...");
    let rows = if args.sort {
        join_series_sorted(&series)
    } else {
        join_series(&series)
    };

    let legend: Vec<String> = series
        .iter()
        .filter(|s| s.series.is_some())
        .map(|s| s.label.clone())
        .fold(Vec::new(), |mut acc, label| {
            if !acc.contains(&label) {
                acc.push(label);
            }
            acc
        });

    info!("Step 3/3: Writing {} rows...", rows.len());
    let document = OutputDocument::new("join", rows).with_legend(legend);
    write_document(&document, &args.output).context("Failed to write joined rows")?;

    info!("✓ Joined rows written to: {}", args.output.display());
    info!("Join completed in {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

/// Execute the flatten command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Input file missing or not JSON
/// * Output write errors
pub fn execute_flatten(args: FlattenArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Step 1/3: Reading breakdown from {}...", args.input.display());
    let raw = read_json_value(&args.input).context("Failed to read breakdown input")?;

    // An overview payload carries its breakdown under a named key
    let breakdown = parse_breakdown(raw.get("totalDataChartBreakdown").unwrap_or(&raw));

    debug!("Parsed {} breakdown timestamps", breakdown.entries.len());

    info!("Step 2/3: Flattening by {:?}...", args.axis);
    let flattened = flatten_breakdown(&breakdown, args.axis);

    info!(
        "Step 3/3: Writing {} rows across {} groups...",
        flattened.rows.len(),
        flattened.legend.len()
    );
    let document = OutputDocument::new("flatten", flattened.rows).with_legend(flattened.legend);
    write_document(&document, &args.output).context("Failed to write flattened rows")?;

    info!("✓ Flattened rows written to: {}", args.output.display());
    info!("Flatten completed in {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

/// Validate join arguments
///
/// **Public** - can be called before execute_join for early validation
pub fn validate_join_args(args: &JoinArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Series input path cannot be empty");
    }
    if args.input == args.output {
        anyhow::bail!("Output path must differ from the input path");
    }
    Ok(())
}

/// Validate flatten arguments
///
/// **Public** - can be called before execute_flatten for early validation
pub fn validate_flatten_args(args: &FlattenArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Breakdown input path cannot be empty");
    }
    if args.input == args.output {
        anyhow::bail!("Output path must differ from the input path");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_join_args_empty_input() {
        assert!(validate_join_args(&JoinArgs::default()).is_err());
    }

    #[test]
    fn test_validate_join_args_same_paths() {
        let args = JoinArgs {
            input: PathBuf::from("a.json"),
            output: PathBuf::from("a.json"),
            ..Default::default()
        };
        assert!(validate_join_args(&args).is_err());
    }

    #[test]
    fn test_validate_flatten_args_valid() {
        let args = FlattenArgs {
            input: PathBuf::from("breakdown.json"),
            ..Default::default()
        };
        assert!(validate_flatten_args(&args).is_ok());
    }
}
