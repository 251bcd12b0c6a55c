use crate::output::read_document;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Validate an output document written by one of the commands
pub fn validate_output_file(file_path: PathBuf) -> Result<()> {
    println!("Validating output: {}", file_path.display());

    let document = read_document(&file_path).context("Not a valid output document")?;

    if document.version != SCHEMA_VERSION {
        anyhow::bail!(
            "Schema version mismatch: file has {}, expected {}",
            document.version,
            SCHEMA_VERSION
        );
    }

    println!("✓ Valid output JSON");
    println!("  Version: {}", document.version);
    println!("  Kind: {}", document.kind);
    println!("  Generated: {}", document.generated_at);
    println!("  Records: {}", document.record_count());
    if let Some(legend) = &document.legend {
        println!("  Legend: {}", legend.join(", "));
    }

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("DeFi Metrics Studio Output Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string          - Schema version (e.g., '1.0.0')");
        println!("  kind: string             - join | flatten | rollup | merge | merge-tvl");
        println!("  legend: array?           - Group labels in first-seen order (chart outputs)");
        println!("  generatedAt: string      - ISO 8601 timestamp");
        println!("  data: array              - Aggregated records");
        println!("    join/flatten rows:");
        println!("      date: string         - Timestamp as a string");
        println!("      <label>: number      - One field per series or group present");
        println!("    rollup/merge entities:");
        println!("      name: string         - Entity name");
        println!("      total24h..: number?  - Absolute totals, null when unknown");
        println!("      change_1d..: number? - Percentage changes, null when unknown");
        println!("      pf, ps: number?      - Market cap over annualised fees/revenue");
        println!("      dominance: number?   - Share of the grand 24h total (%)");
        println!("      subRows: array?      - Children of a rolled-up parent");
        println!("      chainBreakdown: object? - Per-chain records keyed by chain (merge)");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("DeFi Metrics Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Output Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Aggregation of DeFi metric series and per-chain protocol summaries.");
}
