//! Configuration and constants for aggregation and the CLI.

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Pseudo-chain selector meaning "already aggregated upstream across every chain"
pub const ALL_CHAINS_SELECTOR: &str = "All";

// pf/ps annualise a 30d total by this factor before dividing mcap by it
pub const ANNUALIZATION_FACTOR: f64 = 12.0;

/// Decimal places kept on pf/ps ratios
pub const RATIO_DECIMALS: i32 = 2;

// Lower-cased raw chain keys whose display form is not plain capitalisation
pub const CHAIN_DISPLAY_NAMES: &[(&str, &str)] = &[
    ("avax", "Avalanche"),
    ("bsc", "BSC"),
    ("xdai", "xDai"),
    ("okexchain", "OKExChain"),
    ("ton", "TON"),
    ("op mainnet", "OP Mainnet"),
];

// Field names accepted for the timestamp / nested map of object-shaped breakdown entries
pub const BREAKDOWN_DATE_FIELDS: &[&str] = &["date", "timestamp"];
pub const BREAKDOWN_VALUE_FIELDS: &[&str] = &["values", "breakdown", "data"];

/// How a `0` contribution is treated by rollup sums.
///
/// `Contribute` counts zero as a real observation. `TreatAsMissing` mirrors
/// the legacy truthy reducer that skipped zeros, for callers whose
/// presentation relies on a zero-only field reading as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroHandling {
    #[default]
    Contribute,
    TreatAsMissing,
}
