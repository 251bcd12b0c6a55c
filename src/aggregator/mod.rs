//! Aggregation of metric series and entity summaries into dashboard rows.
//!
//! This module turns parsed upstream payloads into:
//! - Joined chart rows (one row per timestamp across labelled series)
//! - Flattened breakdown series with legends
//! - Parent rollups and cross-chain merged entity records

pub mod breakdown;
pub mod cache;
pub mod chain_names;
pub mod cross_chain;
pub mod joiner;
pub mod ratios;
pub mod rollup;
pub mod weighted;

// Re-export main types and functions
pub use breakdown::{
    breakdown_by_chain, breakdown_by_token, breakdown_by_version, flatten_breakdown, BreakdownAxis,
    FlattenedSeries,
};
pub use cache::{cached_chains_by_volume, chains_by_volume, ChainListCache};
pub use chain_names::{chain_key, format_chain_name};
pub use cross_chain::{is_all_chains, merge_across_chains, merge_tvl_across_chains, MergeOptions};
pub use joiner::{join_series, join_series_sorted};
pub use rollup::{grand_total_24h, rollup_by_parent, rollup_parent, RollupOptions};
pub use weighted::{apply_weighted_change, WeightedAccumulator, WeightedStore};
