//! Payload parsing and schema definitions.
//!
//! This module handles:
//! - Decoding upstream overview, per-chain and directory payloads
//! - Lenient numeric coercion of loosely typed fields
//! - Decoding nested breakdowns into tagged leaves
//! - Defining the record types the aggregators exchange

pub mod breakdown;
pub mod lenient;
pub mod payload;
pub mod schema;

// Re-export main types
pub use breakdown::parse_breakdown;
pub use payload::{
    parse_chain_payload, parse_directory, parse_entities, parse_named_series, parse_overview,
};
pub use schema::{
    BreakdownEntry, BreakdownLeaf, ChainEntry, ChainPayload, ChainSlice, CrossChainEntity,
    DocumentHeader, EntitySummary, JoinedRow, MetricField, NamedSeries, NestedBreakdown, OutputDocument,
    OverviewPayload, ParentProtocol, ParentRollup, TimePoint,
};
