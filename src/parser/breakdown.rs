//! Decoding of nested breakdown payloads.
//!
//! Wire shape: `[[timestamp, { chain: { subProtocol: leaf } }], ...]` where a
//! leaf is a number or a `{ token: number }` map. The shape varies by metric
//! type, so decoding is defensive: entries or leaves that cannot be read are
//! skipped and counted, never fatal.

use super::lenient::{to_finite, to_timestamp};
use super::schema::{BreakdownEntry, BreakdownLeaf, ChainSlice, NestedBreakdown};
use crate::utils::config::{BREAKDOWN_DATE_FIELDS, BREAKDOWN_VALUE_FIELDS};
use log::{debug, warn};
use serde_json::{Map, Value};

impl From<Value> for NestedBreakdown {
    fn from(raw: Value) -> Self {
        parse_breakdown(&raw)
    }
}

/// Decode a raw breakdown value
///
/// **Public** - main entry point for breakdown decoding
///
/// Accepts an array of `[timestamp, map]` pairs, an array of
/// `{ date, values }` objects, or an object keyed by timestamp.
/// `null` and any other shape decode to an empty breakdown.
pub fn parse_breakdown(raw: &Value) -> NestedBreakdown {
    let mut skipped = 0usize;

    let entries: Vec<BreakdownEntry> = match raw {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let entry = parse_entry(item);
                if entry.is_none() {
                    skipped += 1;
                }
                entry
            })
            .collect(),

        Value::Object(by_timestamp) => by_timestamp
            .iter()
            .filter_map(|(ts, chains)| {
                let entry = ts
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .zip(chains.as_object())
                    .map(|(timestamp, chains)| BreakdownEntry {
                        timestamp,
                        chains: parse_chains(chains, &mut skipped),
                    });
                if entry.is_none() {
                    skipped += 1;
                }
                entry
            })
            .collect(),

        Value::Null => Vec::new(),

        _ => {
            warn!("Breakdown payload is neither an array nor an object, ignoring it");
            Vec::new()
        }
    };

    if skipped > 0 {
        warn!("Skipped {} unreadable breakdown entries or leaves", skipped);
    }
    debug!("Decoded breakdown with {} timestamps", entries.len());

    NestedBreakdown { entries }
}

/// Decode one timestamped entry
///
/// **Private** - internal helper for parse_breakdown
fn parse_entry(item: &Value) -> Option<BreakdownEntry> {
    let (timestamp, chains) = match item {
        Value::Array(pair) if pair.len() >= 2 => (to_timestamp(&pair[0])?, pair[1].as_object()?),
        Value::Object(obj) => {
            let timestamp = BREAKDOWN_DATE_FIELDS
                .iter()
                .find_map(|k| obj.get(*k).and_then(to_timestamp))?;
            let chains = BREAKDOWN_VALUE_FIELDS
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_object))?;
            (timestamp, chains)
        }
        _ => return None,
    };

    let mut skipped = 0usize;
    let chains = parse_chains(chains, &mut skipped);
    if skipped > 0 {
        debug!("Entry {} had {} unreadable leaves", timestamp, skipped);
    }

    Some(BreakdownEntry { timestamp, chains })
}

/// Decode the `{ chain: { subProtocol: leaf } }` map of one entry
///
/// **Private** - internal helper
fn parse_chains(chains: &Map<String, Value>, skipped: &mut usize) -> Vec<ChainSlice> {
    chains
        .iter()
        .filter_map(|(chain, inner)| {
            let Some(inner) = inner.as_object() else {
                *skipped += 1;
                return None;
            };

            let entries = inner
                .iter()
                .filter_map(|(sub, leaf)| {
                    let parsed = parse_leaf(leaf);
                    if parsed.is_none() {
                        *skipped += 1;
                    }
                    parsed.map(|leaf| (sub.clone(), leaf))
                })
                .collect();

            Some(ChainSlice {
                chain: chain.clone(),
                entries,
            })
        })
        .collect()
}

/// Decode a leaf into its tagged form
///
/// **Public** - reused by tests and the flattener fixtures
pub fn parse_leaf(leaf: &Value) -> Option<BreakdownLeaf> {
    match leaf {
        Value::Object(tokens) => Some(BreakdownLeaf::TokenMap(
            tokens
                .iter()
                .filter_map(|(token, v)| to_finite(v).map(|n| (token.clone(), n)))
                .collect(),
        )),
        other => to_finite(other).map(BreakdownLeaf::Number),
    }
}
