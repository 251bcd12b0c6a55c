//! Flatten nested breakdowns into per-group chart series.
//!
//! A breakdown reports `timestamp -> chain -> sub-protocol -> leaf`. Each
//! flattener picks one axis to group by and sums everything else away:
//! - by version: innermost key, upper-cased; one row per timestamp
//! - by chain: middle key, display-formatted; one row per (timestamp, chain)
//! - by token: token symbol of token-map leaves; one row per (timestamp, token)

use super::chain_names::format_chain_name;
use crate::parser::schema::{BreakdownLeaf, JoinedRow, NestedBreakdown};
use clap::ValueEnum;
use log::debug;
use std::collections::HashMap;

/// Flattened rows plus the distinct group labels in first-seen order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlattenedSeries {
    pub rows: Vec<JoinedRow>,
    pub legend: Vec<String>,
}

/// Grouping axis for [`flatten_breakdown`], also the CLI's `--by` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BreakdownAxis {
    #[value(alias = "category")]
    Version,
    Chain,
    Token,
}

/// Flatten along `axis`
///
/// **Public** - dispatch used by the CLI
pub fn flatten_breakdown(breakdown: &NestedBreakdown, axis: BreakdownAxis) -> FlattenedSeries {
    match axis {
        BreakdownAxis::Version => breakdown_by_version(breakdown),
        BreakdownAxis::Chain => breakdown_by_chain(breakdown),
        BreakdownAxis::Token => breakdown_by_token(breakdown),
    }
}

/// Group by sub-protocol / version, summing across chains
///
/// **Public** - one row per timestamp, one field per upper-cased version
pub fn breakdown_by_version(breakdown: &NestedBreakdown) -> FlattenedSeries {
    let mut acc = RowAccumulator::<i64>::default();

    for entry in &breakdown.entries {
        for slice in &entry.chains {
            for (version, leaf) in &slice.entries {
                acc.add(entry.timestamp, entry.timestamp, &version.to_uppercase(), leaf.resolve());
            }
        }
    }

    acc.finish("version")
}

/// Group by chain, summing across sub-protocols
///
/// **Public** - rows are keyed by (timestamp, chain)
pub fn breakdown_by_chain(breakdown: &NestedBreakdown) -> FlattenedSeries {
    let mut acc = RowAccumulator::<(i64, String)>::default();

    for entry in &breakdown.entries {
        for slice in &entry.chains {
            let chain = format_chain_name(&slice.chain);
            for (_, leaf) in &slice.entries {
                acc.add(
                    (entry.timestamp, chain.clone()),
                    entry.timestamp,
                    &chain,
                    leaf.resolve(),
                );
            }
        }
    }

    acc.finish("chain")
}

/// Group by token symbol; plain-number leaves carry no token and are skipped
///
/// **Public** - rows are keyed by (timestamp, token)
pub fn breakdown_by_token(breakdown: &NestedBreakdown) -> FlattenedSeries {
    let mut acc = RowAccumulator::<(i64, String)>::default();

    for entry in &breakdown.entries {
        for slice in &entry.chains {
            for (_, leaf) in &slice.entries {
                let BreakdownLeaf::TokenMap(tokens) = leaf else {
                    continue;
                };
                for (token, value) in tokens {
                    acc.add((entry.timestamp, token.clone()), entry.timestamp, token, *value);
                }
            }
        }
    }

    acc.finish("token")
}

/// Rows addressed by a composite key, with a first-seen legend
struct RowAccumulator<K> {
    rows: Vec<JoinedRow>,
    index: HashMap<K, usize>,
    legend: Vec<String>,
}

impl<K> Default for RowAccumulator<K> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
            legend: Vec::new(),
        }
    }
}

impl<K: std::hash::Hash + Eq> RowAccumulator<K> {
    fn row(&mut self, key: K, timestamp: i64) -> &mut JoinedRow {
        let rows = &mut self.rows;
        let idx = *self.index.entry(key).or_insert_with(|| {
            rows.push(JoinedRow::new(timestamp));
            rows.len() - 1
        });
        &mut self.rows[idx]
    }

    fn add(&mut self, key: K, timestamp: i64, label: &str, value: f64) {
        if !self.legend.iter().any(|l| l == label) {
            self.legend.push(label.to_string());
        }
        self.row(key, timestamp).add(label, value);
    }

    fn finish(self, axis: &str) -> FlattenedSeries {
        debug!(
            "Flattened breakdown by {}: {} rows, {} labels",
            axis,
            self.rows.len(),
            self.legend.len()
        );
        FlattenedSeries {
            rows: self.rows,
            legend: self.legend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::breakdown::parse_breakdown;
    use serde_json::json;

    fn fixture() -> NestedBreakdown {
        parse_breakdown(&json!([
            [100, {
                "ethereum": { "v2": 10, "v3": { "USDC": 1, "WETH": 2 } },
                "avax": { "v2": 4 }
            }],
            [200, {
                "ethereum": { "v3": { "USDC": 5 } }
            }]
        ]))
    }

    #[test]
    fn test_by_version_sums_across_chains() {
        let flat = breakdown_by_version(&fixture());

        assert_eq!(flat.legend, vec!["V2".to_string(), "V3".to_string()]);
        assert_eq!(flat.rows.len(), 2);
        assert_eq!(flat.rows[0].get("V2"), Some(14.0));
        assert_eq!(flat.rows[0].get("V3"), Some(3.0));
        assert_eq!(flat.rows[1].get("V3"), Some(5.0));
        assert_eq!(flat.rows[1].get("V2"), None);
    }

    #[test]
    fn test_by_chain_rows_per_chain() {
        let flat = breakdown_by_chain(&fixture());

        assert_eq!(flat.legend, vec!["Ethereum".to_string(), "Avalanche".to_string()]);
        assert_eq!(flat.rows.len(), 3);
        assert_eq!(flat.rows[0].date, "100");
        assert_eq!(flat.rows[0].get("Ethereum"), Some(13.0));
        assert_eq!(flat.rows[0].get("Avalanche"), None);
        assert_eq!(flat.rows[1].get("Avalanche"), Some(4.0));
    }

    #[test]
    fn test_by_token_skips_plain_numbers() {
        let flat = breakdown_by_token(&fixture());

        assert_eq!(flat.legend, vec!["USDC".to_string(), "WETH".to_string()]);
        assert_eq!(flat.rows.len(), 3);
        let usdc: f64 = flat.rows.iter().filter_map(|r| r.get("USDC")).sum();
        assert_eq!(usdc, 6.0);
    }

    #[test]
    fn test_axis_parses_cli_values() {
        assert_eq!(BreakdownAxis::from_str("Chain", true), Ok(BreakdownAxis::Chain));
        assert_eq!(BreakdownAxis::from_str("category", false), Ok(BreakdownAxis::Version));
        assert!(BreakdownAxis::from_str("nope", true).is_err());
    }
}
