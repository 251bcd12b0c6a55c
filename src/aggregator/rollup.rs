//! Roll child entities (protocol versions, sub-protocols) up into parents.
//!
//! Absolute metrics are summed over the children that define them. Headline
//! changes are never averaged from the children: the reference totals at
//! each offset are summed first and the change is computed once from those
//! sums, so a parent's change always agrees with its own totals.

use super::ratios::{annualized_ratio, apply_derived_ratios, dominance, recompute_changes, volume_tvl};
use crate::parser::schema::{EntitySummary, MetricField, ParentProtocol, ParentRollup};
use crate::utils::config::ZeroHandling;
use log::{debug, warn};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Absolute fields a parent takes as the sum of its children
pub const ROLLUP_SUM_FIELDS: &[MetricField] = &[
    MetricField::Total24h,
    MetricField::Total48hTo24h,
    MetricField::Total7DaysAgo,
    MetricField::Total30DaysAgo,
    MetricField::Total7d,
    MetricField::Total14dTo7d,
    MetricField::Total30d,
    MetricField::Total1y,
    MetricField::Average1y,
    MetricField::TotalAllTime,
    MetricField::Revenue24h,
    MetricField::Revenue7d,
    MetricField::Revenue30d,
    MetricField::Revenue1y,
    MetricField::HoldersRevenue24h,
    MetricField::HoldersRevenue30d,
    MetricField::Bribes24h,
    MetricField::Bribes30d,
    MetricField::TokenTax24h,
    MetricField::TokenTax30d,
    MetricField::Emissions24h,
    MetricField::Emissions30d,
    MetricField::Mcap,
    MetricField::Tvl,
    MetricField::TvlPrevDay,
    MetricField::TvlPrevWeek,
    MetricField::TvlPrevMonth,
];

/// Metric families that get a generated methodology line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricFamily {
    Fees,
    Revenue,
    ProtocolRevenue,
    HoldersRevenue,
    SupplySideRevenue,
    UserFees,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 6] = [
        MetricFamily::Fees,
        MetricFamily::Revenue,
        MetricFamily::ProtocolRevenue,
        MetricFamily::HoldersRevenue,
        MetricFamily::SupplySideRevenue,
        MetricFamily::UserFees,
    ];

    /// Key under which the family appears in a methodology map
    pub fn key(self) -> &'static str {
        match self {
            MetricFamily::Fees => "Fees",
            MetricFamily::Revenue => "Revenue",
            MetricFamily::ProtocolRevenue => "ProtocolRevenue",
            MetricFamily::HoldersRevenue => "HoldersRevenue",
            MetricFamily::SupplySideRevenue => "SupplySideRevenue",
            MetricFamily::UserFees => "UserFees",
        }
    }
}

/// Per-call rollup settings
#[derive(Debug, Clone, Copy, Default)]
pub struct RollupOptions {
    /// Sum of `total24h` over every top-level entity, for dominance
    pub grand_total_24h: Option<f64>,

    pub zero_handling: ZeroHandling,
}

/// Sum `field` over the children that define it; `None` if none do
pub fn sum_field(children: &[EntitySummary], field: MetricField, zero_handling: ZeroHandling) -> Option<f64> {
    children
        .iter()
        .filter_map(|child| child.get(field))
        .filter(|v| v.is_finite())
        .filter(|v| zero_handling == ZeroHandling::Contribute || *v != 0.0)
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// Roll `children` up into a single parent row
///
/// **Public** - main entry point for parent rollups
///
/// # Arguments
/// * `parent` - Directory entry of the parent (identity and mcap)
/// * `children` - Child summaries; `None` is treated as no children
/// * `options` - Grand total for dominance and zero handling
///
/// # Returns
/// A parent row whose `sub_rows` holds the children. With no children the
/// row carries only the parent's own directory metrics.
pub fn rollup_parent(
    parent: &ParentProtocol,
    children: Option<&[EntitySummary]>,
    options: &RollupOptions,
) -> ParentRollup {
    let children = children.unwrap_or(&[]);
    debug!("Rolling up {} children into {}", children.len(), parent.name);

    let mut rollup = EntitySummary::new(parent.name.clone());
    rollup.display_name = parent.display_name.clone();
    rollup.id = Some(parent.id.clone());

    for &field in ROLLUP_SUM_FIELDS {
        *rollup.slot(field) = sum_field(children, field, options.zero_handling);
    }
    // The directory's market cap describes the parent token itself
    if parent.mcap.is_some() {
        rollup.mcap = parent.mcap;
    }

    recompute_changes(&mut rollup);

    rollup.chains = union_strings(children.iter().map(|c| c.chains.as_slice()));
    rollup.oracles = union_strings(children.iter().map(|c| c.oracles.as_slice()));
    rollup.category = top_child(children).and_then(|c| c.category.clone());
    rollup.methodology = generate_methodology(children);
    rollup.breakdown_24h = merge_breakdowns(children);

    apply_derived_ratios(&mut rollup, options.grand_total_24h);

    if !children.is_empty() {
        rollup.sub_rows = Some(children.to_vec());
    }

    rollup
}

/// Group a flat entity list by parent and roll each group up
///
/// **Public** - builds the top-level table rows
///
/// Entities whose `parentProtocol` matches a directory entry (by id, or by
/// name) are rolled up under it. Entities with no parent, or a parent the
/// directory does not know, stay top-level rows. Rows are sorted by
/// `total24h`, largest first, rows without a value last.
pub fn rollup_by_parent(
    entities: &[EntitySummary],
    directory: &[ParentProtocol],
    options: &RollupOptions,
) -> Vec<EntitySummary> {
    let mut by_key: HashMap<&str, &ParentProtocol> = HashMap::new();
    for parent in directory {
        by_key.insert(parent.id.as_str(), parent);
        by_key.entry(parent.name.as_str()).or_insert(parent);
    }

    let mut groups: Vec<(&ParentProtocol, Vec<EntitySummary>)> = Vec::new();
    let mut group_index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<EntitySummary> = Vec::new();

    for entity in entities {
        let parent = match entity.parent_protocol.as_deref() {
            None => None,
            Some(key) => {
                let found = by_key.get(key).copied();
                if found.is_none() {
                    warn!(
                        "{} references unknown parent {}, keeping it top-level",
                        entity.name, key
                    );
                }
                found
            }
        };

        match parent {
            Some(parent) => {
                let idx = *group_index.entry(parent.id.as_str()).or_insert_with(|| {
                    groups.push((parent, Vec::new()));
                    groups.len() - 1
                });
                groups[idx].1.push(entity.clone());
            }
            None => rows.push(finalize_standalone(entity, options)),
        }
    }

    debug!(
        "Grouped {} entities into {} parents and {} standalone rows",
        entities.len(),
        groups.len(),
        rows.len()
    );

    rows.extend(
        groups
            .iter()
            .map(|(parent, children)| rollup_parent(parent, Some(children.as_slice()), options)),
    );

    rows.sort_by(|a, b| b.total24h.partial_cmp(&a.total24h).unwrap_or(Ordering::Equal));
    rows
}

/// Sum of `total24h` over top-level entities; `None` if none report it
pub fn grand_total_24h(entities: &[EntitySummary]) -> Option<f64> {
    sum_field(entities, MetricField::Total24h, ZeroHandling::Contribute)
}

/// Methodology text for a set of children, one entry per metric family
///
/// **Public** - `"Sum of all A, B and C"` for several children, `"All A"`
/// (upper-cased) for exactly one, nothing for none.
pub fn generate_methodology(children: &[EntitySummary]) -> BTreeMap<String, String> {
    let names: Vec<&str> = children.iter().map(|c| c.label()).collect();

    let text = match names.as_slice() {
        [] => return BTreeMap::new(),
        [only] => format!("All {}", only.to_uppercase()),
        [init @ .., last] => format!("Sum of all {} and {}", init.join(", "), last),
    };

    MetricFamily::ALL
        .iter()
        .map(|family| (family.key().to_string(), text.clone()))
        .collect()
}

/// Merge children's `chain -> sub-protocol -> value` maps by summing
///
/// **Public** - `None` when no child carries a breakdown
pub fn merge_breakdowns(children: &[EntitySummary]) -> Option<BTreeMap<String, BTreeMap<String, f64>>> {
    let mut merged: Option<BTreeMap<String, BTreeMap<String, f64>>> = None;

    for breakdown in children.iter().filter_map(|c| c.breakdown_24h.as_ref()) {
        let merged = merged.get_or_insert_with(BTreeMap::new);
        for (chain, by_sub) in breakdown {
            let target = merged.entry(chain.clone()).or_default();
            for (sub, value) in by_sub {
                *target.entry(sub.clone()).or_insert(0.0) += value;
            }
        }
    }

    merged
}

/// Fill derived ratios on a row that is not rolled up
///
/// **Private** - keeps upstream pf/ps when they cannot be recomputed
fn finalize_standalone(entity: &EntitySummary, options: &RollupOptions) -> EntitySummary {
    let mut row = entity.clone();
    row.pf = annualized_ratio(row.mcap, row.total30d).or(row.pf);
    row.ps = annualized_ratio(row.mcap, row.revenue30d).or(row.ps);
    row.dominance = dominance(row.total24h, options.grand_total_24h);
    row.volumetvl = volume_tvl(row.total24h, row.tvl);
    row
}

/// The child with the largest `total24h` (first one on ties)
///
/// **Private** - decides the parent's category
fn top_child(children: &[EntitySummary]) -> Option<&EntitySummary> {
    children.iter().fold(None, |best: Option<&EntitySummary>, child| match best {
        Some(b) if child.total24h.unwrap_or(0.0) <= b.total24h.unwrap_or(0.0) => Some(b),
        _ => Some(child),
    })
}

/// Order-preserving union of string lists
///
/// **Private** - chains and oracles
fn union_strings<'a>(lists: impl Iterator<Item = &'a [String]>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in lists.flatten() {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(name: &str, total24h: Option<f64>) -> EntitySummary {
        let mut c = EntitySummary::new(name);
        c.total24h = total24h;
        c
    }

    #[test]
    fn test_sum_field_skips_missing_but_counts_zero() {
        let children = vec![child("a", Some(0.0)), child("b", None)];
        assert_eq!(sum_field(&children, MetricField::Total24h, ZeroHandling::Contribute), Some(0.0));
        assert_eq!(sum_field(&children, MetricField::Total24h, ZeroHandling::TreatAsMissing), None);
        assert_eq!(sum_field(&children, MetricField::Revenue24h, ZeroHandling::Contribute), None);
    }

    #[test]
    fn test_methodology_wording() {
        let one = generate_methodology(&[child("v2", None)]);
        assert_eq!(one["Fees"], "All V2");

        let two = generate_methodology(&[child("V1", None), child("V2", None)]);
        assert_eq!(two["Revenue"], "Sum of all V1 and V2");

        let three = generate_methodology(&[child("V1", None), child("V2", None), child("V3", None)]);
        assert_eq!(three["UserFees"], "Sum of all V1, V2 and V3");
        assert_eq!(three.len(), 6);

        assert!(generate_methodology(&[]).is_empty());
    }

    #[test]
    fn test_top_child_picks_largest() {
        let children = vec![child("a", Some(1.0)), child("b", Some(5.0)), child("c", None)];
        assert_eq!(top_child(&children).unwrap().name, "b");
    }

    #[test]
    fn test_merge_breakdowns_sums() {
        let mut a = child("a", None);
        a.breakdown_24h = Some(BTreeMap::from([(
            "ethereum".to_string(),
            BTreeMap::from([("v1".to_string(), 1.0)]),
        )]));
        let mut b = child("b", None);
        b.breakdown_24h = Some(BTreeMap::from([(
            "ethereum".to_string(),
            BTreeMap::from([("v1".to_string(), 2.0), ("v2".to_string(), 3.0)]),
        )]));

        let merged = merge_breakdowns(&[a, b, child("c", None)]).unwrap();
        assert_eq!(merged["ethereum"]["v1"], 3.0);
        assert_eq!(merged["ethereum"]["v2"], 3.0);
        assert!(merge_breakdowns(&[child("c", None)]).is_none());
    }
}
