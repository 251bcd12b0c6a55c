//! Merge per-chain snapshots of the same entity into one record.
//!
//! Absolute totals are summed. Percentage changes are folded through a
//! [`WeightedStore`] kept beside the record under construction, weighted by
//! the absolute metric each change describes. Ratio-of-ratio changes
//! (`*_7dover7d`, `*_30dover30d`) cannot be re-weighted and keep the first
//! value seen.

use super::chain_names::chain_key;
use super::ratios::annualized_ratio;
use super::weighted::{apply_weighted_change, WeightedStore};
use crate::parser::lenient::finite;
use crate::parser::schema::{ChainEntry, ChainPayload, CrossChainEntity, EntitySummary, MetricField};
use crate::utils::config::ALL_CHAINS_SELECTOR;
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// Absolute fields summed across chains
pub const MERGE_SUM_FIELDS: &[MetricField] = &[
    MetricField::Total24h,
    MetricField::Total7d,
    MetricField::Total30d,
    MetricField::TotalAllTime,
    MetricField::Revenue24h,
    MetricField::Revenue7d,
    MetricField::Revenue30d,
    MetricField::Revenue1y,
    MetricField::HoldersRevenue24h,
    MetricField::HoldersRevenue30d,
];

/// Percentage fields and the absolute field that weights them
pub const WEIGHTED_FIELDS: &[(MetricField, MetricField)] = &[
    (MetricField::Change1d, MetricField::Total24h),
    (MetricField::Change7d, MetricField::Total7d),
    (MetricField::Change1m, MetricField::Total30d),
    (MetricField::FeesChange1d, MetricField::Total24h),
    (MetricField::FeesChange7d, MetricField::Total7d),
    (MetricField::FeesChange1m, MetricField::Total30d),
    (MetricField::RevenueChange1d, MetricField::Revenue24h),
    (MetricField::RevenueChange7d, MetricField::Revenue7d),
    (MetricField::RevenueChange1m, MetricField::Revenue30d),
];

/// Ratio-of-ratio fields, first non-null value wins
pub const FIRST_WRITE_FIELDS: &[MetricField] = &[
    MetricField::Change7dOver7d,
    MetricField::FeesChange7dOver7d,
    MetricField::FeesChange30dOver30d,
    MetricField::RevenueChange7dOver7d,
    MetricField::RevenueChange30dOver30d,
    MetricField::HoldersRevenueChange7dOver7d,
    MetricField::HoldersRevenueChange30dOver30d,
];

/// TVL fields summed by the protocol-list merge, missing counted as 0
const TVL_FIELDS: &[MetricField] = &[
    MetricField::Tvl,
    MetricField::TvlPrevDay,
    MetricField::TvlPrevWeek,
    MetricField::TvlPrevMonth,
];

/// Per-call merge settings
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    /// Fill pf/ps from the merged mcap and 30d totals
    pub compute_ratios: bool,
}

/// True when the selection asks for the pre-aggregated "All" payload
pub fn is_all_chains(selected_chains: &[String]) -> bool {
    selected_chains.is_empty()
        || selected_chains
            .iter()
            .any(|c| c.trim().eq_ignore_ascii_case(ALL_CHAINS_SELECTOR))
}

/// Merge per-chain payloads into one record per entity name
///
/// **Public** - main entry point for multi-chain views
///
/// # Arguments
/// * `payloads` - One entity list per chain, tagged with its chain
/// * `selected_chains` - Chains the caller asked for; empty or `"All"` takes the fast path
/// * `options` - Whether to derive pf/ps on the merged records
///
/// # Returns
/// Merged entities in order of first appearance. On the fast path the first
/// payload's entities come back unchanged with an empty chain breakdown.
pub fn merge_across_chains(
    payloads: &[ChainPayload],
    selected_chains: &[String],
    options: &MergeOptions,
) -> Vec<CrossChainEntity> {
    if is_all_chains(selected_chains) {
        debug!("Chain selection is {}, returning payload as-is", ALL_CHAINS_SELECTOR);
        return payloads
            .first()
            .map(|p| {
                p.entities
                    .iter()
                    .map(|e| CrossChainEntity {
                        summary: e.clone(),
                        chain_breakdown: BTreeMap::new(),
                    })
                    .collect()
            })
            .unwrap_or_default();
    }

    let mut merged: Vec<MergeSlot> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for payload in selected_payloads(payloads, selected_chains) {
        for entity in &payload.entities {
            let idx = *index.entry(entity.name.clone()).or_insert_with(|| {
                merged.push(MergeSlot::seed(entity));
                merged.len() - 1
            });
            merged[idx].absorb(&payload.chain, entity);
        }
    }

    debug!("Merged {} entities across {} chains", merged.len(), payloads.len());

    merged.into_iter().map(|slot| slot.finish(options)).collect()
}

/// Merge protocol TVL lists across chains
///
/// **Public** - sums `tvl` and its previous-day/week/month values (a chain
/// that does not report one counts as 0) and unions chains and oracles.
/// The same `"All"` fast path as [`merge_across_chains`] applies.
pub fn merge_tvl_across_chains(payloads: &[ChainPayload], selected_chains: &[String]) -> Vec<EntitySummary> {
    if is_all_chains(selected_chains) {
        return payloads.first().map(|p| p.entities.clone()).unwrap_or_default();
    }

    let mut merged: Vec<EntitySummary> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for payload in selected_payloads(payloads, selected_chains) {
        for entity in &payload.entities {
            let idx = *index.entry(entity.name.clone()).or_insert_with(|| {
                let mut seed = entity.clone();
                for &field in TVL_FIELDS {
                    *seed.slot(field) = Some(0.0);
                }
                seed.chains.clear();
                seed.oracles.clear();
                merged.push(seed);
                merged.len() - 1
            });

            let target = &mut merged[idx];
            for &field in TVL_FIELDS {
                let value = entity.get(field).and_then(finite).unwrap_or(0.0);
                let slot = target.slot(field);
                *slot = Some(slot.unwrap_or(0.0) + value);
            }
            push_unique(&mut target.chains, &entity.chains);
            push_unique(&mut target.oracles, &entity.oracles);
        }
    }

    merged
}

/// Payloads whose chain is in the selection (compared by dedup key)
fn selected_payloads<'a>(
    payloads: &'a [ChainPayload],
    selected_chains: &[String],
) -> impl Iterator<Item = &'a ChainPayload> {
    let wanted: Vec<String> = selected_chains.iter().map(|c| chain_key(c)).collect();
    payloads.iter().filter(move |p| {
        let keep = wanted.contains(&chain_key(&p.chain));
        if !keep {
            debug!("Skipping payload for unselected chain {}", p.chain);
        }
        keep
    })
}

fn push_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

/// Change a snapshot reports for `key`; `change_7d` falls back to `change_7dover7d`
fn reported_change(entity: &EntitySummary, key: MetricField) -> Option<f64> {
    match key {
        MetricField::Change7d => entity.change_7d.or(entity.change_7dover7d),
        _ => entity.get(key),
    }
}

/// A record under construction paired with its weighted-mean state
struct MergeSlot {
    summary: EntitySummary,
    weights: WeightedStore,
    chain_breakdown: BTreeMap<String, ChainEntry>,
}

impl MergeSlot {
    /// Start from the first snapshot's descriptive fields and percentage
    /// changes. Sums start empty. Market cap is per token, not per chain.
    ///
    /// A seeded change survives until some chain supplies an accepted
    /// weighted observation for it.
    fn seed(first: &EntitySummary) -> Self {
        let mut summary = EntitySummary::new(first.name.clone());
        summary.display_name = first.display_name.clone();
        summary.id = first.id.clone();
        summary.parent_protocol = first.parent_protocol.clone();
        summary.module = first.module.clone();
        summary.category = first.category.clone();
        summary.oracles = first.oracles.clone();
        summary.methodology = first.methodology.clone();
        summary.mcap = first.mcap.and_then(finite);
        for &(key, _) in WEIGHTED_FIELDS {
            *summary.slot(key) = reported_change(first, key).and_then(finite);
        }

        Self {
            summary,
            weights: WeightedStore::new(),
            chain_breakdown: BTreeMap::new(),
        }
    }

    fn absorb(&mut self, chain: &str, entity: &EntitySummary) {
        for &field in MERGE_SUM_FIELDS {
            if let Some(value) = entity.get(field).and_then(finite) {
                let slot = self.summary.slot(field);
                *slot = Some(slot.unwrap_or(0.0) + value);
            }
        }

        for &(key, weight_field) in WEIGHTED_FIELDS {
            apply_weighted_change(
                &mut self.weights,
                &mut self.summary,
                key,
                entity.get(weight_field),
                reported_change(entity, key),
            );
        }

        for &field in FIRST_WRITE_FIELDS {
            let slot = self.summary.slot(field);
            if slot.is_none() {
                *slot = entity.get(field).and_then(finite);
            }
        }

        if !chain.trim().is_empty() && !self.summary.chains.iter().any(|c| c == chain) {
            self.summary.chains.push(chain.to_string());
        }

        let key = chain_key(chain);
        if key.is_empty() {
            return;
        }
        // Later snapshots replace earlier ones under the same key
        let mut per_chain = entity.clone();
        per_chain.change_7d = per_chain.change_7d.or(per_chain.change_7dover7d);
        self.chain_breakdown.insert(
            key,
            ChainEntry {
                chain: chain.to_string(),
                summary: per_chain,
            },
        );
    }

    fn finish(self, options: &MergeOptions) -> CrossChainEntity {
        let MergeSlot {
            mut summary,
            weights,
            chain_breakdown,
        } = self;

        weights.finalize_into(&mut summary);

        if options.compute_ratios {
            summary.pf = annualized_ratio(summary.mcap, summary.total30d);
            summary.ps = annualized_ratio(summary.mcap, summary.revenue30d);
        }

        CrossChainEntity {
            summary,
            chain_breakdown,
        }
    }
}
