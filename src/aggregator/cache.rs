//! Chain listing with an explicit, caller-owned cache.
//!
//! The cache is keyed by a version string the caller controls (typically the
//! data-source snapshot id). Asking with a different key recomputes and
//! replaces the stored list.

use crate::parser::lenient::finite;
use crate::parser::schema::EntitySummary;
use log::debug;
use std::cmp::Ordering;

/// Memoised chain list for one data-source version
#[derive(Debug, Clone, Default)]
pub struct ChainListCache {
    version: Option<String>,
    chains: Vec<String>,
}

impl ChainListCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Version the stored list was computed for, if any
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Return the list for `version`, computing it on a miss
    pub fn get_or_compute<F>(&mut self, version: &str, compute: F) -> &[String]
    where
        F: FnOnce() -> Vec<String>,
    {
        if self.version.as_deref() != Some(version) {
            debug!("Chain list cache miss for version {}", version);
            self.chains = compute();
            self.version = Some(version.to_string());
        }
        &self.chains
    }

    pub fn invalidate(&mut self) {
        self.version = None;
        self.chains.clear();
    }
}

/// Distinct chains ranked by the summed `total24h` of the entities listing them
///
/// **Public** - ties keep first-seen order
pub fn chains_by_volume(entities: &[EntitySummary]) -> Vec<String> {
    let mut volumes: Vec<(String, f64)> = Vec::new();

    for entity in entities {
        let volume = entity.total24h.and_then(finite).unwrap_or(0.0);
        for chain in &entity.chains {
            match volumes.iter_mut().find(|(c, _)| c == chain) {
                Some((_, total)) => *total += volume,
                None => volumes.push((chain.clone(), volume)),
            }
        }
    }

    volumes.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    volumes.into_iter().map(|(chain, _)| chain).collect()
}

/// [`chains_by_volume`] through `cache`
pub fn cached_chains_by_volume(cache: &mut ChainListCache, version: &str, entities: &[EntitySummary]) -> Vec<String> {
    cache.get_or_compute(version, || chains_by_volume(entities)).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(total24h: f64, chains: &[&str]) -> EntitySummary {
        let mut e = EntitySummary::new("x");
        e.total24h = Some(total24h);
        e.chains = chains.iter().map(|c| c.to_string()).collect();
        e
    }

    #[test]
    fn test_ranks_by_volume() {
        let entities = vec![entity(5.0, &["Ethereum", "Base"]), entity(10.0, &["Solana", "Base"])];
        assert_eq!(chains_by_volume(&entities), vec!["Base", "Solana", "Ethereum"]);
    }

    #[test]
    fn test_cache_recomputes_on_new_version() {
        let mut cache = ChainListCache::new();
        let mut calls = 0;

        cache.get_or_compute("v1", || {
            calls += 1;
            vec!["A".to_string()]
        });
        let again = cache
            .get_or_compute("v1", || {
                calls += 1;
                vec!["B".to_string()]
            })
            .to_vec();
        assert_eq!(again, vec!["A".to_string()]);

        let fresh = cache
            .get_or_compute("v2", || {
                calls += 1;
                vec!["C".to_string()]
            })
            .to_vec();
        assert_eq!(fresh, vec!["C".to_string()]);
        assert_eq!(calls, 2);
        assert_eq!(cache.version(), Some("v2"));

        cache.invalidate();
        assert_eq!(cache.version(), None);
    }

    #[test]
    fn test_cached_listing_ignores_new_data_until_version_changes() {
        let mut cache = ChainListCache::new();
        let first = vec![entity(1.0, &["Ethereum"])];
        let second = vec![entity(1.0, &["Solana"])];

        assert_eq!(cached_chains_by_volume(&mut cache, "snap-1", &first), vec!["Ethereum"]);
        assert_eq!(cached_chains_by_volume(&mut cache, "snap-1", &second), vec!["Ethereum"]);
        assert_eq!(cached_chains_by_volume(&mut cache, "snap-2", &second), vec!["Solana"]);
    }
}
