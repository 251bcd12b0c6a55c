//! Chain name normalisation.
//!
//! Two distinct forms are needed: a display form for chart legends and a
//! dedup key for collapsing casing/whitespace variants of one chain.

use crate::utils::config::CHAIN_DISPLAY_NAMES;

/// Display form of a raw chain key (`avax` -> `Avalanche`, `bsc` -> `BSC`)
///
/// Keys without a special case get their first letter capitalised.
pub fn format_chain_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();

    if let Some((_, display)) = CHAIN_DISPLAY_NAMES.iter().find(|(key, _)| *key == lower) {
        return (*display).to_string();
    }

    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Dedup key for a chain: trimmed and lower-cased. Empty for blank names.
pub fn chain_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_special_cases() {
        assert_eq!(format_chain_name("avax"), "Avalanche");
        assert_eq!(format_chain_name("BSC"), "BSC");
        assert_eq!(format_chain_name("xdai"), "xDai");
    }

    #[test]
    fn test_format_capitalises() {
        assert_eq!(format_chain_name("ethereum"), "Ethereum");
        assert_eq!(format_chain_name("arbitrum_nova"), "Arbitrum_nova");
        assert_eq!(format_chain_name(""), "");
    }

    #[test]
    fn test_chain_key() {
        assert_eq!(chain_key(" Ethereum "), "ethereum");
        assert_eq!(chain_key("   "), "");
    }
}
