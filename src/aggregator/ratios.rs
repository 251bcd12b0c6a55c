//! Derived ratios shared by rollups and merges.
//!
//! Every function here returns `None` rather than a non-finite number, so
//! NaN and infinities never reach a displayed record.

use crate::parser::lenient::finite;
use crate::parser::schema::EntitySummary;
use crate::utils::config::{ANNUALIZATION_FACTOR, RATIO_DECIMALS};

/// Percent change from `prior` to `current`; `None` if either is missing or `prior` is 0
pub fn pct_change(current: Option<f64>, prior: Option<f64>) -> Option<f64> {
    let (current, prior) = (current?, prior?);
    if prior == 0.0 {
        return None;
    }
    finite((current - prior) / prior * 100.0)
}

/// Round to `decimals` places, half away from zero
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `mcap / (total30d * 12)` rounded to two decimals.
///
/// `None` when either side is missing or zero. Used for both P/F (fees) and
/// P/S (revenue).
pub fn annualized_ratio(mcap: Option<f64>, total30d: Option<f64>) -> Option<f64> {
    let (mcap, total30d) = (mcap?, total30d?);
    if mcap == 0.0 {
        return None;
    }
    let annualized = total30d * ANNUALIZATION_FACTOR;
    if annualized == 0.0 {
        return None;
    }
    finite(mcap / annualized).map(|r| round_to(r, RATIO_DECIMALS))
}

/// Share of `grand_total_24h`, in percent; `None` if the grand total is missing or 0
pub fn dominance(total24h: Option<f64>, grand_total_24h: Option<f64>) -> Option<f64> {
    let (total, grand) = (total24h?, grand_total_24h?);
    if grand == 0.0 {
        return None;
    }
    finite(100.0 * total / grand)
}

/// `total24h / tvl`; `None` if either is missing or tvl is 0
pub fn volume_tvl(total24h: Option<f64>, tvl: Option<f64>) -> Option<f64> {
    let (total, tvl) = (total24h?, tvl?);
    if tvl == 0.0 {
        return None;
    }
    finite(total / tvl)
}

/// Recompute the four headline changes from the record's own reference totals.
///
/// A change whose reference totals are incomplete is left as reported.
pub fn recompute_changes(summary: &mut EntitySummary) {
    let pairs = [
        (summary.total24h, summary.total48hto24h),
        (summary.total24h, summary.total_7_days_ago),
        (summary.total24h, summary.total_30_days_ago),
        (summary.total7d, summary.total14dto7d),
    ];
    let slots = [
        &mut summary.change_1d,
        &mut summary.change_7d,
        &mut summary.change_1m,
        &mut summary.change_7dover7d,
    ];

    for ((current, prior), slot) in pairs.into_iter().zip(slots) {
        if current.is_some() && prior.is_some() {
            *slot = pct_change(current, prior);
        }
    }
}

/// Fill pf, ps, dominance and volume/tvl from the record's own totals
pub fn apply_derived_ratios(summary: &mut EntitySummary, grand_total_24h: Option<f64>) {
    summary.pf = annualized_ratio(summary.mcap, summary.total30d);
    summary.ps = annualized_ratio(summary.mcap, summary.revenue30d);
    summary.dominance = dominance(summary.total24h, grand_total_24h);
    summary.volumetvl = volume_tvl(summary.total24h, summary.tvl);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_change_guards() {
        assert_eq!(pct_change(Some(150.0), Some(100.0)), Some(50.0));
        assert_eq!(pct_change(Some(150.0), Some(0.0)), None);
        assert_eq!(pct_change(None, Some(1.0)), None);
        assert_eq!(pct_change(Some(1.0), None), None);
    }

    #[test]
    fn test_annualized_ratio() {
        assert_eq!(annualized_ratio(Some(1200.0), Some(10.0)), Some(10.0));
        assert_eq!(annualized_ratio(Some(1000.0), Some(3.0)), Some(27.78));
        assert_eq!(annualized_ratio(None, Some(3.0)), None);
        assert_eq!(annualized_ratio(Some(0.0), Some(3.0)), None);
        assert_eq!(annualized_ratio(Some(10.0), Some(0.0)), None);
        assert_eq!(annualized_ratio(Some(10.0), None), None);
    }

    #[test]
    fn test_dominance_and_volume_tvl() {
        assert_eq!(dominance(Some(25.0), Some(100.0)), Some(25.0));
        assert_eq!(dominance(Some(25.0), Some(0.0)), None);
        assert_eq!(dominance(Some(25.0), None), None);
        assert_eq!(volume_tvl(Some(10.0), Some(40.0)), Some(0.25));
        assert_eq!(volume_tvl(Some(10.0), Some(0.0)), None);
    }

    #[test]
    fn test_recompute_changes_only_when_complete() {
        let mut summary = EntitySummary::new("x");
        summary.total24h = Some(110.0);
        summary.total48hto24h = Some(100.0);
        summary.change_7d = Some(3.0);

        recompute_changes(&mut summary);

        assert!((summary.change_1d.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(summary.change_7d, Some(3.0));
    }
}
