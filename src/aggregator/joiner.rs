//! Join independently fetched series into dated chart rows.
//!
//! The join is a left-outer union over timestamps: a timestamp reported by
//! only one series still gets a row, carrying just that series' label.
//! Missing labels are omitted, never zero-filled.

use crate::parser::schema::{JoinedRow, NamedSeries};
use log::debug;
use std::collections::HashMap;

/// Join named series into one row per distinct timestamp
///
/// **Public** - main entry point for chart joins
///
/// # Arguments
/// * `series` - Labelled series; `None` series (failed sources) are skipped
///
/// # Returns
/// Rows in first-insertion order of their timestamp. Series are processed in
/// the order given and points in input order; no numeric sort is applied.
/// A repeated `(timestamp, label)` keeps the last value written.
pub fn join_series(series: &[NamedSeries]) -> Vec<JoinedRow> {
    let mut rows: Vec<JoinedRow> = Vec::new();
    let mut row_index: HashMap<i64, usize> = HashMap::new();

    for named in series {
        let Some(points) = named.series.as_deref() else {
            debug!("Series {} is absent, skipping", named.label);
            continue;
        };

        for point in points {
            let idx = *row_index.entry(point.timestamp).or_insert_with(|| {
                rows.push(JoinedRow::new(point.timestamp));
                rows.len() - 1
            });
            rows[idx].set(&named.label, point.value);
        }
    }

    debug!("Joined {} series into {} rows", series.len(), rows.len());

    rows
}

/// Join and then order rows by numeric timestamp
///
/// **Public** - convenience for callers that did not pre-sort their series
pub fn join_series_sorted(series: &[NamedSeries]) -> Vec<JoinedRow> {
    let mut rows = join_series(series);
    rows.sort_by_key(|row| row.timestamp);
    rows
}
