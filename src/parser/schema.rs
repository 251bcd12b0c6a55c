//! Record definitions for upstream metric payloads and aggregated output.
//!
//! Wire names follow the upstream JSON (`total24h`, `change_1d`,
//! `parentProtocol`, ...). Every numeric field is optional: a field the
//! upstream did not report decodes to `None` and is written back as `null`.

use super::lenient;
use crate::utils::config::SCHEMA_VERSION;
use chrono::Utc;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// A single `(timestamp, value)` observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(i64, f64)", into = "(i64, f64)")]
pub struct TimePoint {
    /// Unix seconds
    pub timestamp: i64,
    pub value: f64,
}

impl TimePoint {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl From<(i64, f64)> for TimePoint {
    fn from((timestamp, value): (i64, f64)) -> Self {
        Self::new(timestamp, value)
    }
}

impl From<TimePoint> for (i64, f64) {
    fn from(point: TimePoint) -> Self {
        (point.timestamp, point.value)
    }
}

/// A labelled series. `series: None` marks a source that was not fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    pub label: String,

    #[serde(default)]
    pub series: Option<Vec<TimePoint>>,
}

impl NamedSeries {
    pub fn new(label: impl Into<String>, series: Vec<TimePoint>) -> Self {
        Self {
            label: label.into(),
            series: Some(series),
        }
    }

    /// A source whose fetch failed or was skipped
    pub fn absent(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            series: None,
        }
    }
}

/// One chart row: a date plus whichever labels reported at that date.
///
/// Labels keep their first insertion position; writing an existing label
/// replaces its value in place. Serializes as a flat object
/// `{ "date": "<ts>", "<label>": value, ... }`. A series labelled `date`
/// takes over the `date` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub timestamp: i64,
    pub date: String,
    fields: Vec<(String, f64)>,
}

impl JoinedRow {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            date: timestamp.to_string(),
            fields: Vec::new(),
        }
    }

    /// Set `label`, last write wins
    pub fn set(&mut self, label: &str, value: f64) {
        match self.fields.iter_mut().find(|(l, _)| l == label) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((label.to_string(), value)),
        }
    }

    /// Add `value` onto `label`, starting from zero when the label is new
    pub fn add(&mut self, label: &str, value: f64) {
        match self.fields.iter_mut().find(|(l, _)| l == label) {
            Some((_, slot)) => *slot += value,
            None => self.fields.push((label.to_string(), value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| *v)
    }

    /// Labels in insertion order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(l, _)| l.as_str())
    }

    pub fn fields(&self) -> &[(String, f64)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for JoinedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let date_label = self.get("date");
        let len = self.fields.len() + usize::from(date_label.is_none());
        let mut map = serializer.serialize_map(Some(len))?;
        match date_label {
            Some(value) => map.serialize_entry("date", &value)?,
            None => map.serialize_entry("date", &self.date)?,
        }
        for (label, value) in self.fields.iter().filter(|(l, _)| l != "date") {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// A breakdown leaf: a single aggregate, or a per-token split of it
#[derive(Debug, Clone, PartialEq)]
pub enum BreakdownLeaf {
    Number(f64),
    TokenMap(Vec<(String, f64)>),
}

impl BreakdownLeaf {
    /// Numeric value of the leaf; a token map contributes the sum of its tokens
    pub fn resolve(&self) -> f64 {
        match self {
            BreakdownLeaf::Number(n) => *n,
            BreakdownLeaf::TokenMap(tokens) => tokens.iter().map(|(_, v)| v).sum(),
        }
    }
}

/// Sub-protocol (version) entries under one chain, in upstream order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChainSlice {
    pub chain: String,
    pub entries: Vec<(String, BreakdownLeaf)>,
}

/// All chains reported at one timestamp
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BreakdownEntry {
    pub timestamp: i64,
    pub chains: Vec<ChainSlice>,
}

/// `timestamp -> chain -> sub-protocol -> leaf` series.
///
/// Decoding is lenient (see `parser::breakdown`); it never fails.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct NestedBreakdown {
    pub entries: Vec<BreakdownEntry>,
}

/// Per-entity (protocol or chain) metric record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntitySummary {
    #[serde(default)]
    pub name: String,

    #[serde(default, rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, alias = "defillamaId", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, rename = "parentProtocol", skip_serializing_if = "Option::is_none")]
    pub parent_protocol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "lenient::strings")]
    pub chains: Vec<String>,

    #[serde(default, deserialize_with = "lenient::strings", skip_serializing_if = "Vec::is_empty")]
    pub oracles: Vec<String>,

    /// Methodology text per metric family (`Fees`, `Revenue`, ...)
    #[serde(default, deserialize_with = "lenient::text_map", skip_serializing_if = "BTreeMap::is_empty")]
    pub methodology: BTreeMap<String, String>,

    // Absolute metrics and the reference totals changes are computed from
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub total24h: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub total48hto24h: Option<f64>,
    #[serde(default, rename = "total7DaysAgo", deserialize_with = "lenient::f64_opt")]
    pub total_7_days_ago: Option<f64>,
    #[serde(default, rename = "total30DaysAgo", deserialize_with = "lenient::f64_opt")]
    pub total_30_days_ago: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub total7d: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub total14dto7d: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub total30d: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub total1y: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub average1y: Option<f64>,
    #[serde(default, rename = "totalAllTime", deserialize_with = "lenient::f64_opt")]
    pub total_all_time: Option<f64>,

    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub revenue24h: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub revenue7d: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub revenue30d: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub revenue1y: Option<f64>,
    #[serde(default, rename = "holdersRevenue24h", deserialize_with = "lenient::f64_opt")]
    pub holders_revenue24h: Option<f64>,
    #[serde(default, rename = "holdersRevenue30d", deserialize_with = "lenient::f64_opt")]
    pub holders_revenue30d: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub bribes24h: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub bribes30d: Option<f64>,
    #[serde(default, rename = "tokenTax24h", deserialize_with = "lenient::f64_opt")]
    pub token_tax24h: Option<f64>,
    #[serde(default, rename = "tokenTax30d", deserialize_with = "lenient::f64_opt")]
    pub token_tax30d: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub emissions24h: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub emissions30d: Option<f64>,

    #[serde(default, alias = "marketCap", deserialize_with = "lenient::f64_opt")]
    pub mcap: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub tvl: Option<f64>,
    #[serde(default, rename = "tvlPrevDay", deserialize_with = "lenient::f64_opt")]
    pub tvl_prev_day: Option<f64>,
    #[serde(default, rename = "tvlPrevWeek", deserialize_with = "lenient::f64_opt")]
    pub tvl_prev_week: Option<f64>,
    #[serde(default, rename = "tvlPrevMonth", deserialize_with = "lenient::f64_opt")]
    pub tvl_prev_month: Option<f64>,

    // Percentage changes
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub change_1d: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub change_7d: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub change_1m: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub change_7dover7d: Option<f64>,
    #[serde(default, rename = "feesChange_1d", deserialize_with = "lenient::f64_opt")]
    pub fees_change_1d: Option<f64>,
    #[serde(default, rename = "feesChange_7d", deserialize_with = "lenient::f64_opt")]
    pub fees_change_7d: Option<f64>,
    #[serde(default, rename = "feesChange_1m", deserialize_with = "lenient::f64_opt")]
    pub fees_change_1m: Option<f64>,
    #[serde(default, rename = "revenueChange_1d", deserialize_with = "lenient::f64_opt")]
    pub revenue_change_1d: Option<f64>,
    #[serde(default, rename = "revenueChange_7d", deserialize_with = "lenient::f64_opt")]
    pub revenue_change_7d: Option<f64>,
    #[serde(default, rename = "revenueChange_1m", deserialize_with = "lenient::f64_opt")]
    pub revenue_change_1m: Option<f64>,

    // Ratio-of-ratio changes, never re-weighted
    #[serde(default, rename = "feesChange_7dover7d", deserialize_with = "lenient::f64_opt")]
    pub fees_change_7dover7d: Option<f64>,
    #[serde(default, rename = "feesChange_30dover30d", deserialize_with = "lenient::f64_opt")]
    pub fees_change_30dover30d: Option<f64>,
    #[serde(default, rename = "revenueChange_7dover7d", deserialize_with = "lenient::f64_opt")]
    pub revenue_change_7dover7d: Option<f64>,
    #[serde(default, rename = "revenueChange_30dover30d", deserialize_with = "lenient::f64_opt")]
    pub revenue_change_30dover30d: Option<f64>,
    #[serde(default, rename = "holdersRevenueChange_7dover7d", deserialize_with = "lenient::f64_opt")]
    pub holders_revenue_change_7dover7d: Option<f64>,
    #[serde(default, rename = "holdersRevenueChange_30dover30d", deserialize_with = "lenient::f64_opt")]
    pub holders_revenue_change_30dover30d: Option<f64>,

    // Derived ratios
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub pf: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub ps: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub dominance: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub volumetvl: Option<f64>,

    /// `chain -> sub-protocol -> 24h value`
    #[serde(
        default,
        rename = "breakdown24h",
        deserialize_with = "lenient::nested_numbers",
        skip_serializing_if = "Option::is_none"
    )]
    pub breakdown_24h: Option<BTreeMap<String, BTreeMap<String, f64>>>,

    /// Children of a rolled-up parent, for expandable table rows
    #[serde(default, rename = "subRows", skip_serializing_if = "Option::is_none")]
    pub sub_rows: Option<Vec<EntitySummary>>,
}

/// A parent entity produced by a rollup; `sub_rows` holds its children
pub type ParentRollup = EntitySummary;

impl EntitySummary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Name shown in tables: `displayName` when present
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

macro_rules! metric_fields {
    ($($variant:ident => $field:ident),* $(,)?) => {
        /// Addressable numeric fields of [`EntitySummary`]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum MetricField {
            $($variant),*
        }

        impl EntitySummary {
            pub fn get(&self, field: MetricField) -> Option<f64> {
                match field {
                    $(MetricField::$variant => self.$field),*
                }
            }

            pub fn slot(&mut self, field: MetricField) -> &mut Option<f64> {
                match field {
                    $(MetricField::$variant => &mut self.$field),*
                }
            }
        }
    };
}

metric_fields! {
    Total24h => total24h,
    Total48hTo24h => total48hto24h,
    Total7DaysAgo => total_7_days_ago,
    Total30DaysAgo => total_30_days_ago,
    Total7d => total7d,
    Total14dTo7d => total14dto7d,
    Total30d => total30d,
    Total1y => total1y,
    Average1y => average1y,
    TotalAllTime => total_all_time,
    Revenue24h => revenue24h,
    Revenue7d => revenue7d,
    Revenue30d => revenue30d,
    Revenue1y => revenue1y,
    HoldersRevenue24h => holders_revenue24h,
    HoldersRevenue30d => holders_revenue30d,
    Bribes24h => bribes24h,
    Bribes30d => bribes30d,
    TokenTax24h => token_tax24h,
    TokenTax30d => token_tax30d,
    Emissions24h => emissions24h,
    Emissions30d => emissions30d,
    Mcap => mcap,
    Tvl => tvl,
    TvlPrevDay => tvl_prev_day,
    TvlPrevWeek => tvl_prev_week,
    TvlPrevMonth => tvl_prev_month,
    Change1d => change_1d,
    Change7d => change_7d,
    Change1m => change_1m,
    Change7dOver7d => change_7dover7d,
    FeesChange1d => fees_change_1d,
    FeesChange7d => fees_change_7d,
    FeesChange1m => fees_change_1m,
    RevenueChange1d => revenue_change_1d,
    RevenueChange7d => revenue_change_7d,
    RevenueChange1m => revenue_change_1m,
    FeesChange7dOver7d => fees_change_7dover7d,
    FeesChange30dOver30d => fees_change_30dover30d,
    RevenueChange7dOver7d => revenue_change_7dover7d,
    RevenueChange30dOver30d => revenue_change_30dover30d,
    HoldersRevenueChange7dOver7d => holders_revenue_change_7dover7d,
    HoldersRevenueChange30dOver30d => holders_revenue_change_30dover30d,
    Pf => pf,
    Ps => ps,
    Dominance => dominance,
    VolumeTvl => volumetvl,
}

/// One chain's entity list, tagged with the chain it was fetched for
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChainPayload {
    pub chain: String,

    #[serde(default, alias = "protocols", deserialize_with = "lenient::vec_or_empty")]
    pub entities: Vec<EntitySummary>,
}

impl ChainPayload {
    pub fn new(chain: impl Into<String>, entities: Vec<EntitySummary>) -> Self {
        Self {
            chain: chain.into(),
            entities,
        }
    }

    /// Stand-in for a chain whose fetch failed
    pub fn empty(chain: impl Into<String>) -> Self {
        Self::new(chain, Vec::new())
    }
}

/// Entry of the parent-protocol directory
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParentProtocol {
    pub id: String,
    pub name: String,

    #[serde(default, rename = "displayName")]
    pub display_name: Option<String>,

    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub mcap: Option<f64>,
}

impl ParentProtocol {
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// A single chain's contribution to a merged entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainEntry {
    pub chain: String,

    #[serde(flatten)]
    pub summary: EntitySummary,
}

/// An entity merged across chains, with per-chain drill-down
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossChainEntity {
    #[serde(flatten)]
    pub summary: EntitySummary,

    /// Keyed by trimmed, lower-cased chain name
    #[serde(rename = "chainBreakdown", skip_serializing_if = "BTreeMap::is_empty")]
    pub chain_breakdown: BTreeMap<String, ChainEntry>,
}

/// Per-metric overview payload as served upstream
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct OverviewPayload {
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub total24h: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub total7d: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub total30d: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub total1y: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub average1y: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub change_1d: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub change_7d: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub change_1m: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub change_7dover7d: Option<f64>,

    #[serde(default, rename = "totalDataChart", deserialize_with = "lenient::time_points")]
    pub total_data_chart: Vec<TimePoint>,

    #[serde(default, rename = "totalDataChartBreakdown")]
    pub total_data_chart_breakdown: NestedBreakdown,

    #[serde(default, deserialize_with = "lenient::vec_or_empty")]
    pub protocols: Vec<EntitySummary>,

    #[serde(default, rename = "allChains", deserialize_with = "lenient::strings")]
    pub all_chains: Vec<String>,
}

/// Envelope every command writes around its result
#[derive(Debug, Clone, Serialize)]
pub struct OutputDocument<T: Serialize> {
    /// Schema version for compatibility checking
    pub version: String,

    /// Which aggregation produced `data`
    pub kind: String,

    /// Legend labels for chart outputs, in first-seen order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Vec<String>>,

    /// Timestamp when the document was generated
    #[serde(rename = "generatedAt")]
    pub generated_at: String,

    pub data: T,
}

impl<T: Serialize> OutputDocument<T> {
    /// Wrap `data` stamped with the current schema version and time
    pub fn new(kind: impl Into<String>, data: T) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            kind: kind.into(),
            legend: None,
            generated_at: Utc::now().to_rfc3339(),
            data,
        }
    }

    pub fn with_legend(mut self, legend: Vec<String>) -> Self {
        self.legend = Some(legend);
        self
    }
}

/// An output document read back without knowing its payload type
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentHeader {
    pub version: String,
    pub kind: String,

    #[serde(default)]
    pub legend: Option<Vec<String>>,

    #[serde(rename = "generatedAt")]
    pub generated_at: String,

    pub data: serde_json::Value,
}

impl DocumentHeader {
    /// Number of records in `data` (1 for a non-array payload)
    pub fn record_count(&self) -> usize {
        match &self.data {
            serde_json::Value::Array(items) => items.len(),
            serde_json::Value::Null => 0,
            _ => 1,
        }
    }
}
