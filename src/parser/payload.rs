//! Decoding of upstream metric payloads.
//!
//! Parses raw JSON from the upstream fetchers into the typed records the
//! aggregators consume. Individual malformed entities are dropped with a
//! warning; only a payload whose top-level shape is unusable is an error.

use super::schema::{ChainPayload, EntitySummary, NamedSeries, OverviewPayload, ParentProtocol};
use crate::parser::lenient::time_points_from_value;
use crate::utils::error::ParseError;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse a per-metric overview payload
///
/// **Public** - main entry point for overview payloads
///
/// # Errors
/// * `ParseError::InvalidFormat` - payload is not a JSON object
/// * `ParseError::JsonError` - a typed field has an unusable shape
pub fn parse_overview(raw: &Value) -> Result<OverviewPayload, ParseError> {
    let Value::Object(obj) = raw else {
        return Err(ParseError::InvalidFormat(
            "Overview payload must be a JSON object".to_string(),
        ));
    };

    // Entities are decoded one by one so a single bad record does not sink the payload
    let mut stripped = obj.clone();
    let protocols = stripped
        .remove("protocols")
        .map(|p| parse_entities(&p))
        .unwrap_or_default();

    let mut overview: OverviewPayload = serde_json::from_value(Value::Object(stripped))?;
    overview.protocols = protocols;

    debug!(
        "Parsed overview: {} chart points, {} breakdown timestamps, {} protocols",
        overview.total_data_chart.len(),
        overview.total_data_chart_breakdown.entries.len(),
        overview.protocols.len()
    );

    Ok(overview)
}

/// Parse a list of entity summaries, dropping records that fail to decode
///
/// **Public** - also used for flat entity files
pub fn parse_entities(raw: &Value) -> Vec<EntitySummary> {
    let items = match raw {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => match obj.get("protocols") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    decode_each(items, "entity")
}

/// Parse one chain's payload and tag it with `chain`
///
/// **Public** - used for each per-chain file or response
///
/// Anything that is not a list of entities (or an object carrying one under
/// `protocols`/`entities`) degrades to an empty payload, the same as a
/// failed fetch.
pub fn parse_chain_payload(chain: &str, raw: &Value) -> ChainPayload {
    let entities = match raw {
        Value::Array(items) => decode_each(items, "entity"),
        Value::Object(obj) => ["protocols", "entities"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_array))
            .map(|items| decode_each(items, "entity"))
            .unwrap_or_default(),
        _ => {
            warn!("Payload for chain {} is not usable, treating it as empty", chain);
            Vec::new()
        }
    };

    ChainPayload::new(chain, entities)
}

/// Parse the parent-protocol directory
///
/// **Public** - accepts a bare list or an object with `parentProtocols`
///
/// # Errors
/// * `ParseError::InvalidFormat` - no directory list could be found
pub fn parse_directory(raw: &Value) -> Result<Vec<ParentProtocol>, ParseError> {
    let items = match raw {
        Value::Array(items) => items,
        Value::Object(obj) => obj
            .get("parentProtocols")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ParseError::InvalidFormat("Directory object has no parentProtocols list".to_string())
            })?,
        _ => {
            return Err(ParseError::InvalidFormat(
                "Directory must be a JSON array or object".to_string(),
            ))
        }
    };

    Ok(decode_each(items, "parent protocol"))
}

/// Parse `{ label: [[ts, value], ...] }` or `[{ label, series }]` into named series
///
/// **Public** - input shape for the series joiner
pub fn parse_named_series(raw: &Value) -> Result<Vec<NamedSeries>, ParseError> {
    match raw {
        Value::Object(by_label) => Ok(by_label
            .iter()
            .map(|(label, points)| match points {
                Value::Null => NamedSeries::absent(label.clone()),
                other => NamedSeries::new(label.clone(), time_points_from_value(other)),
            })
            .collect()),

        Value::Array(items) => Ok(items
            .iter()
            .filter_map(|item| {
                let label = item.get("label")?.as_str()?.to_string();
                Some(match item.get("series") {
                    None | Some(Value::Null) => NamedSeries::absent(label),
                    Some(points) => NamedSeries::new(label, time_points_from_value(points)),
                })
            })
            .collect()),

        _ => Err(ParseError::InvalidFormat(
            "Series input must be an object keyed by label or an array".to_string(),
        )),
    }
}

/// Decode every item, logging and dropping the ones that fail
///
/// **Private** - internal helper
fn decode_each<T: DeserializeOwned>(items: &[Value], what: &str) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<T>(item.clone()) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Skipping {} #{}: {}", what, i, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_overview_keeps_good_protocols() {
        let raw = json!({
            "total24h": "100",
            "totalDataChart": [[1, 2]],
            "totalDataChartBreakdown": null,
            "protocols": [
                { "name": "Good", "total24h": 5 },
                { "name": 42 }
            ],
            "allChains": ["Ethereum", null]
        });
        let overview = parse_overview(&raw).unwrap();

        assert_eq!(overview.total24h, Some(100.0));
        assert_eq!(overview.protocols.len(), 1);
        assert_eq!(overview.protocols[0].name, "Good");
        assert_eq!(overview.all_chains, vec!["Ethereum".to_string()]);
        assert!(overview.total_data_chart_breakdown.entries.is_empty());
    }

    #[test]
    fn test_parse_overview_rejects_non_object() {
        assert!(parse_overview(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_parse_chain_payload_degrades_to_empty() {
        let payload = parse_chain_payload("Ethereum", &json!("oops"));
        assert_eq!(payload.chain, "Ethereum");
        assert!(payload.entities.is_empty());

        let payload = parse_chain_payload("Base", &json!({ "protocols": [{ "name": "A" }] }));
        assert_eq!(payload.entities.len(), 1);
    }

    #[test]
    fn test_parse_directory_shapes() {
        let listed = parse_directory(&json!([{ "id": "parent#uni", "name": "Uniswap" }])).unwrap();
        assert_eq!(listed[0].name, "Uniswap");

        let wrapped =
            parse_directory(&json!({ "parentProtocols": [{ "id": "p", "name": "P", "mcap": "5" }] }))
                .unwrap();
        assert_eq!(wrapped[0].mcap, Some(5.0));

        assert!(parse_directory(&json!({ "other": [] })).is_err());
    }

    #[test]
    fn test_parse_named_series_null_is_absent() {
        let series = parse_named_series(&json!({ "Fees": [[1, 2]], "Revenue": null })).unwrap();
        assert_eq!(series.len(), 2);
        assert!(series[0].series.is_some());
        assert!(series[1].series.is_none());
    }
}
