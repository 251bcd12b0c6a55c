//! Lenient field decoding for upstream metric payloads.
//!
//! Upstream APIs are loosely typed: numbers arrive as strings, lists arrive
//! as `null`, whole sub-objects go missing. These helpers coerce what can be
//! coerced and turn everything else into "absent" instead of failing the
//! whole payload.

use super::schema::TimePoint;
use log::debug;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Keep a float only if it is finite
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Coerce a JSON value to a finite number.
///
/// Numbers pass through, numeric strings are parsed after trimming (an
/// empty string is `0`, unsigned `0x`/`0o`/`0b` literals are read in their
/// radix) and booleans become `1`/`0`.
/// `null`, objects, arrays and anything that coerces to NaN or an infinity
/// are absent.
pub fn to_finite(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().and_then(finite),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else if let Some(value) = parse_radix_literal(trimmed) {
                finite(value)
            } else {
                trimmed.parse::<f64>().ok().and_then(finite)
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Read `0x1A`, `0o17` or `0b101`; `None` for anything else
fn parse_radix_literal(s: &str) -> Option<f64> {
    let radix = match s.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &s[2..];
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
    })
}

/// Coerce a JSON value to an integer unix timestamp
pub fn to_timestamp(value: &Value) -> Option<i64> {
    to_finite(value).map(|ts| ts.trunc() as i64)
}

/// `deserialize_with` target for optional numeric fields
pub fn f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(to_finite))
}

/// `deserialize_with` target for lists that may arrive as `null`
pub fn vec_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// `deserialize_with` target for string lists; non-string members are dropped
pub fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// `deserialize_with` target for `{ key: text }` maps such as methodology
pub fn text_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Object(obj)) => obj
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect(),
        _ => BTreeMap::new(),
    })
}

/// `deserialize_with` target for `{ chain: { subProtocol: number } }` maps
pub fn nested_numbers<'de, D>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, BTreeMap<String, f64>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Object(outer)) = raw else {
        return Ok(None);
    };

    let mut result = BTreeMap::new();
    for (chain, inner) in outer {
        let Value::Object(inner) = inner else {
            continue;
        };
        let values: BTreeMap<String, f64> = inner
            .iter()
            .filter_map(|(name, v)| to_finite(v).map(|n| (name.clone(), n)))
            .collect();
        result.insert(chain, values);
    }
    Ok(Some(result))
}

/// `deserialize_with` target for `[[timestamp, value], ...]` charts.
///
/// Points whose timestamp or value does not coerce are dropped.
pub fn time_points<'de, D>(deserializer: D) -> Result<Vec<TimePoint>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().map(time_points_from_value).unwrap_or_default())
}

/// Decode a chart value, skipping malformed points
pub fn time_points_from_value(raw: &Value) -> Vec<TimePoint> {
    let Value::Array(points) = raw else {
        return Vec::new();
    };

    let decoded: Vec<TimePoint> = points
        .iter()
        .filter_map(|point| match point {
            Value::Array(pair) if pair.len() >= 2 => {
                Some(TimePoint::new(to_timestamp(&pair[0])?, to_finite(&pair[1])?))
            }
            _ => None,
        })
        .collect();

    if decoded.len() != points.len() {
        debug!(
            "Dropped {} malformed chart points",
            points.len() - decoded.len()
        );
    }

    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_finite_number_semantics() {
        assert_eq!(to_finite(&json!(12.5)), Some(12.5));
        assert_eq!(to_finite(&json!(" 42 ")), Some(42.0));
        assert_eq!(to_finite(&json!("")), Some(0.0));
        assert_eq!(to_finite(&json!(true)), Some(1.0));
        assert_eq!(to_finite(&json!("abc")), None);
        assert_eq!(to_finite(&json!("Infinity")), None);
        assert_eq!(to_finite(&json!(null)), None);
        assert_eq!(to_finite(&json!({"a": 1})), None);
    }

    #[test]
    fn test_to_finite_radix_literals() {
        assert_eq!(to_finite(&json!("0x1A")), Some(26.0));
        assert_eq!(to_finite(&json!(" 0B101 ")), Some(5.0));
        assert_eq!(to_finite(&json!("0o17")), Some(15.0));
        assert_eq!(to_finite(&json!("0x")), None);
        assert_eq!(to_finite(&json!("0x1G")), None);
        assert_eq!(to_finite(&json!("-0x1A")), None);
    }

    #[test]
    fn test_time_points_skip_malformed() {
        let raw = json!([[1, 10], ["2", "20"], [3], "x", [4, "nope"]]);
        let points = time_points_from_value(&raw);
        assert_eq!(points, vec![TimePoint::new(1, 10.0), TimePoint::new(2, 20.0)]);
    }
}
