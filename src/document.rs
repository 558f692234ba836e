//! Document identifiers and location extraction.
//!
//! Documents are `serde_json::Value` objects. A location field may hold a
//! single coordinate, an ordered list of coordinates, or sit below an array of
//! sub-documents (`"addresses.loc"`), in which case every element contributes
//! its own location.

use crate::config::CoordinateSource;
use crate::error::{GeoIndexError, Result};
use bytes::Bytes;
use geo::Point;
use serde_json::{Map, Value};
use std::fmt;

/// Primary key of a document in the owning store.
///
/// Ids order bytewise. Numeric ids are stored big-endian so they sort
/// numerically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocId(Bytes);

impl DocId {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for DocId {
    fn from(value: &str) -> Self {
        Self(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for DocId {
    fn from(value: String) -> Self {
        Self(Bytes::from(value))
    }
}

impl From<u64> for DocId {
    fn from(value: u64) -> Self {
        Self(Bytes::copy_from_slice(&value.to_be_bytes()))
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) if !s.chars().any(char::is_control) => f.write_str(s),
            _ => {
                for byte in self.0.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

/// Canonical form of a secondary attribute value (compound or haystack field).
///
/// Values compare by their compact JSON text, so `"restaurant"` and `1` are
/// distinct and `1` equals `1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecondaryValue(String);

impl SecondaryValue {
    pub fn from_value(value: &Value) -> Self {
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Value> for SecondaryValue {
    fn from(value: &Value) -> Self {
        Self::from_value(value)
    }
}

impl From<&str> for SecondaryValue {
    fn from(value: &str) -> Self {
        Self::from_value(&Value::String(value.to_string()))
    }
}

/// Looks up a dotted path without fanning out over arrays.
pub fn get_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(doc, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// First value found under `path`, fanning out over arrays of sub-documents.
/// Used to resolve the coordinate layout from a sample document.
pub fn sample_location<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    fn walk<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
        let Some((head, rest)) = segments.split_first() else {
            return (!value.is_null()).then_some(value);
        };
        match value {
            Value::Object(map) => walk(map.get(*head)?, rest),
            Value::Array(items) => items.iter().find_map(|item| walk(item, segments)),
            _ => None,
        }
    }

    let segments: Vec<&str> = path.split('.').collect();
    walk(doc, &segments)
}

/// Extracts every location stored under `path`, in document order.
///
/// A missing or `null` field yields no locations; the document is simply not
/// indexed. A present but malformed field is an `InvalidInput` error.
pub fn extract_locations(doc: &Value, path: &str, source: &CoordinateSource) -> Result<Vec<Point>> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();
    collect_at_path(doc, &segments, source, &mut out)?;
    Ok(out)
}

fn collect_at_path(
    value: &Value,
    segments: &[&str],
    source: &CoordinateSource,
    out: &mut Vec<Point>,
) -> Result<()> {
    let Some((head, rest)) = segments.split_first() else {
        return collect_coordinates(value, source, out);
    };

    match value {
        Value::Object(map) => match map.get(*head) {
            Some(child) => collect_at_path(child, rest, source, out),
            None => Ok(()),
        },
        // Arrays of sub-documents fan out: each element resolves the same path.
        Value::Array(items) => {
            for item in items {
                collect_at_path(item, segments, source, out)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn collect_coordinates(value: &Value, source: &CoordinateSource, out: &mut Vec<Point>) -> Result<()> {
    match value {
        Value::Null => Ok(()),
        Value::Array(items) if is_pair(items) => {
            match source {
                CoordinateSource::ArrayPair => out.push(pair_to_point(items)?),
                CoordinateSource::ObjectFields { .. } => {
                    return Err(GeoIndexError::InvalidInput(
                        "expected a location object, found a coordinate array".into(),
                    ));
                }
            }
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Array(_) | Value::Object(_) => {
                        out.push(single_coordinate(item, source)?);
                    }
                    other => {
                        return Err(GeoIndexError::InvalidInput(format!(
                            "location list element is not a coordinate: {}",
                            other
                        )));
                    }
                }
            }
            Ok(())
        }
        Value::Object(_) => {
            out.push(single_coordinate(value, source)?);
            Ok(())
        }
        other => Err(GeoIndexError::InvalidInput(format!(
            "location must be a coordinate pair, object or list, got: {}",
            other
        ))),
    }
}

fn single_coordinate(value: &Value, source: &CoordinateSource) -> Result<Point> {
    match (source, value) {
        (CoordinateSource::ArrayPair, Value::Array(items)) if is_pair(items) => pair_to_point(items),
        (CoordinateSource::ObjectFields { x_key, y_key }, Value::Object(map)) => {
            let x = number_field(map, x_key)?;
            let y = number_field(map, y_key)?;
            Ok(Point::new(x, y))
        }
        (_, other) => Err(GeoIndexError::InvalidInput(format!(
            "location does not match the index coordinate layout: {}",
            other
        ))),
    }
}

fn is_pair(items: &[Value]) -> bool {
    items.len() == 2 && items.iter().all(Value::is_number)
}

fn pair_to_point(items: &[Value]) -> Result<Point> {
    let x = items[0].as_f64();
    let y = items[1].as_f64();
    match (x, y) {
        (Some(x), Some(y)) => Ok(Point::new(x, y)),
        _ => Err(GeoIndexError::InvalidInput(
            "coordinate pair must hold two numbers".into(),
        )),
    }
}

fn number_field(map: &Map<String, Value>, key: &str) -> Result<f64> {
    map.get(key).and_then(Value::as_f64).ok_or_else(|| {
        GeoIndexError::InvalidInput(format!("location object is missing numeric field '{}'", key))
    })
}
