//! Helpers for reading from and patching onto a record's raw JSON payload.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::mem::discriminant;

/// Read a string field, treating any non-string value as absent.
pub fn get_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(|v| v.as_str()).map(String::from)
}

/// Borrow a nested object, or `None` if the key is absent or not an object.
pub fn get_object<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(|v| v.as_object())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

/// Write an owned field back onto the payload.
///
/// A blank value is never introduced under a key the payload lacks, and never
/// replaces a value of another JSON type (the model read that value as absent,
/// so the blank is only its default). A record that went through unchanged
/// therefore serializes to exactly its input.
pub fn put(map: &mut Map<String, Value>, key: &str, value: Value) {
    if is_blank(&value) {
        match map.get(key) {
            None => return,
            Some(existing) if discriminant(existing) != discriminant(&value) => return,
            Some(_) => {}
        }
    }
    map.insert(key.to_string(), value);
}

/// Write an optional string field; `None` leaves whatever the payload had.
pub fn put_opt_str(map: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        put(map, key, Value::String(value.to_string()));
    }
}

/// Parse a timestamp as exported: unix seconds, RFC 3339, or
/// SQLite format (2025-12-11 06:50:10.674).
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
        _ => None,
    }
}

/// Write a timestamp in the representation the payload already uses.
///
/// Left untouched when the payload already holds the same instant.
pub fn put_timestamp(map: &mut Map<String, Value>, key: &str, timestamp: DateTime<Utc>) {
    let value = match map.get(key) {
        Some(existing) if parse_timestamp(existing) == Some(timestamp) => return,
        Some(Value::String(_)) => {
            Value::String(timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
        }
        _ => Value::from(timestamp.timestamp()),
    };
    map.insert(key.to_string(), value);
}

/// Copy every key from `source` that `target` lacks, recursing into objects
/// present on both sides.
pub fn fill_missing(target: &mut Value, source: &Value) {
    let (Value::Object(target), Value::Object(source)) = (target, source) else {
        return;
    };
    for (key, source_value) in source {
        match target.get_mut(key) {
            Some(target_value) => fill_missing(target_value, source_value),
            None => {
                target.insert(key.clone(), source_value.clone());
            }
        }
    }
}
