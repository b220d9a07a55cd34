//! Optional serde_json bridge, so nested input can come straight off a JSON
//! request body and validated values can go straight back out.

use crate::value::Value;
use indexmap::IndexMap;

/// JSON to engine value. `null` maps to [`Value::Empty`]; numbers become
/// integers when that is lossless, floats otherwise.
pub fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Empty,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(0.0)),
        },
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(from_json).collect()),
        serde_json::Value::Object(map) => {
            let mut out = IndexMap::new();
            for (k, v) in map {
                out.insert(k.clone(), from_json(v));
            }
            Value::Map(out)
        }
    }
}

/// Engine value to JSON. [`Value::Empty`] maps to `null`; a non-finite
/// float has no JSON form and also becomes `null`.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Value::from(*f),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::List(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Map(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                out.insert(k.clone(), to_json(v));
            }
            serde_json::Value::Object(out)
        }
        Value::Empty => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_and_empty_map_onto_each_other() {
        assert_eq!(from_json(&serde_json::Value::Null), Value::Empty);
        assert_eq!(to_json(&Value::Empty), serde_json::Value::Null);
    }

    #[test]
    fn numbers_stay_integers_when_lossless() {
        assert_eq!(from_json(&json!(42)), Value::Int(42));
        assert_eq!(from_json(&json!(-7)), Value::Int(-7));
        assert_eq!(from_json(&json!(1.5)), Value::Float(1.5));
        // Too big for i64, so it falls back to float.
        assert_eq!(from_json(&json!(1.0e19)), Value::Float(1.0e19));
    }

    #[test]
    fn nested_document_round_trips() {
        let doc = json!({
            "title": "Dune",
            "year": 1965,
            "tags": ["scifi", "classic"],
            "author": { "name": "Herbert", "note": null }
        });
        let value = from_json(&doc);
        let map = value.as_map().expect("map");
        assert_eq!(map.get("year"), Some(&Value::Int(1965)));
        assert_eq!(
            map.get("author").and_then(Value::as_map).and_then(|a| a.get("note")),
            Some(&Value::Empty)
        );
        assert_eq!(to_json(&value), doc);
    }
}
