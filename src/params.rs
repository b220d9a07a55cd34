//! Expand flat, dot/index-addressed parameter maps into nested values,
//! merge them with already-nested input, and flatten nested values back out.
//!
//! Keys split on `.`; below the root a purely-numeric segment addresses a
//! list slot, any other segment a map key. The expansion root is always a
//! map: parameter names are strings, even when they look numeric.

use crate::value::Value;
use indexmap::IndexMap;

/// Raw submission shape: flat keys to scalar or list values, in arrival order.
pub type FlatParams = IndexMap<String, Value>;

/// Largest accepted list index. Anything beyond this is not a valid array
/// position and fails the bind instead of allocating.
pub const MAX_LIST_INDEX: usize = 9999;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindingError {
    /// The same path prefix was used both as a list and as a map, or a
    /// scalar key collides with a structured one.
    #[error("conflicting structure at `{0}`")]
    PathConflict(String),
    #[error("invalid list index `{1}` at `{0}`")]
    InvalidIndex(String, String),
    #[error("empty segment in key `{0}`")]
    EmptySegment(String),
    #[error("expected {1} at `{0}`, got {2}")]
    UnexpectedShape(String, &'static str, &'static str),
}

/// Expand a flat parameter map into a nested map/list/scalar structure.
///
/// Sparse indexes leave [`Value::Empty`] holes; later keys may turn a hole
/// into a container. A key arriving twice for the same scalar slot follows
/// last-key precedence.
pub fn expand(flat: &FlatParams) -> Result<Value, BindingError> {
    let mut root = IndexMap::new();
    for (key, val) in flat {
        let segs: Vec<&str> = key.split('.').collect();
        if segs.iter().any(|s| s.is_empty()) {
            return Err(BindingError::EmptySegment(key.clone()));
        }
        let slot = root.entry(segs[0].to_string()).or_insert(Value::Empty);
        place(slot, &segs, 1, val)?;
    }
    Ok(Value::Map(root))
}

/// Merge flat parameters over an already-nested structure. Both sides may be
/// supplied by the caller at once; the flat-derived structure wins wherever
/// the two overlap. This precedence is intentional.
pub fn merge(flat: &FlatParams, nested: &Value) -> Result<Value, BindingError> {
    let expanded = expand(flat)?;
    Ok(merge_value(expanded, nested))
}

/// Inverse projection of [`expand`]: nested map back to flat dotted keys.
/// Empty containers and holes contribute no keys.
pub fn flatten(nested: &Value) -> FlatParams {
    let mut out = IndexMap::new();
    if let Value::Map(m) = nested {
        for (k, v) in m {
            flatten_into(&mut out, k.clone(), v);
        }
    }
    out
}

fn place(slot: &mut Value, segs: &[&str], depth: usize, val: &Value) -> Result<(), BindingError> {
    if depth == segs.len() {
        return match slot {
            Value::Map(_) | Value::List(_) => Err(BindingError::PathConflict(segs.join("."))),
            _ => {
                *slot = val.clone();
                Ok(())
            }
        };
    }
    let seg = segs[depth];
    match classify(seg, segs, depth)? {
        Seg::Index(idx) => {
            if matches!(slot, Value::Empty) {
                *slot = Value::List(Vec::new());
            }
            let list = match slot {
                Value::List(l) => l,
                _ => return Err(BindingError::PathConflict(segs[..depth].join("."))),
            };
            while list.len() <= idx {
                list.push(Value::Empty);
            }
            place(&mut list[idx], segs, depth + 1, val)
        }
        Seg::Key => {
            if matches!(slot, Value::Empty) {
                *slot = Value::Map(IndexMap::new());
            }
            let map = match slot {
                Value::Map(m) => m,
                _ => return Err(BindingError::PathConflict(segs[..depth].join("."))),
            };
            let entry = map.entry(seg.to_string()).or_insert(Value::Empty);
            place(entry, segs, depth + 1, val)
        }
    }
}

enum Seg {
    Key,
    Index(usize),
}

fn classify(seg: &str, segs: &[&str], depth: usize) -> Result<Seg, BindingError> {
    if !seg.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(Seg::Key);
    }
    let bad = || BindingError::InvalidIndex(segs[..=depth].join("."), seg.to_string());
    let idx: usize = seg.parse().map_err(|_| bad())?;
    if idx > MAX_LIST_INDEX {
        return Err(bad());
    }
    Ok(Seg::Index(idx))
}

fn merge_value(flat: Value, nested: &Value) -> Value {
    match (flat, nested) {
        (Value::Map(mut fm), Value::Map(nm)) => {
            let mut out = IndexMap::new();
            for (k, nv) in nm {
                match fm.shift_remove(k) {
                    Some(fv) => out.insert(k.clone(), merge_value(fv, nv)),
                    None => out.insert(k.clone(), nv.clone()),
                };
            }
            for (k, fv) in fm {
                out.insert(k, fv);
            }
            Value::Map(out)
        }
        (Value::List(mut fl), Value::List(nl)) => {
            if fl.len() < nl.len() {
                fl.resize(nl.len(), Value::Empty);
            }
            let merged = fl
                .into_iter()
                .enumerate()
                .map(|(i, f)| match (f, nl.get(i)) {
                    (Value::Empty, Some(n)) => n.clone(),
                    (f, Some(n)) => merge_value(f, n),
                    (f, None) => f,
                })
                .collect();
            Value::List(merged)
        }
        (Value::Empty, n) => n.clone(),
        (f, _) => f,
    }
}

fn flatten_into(out: &mut FlatParams, prefix: String, v: &Value) {
    match v {
        Value::Map(m) => {
            for (k, child) in m {
                flatten_into(out, format!("{}.{}", prefix, k), child);
            }
        }
        Value::List(l) => {
            for (i, child) in l.iter().enumerate() {
                flatten_into(out, format!("{}.{}", prefix, i), child);
            }
        }
        Value::Empty => {}
        scalar => {
            out.insert(prefix, scalar.clone());
        }
    }
}
