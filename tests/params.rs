//! Unit and property tests for the flat/nested parameter codec:
//! expansion, structural conflicts, merge precedence, and flattening.

use formtree::{expand, flatten, merge, BindingError, FlatParams, Value, MAX_LIST_INDEX};
use indexmap::IndexMap;
use proptest::prelude::*;

fn flat(entries: &[(&str, &str)]) -> FlatParams {
    let mut out = FlatParams::new();
    for (k, v) in entries {
        out.insert((*k).to_string(), Value::from(*v));
    }
    out
}

fn get<'a>(v: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = v;
    for seg in path.split('.') {
        cur = match cur {
            Value::Map(m) => m.get(seg)?,
            Value::List(l) => l.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(cur)
}

#[test]
fn test_expand_scalar_and_dotted_keys() {
    let nested = expand(&flat(&[
        ("title", "Dune"),
        ("author.name", "Herbert"),
        ("author.email", "fh@example.com"),
    ]))
    .expect("expand");
    assert_eq!(get(&nested, "title"), Some(&Value::from("Dune")));
    assert_eq!(get(&nested, "author.name"), Some(&Value::from("Herbert")));
    assert_eq!(
        get(&nested, "author.email"),
        Some(&Value::from("fh@example.com"))
    );
}

#[test]
fn test_expand_empty_params_is_empty_map() {
    let nested = expand(&FlatParams::new()).expect("expand");
    assert_eq!(nested, Value::Map(IndexMap::new()));
}

#[test]
fn test_expand_indexes_build_lists_with_holes() {
    let nested = expand(&flat(&[("tags.0", "a"), ("tags.3", "b")])).expect("expand");
    let tags = get(&nested, "tags").and_then(Value::as_list).expect("list");
    assert_eq!(tags.len(), 4);
    assert_eq!(tags[0], Value::from("a"));
    assert_eq!(tags[1], Value::Empty);
    assert_eq!(tags[2], Value::Empty);
    assert_eq!(tags[3], Value::from("b"));
}

#[test]
fn test_expand_numeric_top_level_keys_stay_map_keys() {
    let nested = expand(&flat(&[("0", "zero")])).expect("expand");
    assert_eq!(get(&nested, "0"), Some(&Value::from("zero")));
    assert!(matches!(nested, Value::Map(_)));
}

#[test]
fn test_expand_equivalent_indexes_last_wins() {
    // "07" and "7" address the same list slot.
    let nested = expand(&flat(&[("a.07", "first"), ("a.7", "second")])).expect("expand");
    assert_eq!(get(&nested, "a.7"), Some(&Value::from("second")));
}

#[test]
fn test_multi_select_list_values_pass_through() {
    let mut params = FlatParams::new();
    params.insert(
        "genres".to_string(),
        Value::List(vec![Value::from("scifi"), Value::from("fantasy")]),
    );
    let nested = expand(&params).expect("expand");
    let genres = get(&nested, "genres").and_then(Value::as_list).expect("list");
    assert_eq!(genres.len(), 2);
}

#[test]
fn test_conflict_scalar_then_nested() {
    let err = expand(&flat(&[("a", "x"), ("a.b", "y")])).expect_err("conflict");
    assert_eq!(err, BindingError::PathConflict("a".to_string()));
}

#[test]
fn test_conflict_nested_then_scalar() {
    let err = expand(&flat(&[("a.b", "y"), ("a", "x")])).expect_err("conflict");
    assert_eq!(err, BindingError::PathConflict("a".to_string()));
}

#[test]
fn test_conflict_list_versus_map_sibling_segments() {
    let err = expand(&flat(&[("a.b", "x"), ("a.0", "y")])).expect_err("conflict");
    assert_eq!(err, BindingError::PathConflict("a".to_string()));
}

#[test]
fn test_index_above_cap_is_rejected() {
    let err = expand(&flat(&[("tags.10000", "x")])).expect_err("too large");
    assert_eq!(
        err,
        BindingError::InvalidIndex("tags.10000".to_string(), "10000".to_string())
    );
    // The cap itself is fine.
    let key = format!("tags.{}", MAX_LIST_INDEX);
    let nested = expand(&flat(&[(key.as_str(), "x")])).expect("expand at cap");
    let tags = get(&nested, "tags").and_then(Value::as_list).expect("list");
    assert_eq!(tags.len(), MAX_LIST_INDEX + 1);
}

#[test]
fn test_overflowing_index_is_rejected() {
    let err = expand(&flat(&[("tags.99999999999999999999", "x")])).expect_err("overflow");
    assert!(matches!(err, BindingError::InvalidIndex(_, _)));
}

#[test]
fn test_empty_segments_are_rejected() {
    assert!(matches!(
        expand(&flat(&[("a..b", "x")])),
        Err(BindingError::EmptySegment(_))
    ));
    assert!(matches!(
        expand(&flat(&[("a.", "x")])),
        Err(BindingError::EmptySegment(_))
    ));
    assert!(matches!(
        expand(&flat(&[(".a", "x")])),
        Err(BindingError::EmptySegment(_))
    ));
}

#[test]
fn test_flatten_emits_dotted_and_indexed_keys() {
    let nested = expand(&flat(&[
        ("title", "Dune"),
        ("author.name", "Herbert"),
        ("tags.0", "scifi"),
        ("tags.1", "classic"),
    ]))
    .expect("expand");
    let out = flatten(&nested);
    let keys: Vec<&str> = out.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["title", "author.name", "tags.0", "tags.1"]);
    assert_eq!(out.get("tags.1"), Some(&Value::from("classic")));
}

#[test]
fn test_flatten_skips_holes_but_keeps_positions() {
    let nested = expand(&flat(&[("tags.0", "a"), ("tags.2", "b")])).expect("expand");
    let out = flatten(&nested);
    let keys: Vec<&str> = out.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["tags.0", "tags.2"]);
}

#[test]
fn test_merge_flat_side_wins() {
    let nested = expand(&flat(&[("title", "Draft"), ("author.name", "Anon")])).expect("expand");
    let merged = merge(&flat(&[("title", "Final")]), &nested).expect("merge");
    assert_eq!(get(&merged, "title"), Some(&Value::from("Final")));
    assert_eq!(get(&merged, "author.name"), Some(&Value::from("Anon")));
}

#[test]
fn test_merge_lists_index_wise() {
    let nested = expand(&flat(&[("tags.0", "old0"), ("tags.1", "old1")])).expect("expand");
    let merged = merge(&flat(&[("tags.1", "new1"), ("tags.2", "new2")]), &nested).expect("merge");
    let tags = get(&merged, "tags").and_then(Value::as_list).expect("list");
    assert_eq!(tags.len(), 3);
    assert_eq!(tags[0], Value::from("old0")); // the flat side has a hole here
    assert_eq!(tags[1], Value::from("new1"));
    assert_eq!(tags[2], Value::from("new2"));
}

#[test]
fn test_merge_keeps_nested_order_then_appends_flat_only_keys() {
    let nested = expand(&flat(&[("b", "1"), ("a", "2")])).expect("expand");
    let merged = merge(&flat(&[("c", "3"), ("a", "9")]), &nested).expect("merge");
    let map = merged.as_map().expect("map");
    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["b", "a", "c"]);
    assert_eq!(get(&merged, "a"), Some(&Value::from("9")));
}

/// Map keys that can never read as list indexes.
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}"
}

/// Leaf values that survive a flat round trip exactly: strings, integers,
/// booleans. Floats are excluded (no exact equality), as are holes and
/// empty containers (flatten drops them by design).
fn leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9 _.-]{0,12}".prop_map(Value::from),
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
    ]
}

fn pairs_to_map(pairs: Vec<(String, Value)>) -> Value {
    let mut map = IndexMap::new();
    for (k, v) in pairs {
        map.insert(k, v);
    }
    Value::Map(map)
}

fn nested_value_strategy() -> impl Strategy<Value = Value> {
    leaf_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(Value::List),
            prop::collection::vec((key_strategy(), inner), 1..4).prop_map(pairs_to_map),
        ]
    })
}

fn nested_map_strategy() -> impl Strategy<Value = Value> {
    prop::collection::vec((key_strategy(), nested_value_strategy()), 1..5).prop_map(pairs_to_map)
}

/// Arbitrary dotted keys mixing names and indexes, including shapes the
/// codec must reject.
fn flat_key_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof![key_strategy().boxed(), "[0-9]{1,3}".boxed()], 1..4)
        .prop_map(|segs| segs.join("."))
}

proptest! {
    #[test]
    fn test_flatten_expand_round_trip(nested in nested_map_strategy()) {
        let flat = flatten(&nested);
        let back = expand(&flat).expect("flatten output must re-expand");
        prop_assert_eq!(back, nested);
    }

    #[test]
    fn test_expand_total_on_arbitrary_keys(
        entries in prop::collection::vec((flat_key_strategy(), "[a-z0-9 ]{0,8}"), 0..8)
    ) {
        let mut params = FlatParams::new();
        for (k, v) in entries {
            params.insert(k, Value::from(v));
        }
        // Conflicts and bad indexes are Err values, never panics; whatever
        // expands cleanly must survive its own canonical flat form.
        if let Ok(nested) = expand(&params) {
            let reflat = flatten(&nested);
            let again = expand(&reflat).expect("canonical form must expand");
            prop_assert_eq!(again, nested);
        }
    }
}
