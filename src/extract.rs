//! Read-back views over a processed tree: flat redisplay parameters and the
//! typed result map.

use crate::field::{join_path, FieldKind, FieldNode};
use crate::params::FlatParams;
use crate::value::Value;
use indexmap::IndexMap;

/// Flat parameters for re-rendering the form, keyed by dotted path.
///
/// Each simple node contributes what it would show: its raw input when one
/// is bound, otherwise its seeded value. Password and no-fif fields are
/// suppressed, as is anything below them. `None` when no node contributes
/// at all, which tells a renderer there is no form state to echo.
pub(crate) fn fill_in_form(root: &FieldNode) -> Option<FlatParams> {
    let mut out = FlatParams::new();
    for child in root.children() {
        fif_node(child, child.name(), &mut out);
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn fif_node(node: &FieldNode, path: &str, out: &mut FlatParams) {
    if node.flags.password || node.flags.no_fif {
        return;
    }
    match &node.kind {
        FieldKind::Simple => {
            let shown = node.raw_input.as_ref().or(node.value.as_ref());
            if let Some(v) = shown {
                if !matches!(v, Value::Empty) {
                    out.insert(path.to_string(), v.clone());
                }
            }
        }
        _ => {
            for child in node.children() {
                fif_node(child, &join_path(path, child.name()), out);
            }
        }
    }
}

/// Typed values for a sibling run, keyed by accessor, declaration order.
pub(crate) fn value_map(nodes: &[FieldNode]) -> IndexMap<String, Value> {
    let mut out = IndexMap::new();
    for node in nodes {
        if let Some(v) = value_of(node) {
            out.insert(node.accessor().to_string(), v);
        }
    }
    out
}

/// The node's contribution to the result, if it has one.
///
/// A validated node carries its pipeline output directly (which is how a
/// compound transform can replace the child map with a composed scalar).
/// Containers that were only seeded fall back to assembling from children.
pub(crate) fn value_of(node: &FieldNode) -> Option<Value> {
    if let Some(v) = node.value() {
        return Some(v.clone());
    }
    match node.kind() {
        FieldKind::Simple => None,
        FieldKind::Compound(children) => {
            let m = value_map(children);
            if m.is_empty() {
                None
            } else {
                Some(Value::Map(m))
            }
        }
        FieldKind::Repeatable { items, .. } => {
            let list: Vec<Value> = items.iter().filter_map(value_of).collect();
            if list.is_empty() {
                None
            } else {
                Some(Value::List(list))
            }
        }
    }
}
