//! Dependency groups: clusters of fields that become co-required the moment
//! one of them shows up in the input.
//!
//! Promotion is transient. [`apply`] flips `required` on the affected nodes
//! and returns a token recording exactly which ones were flipped; the engine
//! hands the token back to [`revert`] before the cycle's results are read,
//! so declared `required` flags are never altered across cycles.

use crate::field::{join_path, FieldKind, FieldNode};
use crate::value::{Value, ValueType};

/// Member paths per group, in declaration order.
#[derive(Debug, Clone, Default)]
pub(crate) struct DependencyGroups {
    groups: Vec<(String, Vec<Member>)>,
}

#[derive(Debug, Clone)]
struct Member {
    path: String,
    boolean: bool,
}

impl DependencyGroups {
    fn push_member(&mut self, group: &str, member: Member) {
        if let Some((_, members)) = self.groups.iter_mut().find(|(name, _)| name == group) {
            members.push(member);
        } else {
            self.groups.push((group.to_string(), vec![member]));
        }
    }
}

/// Paths whose `required` flag was promoted this cycle.
#[derive(Debug, Default)]
pub(crate) struct RevertToken {
    forced: Vec<String>,
}

/// Gather groups from the static tree. Repeatable subtrees are skipped:
/// their item paths only exist after binding, too late for this pass.
/// Groups with fewer than two members have nothing to co-require and are
/// dropped.
pub(crate) fn collect(root: &FieldNode) -> DependencyGroups {
    let mut out = DependencyGroups::default();
    walk(root, "", &mut out);
    out.groups.retain(|(_, members)| members.len() >= 2);
    out
}

fn walk(node: &FieldNode, prefix: &str, out: &mut DependencyGroups) {
    let children = match &node.kind {
        FieldKind::Compound(children) => children,
        _ => return,
    };
    for child in children {
        let path = join_path(prefix, &child.name);
        if let Some(group) = &child.dependency_group {
            let member = Member {
                path: path.clone(),
                boolean: matches!(child.ty, ValueType::Boolean),
            };
            out.push_member(group, member);
        }
        walk(child, &path, out);
    }
}

/// Scan the normalized input and promote group members.
///
/// The scan stops at the first present member of each group; every other
/// member not already required gets `required = true` and its path goes
/// into the token. The triggering member itself is left alone.
pub(crate) fn apply(
    root: &mut FieldNode,
    groups: &DependencyGroups,
    input: &Value,
) -> RevertToken {
    let mut token = RevertToken::default();
    for (_, members) in &groups.groups {
        let hit = match members.iter().position(|m| member_present(input, m)) {
            Some(i) => i,
            None => continue,
        };
        for (i, member) in members.iter().enumerate() {
            if i == hit {
                continue;
            }
            if let Some(node) = root.find_mut(&member.path) {
                if !node.required {
                    node.required = true;
                    token.forced.push(member.path.clone());
                }
            }
        }
    }
    token
}

/// Undo a promotion pass.
pub(crate) fn revert(root: &mut FieldNode, token: RevertToken) {
    for path in token.forced {
        if let Some(node) = root.find_mut(&path) {
            node.required = false;
        }
    }
}

/// Presence test for one member. Blank values never count; a member
/// declared boolean additionally does not count when the value reads as
/// false, so an unticked "same as billing" checkbox cannot drag its whole
/// group into being required.
fn member_present(input: &Value, member: &Member) -> bool {
    let v = match lookup(input, &member.path) {
        Some(v) => v,
        None => return false,
    };
    if member.boolean {
        !v.is_false_like()
    } else {
        !v.is_blank()
    }
}

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = root;
    for seg in path.split('.') {
        cur = match cur {
            Value::Map(map) => map.get(seg)?,
            _ => return None,
        };
    }
    Some(cur)
}
