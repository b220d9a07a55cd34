//! The field tree: one node per declared field, with three kinds (simple,
//! compound, repeatable) that every traversal matches exhaustively.
//!
//! The tree is built once from a [`FormSpec`](crate::schema::FormSpec) and
//! its shape never changes afterwards, except repeatable items, which are
//! rebuilt from the template on every bind to match the incoming list.

use crate::actions::Action;
use crate::params::BindingError;
use crate::schema::{FieldFlags, FieldHook, FieldSpec, SchemaError, SpecKind};
use crate::value::{Value, ValueType};
use std::collections::HashSet;

/// Node kind. Children are owned by the kind payload; simple nodes have none.
#[derive(Clone)]
pub enum FieldKind {
    Simple,
    Compound(Vec<FieldNode>),
    Repeatable {
        /// Pristine per-entry declaration; never bound itself.
        template: Box<FieldNode>,
        /// Current instances, named by decimal index, rebuilt per bind.
        items: Vec<FieldNode>,
    },
}

/// One node of the field tree.
#[derive(Clone)]
pub struct FieldNode {
    pub(crate) name: String,
    pub(crate) accessor: String,
    pub(crate) ty: ValueType,
    pub(crate) required: bool,
    pub(crate) trim: bool,
    pub(crate) flags: FieldFlags,
    pub(crate) dependency_group: Option<String>,
    pub(crate) actions: Vec<Action>,
    pub(crate) validate: Option<FieldHook>,
    pub(crate) widget: Option<String>,
    pub(crate) raw_input: Option<Value>,
    pub(crate) value: Option<Value>,
    pub(crate) init_value: Option<Value>,
    pub(crate) errors: Vec<String>,
    pub(crate) kind: FieldKind,
}

impl FieldNode {
    /// Build one node (and its subtree) from a declaration record.
    pub(crate) fn from_spec(spec: FieldSpec) -> Result<FieldNode, SchemaError> {
        check_name(&spec.name)?;
        let FieldSpec {
            name,
            kind,
            accessor,
            ty,
            required,
            trim,
            flags,
            dependency_group,
            actions,
            validate,
            widget,
        } = spec;
        let kind = match kind {
            SpecKind::Simple => FieldKind::Simple,
            SpecKind::Compound(children) => FieldKind::Compound(build_children(children)?),
            SpecKind::Repeatable(template) => FieldKind::Repeatable {
                template: Box::new(FieldNode::from_spec(*template)?),
                items: Vec::new(),
            },
        };
        Ok(FieldNode {
            accessor: accessor.unwrap_or_else(|| name.clone()),
            name,
            ty,
            required,
            trim,
            flags,
            dependency_group,
            actions,
            validate,
            widget,
            raw_input: None,
            value: None,
            init_value: None,
            errors: Vec::new(),
            kind,
        })
    }

    /// The form's own container node. Root has no name and no declarations
    /// of its own; form-level errors land here.
    pub(crate) fn root(fields: Vec<FieldSpec>) -> Result<FieldNode, SchemaError> {
        Ok(FieldNode {
            name: String::new(),
            accessor: String::new(),
            ty: ValueType::Text,
            required: false,
            trim: false,
            flags: FieldFlags::default(),
            dependency_group: None,
            actions: Vec::new(),
            validate: None,
            widget: None,
            raw_input: None,
            value: None,
            init_value: None,
            errors: Vec::new(),
            kind: FieldKind::Compound(build_children(fields)?),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accessor(&self) -> &str {
        &self.accessor
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn widget(&self) -> Option<&str> {
        self.widget.as_deref()
    }

    pub fn raw_input(&self) -> Option<&Value> {
        self.raw_input.as_ref()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn init_value(&self) -> Option<&Value> {
        self.init_value.as_ref()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Declared children (compound) or current items (repeatable).
    pub fn children(&self) -> &[FieldNode] {
        match &self.kind {
            FieldKind::Simple => &[],
            FieldKind::Compound(children) => children,
            FieldKind::Repeatable { items, .. } => items,
        }
    }

    pub(crate) fn children_mut(&mut self) -> &mut [FieldNode] {
        match &mut self.kind {
            FieldKind::Simple => &mut [],
            FieldKind::Compound(children) => children,
            FieldKind::Repeatable { items, .. } => items,
        }
    }

    /// Look a node up by dotted path (repeatable items by decimal index).
    pub fn find(&self, path: &str) -> Option<&FieldNode> {
        let mut node = self;
        for seg in path.split('.') {
            node = node.children().iter().find(|c| c.name == seg)?;
        }
        Some(node)
    }

    pub(crate) fn find_mut(&mut self, path: &str) -> Option<&mut FieldNode> {
        let mut node = self;
        for seg in path.split('.') {
            node = node.children_mut().iter_mut().find(|c| c.name == seg)?;
        }
        Some(node)
    }

    /// Copy external input into the subtree's raw-input slots.
    ///
    /// Simple nodes store the input verbatim, whatever its shape — a
    /// mis-shaped value becomes a coercion error during validation, not a
    /// bind failure. Compound input must be a map, repeatable input a list;
    /// anything else is a structural mismatch and aborts the cycle.
    pub(crate) fn bind(&mut self, input: &Value, path: &str) -> Result<(), BindingError> {
        match &mut self.kind {
            FieldKind::Simple => {
                self.raw_input = Some(input.clone());
                Ok(())
            }
            FieldKind::Compound(children) => {
                let map = match input {
                    Value::Map(m) => m,
                    other => {
                        return Err(BindingError::UnexpectedShape(
                            path.to_string(),
                            "map",
                            other.shape(),
                        ))
                    }
                };
                self.raw_input = Some(input.clone());
                for child in children.iter_mut() {
                    if let Some(sub) = map.get(child.name.as_str()) {
                        let child_path = join_path(path, &child.name);
                        child.bind(sub, &child_path)?;
                    }
                }
                Ok(())
            }
            FieldKind::Repeatable { template, items } => {
                let list = match input {
                    Value::List(l) => l,
                    other => {
                        return Err(BindingError::UnexpectedShape(
                            path.to_string(),
                            "list",
                            other.shape(),
                        ))
                    }
                };
                self.raw_input = Some(input.clone());
                // Destructive resize: previous items are discarded, holes
                // from sparse indexes are compacted away.
                items.clear();
                for element in list {
                    if matches!(element, Value::Empty) {
                        continue;
                    }
                    let mut item = (**template).clone();
                    item.name = items.len().to_string();
                    item.accessor = item.name.clone();
                    let item_path = join_path(path, &item.name);
                    item.bind(element, &item_path)?;
                    items.push(item);
                }
                Ok(())
            }
        }
    }

    /// Seed `value`/`init_value` from a backing object's data, keyed by
    /// accessor. Write-only fields are skipped; raw input is never touched,
    /// so a later parameter bind always wins.
    pub(crate) fn init_from_value(&mut self, v: &Value) {
        if self.flags.writeonly {
            return;
        }
        match &mut self.kind {
            FieldKind::Simple => {
                self.value = Some(v.clone());
                self.init_value = Some(v.clone());
            }
            FieldKind::Compound(children) => {
                if let Value::Map(map) = v {
                    for child in children.iter_mut() {
                        if let Some(sub) = map.get(child.accessor.as_str()) {
                            child.init_from_value(sub);
                        }
                    }
                    self.value = Some(v.clone());
                    self.init_value = Some(v.clone());
                }
            }
            FieldKind::Repeatable { template, items } => {
                if let Value::List(list) = v {
                    items.clear();
                    for element in list {
                        if matches!(element, Value::Empty) {
                            continue;
                        }
                        let mut item = (**template).clone();
                        item.name = items.len().to_string();
                        item.accessor = item.name.clone();
                        item.init_from_value(element);
                        items.push(item);
                    }
                    self.value = Some(v.clone());
                    self.init_value = Some(v.clone());
                }
            }
        }
    }

    /// Wipe per-cycle state; declarations and tree shape stay, repeatable
    /// items are dropped. Idempotent.
    pub(crate) fn clear_state(&mut self) {
        self.raw_input = None;
        self.value = None;
        self.init_value = None;
        self.errors.clear();
        match &mut self.kind {
            FieldKind::Simple => {}
            FieldKind::Compound(children) => {
                for child in children.iter_mut() {
                    child.clear_state();
                }
            }
            FieldKind::Repeatable { items, .. } => items.clear(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn has_errors_deep(&self) -> bool {
        !self.errors.is_empty() || self.children().iter().any(FieldNode::has_errors_deep)
    }

    pub(crate) fn collect_errors(&self, out: &mut Vec<String>) {
        out.extend(self.errors.iter().cloned());
        for child in self.children() {
            child.collect_errors(out);
        }
    }

    pub(crate) fn collect_error_fields(&self, prefix: &str, out: &mut Vec<String>) {
        for child in self.children() {
            let path = join_path(prefix, &child.name);
            if !child.errors.is_empty() {
                out.push(path.clone());
            }
            child.collect_error_fields(&path, out);
        }
    }

    pub(crate) fn collect_field_errors(&self, prefix: &str, out: &mut Vec<(String, String)>) {
        for child in self.children() {
            let path = join_path(prefix, &child.name);
            for msg in &child.errors {
                out.push((path.clone(), msg.clone()));
            }
            child.collect_field_errors(&path, out);
        }
    }

    /// Paths of simple fields whose value differs from the initialization
    /// snapshot. A field with no raw input this cycle was never submitted
    /// and counts as unchanged, whatever it was seeded with.
    pub(crate) fn collect_changed(&self, prefix: &str, out: &mut Vec<String>) {
        for child in self.children() {
            let path = join_path(prefix, &child.name);
            match &child.kind {
                FieldKind::Simple => {
                    if child.raw_input.is_some() && child.value != child.init_value {
                        out.push(path);
                    }
                }
                _ => child.collect_changed(&path, out),
            }
        }
    }
}

/// Dotted path segment joining; the root prefix is the empty string.
pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn build_children(specs: Vec<FieldSpec>) -> Result<Vec<FieldNode>, SchemaError> {
    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(specs.len());
    for spec in specs {
        if !seen.insert(spec.name.clone()) {
            return Err(SchemaError::DuplicateField(spec.name));
        }
        nodes.push(FieldNode::from_spec(spec)?);
    }
    Ok(nodes)
}

fn check_name(name: &str) -> Result<(), SchemaError> {
    if name.is_empty() {
        return Err(SchemaError::EmptyName);
    }
    if name.contains('.') {
        return Err(SchemaError::DottedName(name.to_string()));
    }
    if name.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SchemaError::NumericName(name.to_string()));
    }
    Ok(())
}
