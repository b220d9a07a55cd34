//! Processing engine: drives one submission through seed, bind, validate
//! and commit, and exposes the results.
//!
//! A [`Form`] is reusable. Each call to [`Form::process`] (or
//! [`Form::process_with`]) is one cycle: state left over from the previous
//! cycle is cleared first, so a form handling a redisplay loop never leaks
//! errors or values between requests.

use crate::actions::run_pipeline;
use crate::depends::{self, DependencyGroups};
use crate::extract;
use crate::field::{FieldKind, FieldNode};
use crate::params::{self, BindingError, FlatParams};
use crate::schema::{FormHook, FormSpec, SchemaError};
use crate::value::Value;
use indexmap::IndexMap;

/// Where a form is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Built or cleared; nothing bound yet.
    Unprocessed,
    /// Input copied into the tree.
    Bound,
    /// Validation underway.
    Validating,
    /// Validation ran and found no errors.
    Valid,
    /// Validation ran and at least one error is attached.
    Invalid,
    /// Validated values written to the backing object.
    Committed,
}

/// Processing failures that abort a cycle.
///
/// Field-level problems (failed coercions, constraint misses, hook
/// complaints) are not errors here — they land on the tree and make the
/// cycle return `Ok(false)`.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// Input shape contradicts the declared tree or the path grammar.
    #[error(transparent)]
    Binding(#[from] BindingError),
    /// The submission itself is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The backing object rejected the validated values.
    #[error("model update failed: {0}")]
    Model(String),
}

/// Backing object collaborator: read seeds initialization, write receives
/// the validated value map after a clean cycle.
pub trait Model {
    /// Current value for one top-level accessor, if the object has one.
    fn read(&self, accessor: &str) -> Option<Value>;
    /// Apply the validated values. An `Err` surfaces as [`FormError::Model`];
    /// the form stays [`Stage::Valid`] and nothing is rolled back.
    fn write(&mut self, values: &IndexMap<String, Value>) -> Result<(), String>;
}

impl Model for IndexMap<String, Value> {
    fn read(&self, accessor: &str) -> Option<Value> {
        self.get(accessor).cloned()
    }

    fn write(&mut self, values: &IndexMap<String, Value>) -> Result<(), String> {
        for (k, v) in values {
            self.insert(k.clone(), v.clone());
        }
        Ok(())
    }
}

struct NoModel;

impl Model for NoModel {
    fn read(&self, _accessor: &str) -> Option<Value> {
        None
    }

    fn write(&mut self, _values: &IndexMap<String, Value>) -> Result<(), String> {
        Ok(())
    }
}

/// Inputs for one processing cycle.
///
/// Flat parameters and a nested document may both be given; they are merged
/// with the flat side winning. An `item` seeds field values for display or
/// diffing and never counts as input on its own.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    flat: FlatParams,
    nested: Option<Value>,
    item: Option<Value>,
}

impl Submission {
    pub fn new() -> Submission {
        Submission::default()
    }

    /// Add flat parameters, e.g. a decoded query string.
    pub fn flat(mut self, params: FlatParams) -> Submission {
        self.flat.extend(params);
        self
    }

    /// Add a single flat parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Submission {
        self.flat.insert(key.into(), value.into());
        self
    }

    /// Supply an already-nested input document.
    pub fn nested(mut self, value: Value) -> Submission {
        self.nested = Some(value);
        self
    }

    /// Seed initial values from a map keyed by accessor.
    pub fn item(mut self, item: Value) -> Submission {
        self.item = Some(item);
        self
    }

    fn has_input(&self) -> bool {
        !self.flat.is_empty() || self.nested.is_some()
    }
}

/// A declared form plus its per-cycle state.
pub struct Form {
    name: Option<String>,
    root: FieldNode,
    groups: DependencyGroups,
    validate: Option<FormHook>,
    stage: Stage,
    ran_validation: bool,
}

impl Form {
    /// Build the field tree from declarations. Fails on bad field names or
    /// duplicate siblings; a built form is structurally sound for good.
    pub fn build(spec: FormSpec) -> Result<Form, SchemaError> {
        let FormSpec {
            name,
            fields,
            validate,
        } = spec;
        let root = FieldNode::root(fields)?;
        let groups = depends::collect(&root);
        Ok(Form {
            name,
            root,
            groups,
            validate,
            stage: Stage::Unprocessed,
            ran_validation: false,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Whether the last cycle actually reached validation. Display-only
    /// cycles (no parameters) leave this false.
    pub fn ran_validation(&self) -> bool {
        self.ran_validation
    }

    /// Validation ran and the tree is clean.
    pub fn validated(&self) -> bool {
        matches!(self.stage, Stage::Valid | Stage::Committed)
    }

    /// Run one cycle without a backing object.
    ///
    /// Returns `Ok(true)` when validation ran and passed, `Ok(false)` when
    /// it found errors or was skipped for lack of input.
    pub fn process(&mut self, submission: Submission) -> Result<bool, FormError> {
        self.run(submission, Option::<&mut NoModel>::None)
    }

    /// Run one cycle against a backing object: the object seeds initial
    /// values, and a clean cycle ends with the validated values written
    /// back and the form at [`Stage::Committed`].
    pub fn process_with<M: Model>(
        &mut self,
        submission: Submission,
        model: &mut M,
    ) -> Result<bool, FormError> {
        self.run(submission, Some(model))
    }

    fn run<M: Model>(
        &mut self,
        submission: Submission,
        mut model: Option<&mut M>,
    ) -> Result<bool, FormError> {
        // Every cycle starts from scratch, even after a display-only one.
        self.clear();

        // Seed from the backing object first, then the explicit item on
        // top of it, both keyed by accessor.
        if let Some(m) = model.as_deref() {
            for child in self.root.children_mut() {
                if let Some(v) = m.read(child.accessor()) {
                    child.init_from_value(&v);
                }
            }
        }
        if let Some(item) = &submission.item {
            let map = match item {
                Value::Map(m) => m,
                other => {
                    return Err(FormError::Configuration(format!(
                        "init item must be a map, got {}",
                        other.shape()
                    )))
                }
            };
            for child in self.root.children_mut() {
                if let Some(v) = map.get(child.accessor()) {
                    child.init_from_value(v);
                }
            }
        }

        // No parameters: display-only cycle, validation never runs.
        if !submission.has_input() {
            return Ok(false);
        }

        let normalized = match normalize(&submission) {
            Ok(v) => v,
            Err(e) => {
                self.clear();
                return Err(FormError::Binding(e));
            }
        };
        let input = match self.grouped(normalized) {
            // A named form whose key is absent got no parameters this
            // cycle; seeded values stay for display.
            Ok(None) => return Ok(false),
            Ok(Some(v)) => v,
            Err(e) => {
                self.clear();
                return Err(FormError::Binding(e));
            }
        };

        let token = depends::apply(&mut self.root, &self.groups, &input);

        if let Err(e) = self.root.bind(&input, "") {
            depends::revert(&mut self.root, token);
            self.clear();
            return Err(FormError::Binding(e));
        }
        self.stage = Stage::Bound;

        self.run_validation();

        depends::revert(&mut self.root, token);

        self.stage = if self.error_count() == 0 {
            Stage::Valid
        } else {
            Stage::Invalid
        };

        if self.stage == Stage::Valid {
            if let Some(m) = model.as_deref_mut() {
                let values = self.values();
                m.write(&values).map_err(FormError::Model)?;
                self.stage = Stage::Committed;
            }
        }
        Ok(self.validated())
    }

    /// Field-tree walk plus the form-level hook. Hook issues land on the
    /// named field when the path resolves, on the form otherwise.
    fn run_validation(&mut self) {
        self.stage = Stage::Validating;
        validate_node(&mut self.root);
        self.ran_validation = true;

        if let Some(hook) = &self.validate {
            let values = extract::value_map(self.root.children());
            for issue in hook(&values) {
                match issue.field {
                    Some(path) => match self.root.find_mut(&path) {
                        Some(node) => node.errors.push(issue.message),
                        None => self
                            .root
                            .errors
                            .push(format!("{}: {}", path, issue.message)),
                    },
                    None => self.root.errors.push(issue.message),
                }
            }
        }
    }

    /// Drop all per-cycle state. The declared tree survives; repeatable
    /// items do not.
    pub fn clear(&mut self) {
        self.root.clear_state();
        self.stage = Stage::Unprocessed;
        self.ran_validation = false;
    }

    /// Top-level fields with broken subtrees, plus one per form-level error.
    pub fn error_count(&self) -> usize {
        let broken = self
            .root
            .children()
            .iter()
            .filter(|c| c.has_errors_deep())
            .count();
        broken + self.root.errors.len()
    }

    /// Every message on the tree: form-level first, then fields in
    /// declaration order, depth first.
    pub fn errors(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.root.collect_errors(&mut out);
        out
    }

    /// Dotted paths of fields carrying at least one error.
    pub fn error_fields(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.root.collect_error_fields("", &mut out);
        out
    }

    /// `(path, message)` pairs in tree order.
    pub fn field_errors(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        self.root.collect_field_errors("", &mut out);
        out
    }

    /// Paths whose value moved away from the initialization snapshot.
    pub fn changed_fields(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.root.collect_changed("", &mut out);
        out
    }

    /// Typed results keyed by accessor.
    pub fn values(&self) -> IndexMap<String, Value> {
        extract::value_map(self.root.children())
    }

    /// Flat redisplay parameters, or `None` when nothing would be shown.
    pub fn fif(&self) -> Option<FlatParams> {
        extract::fill_in_form(&self.root)
    }

    /// Look up a node by dotted path.
    pub fn field(&self, path: &str) -> Option<&FieldNode> {
        self.root.find(path)
    }

    /// Named forms read their parameters from the submission's top-level
    /// entry of their own name, so several forms can share one request
    /// without seeing each other's keys. `None` when the entry is absent:
    /// nothing in this submission belongs to this form.
    fn grouped(&self, normalized: Value) -> Result<Option<Value>, BindingError> {
        let name = match &self.name {
            Some(name) => name,
            None => return Ok(Some(normalized)),
        };
        let mut map = match normalized {
            Value::Map(m) => m,
            other => return Ok(Some(other)),
        };
        match map.shift_remove(name.as_str()) {
            Some(inner @ Value::Map(_)) => Ok(Some(inner)),
            Some(other) => Err(BindingError::UnexpectedShape(
                name.clone(),
                "map",
                other.shape(),
            )),
            None => Ok(None),
        }
    }
}

fn normalize(submission: &Submission) -> Result<Value, BindingError> {
    match &submission.nested {
        Some(nested) => params::merge(&submission.flat, nested),
        None => params::expand(&submission.flat),
    }
}

/// Post-order validation walk.
///
/// Children settle their values first; the node then checks presence (raw
/// input bound and non-blank), runs its pipeline on the working value, and
/// finally its custom hook. A required node with no present input gets the
/// error and skips the rest.
fn validate_node(node: &mut FieldNode) {
    match &mut node.kind {
        FieldKind::Simple => {}
        FieldKind::Compound(children) => {
            for child in children.iter_mut() {
                validate_node(child);
            }
        }
        FieldKind::Repeatable { items, .. } => {
            for item in items.iter_mut() {
                validate_node(item);
            }
        }
    }

    let present = node
        .raw_input()
        .map_or(false, |r| !r.is_blank());
    if !present {
        if node.required() {
            node.errors.push(String::from("field is required"));
        }
        node.value = None;
        return;
    }

    let working = match &node.kind {
        FieldKind::Simple => match node.raw_input() {
            Some(v) => v.clone(),
            None => return,
        },
        FieldKind::Compound(children) => Value::Map(extract::value_map(children)),
        FieldKind::Repeatable { items, .. } => {
            Value::List(items.iter().filter_map(extract::value_of).collect())
        }
    };
    let (ty, trim) = if matches!(node.kind, FieldKind::Simple) {
        (Some(node.ty), node.trim)
    } else {
        (None, false)
    };
    match run_pipeline(&working, ty, trim, &node.actions) {
        Ok(v) => node.value = Some(v),
        Err(msg) => {
            node.errors.push(msg);
            node.value = None;
        }
    }
    if let Some(hook) = &node.validate {
        let v = node.value.clone().unwrap_or(Value::Empty);
        if let Err(msg) = hook(&v) {
            node.errors.push(msg);
        }
    }
}
