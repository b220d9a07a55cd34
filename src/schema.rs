//! Field declarations consumed once at form construction time.
//!
//! A [`FormSpec`] is an ordered sequence of [`FieldSpec`] records; the
//! builder turns it into the immutable field tree. Tree shape never changes
//! afterwards, except repeatable resizing during bind.

use crate::actions::{Action, Constraint};
use crate::value::{Value, ValueType};
use indexmap::IndexMap;
use std::sync::Arc;

/// Field-level validate hook, run after the field's pipeline. The argument
/// is the field's current value (or [`Value::Empty`] when the pipeline
/// produced none).
pub type FieldHook = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Form-level cross-field hook, run once after all fields validated, over
/// the accessor-keyed value map.
pub type FormHook = Arc<dyn Fn(&IndexMap<String, Value>) -> Vec<Issue> + Send + Sync>;

/// One cross-field finding: attached to a named field, or to the form
/// itself when `field` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub field: Option<String>,
    pub message: String,
}

impl Issue {
    /// Attach to the form itself.
    pub fn form(message: &str) -> Issue {
        Issue { field: None, message: message.to_string() }
    }

    /// Attach to the field at the given dotted path.
    pub fn on(field: &str, message: &str) -> Issue {
        Issue { field: Some(field.to_string()), message: message.to_string() }
    }
}

/// Presentation/extraction flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldFlags {
    /// Never emitted by fill-in-form output.
    pub password: bool,
    /// Skipped when seeding values from a backing object.
    pub writeonly: bool,
    /// Excluded from fill-in-form output.
    pub no_fif: bool,
}

/// Node kind of a declaration record.
#[derive(Clone)]
pub enum SpecKind {
    Simple,
    Compound(Vec<FieldSpec>),
    /// Template for one repeated entry; instances are cloned per bound index.
    Repeatable(Box<FieldSpec>),
}

/// One field declaration record.
#[derive(Clone)]
pub struct FieldSpec {
    pub name: String,
    pub kind: SpecKind,
    /// Identifier used against the backing object; defaults to `name`.
    pub accessor: Option<String>,
    pub ty: ValueType,
    pub required: bool,
    /// Trim string input before coercion (raw input is kept verbatim).
    pub trim: bool,
    pub flags: FieldFlags,
    /// Membership label: fields sharing a label form one dependency group.
    pub dependency_group: Option<String>,
    pub actions: Vec<Action>,
    pub validate: Option<FieldHook>,
    /// Opaque rendering hint for external templates.
    pub widget: Option<String>,
}

impl FieldSpec {
    pub fn new(name: &str, ty: ValueType) -> FieldSpec {
        FieldSpec {
            name: name.to_string(),
            kind: SpecKind::Simple,
            accessor: None,
            ty,
            required: false,
            trim: true,
            flags: FieldFlags::default(),
            dependency_group: None,
            actions: Vec::new(),
            validate: None,
            widget: None,
        }
    }

    pub fn text(name: &str) -> FieldSpec {
        FieldSpec::new(name, ValueType::Text)
    }

    pub fn integer(name: &str) -> FieldSpec {
        FieldSpec::new(name, ValueType::Integer)
    }

    pub fn float(name: &str) -> FieldSpec {
        FieldSpec::new(name, ValueType::Float)
    }

    pub fn boolean(name: &str) -> FieldSpec {
        FieldSpec::new(name, ValueType::Boolean)
    }

    /// Named group of child fields.
    pub fn compound(name: &str, children: Vec<FieldSpec>) -> FieldSpec {
        let mut spec = FieldSpec::new(name, ValueType::Text);
        spec.kind = SpecKind::Compound(children);
        spec
    }

    /// Ordered array of structurally-identical entries.
    pub fn repeatable(name: &str, template: FieldSpec) -> FieldSpec {
        let mut spec = FieldSpec::new(name, ValueType::Text);
        spec.kind = SpecKind::Repeatable(Box::new(template));
        spec
    }

    pub fn accessor(mut self, accessor: &str) -> Self {
        self.accessor = Some(accessor.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn password(mut self) -> Self {
        self.flags.password = true;
        self
    }

    pub fn writeonly(mut self) -> Self {
        self.flags.writeonly = true;
        self
    }

    pub fn no_fif(mut self) -> Self {
        self.flags.no_fif = true;
        self
    }

    pub fn no_trim(mut self) -> Self {
        self.trim = false;
        self
    }

    /// Join the dependency group with this label.
    pub fn depends_on(mut self, group: &str) -> Self {
        self.dependency_group = Some(group.to_string());
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Append a constraint check with its default message.
    pub fn check(mut self, constraint: Constraint) -> Self {
        self.actions.push(Action::check(constraint));
        self
    }

    /// Append a constraint check with an overriding message.
    pub fn check_msg(mut self, constraint: Constraint, message: &str) -> Self {
        self.actions.push(Action::check_msg(constraint, message));
        self
    }

    /// Append a custom transform step.
    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.actions.push(Action::transform(f));
        self
    }

    /// Set the field-level validate hook.
    pub fn validate_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(f));
        self
    }

    pub fn widget(mut self, widget: &str) -> Self {
        self.widget = Some(widget.to_string());
        self
    }
}

/// Whole-form declaration: ordered fields plus form-level hooks.
#[derive(Clone, Default)]
pub struct FormSpec {
    /// Grouping key: when set, parameters are read from the submission's
    /// top-level entry of this name, so several forms can share one request.
    /// An absent entry means no parameters arrived for this form.
    pub name: Option<String>,
    pub fields: Vec<FieldSpec>,
    pub validate: Option<FormHook>,
}

impl FormSpec {
    pub fn new(fields: Vec<FieldSpec>) -> FormSpec {
        FormSpec { name: None, fields, validate: None }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the form-level cross-field hook.
    pub fn validate_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&IndexMap<String, Value>) -> Vec<Issue> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(f));
        self
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("empty field name")]
    EmptyName,
    #[error("field name `{0}` contains `.`")]
    DottedName(String),
    #[error("field name `{0}` is purely numeric")]
    NumericName(String),
    #[error("duplicate field `{0}`")]
    DuplicateField(String),
}
