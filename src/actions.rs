//! Per-field action pipelines: ordered coercion, constraint, and transform
//! steps with stop-on-first-failure semantics.
//!
//! A failing step records one message for the field and skips the remaining
//! steps; field-level and form-level validate hooks still run afterwards, so
//! a field carries at most one pipeline error plus any hook errors.

use crate::value::{Value, ValueType};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Custom value-to-value step. `Arc` so repeatable templates stay cloneable.
pub type TransformFn = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

/// Custom predicate for [`Constraint::With`].
pub type CheckFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// One pipeline step. Steps execute strictly in declared order.
#[derive(Clone)]
pub enum Action {
    /// Coerce the working value with the built-in type system.
    Coerce(ValueType),
    /// Check a constraint; on failure the message (or the constraint's
    /// default) is recorded and the pipeline stops.
    Check {
        constraint: Constraint,
        message: Option<String>,
    },
    /// Apply a custom transform; an `Err` is recorded like a failed check.
    Transform(TransformFn),
}

impl Action {
    /// Constraint check with its default failure message.
    pub fn check(constraint: Constraint) -> Action {
        Action::Check { constraint, message: None }
    }

    /// Constraint check with an overriding failure message.
    pub fn check_msg(constraint: Constraint, message: &str) -> Action {
        Action::Check { constraint, message: Some(message.to_string()) }
    }

    pub fn transform<F>(f: F) -> Action
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Action::Transform(Arc::new(f))
    }
}

/// Declarative constraint kinds. Scalar constraints apply element-wise to
/// list values; `Length` applies to the list itself.
#[derive(Clone)]
pub enum Constraint {
    Range { min: Option<i64>, max: Option<i64> },
    Length { min: Option<usize>, max: Option<usize> },
    OneOf(Vec<Value>),
    Matches(Regex),
    With(CheckFn),
}

impl Constraint {
    pub fn with<F>(f: F) -> Constraint
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Constraint::With(Arc::new(f))
    }

    pub(crate) fn holds(&self, v: &Value) -> bool {
        if let Value::List(items) = v {
            if !matches!(self, Constraint::Length { .. }) {
                return items.iter().all(|x| self.holds(x));
            }
        }
        match self {
            Constraint::Range { min, max } => {
                if let Value::Float(x) = v {
                    min.map_or(true, |m| *x >= m as f64) && max.map_or(true, |m| *x <= m as f64)
                } else if let Some(n) = v.as_i64() {
                    min.map_or(true, |m| n >= m) && max.map_or(true, |m| n <= m)
                } else {
                    false
                }
            }
            Constraint::Length { min, max } => {
                let len = match v {
                    Value::Str(s) => s.chars().count(),
                    Value::List(l) => l.len(),
                    _ => return false,
                };
                min.map_or(true, |m| len >= m) && max.map_or(true, |m| len <= m)
            }
            Constraint::OneOf(allowed) => allowed.iter().any(|a| a == v),
            Constraint::Matches(re) => v.as_str().map_or(false, |s| re.is_match(s)),
            Constraint::With(f) => f(v),
        }
    }

    pub(crate) fn default_message(&self) -> String {
        match self {
            Constraint::Range { min, max } => match (min, max) {
                (Some(a), Some(b)) => format!("value must be between {} and {}", a, b),
                (Some(a), None) => format!("value must be at least {}", a),
                (None, Some(b)) => format!("value must be at most {}", b),
                (None, None) => "value out of range".to_string(),
            },
            Constraint::Length { min, max } => match (min, max) {
                (Some(a), Some(b)) => format!("length must be between {} and {}", a, b),
                (Some(a), None) => format!("length must be at least {}", a),
                (None, Some(b)) => format!("length must be at most {}", b),
                (None, None) => "invalid length".to_string(),
            },
            Constraint::OneOf(_) => "not an allowed value".to_string(),
            Constraint::Matches(_) => "does not match the expected pattern".to_string(),
            Constraint::With(_) => "invalid value".to_string(),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Coerce(ty) => f.debug_tuple("Coerce").field(ty).finish(),
            Action::Check { constraint, message } => f
                .debug_struct("Check")
                .field("constraint", constraint)
                .field("message", message)
                .finish(),
            Action::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Range { min, max } => {
                f.debug_struct("Range").field("min", min).field("max", max).finish()
            }
            Constraint::Length { min, max } => {
                f.debug_struct("Length").field("min", min).field("max", max).finish()
            }
            Constraint::OneOf(allowed) => f.debug_tuple("OneOf").field(allowed).finish(),
            Constraint::Matches(re) => f.debug_tuple("Matches").field(&re.as_str()).finish(),
            Constraint::With(_) => f.write_str("With(..)"),
        }
    }
}

/// Run the implicit steps (trim, built-in coercion for simple fields) then
/// every declared action in order. Returns the final value, or the first
/// failure message.
pub(crate) fn run_pipeline(
    input: &Value,
    ty: Option<ValueType>,
    trim: bool,
    actions: &[Action],
) -> Result<Value, String> {
    let mut val = input.clone();
    if trim {
        val = trim_value(val);
    }
    if let Some(ty) = ty {
        val = coerce(&val, ty)?;
    }
    for action in actions {
        match action {
            Action::Coerce(ty) => val = coerce(&val, *ty)?,
            Action::Check { constraint, message } => {
                if !constraint.holds(&val) {
                    return Err(message
                        .clone()
                        .unwrap_or_else(|| constraint.default_message()));
                }
            }
            Action::Transform(f) => val = f(&val)?,
        }
    }
    Ok(val)
}

/// Coerce one value to a built-in type; lists coerce element-wise.
pub(crate) fn coerce(v: &Value, ty: ValueType) -> Result<Value, String> {
    if let Value::List(items) = v {
        let out = items.iter().map(|x| coerce(x, ty)).collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::List(out));
    }
    match ty {
        ValueType::Text => match v {
            Value::Str(s) => Ok(Value::Str(s.clone())),
            Value::Int(n) => Ok(Value::Str(n.to_string())),
            Value::Float(x) => Ok(Value::Str(x.to_string())),
            Value::Bool(b) => Ok(Value::Str(b.to_string())),
            _ => Err(format!("expected text, got {}", v.shape())),
        },
        ValueType::Integer => match v {
            Value::Int(n) => Ok(Value::Int(*n)),
            Value::Str(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("`{}` is not an integer", s.trim())),
            _ => Err(format!("expected integer, got {}", v.shape())),
        },
        ValueType::Float => match v {
            Value::Float(x) => Ok(Value::Float(*x)),
            Value::Int(n) => Ok(Value::Float(*n as f64)),
            Value::Str(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("`{}` is not a number", s.trim())),
            _ => Err(format!("expected number, got {}", v.shape())),
        },
        ValueType::Boolean => match v {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Int(0) => Ok(Value::Bool(false)),
            Value::Int(1) => Ok(Value::Bool(true)),
            Value::Str(s) => {
                let t = s.trim();
                if ["1", "true", "on", "yes"].iter().any(|x| t.eq_ignore_ascii_case(x)) {
                    Ok(Value::Bool(true))
                } else if t.is_empty()
                    || ["0", "false", "off", "no"].iter().any(|x| t.eq_ignore_ascii_case(x))
                {
                    Ok(Value::Bool(false))
                } else {
                    Err(format!("`{}` is not a boolean", t))
                }
            }
            _ => Err(format!("expected boolean, got {}", v.shape())),
        },
    }
}

fn trim_value(v: Value) -> Value {
    match v {
        Value::Str(s) => Value::Str(s.trim().to_string()),
        Value::List(items) => Value::List(items.into_iter().map(trim_value).collect()),
        other => other,
    }
}
