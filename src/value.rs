//! Runtime values carried through binding, validation, and extraction.

use indexmap::IndexMap;

/// A single bound or extracted value (scalar, list, or keyed map).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    /// Hole left by a sparse list index during parameter expansion.
    Empty,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Short shape name for error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Empty => "empty",
        }
    }

    /// Blank means "carries no user data": empty/whitespace strings, `Empty`,
    /// lists whose elements are all blank, maps whose values are all blank.
    /// Numbers and booleans are never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Str(s) => s.trim().is_empty(),
            Value::Int(_) | Value::Float(_) | Value::Bool(_) => false,
            Value::List(v) => v.iter().all(Value::is_blank),
            Value::Map(m) => m.values().all(Value::is_blank),
            Value::Empty => true,
        }
    }

    /// True for the values a boolean-typed field treats as "unset": false,
    /// zero, and their common string spellings. The dependency pass uses this
    /// so an explicit `false` does not promote its group.
    pub fn is_false_like(&self) -> bool {
        match self {
            Value::Bool(b) => !*b,
            Value::Int(n) => *n == 0,
            Value::Float(x) => *x == 0.0,
            Value::Str(s) => {
                let t = s.trim();
                t.is_empty()
                    || t.eq_ignore_ascii_case("0")
                    || t.eq_ignore_ascii_case("false")
                    || t.eq_ignore_ascii_case("off")
                    || t.eq_ignore_ascii_case("no")
            }
            Value::List(v) => v.iter().all(Value::is_false_like),
            Value::Map(_) => false,
            Value::Empty => true,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

/// Built-in coercion targets for simple fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Integer,
    Float,
    Boolean,
}
