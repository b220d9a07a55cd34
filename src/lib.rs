//! # formtree — Form Data Binding and Validation
//!
//! A declarative engine for HTML-form-style input: flat dotted/indexed
//! parameters expand into a nested document, bind onto a typed field tree,
//! run per-field coercion/constraint/transform pipelines, and read back out
//! as redisplay parameters or a typed value map.
//!
//! ## Field kinds
//!
//! - **Simple**: one scalar slot with a declared type (`text`, `integer`, `float`, `boolean`)
//! - **Compound**: a fixed set of named children (`address.street`)
//! - **Repeatable**: a per-entry template cloned to match the input list (`tags.0`, `tags.1`)
//!
//! ## Parameter paths
//!
//! - Dots descend into compounds: `author.name=Ada`
//! - Decimal segments index repeatables: `tags.0=rust`, `tags.2=forms`
//! - Conflicting shapes (`a=1` next to `a.b=2`) are binding errors
//!
//! ## Processing cycle
//!
//! [`Form::process`] runs one submission through seed, bind and validate,
//! and leaves the results on the tree: [`Form::values`] for the typed map,
//! [`Form::fif`] for flat redisplay parameters, [`Form::errors`] for what
//! went wrong. [`Form::process_with`] adds a backing object that seeds
//! initial values and receives the validated map on success.
//!
//! ## Usage
//!
//! See the README and `tests/integration.rs` for full examples.

pub mod actions;
pub mod engine;
pub mod field;
pub mod params;
pub mod schema;
pub mod value;

mod depends;
mod extract;

#[cfg(feature = "json")]
pub mod json;

pub use actions::{Action, Constraint};
pub use engine::{Form, FormError, Model, Stage, Submission};
pub use field::{FieldKind, FieldNode};
pub use params::{expand, flatten, merge, BindingError, FlatParams, MAX_LIST_INDEX};
pub use schema::{FieldFlags, FieldSpec, FormSpec, Issue, SchemaError, SpecKind};
pub use value::{Value, ValueType};
