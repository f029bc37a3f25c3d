//! Schema definitions and their compiled form
//!
//! A `SchemaDefinition` is the caller-facing description of an object shape.
//! `Schema::compile` validates it once and produces an immutable `Schema`
//! that any number of instances share. `SchemaLoader` builds definitions from
//! JSON documents and keeps named schemas that later documents can reference.
//!
//! # Rules
//!
//! - Property names are unique and keep declaration order
//! - Alias targets must exist and alias chains must not cycle
//! - Validators only apply to the types that support them
//! - A compiled schema never changes

mod compiler;
mod errors;
mod loader;
mod types;
mod validator;

pub(crate) use compiler::Shape;
pub use compiler::{PropertyDescriptor, Schema};
pub use errors::{SchemaError, SchemaResult};
pub use loader::SchemaLoader;
pub use types::{
    AttributeSpec, DefaultFn, DefaultSpec, PropertySpec, SchemaDefinition, StringTransformFn,
    TransformFn, TypeSpec,
};
pub use validator::Validator;
