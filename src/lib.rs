//! schemaobject - schema-driven runtime objects
//!
//! A schema declares named, typed properties. Instances of a schema accept
//! loosely typed writes, cast them to the declared type, run transforms and
//! validators, and silently keep their previous state when a write fails.
//! Reads fall back to literal or computed defaults, aliases redirect to other
//! properties, and `to_object` produces a plain snapshot.
//!
//! ```
//! use schemaobject::{Instance, PropertySpec, Schema, SchemaDefinition, TypeSpec, Value};
//!
//! let schema = Schema::compile(
//!     SchemaDefinition::new()
//!         .property("name", TypeSpec::String)
//!         .property("age", PropertySpec::number().min(0.0)),
//! )
//! .unwrap();
//!
//! let mut person = Instance::new(&schema);
//! person.set("age", "42");
//! person.set("age", -5);
//!
//! assert_eq!(person.get("age"), Value::Number(42.0));
//! assert_eq!(person.rejections().len(), 1);
//! ```

pub mod config;
pub mod instance;
pub mod registry;
pub mod schema;
pub mod value;

pub use config::ModelConfig;
pub use instance::{Instance, RejectReason, Rejection};
pub use registry::PropertyType;
pub use schema::{
    PropertySpec, Schema, SchemaDefinition, SchemaError, SchemaLoader, SchemaResult, TypeSpec,
};
pub use value::{Map, Value};
