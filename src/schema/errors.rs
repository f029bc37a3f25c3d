//! Schema compilation errors
//!
//! Error codes:
//! - SCHEMA_DUPLICATE_PROPERTY
//! - SCHEMA_ALIAS_TARGET_MISSING
//! - SCHEMA_ALIAS_TARGET_UNKNOWN
//! - SCHEMA_ALIAS_CYCLE
//! - SCHEMA_ARRAY_OF_ALIAS
//! - SCHEMA_UNKNOWN_TYPE
//! - SCHEMA_MALFORMED_ATTRIBUTE
//! - SCHEMA_INVALID_REGEX
//! - SCHEMA_MALFORMED_DEFINITION
//! - SCHEMA_IMMUTABLE
//! - SCHEMA_CONFIG_MALFORMED
//!
//! Compilation is the only place failures are surfaced. Writes to instances
//! never produce these errors.

use thiserror::Error;

/// Errors raised while compiling or loading a schema definition
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A property name was declared twice
    #[error("property '{property}' is declared more than once")]
    DuplicateProperty { property: String },

    /// Alias has no target property name
    #[error("alias '{property}' does not name a target property")]
    AliasTargetMissing { property: String },

    /// Alias names a property the schema does not declare
    #[error("alias '{property}' targets undeclared property '{target}'")]
    AliasTargetUnknown { property: String, target: String },

    /// Alias chain loops back on itself
    #[error("alias '{property}' is part of an alias cycle")]
    AliasCycle { property: String },

    /// Arrays cannot hold aliases
    #[error("array '{property}' cannot use alias as its element type")]
    ArrayOfAlias { property: String },

    /// Type name is neither built-in nor a registered schema
    #[error("property '{property}' has unrecognized type '{type_name}'")]
    UnknownType { property: String, type_name: String },

    /// A recognised attribute carries a value of the wrong shape
    #[error("property '{property}' has malformed attribute '{attribute}': {reason}")]
    MalformedAttribute {
        property: String,
        attribute: String,
        reason: String,
    },

    /// Regex attribute does not compile
    #[error("property '{property}' has invalid regex")]
    InvalidRegex {
        property: String,
        #[source]
        source: regex::Error,
    },

    /// The definition document itself is unusable
    #[error("malformed schema definition: {reason}")]
    MalformedDefinition { reason: String },

    /// Attempt to replace a registered schema
    #[error("schema '{name}' is already registered and immutable")]
    SchemaImmutable { name: String },

    /// Configuration document could not be parsed
    #[error("malformed configuration: {reason}")]
    MalformedConfig { reason: String },
}

impl SchemaError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::DuplicateProperty { .. } => "SCHEMA_DUPLICATE_PROPERTY",
            SchemaError::AliasTargetMissing { .. } => "SCHEMA_ALIAS_TARGET_MISSING",
            SchemaError::AliasTargetUnknown { .. } => "SCHEMA_ALIAS_TARGET_UNKNOWN",
            SchemaError::AliasCycle { .. } => "SCHEMA_ALIAS_CYCLE",
            SchemaError::ArrayOfAlias { .. } => "SCHEMA_ARRAY_OF_ALIAS",
            SchemaError::UnknownType { .. } => "SCHEMA_UNKNOWN_TYPE",
            SchemaError::MalformedAttribute { .. } => "SCHEMA_MALFORMED_ATTRIBUTE",
            SchemaError::InvalidRegex { .. } => "SCHEMA_INVALID_REGEX",
            SchemaError::MalformedDefinition { .. } => "SCHEMA_MALFORMED_DEFINITION",
            SchemaError::SchemaImmutable { .. } => "SCHEMA_IMMUTABLE",
            SchemaError::MalformedConfig { .. } => "SCHEMA_CONFIG_MALFORMED",
        }
    }

    /// Returns the offending property, if the error is tied to one
    pub fn property(&self) -> Option<&str> {
        match self {
            SchemaError::DuplicateProperty { property }
            | SchemaError::AliasTargetMissing { property }
            | SchemaError::AliasTargetUnknown { property, .. }
            | SchemaError::AliasCycle { property }
            | SchemaError::ArrayOfAlias { property }
            | SchemaError::UnknownType { property, .. }
            | SchemaError::MalformedAttribute { property, .. }
            | SchemaError::InvalidRegex { property, .. } => Some(property),
            SchemaError::MalformedDefinition { .. }
            | SchemaError::SchemaImmutable { .. }
            | SchemaError::MalformedConfig { .. } => None,
        }
    }

    pub(crate) fn malformed_attribute(
        property: &str,
        attribute: &str,
        reason: impl Into<String>,
    ) -> Self {
        SchemaError::MalformedAttribute {
            property: property.to_string(),
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
