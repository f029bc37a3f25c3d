//! Rejected write records
//!
//! Rejections are data, not errors: `set` never reports them. When the
//! schema's configuration enables it, each instance keeps a log of the writes
//! it refused so callers ingesting loose input can inspect what was dropped.

use std::fmt;

use crate::registry::PropertyType;
use crate::value::Value;

/// Why a write was refused
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// The value could not be cast to the declared type
    Typecast {
        /// Declared type of the property or element
        expected: PropertyType,
    },
    /// The cast value failed a validator
    Validation {
        /// Failed rule, e.g. "min(0)"
        rule: String,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Typecast { expected } => write!(f, "not castable to {}", expected),
            RejectReason::Validation { rule } => write!(f, "failed {}", rule),
        }
    }
}

/// One refused write
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Property path, e.g. "age" or "tags[2]"
    pub property: String,
    /// Value as it was written, before transform
    pub value: Value,
    pub reason: RejectReason,
}

impl Rejection {
    pub fn new(property: impl Into<String>, value: Value, reason: RejectReason) -> Self {
        Self {
            property: property.into(),
            value,
            reason,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "property '{}': {} ({} rejected)",
            self.property, self.reason, self.value
        )
    }
}
