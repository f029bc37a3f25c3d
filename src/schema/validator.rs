//! Type-specific validators
//!
//! Validators run after typecasting, in declaration order. They only see the
//! cast value, so a String validator always receives a `Value::String` and a
//! Number validator a `Value::Number`. A value of any other shape fails.
//!
//! - String: regex, enum, minLength, maxLength
//! - Number: min, max (inclusive)

use std::fmt;

use regex::Regex;

use crate::value::Value;

/// One compiled validation rule
#[derive(Debug, Clone)]
pub enum Validator {
    /// String must match the pattern
    Regex(Regex),
    /// String must equal one of the listed values
    Enum(Vec<String>),
    /// String must have at least this many characters
    MinLength(usize),
    /// String must have at most this many characters
    MaxLength(usize),
    /// Number must be >= bound
    Min(f64),
    /// Number must be <= bound
    Max(f64),
}

impl Validator {
    /// Returns true if the cast value satisfies this rule
    pub fn check(&self, value: &Value) -> bool {
        match (self, value) {
            (Validator::Regex(re), Value::String(s)) => re.is_match(s),
            (Validator::Enum(allowed), Value::String(s)) => allowed.iter().any(|a| a == s),
            (Validator::MinLength(min), Value::String(s)) => s.chars().count() >= *min,
            (Validator::MaxLength(max), Value::String(s)) => s.chars().count() <= *max,
            (Validator::Min(bound), Value::Number(n)) => n >= bound,
            (Validator::Max(bound), Value::Number(n)) => n <= bound,
            _ => false,
        }
    }

    /// Short rule name used in rejection records
    pub fn rule(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::Regex(re) => write!(f, "regex({})", re.as_str()),
            Validator::Enum(allowed) => write!(f, "enum({})", allowed.join("|")),
            Validator::MinLength(n) => write!(f, "minLength({})", n),
            Validator::MaxLength(n) => write!(f, "maxLength({})", n),
            Validator::Min(n) => write!(f, "min({})", n),
            Validator::Max(n) => write!(f, "max({})", n),
        }
    }
}
