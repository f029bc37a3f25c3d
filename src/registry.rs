//! Type registry
//!
//! Maps each property type to its typecast function. A cast never fails
//! loudly: it returns `None` when the raw value cannot be coerced, and the
//! write pipeline turns that into a silent rejection.
//!
//! Supported types:
//! - String: strings, numbers, booleans, dates, arrays (joined)
//! - Number: numbers, numeric strings, booleans (0/1)
//! - Boolean: booleans, numbers, "true"/"false", numeric strings
//! - Date: dates, date strings, epoch seconds or milliseconds
//! - Object: plain mappings (nested schemas are handled by the pipeline)
//! - Array, Alias: structural, never cast by value
//! - Any: passthrough

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::config::ModelConfig;
use crate::value::Value;

/// Signature shared by every cast function.
pub type CastFn = fn(&Value, &ModelConfig) -> Option<Value>;

/// Closed set of property types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    Date,
    Array,
    Object,
    Alias,
    Any,
}

impl PropertyType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Number => "number",
            PropertyType::Boolean => "boolean",
            PropertyType::Date => "date",
            PropertyType::Array => "array",
            PropertyType::Object => "object",
            PropertyType::Alias => "alias",
            PropertyType::Any => "any",
        }
    }

    /// Resolves a type name as written in a schema document.
    ///
    /// Matching is case-insensitive; `bool` is accepted for Boolean.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "string" => Some(PropertyType::String),
            "number" => Some(PropertyType::Number),
            "boolean" | "bool" => Some(PropertyType::Boolean),
            "date" => Some(PropertyType::Date),
            "array" => Some(PropertyType::Array),
            "object" => Some(PropertyType::Object),
            "alias" => Some(PropertyType::Alias),
            "any" => Some(PropertyType::Any),
            _ => None,
        }
    }

    /// Returns the cast function for value-typed properties.
    ///
    /// Array and Alias are structural and have no value cast.
    pub fn caster(&self) -> Option<CastFn> {
        match self {
            PropertyType::String => Some(cast_string),
            PropertyType::Number => Some(cast_number),
            PropertyType::Boolean => Some(cast_boolean),
            PropertyType::Date => Some(cast_date),
            PropertyType::Object => Some(cast_object),
            PropertyType::Any => Some(cast_any),
            PropertyType::Array | PropertyType::Alias => None,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Typecasts `raw` to `ty`. Structural types pass through unchanged.
pub fn typecast(ty: PropertyType, raw: &Value, config: &ModelConfig) -> Option<Value> {
    match ty.caster() {
        Some(cast) => cast(raw, config),
        None => Some(raw.clone()),
    }
}

fn cast_string(raw: &Value, config: &ModelConfig) -> Option<Value> {
    stringify(raw, config).map(Value::String)
}

fn stringify(raw: &Value, config: &ModelConfig) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_finite() => Some(format_number(*n)),
        Value::Bool(b) => Some(b.to_string()),
        Value::Date(d) => Some(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        Value::Array(items) => {
            let parts = items
                .iter()
                .map(|item| stringify(item, config))
                .collect::<Option<Vec<_>>>()?;
            Some(parts.join(&config.array_separator))
        }
        _ => None,
    }
}

/// Integral values print without a trailing ".0".
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn cast_number(raw: &Value, _config: &ModelConfig) -> Option<Value> {
    match raw {
        Value::Number(n) if n.is_finite() => Some(Value::Number(*n)),
        Value::Bool(b) => Some(Value::Number(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => parse_number(s).map(Value::Number),
        _ => None,
    }
}

/// Parses a finite number, ignoring surrounding whitespace.
fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn cast_boolean(raw: &Value, _config: &ModelConfig) -> Option<Value> {
    match raw {
        Value::Bool(b) => Some(Value::Bool(*b)),
        Value::Number(n) if !n.is_nan() => Some(Value::Bool(*n != 0.0)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.eq_ignore_ascii_case("true") {
                Some(Value::Bool(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Some(Value::Bool(false))
            } else {
                parse_number(trimmed).map(|n| Value::Bool(n != 0.0))
            }
        }
        _ => None,
    }
}

fn cast_date(raw: &Value, config: &ModelConfig) -> Option<Value> {
    match raw {
        Value::Date(d) => Some(Value::Date(*d)),
        Value::Number(n) => from_epoch(*n, config).map(Value::Date),
        Value::String(s) => parse_date(s.trim(), config).map(Value::Date),
        _ => None,
    }
}

/// Interprets a number as epoch seconds or milliseconds by magnitude.
fn from_epoch(n: f64, config: &ModelConfig) -> Option<DateTime<Utc>> {
    if !n.is_finite() {
        return None;
    }
    let millis = if n.abs() < config.epoch_seconds_limit {
        n * 1000.0
    } else {
        n
    };
    Utc.timestamp_millis_opt(millis.round() as i64).single()
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parses the accepted date grammar. Naive forms are read as UTC.
fn parse_date(s: &str, config: &ModelConfig) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<f64>().ok().and_then(|n| from_epoch(n, config));
    }

    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    None
}

fn cast_object(raw: &Value, _config: &ModelConfig) -> Option<Value> {
    match raw {
        Value::Object(_) => Some(raw.clone()),
        _ => None,
    }
}

pub(crate) fn cast_any(raw: &Value, _config: &ModelConfig) -> Option<Value> {
    Some(raw.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cast(ty: PropertyType, raw: impl Into<Value>) -> Option<Value> {
        typecast(ty, &raw.into(), &ModelConfig::default())
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Value {
        Value::Date(Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap())
    }

    #[test]
    fn test_string_accepts_scalars() {
        assert_eq!(cast(PropertyType::String, "abc"), Some(Value::from("abc")));
        assert_eq!(cast(PropertyType::String, 12345), Some(Value::from("12345")));
        assert_eq!(cast(PropertyType::String, 1.5), Some(Value::from("1.5")));
        assert_eq!(cast(PropertyType::String, true), Some(Value::from("true")));
    }

    #[test]
    fn test_string_joins_arrays() {
        let raw = Value::from(json!(["a", 1, false]));
        assert_eq!(cast(PropertyType::String, raw), Some(Value::from("a,1,false")));

        let config = ModelConfig {
            array_separator: " | ".into(),
            ..Default::default()
        };
        let raw = Value::from(json!(["x", "y"]));
        assert_eq!(
            typecast(PropertyType::String, &raw, &config),
            Some(Value::from("x | y"))
        );
    }

    #[test]
    fn test_string_rejects_objects() {
        assert_eq!(cast(PropertyType::String, Value::from(json!({"a": 1}))), None);
        assert_eq!(cast(PropertyType::String, Value::from(json!(["a", {"b": 1}]))), None);
    }

    #[test]
    fn test_number_casts() {
        assert_eq!(cast(PropertyType::Number, "42"), Some(Value::Number(42.0)));
        assert_eq!(cast(PropertyType::Number, " -3.25 "), Some(Value::Number(-3.25)));
        assert_eq!(cast(PropertyType::Number, true), Some(Value::Number(1.0)));
        assert_eq!(cast(PropertyType::Number, false), Some(Value::Number(0.0)));
        assert_eq!(cast(PropertyType::Number, 7), Some(Value::Number(7.0)));
    }

    #[test]
    fn test_number_rejects_non_numeric() {
        assert_eq!(cast(PropertyType::Number, "abc"), None);
        assert_eq!(cast(PropertyType::Number, ""), None);
        assert_eq!(cast(PropertyType::Number, "inf"), None);
        assert_eq!(cast(PropertyType::Number, Value::from(json!({}))), None);
        assert_eq!(cast(PropertyType::Number, Value::from(json!([1]))), None);
    }

    #[test]
    fn test_boolean_casts() {
        assert_eq!(cast(PropertyType::Boolean, "TRUE"), Some(Value::Bool(true)));
        assert_eq!(cast(PropertyType::Boolean, "False"), Some(Value::Bool(false)));
        assert_eq!(cast(PropertyType::Boolean, "1"), Some(Value::Bool(true)));
        assert_eq!(cast(PropertyType::Boolean, "0"), Some(Value::Bool(false)));
        assert_eq!(cast(PropertyType::Boolean, 5), Some(Value::Bool(true)));
        assert_eq!(cast(PropertyType::Boolean, 0), Some(Value::Bool(false)));
        assert_eq!(cast(PropertyType::Boolean, "maybe"), None);
        assert_eq!(cast(PropertyType::Boolean, Value::from(json!([]))), None);
    }

    #[test]
    fn test_date_parses_supported_strings() {
        assert_eq!(
            cast(PropertyType::Date, "2021-03-04T05:06:07Z"),
            Some(utc(2021, 3, 4, 5, 6, 7))
        );
        assert_eq!(
            cast(PropertyType::Date, "2021-03-04T07:06:07+02:00"),
            Some(utc(2021, 3, 4, 5, 6, 7))
        );
        assert_eq!(cast(PropertyType::Date, "2021-03-04"), Some(utc(2021, 3, 4, 0, 0, 0)));
        assert_eq!(
            cast(PropertyType::Date, "2021-03-04 05:06:07"),
            Some(utc(2021, 3, 4, 5, 6, 7))
        );
        assert_eq!(cast(PropertyType::Date, "03/04/2021"), Some(utc(2021, 3, 4, 0, 0, 0)));
        assert_eq!(
            cast(PropertyType::Date, "03/04/2021 05:06"),
            Some(utc(2021, 3, 4, 5, 6, 0))
        );
    }

    #[test]
    fn test_date_epoch_disambiguation() {
        // seconds
        assert_eq!(cast(PropertyType::Date, 1_600_000_000), Some(utc(2020, 9, 13, 12, 26, 40)));
        // milliseconds
        assert_eq!(
            cast(PropertyType::Date, 1_600_000_000_000_i64),
            Some(utc(2020, 9, 13, 12, 26, 40))
        );
        // digit-only strings are epochs too
        assert_eq!(cast(PropertyType::Date, "1600000000"), Some(utc(2020, 9, 13, 12, 26, 40)));
    }

    #[test]
    fn test_date_epoch_threshold() {
        // just below the limit: seconds
        assert_eq!(
            cast(PropertyType::Date, 9_999_999_999_i64),
            Some(utc(2286, 11, 20, 17, 46, 39))
        );
        // at the limit: milliseconds
        assert_eq!(
            cast(PropertyType::Date, 10_000_000_000_i64),
            Some(utc(1970, 4, 26, 17, 46, 40))
        );
        assert_eq!(cast(PropertyType::Date, -86_400), Some(utc(1969, 12, 31, 0, 0, 0)));
        assert_eq!(
            cast(PropertyType::Date, -1_600_000_000_000_i64),
            Some(utc(1919, 4, 20, 11, 33, 20))
        );
    }

    #[test]
    fn test_date_epoch_threshold_configurable() {
        let config = ModelConfig {
            epoch_seconds_limit: 1_000.0,
            ..Default::default()
        };
        assert_eq!(
            typecast(PropertyType::Date, &Value::from(999), &config),
            Some(utc(1970, 1, 1, 0, 16, 39))
        );
        assert_eq!(
            typecast(PropertyType::Date, &Value::from(1_000), &config),
            Some(Value::Date(Utc.timestamp_millis_opt(1_000).unwrap()))
        );
    }

    #[test]
    fn test_date_rejects_invalid() {
        assert_eq!(cast(PropertyType::Date, true), None);
        assert_eq!(cast(PropertyType::Date, "not a date"), None);
        assert_eq!(cast(PropertyType::Date, "13/45/2021"), None);
        assert_eq!(cast(PropertyType::Date, Value::from(json!([2021]))), None);
        assert_eq!(cast(PropertyType::Date, Value::from(json!({"y": 2021}))), None);
    }

    #[test]
    fn test_any_and_structural_pass_through() {
        let raw = Value::from(json!({"k": [1, 2]}));
        assert_eq!(cast(PropertyType::Any, raw.clone()), Some(raw.clone()));
        assert_eq!(cast(PropertyType::Alias, raw.clone()), Some(raw.clone()));
        assert_eq!(cast(PropertyType::Object, raw.clone()), Some(raw));
        assert_eq!(cast(PropertyType::Object, "str"), None);
    }

    #[test]
    fn test_type_names_round_trip() {
        for ty in [
            PropertyType::String,
            PropertyType::Number,
            PropertyType::Boolean,
            PropertyType::Date,
            PropertyType::Array,
            PropertyType::Object,
            PropertyType::Alias,
            PropertyType::Any,
        ] {
            assert_eq!(PropertyType::from_name(ty.type_name()), Some(ty));
        }
        assert_eq!(PropertyType::from_name("Bool"), Some(PropertyType::Boolean));
        assert_eq!(PropertyType::from_name("uuid"), None);
    }
}
