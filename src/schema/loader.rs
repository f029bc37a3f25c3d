//! Schema loader for JSON definition documents
//!
//! Parses loosely-written definition documents into `SchemaDefinition`s and
//! keeps an in-memory registry of named, compiled schemas so documents can
//! refer to each other by name.
//!
//! Entry forms:
//! - `"string"`: bare built-in type, or the name of a registered schema
//! - `["string"]`: array of the single listed element type
//! - `{"type": ..., <attributes>}`: full attribute spec
//! - `{...}` without `type`: inline nested definition
//!
//! Recognised attributes: type, default, readOnly, invisible, regex, enum,
//! minLength, maxLength, min, max, arrayOf (or arrayType), alias.
//! Unknown attributes are ignored.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as Json;

use crate::config::ModelConfig;
use crate::registry::PropertyType;
use crate::value::Value;

use super::compiler::Schema;
use super::errors::{SchemaError, SchemaResult};
use super::types::{AttributeSpec, PropertySpec, SchemaDefinition, TypeSpec};

/// Loads definition documents and keeps named schemas.
#[derive(Debug, Default)]
pub struct SchemaLoader {
    /// Configuration bound to every schema this loader compiles
    config: ModelConfig,
    /// Registered schemas indexed by name
    schemas: HashMap<String, Arc<Schema>>,
}

impl SchemaLoader {
    /// Creates a loader with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader whose compiled schemas use `config`.
    pub fn with_config(config: ModelConfig) -> Self {
        Self {
            config,
            schemas: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Registers a compiled schema under `name`.
    ///
    /// Registered schemas are immutable; registering a name twice fails.
    pub fn register(&mut self, name: impl Into<String>, schema: Arc<Schema>) -> SchemaResult<()> {
        let name = name.into();
        if self.schemas.contains_key(&name) {
            return Err(SchemaError::SchemaImmutable { name });
        }
        self.schemas.insert(name, schema);
        Ok(())
    }

    /// Gets a registered schema by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(name)
    }

    /// Checks if a schema is registered.
    pub fn exists(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Returns the number of registered schemas.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Parses and compiles a definition document.
    pub fn load(&self, document: &Json) -> SchemaResult<Arc<Schema>> {
        let definition = self.parse_definition(document)?;
        Schema::compile_with(definition, self.config.clone())
    }

    /// Parses and compiles a definition from JSON text.
    pub fn load_str(&self, content: &str) -> SchemaResult<Arc<Schema>> {
        let document: Json =
            serde_json::from_str(content).map_err(|e| SchemaError::MalformedDefinition {
                reason: format!("invalid JSON: {}", e),
            })?;
        self.load(&document)
    }

    /// Loads a document and registers the result under `name`.
    pub fn load_named(
        &mut self,
        name: impl Into<String>,
        document: &Json,
    ) -> SchemaResult<Arc<Schema>> {
        let schema = self.load(document)?;
        self.register(name, Arc::clone(&schema))?;
        Ok(schema)
    }

    /// Parses a definition document without compiling it.
    pub fn parse_definition(&self, document: &Json) -> SchemaResult<SchemaDefinition> {
        let entries = document
            .as_object()
            .ok_or_else(|| SchemaError::MalformedDefinition {
                reason: format!("expected an object, got {}", json_type_name(document)),
            })?;

        let mut definition = SchemaDefinition::new();
        for (name, entry) in entries {
            definition.insert(name.clone(), self.parse_entry(name, entry)?);
        }
        Ok(definition)
    }

    fn parse_entry(&self, property: &str, entry: &Json) -> SchemaResult<AttributeSpec> {
        match entry {
            Json::String(type_name) => {
                Ok(AttributeSpec::Bare(self.named_type(property, type_name)?))
            }
            Json::Array(items) => self.parse_array_shorthand(property, items),
            Json::Object(attributes) => match attributes.get("type") {
                Some(ty) => self.parse_full(property, ty, attributes).map(AttributeSpec::Full),
                None => Ok(AttributeSpec::Bare(TypeSpec::Definition(
                    self.parse_definition(entry)?,
                ))),
            },
            other => Err(SchemaError::UnknownType {
                property: property.to_string(),
                type_name: other.to_string(),
            }),
        }
    }

    fn parse_array_shorthand(&self, property: &str, items: &[Json]) -> SchemaResult<AttributeSpec> {
        match items {
            [] => Ok(AttributeSpec::Bare(TypeSpec::Array)),
            [element] => {
                let element = self.parse_entry(&element_name(property), element)?;
                Ok(AttributeSpec::Full(PropertySpec::array_of(element)))
            }
            _ => Err(SchemaError::malformed_attribute(
                property,
                "type",
                "array shorthand takes exactly one element type",
            )),
        }
    }

    fn parse_full(
        &self,
        property: &str,
        ty: &Json,
        attributes: &serde_json::Map<String, Json>,
    ) -> SchemaResult<PropertySpec> {
        let mut spec = match ty {
            Json::String(type_name) => PropertySpec::new(self.named_type(property, type_name)?),
            Json::Object(_) => PropertySpec::new(TypeSpec::Definition(self.parse_definition(ty)?)),
            Json::Array(items) => self.parse_array_shorthand(property, items)?.into_full(),
            other => {
                return Err(SchemaError::UnknownType {
                    property: property.to_string(),
                    type_name: other.to_string(),
                })
            }
        };

        for (attribute, raw) in attributes {
            match attribute.as_str() {
                "default" => spec = spec.default_value(Value::from(raw)),
                "readOnly" => spec.read_only = expect_bool(property, attribute, raw)?,
                "invisible" => spec.invisible = Some(expect_bool(property, attribute, raw)?),
                "regex" => spec.regex = Some(expect_str(property, attribute, raw)?.to_string()),
                "alias" => spec.alias = Some(expect_str(property, attribute, raw)?.to_string()),
                "enum" => spec.enum_values = Some(expect_strings(property, attribute, raw)?),
                "minLength" => spec.min_length = Some(expect_len(property, attribute, raw)?),
                "maxLength" => spec.max_length = Some(expect_len(property, attribute, raw)?),
                "min" => spec.min = Some(expect_number(property, attribute, raw)?),
                "max" => spec.max = Some(expect_number(property, attribute, raw)?),
                "arrayOf" | "arrayType" => {
                    let element = self.parse_entry(&element_name(property), raw)?;
                    spec = spec.with_array_of(element);
                }
                _ => {}
            }
        }

        Ok(spec)
    }

    /// Resolves a type name: built-in first, then registered schemas.
    fn named_type(&self, property: &str, type_name: &str) -> SchemaResult<TypeSpec> {
        if let Some(ty) = PropertyType::from_name(type_name) {
            return Ok(TypeSpec::from(ty));
        }
        if let Some(schema) = self.schemas.get(type_name) {
            return Ok(TypeSpec::Schema(Arc::clone(schema)));
        }
        Err(SchemaError::UnknownType {
            property: property.to_string(),
            type_name: type_name.to_string(),
        })
    }
}

fn element_name(property: &str) -> String {
    format!("{}[]", property)
}

fn expect_bool(property: &str, attribute: &str, raw: &Json) -> SchemaResult<bool> {
    raw.as_bool().ok_or_else(|| {
        SchemaError::malformed_attribute(
            property,
            attribute,
            format!("expected boolean, got {}", json_type_name(raw)),
        )
    })
}

fn expect_str<'a>(property: &str, attribute: &str, raw: &'a Json) -> SchemaResult<&'a str> {
    raw.as_str().ok_or_else(|| {
        SchemaError::malformed_attribute(
            property,
            attribute,
            format!("expected string, got {}", json_type_name(raw)),
        )
    })
}

fn expect_number(property: &str, attribute: &str, raw: &Json) -> SchemaResult<f64> {
    raw.as_f64().ok_or_else(|| {
        SchemaError::malformed_attribute(
            property,
            attribute,
            format!("expected number, got {}", json_type_name(raw)),
        )
    })
}

fn expect_len(property: &str, attribute: &str, raw: &Json) -> SchemaResult<usize> {
    raw.as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            SchemaError::malformed_attribute(property, attribute, "expected non-negative integer")
        })
}

fn expect_strings(property: &str, attribute: &str, raw: &Json) -> SchemaResult<Vec<String>> {
    let items = raw.as_array().ok_or_else(|| {
        SchemaError::malformed_attribute(
            property,
            attribute,
            format!("expected array, got {}", json_type_name(raw)),
        )
    })?;
    items
        .iter()
        .map(|item| expect_str(property, attribute, item).map(str::to_string))
        .collect()
}

/// Returns the JSON type name for error messages.
fn json_type_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
