//! Schema compiler
//!
//! Turns a `SchemaDefinition` into an immutable `Schema`: an ordered table of
//! `PropertyDescriptor`s plus a name index. Every decision that depends on the
//! declared type (cast function, validators, nested schema, element pipeline,
//! alias target) is made here once, so the write path only dispatches on the
//! descriptor's `Shape`.
//!
//! Compilation fails for:
//! - duplicate property names
//! - aliases without a target, with an undeclared target, or forming a cycle
//! - arrays whose element type is an alias
//! - regex attributes that do not compile

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::config::ModelConfig;
use crate::registry::{cast_any, CastFn, PropertyType};

use super::errors::{SchemaError, SchemaResult};
use super::types::{
    DefaultSpec, PropertySpec, SchemaDefinition, StringTransformFn, TransformFn, TypeSpec,
};
use super::validator::Validator;

/// How a property stores and processes its value
#[derive(Clone)]
pub(crate) enum Shape {
    /// Scalar or passthrough value with its cast function
    Value(CastFn),
    /// Child instance of a nested schema
    Nested(Arc<Schema>),
    /// Array whose elements run through the element descriptor
    List(Box<PropertyDescriptor>),
    /// Redirect to another property; no own storage
    Alias(String),
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Value(_) => write!(f, "Value"),
            Shape::Nested(schema) => {
                let names: Vec<_> = schema.names().collect();
                f.debug_tuple("Nested").field(&names).finish()
            }
            Shape::List(element) => f.debug_tuple("List").field(element).finish(),
            Shape::Alias(target) => f.debug_tuple("Alias").field(target).finish(),
        }
    }
}

/// Compiled, immutable rule set for one property
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    ty: PropertyType,
    pub(crate) shape: Shape,
    pub(crate) transform: Option<TransformFn>,
    pub(crate) string_transform: Option<StringTransformFn>,
    validators: Vec<Validator>,
    default: Option<DefaultSpec>,
    read_only: bool,
    invisible: bool,
}

impl PropertyDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn property_type(&self) -> PropertyType {
        self.ty
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn default(&self) -> Option<&DefaultSpec> {
        self.default.as_ref()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_invisible(&self) -> bool {
        self.invisible
    }

    /// Target property name for aliases
    pub fn alias_target(&self) -> Option<&str> {
        match &self.shape {
            Shape::Alias(target) => Some(target),
            _ => None,
        }
    }

    /// Nested schema for object properties declared with one
    pub fn nested_schema(&self) -> Option<&Arc<Schema>> {
        match &self.shape {
            Shape::Nested(schema) => Some(schema),
            _ => None,
        }
    }

    /// Element descriptor for arrays
    pub fn element(&self) -> Option<&PropertyDescriptor> {
        match &self.shape {
            Shape::List(element) => Some(&**element),
            _ => None,
        }
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("shape", &self.shape)
            .field("validators", &self.validators)
            .field("default", &self.default)
            .field("read_only", &self.read_only)
            .field("invisible", &self.invisible)
            .finish()
    }
}

/// Compiled schema shared by all of its instances
#[derive(Debug)]
pub struct Schema {
    properties: Vec<PropertyDescriptor>,
    index: HashMap<String, usize>,
    /// Lowercased names, consulted when `keys_ignore_case` is set
    folded: HashMap<String, usize>,
    config: ModelConfig,
}

impl Schema {
    /// Compiles a definition with the default configuration.
    pub fn compile(definition: SchemaDefinition) -> SchemaResult<Arc<Schema>> {
        Self::compile_with(definition, ModelConfig::default())
    }

    /// Compiles a definition. Nested inline definitions share `config`.
    pub fn compile_with(
        definition: SchemaDefinition,
        config: ModelConfig,
    ) -> SchemaResult<Arc<Schema>> {
        let mut properties = Vec::with_capacity(definition.properties.len());
        let mut index = HashMap::with_capacity(definition.properties.len());

        for (name, spec) in definition.properties {
            if index.contains_key(&name) {
                return Err(SchemaError::DuplicateProperty { property: name });
            }
            let descriptor = compile_property(&name, spec.into_full(), &config)?;
            index.insert(name, properties.len());
            properties.push(descriptor);
        }

        check_aliases(&properties, &index)?;

        let mut folded = HashMap::with_capacity(properties.len());
        for (position, descriptor) in properties.iter().enumerate() {
            folded
                .entry(descriptor.name.to_lowercase())
                .or_insert(position);
        }

        debug!(properties = properties.len(), "compiled schema");

        Ok(Arc::new(Schema {
            properties,
            index,
            folded,
            config,
        }))
    }

    /// Looks up a declared property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        let position = match self.index.get(name) {
            Some(position) => Some(*position),
            None if self.config.keys_ignore_case => {
                self.folded.get(&name.to_lowercase()).copied()
            }
            None => None,
        };
        position.map(|p| &self.properties[p])
    }

    /// Follows alias redirects to the descriptor that owns storage.
    pub fn resolve(&self, name: &str) -> Option<&PropertyDescriptor> {
        let mut descriptor = self.property(name)?;
        // Cycles are rejected at compile time, so the chain is bounded.
        for _ in 0..=self.properties.len() {
            match &descriptor.shape {
                Shape::Alias(target) => descriptor = self.property(target)?,
                _ => return Some(descriptor),
            }
        }
        None
    }

    /// Descriptors in declaration order
    pub fn properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter()
    }

    /// Property names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

fn compile_property(
    name: &str,
    spec: PropertySpec,
    config: &ModelConfig,
) -> SchemaResult<PropertyDescriptor> {
    let ty = spec.ty.property_type();
    let validators = build_validators(name, ty, &spec)?;
    let invisible = spec.invisible.unwrap_or(ty == PropertyType::Alias);

    let shape = match spec.ty {
        TypeSpec::Alias => {
            let target = spec
                .alias
                .filter(|target| !target.is_empty())
                .ok_or_else(|| SchemaError::AliasTargetMissing {
                    property: name.to_string(),
                })?;
            Shape::Alias(target)
        }
        TypeSpec::Schema(schema) => Shape::Nested(schema),
        TypeSpec::Definition(definition) => {
            Shape::Nested(Schema::compile_with(definition, config.clone())?)
        }
        TypeSpec::Array => {
            let element = spec
                .array_of
                .map(|element| element.into_full())
                .unwrap_or_else(|| PropertySpec::new(TypeSpec::Any));
            if matches!(element.ty, TypeSpec::Alias) {
                return Err(SchemaError::ArrayOfAlias {
                    property: name.to_string(),
                });
            }
            let element_name = format!("{}[]", name);
            Shape::List(Box::new(compile_property(&element_name, element, config)?))
        }
        // Alias and Array are handled above; every remaining type has a caster.
        other => Shape::Value(other.property_type().caster().unwrap_or(cast_any)),
    };

    let transform = match &shape {
        Shape::Alias(_) => None,
        _ => spec.transform,
    };
    let string_transform = match ty {
        PropertyType::String => spec.string_transform,
        _ => None,
    };

    Ok(PropertyDescriptor {
        name: name.to_string(),
        ty,
        shape,
        transform,
        string_transform,
        validators,
        default: spec.default,
        read_only: spec.read_only,
        invisible,
    })
}

/// Assembles validators for the attributes that apply to `ty`.
///
/// Attributes that do not apply to the type are ignored.
fn build_validators(
    name: &str,
    ty: PropertyType,
    spec: &PropertySpec,
) -> SchemaResult<Vec<Validator>> {
    let mut validators = Vec::new();

    match ty {
        PropertyType::String => {
            if let Some(pattern) = &spec.regex {
                let re = Regex::new(pattern).map_err(|source| SchemaError::InvalidRegex {
                    property: name.to_string(),
                    source,
                })?;
                validators.push(Validator::Regex(re));
            }
            if let Some(allowed) = &spec.enum_values {
                validators.push(Validator::Enum(allowed.clone()));
            }
            if let Some(min) = spec.min_length {
                validators.push(Validator::MinLength(min));
            }
            if let Some(max) = spec.max_length {
                validators.push(Validator::MaxLength(max));
            }
        }
        PropertyType::Number => {
            if let Some(min) = spec.min {
                validators.push(Validator::Min(min));
            }
            if let Some(max) = spec.max {
                validators.push(Validator::Max(max));
            }
        }
        _ => {}
    }

    Ok(validators)
}

/// Every alias must target a declared property and must not loop.
fn check_aliases(
    properties: &[PropertyDescriptor],
    index: &HashMap<String, usize>,
) -> SchemaResult<()> {
    for descriptor in properties {
        let Shape::Alias(target) = &descriptor.shape else {
            continue;
        };

        if !index.contains_key(target) {
            return Err(SchemaError::AliasTargetUnknown {
                property: descriptor.name.clone(),
                target: target.clone(),
            });
        }

        let mut seen = HashSet::new();
        seen.insert(descriptor.name.as_str());
        let mut current = target.as_str();
        loop {
            if !seen.insert(current) {
                return Err(SchemaError::AliasCycle {
                    property: descriptor.name.clone(),
                });
            }
            match index.get(current).map(|p| &properties[*p].shape) {
                Some(Shape::Alias(next)) => current = next,
                _ => break,
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn address() -> SchemaDefinition {
        SchemaDefinition::new()
            .property("city", TypeSpec::String)
            .property("zip", TypeSpec::String)
    }

    #[test]
    fn test_shorthand_compiles_to_plain_descriptor() {
        let schema = Schema::compile(SchemaDefinition::new().property("name", TypeSpec::String))
            .unwrap();
        let name = schema.property("name").unwrap();
        assert_eq!(name.property_type(), PropertyType::String);
        assert!(!name.is_read_only());
        assert!(!name.is_invisible());
        assert!(name.default().is_none());
        assert!(name.validators().is_empty());
    }

    #[test]
    fn test_declaration_order_kept() {
        let schema = Schema::compile(
            SchemaDefinition::new()
                .property("z", TypeSpec::String)
                .property("a", TypeSpec::Number)
                .property("m", TypeSpec::Date),
        )
        .unwrap();
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_duplicate_property_rejected() {
        let result = Schema::compile(
            SchemaDefinition::new()
                .property("a", TypeSpec::String)
                .property("a", TypeSpec::Number),
        );
        assert_eq!(result.unwrap_err().code(), "SCHEMA_DUPLICATE_PROPERTY");
    }

    #[test]
    fn test_nested_definition_becomes_object() {
        let schema = Schema::compile(SchemaDefinition::new().property("address", address()))
            .unwrap();
        let prop = schema.property("address").unwrap();
        assert_eq!(prop.property_type(), PropertyType::Object);
        let nested = prop.nested_schema().unwrap();
        assert_eq!(nested.names().collect::<Vec<_>>(), vec!["city", "zip"]);
    }

    #[test]
    fn test_array_of_compiles_element() {
        let schema = Schema::compile(SchemaDefinition::new().property(
            "tags",
            PropertySpec::array_of(PropertySpec::string().min_length(2)),
        ))
        .unwrap();
        let element = schema.property("tags").unwrap().element().unwrap();
        assert_eq!(element.property_type(), PropertyType::String);
        assert_eq!(element.validators().len(), 1);
    }

    #[test]
    fn test_array_without_element_type_is_any() {
        let schema = Schema::compile(SchemaDefinition::new().property("items", TypeSpec::Array))
            .unwrap();
        let element = schema.property("items").unwrap().element().unwrap();
        assert_eq!(element.property_type(), PropertyType::Any);
    }

    #[test]
    fn test_array_of_alias_rejected() {
        let result = Schema::compile(
            SchemaDefinition::new()
                .property("zip", TypeSpec::String)
                .property("zips", PropertySpec::array_of(PropertySpec::alias("zip"))),
        );
        assert_eq!(result.unwrap_err().code(), "SCHEMA_ARRAY_OF_ALIAS");
    }

    #[test]
    fn test_alias_forward_reference_allowed() {
        let schema = Schema::compile(
            SchemaDefinition::new()
                .property("postalCode", PropertySpec::alias("zip"))
                .property("zip", TypeSpec::String),
        )
        .unwrap();
        let alias = schema.property("postalCode").unwrap();
        assert_eq!(alias.alias_target(), Some("zip"));
        assert!(alias.is_invisible());
        assert_eq!(schema.resolve("postalCode").unwrap().name(), "zip");
    }

    #[test]
    fn test_alias_without_target_rejected() {
        let result = Schema::compile(SchemaDefinition::new().property("p", TypeSpec::Alias));
        let err = result.unwrap_err();
        assert_eq!(err.code(), "SCHEMA_ALIAS_TARGET_MISSING");
        assert_eq!(err.property(), Some("p"));
    }

    #[test]
    fn test_alias_unknown_target_rejected() {
        let result =
            Schema::compile(SchemaDefinition::new().property("p", PropertySpec::alias("nope")));
        assert_eq!(result.unwrap_err().code(), "SCHEMA_ALIAS_TARGET_UNKNOWN");
    }

    #[test]
    fn test_alias_cycle_rejected() {
        let result = Schema::compile(
            SchemaDefinition::new()
                .property("a", PropertySpec::alias("b"))
                .property("b", PropertySpec::alias("a")),
        );
        assert_eq!(result.unwrap_err().code(), "SCHEMA_ALIAS_CYCLE");

        let result =
            Schema::compile(SchemaDefinition::new().property("a", PropertySpec::alias("a")));
        assert_eq!(result.unwrap_err().code(), "SCHEMA_ALIAS_CYCLE");
    }

    #[test]
    fn test_alias_chain_resolves() {
        let schema = Schema::compile(
            SchemaDefinition::new()
                .property("a", PropertySpec::alias("b"))
                .property("b", PropertySpec::alias("c"))
                .property("c", TypeSpec::Number),
        )
        .unwrap();
        assert_eq!(schema.resolve("a").unwrap().name(), "c");
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let result =
            Schema::compile(SchemaDefinition::new().property("code", PropertySpec::string().regex("(")));
        assert_eq!(result.unwrap_err().code(), "SCHEMA_INVALID_REGEX");
    }

    #[test]
    fn test_inapplicable_attributes_ignored() {
        let schema = Schema::compile(
            SchemaDefinition::new()
                .property("age", PropertySpec::number().min(0.0).min_length(3).regex("x"))
                .property("name", PropertySpec::string().max(10.0)),
        )
        .unwrap();
        assert_eq!(schema.property("age").unwrap().validators().len(), 1);
        assert!(schema.property("name").unwrap().validators().is_empty());
    }

    #[test]
    fn test_validators_in_declaration_order() {
        let schema = Schema::compile(SchemaDefinition::new().property(
            "code",
            PropertySpec::string()
                .regex("^[a-z]+$")
                .enum_values(["ab", "cd"])
                .min_length(2)
                .max_length(2),
        ))
        .unwrap();
        let rules: Vec<_> = schema
            .property("code")
            .unwrap()
            .validators()
            .iter()
            .map(Validator::rule)
            .collect();
        assert_eq!(
            rules,
            vec!["regex(^[a-z]+$)", "enum(ab|cd)", "minLength(2)", "maxLength(2)"]
        );
    }

    #[test]
    fn test_keys_ignore_case_lookup() {
        let definition = SchemaDefinition::new().property("firstName", TypeSpec::String);
        let strict = Schema::compile(definition.clone()).unwrap();
        assert!(strict.property("FIRSTNAME").is_none());

        let relaxed =
            Schema::compile_with(definition, ModelConfig::default().with_keys_ignore_case())
                .unwrap();
        assert_eq!(relaxed.property("FIRSTNAME").unwrap().name(), "firstName");
    }

    #[test]
    fn test_default_kept_on_descriptor() {
        let schema = Schema::compile(
            SchemaDefinition::new().property("n", PropertySpec::number().default_value(3)),
        )
        .unwrap();
        match schema.property("n").unwrap().default() {
            Some(DefaultSpec::Value(v)) => assert_eq!(v, &Value::Number(3.0)),
            other => panic!("unexpected default {:?}", other),
        }
    }
}
