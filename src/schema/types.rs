//! Schema definition types
//!
//! These are the raw, uncompiled building blocks a caller uses to describe
//! an object shape. Each property is either a bare type (`AttributeSpec::Bare`)
//! or a full attribute set (`AttributeSpec::Full`). Compilation turns them into
//! immutable `PropertyDescriptor`s.
//!
//! ```
//! use schemaobject::{PropertySpec, SchemaDefinition, TypeSpec};
//!
//! let definition = SchemaDefinition::new()
//!     .property("name", TypeSpec::String)
//!     .property("age", PropertySpec::new(TypeSpec::Number).min(0.0))
//!     .property("zip", TypeSpec::String)
//!     .property("postalCode", PropertySpec::alias("zip"));
//!
//! let names: Vec<_> = definition.names().collect();
//! assert_eq!(names, ["name", "age", "zip", "postalCode"]);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::instance::Instance;
use crate::registry::PropertyType;
use crate::value::Value;

use super::compiler::Schema;

/// Runs before typecasting. Receives the raw value and the owning instance.
pub type TransformFn = Arc<dyn Fn(Value, &Instance) -> Value + Send + Sync>;

/// Runs on a string after typecasting and before validation.
pub type StringTransformFn = Arc<dyn Fn(String) -> String + Send + Sync>;

/// Computes a default from the owning instance on every read.
pub type DefaultFn = Arc<dyn Fn(&Instance) -> Value + Send + Sync>;

/// Declared type of a property
#[derive(Clone)]
pub enum TypeSpec {
    String,
    Number,
    Boolean,
    Date,
    /// Array; element type comes from `PropertySpec::array_of`
    Array,
    /// Plain mapping without a nested schema
    Object,
    /// Redirects to the property named by `PropertySpec::alias`
    Alias,
    Any,
    /// Nested, already compiled schema
    Schema(Arc<Schema>),
    /// Nested definition, compiled together with its parent
    Definition(SchemaDefinition),
}

impl TypeSpec {
    /// Returns the property type this spec compiles to
    pub fn property_type(&self) -> PropertyType {
        match self {
            TypeSpec::String => PropertyType::String,
            TypeSpec::Number => PropertyType::Number,
            TypeSpec::Boolean => PropertyType::Boolean,
            TypeSpec::Date => PropertyType::Date,
            TypeSpec::Array => PropertyType::Array,
            TypeSpec::Object | TypeSpec::Schema(_) | TypeSpec::Definition(_) => {
                PropertyType::Object
            }
            TypeSpec::Alias => PropertyType::Alias,
            TypeSpec::Any => PropertyType::Any,
        }
    }
}

impl From<PropertyType> for TypeSpec {
    fn from(ty: PropertyType) -> Self {
        match ty {
            PropertyType::String => TypeSpec::String,
            PropertyType::Number => TypeSpec::Number,
            PropertyType::Boolean => TypeSpec::Boolean,
            PropertyType::Date => TypeSpec::Date,
            PropertyType::Array => TypeSpec::Array,
            PropertyType::Object => TypeSpec::Object,
            PropertyType::Alias => TypeSpec::Alias,
            PropertyType::Any => TypeSpec::Any,
        }
    }
}

impl From<Arc<Schema>> for TypeSpec {
    fn from(schema: Arc<Schema>) -> Self {
        TypeSpec::Schema(schema)
    }
}

impl From<SchemaDefinition> for TypeSpec {
    fn from(definition: SchemaDefinition) -> Self {
        TypeSpec::Definition(definition)
    }
}

impl fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Schema(_) => write!(f, "Schema(..)"),
            TypeSpec::Definition(def) => f.debug_tuple("Definition").field(def).finish(),
            other => write!(f, "{}", other.property_type().type_name()),
        }
    }
}

/// Declared default for a property
#[derive(Clone)]
pub enum DefaultSpec {
    /// Literal returned as-is
    Value(Value),
    /// Recomputed from the instance on every read
    Compute(DefaultFn),
}

impl fmt::Debug for DefaultSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultSpec::Value(v) => f.debug_tuple("Value").field(v).finish(),
            DefaultSpec::Compute(_) => write!(f, "Compute(..)"),
        }
    }
}

/// Full attribute set for one property
#[derive(Clone)]
pub struct PropertySpec {
    pub ty: TypeSpec,
    pub transform: Option<TransformFn>,
    pub string_transform: Option<StringTransformFn>,
    pub default: Option<DefaultSpec>,
    pub read_only: bool,
    /// `None` means "use the type's default": aliases are invisible, the rest visible
    pub invisible: Option<bool>,
    pub regex: Option<String>,
    pub enum_values: Option<Vec<String>>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub array_of: Option<Box<AttributeSpec>>,
    pub alias: Option<String>,
}

impl PropertySpec {
    /// Creates a spec with every attribute at its default
    pub fn new(ty: impl Into<TypeSpec>) -> Self {
        Self {
            ty: ty.into(),
            transform: None,
            string_transform: None,
            default: None,
            read_only: false,
            invisible: None,
            regex: None,
            enum_values: None,
            min_length: None,
            max_length: None,
            min: None,
            max: None,
            array_of: None,
            alias: None,
        }
    }

    pub fn string() -> Self {
        Self::new(TypeSpec::String)
    }

    pub fn number() -> Self {
        Self::new(TypeSpec::Number)
    }

    pub fn boolean() -> Self {
        Self::new(TypeSpec::Boolean)
    }

    pub fn date() -> Self {
        Self::new(TypeSpec::Date)
    }

    /// Array whose elements go through `element`'s pipeline
    pub fn array_of(element: impl Into<AttributeSpec>) -> Self {
        Self::new(TypeSpec::Array).with_array_of(element)
    }

    /// Alias redirecting to `target`
    pub fn alias(target: impl Into<String>) -> Self {
        let mut spec = Self::new(TypeSpec::Alias);
        spec.alias = Some(target.into());
        spec
    }

    pub fn with_array_of(mut self, element: impl Into<AttributeSpec>) -> Self {
        self.array_of = Some(Box::new(element.into()));
        self
    }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(Value, &Instance) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(f));
        self
    }

    pub fn string_transform<F>(mut self, f: F) -> Self
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        self.string_transform = Some(Arc::new(f));
        self
    }

    /// Literal default
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultSpec::Value(value.into()));
        self
    }

    /// Computed default, evaluated on every read
    pub fn default_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Instance) -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultSpec::Compute(Arc::new(f)));
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn invisible(mut self, invisible: bool) -> Self {
        self.invisible = Some(invisible);
        self
    }

    pub fn regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn min(mut self, bound: f64) -> Self {
        self.min = Some(bound);
        self
    }

    pub fn max(mut self, bound: f64) -> Self {
        self.max = Some(bound);
        self
    }
}

impl fmt::Debug for PropertySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySpec")
            .field("ty", &self.ty)
            .field("transform", &self.transform.is_some())
            .field("string_transform", &self.string_transform.is_some())
            .field("default", &self.default)
            .field("read_only", &self.read_only)
            .field("invisible", &self.invisible)
            .field("regex", &self.regex)
            .field("enum_values", &self.enum_values)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("array_of", &self.array_of)
            .field("alias", &self.alias)
            .finish()
    }
}

/// A property as written in a definition: shorthand or full
#[derive(Debug, Clone)]
pub enum AttributeSpec {
    /// Bare type, every other attribute at its default
    Bare(TypeSpec),
    /// Full attribute set
    Full(PropertySpec),
}

impl AttributeSpec {
    /// Expands shorthand into a full attribute set
    pub fn into_full(self) -> PropertySpec {
        match self {
            AttributeSpec::Bare(ty) => PropertySpec::new(ty),
            AttributeSpec::Full(spec) => spec,
        }
    }
}

impl From<TypeSpec> for AttributeSpec {
    fn from(ty: TypeSpec) -> Self {
        AttributeSpec::Bare(ty)
    }
}

impl From<PropertyType> for AttributeSpec {
    fn from(ty: PropertyType) -> Self {
        AttributeSpec::Bare(ty.into())
    }
}

impl From<PropertySpec> for AttributeSpec {
    fn from(spec: PropertySpec) -> Self {
        AttributeSpec::Full(spec)
    }
}

impl From<Arc<Schema>> for AttributeSpec {
    fn from(schema: Arc<Schema>) -> Self {
        AttributeSpec::Bare(TypeSpec::Schema(schema))
    }
}

impl From<SchemaDefinition> for AttributeSpec {
    fn from(definition: SchemaDefinition) -> Self {
        AttributeSpec::Bare(TypeSpec::Definition(definition))
    }
}

/// Ordered, uncompiled mapping from property name to attribute spec
#[derive(Debug, Clone, Default)]
pub struct SchemaDefinition {
    pub(crate) properties: Vec<(String, AttributeSpec)>,
}

impl SchemaDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a property. Declaration order is preserved.
    pub fn property(mut self, name: impl Into<String>, spec: impl Into<AttributeSpec>) -> Self {
        self.properties.push((name.into(), spec.into()));
        self
    }

    /// Appends a property in place
    pub fn insert(&mut self, name: impl Into<String>, spec: impl Into<AttributeSpec>) {
        self.properties.push((name.into(), spec.into()));
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Property names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(name, _)| name.as_str())
    }
}
