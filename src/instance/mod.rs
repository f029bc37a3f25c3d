//! Live instances of a compiled schema
//!
//! An `Instance` owns the accepted raw value of each property and a shared
//! reference to its `Schema`. Every access dispatches through the schema's
//! descriptor table:
//! - reads resolve aliases, then the stored value, then the default
//! - writes run the pipeline in `pipeline.rs` and are silently rejected on failure
//!
//! Nested-schema properties store child instances owned by the parent.

mod pipeline;
mod rejection;
mod serialize;

pub use rejection::{RejectReason, Rejection};

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::schema::{DefaultSpec, PropertyDescriptor, Schema};
use crate::value::Value;

/// Stored state of one property
#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Value(Value),
    Child(Box<Instance>),
    List(Vec<Slot>),
}

impl Slot {
    /// Plain-data copy of the slot, invisible child properties included.
    pub(crate) fn to_value(&self) -> Value {
        match self {
            Slot::Value(value) => value.clone(),
            Slot::Child(child) => child.to_value(),
            Slot::List(items) => Value::Array(items.iter().map(Slot::to_value).collect()),
        }
    }

    /// Snapshot of the slot with invisible child properties left out.
    pub(crate) fn to_snapshot(&self) -> Value {
        match self {
            Slot::Value(value) => value.clone(),
            Slot::Child(child) => child.to_object(),
            Slot::List(items) => Value::Array(items.iter().map(Slot::to_snapshot).collect()),
        }
    }
}

/// A live object conforming to a schema
#[derive(Debug, Clone)]
pub struct Instance {
    schema: Arc<Schema>,
    slots: HashMap<String, Slot>,
    rejections: Vec<Rejection>,
}

impl Instance {
    /// Creates an instance with nothing stored.
    pub fn new(schema: &Arc<Schema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            slots: HashMap::new(),
            rejections: Vec::new(),
        }
    }

    /// Creates an instance and applies `seed` as writes.
    ///
    /// Never fails: seed values that do not pass the pipeline are skipped.
    pub fn with_seed(schema: &Arc<Schema>, seed: &Value) -> Self {
        let mut instance = Self::new(schema);
        instance.populate(seed);
        instance
    }

    /// Creates an instance seeded from parsed JSON.
    pub fn from_json(schema: &Arc<Schema>, seed: &serde_json::Value) -> Self {
        Self::with_seed(schema, &Value::from(seed))
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Applies a seed mapping, one write per declared property present.
    ///
    /// Writes happen in schema declaration order, not seed order. Seed keys
    /// that name no declared property are skipped.
    pub fn populate(&mut self, seed: &Value) {
        let Value::Object(entries) = seed else {
            trace!(seed = seed.type_name(), "ignored non-object seed");
            return;
        };

        let schema = Arc::clone(&self.schema);
        let ignore_case = schema.config().keys_ignore_case;

        for descriptor in schema.properties() {
            let value = entries.get(descriptor.name()).or_else(|| {
                if ignore_case {
                    entries
                        .iter()
                        .find(|(key, _)| key.to_lowercase() == descriptor.name().to_lowercase())
                        .map(|(_, value)| value)
                } else {
                    None
                }
            });

            if let Some(value) = value {
                self.write_property(&schema, descriptor, value.clone());
            }
        }
    }

    /// Reads a property.
    ///
    /// Returns the stored value, else the default, else `Value::Undefined`.
    /// Nested-schema values are returned as a complete copy of every stored
    /// field, invisible ones included, so writing the result back loses
    /// nothing. Use `child` or `child_mut` for the live instance.
    pub fn get(&self, name: &str) -> Value {
        match self.schema.property(name) {
            Some(descriptor) => self.read(descriptor),
            None => self.read_path(name),
        }
    }

    pub(crate) fn read(&self, descriptor: &PropertyDescriptor) -> Value {
        let Some(descriptor) = self.schema.resolve(descriptor.name()) else {
            return Value::Undefined;
        };

        if let Some(slot) = self.stored(descriptor) {
            return slot.to_value();
        }

        match descriptor.default() {
            Some(DefaultSpec::Value(value)) => value.clone(),
            Some(DefaultSpec::Compute(compute)) => compute(self),
            None => Value::Undefined,
        }
    }

    /// Stored slot of an alias-resolved property. Read-only properties never
    /// expose one.
    pub(crate) fn stored(&self, descriptor: &PropertyDescriptor) -> Option<&Slot> {
        if descriptor.is_read_only() {
            return None;
        }
        self.slots.get(descriptor.name())
    }

    /// Dotted reads into nested children, when enabled.
    fn read_path(&self, path: &str) -> Value {
        if !self.schema.config().dot_notation {
            trace!(property = path, "read of undeclared property");
            return Value::Undefined;
        }

        match path.split_once('.') {
            Some((head, rest)) => match self.child(head) {
                Some(child) => child.get(rest),
                None => Value::Undefined,
            },
            None => Value::Undefined,
        }
    }

    /// True if a raw value is stored (aliases answer for their target).
    pub fn has(&self, name: &str) -> bool {
        self.schema
            .resolve(name)
            .map(|descriptor| self.slots.contains_key(descriptor.name()))
            .unwrap_or(false)
    }

    /// Drops every stored value; properties fall back to their defaults.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Live nested-schema child, if one is stored.
    pub fn child(&self, name: &str) -> Option<&Instance> {
        let descriptor = self.schema.resolve(name)?;
        match self.slots.get(descriptor.name())? {
            Slot::Child(child) => Some(&**child),
            _ => None,
        }
    }

    /// Mutable nested-schema child. Writes through it use the child's pipeline.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Instance> {
        let descriptor = self.schema.resolve(name)?;
        match self.slots.get_mut(descriptor.name())? {
            Slot::Child(child) => Some(&mut **child),
            _ => None,
        }
    }

    /// Nested-schema children stored in an array property.
    pub fn children(&self, name: &str) -> impl Iterator<Item = &Instance> + '_ {
        let items: &[Slot] = match self.schema.resolve(name) {
            Some(descriptor) => match self.slots.get(descriptor.name()) {
                Some(Slot::List(items)) => items.as_slice(),
                _ => &[],
            },
            None => &[],
        };
        items.iter().filter_map(|slot| match slot {
            Slot::Child(child) => Some(&**child),
            _ => None,
        })
    }

    /// Mutable nested-schema children stored in an array property.
    pub fn children_mut(&mut self, name: &str) -> impl Iterator<Item = &mut Instance> + '_ {
        let items: &mut [Slot] = match self.schema.resolve(name) {
            Some(descriptor) => match self.slots.get_mut(descriptor.name()) {
                Some(Slot::List(items)) => items.as_mut_slice(),
                _ => &mut [],
            },
            None => &mut [],
        };
        items.iter_mut().filter_map(|slot| match slot {
            Slot::Child(child) => Some(&mut **child),
            _ => None,
        })
    }

    /// Writes refused since creation or the last `clear_rejections`.
    pub fn rejections(&self) -> &[Rejection] {
        &self.rejections
    }

    pub fn clear_rejections(&mut self) {
        self.rejections.clear();
    }
}
