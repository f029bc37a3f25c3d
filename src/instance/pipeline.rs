//! Property write pipeline
//!
//! For each write:
//! 1. read-only properties ignore the write
//! 2. aliases redirect to their target
//! 3. `Undefined`/`Null` clears the stored value
//! 4. transform, typecast, string transform, validators, in that order
//! 5. on success the value replaces whatever was stored
//!
//! A failure at step 4 leaves stored state untouched. Arrays are best-effort:
//! each element runs the element pipeline and failing elements are dropped.
//! Mappings written to a nested-schema property merge into the stored child,
//! or into a new one, and each field runs the child's own pipeline.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::registry::PropertyType;
use crate::schema::{PropertyDescriptor, Schema, Shape};
use crate::value::Value;

use super::rejection::{RejectReason, Rejection};
use super::{Instance, Slot};

impl Instance {
    /// Writes a property.
    ///
    /// Never reports failure: a value that fails typecasting or validation
    /// is dropped and the previous state is kept.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.write(name, value.into());
    }

    /// Appends one element to an array property through the element pipeline.
    ///
    /// Creates the array when nothing is stored yet. Rejected elements are
    /// dropped like any other rejected write.
    pub fn push(&mut self, name: &str, value: impl Into<Value>) {
        let schema = Arc::clone(&self.schema);
        let Some(declared) = schema.property(name) else {
            trace!(property = name, "push to undeclared property");
            return;
        };
        let Some(descriptor) = schema.resolve(name) else {
            return;
        };
        if declared.is_read_only() || descriptor.is_read_only() {
            trace!(property = name, "ignored push to read-only property");
            return;
        }
        let Some(element) = descriptor.element() else {
            trace!(property = name, "push to non-array property");
            return;
        };

        let value = value.into();
        let position = match self.slots.get(descriptor.name()) {
            Some(Slot::List(items)) => items.len(),
            _ => 0,
        };

        let mut dropped = Vec::new();
        match process(self, element, value.clone(), None, &mut dropped) {
            Ok(slot) => match self.slots.get_mut(descriptor.name()) {
                Some(Slot::List(items)) => items.push(slot),
                _ => {
                    self.slots
                        .insert(descriptor.name().to_string(), Slot::List(vec![slot]));
                }
            },
            Err(reason) => dropped.push(Rejection::new(
                format!("{}[{}]", descriptor.name(), position),
                value,
                reason,
            )),
        }
        self.record(dropped);
    }

    /// Writes by name; returns whether the write was accepted.
    pub(crate) fn write(&mut self, name: &str, value: Value) -> bool {
        let schema = Arc::clone(&self.schema);
        match schema.property(name) {
            Some(descriptor) => self.write_property(&schema, descriptor, value),
            None => self.write_path(&schema, name, value),
        }
    }

    pub(crate) fn write_property(
        &mut self,
        schema: &Schema,
        descriptor: &PropertyDescriptor,
        value: Value,
    ) -> bool {
        if descriptor.is_read_only() {
            trace!(property = descriptor.name(), "ignored write to read-only property");
            return false;
        }

        if let Some(target) = descriptor.alias_target() {
            return match schema.property(target) {
                Some(target) => self.write_property(schema, target, value),
                None => false,
            };
        }

        if value.is_absent() {
            self.slots.remove(descriptor.name());
            return true;
        }

        let existing = match self.slots.get(descriptor.name()) {
            Some(Slot::Child(child)) => Some(&**child),
            _ => None,
        };
        let mut dropped = Vec::new();
        let outcome = process(self, descriptor, value.clone(), existing, &mut dropped);
        self.record(dropped);

        match outcome {
            Ok(slot) => {
                self.slots.insert(descriptor.name().to_string(), slot);
                true
            }
            Err(reason) => {
                self.record(vec![Rejection::new(descriptor.name(), value, reason)]);
                false
            }
        }
    }

    /// Dotted writes into nested children, when enabled.
    ///
    /// A missing child is created only if the nested write is accepted.
    fn write_path(&mut self, schema: &Schema, path: &str, value: Value) -> bool {
        let split = if schema.config().dot_notation {
            path.split_once('.')
        } else {
            None
        };
        let Some((head, rest)) = split else {
            trace!(property = path, "ignored write to undeclared property");
            return false;
        };

        let (Some(declared), Some(descriptor)) = (schema.property(head), schema.resolve(head))
        else {
            trace!(property = path, "ignored write to undeclared property");
            return false;
        };
        if declared.is_read_only() || descriptor.is_read_only() {
            return false;
        }
        let Some(nested) = descriptor.nested_schema() else {
            trace!(property = path, "dotted write into non-object property");
            return false;
        };

        if let Some(Slot::Child(child)) = self.slots.get_mut(descriptor.name()) {
            return child.write(rest, value);
        }

        let mut child = Instance::new(nested);
        let accepted = child.write(rest, value);
        if accepted {
            self.slots
                .insert(descriptor.name().to_string(), Slot::Child(Box::new(child)));
        }
        accepted
    }

    fn record(&mut self, rejections: Vec<Rejection>) {
        for rejection in rejections {
            debug!(
                property = %rejection.property,
                reason = %rejection.reason,
                "write rejected"
            );
            if self.schema.config().record_rejections {
                self.rejections.push(rejection);
            }
        }
    }
}

/// Runs transform, typecast and validation for one value.
///
/// Array elements that fail are appended to `dropped` and left out of the
/// resulting list; only the outer value's failure is returned as `Err`.
/// `existing` is the stored child a nested mapping merges into.
fn process(
    owner: &Instance,
    descriptor: &PropertyDescriptor,
    raw: Value,
    existing: Option<&Instance>,
    dropped: &mut Vec<Rejection>,
) -> Result<Slot, RejectReason> {
    let value = match &descriptor.transform {
        Some(transform) => transform(raw, owner),
        None => raw,
    };

    match &descriptor.shape {
        Shape::Value(cast) => {
            let cast = cast(&value, owner.schema.config()).ok_or(RejectReason::Typecast {
                expected: descriptor.property_type(),
            })?;

            let cast = match (&descriptor.string_transform, cast) {
                (Some(transform), Value::String(s)) => Value::String(transform(s)),
                (_, other) => other,
            };

            if let Some(failed) = descriptor.validators().iter().find(|v| !v.check(&cast)) {
                return Err(RejectReason::Validation {
                    rule: failed.rule(),
                });
            }

            Ok(Slot::Value(cast))
        }
        Shape::Nested(schema) => match value {
            Value::Object(_) => {
                let mut child = match existing {
                    Some(child) => child.clone(),
                    None => Instance::new(schema),
                };
                child.populate(&value);
                Ok(Slot::Child(Box::new(child)))
            }
            _ => Err(RejectReason::Typecast {
                expected: PropertyType::Object,
            }),
        },
        Shape::List(element) => match value {
            Value::Array(items) => {
                let mut accepted = Vec::with_capacity(items.len());
                for (position, item) in items.into_iter().enumerate() {
                    match process(owner, element, item.clone(), None, dropped) {
                        Ok(slot) => accepted.push(slot),
                        Err(reason) => dropped.push(Rejection::new(
                            format!("{}[{}]", descriptor.name(), position),
                            item,
                            reason,
                        )),
                    }
                }
                Ok(Slot::List(accepted))
            }
            _ => Err(RejectReason::Typecast {
                expected: PropertyType::Array,
            }),
        },
        Shape::Alias(_) => Err(RejectReason::Typecast {
            expected: PropertyType::Alias,
        }),
    }
}
