//! Plain-data snapshots of instances

use serde::{Serialize, Serializer};

use crate::value::{Map, Value};

use super::Instance;

impl Instance {
    /// Snapshot of every visible property.
    ///
    /// Unset properties appear as `Value::Undefined`. Nested children are
    /// snapshotted recursively and dates stay `Value::Date`. A visible alias
    /// appears under its own key with a copy of its target's value.
    pub fn to_object(&self) -> Value {
        let mut object = Map::new();
        for descriptor in self.schema.properties() {
            if descriptor.is_invisible() {
                continue;
            }
            let stored = self
                .schema
                .resolve(descriptor.name())
                .and_then(|resolved| self.stored(resolved));
            let value = match stored {
                Some(slot) => slot.to_snapshot(),
                None => self.read(descriptor),
            };
            object.insert(descriptor.name().to_string(), value);
        }
        Value::Object(object)
    }

    /// Copy of every declared property, invisible ones included.
    ///
    /// Aliases are left out since they hold no state of their own. Seeding a
    /// fresh instance from the result reproduces this one.
    pub(crate) fn to_value(&self) -> Value {
        let mut object = Map::new();
        for descriptor in self.schema.properties() {
            if descriptor.alias_target().is_some() {
                continue;
            }
            object.insert(descriptor.name().to_string(), self.read(descriptor));
        }
        Value::Object(object)
    }

    /// JSON rendering of `to_object`. Unset properties are omitted.
    pub fn to_json(&self) -> serde_json::Value {
        self.to_object().to_json()
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
