//! Typed STIX objects.
//!
//! A [`StixObject`] is immutable once built. Declared properties are held as
//! typed [`Value`]s in schema-declaration order; custom properties live in a
//! separate ordered side map of plain JSON. Neither can be changed in place:
//! versioning produces a new object.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value as JsonValue};

use crate::codec::SerializeOptions;
use crate::error::Result;
use crate::model::{ObjectType, SpecVersion, Timestamp, Value};

/// A validated STIX object.
#[derive(Debug, Clone, PartialEq)]
pub struct StixObject {
    kind: Arc<ObjectType>,
    fields: Vec<(String, Value)>,
    custom: Map<String, JsonValue>,
    has_custom: bool,
}

impl StixObject {
    /// Assembles an object from already validated parts. `fields` must be in
    /// declaration order.
    pub(crate) fn from_parts(
        kind: Arc<ObjectType>,
        fields: Vec<(String, Value)>,
        custom: Map<String, JsonValue>,
        has_custom: bool,
    ) -> Self {
        StixObject {
            kind,
            fields,
            custom,
            has_custom,
        }
    }

    pub fn type_name(&self) -> &str {
        self.kind.name()
    }

    pub fn spec_version(&self) -> SpecVersion {
        self.kind.version()
    }

    /// Schema this object was validated against.
    pub fn object_type(&self) -> &Arc<ObjectType> {
        &self.kind
    }

    /// The `id` property. Generic custom objects keep it in the custom map.
    pub fn id(&self) -> Option<&str> {
        match self.get("id") {
            Some(value) => value.as_str(),
            None => self.custom.get("id").and_then(JsonValue::as_str),
        }
    }

    /// A declared property.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// A custom property.
    pub fn custom_property(&self, name: &str) -> Option<&JsonValue> {
        self.custom.get(name)
    }

    pub fn custom_properties(&self) -> &Map<String, JsonValue> {
        &self.custom
    }

    /// Declared properties in declaration order.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some() || self.custom.contains_key(name)
    }

    /// Property names in serialization order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(|(n, _)| n.as_str())
            .chain(self.custom.keys().map(String::as_str))
    }

    /// True when the object was built with custom content.
    pub fn has_custom(&self) -> bool {
        self.has_custom
    }

    pub fn created(&self) -> Option<Timestamp> {
        self.get("created").and_then(Value::as_timestamp)
    }

    pub fn modified(&self) -> Option<Timestamp> {
        self.get("modified").and_then(Value::as_timestamp)
    }

    /// True when `revoked` is set, whether declared or carried as a custom
    /// property.
    pub fn is_revoked(&self) -> bool {
        match self.get("revoked") {
            Some(value) => value.as_bool().unwrap_or(false),
            None => self
                .custom
                .get("revoked")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
        }
    }

    /// All properties as an ordered JSON map.
    pub fn to_map(&self) -> Map<String, JsonValue> {
        let mut map: Map<String, JsonValue> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        for (name, value) in &self.custom {
            map.insert(name.clone(), value.clone());
        }
        map
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.to_map())
    }

    /// Renders the object as JSON text.
    pub fn serialize(&self, options: &SerializeOptions) -> Result<String> {
        crate::codec::serialize(self, options)
    }
}

impl Serialize for StixObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + self.custom.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        for (name, value) in &self.custom {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl std::fmt::Display for StixObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match crate::codec::serialize(self, &SerializeOptions::default()) {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(std::fmt::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectBuilder;

    #[test]
    fn test_accessors() {
        let obj = ObjectBuilder::new("campaign", SpecVersion::V21)
            .property("name", "Green Group Attacks Against Finance")
            .property("created", "2016-04-06T20:03:00.000Z")
            .custom_property("x_foo", "bar")
            .build()
            .unwrap();

        assert_eq!(obj.type_name(), "campaign");
        assert!(obj.id().unwrap().starts_with("campaign--"));
        assert_eq!(obj.created(), obj.modified());
        assert!(!obj.is_revoked());
        assert!(obj.has_custom());
        assert_eq!(obj.custom_property("x_foo"), Some(&JsonValue::from("bar")));
        assert!(obj.contains_key("x_foo"));
        assert!(!obj.contains_key("revoked"));
        assert_eq!(obj.keys().last(), Some("x_foo"));
    }

    #[test]
    fn test_serde_serialize_matches_to_json() {
        let obj = ObjectBuilder::new("identity", SpecVersion::V20)
            .property("name", "ACME")
            .property("identity_class", "organization")
            .build()
            .unwrap();
        assert_eq!(serde_json::to_value(&obj).unwrap(), obj.to_json());
    }
}
