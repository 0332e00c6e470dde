//! Registration of custom object types.
//!
//! ```rust
//! use stix2::model::{CustomObject, Property};
//! use stix2::{ObjectBuilder, SpecVersion};
//!
//! CustomObject::new("x-animal", SpecVersion::V21)
//!     .property("species", Property::string().required())
//!     .property("animal_class", Property::string())
//!     .register()
//!     .unwrap();
//!
//! let animal = ObjectBuilder::new("x-animal", SpecVersion::V21)
//!     .property("species", "lion")
//!     .build()
//!     .unwrap();
//! assert!(animal.object_type().is_custom());
//! ```

use std::sync::Arc;

use crate::error::{Result, StixError};
use crate::model::id::validate_type_name;
use crate::model::schema::{class_name_for, sco_common, sdo_common};
use crate::model::{Constraint, Family, ObjectType, Property, SpecVersion, registry};
use crate::validate::validate_custom_property_name;

/// Describes a custom object type before registration.
#[derive(Debug, Clone)]
pub struct CustomObject {
    type_name: String,
    version: SpecVersion,
    family: Family,
    properties: Vec<(String, Property)>,
}

impl CustomObject {
    /// A custom domain object. The common SDO properties are added on
    /// registration.
    pub fn new(type_name: impl Into<String>, version: SpecVersion) -> Self {
        CustomObject {
            type_name: type_name.into(),
            version,
            family: Family::Sdo,
            properties: Vec::new(),
        }
    }

    /// A custom cyber-observable. The common SCO properties are added on
    /// registration.
    pub fn observable(type_name: impl Into<String>, version: SpecVersion) -> Self {
        CustomObject {
            family: Family::Sco,
            ..CustomObject::new(type_name, version)
        }
    }

    /// Declares a property. Declaring the same name twice keeps the last.
    pub fn property(mut self, name: impl Into<String>, property: Property) -> Self {
        let name = name.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = property,
            None => self.properties.push((name, property)),
        }
        self
    }

    /// Builds the schema without registering it.
    pub fn to_object_type(&self) -> Result<ObjectType> {
        if let Some(reason) = validate_type_name(&self.type_name, self.version) {
            return Err(StixError::Registration(format!(
                "Invalid type name '{}': {}",
                self.type_name, reason
            )));
        }
        for (name, _) in &self.properties {
            if let Some(reason) = validate_custom_property_name(name, self.version) {
                return Err(StixError::Registration(format!(
                    "Invalid property name '{}': {}",
                    name, reason
                )));
            }
        }

        let (head, tail) = match self.family {
            Family::Sco => sco_common(self.version),
            _ => sdo_common(self.version),
        };
        let properties = merge(head, self.properties.clone(), tail);
        let mut kind = ObjectType::new(
            self.type_name.as_str(),
            class_name_for(&self.type_name),
            self.version,
            self.family,
            properties,
        )
        .mark_custom();
        if self.family == Family::Sdo {
            kind = kind.with_constraints(vec![Constraint::TimestampOrder {
                earlier: "created",
                later: "modified",
                strict: false,
            }]);
        }
        Ok(kind)
    }

    /// Validates and registers the type, making it available to
    /// construction and parsing.
    pub fn register(self) -> Result<Arc<ObjectType>> {
        registry::register(self.to_object_type()?)
    }
}

/// Base properties keep their position; caller properties with the same
/// name replace them there. Other caller properties follow the head, and
/// `x_` properties go last, sorted.
fn merge(
    head: Vec<(String, Property)>,
    mut user: Vec<(String, Property)>,
    tail: Vec<(String, Property)>,
) -> Vec<(String, Property)> {
    let mut merged: Vec<(String, Property)> = head
        .into_iter()
        .map(|(name, prop)| {
            let prop = take(&mut user, &name).unwrap_or(prop);
            (name, prop)
        })
        .collect();
    let tail: Vec<(String, Property)> = tail
        .into_iter()
        .map(|(name, prop)| {
            let prop = take(&mut user, &name).unwrap_or(prop);
            (name, prop)
        })
        .collect();

    let (mut prefixed, normal): (Vec<_>, Vec<_>) =
        user.into_iter().partition(|(name, _)| name.starts_with("x_"));
    prefixed.sort_by(|a, b| a.0.cmp(&b.0));

    merged.extend(normal);
    merged.extend(tail);
    merged.extend(prefixed);
    merged
}

fn take(properties: &mut Vec<(String, Property)>, name: &str) -> Option<Property> {
    let index = properties.iter().position(|(n, _)| n == name)?;
    Some(properties.remove(index).1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectBuilder;

    fn names(kind: &ObjectType) -> Vec<&str> {
        kind.properties().iter().map(|(n, _)| n.as_str()).collect()
    }

    #[test]
    fn test_sdo_property_order() {
        let kind = CustomObject::new("x-order-test", SpecVersion::V21)
            .property("x_zeta", Property::string())
            .property("property1", Property::string().required())
            .property("x_alpha", Property::string())
            .property("labels", Property::string())
            .to_object_type()
            .unwrap();
        let names = names(&kind);
        assert_eq!(&names[..7], &[
            "type",
            "spec_version",
            "id",
            "created_by_ref",
            "created",
            "modified",
            "property1"
        ]);
        assert_eq!(&names[names.len() - 2..], &["x_alpha", "x_zeta"]);
        // Caller override keeps the base position and the caller's kind.
        assert_eq!(kind.property("labels").unwrap(), &Property::string());
        assert!(kind.is_custom());
        assert!(kind.is_versionable());
    }

    #[test]
    fn test_invalid_type_name() {
        for bad in ["x", "x_new_type", "7x-type"] {
            let err = CustomObject::new(bad, SpecVersion::V21).register().unwrap_err();
            assert!(matches!(err, StixError::Registration(_)), "{bad}");
        }
    }

    #[test]
    fn test_invalid_property_name() {
        let err = CustomObject::new("x-bad-prop", SpecVersion::V21)
            .property("7prop", Property::string())
            .register()
            .unwrap_err();
        assert!(matches!(err, StixError::Registration(_)));
    }

    #[test]
    fn test_register_and_build() {
        CustomObject::new("x-new-type", SpecVersion::V20)
            .property("property1", Property::string().required())
            .register()
            .unwrap();
        let obj = ObjectBuilder::new("x-new-type", SpecVersion::V20)
            .property("property1", "something")
            .build()
            .unwrap();
        assert_eq!(obj.object_type().class_name(), "XNewType");
        assert!(obj.id().unwrap().starts_with("x-new-type--"));

        let err = ObjectBuilder::new("x-new-type", SpecVersion::V20).build().unwrap_err();
        match err {
            StixError::MissingProperties { class, properties } => {
                assert_eq!(class, "XNewType");
                assert_eq!(properties, vec!["property1"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let dup = CustomObject::new("x-new-type", SpecVersion::V20).register();
        assert!(matches!(dup, Err(StixError::Registration(_))));
    }

    #[test]
    fn test_custom_observable() {
        CustomObject::observable("x-new-observable", SpecVersion::V21)
            .property("property1", Property::string().required().id_contributing())
            .register()
            .unwrap();
        let make = || {
            ObjectBuilder::new("x-new-observable", SpecVersion::V21)
                .property("property1", "value")
                .build()
                .unwrap()
        };
        assert_eq!(make().id(), make().id());
        assert_eq!(make().object_type().family(), Family::Sco);
    }
}
