//! Object type schemas.
//!
//! Each STIX object type is described once by an [`ObjectType`]: an ordered
//! field table of [`Property`] descriptors plus cross-property constraints.
//! The built-in tables for both spec versions live in the submodules and are
//! loaded into the [`registry`](crate::model::registry) at startup.

mod common;
mod observables;
mod v20;
mod v21;

use crate::model::{Property, SpecVersion};

/// Broad object family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Domain object.
    Sdo,
    /// Relationship object.
    Sro,
    /// Cyber-observable object.
    Sco,
    Marking,
    /// Bundle and language content.
    Meta,
    /// Only valid nested inside another object.
    Embedded,
}

/// A rule spanning several properties of one object.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// `later` must not precede `earlier`; with `strict`, it must follow it.
    TimestampOrder {
        earlier: &'static str,
        later: &'static str,
        strict: bool,
    },
    /// At least one of the named properties must be present.
    AtLeastOne(&'static [&'static str]),
    /// `pattern` must parse when `pattern_type` is absent or `stix`.
    StixPattern,
}

/// Schema of one object type under one spec version.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    name: String,
    class_name: String,
    version: SpecVersion,
    family: Family,
    properties: Vec<(String, Property)>,
    constraints: Vec<Constraint>,
    custom: bool,
    generic: bool,
}

impl ObjectType {
    pub fn new(
        name: impl Into<String>,
        class_name: impl Into<String>,
        version: SpecVersion,
        family: Family,
        properties: Vec<(String, Property)>,
    ) -> Self {
        ObjectType {
            name: name.into(),
            class_name: class_name.into(),
            version,
            family,
            properties,
            constraints: Vec::new(),
            custom: false,
            generic: false,
        }
    }

    /// Schema used for unregistered types parsed under the custom allowance:
    /// only `type` is declared, everything else is custom content.
    pub fn generic_custom(name: &str, version: SpecVersion) -> Self {
        let mut generic = ObjectType::new(
            name,
            class_name_for(name),
            version,
            Family::Sdo,
            common::props(vec![("type", common::type_property())]),
        );
        generic.custom = true;
        generic.generic = true;
        generic
    }

    pub(crate) fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    pub(crate) fn mark_custom(mut self) -> Self {
        self.custom = true;
        self
    }

    /// Makes an already declared property required.
    pub(crate) fn require(mut self, name: &str) -> Self {
        if let Some((_, prop)) = self.properties.iter_mut().find(|(n, _)| n == name) {
            prop.required = true;
        }
        self
    }

    pub(crate) fn mark_id_contributing(mut self, name: &str) -> Self {
        if let Some((_, prop)) = self.properties.iter_mut().find(|(n, _)| n == name) {
            prop.id_contributing = true;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name used in error messages (`Campaign`, `ExternalReference`).
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn version(&self) -> SpecVersion {
        self.version
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// Declared properties in declaration order.
    pub fn properties(&self) -> &[(String, Property)] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// True for types registered through the custom-object facility.
    pub fn is_custom(&self) -> bool {
        self.custom
    }

    /// True for the catch-all schema of unregistered types.
    pub fn is_generic(&self) -> bool {
        self.generic
    }

    /// True when the schema declares `created`, `modified` and `revoked`.
    pub fn is_versionable(&self) -> bool {
        ["created", "modified", "revoked"]
            .iter()
            .all(|name| self.declares(name))
    }

    /// Names of properties that feed the deterministic id.
    pub fn id_contributing(&self) -> impl Iterator<Item = &str> {
        self.properties
            .iter()
            .filter(|(_, p)| p.id_contributing)
            .map(|(n, _)| n.as_str())
    }
}

/// Derives a class name from a type name: `x-new-type` becomes `XNewType`.
pub fn class_name_for(type_name: &str) -> String {
    type_name
        .split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// All built-in types of both versions.
pub(crate) fn builtin_types() -> Vec<ObjectType> {
    let mut types = v20::types();
    types.extend(v21::types());
    types
}

pub(crate) use common::{sco_common, sdo_common};
