//! Fluent construction of STIX objects.
//!
//! ```rust
//! use stix2::{ObjectBuilder, SpecVersion};
//!
//! let identity = ObjectBuilder::new("identity", SpecVersion::V21)
//!     .property("name", "ACME Widget, Inc.")
//!     .property("identity_class", "organization")
//!     .build()
//!     .unwrap();
//! assert!(identity.id().unwrap().starts_with("identity--"));
//! ```

use serde_json::{Map, Value as JsonValue};

use crate::env::Environment;
use crate::error::{Result, StixError};
use crate::model::{ObjectType, SpecVersion, StixObject, Value, registry};

// ============================================================================
// Object Builder
// ============================================================================

/// Builder for a single STIX object.
///
/// Property values are coerced and validated only in [`build`](Self::build),
/// so the order of calls does not matter. Defaults (`id`, `created`,
/// `modified`, `spec_version`) come from the builder's [`Environment`].
#[derive(Debug, Clone)]
pub struct ObjectBuilder {
    type_name: String,
    version: SpecVersion,
    values: Vec<(String, Value)>,
    custom_properties: Map<String, JsonValue>,
    allow_custom: bool,
    env: Environment,
}

impl ObjectBuilder {
    pub fn new(type_name: impl Into<String>, version: SpecVersion) -> Self {
        ObjectBuilder {
            type_name: type_name.into(),
            version,
            values: Vec::new(),
            custom_properties: Map::new(),
            allow_custom: false,
            env: Environment::default(),
        }
    }

    /// Sets a property. Setting the same name twice keeps the last value.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
        self
    }

    /// Adds an explicit custom property. These are accepted without the
    /// custom allowance but may not shadow declared properties.
    pub fn custom_property(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.custom_properties.insert(name.into(), value.into());
        self
    }

    pub fn custom_properties(mut self, properties: Map<String, JsonValue>) -> Self {
        self.custom_properties.extend(properties);
        self
    }

    /// Accept properties the schema does not declare.
    pub fn allow_custom(mut self, allow: bool) -> Self {
        self.allow_custom = allow;
        self
    }

    /// Clock and identifier source used for defaults.
    pub fn env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Validates the collected properties and produces the object.
    pub fn build(self) -> Result<StixObject> {
        let kind = match registry::lookup(self.version, &self.type_name) {
            Some(kind) => kind,
            None if self.allow_custom => {
                ObjectType::generic_custom(&self.type_name, self.version).into()
            }
            None => {
                return Err(StixError::Parse(format!(
                    "Unknown STIX {} object type '{}'",
                    self.version, self.type_name
                )));
            }
        };
        crate::validate::build(
            kind,
            self.values,
            self.custom_properties,
            self.allow_custom,
            &self.env,
        )
    }
}
