//! Process-wide registry of object types.
//!
//! The registry maps `(spec version, type name)` to an [`ObjectType`]. It is
//! seeded with the built-in tables on first use and grows through custom
//! registration. Lookups take a shared lock; registration takes the write
//! lock, so concurrent parsing and registration are safe.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Result, StixError};
use crate::model::schema::{ObjectType, builtin_types};
use crate::model::SpecVersion;

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Default)]
struct Registry {
    types: HashMap<(SpecVersion, String), Arc<ObjectType>>,
}

impl Registry {
    fn with_builtins() -> Self {
        let mut registry = Registry::default();
        for kind in builtin_types() {
            registry
                .types
                .insert((kind.version(), kind.name().to_string()), Arc::new(kind));
        }
        registry
    }
}

lazy_static::lazy_static! {
    static ref REGISTRY: RwLock<Registry> = RwLock::new(Registry::with_builtins());
}

/// Looks up the schema of a type under a version.
pub fn lookup(version: SpecVersion, type_name: &str) -> Option<Arc<ObjectType>> {
    REGISTRY
        .read()
        .types
        .get(&(version, type_name.to_string()))
        .cloned()
}

/// Returns true when the type is known under the version.
pub fn is_registered(version: SpecVersion, type_name: &str) -> bool {
    REGISTRY
        .read()
        .types
        .contains_key(&(version, type_name.to_string()))
}

/// Adds a type to the registry.
///
/// Fails when a type of the same name is already registered under the same
/// version; built-in types cannot be replaced.
pub fn register(kind: ObjectType) -> Result<Arc<ObjectType>> {
    let key = (kind.version(), kind.name().to_string());
    let mut registry = REGISTRY.write();
    if registry.types.contains_key(&key) {
        return Err(StixError::Registration(format!(
            "type '{}' is already registered for STIX {}",
            key.1, key.0
        )));
    }
    debug!(type_name = %key.1, version = %key.0, family = ?kind.family(), "registering object type");
    let kind = Arc::new(kind);
    registry.types.insert(key, Arc::clone(&kind));
    Ok(kind)
}

/// Names of all types registered under a version, sorted.
pub fn registered_types(version: SpecVersion) -> Vec<String> {
    let mut names: Vec<String> = REGISTRY
        .read()
        .types
        .keys()
        .filter(|(v, _)| *v == version)
        .map(|(_, name)| name.clone())
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::schema::Family;

    #[test]
    fn test_builtins_are_registered() {
        assert!(is_registered(SpecVersion::V20, "campaign"));
        assert!(is_registered(SpecVersion::V21, "grouping"));
        assert!(!is_registered(SpecVersion::V20, "grouping"));
        let file = lookup(SpecVersion::V21, "file").unwrap();
        assert_eq!(file.family(), Family::Sco);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let kind = ObjectType::generic_custom("x-registry-test", SpecVersion::V21);
        assert!(register(kind.clone()).is_ok());
        assert!(matches!(register(kind), Err(StixError::Registration(_))));
        assert!(registered_types(SpecVersion::V21).contains(&"x-registry-test".to_string()));
    }
}
