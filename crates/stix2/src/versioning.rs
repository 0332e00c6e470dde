//! New versions and revocation.
//!
//! A revision copies every property of the previous object, applies the
//! caller's [`Changes`] and moves `modified` strictly forward. Both typed
//! objects and plain JSON mappings can be versioned; the result has the same
//! shape as the input.
//!
//! ```rust
//! use stix2::{Changes, ObjectBuilder, SpecVersion, Versionable};
//!
//! let campaign = ObjectBuilder::new("campaign", SpecVersion::V21)
//!     .property("name", "Green Group Attacks Against Finance")
//!     .property("created", "2016-04-06T20:03:00.000Z")
//!     .build()
//!     .unwrap();
//! let next = campaign
//!     .new_version(Changes::new().set("description", "Campaign by Green Group"))
//!     .unwrap();
//! assert_eq!(next.id(), campaign.id());
//! assert!(next.modified() > campaign.modified());
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, trace};

use crate::codec::detect_spec_version;
use crate::env::Environment;
use crate::error::{Result, StixError, VersionOp};
use crate::model::timestamp::{Precision, PrecisionConstraint};
use crate::model::{Family, ObjectType, SpecVersion, StixObject, Timestamp, Value, registry};

/// Properties an object needs to take part in versioning.
const VERSIONING_PROPERTIES: [&str; 3] = ["created", "modified", "revoked"];

/// Properties that never change between revisions.
const FROZEN_PROPERTIES: [&str; 4] = ["created", "created_by_ref", "id", "type"];

const MODIFIED_TOO_EARLY: &str = "The new modified datetime cannot be before than or equal to the current modified datetime.\
It cannot be equal, as according to STIX 2 specification, objects that are different but have the same id and modified timestamp do not have defined consumer behavior.";

// =============================================================================
// CHANGES
// =============================================================================

/// Property changes for a new version, in the order given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    entries: Vec<(String, Option<Value>)>,
    allow_custom: Option<bool>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property on the new version.
    pub fn set(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entry(name.into(), Some(value.into()))
    }

    /// Removes a property from the new version.
    pub fn unset(self, name: impl Into<String>) -> Self {
        self.entry(name.into(), None)
    }

    /// Overrides the custom allowance inherited from the original object.
    /// Ignored for plain mappings.
    pub fn allow_custom(mut self, allow: bool) -> Self {
        self.allow_custom = Some(allow);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(mut self, name: String, value: Option<Value>) -> Self {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    fn get(&self, name: &str) -> Option<&Option<Value>> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

// =============================================================================
// VERSIONABLE
// =============================================================================

/// Values that can produce new versions of themselves.
pub trait Versionable: Sized {
    /// Creates a revision, taking "now" and fresh ids from `env`.
    fn new_version_with(&self, changes: Changes, env: &Environment) -> Result<Self>;

    /// Creates a revision with `revoked` set.
    fn revoke_with(&self, env: &Environment) -> Result<Self>;

    fn new_version(&self, changes: Changes) -> Result<Self> {
        self.new_version_with(changes, &Environment::default())
    }

    fn revoke(&self) -> Result<Self> {
        self.revoke_with(&Environment::default())
    }
}

/// Creates a new version of `obj`.
pub fn new_version<T: Versionable>(obj: &T, changes: Changes) -> Result<T> {
    obj.new_version(changes)
}

/// Revokes `obj`.
pub fn revoke<T: Versionable>(obj: &T) -> Result<T> {
    obj.revoke()
}

impl Versionable for StixObject {
    fn new_version_with(&self, changes: Changes, env: &Environment) -> Result<Self> {
        let current = self.to_map();
        let kind = self.object_type();
        let modified = plan(
            &current,
            Some(kind.as_ref()),
            self.spec_version(),
            kind.class_name(),
            &changes,
            env,
        )?;

        let mut values: Vec<(String, Value)> = self.fields().to_vec();
        for (name, json) in self.custom_properties() {
            // A null custom value is an unset property, as in `Changes`.
            match Value::from_json(json.clone()) {
                Some(value) => values.push((name.clone(), value)),
                None => trace!(property = %name, "dropping null custom property"),
            }
        }
        let allow_custom = changes.allow_custom.unwrap_or(self.has_custom());
        for (name, change) in changes.entries {
            values.retain(|(n, _)| *n != name);
            if let Some(value) = change {
                values.push((name, value));
            }
        }
        if let Some(modified) = modified {
            values.retain(|(n, _)| n != "modified");
            values.push(("modified".to_string(), Value::Timestamp(modified)));
        }

        let revision = crate::validate::build(Arc::clone(kind), values, Map::new(), allow_custom, env)?;
        debug!(
            id = revision.id().unwrap_or_default(),
            modified = %revision.modified().map(|t| t.format()).unwrap_or_default(),
            "created new version"
        );
        Ok(revision)
    }

    fn revoke_with(&self, env: &Environment) -> Result<Self> {
        if is_revoked(&self.to_map()) {
            return Err(StixError::Revoke {
                operation: VersionOp::Revoke,
            });
        }
        debug!(id = self.id().unwrap_or_default(), "revoking object");
        self.new_version_with(Changes::new().set("revoked", true), env)
    }
}

impl Versionable for Map<String, JsonValue> {
    fn new_version_with(&self, changes: Changes, env: &Environment) -> Result<Self> {
        let Some(type_name) = self.get("type").and_then(JsonValue::as_str) else {
            return Err(StixError::TypeNotVersionable {
                type_name: JsonValue::Object(self.clone()).to_string(),
            });
        };
        let version = detect_spec_version(self);
        let kind = registry::lookup(version, type_name);
        let modified = plan(self, kind.as_deref(), version, "dict", &changes, env)?;

        let mut revision = self.clone();
        for (name, change) in changes.entries {
            match change {
                Some(value) => {
                    revision.insert(name, value.to_json());
                }
                None => {
                    revision.remove(&name);
                }
            }
        }
        if let Some(modified) = modified {
            revision.insert("modified".to_string(), JsonValue::String(modified.format()));
        }
        revision.retain(|_, v| !v.is_null());
        debug!(
            id = revision.get("id").and_then(JsonValue::as_str).unwrap_or_default(),
            "created new version of mapping"
        );
        Ok(revision)
    }

    fn revoke_with(&self, env: &Environment) -> Result<Self> {
        if is_revoked(self) {
            return Err(StixError::Revoke {
                operation: VersionOp::Revoke,
            });
        }
        self.new_version_with(Changes::new().set("revoked", true), env)
    }
}

impl Versionable for JsonValue {
    fn new_version_with(&self, changes: Changes, env: &Environment) -> Result<Self> {
        match self {
            JsonValue::Object(map) => map.new_version_with(changes, env).map(JsonValue::Object),
            other => Err(StixError::TypeNotVersionable {
                type_name: other.to_string(),
            }),
        }
    }

    fn revoke_with(&self, env: &Environment) -> Result<Self> {
        match self {
            JsonValue::Object(map) => map.revoke_with(env).map(JsonValue::Object),
            _ => Err(StixError::UnsupportedValue {
                operation: "revoke",
            }),
        }
    }
}

// =============================================================================
// CHECKS
// =============================================================================

/// Reads `revoked` from the merged property view, declared or custom.
fn is_revoked(current: &Map<String, JsonValue>) -> bool {
    current.get("revoked").and_then(JsonValue::as_bool).unwrap_or(false)
}

/// Runs the versioning checks shared by objects and mappings and returns the
/// `modified` value to set, or None when the caller supplied one.
fn plan(
    current: &Map<String, JsonValue>,
    kind: Option<&ObjectType>,
    version: SpecVersion,
    class: &str,
    changes: &Changes,
    env: &Environment,
) -> Result<Option<Timestamp>> {
    let type_name = current
        .get("type")
        .and_then(JsonValue::as_str)
        .unwrap_or_default();

    let versionable = match kind {
        Some(kind) if !kind.is_generic() => {
            kind.is_versionable() || VERSIONING_PROPERTIES.iter().all(|p| current.contains_key(*p))
        }
        _ => true,
    };
    if !versionable {
        return Err(StixError::TypeNotVersionable {
            type_name: type_name.to_string(),
        });
    }
    if is_revoked(current) {
        return Err(StixError::Revoke {
            operation: VersionOp::NewVersion,
        });
    }
    if !current.contains_key("created") {
        return Err(StixError::ObjectNotVersionable {
            type_name: type_name.to_string(),
        });
    }

    let unmodifiable = unmodifiable_changes(current, kind, version, changes);
    if !unmodifiable.is_empty() {
        return Err(StixError::UnmodifiableProperty {
            properties: unmodifiable.into_iter().collect(),
        });
    }

    let constraint = match version {
        SpecVersion::V20 => PrecisionConstraint::Exact,
        SpecVersion::V21 => PrecisionConstraint::Min,
    };
    let old = current
        .get("modified")
        .or_else(|| current.get("created"))
        .and_then(JsonValue::as_str)
        .ok_or_else(|| StixError::invalid(class, "modified", "must be a timestamp string."))
        .and_then(|text| {
            Timestamp::parse_with(text, Precision::Millisecond, constraint)
                .map_err(|e| StixError::invalid(class, "modified", e.to_string()))
        })?;

    match changes.get("modified") {
        Some(Some(requested)) => {
            let requested = match requested {
                Value::Timestamp(t) => t.with_precision(Precision::Millisecond, constraint),
                Value::String(text) => Timestamp::parse_with(text, Precision::Millisecond, constraint)
                    .map_err(|e| StixError::invalid(class, "modified", e.to_string()))?,
                other => {
                    return Err(StixError::invalid(
                        class,
                        "modified",
                        format!("must be a timestamp, not a {}.", other.kind_name()),
                    ));
                }
            };
            if requested <= old {
                return Err(StixError::invalid(class, "modified", MODIFIED_TOO_EARLY));
            }
            Ok(None)
        }
        _ => Ok(Some(
            fudge_modified(old, env.now(), version).with_precision(Precision::Millisecond, constraint),
        )),
    }
}

/// Names of frozen properties the changes would alter, sorted.
fn unmodifiable_changes(
    current: &Map<String, JsonValue>,
    kind: Option<&ObjectType>,
    version: SpecVersion,
    changes: &Changes,
) -> BTreeSet<String> {
    let mut frozen = BTreeSet::new();
    for name in FROZEN_PROPERTIES {
        if let Some(Some(value)) = changes.get(name) {
            if !same_value(&value.to_json(), current.get(name)) {
                frozen.insert(name.to_string());
            }
        }
    }

    // Deterministic ids pin their contributing properties.
    let Some(kind) = kind else {
        return frozen;
    };
    if version != SpecVersion::V21 || kind.family() != Family::Sco || !has_uuid5_id(current) {
        return frozen;
    }
    for name in kind.id_contributing() {
        let changed = match changes.get(name) {
            Some(Some(value)) => !same_value(&value.to_json(), current.get(name)),
            Some(None) => current.contains_key(name),
            None => false,
        };
        if changed {
            frozen.insert(name.to_string());
        }
    }
    frozen
}

fn has_uuid5_id(current: &Map<String, JsonValue>) -> bool {
    current
        .get("id")
        .and_then(JsonValue::as_str)
        .and_then(|id| id.split_once("--"))
        .and_then(|(_, uuid)| uuid::Uuid::parse_str(uuid).ok())
        .is_some_and(|uuid| uuid.get_variant() == uuid::Variant::RFC4122 && uuid.get_version_num() == 5)
}

/// Equal JSON, or two timestamp strings naming the same instant.
fn same_value(new: &JsonValue, old: Option<&JsonValue>) -> bool {
    let Some(old) = old else {
        return false;
    };
    if new == old {
        return true;
    }
    match (new.as_str(), old.as_str()) {
        (Some(a), Some(b)) => matches!(
            (Timestamp::parse(a), Timestamp::parse(b)),
            (Ok(a), Ok(b)) if a == b
        ),
        _ => false,
    }
}

/// Moves a candidate `modified` past the previous one.
///
/// STIX 2.1 advances by one microsecond when the candidate is not later;
/// STIX 2.0 advances by one millisecond when the candidate is less than a
/// millisecond later.
pub fn fudge_modified(old: Timestamp, new: Timestamp, version: SpecVersion) -> Timestamp {
    match version {
        SpecVersion::V21 if new <= old => old.plus_micros(1),
        SpecVersion::V20 if new.instant() - old.instant() < chrono::TimeDelta::milliseconds(1) => {
            old.plus_micros(1_000)
        }
        _ => new,
    }
}

/// Strips custom content by creating a new version without it.
///
/// Returns None for objects whose type is itself custom, since there is no
/// schema to fall back to. Objects without custom properties are returned
/// unchanged.
pub fn remove_custom_stix(obj: &StixObject) -> Result<Option<StixObject>> {
    remove_custom_stix_with(obj, &Environment::default())
}

pub fn remove_custom_stix_with(obj: &StixObject, env: &Environment) -> Result<Option<StixObject>> {
    if obj.object_type().is_custom() {
        return Ok(None);
    }
    if obj.custom_properties().is_empty() {
        return Ok(Some(obj.clone()));
    }
    let changes = obj
        .custom_properties()
        .keys()
        .fold(Changes::new(), |changes, name| changes.unset(name.clone()))
        .allow_custom(false);
    obj.new_version_with(changes, env).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectBuilder;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use serde_json::json;

    fn env() -> Environment {
        Environment::deterministic(Utc.with_ymd_and_hms(2017, 1, 1, 12, 34, 56).unwrap())
    }

    fn map(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    fn campaign(version: SpecVersion, created: &str) -> StixObject {
        ObjectBuilder::new("campaign", version)
            .property("name", "Green Group Attacks Against Finance")
            .property("created_by_ref", "identity--f431f809-377b-45e0-aa1c-6a4751cae5ff")
            .property("created", created)
            .env(env())
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_version_keeps_identity() {
        let old = campaign(SpecVersion::V21, "2016-04-06T20:03:00.000Z");
        let new = old
            .new_version_with(Changes::new().set("description", "changed"), &env())
            .unwrap();
        assert_eq!(new.id(), old.id());
        assert_eq!(new.created(), old.created());
        assert_eq!(new.get("created_by_ref"), old.get("created_by_ref"));
        assert_eq!(new.get("modified").unwrap().to_json(), json!("2017-01-01T12:34:56.000Z"));
        assert_eq!(new.get("description"), Some(&Value::from("changed")));
    }

    #[test]
    fn test_fudge_same_instant() {
        // The clock reads exactly the previous modified value.
        let v21 = campaign(SpecVersion::V21, "2017-01-01T12:34:56.000Z");
        let next = v21.new_version_with(Changes::new(), &env()).unwrap();
        assert_eq!(next.get("modified").unwrap().to_json(), json!("2017-01-01T12:34:56.000001Z"));

        let v20 = campaign(SpecVersion::V20, "2017-01-01T12:34:56.000Z");
        let next = v20.new_version_with(Changes::new(), &env()).unwrap();
        assert_eq!(next.get("modified").unwrap().to_json(), json!("2017-01-01T12:34:56.001Z"));
    }

    #[test]
    fn test_explicit_modified_must_increase() {
        let old = campaign(SpecVersion::V21, "2016-04-06T20:03:00.000Z");
        for earlier in ["2016-04-06T20:03:00.000Z", "2015-04-06T20:03:00.000Z"] {
            let err = old
                .new_version_with(Changes::new().set("modified", earlier), &env())
                .unwrap_err();
            match err {
                StixError::InvalidValue {
                    class,
                    property,
                    reason,
                } => {
                    assert_eq!(class, "Campaign");
                    assert_eq!(property, "modified");
                    assert_eq!(reason, MODIFIED_TOO_EARLY);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
        let later = old
            .new_version_with(Changes::new().set("modified", "2016-04-06T20:03:00.001Z"), &env())
            .unwrap();
        assert_eq!(later.get("modified").unwrap().to_json(), json!("2016-04-06T20:03:00.001Z"));
    }

    #[test]
    fn test_unmodifiable_properties_collected() {
        let old = campaign(SpecVersion::V20, "2016-04-06T20:03:00.000Z");
        let err = old
            .new_version_with(
                Changes::new()
                    .set("id", "campaign--00000000-0000-4000-8000-000000000000")
                    .set("created", "2017-04-06T20:03:00.000Z")
                    .set("type", "threat-actor"),
                &env(),
            )
            .unwrap_err();
        match err {
            StixError::UnmodifiableProperty { properties } => {
                assert_eq!(properties, vec!["created", "id", "type"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Restating a current value is not a change.
        assert!(old
            .new_version_with(Changes::new().set("created", "2016-04-06T20:03:00Z"), &env())
            .is_ok());
    }

    #[test]
    fn test_sco_contributing_properties_frozen() {
        let file = map(json!({
            "type": "file",
            "spec_version": "2.1",
            "id": "file--c27c572c-2e17-5ce1-817e-67bb97629a56",
            "name": "data.txt",
            "created": "1520-04-05T15:36:14.000Z",
            "modified": "1520-04-05T15:36:14.000Z",
            "revoked": false,
        }));
        let err = file
            .new_version_with(Changes::new().set("name", "foo.dat"), &env())
            .unwrap_err();
        match err {
            StixError::UnmodifiableProperty { properties } => assert_eq!(properties, vec!["name"]),
            other => panic!("unexpected error: {other}"),
        }

        let next = file
            .new_version_with(Changes::new().set("size", 1234), &env())
            .unwrap();
        assert_eq!(next["size"], json!(1234));
        assert_eq!(next["modified"], json!("2017-01-01T12:34:56.000Z"));
    }

    #[test]
    fn test_revocation_is_terminal() {
        let old = campaign(SpecVersion::V21, "2016-04-06T20:03:00.000Z");
        let revoked = old.revoke_with(&env()).unwrap();
        assert!(revoked.is_revoked());

        let err = revoked.revoke_with(&env()).unwrap_err();
        assert_eq!(err.to_string(), "Cannot revoke an already revoked object.");
        let err = revoked.new_version_with(Changes::new(), &env()).unwrap_err();
        assert!(matches!(err, StixError::Revoke { operation: VersionOp::NewVersion }));
    }

    #[test]
    fn test_revoke_reads_custom_revoked() {
        let addr = ObjectBuilder::new("ipv4-addr", SpecVersion::V21)
            .property("value", "10.0.0.1")
            .property("created", "2016-04-06T20:03:00.000Z")
            .property("modified", "2016-04-06T20:03:00.000Z")
            .property("revoked", true)
            .allow_custom(true)
            .env(env())
            .build()
            .unwrap();
        assert_eq!(addr.custom_property("revoked"), Some(&json!(true)));
        assert!(addr.is_revoked());

        let err = addr.revoke_with(&env()).unwrap_err();
        assert!(matches!(err, StixError::Revoke { operation: VersionOp::Revoke }));
        let err = addr.new_version_with(Changes::new(), &env()).unwrap_err();
        assert!(matches!(err, StixError::Revoke { operation: VersionOp::NewVersion }));
    }

    #[test]
    fn test_null_custom_property_is_unset() {
        let old = crate::codec::parse(
            json!({
                "type": "campaign",
                "spec_version": "2.1",
                "id": "campaign--8e2e2d2b-17d4-4cbf-938f-98ee46b3cd3f",
                "created": "2016-04-06T20:03:00.000Z",
                "modified": "2016-04-06T20:03:00.000Z",
                "name": "Green Group Attacks Against Finance",
                "custom_properties": {"x_kept": 1, "x_cleared": null},
            }),
            &crate::codec::ParseOptions::new(),
        )
        .unwrap();
        assert_eq!(old.custom_property("x_cleared"), Some(&JsonValue::Null));

        let next = old
            .new_version_with(Changes::new().set("name", "renamed").allow_custom(true), &env())
            .unwrap();
        assert_eq!(next.custom_property("x_kept"), Some(&json!(1)));
        assert_eq!(next.custom_property("x_cleared"), None);
    }

    #[test]
    fn test_mapping_versioning() {
        let data = map(json!({
            "type": "campaign",
            "id": "campaign--8e2e2d2b-17d4-4cbf-938f-98ee46b3cd3f",
            "created": "2016-04-06T20:03:00.000Z",
            "modified": "2016-04-06T20:03:00.000Z",
            "name": "Green Group Attacks Against Finance",
            "description": "old",
        }));
        let next = data
            .new_version_with(Changes::new().unset("description"), &env())
            .unwrap();
        assert!(!next.contains_key("description"));
        assert_eq!(next["id"], data["id"]);
        assert_eq!(next["modified"], json!("2017-01-01T12:34:56.000Z"));

        let err = data
            .new_version_with(Changes::new().set("modified", "2015-01-01T00:00:00.000Z"), &env())
            .unwrap_err();
        assert!(matches!(err, StixError::InvalidValue { ref class, .. } if class == "dict"));
    }

    #[test]
    fn test_not_versionable() {
        let marking = json!({
            "type": "marking-definition",
            "id": "marking-definition--34098fce-860f-48ae-8e50-ebd3cc5e41da",
            "created": "2017-01-20T00:00:00.000Z",
            "definition_type": "tlp",
            "definition": {"tlp": "green"},
        });
        assert!(matches!(
            marking.new_version_with(Changes::new(), &env()),
            Err(StixError::TypeNotVersionable { .. })
        ));

        assert!(matches!(
            json!([1, 2, 3]).new_version_with(Changes::new(), &env()),
            Err(StixError::TypeNotVersionable { .. })
        ));
        let err = json!("campaign").revoke_with(&env()).unwrap_err();
        assert!(matches!(err, StixError::UnsupportedValue { operation: "revoke" }));

        let no_created = json!({"type": "x-thing", "id": "x-thing--8e2e2d2b-17d4-4cbf-938f-98ee46b3cd3f"});
        assert!(matches!(
            no_created.new_version_with(Changes::new(), &env()),
            Err(StixError::ObjectNotVersionable { .. })
        ));
    }

    #[test]
    fn test_custom_allowance_inherited() {
        let old = ObjectBuilder::new("campaign", SpecVersion::V21)
            .property("name", "c")
            .property("x_source", "internal")
            .allow_custom(true)
            .env(env())
            .build()
            .unwrap();
        let next = old
            .new_version_with(Changes::new().set("x_other", "more"), &env())
            .unwrap();
        assert_eq!(next.custom_property("x_source"), Some(&json!("internal")));
        assert_eq!(next.custom_property("x_other"), Some(&json!("more")));

        let err = old
            .new_version_with(Changes::new().allow_custom(false), &env())
            .unwrap_err();
        assert!(matches!(err, StixError::ExtraProperties { .. }));
    }

    #[test]
    fn test_remove_custom_stix() {
        let old = ObjectBuilder::new("campaign", SpecVersion::V21)
            .property("name", "c")
            .property("created", "2016-04-06T20:03:00.000Z")
            .property("x_source", "internal")
            .allow_custom(true)
            .build()
            .unwrap();
        let clean = remove_custom_stix_with(&old, &env()).unwrap().unwrap();
        assert!(clean.custom_properties().is_empty());
        assert!(!clean.has_custom());
        assert!(clean.modified() > old.modified());

        let plain = campaign(SpecVersion::V21, "2016-04-06T20:03:00.000Z");
        assert_eq!(remove_custom_stix(&plain).unwrap(), Some(plain));

        let generic = crate::codec::parse(
            json!({"type": "x-whole", "id": "x-whole--8e2e2d2b-17d4-4cbf-938f-98ee46b3cd3f"}),
            &crate::codec::ParseOptions::new().allow_custom(true),
        )
        .unwrap();
        assert_eq!(remove_custom_stix(&generic).unwrap(), None);
    }

    proptest! {
        #[test]
        fn test_fudge_is_monotonic(old_us in 0i64..10_000_000, delta_us in -5_000i64..5_000) {
            let base = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
            let old = Timestamp::new(base).plus_micros(old_us);
            let new = old.plus_micros(delta_us);
            for version in [SpecVersion::V20, SpecVersion::V21] {
                prop_assert!(fudge_modified(old, new, version) > old);
            }
        }
    }
}
