//! Type predicates and deduplication.

use std::collections::HashSet;

use serde_json::{Map, Value as JsonValue};

use crate::model::{Family, SpecVersion, StixObject, Timestamp, registry};

pub use crate::codec::get_dict;
pub use crate::model::get_type_from_id;

// =============================================================================
// TYPE PREDICATES
// =============================================================================

/// Something whose STIX type can be looked up: a type name, a mapping with a
/// `type` key, or a typed object.
pub trait StixTyped {
    fn stix_type(&self) -> Option<&str>;

    /// Family of the type among the types registered for `version`.
    fn stix_family(&self, version: SpecVersion) -> Option<Family> {
        self.stix_type()
            .and_then(|name| registry::lookup(version, name))
            .map(|kind| kind.family())
    }
}

impl StixTyped for str {
    fn stix_type(&self) -> Option<&str> {
        Some(self)
    }
}

impl StixTyped for String {
    fn stix_type(&self) -> Option<&str> {
        Some(self)
    }
}

impl StixTyped for Map<String, JsonValue> {
    fn stix_type(&self) -> Option<&str> {
        self.get("type").and_then(JsonValue::as_str)
    }
}

impl StixTyped for JsonValue {
    fn stix_type(&self) -> Option<&str> {
        self.as_object().and_then(StixTyped::stix_type)
    }
}

impl StixTyped for StixObject {
    fn stix_type(&self) -> Option<&str> {
        Some(self.type_name())
    }

    // Objects know their own schema.
    fn stix_family(&self, _version: SpecVersion) -> Option<Family> {
        let kind = self.object_type();
        (!kind.is_generic()).then(|| kind.family())
    }
}

/// True for domain objects, including registered custom ones.
pub fn is_sdo<P: StixTyped + ?Sized>(value: &P, version: SpecVersion) -> bool {
    value.stix_family(version) == Some(Family::Sdo)
}

/// True for cyber-observable objects.
pub fn is_sco<P: StixTyped + ?Sized>(value: &P, version: SpecVersion) -> bool {
    value.stix_family(version) == Some(Family::Sco)
}

/// True for relationship and sighting objects.
pub fn is_sro<P: StixTyped + ?Sized>(value: &P, version: SpecVersion) -> bool {
    value.stix_family(version) == Some(Family::Sro)
}

pub fn is_marking<P: StixTyped + ?Sized>(value: &P, version: SpecVersion) -> bool {
    value.stix_family(version) == Some(Family::Marking)
}

/// True for any top-level STIX object: SDO, SRO, SCO or marking definition.
pub fn is_object<P: StixTyped + ?Sized>(value: &P, version: SpecVersion) -> bool {
    matches!(
        value.stix_family(version),
        Some(Family::Sdo | Family::Sro | Family::Sco | Family::Marking)
    )
}

// =============================================================================
// DEDUPLICATION
// =============================================================================

/// Identity of one object version: its id plus `modified`, or `created`
/// when it has no `modified`.
pub trait VersionKey {
    fn version_key(&self) -> Option<(String, String)>;
}

impl VersionKey for Map<String, JsonValue> {
    fn version_key(&self) -> Option<(String, String)> {
        let id = self.get("id")?.as_str()?;
        let stamp = self
            .get("modified")
            .or_else(|| self.get("created"))
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        Some((id.to_string(), normalize_stamp(stamp)))
    }
}

impl VersionKey for JsonValue {
    fn version_key(&self) -> Option<(String, String)> {
        self.as_object()?.version_key()
    }
}

impl VersionKey for StixObject {
    fn version_key(&self) -> Option<(String, String)> {
        self.to_map().version_key()
    }
}

// Equal instants written with different precision are the same version.
fn normalize_stamp(stamp: &str) -> String {
    Timestamp::parse(stamp)
        .map(|t| t.instant().to_rfc3339())
        .unwrap_or_else(|_| stamp.to_string())
}

/// Drops repeated versions of the same object, keeping the first occurrence
/// of each `(id, modified)` pair. Objects without an id are always kept.
pub fn deduplicate<T: VersionKey + Clone>(objects: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    objects
        .iter()
        .filter(|obj| obj.version_key().is_none_or(|key| seen.insert(key)))
        .cloned()
        .collect()
}
