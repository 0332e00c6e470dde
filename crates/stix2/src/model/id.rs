//! STIX identifiers.
//!
//! Identifiers have the form `<type>--<uuid>`. STIX 2.1 cyber-observables
//! derive their UUID deterministically from a canonical JSON rendering of
//! their ID-contributing properties:
//!
//! ```text
//! uuid = UUIDv5(SCO_DET_ID_NAMESPACE, canonical_json(contributing))
//! ```

use serde_json::{Map, Value as JsonValue};
use uuid::{Uuid, Variant};

use crate::limits::{MAX_NAME_LEN, MIN_NAME_LEN, SCO_DET_ID_NAMESPACE};
use crate::model::SpecVersion;

/// Hash algorithms preferred when a `hashes` property contributes to an id.
const PREFERRED_HASHES: [&str; 4] = ["MD5", "SHA-1", "SHA-256", "SHA-512"];

/// Formats `<type>--<uuid>`.
pub fn format_id(type_name: &str, uuid: &Uuid) -> String {
    format!("{}--{}", type_name, uuid.hyphenated())
}

/// Returns the type prefix of an identifier (everything before `--`).
pub fn get_type_from_id(id: &str) -> &str {
    match id.split_once("--") {
        Some((type_name, _)) => type_name,
        None => id,
    }
}

/// Splits and checks an identifier.
///
/// The UUID must be hyphenated and of the RFC 4122 variant; STIX 2.0 further
/// requires version 4. When `required_type` is given the prefix must match it.
pub fn validate_id(
    id: &str,
    version: SpecVersion,
    required_type: Option<&str>,
) -> Result<(String, Uuid), String> {
    let Some((type_name, uuid_part)) = id.split_once("--") else {
        return Err(format!("'{}' is not a valid STIX identifier, must match <object-type>--<UUID>.", id));
    };
    if let Some(required) = required_type {
        if type_name != required {
            return Err(format!("must start with '{}--'.", required));
        }
    }
    if validate_type_name(type_name, version).is_some() {
        return Err(format!("'{}' is not a valid STIX type name.", type_name));
    }
    let invalid = || format!("'{}' is not a valid STIX identifier, must match <object-type>--<UUID>.", id);
    if uuid_part.len() != 36 {
        return Err(invalid());
    }
    let uuid = Uuid::parse_str(uuid_part).map_err(|_| invalid())?;
    if uuid.get_variant() != Variant::RFC4122 {
        return Err(format!("'{}' is not a valid RFC 4122 UUID.", uuid_part));
    }
    if version == SpecVersion::V20 && uuid.get_version_num() != 4 {
        return Err(format!("'{}' is not a valid version 4 UUID.", uuid_part));
    }
    Ok((type_name.to_string(), uuid))
}

/// Checks a type name against the naming rules of a version.
///
/// Returns an error description if invalid, None if valid.
pub fn validate_type_name(name: &str, version: SpecVersion) -> Option<&'static str> {
    if name.len() < MIN_NAME_LEN || name.len() > MAX_NAME_LEN {
        return Some("type names must be between 3 and 250 characters");
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Some("type names may only contain lowercase ASCII letters, digits and '-'");
    }
    if name.contains("--") {
        return Some("type names must not contain '--'");
    }
    if version == SpecVersion::V21 && !name.as_bytes()[0].is_ascii_lowercase() {
        return Some("type names must begin with a lowercase letter");
    }
    None
}

/// Renders JSON with sorted keys and no insignificant whitespace.
pub fn canonical_json(value: &JsonValue) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &JsonValue, out: &mut String) {
    match value {
        JsonValue::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&JsonValue::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        JsonValue::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Picks the single hash that participates in a deterministic id.
pub fn choose_one_hash(hashes: &Map<String, JsonValue>) -> Option<(String, JsonValue)> {
    PREFERRED_HASHES
        .iter()
        .find_map(|name| hashes.get(*name).map(|v| (name.to_string(), v.clone())))
        .or_else(|| hashes.iter().next().map(|(k, v)| (k.clone(), v.clone())))
}

/// Derives the deterministic UUID for a set of contributing properties.
///
/// Returns None when no contributing property is present.
pub fn deterministic_uuid(contributing: &Map<String, JsonValue>) -> Option<Uuid> {
    if contributing.is_empty() {
        return None;
    }
    let mut streamlined = Map::new();
    for (name, value) in contributing {
        if name == "hashes" {
            if let JsonValue::Object(hashes) = value {
                if let Some((algo, hash)) = choose_one_hash(hashes) {
                    let mut one = Map::new();
                    one.insert(algo, hash);
                    streamlined.insert(name.clone(), JsonValue::Object(one));
                }
            }
        } else {
            streamlined.insert(name.clone(), value.clone());
        }
    }
    if streamlined.is_empty() {
        return None;
    }
    let canonical = canonical_json(&JsonValue::Object(streamlined));
    Some(Uuid::new_v5(&SCO_DET_ID_NAMESPACE, canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_deterministic_uuid_known_values() {
        let id = deterministic_uuid(&map(json!({"name": "data.txt"}))).unwrap();
        assert_eq!(id.to_string(), "c27c572c-2e17-5ce1-817e-67bb97629a56");

        let id = deterministic_uuid(&map(json!({"value": "198.51.100.3"}))).unwrap();
        assert_eq!(id.to_string(), "28bb3599-77cd-5a82-a950-b5bc3caf07c4");
    }

    #[test]
    fn test_deterministic_uuid_prefers_md5() {
        let a = deterministic_uuid(&map(json!({
            "name": "a.exe",
            "hashes": {"SHA-256": "ab", "MD5": "d41d8cd98f00b204e9800998ecf8427e"},
        })))
        .unwrap();
        assert_eq!(a.to_string(), "7e567502-8994-53ff-9c69-79240cae362d");
        assert_eq!(a.get_version_num(), 5);
    }

    #[test]
    fn test_deterministic_uuid_empty() {
        assert!(deterministic_uuid(&Map::new()).is_none());
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        let v = json!({"b": [1, {"z": true, "a": null}], "a": "x"});
        assert_eq!(canonical_json(&v), r#"{"a":"x","b":[1,{"a":null,"z":true}]}"#);
    }

    #[test]
    fn test_validate_id() {
        let (t, _) = validate_id(
            "indicator--00000000-0000-4000-8000-000000000001",
            SpecVersion::V20,
            Some("indicator"),
        )
        .unwrap();
        assert_eq!(t, "indicator");

        assert!(validate_id("campaign-8e2e2d2b-17d4-4cbf-938f-98ee46b3cd3f", SpecVersion::V21, None).is_err());
        assert!(validate_id(
            "identity--8e2e2d2b-17d4-4cbf-938f-98ee46b3cd3f",
            SpecVersion::V21,
            Some("campaign")
        )
        .is_err());
        // Version 5 is fine for 2.1 but not for 2.0.
        let v5 = "file--c27c572c-2e17-5ce1-817e-67bb97629a56";
        assert!(validate_id(v5, SpecVersion::V21, None).is_ok());
        assert!(validate_id(v5, SpecVersion::V20, None).is_err());
    }

    #[test]
    fn test_get_type_from_id() {
        assert_eq!(
            get_type_from_id("identity--311b2d2d-f010-4473-83ec-1edf84858f4c"),
            "identity"
        );
    }

    #[test]
    fn test_validate_type_name() {
        assert!(validate_type_name("x-new-type", SpecVersion::V21).is_none());
        assert!(validate_type_name("x", SpecVersion::V21).is_some());
        assert!(validate_type_name("X-Upper", SpecVersion::V20).is_some());
        assert!(validate_type_name("7x-thing", SpecVersion::V21).is_some());
        assert!(validate_type_name("7x-thing", SpecVersion::V20).is_none());
    }
}
