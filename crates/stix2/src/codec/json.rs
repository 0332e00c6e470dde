//! JSON parsing and serialization of STIX objects.
//!
//! Parsing resolves the object's `type` first, then its spec version (given
//! explicitly or detected from the content), and dispatches to the registered
//! schema. Serialization emits declared properties in declaration order
//! followed by custom properties, unless sorting is requested.

use std::io::Read;
use std::sync::Arc;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::env::Environment;
use crate::error::{Result, StixError};
use crate::model::{Family, ObjectType, SpecVersion, StixObject, Value, registry};
use crate::validate::build_from_json;

// =============================================================================
// OPTIONS
// =============================================================================

/// Options for [`parse`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Spec version to parse under. Detected from the content when unset.
    pub version: Option<SpecVersion>,
    /// Accept custom properties and unregistered types.
    pub allow_custom: bool,
    /// Clock and id source for defaulted properties.
    pub env: Environment,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(mut self, version: SpecVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn allow_custom(mut self, allow: bool) -> Self {
        self.allow_custom = allow;
        self
    }

    pub fn env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }
}

/// Options for [`serialize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Indent with four spaces, one property per line.
    pub pretty: bool,
    /// Emit declared optional defaults (such as `revoked: false`).
    pub include_optional_defaults: bool,
    /// Sort keys alphabetically instead of by declaration.
    pub sort_keys: bool,
}

impl SerializeOptions {
    pub fn pretty() -> Self {
        SerializeOptions {
            pretty: true,
            ..Self::default()
        }
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Parses a STIX object from a JSON value.
///
/// `data` may be a JSON object, JSON text (as a string value) or an array of
/// `[name, value]` pairs.
///
/// ```rust
/// use stix2::codec::{ParseOptions, parse};
///
/// let obj = parse(
///     r#"{"type": "identity", "id": "identity--311b2d2d-f010-4473-83ec-1edf84858f4c",
///        "created": "2015-12-21T19:59:11.000Z", "modified": "2015-12-21T19:59:11.000Z",
///        "name": "Cory Doctorow", "identity_class": "individual"}"#,
///     &ParseOptions::new(),
/// )
/// .unwrap();
/// assert_eq!(obj.spec_version().as_str(), "2.0");
/// ```
pub fn parse(data: impl Into<JsonValue>, options: &ParseOptions) -> Result<StixObject> {
    dict_to_stix(get_dict(data.into())?, options)
}

/// Parses a STIX object from a stream of JSON text.
pub fn parse_reader<R: Read>(reader: R, options: &ParseOptions) -> Result<StixObject> {
    let json: JsonValue = serde_json::from_reader(reader)?;
    parse(json, options)
}

/// Converts a JSON mapping into a typed object.
pub fn dict_to_stix(map: Map<String, JsonValue>, options: &ParseOptions) -> Result<StixObject> {
    let Some(type_name) = map.get("type").and_then(JsonValue::as_str).map(str::to_string) else {
        return Err(StixError::Parse(format!(
            "Can't parse object with no 'type' property: {}",
            JsonValue::Object(map)
        )));
    };
    let version = options
        .version
        .unwrap_or_else(|| detect_spec_version(&map));
    debug!(type_name = %type_name, %version, "parsing object");

    match registry::lookup(version, &type_name) {
        Some(kind) => build_from_json(kind, map, options.allow_custom, &options.env),
        None if options.allow_custom => {
            warn!(type_name = %type_name, %version, "parsing unregistered type as generic custom object");
            let kind = Arc::new(ObjectType::generic_custom(&type_name, version));
            build_from_json(kind, map, true, &options.env)
        }
        None => Err(StixError::Parse(format!(
            "Can't parse unknown object type '{}'! For custom types, register them with CustomObject.",
            type_name
        ))),
    }
}

/// Normalizes parse input into a mapping.
///
/// Accepts a JSON object, a string holding a JSON object, or an array of
/// `[name, value]` pairs.
pub fn get_dict(data: JsonValue) -> Result<Map<String, JsonValue>> {
    let cannot = |data: &JsonValue| StixError::Parse(format!("Cannot convert '{}' to dictionary.", data));
    match data {
        JsonValue::Object(map) => Ok(map),
        JsonValue::String(ref text) => match serde_json::from_str::<JsonValue>(text) {
            Ok(JsonValue::Object(map)) => Ok(map),
            _ => Err(cannot(&data)),
        },
        JsonValue::Array(ref items) => {
            let mut map = Map::new();
            for item in items {
                match item.as_array().map(Vec::as_slice) {
                    Some([JsonValue::String(name), value]) => {
                        map.insert(name.clone(), value.clone());
                    }
                    _ => return Err(cannot(&data)),
                }
            }
            Ok(map)
        }
        other => Err(cannot(&other)),
    }
}

/// Guesses the spec version of a mapping that does not say.
///
/// - an explicit `spec_version` wins (on a bundle, its presence means 2.0);
/// - a bundle without one is 2.1;
/// - objects without an `id` are 2.0 observables;
/// - types registered as 2.1 observables are 2.1;
/// - everything else is 2.0.
pub fn detect_spec_version(map: &Map<String, JsonValue>) -> SpecVersion {
    let type_name = map.get("type").and_then(JsonValue::as_str).unwrap_or_default();
    let explicit = map.get("spec_version");

    if type_name == "bundle" {
        return match explicit {
            Some(_) => SpecVersion::V20,
            None => SpecVersion::V21,
        };
    }
    if let Some(version) = explicit {
        return version
            .as_str()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
    }
    if !map.contains_key("id") {
        return SpecVersion::V20;
    }
    match registry::lookup(SpecVersion::V21, type_name) {
        Some(kind) if kind.family() == Family::Sco => SpecVersion::V21,
        _ => SpecVersion::V20,
    }
}

// =============================================================================
// SERIALIZATION
// =============================================================================

/// Renders an object as JSON text.
pub fn serialize(obj: &StixObject, options: &SerializeOptions) -> Result<String> {
    let mut json = object_json(obj, options.include_optional_defaults);
    if options.sort_keys {
        json = sort_keys(json);
    }
    to_text(&json, options.pretty)
}

/// Renders plain JSON with the formatting rules used for objects.
pub fn serialize_json(json: &JsonValue, options: &SerializeOptions) -> Result<String> {
    if options.sort_keys {
        to_text(&sort_keys(json.clone()), options.pretty)
    } else {
        to_text(json, options.pretty)
    }
}

fn to_text(json: &JsonValue, pretty: bool) -> Result<String> {
    if !pretty {
        return Ok(serde_json::to_string(json)?);
    }
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    json.serialize(&mut serializer)?;
    String::from_utf8(out).map_err(|e| StixError::Parse(e.to_string()))
}

fn object_json(obj: &StixObject, include_defaults: bool) -> JsonValue {
    let mut map = Map::new();
    for (name, prop) in obj.object_type().properties() {
        match obj.get(name) {
            Some(value) => {
                map.insert(name.clone(), value_json(value, include_defaults));
            }
            None if include_defaults => {
                if let Some(default) = &prop.optional_default {
                    map.insert(name.clone(), default.to_json());
                }
            }
            None => {}
        }
    }
    for (name, value) in obj.custom_properties() {
        map.insert(name.clone(), value.clone());
    }
    JsonValue::Object(map)
}

fn value_json(value: &Value, include_defaults: bool) -> JsonValue {
    match value {
        Value::Object(obj) => object_json(obj, include_defaults),
        Value::List(items) => JsonValue::Array(
            items
                .iter()
                .map(|item| value_json(item, include_defaults))
                .collect(),
        ),
        other => other.to_json(),
    }
}

fn sort_keys(json: JsonValue) -> JsonValue {
    match json {
        JsonValue::Object(map) => {
            let mut entries: Vec<(String, JsonValue)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            JsonValue::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        JsonValue::Array(items) => JsonValue::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    const IDENTITY_ID: &str = "identity--311b2d2d-f010-4473-83ec-1edf84858f4c";

    fn options() -> ParseOptions {
        ParseOptions::new().env(Environment::deterministic(
            Utc.with_ymd_and_hms(2017, 1, 1, 12, 34, 56).unwrap(),
        ))
    }

    fn identity() -> JsonValue {
        json!({
            "type": "identity",
            "id": IDENTITY_ID,
            "created": "2015-12-21T19:59:11.000Z",
            "modified": "2015-12-21T19:59:11.000Z",
            "name": "John Smith",
            "identity_class": "individual",
        })
    }

    #[test]
    fn test_parse_from_text_and_pairs() {
        let text = identity().to_string();
        let from_text = parse(text.as_str(), &options()).unwrap();
        assert_eq!(from_text.id(), Some(IDENTITY_ID));

        let pairs = json!([["type", "identity"], ["name", "John Smith"], ["identity_class", "individual"]]);
        let from_pairs = parse(pairs, &options().version(SpecVersion::V21)).unwrap();
        assert_eq!(from_pairs.get("name"), Some(&Value::from("John Smith")));
    }

    #[test]
    fn test_get_dict_rejects_other_shapes() {
        for bad in [json!(1), json!("not json"), json!("[1, 2]"), json!([["a"]])] {
            assert!(matches!(get_dict(bad), Err(StixError::Parse(_))));
        }
    }

    #[test]
    fn test_parse_without_type() {
        let err = parse(json!({"id": IDENTITY_ID}), &options()).unwrap_err();
        assert!(err.to_string().starts_with("Can't parse object with no 'type' property"));
    }

    #[test]
    fn test_parse_unknown_type() {
        let data = json!({
            "type": "x-foobar",
            "id": "x-foobar--d362beb5-a04e-4e6b-a030-b6935122c3f9",
            "property1": "something",
        });
        let err = parse(data.clone(), &options()).unwrap_err();
        assert!(err.to_string().starts_with("Can't parse unknown object type 'x-foobar'!"));

        let obj = parse(data, &options().allow_custom(true)).unwrap();
        assert_eq!(obj.type_name(), "x-foobar");
        assert_eq!(obj.id(), Some("x-foobar--d362beb5-a04e-4e6b-a030-b6935122c3f9"));
        assert!(obj.object_type().is_generic());
    }

    #[test]
    fn test_detect_spec_version() {
        let map = |v: JsonValue| get_dict(v).unwrap();
        assert_eq!(detect_spec_version(&map(identity())), SpecVersion::V20);
        assert_eq!(
            detect_spec_version(&map(json!({"type": "identity", "spec_version": "2.1"}))),
            SpecVersion::V21
        );
        assert_eq!(
            detect_spec_version(&map(json!({"type": "bundle", "spec_version": "2.0"}))),
            SpecVersion::V20
        );
        assert_eq!(detect_spec_version(&map(json!({"type": "bundle"}))), SpecVersion::V21);
        assert_eq!(detect_spec_version(&map(json!({"type": "file"}))), SpecVersion::V20);
        assert_eq!(
            detect_spec_version(&map(json!({
                "type": "file",
                "id": "file--c27c572c-2e17-5ce1-817e-67bb97629a56",
            }))),
            SpecVersion::V21
        );
    }

    #[test]
    fn test_serialize_compact_and_pretty() {
        let obj = parse(identity(), &options()).unwrap();
        assert_eq!(
            serialize(&obj, &SerializeOptions::default()).unwrap(),
            concat!(
                r#"{"type":"identity","id":"identity--311b2d2d-f010-4473-83ec-1edf84858f4c","#,
                r#""created":"2015-12-21T19:59:11.000Z","modified":"2015-12-21T19:59:11.000Z","#,
                r#""name":"John Smith","identity_class":"individual"}"#
            )
        );
        let pretty = serialize(&obj, &SerializeOptions::pretty()).unwrap();
        assert!(pretty.starts_with("{\n    \"type\": \"identity\",\n    \"id\": "));
    }

    #[test]
    fn test_serialize_sorted_with_defaults() {
        let obj = parse(identity(), &options()).unwrap();
        let text = serialize(&obj, &SerializeOptions {
            sort_keys: true,
            include_optional_defaults: true,
            ..SerializeOptions::default()
        })
        .unwrap();
        assert!(text.starts_with(r#"{"created":"#));
        assert!(text.contains(r#""revoked":false"#));
        assert!(text.ends_with(r#""type":"identity"}"#));
    }
}
