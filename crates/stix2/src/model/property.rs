//! Property descriptors.
//!
//! A [`Property`] declares how one named attribute of an object type is
//! coerced, whether it is required, how it is defaulted and whether it
//! contributes to deterministic identifiers. Descriptors are plain data;
//! [`crate::validate`] applies them uniformly.

use std::cell::Cell;

use serde_json::{Map, Value as JsonValue};

use crate::env::Environment;
use crate::limits::{DICT_KEY_LEN_V20, DICT_KEY_LEN_V21};
use crate::model::id::validate_id;
use crate::model::timestamp::{Precision, PrecisionConstraint};
use crate::model::{Family, SpecVersion, Timestamp, Value, registry};
use crate::pattern::constant::{HashCheck, check_hash, parse_boolean};

/// The coercion rule of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    String,
    /// Fixed to the owning object's type name.
    Type,
    /// `<type>--<uuid>` where `<type>` is the owning type.
    Id,
    /// Fixed to the owning object's spec version.
    SpecVersion,
    Integer {
        min: Option<i64>,
        max: Option<i64>,
    },
    Float {
        min: Option<f64>,
        max: Option<f64>,
    },
    Boolean,
    Timestamp {
        precision: Precision,
        constraint: PrecisionConstraint,
    },
    List(Box<PropertyKind>),
    /// Closed vocabulary.
    Enum(&'static [&'static str]),
    /// Hash algorithm name to hash value.
    Hashes,
    Dictionary,
    /// Identifier of another object, optionally limited to some types.
    Reference {
        valid_types: Option<&'static [&'static str]>,
    },
    /// An embedded object of the named registered type.
    Embedded(&'static str),
    /// STIX 2.0 observed-data `objects` map.
    Observables,
    /// Bundle contents.
    BundleObjects,
}

/// How a missing property is filled in at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    /// The construction instant.
    Now,
    /// The `created` value when present, else the construction instant.
    SameAsCreated,
    /// Deterministic or random identifier.
    GeneratedId,
    TypeName,
    SpecVersion,
}

/// A property descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub kind: PropertyKind,
    pub required: bool,
    pub default: Option<DefaultValue>,
    /// Emitted only when serializing with optional defaults.
    pub optional_default: Option<Value>,
    pub id_contributing: bool,
}

impl Property {
    pub fn new(kind: PropertyKind) -> Self {
        Property {
            kind,
            required: false,
            default: None,
            optional_default: None,
            id_contributing: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_optional_default(mut self, value: impl Into<Value>) -> Self {
        self.optional_default = Some(value.into());
        self
    }

    pub fn id_contributing(mut self) -> Self {
        self.id_contributing = true;
        self
    }

    pub fn string() -> Self {
        Property::new(PropertyKind::String)
    }

    pub fn integer() -> Self {
        Property::new(PropertyKind::Integer {
            min: None,
            max: None,
        })
    }

    pub fn integer_between(min: i64, max: i64) -> Self {
        Property::new(PropertyKind::Integer {
            min: Some(min),
            max: Some(max),
        })
    }

    pub fn float() -> Self {
        Property::new(PropertyKind::Float {
            min: None,
            max: None,
        })
    }

    pub fn boolean() -> Self {
        Property::new(PropertyKind::Boolean)
    }

    /// A timestamp rendered with as much precision as it carries.
    pub fn timestamp() -> Self {
        Property::new(PropertyKind::Timestamp {
            precision: Precision::Any,
            constraint: PrecisionConstraint::Exact,
        })
    }

    pub fn list(kind: PropertyKind) -> Self {
        Property::new(PropertyKind::List(Box::new(kind)))
    }

    pub fn reference(valid_types: Option<&'static [&'static str]>) -> Self {
        Property::new(PropertyKind::Reference { valid_types })
    }

    pub fn embedded(type_name: &'static str) -> Self {
        Property::new(PropertyKind::Embedded(type_name))
    }
}

/// Per-construction state shared by all coercions.
pub(crate) struct CleanContext<'a> {
    pub(crate) type_name: &'a str,
    pub(crate) version: SpecVersion,
    pub(crate) allow_custom: bool,
    pub(crate) env: &'a Environment,
    /// Set when custom content was accepted under the allowance.
    pub(crate) custom_used: Cell<bool>,
}

impl CleanContext<'_> {
    fn accept_custom(&self) -> bool {
        if self.allow_custom {
            self.custom_used.set(true);
        }
        self.allow_custom
    }
}

impl PropertyKind {
    /// Coerces a raw value into canonical form, or returns the reason it is
    /// invalid.
    pub(crate) fn clean(&self, value: Value, cx: &CleanContext<'_>) -> Result<Value, String> {
        match self {
            PropertyKind::String => match value {
                Value::String(s) => Ok(Value::String(s)),
                other => Err(format!("must be a string, not a {}.", other.kind_name())),
            },
            PropertyKind::Type => match value {
                Value::String(s) if s == cx.type_name => Ok(Value::String(s)),
                _ => Err(format!("must equal '{}'.", cx.type_name)),
            },
            PropertyKind::SpecVersion => match value {
                Value::String(s) if s == cx.version.as_str() => Ok(Value::String(s)),
                _ => Err(format!("must equal '{}'.", cx.version)),
            },
            PropertyKind::Id => match value {
                Value::String(s) => {
                    validate_id(&s, cx.version, Some(cx.type_name))?;
                    Ok(Value::String(s))
                }
                _ => Err(format!("must start with '{}--'.", cx.type_name)),
            },
            PropertyKind::Integer { min, max } => {
                let n = match value {
                    Value::Integer(n) => n,
                    Value::Float(f) => float_to_integer(f)?,
                    Value::String(s) => s
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| "must be an integer.".to_string())?,
                    _ => return Err("must be an integer.".to_string()),
                };
                if let Some(min) = min {
                    if n < *min {
                        return Err(format!("minimum value is {}. received {}", min, n));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        return Err(format!("maximum value is {}. received {}", max, n));
                    }
                }
                Ok(Value::Integer(n))
            }
            PropertyKind::Float { min, max } => {
                let f = match value {
                    Value::Float(f) => f,
                    Value::Integer(n) => n as f64,
                    Value::String(s) => s
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| "must be a float.".to_string())?,
                    _ => return Err("must be a float.".to_string()),
                };
                if let Some(reason) = Value::Float(f).validate() {
                    return Err(reason.to_string());
                }
                if let Some(min) = min {
                    if f < *min {
                        return Err(format!("minimum value is {}. received {}", min, f));
                    }
                }
                if let Some(max) = max {
                    if f > *max {
                        return Err(format!("maximum value is {}. received {}", max, f));
                    }
                }
                Ok(Value::Float(f))
            }
            PropertyKind::Boolean => match value {
                Value::Bool(b) => Ok(Value::Bool(b)),
                Value::String(s) => parse_boolean(&s)
                    .map(Value::Bool)
                    .ok_or_else(|| "must be a boolean value.".to_string()),
                Value::Integer(1) => Ok(Value::Bool(true)),
                Value::Integer(0) => Ok(Value::Bool(false)),
                _ => Err("must be a boolean value.".to_string()),
            },
            PropertyKind::Timestamp {
                precision,
                constraint,
            } => match value {
                Value::Timestamp(t) => Ok(Value::Timestamp(t.with_precision(*precision, *constraint))),
                Value::String(s) => Timestamp::parse_with(&s, *precision, *constraint)
                    .map(Value::Timestamp)
                    .map_err(|e| e.to_string()),
                other => Err(format!("must be a timestamp, not a {}.", other.kind_name())),
            },
            PropertyKind::List(inner) => {
                let items = match value {
                    Value::List(items) => items,
                    single @ (Value::String(_) | Value::Object(_)) => vec![single],
                    _ => return Err("must be an iterable.".to_string()),
                };
                if items.is_empty() {
                    return Err("must not be empty.".to_string());
                }
                items.into_iter().map(|item| inner.clean(item, cx)).collect::<Result<Vec<_>, _>>().map(Value::List)
            }
            PropertyKind::Enum(allowed) => match value {
                Value::String(s) if allowed.contains(&s.as_str()) => Ok(Value::String(s)),
                _ => Err(format!(
                    "value is not valid for this property, must be one of: {}.",
                    allowed.join(", ")
                )),
            },
            PropertyKind::Hashes => {
                let map = expect_dict(value)?;
                for (algorithm, hash) in &map {
                    let JsonValue::String(hash) = hash else {
                        return Err(format!("hash value for '{}' must be a string.", algorithm));
                    };
                    match check_hash(algorithm, hash) {
                        HashCheck::Valid => {}
                        HashCheck::Invalid(name) => {
                            return Err(format!("'{}' is not a valid {} hash", hash, name));
                        }
                        HashCheck::Unknown => {
                            if !cx.accept_custom() {
                                return Err(format!(
                                    "'{}' is not a recognized hash algorithm.",
                                    algorithm
                                ));
                            }
                        }
                    }
                }
                Ok(Value::Dict(map))
            }
            PropertyKind::Dictionary => {
                let map = expect_dict(value)?;
                let (min, max) = match cx.version {
                    SpecVersion::V20 => DICT_KEY_LEN_V20,
                    SpecVersion::V21 => DICT_KEY_LEN_V21,
                };
                for key in map.keys() {
                    if key.len() < min || key.len() > max {
                        return Err(format!(
                            "Invalid dictionary key {}: (length must be between {} and {}).",
                            key, min, max
                        ));
                    }
                    if !key
                        .bytes()
                        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
                    {
                        return Err(format!(
                            "Invalid dictionary key {}: (must contain only letters, digits, '_' and '-').",
                            key
                        ));
                    }
                }
                Ok(Value::Dict(map))
            }
            PropertyKind::Reference { valid_types } => clean_reference(value, *valid_types, cx),
            PropertyKind::Embedded(type_name) => match value {
                Value::Object(obj) if obj.type_name() == *type_name => Ok(Value::Object(obj)),
                Value::Dict(map) => {
                    let kind = registry::lookup(cx.version, type_name)
                        .ok_or_else(|| format!("no embedded type '{}' is registered.", type_name))?;
                    crate::validate::build_from_json(kind, map, cx.allow_custom, cx.env)
                        .map(|obj| Value::Object(Box::new(obj)))
                        .map_err(|e| e.to_string())
                }
                _ => Err(format!("must be a dictionary or a {} object.", type_name)),
            },
            PropertyKind::Observables => {
                let map = expect_dict(value)?;
                let mut cleaned = Map::new();
                for (key, entry) in map {
                    let JsonValue::Object(fields) = entry else {
                        return Err(format!("observable '{}' must be a dictionary.", key));
                    };
                    let Some(type_name) = fields.get("type").and_then(JsonValue::as_str) else {
                        return Err(format!("observable '{}' has no 'type' property.", key));
                    };
                    let entry = match registry::lookup(cx.version, type_name) {
                        Some(kind) if kind.family() == Family::Sco => {
                            crate::validate::build_from_json(kind, fields, cx.allow_custom, cx.env)
                                .map_err(|e| e.to_string())?
                                .to_json()
                        }
                        _ if cx.accept_custom() => JsonValue::Object(fields),
                        _ => {
                            return Err(format!(
                                "Can't parse unknown observable type '{}'!",
                                type_name
                            ));
                        }
                    };
                    cleaned.insert(key, entry);
                }
                Ok(Value::Dict(cleaned))
            }
            PropertyKind::BundleObjects => {
                let Value::List(items) = value else {
                    return Err("must be a list of STIX objects.".to_string());
                };
                let options = crate::codec::ParseOptions {
                    version: Some(cx.version),
                    allow_custom: cx.allow_custom,
                    env: cx.env.clone(),
                };
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(obj) => Ok(Value::Object(obj)),
                        Value::Dict(map) => crate::codec::dict_to_stix(map, &options)
                            .map(|obj| Value::Object(Box::new(obj)))
                            .map_err(|e| e.to_string()),
                        other => Err(format!("cannot parse a {} as a STIX object.", other.kind_name())),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List)
            }
        }
    }
}

/// Accepts a float only when it is integral and inside the `i64` range.
fn float_to_integer(f: f64) -> Result<i64, String> {
    // 2^63 is exact as f64; `i64::MAX as f64` rounds up to it.
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if !f.is_finite() || f.fract() != 0.0 || f < -BOUND || f >= BOUND {
        return Err("must be an integer.".to_string());
    }
    Ok(f as i64)
}

fn expect_dict(value: Value) -> Result<Map<String, JsonValue>, String> {
    let map = match value {
        Value::Dict(map) => map,
        Value::Object(obj) => match obj.to_json() {
            JsonValue::Object(map) => map,
            _ => return Err("must be a dictionary.".to_string()),
        },
        _ => return Err("must be a dictionary.".to_string()),
    };
    if map.is_empty() {
        return Err("must not be empty.".to_string());
    }
    Ok(map)
}

fn clean_reference(
    value: Value,
    valid_types: Option<&'static [&'static str]>,
    cx: &CleanContext<'_>,
) -> Result<Value, String> {
    let id = match value {
        Value::String(s) => s,
        Value::Object(obj) => match obj.id() {
            Some(id) => id.to_string(),
            None => return Err("referenced object has no 'id'.".to_string()),
        },
        other => return Err(format!("must be an identifier, not a {}.", other.kind_name())),
    };

    let (type_name, _) = match validate_id(&id, cx.version, None) {
        Ok(parts) => parts,
        // Malformed references survive verbatim under the custom allowance.
        Err(_) if cx.accept_custom() => return Ok(Value::String(id)),
        Err(reason) => return Err(reason),
    };

    match valid_types {
        Some(valid) if !valid.contains(&type_name.as_str()) => Err(format!(
            "The type-specifying prefix '{}' for this property is not valid",
            type_name
        )),
        None if !registry::is_registered(cx.version, &type_name) && !cx.accept_custom() => {
            Err(format!(
                "The type-specifying prefix '{}' for this property is not one of the recognized STIX types",
                type_name
            ))
        }
        _ => Ok(Value::String(id)),
    }
}
