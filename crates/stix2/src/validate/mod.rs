//! Schema-driven object construction.
//!
//! Every object, whether built through [`ObjectBuilder`](crate::ObjectBuilder),
//! parsed from JSON or produced by versioning, passes through [`build`]. The
//! routine is parameterized only by the type's field table:
//!
//! 1. Empty lists are treated as absent.
//! 2. Supplied names are split into declared properties and extras.
//! 3. Declared values are coerced in declaration order.
//! 4. Defaults fill the gaps (one construction instant per object).
//! 5. Missing required properties are reported together.
//! 6. Extras become custom properties or are reported together.
//! 7. Cross-property constraints are checked.

use std::cell::Cell;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use tracing::trace;

use crate::env::Environment;
use crate::error::{Result, StixError};
use crate::limits::{MAX_NAME_LEN, MIN_NAME_LEN};
use crate::model::id::{deterministic_uuid, format_id};
use crate::model::property::CleanContext;
use crate::model::{
    Constraint, DefaultValue, Family, ObjectType, PropertyKind, SpecVersion, StixObject, Value,
};

/// Builds an object from typed values.
///
/// `custom_properties` are accepted without `allow_custom` but may not
/// shadow declared properties.
///
/// An empty list is an absent property, declared or not, so an undeclared
/// name holding `[]` never raises `ExtraProperties`.
pub fn build(
    kind: Arc<ObjectType>,
    values: Vec<(String, Value)>,
    custom_properties: Map<String, JsonValue>,
    allow_custom: bool,
    env: &Environment,
) -> Result<StixObject> {
    let class = kind.class_name().to_string();
    let version = kind.version();
    let cx = CleanContext {
        type_name: kind.name(),
        version,
        allow_custom,
        env,
        custom_used: Cell::new(false),
    };

    for name in custom_properties.keys() {
        if kind.declares(name) {
            return Err(StixError::InvalidPropertyName {
                class,
                name: name.clone(),
                reason: "custom property name conflicts with a declared property",
            });
        }
        check_custom_name(&kind, name)?;
    }

    let mut declared = Vec::new();
    let mut extras = Vec::new();
    for (name, value) in values {
        if matches!(&value, Value::List(items) if items.is_empty()) {
            trace!(class = %class, property = %name, "dropping empty list");
            continue;
        }
        if kind.declares(&name) {
            declared.push((name, value));
        } else {
            extras.push((name, value));
        }
    }

    // Coerce supplied values into their declaration slots.
    let properties = kind.properties();
    let mut slots: Vec<Option<Value>> = vec![None; properties.len()];
    for (name, raw) in declared {
        let Some(index) = properties.iter().position(|(n, _)| *n == name) else {
            continue;
        };
        match properties[index].1.kind.clean(raw, &cx) {
            Ok(value) => slots[index] = Some(value),
            Err(reason) => {
                trace!(class = %class, property = %name, %reason, "coercion failed");
                return Err(StixError::invalid(class, name, reason));
            }
        }
    }

    fill_defaults(&kind, &mut slots, env);

    let missing: Vec<String> = properties
        .iter()
        .zip(&slots)
        .filter(|((_, prop), slot)| prop.required && slot.is_none())
        .map(|((name, _), _)| name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(StixError::MissingProperties {
            class,
            properties: missing,
        });
    }

    let mut custom = custom_properties;
    if !extras.is_empty() {
        if !allow_custom {
            return Err(StixError::ExtraProperties {
                class,
                properties: extras.into_iter().map(|(name, _)| name).collect(),
            });
        }
        for (name, value) in extras {
            check_custom_name(&kind, &name)?;
            custom.insert(name, value.to_json());
        }
    }

    let fields: Vec<(String, Value)> = properties
        .iter()
        .zip(slots)
        .filter_map(|((name, _), slot)| slot.map(|value| (name.clone(), value)))
        .collect();

    check_constraints(&kind, &fields, &custom)?;

    let has_custom = !custom.is_empty() || cx.custom_used.get();
    Ok(StixObject::from_parts(kind, fields, custom, has_custom))
}

/// Builds an object from a JSON mapping. `null` values count as absent; a
/// `custom_properties` entry is treated as explicit custom properties.
pub fn build_from_json(
    kind: Arc<ObjectType>,
    map: Map<String, JsonValue>,
    allow_custom: bool,
    env: &Environment,
) -> Result<StixObject> {
    let mut custom_properties = Map::new();
    let mut values = Vec::with_capacity(map.len());
    for (name, json) in map {
        if name == "custom_properties" {
            match json {
                JsonValue::Object(props) => custom_properties = props,
                _ => {
                    return Err(StixError::Parse(
                        "'custom_properties' must be a dictionary".to_string(),
                    ));
                }
            }
            continue;
        }
        if let Some(value) = Value::from_json(json) {
            values.push((name, value));
        }
    }
    build(kind, values, custom_properties, allow_custom, env)
}

/// Checks the name of a custom property.
///
/// STIX 2.1 names must be 3 to 250 characters of `[a-z0-9_]` starting with a
/// letter. 2.0 places no restriction.
///
/// Returns an error description if invalid, None if valid.
pub fn validate_custom_property_name(name: &str, version: SpecVersion) -> Option<&'static str> {
    if version == SpecVersion::V20 {
        return None;
    }
    if name.len() < MIN_NAME_LEN || name.len() > MAX_NAME_LEN {
        return Some("property names must be between 3 and 250 characters");
    }
    if !name.as_bytes()[0].is_ascii_lowercase() {
        return Some("property names must begin with an alpha character");
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
    {
        return Some("property names may only contain lowercase letters, digits and '_'");
    }
    None
}

fn check_custom_name(kind: &ObjectType, name: &str) -> Result<()> {
    // Unregistered types carry all their content as custom properties.
    if kind.is_generic() {
        return Ok(());
    }
    match validate_custom_property_name(name, kind.version()) {
        Some(reason) => Err(StixError::InvalidPropertyName {
            class: kind.class_name().to_string(),
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

fn fill_defaults(kind: &ObjectType, slots: &mut [Option<Value>], env: &Environment) {
    let now = env.now();
    let properties = kind.properties();
    for index in 0..properties.len() {
        if slots[index].is_some() {
            continue;
        }
        let (_, prop) = &properties[index];
        let Some(default) = prop.default else {
            continue;
        };
        let stamp = |t: crate::model::Timestamp| match &prop.kind {
            PropertyKind::Timestamp {
                precision,
                constraint,
            } => Value::Timestamp(t.with_precision(*precision, *constraint)),
            _ => Value::Timestamp(t),
        };
        let value = match default {
            DefaultValue::TypeName => Value::from(kind.name()),
            DefaultValue::SpecVersion => Value::from(kind.version().as_str()),
            DefaultValue::Now => stamp(now),
            DefaultValue::SameAsCreated => {
                let created = properties
                    .iter()
                    .position(|(n, _)| n == "created")
                    .and_then(|i| slots[i].as_ref())
                    .and_then(Value::as_timestamp);
                stamp(created.unwrap_or(now))
            }
            DefaultValue::GeneratedId => Value::String(generate_id(kind, slots, env)),
        };
        slots[index] = Some(value);
    }
}

/// Deterministic for STIX 2.1 cyber-observables with at least one
/// contributing property, random otherwise.
fn generate_id(kind: &ObjectType, slots: &[Option<Value>], env: &Environment) -> String {
    if kind.version() == SpecVersion::V21 && kind.family() == Family::Sco {
        let contributing: Map<String, JsonValue> = kind
            .properties()
            .iter()
            .zip(slots)
            .filter(|((_, prop), _)| prop.id_contributing)
            .filter_map(|((name, _), slot)| slot.as_ref().map(|v| (name.clone(), v.to_json())))
            .collect();
        if let Some(uuid) = deterministic_uuid(&contributing) {
            return format_id(kind.name(), &uuid);
        }
    }
    format_id(kind.name(), &env.next_uuid())
}

fn check_constraints(
    kind: &ObjectType,
    fields: &[(String, Value)],
    custom: &Map<String, JsonValue>,
) -> Result<()> {
    let get = |name: &str| fields.iter().find(|(n, _)| n == name).map(|(_, v)| v);

    for constraint in kind.constraints() {
        match constraint {
            Constraint::TimestampOrder {
                earlier,
                later,
                strict,
            } => {
                let (Some(first), Some(second)) = (
                    get(earlier).and_then(Value::as_timestamp),
                    get(later).and_then(Value::as_timestamp),
                ) else {
                    continue;
                };
                let violated = if *strict { second <= first } else { second < first };
                if violated {
                    let relation = if *strict {
                        "greater than"
                    } else {
                        "greater than or equal to"
                    };
                    return Err(StixError::invalid(
                        kind.class_name(),
                        *later,
                        format!("'{}' must be {} '{}'", later, relation, earlier),
                    ));
                }
            }
            Constraint::AtLeastOne(names) => {
                if !names
                    .iter()
                    .any(|name| get(name).is_some() || custom.contains_key(*name))
                {
                    return Err(StixError::AtLeastOneRequired {
                        class: kind.class_name().to_string(),
                        properties: names.iter().map(|n| n.to_string()).collect(),
                    });
                }
            }
            Constraint::StixPattern => {
                let is_stix = get("pattern_type")
                    .and_then(Value::as_str)
                    .is_none_or(|t| t == "stix");
                if let (true, Some(pattern)) = (is_stix, get("pattern").and_then(Value::as_str)) {
                    crate::pattern::create_pattern_object(pattern, kind.version()).map_err(
                        |e| StixError::invalid(kind.class_name(), "pattern", e.to_string()),
                    )?;
                }
            }
        }
    }
    Ok(())
}
