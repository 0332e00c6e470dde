//! Property sets shared by many object types.

use crate::model::timestamp::{Precision, PrecisionConstraint};
use crate::model::{DefaultValue, Property, PropertyKind, SpecVersion};

use super::{Constraint, Family, ObjectType};

pub(super) const IDENTITY: &[&str] = &["identity"];
pub(super) const MARKING: &[&str] = &["marking-definition"];

pub(super) fn props(list: Vec<(&str, Property)>) -> Vec<(String, Property)> {
    list.into_iter().map(|(n, p)| (n.to_string(), p)).collect()
}

pub(super) fn type_property() -> Property {
    Property::new(PropertyKind::Type)
        .required()
        .with_default(DefaultValue::TypeName)
}

pub(super) fn spec_version_property() -> Property {
    Property::new(PropertyKind::SpecVersion).with_default(DefaultValue::SpecVersion)
}

pub(super) fn id_property() -> Property {
    Property::new(PropertyKind::Id)
        .required()
        .with_default(DefaultValue::GeneratedId)
}

/// `created`/`modified` precision: millisecond-exact in 2.0, at least
/// millisecond in 2.1.
pub(super) fn versioning_timestamp(version: SpecVersion) -> PropertyKind {
    PropertyKind::Timestamp {
        precision: Precision::Millisecond,
        constraint: match version {
            SpecVersion::V20 => PrecisionConstraint::Exact,
            SpecVersion::V21 => PrecisionConstraint::Min,
        },
    }
}

pub(super) fn created(version: SpecVersion) -> Property {
    Property::new(versioning_timestamp(version))
        .required()
        .with_default(DefaultValue::Now)
}

pub(super) fn modified(version: SpecVersion) -> Property {
    Property::new(versioning_timestamp(version))
        .required()
        .with_default(DefaultValue::SameAsCreated)
}

pub(super) fn strings() -> Property {
    Property::list(PropertyKind::String)
}

pub(super) fn refs(valid_types: Option<&'static [&'static str]>) -> Property {
    Property::list(PropertyKind::Reference { valid_types })
}

pub(super) fn kill_chain_phases() -> Property {
    Property::list(PropertyKind::Embedded("kill-chain-phase"))
}

pub(super) fn hashes() -> Property {
    Property::new(PropertyKind::Hashes)
}

pub(super) fn dictionary() -> Property {
    Property::new(PropertyKind::Dictionary)
}

fn marking_tail(version: SpecVersion) -> Vec<(&'static str, Property)> {
    let mut tail = vec![
        (
            "external_references",
            Property::list(PropertyKind::Embedded("external-reference")),
        ),
        ("object_marking_refs", refs(Some(MARKING))),
        (
            "granular_markings",
            Property::list(PropertyKind::Embedded("granular-marking")),
        ),
    ];
    if version == SpecVersion::V21 {
        tail.push(("extensions", dictionary()));
    }
    tail
}

/// Properties preceding and following the type-specific ones on every
/// SDO and SRO.
pub(crate) fn sdo_common(
    version: SpecVersion,
) -> (Vec<(String, Property)>, Vec<(String, Property)>) {
    let mut head = vec![("type", type_property())];
    if version == SpecVersion::V21 {
        head.push(("spec_version", spec_version_property()));
    }
    head.extend([
        ("id", id_property()),
        ("created_by_ref", Property::reference(Some(IDENTITY))),
        ("created", created(version)),
        ("modified", modified(version)),
    ]);

    let mut tail = vec![
        ("revoked", Property::boolean().with_optional_default(false)),
        ("labels", strings()),
    ];
    if version == SpecVersion::V21 {
        tail.push(("confidence", Property::integer_between(0, 100)));
        tail.push(("lang", Property::string()));
    }
    tail.extend(marking_tail(version));

    (props(head), props(tail))
}

fn with_common(
    family: Family,
    name: &str,
    class_name: &str,
    version: SpecVersion,
    specific: Vec<(&str, Property)>,
) -> ObjectType {
    let (mut properties, tail) = sdo_common(version);
    properties.extend(props(specific));
    properties.extend(tail);
    ObjectType::new(name, class_name, version, family, properties)
        .with_constraints(vec![Constraint::TimestampOrder {
            earlier: "created",
            later: "modified",
            strict: false,
        }])
}

pub(super) fn sdo(
    name: &str,
    class_name: &str,
    version: SpecVersion,
    specific: Vec<(&str, Property)>,
) -> ObjectType {
    with_common(Family::Sdo, name, class_name, version, specific)
}

pub(super) fn sro(
    name: &str,
    class_name: &str,
    version: SpecVersion,
    specific: Vec<(&str, Property)>,
) -> ObjectType {
    with_common(Family::Sro, name, class_name, version, specific)
}

/// Properties preceding and following the type-specific ones on every
/// cyber-observable. 2.0 observables carry no identifier.
pub(crate) fn sco_common(
    version: SpecVersion,
) -> (Vec<(String, Property)>, Vec<(String, Property)>) {
    match version {
        SpecVersion::V20 => (
            props(vec![("type", type_property())]),
            props(vec![("extensions", dictionary())]),
        ),
        SpecVersion::V21 => (
            props(vec![
                ("type", type_property()),
                ("spec_version", spec_version_property()),
                ("id", id_property()),
            ]),
            props(vec![
                ("object_marking_refs", refs(Some(MARKING))),
                (
                    "granular_markings",
                    Property::list(PropertyKind::Embedded("granular-marking")),
                ),
                ("defanged", Property::boolean().with_optional_default(false)),
                ("extensions", dictionary()),
            ]),
        ),
    }
}

pub(super) fn sco(
    name: &str,
    class_name: &str,
    version: SpecVersion,
    specific: Vec<(&str, Property)>,
) -> ObjectType {
    let (mut properties, tail) = sco_common(version);
    properties.extend(props(specific));
    properties.extend(tail);
    ObjectType::new(name, class_name, version, Family::Sco, properties)
}

/// Marking definitions: no `modified`, not versionable.
pub(super) fn marking_definition(version: SpecVersion) -> ObjectType {
    let mut head = vec![("type", type_property())];
    if version == SpecVersion::V21 {
        head.push(("spec_version", spec_version_property()));
    }
    head.extend([
        ("id", id_property()),
        ("created_by_ref", Property::reference(Some(IDENTITY))),
        ("created", created(version)),
    ]);
    head.extend(marking_tail(version));
    match version {
        SpecVersion::V20 => head.extend([
            ("definition_type", Property::string().required()),
            ("definition", dictionary().required()),
        ]),
        SpecVersion::V21 => head.extend([
            ("name", Property::string()),
            ("definition_type", Property::string()),
            ("definition", dictionary()),
        ]),
    }
    ObjectType::new(
        "marking-definition",
        "MarkingDefinition",
        version,
        Family::Marking,
        props(head),
    )
}

pub(super) fn bundle(version: SpecVersion) -> ObjectType {
    let mut list = vec![("type", type_property()), ("id", id_property())];
    if version == SpecVersion::V20 {
        list.push(("spec_version", spec_version_property()));
    }
    list.push(("objects", Property::new(PropertyKind::BundleObjects)));
    ObjectType::new("bundle", "Bundle", version, Family::Meta, props(list))
}

/// External references, kill chain phases and granular markings.
pub(super) fn embedded(version: SpecVersion) -> Vec<ObjectType> {
    let mut external_reference = ObjectType::new(
        "external-reference",
        "ExternalReference",
        version,
        Family::Embedded,
        props(vec![
            ("source_name", Property::string().required()),
            ("description", Property::string()),
            ("url", Property::string()),
            ("hashes", hashes()),
            ("external_id", Property::string()),
        ]),
    );
    if version == SpecVersion::V21 {
        external_reference = external_reference.with_constraints(vec![Constraint::AtLeastOne(&[
            "description",
            "external_id",
            "url",
        ])]);
    }

    let kill_chain_phase = ObjectType::new(
        "kill-chain-phase",
        "KillChainPhase",
        version,
        Family::Embedded,
        props(vec![
            ("kill_chain_name", Property::string().required()),
            ("phase_name", Property::string().required()),
        ]),
    );

    let granular_marking = match version {
        SpecVersion::V20 => props(vec![
            ("marking_ref", Property::reference(Some(MARKING)).required()),
            ("selectors", strings().required()),
        ]),
        SpecVersion::V21 => props(vec![
            ("lang", Property::string()),
            ("marking_ref", Property::reference(Some(MARKING))),
            ("selectors", strings().required()),
        ]),
    };
    let granular_marking = ObjectType::new(
        "granular-marking",
        "GranularMarking",
        version,
        Family::Embedded,
        granular_marking,
    );

    vec![external_reference, kill_chain_phase, granular_marking]
}
