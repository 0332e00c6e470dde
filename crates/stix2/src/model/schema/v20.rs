//! STIX 2.0 object tables.

use crate::limits::MAX_COUNT;
use crate::model::{DefaultValue, Property, PropertyKind, SpecVersion};

use super::common::{
    IDENTITY, bundle, embedded, kill_chain_phases, marking_definition, refs, sdo, sro, strings,
};
use super::{Constraint, ObjectType, observables};

const V: SpecVersion = SpecVersion::V20;
const OBSERVED_DATA: &[&str] = &["observed-data"];

fn name() -> (&'static str, Property) {
    ("name", Property::string().required())
}

fn description() -> (&'static str, Property) {
    ("description", Property::string())
}

pub(super) fn types() -> Vec<ObjectType> {
    let mut types = vec![
        sdo("attack-pattern", "AttackPattern", V, vec![
            name(),
            description(),
            ("kill_chain_phases", kill_chain_phases()),
        ]),
        sdo("campaign", "Campaign", V, vec![
            name(),
            description(),
            ("aliases", strings()),
            ("first_seen", Property::timestamp()),
            ("last_seen", Property::timestamp()),
            ("objective", Property::string()),
        ]),
        sdo("course-of-action", "CourseOfAction", V, vec![name(), description()]),
        sdo("identity", "Identity", V, vec![
            name(),
            description(),
            ("identity_class", Property::string().required()),
            ("sectors", strings()),
            ("contact_information", Property::string()),
        ]),
        sdo("indicator", "Indicator", V, vec![
            ("name", Property::string()),
            description(),
            ("pattern", Property::string().required()),
            ("valid_from", Property::timestamp().with_default(DefaultValue::Now)),
            ("valid_until", Property::timestamp()),
            ("kill_chain_phases", kill_chain_phases()),
        ])
        .require("labels")
        .with_constraints(vec![
            Constraint::TimestampOrder {
                earlier: "valid_from",
                later: "valid_until",
                strict: true,
            },
            Constraint::StixPattern,
        ]),
        sdo("intrusion-set", "IntrusionSet", V, vec![
            name(),
            description(),
            ("aliases", strings()),
            ("first_seen", Property::timestamp()),
            ("last_seen", Property::timestamp()),
            ("goals", strings()),
            ("resource_level", Property::string()),
            ("primary_motivation", Property::string()),
            ("secondary_motivations", strings()),
        ]),
        sdo("malware", "Malware", V, vec![
            name(),
            description(),
            ("kill_chain_phases", kill_chain_phases()),
        ])
        .require("labels"),
        sdo("observed-data", "ObservedData", V, vec![
            ("first_observed", Property::timestamp().required()),
            ("last_observed", Property::timestamp().required()),
            ("number_observed", Property::integer_between(1, MAX_COUNT).required()),
            ("objects", Property::new(PropertyKind::Observables).required()),
        ])
        .with_constraints(vec![Constraint::TimestampOrder {
            earlier: "first_observed",
            later: "last_observed",
            strict: false,
        }]),
        sdo("report", "Report", V, vec![
            name(),
            description(),
            ("published", Property::timestamp().required()),
            ("object_refs", refs(None).required()),
        ])
        .require("labels"),
        sdo("threat-actor", "ThreatActor", V, vec![
            name(),
            description(),
            ("aliases", strings()),
            ("roles", strings()),
            ("goals", strings()),
            ("sophistication", Property::string()),
            ("resource_level", Property::string()),
            ("primary_motivation", Property::string()),
            ("secondary_motivations", strings()),
            ("personal_motivations", strings()),
        ])
        .require("labels"),
        sdo("tool", "Tool", V, vec![
            name(),
            description(),
            ("kill_chain_phases", kill_chain_phases()),
            ("tool_version", Property::string()),
        ])
        .require("labels"),
        sdo("vulnerability", "Vulnerability", V, vec![name(), description()]),
        sro("relationship", "Relationship", V, vec![
            ("relationship_type", Property::string().required()),
            description(),
            ("source_ref", Property::reference(None).required()),
            ("target_ref", Property::reference(None).required()),
        ]),
        sro("sighting", "Sighting", V, vec![
            ("first_seen", Property::timestamp()),
            ("last_seen", Property::timestamp()),
            ("count", Property::integer_between(0, MAX_COUNT)),
            ("sighting_of_ref", Property::reference(None).required()),
            ("observed_data_refs", refs(Some(OBSERVED_DATA))),
            ("where_sighted_refs", refs(Some(IDENTITY))),
            ("summary", Property::boolean()),
        ])
        .with_constraints(vec![Constraint::TimestampOrder {
            earlier: "first_seen",
            later: "last_seen",
            strict: false,
        }]),
        marking_definition(V),
        bundle(V),
    ];
    types.extend(embedded(V));
    types.extend(observables::types(V));
    types
}
