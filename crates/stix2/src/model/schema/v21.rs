//! STIX 2.1 object tables.

use crate::limits::MAX_COUNT;
use crate::model::{DefaultValue, Property, PropertyKind, SpecVersion};

use super::common::{
    bundle, dictionary, embedded, kill_chain_phases, marking_definition, props, refs, sdo,
    sdo_common, sro, strings,
};
use super::{Constraint, Family, ObjectType, observables};

const V: SpecVersion = SpecVersion::V21;
const OBSERVED_DATA: &[&str] = &["observed-data"];
const LOCATION_OR_IDENTITY: &[&str] = &["identity", "location"];
const SOFTWARE: &[&str] = &["software"];
const SAMPLES: &[&str] = &["file", "artifact"];

const OPINION_VALUES: &[&str] = &[
    "strongly-disagree",
    "disagree",
    "neutral",
    "agree",
    "strongly-agree",
];

fn name() -> (&'static str, Property) {
    ("name", Property::string().required())
}

fn description() -> (&'static str, Property) {
    ("description", Property::string())
}

fn float_between(min: f64, max: f64) -> Property {
    Property::new(PropertyKind::Float {
        min: Some(min),
        max: Some(max),
    })
}

fn seen_order() -> Constraint {
    Constraint::TimestampOrder {
        earlier: "first_seen",
        later: "last_seen",
        strict: false,
    }
}

/// Language content carries the common SDO properties but is not an SDO.
fn language_content() -> ObjectType {
    let (mut properties, tail) = sdo_common(V);
    properties.extend(props(vec![
        ("object_ref", Property::reference(None).required()),
        ("object_modified", Property::timestamp()),
        ("contents", dictionary().required()),
    ]));
    properties.extend(tail);
    ObjectType::new("language-content", "LanguageContent", V, Family::Meta, properties)
}

pub(super) fn types() -> Vec<ObjectType> {
    let mut types = vec![
        sdo("attack-pattern", "AttackPattern", V, vec![
            name(),
            description(),
            ("aliases", strings()),
            ("kill_chain_phases", kill_chain_phases()),
        ]),
        sdo("campaign", "Campaign", V, vec![
            name(),
            description(),
            ("aliases", strings()),
            ("first_seen", Property::timestamp()),
            ("last_seen", Property::timestamp()),
            ("objective", Property::string()),
        ])
        .with_constraints(vec![seen_order()]),
        sdo("course-of-action", "CourseOfAction", V, vec![name(), description()]),
        sdo("grouping", "Grouping", V, vec![
            ("name", Property::string()),
            description(),
            ("context", Property::string().required()),
            ("object_refs", refs(None).required()),
        ]),
        sdo("identity", "Identity", V, vec![
            name(),
            description(),
            ("roles", strings()),
            ("identity_class", Property::string()),
            ("sectors", strings()),
            ("contact_information", Property::string()),
        ]),
        sdo("indicator", "Indicator", V, vec![
            ("name", Property::string()),
            description(),
            ("indicator_types", strings()),
            ("pattern", Property::string().required()),
            ("pattern_type", Property::string().required()),
            ("pattern_version", Property::string()),
            ("valid_from", Property::timestamp().with_default(DefaultValue::Now)),
            ("valid_until", Property::timestamp()),
            ("kill_chain_phases", kill_chain_phases()),
        ])
        .with_constraints(vec![
            Constraint::TimestampOrder {
                earlier: "valid_from",
                later: "valid_until",
                strict: true,
            },
            Constraint::StixPattern,
        ]),
        sdo("infrastructure", "Infrastructure", V, vec![
            name(),
            description(),
            ("infrastructure_types", strings()),
            ("aliases", strings()),
            ("kill_chain_phases", kill_chain_phases()),
            ("first_seen", Property::timestamp()),
            ("last_seen", Property::timestamp()),
        ])
        .with_constraints(vec![seen_order()]),
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
        ])
        .with_constraints(vec![seen_order()]),
        sdo("location", "Location", V, vec![
            ("name", Property::string()),
            description(),
            ("latitude", float_between(-90.0, 90.0)),
            ("longitude", float_between(-180.0, 180.0)),
            ("precision", float_between(0.0, f64::MAX)),
            ("region", Property::string()),
            ("country", Property::string()),
            ("administrative_area", Property::string()),
            ("city", Property::string()),
            ("street_address", Property::string()),
            ("postal_code", Property::string()),
        ])
        .with_constraints(vec![Constraint::AtLeastOne(&["region", "country", "latitude"])]),
        sdo("malware", "Malware", V, vec![
            ("name", Property::string()),
            description(),
            ("malware_types", strings()),
            ("is_family", Property::boolean().required()),
            ("aliases", strings()),
            ("kill_chain_phases", kill_chain_phases()),
            ("first_seen", Property::timestamp()),
            ("last_seen", Property::timestamp()),
            ("operating_system_refs", refs(Some(SOFTWARE))),
            ("architecture_execution_envs", strings()),
            ("implementation_languages", strings()),
            ("capabilities", strings()),
            ("sample_refs", refs(Some(SAMPLES))),
        ])
        .with_constraints(vec![seen_order()]),
        sdo("malware-analysis", "MalwareAnalysis", V, vec![
            ("product", Property::string().required()),
            ("version", Property::string()),
            ("host_vm_ref", Property::reference(Some(SOFTWARE))),
            ("operating_system_ref", Property::reference(Some(SOFTWARE))),
            ("installed_software_refs", refs(Some(SOFTWARE))),
            ("configuration_version", Property::string()),
            ("modules", strings()),
            ("analysis_engine_version", Property::string()),
            ("analysis_definition_version", Property::string()),
            ("submitted", Property::timestamp()),
            ("analysis_started", Property::timestamp()),
            ("analysis_ended", Property::timestamp()),
            ("result_name", Property::string()),
            ("result", Property::string()),
            ("analysis_sco_refs", refs(None)),
            ("sample_ref", Property::reference(None)),
        ])
        .with_constraints(vec![Constraint::AtLeastOne(&["result", "analysis_sco_refs"])]),
        sdo("note", "Note", V, vec![
            ("abstract", Property::string()),
            ("content", Property::string().required()),
            ("authors", strings()),
            ("object_refs", refs(None).required()),
        ]),
        sdo("observed-data", "ObservedData", V, vec![
            ("first_observed", Property::timestamp().required()),
            ("last_observed", Property::timestamp().required()),
            ("number_observed", Property::integer_between(1, MAX_COUNT).required()),
            ("objects", Property::new(PropertyKind::Observables)),
            ("object_refs", refs(None)),
        ])
        .with_constraints(vec![
            Constraint::TimestampOrder {
                earlier: "first_observed",
                later: "last_observed",
                strict: false,
            },
            Constraint::AtLeastOne(&["objects", "object_refs"]),
        ]),
        sdo("opinion", "Opinion", V, vec![
            ("explanation", Property::string()),
            ("authors", strings()),
            ("opinion", Property::new(PropertyKind::Enum(OPINION_VALUES)).required()),
            ("object_refs", refs(None).required()),
        ]),
        sdo("report", "Report", V, vec![
            name(),
            description(),
            ("report_types", strings()),
            ("published", Property::timestamp().required()),
            ("object_refs", refs(None).required()),
        ]),
        sdo("threat-actor", "ThreatActor", V, vec![
            name(),
            description(),
            ("threat_actor_types", strings()),
            ("aliases", strings()),
            ("first_seen", Property::timestamp()),
            ("last_seen", Property::timestamp()),
            ("roles", strings()),
            ("goals", strings()),
            ("sophistication", Property::string()),
            ("resource_level", Property::string()),
            ("primary_motivation", Property::string()),
            ("secondary_motivations", strings()),
            ("personal_motivations", strings()),
        ])
        .with_constraints(vec![seen_order()]),
        sdo("tool", "Tool", V, vec![
            name(),
            description(),
            ("tool_types", strings()),
            ("aliases", strings()),
            ("kill_chain_phases", kill_chain_phases()),
            ("tool_version", Property::string()),
        ]),
        sdo("vulnerability", "Vulnerability", V, vec![name(), description()]),
        sro("relationship", "Relationship", V, vec![
            ("relationship_type", Property::string().required()),
            description(),
            ("source_ref", Property::reference(None).required()),
            ("target_ref", Property::reference(None).required()),
            ("start_time", Property::timestamp()),
            ("stop_time", Property::timestamp()),
        ])
        .with_constraints(vec![Constraint::TimestampOrder {
            earlier: "start_time",
            later: "stop_time",
            strict: true,
        }]),
        sro("sighting", "Sighting", V, vec![
            description(),
            ("first_seen", Property::timestamp()),
            ("last_seen", Property::timestamp()),
            ("count", Property::integer_between(0, MAX_COUNT)),
            ("sighting_of_ref", Property::reference(None).required()),
            ("observed_data_refs", refs(Some(OBSERVED_DATA))),
            ("where_sighted_refs", refs(Some(LOCATION_OR_IDENTITY))),
            ("summary", Property::boolean()),
        ])
        .with_constraints(vec![seen_order()]),
        language_content(),
        marking_definition(V),
        bundle(V),
    ];
    types.extend(embedded(V));
    types.extend(observables::types(V));
    types
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(name: &str) -> ObjectType {
        types().into_iter().find(|t| t.name() == name).unwrap()
    }

    #[test]
    fn test_v21_declaration_order() {
        let campaign = find("campaign");
        let names: Vec<&str> = campaign.properties().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(&names[..6], &[
            "type",
            "spec_version",
            "id",
            "created_by_ref",
            "created",
            "modified"
        ]);
        assert_eq!(names[6], "name");
        assert_eq!(names.last(), Some(&"extensions"));
    }

    #[test]
    fn test_v21_labels_optional() {
        assert!(!find("report").property("labels").unwrap().required);
        assert!(find("malware").property("is_family").unwrap().required);
    }

    #[test]
    fn test_v21_includes_identity_where_sighted() {
        let sighting = find("sighting");
        assert_eq!(
            sighting.property("where_sighted_refs").unwrap().kind,
            PropertyKind::List(Box::new(PropertyKind::Reference {
                valid_types: Some(LOCATION_OR_IDENTITY)
            }))
        );
        assert!(super::super::common::IDENTITY.iter().all(|t| LOCATION_OR_IDENTITY.contains(t)));
    }
}
