//! STIX 2.0 construction, parsing and serialization.

use serde_json::json;
use stix2::codec::{ParseOptions, parse};
use stix2::{ObjectBuilder, SerializeOptions, SpecVersion, StixError, Value, is_sdo, is_sro};

const IDENTITY_ID: &str = "identity--311b2d2d-f010-4473-83ec-1edf84858f4c";
const MALWARE_ID: &str = "malware--9c4638ec-f1de-4ddb-abf4-1b760417654e";
const REPORT_ID: &str = "report--84e4d88f-44ea-4bcd-bbf3-b2c1c320bcb3";

fn v20() -> ParseOptions {
    ParseOptions::new().version(SpecVersion::V20)
}

fn report(object_refs: serde_json::Value) -> serde_json::Value {
    json!({
        "type": "report",
        "id": REPORT_ID,
        "created_by_ref": IDENTITY_ID,
        "created": "2015-12-21T19:59:11.000Z",
        "modified": "2015-12-21T19:59:11.000Z",
        "name": "The Black Vine Cyberespionage Group",
        "published": "2016-01-20T17:00:00Z",
        "labels": ["campaign"],
        "object_refs": object_refs,
    })
}

#[test]
fn test_report_roundtrip() {
    let obj = parse(report(json!([MALWARE_ID])), &v20()).unwrap();
    assert_eq!(obj.spec_version(), SpecVersion::V20);
    assert!(is_sdo(&obj, SpecVersion::V20));
    assert!(!obj.contains_key("spec_version"));

    let text = obj.serialize(&SerializeOptions::default()).unwrap();
    assert!(text.starts_with(&format!(r#"{{"type":"report","id":"{}","#, REPORT_ID)));
    assert!(text.contains(r#""published":"2016-01-20T17:00:00Z""#));

    let reparsed = parse(text.as_str(), &v20()).unwrap();
    assert_eq!(reparsed, obj);
}

#[test]
fn test_report_malformed_refs() {
    let refs = json!(["campaign-83422c77-904c-4dc1-aff5-5c38f3a2c55c", MALWARE_ID]);
    let err = parse(report(refs.clone()), &v20()).unwrap_err();
    match err {
        StixError::InvalidValue { class, property, .. } => {
            assert_eq!(class, "Report");
            assert_eq!(property, "object_refs");
        }
        other => panic!("unexpected error: {other}"),
    }

    let lenient = parse(report(refs.clone()), &v20().allow_custom(true)).unwrap();
    assert_eq!(lenient.get("object_refs").unwrap().to_json(), refs);
    assert!(lenient.has_custom());
}

#[test]
fn test_labels_required_in_v20() {
    let err = ObjectBuilder::new("malware", SpecVersion::V20)
        .property("name", "Cryptolocker")
        .build()
        .unwrap_err();
    match err {
        StixError::MissingProperties { class, properties } => {
            assert_eq!(class, "Malware");
            assert_eq!(properties, vec!["labels"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_relationship_between_objects() {
    let malware = ObjectBuilder::new("malware", SpecVersion::V20)
        .property("name", "Cryptolocker")
        .property("labels", Value::from_json(json!(["ransomware"])).unwrap())
        .build()
        .unwrap();
    let identity = parse(
        json!({
            "type": "identity",
            "id": IDENTITY_ID,
            "created": "2015-12-21T19:59:11.000Z",
            "modified": "2015-12-21T19:59:11.000Z",
            "name": "John Smith",
            "identity_class": "individual",
        }),
        &v20(),
    )
    .unwrap();

    let relationship = ObjectBuilder::new("relationship", SpecVersion::V20)
        .property("relationship_type", "attributed-to")
        .property("source_ref", malware.id().unwrap())
        .property("target_ref", identity.id().unwrap())
        .build()
        .unwrap();
    assert!(is_sro(&relationship, SpecVersion::V20));
    assert_eq!(relationship.get("target_ref"), Some(&Value::from(IDENTITY_ID)));
    assert_eq!(relationship.created(), relationship.modified());
}

#[test]
fn test_observed_data_objects() {
    let data = json!({
        "type": "observed-data",
        "id": "observed-data--b67d30ff-02ac-498a-92f9-32f845f448cf",
        "created": "2016-04-06T19:58:16.000Z",
        "modified": "2016-04-06T19:58:16.000Z",
        "first_observed": "2015-12-21T19:00:00Z",
        "last_observed": "2015-12-21T19:00:00Z",
        "number_observed": 50,
        "objects": {
            "0": {"type": "file", "name": "foo.exe"},
        },
    });
    let obj = parse(data.clone(), &v20()).unwrap();
    assert_eq!(
        obj.get("objects").unwrap().to_json(),
        json!({"0": {"type": "file", "name": "foo.exe"}})
    );

    let mut unknown = data;
    unknown["objects"]["0"] = json!({"type": "x-foo", "bar": 1});
    assert!(parse(unknown.clone(), &v20()).is_err());
    assert!(parse(unknown, &v20().allow_custom(true)).unwrap().has_custom());
}
