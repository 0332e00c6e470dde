//! Cyber-observable tables.
//!
//! The same vocabulary exists in both versions. In 2.0 observables live only
//! inside observed-data and point at each other by map key; in 2.1 they are
//! top-level objects with deterministic identifiers.

use crate::limits::MAX_COUNT;
use crate::model::{Property, PropertyKind, SpecVersion};

use super::ObjectType;
use super::common::{dictionary, hashes, sco, strings};

/// A reference to another observable.
fn obs_ref(version: SpecVersion, valid_types: &'static [&'static str]) -> Property {
    match version {
        SpecVersion::V20 => Property::string(),
        SpecVersion::V21 => Property::reference(Some(valid_types)),
    }
}

fn obs_refs(version: SpecVersion, valid_types: &'static [&'static str]) -> Property {
    match version {
        SpecVersion::V20 => strings(),
        SpecVersion::V21 => Property::list(PropertyKind::Reference {
            valid_types: Some(valid_types),
        }),
    }
}

/// Marks a property as id-contributing in 2.1 (2.0 observables have no ids).
fn contrib(version: SpecVersion, prop: Property) -> Property {
    match version {
        SpecVersion::V20 => prop,
        SpecVersion::V21 => prop.id_contributing(),
    }
}

fn required_in_v20(version: SpecVersion, prop: Property) -> Property {
    match version {
        SpecVersion::V20 => prop.required(),
        SpecVersion::V21 => prop,
    }
}

const ADDRESS_TARGETS: &[&str] = &["ipv4-addr", "ipv6-addr", "domain-name"];
const FILE_CONTENT: &[&str] = &["file", "directory"];

pub(super) fn types(v: SpecVersion) -> Vec<ObjectType> {
    let port = || Property::integer_between(0, 65535);
    let count = || Property::integer_between(0, MAX_COUNT);

    let mut types = vec![
        sco("artifact", "Artifact", v, vec![
            ("mime_type", Property::string()),
            ("payload_bin", contrib(v, Property::string())),
            ("url", Property::string()),
            ("hashes", contrib(v, hashes())),
            ("encryption_algorithm", Property::string()),
            ("decryption_key", Property::string()),
        ]),
        sco("autonomous-system", "AutonomousSystem", v, vec![
            ("number", contrib(v, Property::integer().required())),
            ("name", Property::string()),
            ("rir", Property::string()),
        ]),
        sco("directory", "Directory", v, vec![
            ("path", contrib(v, Property::string().required())),
            ("path_enc", Property::string()),
            ("ctime", Property::timestamp()),
            ("mtime", Property::timestamp()),
            ("atime", Property::timestamp()),
            ("contains_refs", obs_refs(v, FILE_CONTENT)),
        ]),
        sco("domain-name", "DomainName", v, vec![
            ("value", contrib(v, Property::string().required())),
            ("resolves_to_refs", obs_refs(v, ADDRESS_TARGETS)),
        ]),
        sco("email-addr", "EmailAddress", v, vec![
            ("value", contrib(v, Property::string().required())),
            ("display_name", Property::string()),
            ("belongs_to_ref", obs_ref(v, &["user-account"])),
        ]),
        sco("file", "File", v, vec![
            ("hashes", contrib(v, hashes())),
            ("size", Property::integer_between(0, i64::MAX)),
            ("name", contrib(v, Property::string())),
            ("name_enc", Property::string()),
            ("magic_number_hex", Property::string()),
            ("mime_type", Property::string()),
            ("ctime", Property::timestamp()),
            ("mtime", Property::timestamp()),
            ("atime", Property::timestamp()),
            ("parent_directory_ref", contrib(v, obs_ref(v, &["directory"]))),
            ("contains_refs", obs_refs(v, FILE_CONTENT)),
            ("content_ref", obs_ref(v, &["artifact"])),
        ]),
        sco("ipv4-addr", "IPv4Address", v, vec![
            ("value", contrib(v, Property::string().required())),
            ("resolves_to_refs", obs_refs(v, &["mac-addr"])),
            ("belongs_to_refs", obs_refs(v, &["autonomous-system"])),
        ]),
        sco("ipv6-addr", "IPv6Address", v, vec![
            ("value", contrib(v, Property::string().required())),
            ("resolves_to_refs", obs_refs(v, &["mac-addr"])),
            ("belongs_to_refs", obs_refs(v, &["autonomous-system"])),
        ]),
        sco("mac-addr", "MACAddress", v, vec![
            ("value", contrib(v, Property::string().required())),
        ]),
        sco("mutex", "Mutex", v, vec![
            ("name", contrib(v, Property::string().required())),
        ]),
        sco("network-traffic", "NetworkTraffic", v, vec![
            ("start", contrib(v, Property::timestamp())),
            ("end", contrib(v, Property::timestamp())),
            ("src_ref", contrib(v, obs_ref(v, ADDRESS_TARGETS))),
            ("dst_ref", contrib(v, obs_ref(v, ADDRESS_TARGETS))),
            ("src_port", contrib(v, port())),
            ("dst_port", contrib(v, port())),
            ("protocols", contrib(v, strings().required())),
            ("src_byte_count", count()),
            ("dst_byte_count", count()),
            ("ipfix", dictionary()),
        ]),
        sco("process", "Process", v, vec![
            ("is_hidden", Property::boolean()),
            ("pid", Property::integer()),
            ("created_time", Property::timestamp()),
            ("cwd", Property::string()),
            ("command_line", Property::string()),
            ("environment_variables", dictionary()),
            ("image_ref", obs_ref(v, &["file"])),
            ("parent_ref", obs_ref(v, &["process"])),
            ("child_refs", obs_refs(v, &["process"])),
        ]),
        sco("software", "Software", v, vec![
            ("name", contrib(v, Property::string().required())),
            ("cpe", contrib(v, Property::string())),
            ("languages", strings()),
            ("vendor", contrib(v, Property::string())),
            ("version", contrib(v, Property::string())),
        ]),
        sco("url", "URL", v, vec![
            ("value", contrib(v, Property::string().required())),
        ]),
        sco("user-account", "UserAccount", v, vec![
            ("user_id", contrib(v, required_in_v20(v, Property::string()))),
            ("credential", Property::string()),
            ("account_login", contrib(v, Property::string())),
            ("account_type", contrib(v, Property::string())),
            ("display_name", Property::string()),
            ("is_service_account", Property::boolean()),
            ("is_privileged", Property::boolean()),
            ("can_escalate_privs", Property::boolean()),
            ("is_disabled", Property::boolean()),
            ("account_created", Property::timestamp()),
            ("account_expires", Property::timestamp()),
        ]),
        sco("windows-registry-key", "WindowsRegistryKey", v, vec![
            ("key", contrib(v, required_in_v20(v, Property::string()))),
            ("values", contrib(v, Property::list(PropertyKind::Dictionary))),
            ("modified_time", Property::timestamp()),
            ("creator_user_ref", obs_ref(v, &["user-account"])),
            ("number_of_subkeys", Property::integer()),
        ]),
    ];

    if v == SpecVersion::V21 {
        types = types
            .into_iter()
            .map(|t| match t.name() {
                "file" | "network-traffic" => t.mark_id_contributing("extensions"),
                _ => t,
            })
            .collect();
    }
    types
}
