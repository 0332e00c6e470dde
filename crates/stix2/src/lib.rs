//! STIX 2: Structured Threat Information Expression objects and patterns.
//!
//! This crate provides the object model, validation, versioning and JSON
//! round-tripping for STIX 2.0 and 2.1 content, plus a parser for the STIX
//! Patterning language.
//!
//! # Overview
//!
//! STIX objects are typed JSON documents. This crate:
//! - **Validates on construction**: every object is checked against its
//!   type's property schema, and invalid content never becomes a value
//! - **Is version-aware**: 2.0 and 2.1 schemas, id rules and timestamp
//!   precision are kept apart
//! - **Supports extension**: custom object, observable and property types can
//!   be registered at runtime
//!
//! # Quick Start
//!
//! ```rust
//! use stix2::{Changes, ObjectBuilder, SerializeOptions, SpecVersion, Versionable};
//! use stix2::codec::{ParseOptions, parse};
//!
//! let indicator = ObjectBuilder::new("indicator", SpecVersion::V21)
//!     .property("name", "File hash for malware variant")
//!     .property("pattern", "[file:hashes.md5 = 'd41d8cd98f00b204e9800998ecf8427e']")
//!     .property("pattern_type", "stix")
//!     .property("valid_from", "2017-09-26T23:33:39.829952Z")
//!     .build()
//!     .unwrap();
//!
//! // Update it
//! let updated = indicator
//!     .new_version(Changes::new().set("name", "Renamed"))
//!     .unwrap();
//! assert_eq!(updated.id(), indicator.id());
//! assert!(updated.modified() > indicator.modified());
//!
//! // Serialize and parse back
//! let json = updated.serialize(&SerializeOptions::default()).unwrap();
//! let parsed = parse(json.as_str(), &ParseOptions::new()).unwrap();
//! assert_eq!(parsed, updated);
//! ```
//!
//! # Modules
//!
//! - [`model`]: Core data types (StixObject, Value, Timestamp, schemas)
//! - [`codec`]: JSON parsing and serialization
//! - [`validate`]: Property coercion and object-level checks
//! - [`versioning`]: New versions, revocation and custom-content removal
//! - [`pattern`]: STIX Patterning parser and syntax tree
//! - [`utils`]: Type predicates and deduplication
//! - [`env`]: Clock and id sources for generated defaults
//! - [`error`]: Error types
//! - [`limits`]: Name lengths, pattern limits and well-known constants
//!
//! # Security
//!
//! Parsing is designed to handle untrusted input:
//! - Pattern text is bounded in length and nesting depth
//! - Unknown properties are rejected unless custom content is allowed
//! - Invalid values are rejected with descriptive errors

pub mod codec;
pub mod env;
pub mod error;
pub mod limits;
pub mod model;
pub mod pattern;
pub mod utils;
pub mod validate;
pub mod versioning;

// Re-export commonly used types at crate root
pub use codec::{ParseOptions, SerializeOptions, dict_to_stix, parse, parse_reader, serialize};
pub use env::Environment;
pub use error::{PatternError, Result, StixError, TimestampError, VersionOp};
pub use model::{
    CustomObject, ObjectBuilder, Property, PropertyKind, SpecVersion, StixObject, Timestamp, Value,
};
pub use pattern::{Observation, create_pattern_object};
pub use utils::{deduplicate, is_marking, is_object, is_sco, is_sdo, is_sro};
pub use versioning::{Changes, Versionable, new_version, remove_custom_stix, revoke};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
