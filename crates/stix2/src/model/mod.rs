//! Data model types for STIX.
//!
//! This module contains the core types for representing STIX content:
//! - Spec versions and timestamps
//! - Identifiers (including deterministic observable ids)
//! - Property descriptors and object schemas
//! - The type registry and custom registration
//! - Typed objects and their builder

pub mod builder;
pub mod custom;
pub mod id;
pub mod object;
pub mod property;
pub mod registry;
pub mod schema;
pub mod timestamp;
pub mod value;
pub mod version;

pub use builder::ObjectBuilder;
pub use custom::CustomObject;
pub use id::{deterministic_uuid, format_id, get_type_from_id, validate_id, validate_type_name};
pub use object::StixObject;
pub use property::{DefaultValue, Property, PropertyKind};
pub use schema::{Constraint, Family, ObjectType, class_name_for};
pub use timestamp::{
    Precision, PrecisionConstraint, Timestamp, format_datetime, parse_into_datetime,
};
pub use value::Value;
pub use version::SpecVersion;
