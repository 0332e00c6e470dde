//! JSON encoding and decoding of STIX objects.
//!
//! STIX content is exchanged as JSON text. This module provides the parse
//! boundary (mapping, JSON text or reader in, typed object out) and the
//! serialize boundary (typed object in, deterministic JSON text out).

pub mod json;

pub use json::{
    ParseOptions, SerializeOptions, detect_spec_version, dict_to_stix, get_dict, parse,
    parse_reader, serialize, serialize_json,
};
