//! STIX Patterning.
//!
//! Patterns are parsed into an [`Observation`] tree whose `Display` output is
//! the canonical pattern text:
//!
//! ```rust
//! use stix2::SpecVersion;
//! use stix2::pattern::create_pattern_object;
//!
//! let pattern = create_pattern_object("[file:size>=1024]", SpecVersion::V21).unwrap();
//! assert_eq!(pattern.to_string(), "[file:size >= 1024]");
//! ```
//!
//! Parsing goes through a [`NodeFactory`], which callers can replace to
//! instrument or specialize individual productions.

pub mod ast;
pub mod constant;
pub mod factory;
mod lexer;
mod parser;

use tracing::debug;

pub use crate::error::PatternError;
pub use crate::model::SpecVersion;
pub use ast::{
    BooleanExpression, BooleanOperator, ComparisonExpression, ComparisonOperator, Expression,
    ListIndex, ObjectPath, Observation, ObservationOperator, PathComponent, Qualifier,
};
pub use constant::{Constant, HashCheck, check_hash, make_constant, parse_boolean};
pub use factory::{DefaultNodeFactory, NodeFactory};

/// Parses pattern text for a spec version.
pub fn create_pattern_object(text: &str, version: SpecVersion) -> Result<Observation, PatternError> {
    create_pattern_object_with(text, version, &DefaultNodeFactory)
}

/// Parses pattern text, building every node through `factory`.
pub fn create_pattern_object_with(
    text: &str,
    version: SpecVersion,
    factory: &dyn NodeFactory,
) -> Result<Observation, PatternError> {
    let observation = parser::parse_pattern(text, version, factory)?;
    debug!(version = %version, len = text.len(), "parsed pattern");
    Ok(observation)
}
