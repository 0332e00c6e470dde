//! Error types for STIX object handling and pattern parsing.
//!
//! Object construction, parsing and versioning report [`StixError`];
//! the constant model and the pattern grammar report [`PatternError`].

use thiserror::Error;

/// Result type alias for object-model operations.
pub type Result<T> = std::result::Result<T, StixError>;

/// Versioning operation that detected a revoked lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOp {
    NewVersion,
    Revoke,
}

impl VersionOp {
    fn revoked_message(self) -> &'static str {
        match self {
            VersionOp::NewVersion => "Cannot create a new version of a revoked object.",
            VersionOp::Revoke => "Cannot revoke an already revoked object.",
        }
    }
}

/// Errors raised while building, parsing or versioning STIX objects.
#[derive(Debug, Error)]
pub enum StixError {
    /// Input has no determinable type or is not a supported container.
    #[error("{0}")]
    Parse(String),

    #[error("No values for required properties for {class}: ({}).", .properties.join(", "))]
    MissingProperties {
        class: String,
        /// Missing names in declaration order.
        properties: Vec<String>,
    },

    #[error("Unexpected properties for {class}: ({}).", .properties.join(", "))]
    ExtraProperties { class: String, properties: Vec<String> },

    #[error("Invalid value for {class} '{property}': {reason}")]
    InvalidValue {
        class: String,
        property: String,
        reason: String,
    },

    #[error("At least one of the ({}) properties for {class} must be populated.", .properties.join(", "))]
    AtLeastOneRequired { class: String, properties: Vec<String> },

    #[error("Invalid property name '{name}' for {class}: {reason}")]
    InvalidPropertyName {
        class: String,
        name: String,
        reason: &'static str,
    },

    #[error("These properties cannot be changed when making a new version: {}.", .properties.join(", "))]
    UnmodifiableProperty {
        /// Offending names, sorted.
        properties: Vec<String>,
    },

    #[error("{}", .operation.revoked_message())]
    Revoke { operation: VersionOp },

    #[error("Object type not versionable: {type_name}")]
    TypeNotVersionable { type_name: String },

    #[error("Creating a new object version requires at least the 'created' property: {type_name}")]
    ObjectNotVersionable { type_name: String },

    /// A versioning call received something that is not an object or mapping.
    #[error("cannot {operation} object of this type! Try a dictionary or instance of an SDO or SRO class.")]
    UnsupportedValue { operation: &'static str },

    #[error("registration error: {0}")]
    Registration(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StixError {
    pub(crate) fn invalid(
        class: impl Into<String>,
        property: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        StixError::InvalidValue {
            class: class.into(),
            property: property.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the constant model and the pattern grammar.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    #[error("Unable to create {kind} constant from '{value}': {reason}")]
    InvalidConstant {
        kind: &'static str,
        value: String,
        reason: String,
    },

    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("All operands to an '{operator}' expression must have the same object type")]
    MixedObjectTypes { operator: &'static str },

    #[error("'{inner}' operands of an '{outer}' expression must be parenthesized")]
    UngroupedOperand {
        outer: &'static str,
        inner: &'static str,
    },

    #[error("{value} is not a valid argument for a {qualifier} qualifier")]
    InvalidQualifier {
        qualifier: &'static str,
        value: String,
    },

    #[error("invalid object path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("pattern nesting exceeds {max} levels")]
    TooDeep { max: usize },

    #[error("pattern length {len} exceeds limit of {max}")]
    TooLong { len: usize, max: usize },
}

impl PatternError {
    pub(crate) fn constant(
        kind: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        PatternError::InvalidConstant {
            kind,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised when a timestamp string cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("must be a timestamp string in a recognizable format, got '{0}'")]
    Malformed(String),

    #[error("timestamp '{0}' has more than microsecond precision")]
    TooPrecise(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_properties_display() {
        let err = StixError::MissingProperties {
            class: "KillChainPhase".to_string(),
            properties: vec!["kill_chain_name".to_string(), "phase_name".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "No values for required properties for KillChainPhase: (kill_chain_name, phase_name)."
        );
    }

    #[test]
    fn test_invalid_value_display() {
        let err = StixError::invalid("Report", "object_refs", "must match <object-type>--<guid>.");
        assert_eq!(
            err.to_string(),
            "Invalid value for Report 'object_refs': must match <object-type>--<guid>."
        );
    }

    #[test]
    fn test_revoke_display() {
        let err = StixError::Revoke {
            operation: VersionOp::Revoke,
        };
        assert_eq!(err.to_string(), "Cannot revoke an already revoked object.");
        let err = StixError::Revoke {
            operation: VersionOp::NewVersion,
        };
        assert!(err.to_string().contains("new version of a revoked object"));
    }

    #[test]
    fn test_unmodifiable_display() {
        let err = StixError::UnmodifiableProperty {
            properties: vec!["type".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "These properties cannot be changed when making a new version: type."
        );
    }

    #[test]
    fn test_unsupported_value_display() {
        let err = StixError::UnsupportedValue { operation: "revoke" };
        assert!(err.to_string().contains("cannot revoke object of this type"));
    }

    #[test]
    fn test_pattern_error_display() {
        let err = PatternError::Syntax {
            position: 4,
            message: "unexpected character '#'".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("position 4"));
        assert!(msg.contains('#'));
    }
}
