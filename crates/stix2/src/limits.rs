//! Fixed limits and well-known constants.
//!
//! The pattern limits protect the recursive-descent parser against
//! resource exhaustion when handling untrusted pattern text.

use uuid::Uuid;

/// Namespace for deterministic STIX 2.1 cyber-observable identifiers.
pub const SCO_DET_ID_NAMESPACE: Uuid = Uuid::from_u128(0x00abedb4_aa42_466c_9c01_fed23315a9b7);

/// Maximum accepted pattern length in bytes (1 MB).
pub const MAX_PATTERN_LEN: usize = 1024 * 1024;

/// Maximum nesting of brackets and parentheses in a pattern.
pub const MAX_PATTERN_DEPTH: usize = 64;

/// Minimum length of a type name or custom property name.
pub const MIN_NAME_LEN: usize = 3;

/// Maximum length of a type name or custom property name.
pub const MAX_NAME_LEN: usize = 250;

/// Dictionary key length bounds for STIX 2.0 (inclusive).
pub const DICT_KEY_LEN_V20: (usize, usize) = (3, 256);

/// Dictionary key length bounds for STIX 2.1 (inclusive).
pub const DICT_KEY_LEN_V21: (usize, usize) = (1, 250);

/// Upper bound for count-like integers (`number_observed`, `count`).
pub const MAX_COUNT: i64 = 999_999_999;

/// Maximum number of fractional-second digits in a timestamp.
pub const MAX_FRACTION_DIGITS: usize = 6;
