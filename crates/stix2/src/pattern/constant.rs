//! Typed literals for pattern expressions.
//!
//! Constants render in their pattern-language spelling: strings are quoted
//! with `\` and `'` escaped, hex and binary carry `h` and `b` prefixes, and
//! timestamps carry a `t` prefix.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::error::PatternError;
use crate::model::Timestamp;

/// A literal value in a pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Hexadecimal digits, without the `h'...'` wrapper.
    Hex(String),
    /// Base64 text, without the `b'...'` wrapper.
    Binary(String),
    /// A string checked against a hash algorithm. Renders as a string.
    Hash { value: String, algorithm: String },
    Timestamp(Timestamp),
    List(Vec<Constant>),
}

impl Constant {
    pub fn integer(text: &str) -> Result<Self, PatternError> {
        text.trim()
            .parse::<i64>()
            .map(Constant::Integer)
            .map_err(|_| PatternError::constant("integer", text, "not a valid integer"))
    }

    pub fn float(text: &str) -> Result<Self, PatternError> {
        match text.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Constant::Float(f)),
            _ => Err(PatternError::constant("float", text, "not a valid float")),
        }
    }

    pub fn boolean(text: &str) -> Result<Self, PatternError> {
        parse_boolean(text)
            .map(Constant::Boolean)
            .ok_or_else(|| PatternError::constant("boolean", text, "not a boolean value"))
    }

    /// Accepts an even number of hex digits.
    pub fn hex(text: &str) -> Result<Self, PatternError> {
        if text.len() % 2 == 0 && text.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Constant::Hex(text.to_string()))
        } else {
            Err(PatternError::constant("hex", text, "not a valid hex string"))
        }
    }

    /// Accepts padded standard base64.
    pub fn binary(text: &str) -> Result<Self, PatternError> {
        STANDARD
            .decode(text)
            .map(|_| Constant::Binary(text.to_string()))
            .map_err(|e| PatternError::constant("binary", text, e.to_string()))
    }

    /// Checks `value` against the lexical form of `algorithm`. Algorithms
    /// outside the STIX vocabulary are accepted as given.
    pub fn hash(value: &str, algorithm: &str) -> Result<Self, PatternError> {
        match check_hash(algorithm, value) {
            HashCheck::Invalid(name) => Err(PatternError::constant(
                "hash",
                value,
                format!("'{}' is not a valid {} hash", value, name),
            )),
            HashCheck::Valid | HashCheck::Unknown => Ok(Constant::Hash {
                value: value.to_string(),
                algorithm: algorithm.to_string(),
            }),
        }
    }

    pub fn timestamp(text: &str) -> Result<Self, PatternError> {
        Timestamp::parse(text)
            .map(Constant::Timestamp)
            .map_err(|e| PatternError::constant("timestamp", text, e.to_string()))
    }

    /// Converts dynamic JSON input. Strings that read as timestamps become
    /// timestamp constants; objects and null are rejected.
    pub fn from_json(value: &JsonValue) -> Result<Self, PatternError> {
        match value {
            JsonValue::Bool(b) => Ok(Constant::Boolean(*b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Ok(Constant::Integer(i)),
                None => n
                    .as_f64()
                    .map(Constant::Float)
                    .ok_or_else(|| PatternError::constant("float", n.to_string(), "out of range")),
            },
            JsonValue::String(s) => Ok(Constant::from(s.as_str())),
            JsonValue::Array(items) => items
                .iter()
                .map(Constant::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Constant::List),
            other => Err(PatternError::constant(
                "constant",
                other.to_string(),
                "unable to create a constant from this value",
            )),
        }
    }

    /// Human-readable name of the variant.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Constant::String(_) => "string",
            Constant::Integer(_) => "integer",
            Constant::Float(_) => "float",
            Constant::Boolean(_) => "boolean",
            Constant::Hex(_) => "hex",
            Constant::Binary(_) => "binary",
            Constant::Hash { .. } => "hash",
            Constant::Timestamp(_) => "timestamp",
            Constant::List(_) => "list",
        }
    }
}

/// Converts a native value into a constant. Constants pass through
/// unchanged.
pub fn make_constant<T: Into<Constant>>(value: T) -> Constant {
    value.into()
}

impl From<&str> for Constant {
    fn from(value: &str) -> Self {
        match Timestamp::parse(value) {
            Ok(ts) => Constant::Timestamp(ts),
            Err(_) => Constant::String(value.to_string()),
        }
    }
}

impl From<String> for Constant {
    fn from(value: String) -> Self {
        Constant::from(value.as_str())
    }
}

impl From<bool> for Constant {
    fn from(value: bool) -> Self {
        Constant::Boolean(value)
    }
}

impl From<i64> for Constant {
    fn from(value: i64) -> Self {
        Constant::Integer(value)
    }
}

impl From<i32> for Constant {
    fn from(value: i32) -> Self {
        Constant::Integer(value.into())
    }
}

impl From<f64> for Constant {
    fn from(value: f64) -> Self {
        Constant::Float(value)
    }
}

impl From<Timestamp> for Constant {
    fn from(value: Timestamp) -> Self {
        Constant::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for Constant {
    fn from(value: DateTime<Utc>) -> Self {
        Constant::Timestamp(Timestamp::new(value))
    }
}

impl<T: Into<Constant>> From<Vec<T>> for Constant {
    fn from(values: Vec<T>) -> Self {
        Constant::List(values.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::String(s) | Constant::Hash { value: s, .. } => write_quoted(f, s),
            Constant::Integer(i) => write!(f, "{}", i),
            Constant::Float(x) => {
                let text = x.to_string();
                if text.contains('.') || !x.is_finite() {
                    f.write_str(&text)
                } else {
                    write!(f, "{}.0", text)
                }
            }
            Constant::Boolean(b) => write!(f, "{}", b),
            Constant::Hex(h) => write!(f, "h'{}'", h),
            Constant::Binary(b) => write!(f, "b'{}'", b),
            Constant::Timestamp(ts) => write!(f, "t'{}'", ts.format()),
            Constant::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Writes `text` as a single-quoted pattern string.
pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in text.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\'' => f.write_str("\\'")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("'")
}

// =============================================================================
// SHARED LEXICAL CHECKS
// =============================================================================

/// Reads the boolean spellings accepted by STIX: `true`, `t`, `1`, `false`,
/// `f`, `0`, in any case.
pub fn parse_boolean(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" => Some(false),
        _ => None,
    }
}

/// Outcome of checking a hash value against its algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashCheck {
    Valid,
    /// Known algorithm, malformed value. Carries the vocabulary name.
    Invalid(&'static str),
    /// Algorithm outside the vocabulary.
    Unknown,
}

/// Hex digest lengths per normalized algorithm key.
const HEX_HASHES: &[(&str, &str, &[usize])] = &[
    ("MD5", "MD5", &[32]),
    ("MD6", "MD6", &[32, 40, 56, 64, 96, 128]),
    ("RIPEMD160", "RIPEMD-160", &[40]),
    ("SHA1", "SHA-1", &[40]),
    ("SHA224", "SHA-224", &[56]),
    ("SHA256", "SHA-256", &[64]),
    ("SHA384", "SHA-384", &[96]),
    ("SHA512", "SHA-512", &[128]),
    ("SHA3224", "SHA3-224", &[56]),
    ("SHA3256", "SHA3-256", &[64]),
    ("SHA3384", "SHA3-384", &[96]),
    ("SHA3512", "SHA3-512", &[128]),
    ("WHIRLPOOL", "WHIRLPOOL", &[128]),
    ("TLSH", "TLSH", &[70]),
];

/// Validates a hash value for an algorithm named in any common spelling
/// (`SHA-256`, `sha256`, `SHA_256`).
pub fn check_hash(algorithm: &str, value: &str) -> HashCheck {
    let key: String = algorithm
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if key == "SSDEEP" {
        return if is_ssdeep(value) {
            HashCheck::Valid
        } else {
            HashCheck::Invalid("SSDEEP")
        };
    }
    match HEX_HASHES.iter().find(|(k, _, _)| *k == key) {
        Some((_, name, lengths)) => {
            if lengths.contains(&value.len()) && value.bytes().all(|b| b.is_ascii_hexdigit()) {
                HashCheck::Valid
            } else {
                HashCheck::Invalid(*name)
            }
        }
        None => HashCheck::Unknown,
    }
}

/// `blocksize:hash:hash` with a decimal block size of up to five digits.
fn is_ssdeep(value: &str) -> bool {
    let chunk = |s: &str| {
        (1..=64).contains(&s.len())
            && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'/' || b == b'+')
    };
    let mut parts = value.split(':');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(size), Some(a), Some(b), None) => {
            (1..=5).contains(&size.len()) && size.bytes().all(|b| b.is_ascii_digit()) && chunk(a) && chunk(b)
        }
        _ => false,
    }
}
