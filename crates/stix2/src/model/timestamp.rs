//! STIX timestamps with explicit precision.
//!
//! A [`Timestamp`] always carries microsecond resolution internally. Its
//! precision tag only decides how it is truncated on construction and how
//! many fractional digits it renders with. Equality and ordering compare the
//! underlying instants.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeDelta, Timelike, Utc};

use crate::error::TimestampError;
use crate::limits::MAX_FRACTION_DIGITS;

/// Sub-second precision a timestamp is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Precision {
    /// Render as many digits as needed, none when the fraction is zero.
    #[default]
    Any,
    Second,
    Millisecond,
}

/// Whether the precision is an exact width or a lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrecisionConstraint {
    /// Truncate to the precision and render exactly that many digits.
    #[default]
    Exact,
    /// Render at least the precision, more when the value carries more.
    Min,
}

/// A UTC instant with a precision tag.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    instant: DateTime<Utc>,
    precision: Precision,
    constraint: PrecisionConstraint,
}

impl Timestamp {
    /// Creates a timestamp with unset precision, truncated to microseconds.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Timestamp {
            instant: instant.trunc_subsecs(6),
            precision: Precision::Any,
            constraint: PrecisionConstraint::Exact,
        }
    }

    /// Parses `YYYY-MM-DDTHH:MM:SS[.ffffff]Z`.
    ///
    /// One to six fractional digits are accepted; more fail with
    /// [`TimestampError::TooPrecise`].
    pub fn parse(text: &str) -> Result<Self, TimestampError> {
        parse_instant(text).map(Timestamp::new)
    }

    /// Parses and then applies a precision.
    pub fn parse_with(
        text: &str,
        precision: Precision,
        constraint: PrecisionConstraint,
    ) -> Result<Self, TimestampError> {
        Ok(Timestamp::parse(text)?.with_precision(precision, constraint))
    }

    /// Re-tags this timestamp, truncating when the constraint is exact.
    pub fn with_precision(self, precision: Precision, constraint: PrecisionConstraint) -> Self {
        let instant = match (precision, constraint) {
            (Precision::Second, PrecisionConstraint::Exact) => self.instant.trunc_subsecs(0),
            (Precision::Millisecond, PrecisionConstraint::Exact) => self.instant.trunc_subsecs(3),
            _ => self.instant,
        };
        Timestamp {
            instant,
            precision,
            constraint,
        }
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn constraint(&self) -> PrecisionConstraint {
        self.constraint
    }

    /// Microseconds within the current second.
    pub fn micros(&self) -> u32 {
        self.instant.nanosecond() / 1_000
    }

    /// Returns this timestamp moved forward by `micros`, keeping its tag.
    pub fn plus_micros(self, micros: i64) -> Self {
        let instant = self
            .instant
            .checked_add_signed(TimeDelta::microseconds(micros))
            .unwrap_or(self.instant);
        Timestamp { instant, ..self }
    }

    /// Renders the timestamp according to its precision tag.
    pub fn format(&self) -> String {
        let mut out = self.instant.format("%Y-%m-%dT%H:%M:%S").to_string();
        let micros = format!("{:06}", self.micros());
        let fraction = match (self.precision, self.constraint) {
            (Precision::Millisecond, PrecisionConstraint::Exact) => micros[..3].to_string(),
            (Precision::Millisecond, PrecisionConstraint::Min) => {
                let trimmed = micros.trim_end_matches('0');
                if trimmed.len() < 3 {
                    micros[..3].to_string()
                } else {
                    trimmed.to_string()
                }
            }
            (Precision::Second, PrecisionConstraint::Exact) => String::new(),
            _ => micros.trim_end_matches('0').to_string(),
        };
        if !fraction.is_empty() {
            out.push('.');
            out.push_str(&fraction);
        }
        out.push('Z');
        out
    }
}

fn parse_instant(text: &str) -> Result<DateTime<Utc>, TimestampError> {
    let malformed = || TimestampError::Malformed(text.to_string());

    let body = text.strip_suffix('Z').ok_or_else(malformed)?;
    let (main, fraction) = match body.split_once('.') {
        Some((main, fraction)) => (main, Some(fraction)),
        None => (body, None),
    };
    let naive = NaiveDateTime::parse_from_str(main, "%Y-%m-%dT%H:%M:%S").map_err(|_| malformed())?;

    let micros = match fraction {
        None => 0,
        Some(digits) => {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            if digits.len() > MAX_FRACTION_DIGITS {
                return Err(TimestampError::TooPrecise(text.to_string()));
            }
            let padded = format!("{:0<width$}", digits, width = MAX_FRACTION_DIGITS);
            padded.parse::<u32>().map_err(|_| malformed())?
        }
    };

    let naive = naive.with_nanosecond(micros * 1_000).ok_or_else(malformed)?;
    Ok(naive.and_utc())
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant.cmp(&other.instant)
    }
}

impl Hash for Timestamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instant.hash(state);
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timestamp::parse(s)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Timestamp::new(instant)
    }
}

/// Renders an instant with the given precision.
pub fn format_datetime(
    instant: DateTime<Utc>,
    precision: Precision,
    constraint: PrecisionConstraint,
) -> String {
    Timestamp::new(instant)
        .with_precision(precision, constraint)
        .format()
}

/// Parses a timestamp string and applies a precision.
pub fn parse_into_datetime(
    text: &str,
    precision: Precision,
    constraint: PrecisionConstraint,
) -> Result<Timestamp, TimestampError> {
    Timestamp::parse_with(text, precision, constraint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn ts(text: &str) -> Timestamp {
        Timestamp::parse(text).unwrap()
    }

    #[test]
    fn test_format_datetime_helpers() {
        let instant = Utc.with_ymd_and_hms(2017, 1, 1, 12, 34, 56).unwrap();
        assert_eq!(
            format_datetime(instant, Precision::Millisecond, PrecisionConstraint::Exact),
            "2017-01-01T12:34:56.000Z"
        );
        let t = parse_into_datetime(
            "2017-01-01T12:34:56.1234Z",
            Precision::Millisecond,
            PrecisionConstraint::Exact,
        )
        .unwrap();
        assert_eq!(t.format(), "2017-01-01T12:34:56.123Z");
    }

    #[test]
    fn test_format_unset_precision() {
        let t = Timestamp::new(Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(t.format(), "2017-01-01T00:00:00Z");
        assert_eq!(ts("2017-07-01T00:00:00.000001Z").format(), "2017-07-01T00:00:00.000001Z");
        assert_eq!(ts("2017-07-01T00:00:00.120Z").format(), "2017-07-01T00:00:00.12Z");
    }

    #[test]
    fn test_format_with_precision() {
        let t = ts("2017-01-01T00:00:00Z");
        let ms = t.with_precision(Precision::Millisecond, PrecisionConstraint::Exact);
        assert_eq!(ms.format(), "2017-01-01T00:00:00.000Z");
        let sec = ts("2017-01-01T00:00:00.5Z")
            .with_precision(Precision::Second, PrecisionConstraint::Exact);
        assert_eq!(sec.format(), "2017-01-01T00:00:00Z");
    }

    #[test]
    fn test_millisecond_min_keeps_extra_digits() {
        let t = Timestamp::parse_with(
            "1999-08-15T00:19:07.000001Z",
            Precision::Millisecond,
            PrecisionConstraint::Min,
        )
        .unwrap();
        assert_eq!(t.format(), "1999-08-15T00:19:07.000001Z");

        let t = Timestamp::parse_with(
            "2016-05-12T08:17:27.00Z",
            Precision::Millisecond,
            PrecisionConstraint::Min,
        )
        .unwrap();
        assert_eq!(t.format(), "2016-05-12T08:17:27.000Z");
    }

    #[test]
    fn test_parse_truncates_to_precision() {
        let t = Timestamp::parse_with(
            "2017-01-01T01:02:03.000001Z",
            Precision::Millisecond,
            PrecisionConstraint::Exact,
        )
        .unwrap();
        assert_eq!(t.micros(), 0);
        assert_eq!(t.format(), "2017-01-01T01:02:03.000Z");

        let t = Timestamp::parse_with(
            "2017-01-01T01:02:03.1Z",
            Precision::Millisecond,
            PrecisionConstraint::Exact,
        )
        .unwrap();
        assert_eq!(t.format(), "2017-01-01T01:02:03.100Z");

        let t = Timestamp::parse_with(
            "2017-01-01T01:02:03.1Z",
            Precision::Second,
            PrecisionConstraint::Exact,
        )
        .unwrap();
        assert_eq!(t.format(), "2017-01-01T01:02:03Z");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            Timestamp::parse("2016-05-12T08:17:27.000000342Z"),
            Err(TimestampError::TooPrecise(_))
        ));
        assert!(Timestamp::parse("2016-06-01").is_err());
        assert!(Timestamp::parse("2016-06-01T00:00:00").is_err());
        assert!(Timestamp::parse("2016-06-01T00:00:00.Z").is_err());
        assert!(Timestamp::parse("foo").is_err());
    }

    #[test]
    fn test_equality_ignores_precision() {
        let a = ts("2016-01-01T00:00:00Z");
        let b = a.with_precision(Precision::Millisecond, PrecisionConstraint::Exact);
        assert_eq!(a, b);
        assert!(ts("2016-01-01T00:00:00.001Z") > a);
    }

    #[test]
    fn test_plus_micros() {
        let t = ts("1999-08-15T00:19:07.999999Z").plus_micros(1);
        assert_eq!(t.format(), "1999-08-15T00:19:08Z");
    }

    proptest! {
        #[test]
        fn prop_format_parse_roundtrip(secs in 0i64..4_000_000_000, micros in 0u32..1_000_000) {
            let instant = Utc.timestamp_opt(secs, micros * 1_000).unwrap();
            let t = Timestamp::new(instant);
            let back = Timestamp::parse(&t.format()).unwrap();
            prop_assert_eq!(back, t);
        }
    }
}
