//! Pattern syntax tree.
//!
//! Every node renders to its canonical pattern text through `Display`.
//! Rendering never adds parentheses: grouping only appears where the tree
//! holds an explicit parenthetical node.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::PatternError;
use crate::model::SpecVersion;
use crate::pattern::constant::{Constant, write_quoted};
use crate::pattern::lexer::Keyword;

// =============================================================================
// OBJECT PATHS
// =============================================================================

/// Index of a list path step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListIndex {
    Position(i64),
    /// `[*]`
    Any,
}

impl fmt::Display for ListIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListIndex::Position(i) => write!(f, "{}", i),
            ListIndex::Any => f.write_str("*"),
        }
    }
}

/// One step of an object path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathComponent {
    /// A property or dictionary key. Quoted on render only when it is not
    /// a plain identifier.
    Basic(String),
    /// A `*_ref` property that dereferences another object.
    Reference(String),
    /// An indexed list property. `quoted` keeps the source spelling.
    List {
        name: String,
        index: ListIndex,
        quoted: bool,
    },
}

impl PathComponent {
    /// Classifies an unindexed step by its name.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.ends_with("_ref") && is_identifier(&name) {
            PathComponent::Reference(name)
        } else {
            PathComponent::Basic(name)
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PathComponent::Basic(name)
            | PathComponent::Reference(name)
            | PathComponent::List { name, .. } => name,
        }
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathComponent::Basic(name) | PathComponent::Reference(name) => write_name(f, name, false),
            PathComponent::List {
                name,
                index,
                quoted,
            } => {
                write_name(f, name, *quoted)?;
                write!(f, "[{}]", index)
            }
        }
    }
}

fn write_name(f: &mut fmt::Formatter<'_>, name: &str, force_quotes: bool) -> fmt::Result {
    if force_quotes || !is_identifier(name) {
        write_quoted(f, name)
    } else {
        f.write_str(name)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`, excluding words the lexer reads as keywords or
/// booleans.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_reserved_word(name)
}

fn is_reserved_word(word: &str) -> bool {
    Keyword::from_word(word).is_some()
        || word.eq_ignore_ascii_case("true")
        || word.eq_ignore_ascii_case("false")
}

/// `<object-type>:<step>(.<step>|[<index>])*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPath {
    pub object_type: String,
    pub components: Vec<PathComponent>,
}

impl ObjectPath {
    pub fn new(object_type: impl Into<String>, components: Vec<PathComponent>) -> Result<Self, PatternError> {
        let object_type = object_type.into();
        let valid_type = object_type
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && object_type
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && !is_reserved_word(&object_type);
        if !valid_type {
            return Err(PatternError::InvalidPath {
                path: object_type,
                reason: "object type must be an identifier",
            });
        }
        if components.is_empty() {
            return Err(PatternError::InvalidPath {
                path: object_type,
                reason: "a property path is required",
            });
        }
        Ok(ObjectPath {
            object_type,
            components,
        })
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.object_type)?;
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for ObjectPath {
    type Err = PatternError;

    /// Parses path text such as `file:hashes.'SHA-256'`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::pattern::parser::parse_object_path(s, SpecVersion::default())
    }
}

// =============================================================================
// COMPARISON AND BOOLEAN EXPRESSIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    In,
    Like,
    Matches,
    IsSubset,
    IsSuperset,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "=",
            ComparisonOperator::NotEqual => "!=",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::LessThanOrEqual => "<=",
            ComparisonOperator::In => "IN",
            ComparisonOperator::Like => "LIKE",
            ComparisonOperator::Matches => "MATCHES",
            ComparisonOperator::IsSubset => "ISSUBSET",
            ComparisonOperator::IsSuperset => "ISSUPERSET",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `<path> [NOT] <operator> <constant>`
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonExpression {
    pub operator: ComparisonOperator,
    pub lhs: ObjectPath,
    pub rhs: Constant,
    pub negated: bool,
}

impl ComparisonExpression {
    pub fn new(operator: ComparisonOperator, lhs: ObjectPath, rhs: impl Into<Constant>) -> Self {
        ComparisonExpression {
            operator,
            lhs,
            rhs: rhs.into(),
            negated: false,
        }
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }
}

impl fmt::Display for ComparisonExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lhs)?;
        if self.negated {
            f.write_str(" NOT")?;
        }
        write!(f, " {} {}", self.operator, self.rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOperator {
    And,
    Or,
}

impl BooleanOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BooleanOperator::And => "AND",
            BooleanOperator::Or => "OR",
        }
    }
}

/// A flat AND or OR list inside one observation.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanExpression {
    operator: BooleanOperator,
    operands: Vec<Expression>,
    root_types: BTreeSet<String>,
}

impl BooleanExpression {
    /// Combines operands. AND requires a root object type common to every
    /// operand; OR accumulates them. An OR operand of an AND must be wrapped
    /// in a parenthetical, since AND binds tighter.
    pub fn new(operator: BooleanOperator, operands: Vec<Expression>) -> Result<Self, PatternError> {
        let mut root_types: Option<BTreeSet<String>> = None;
        for operand in &operands {
            if let (BooleanOperator::And, Expression::Boolean(inner)) = (operator, operand) {
                if inner.operator == BooleanOperator::Or {
                    return Err(PatternError::UngroupedOperand {
                        outer: "AND",
                        inner: "OR",
                    });
                }
            }
            let types = operand.root_types();
            root_types = Some(match (root_types, operator) {
                (None, _) => types,
                (Some(acc), BooleanOperator::And) => acc.intersection(&types).cloned().collect(),
                (Some(mut acc), BooleanOperator::Or) => {
                    acc.extend(types);
                    acc
                }
            });
            if root_types.as_ref().is_some_and(BTreeSet::is_empty) {
                return Err(PatternError::MixedObjectTypes {
                    operator: operator.as_str(),
                });
            }
        }
        Ok(BooleanExpression {
            operator,
            operands,
            root_types: root_types.unwrap_or_default(),
        })
    }

    pub fn operator(&self) -> BooleanOperator {
        self.operator
    }

    pub fn operands(&self) -> &[Expression] {
        &self.operands
    }

    pub fn root_types(&self) -> &BTreeSet<String> {
        &self.root_types
    }
}

impl fmt::Display for BooleanExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = format!(" {} ", self.operator.as_str());
        for (i, operand) in self.operands.iter().enumerate() {
            if i > 0 {
                f.write_str(&separator)?;
            }
            write!(f, "{}", operand)?;
        }
        Ok(())
    }
}

/// Anything that can appear inside `[...]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Comparison(ComparisonExpression),
    /// `EXISTS <path>`, STIX 2.1 only.
    Exists(ObjectPath),
    Boolean(BooleanExpression),
    Parenthetical(Box<Expression>),
}

impl Expression {
    /// Object types the expression can be satisfied by.
    pub fn root_types(&self) -> BTreeSet<String> {
        match self {
            Expression::Comparison(c) => BTreeSet::from([c.lhs.object_type.clone()]),
            Expression::Exists(path) => BTreeSet::from([path.object_type.clone()]),
            Expression::Boolean(b) => b.root_types().clone(),
            Expression::Parenthetical(inner) => inner.root_types(),
        }
    }
}

impl From<ComparisonExpression> for Expression {
    fn from(value: ComparisonExpression) -> Self {
        Expression::Comparison(value)
    }
}

impl From<BooleanExpression> for Expression {
    fn from(value: BooleanExpression) -> Self {
        Expression::Boolean(value)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Comparison(c) => write!(f, "{}", c),
            Expression::Exists(path) => write!(f, "EXISTS {}", path),
            Expression::Boolean(b) => write!(f, "{}", b),
            Expression::Parenthetical(inner) => write!(f, "({})", inner),
        }
    }
}

// =============================================================================
// OBSERVATIONS AND QUALIFIERS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservationOperator {
    And,
    Or,
    FollowedBy,
}

impl ObservationOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationOperator::And => "AND",
            ObservationOperator::Or => "OR",
            ObservationOperator::FollowedBy => "FOLLOWEDBY",
        }
    }
}

/// Constrains when or how often an observation must match.
#[derive(Debug, Clone, PartialEq)]
pub enum Qualifier {
    /// `WITHIN <seconds> SECONDS`
    Within(Constant),
    /// `REPEATS <n> TIMES`
    Repeats(Constant),
    /// `START <timestamp> STOP <timestamp>`
    StartStop { start: Constant, stop: Constant },
}

impl Qualifier {
    /// Accepts a non-negative integer or float.
    pub fn within(seconds: impl Into<Constant>) -> Result<Self, PatternError> {
        match seconds.into() {
            c @ Constant::Integer(0..) => Ok(Qualifier::Within(c)),
            Constant::Float(x) if x >= 0.0 => Ok(Qualifier::Within(Constant::Float(x))),
            other => Err(PatternError::InvalidQualifier {
                qualifier: "WITHIN",
                value: other.to_string(),
            }),
        }
    }

    /// Accepts a non-negative integer.
    pub fn repeats(times: impl Into<Constant>) -> Result<Self, PatternError> {
        match times.into() {
            c @ Constant::Integer(0..) => Ok(Qualifier::Repeats(c)),
            other => Err(PatternError::InvalidQualifier {
                qualifier: "REPEATS",
                value: other.to_string(),
            }),
        }
    }

    /// Both bounds must be full timestamps, given either as timestamp
    /// constants or as strings holding one.
    pub fn start_stop(start: impl Into<Constant>, stop: impl Into<Constant>) -> Result<Self, PatternError> {
        let start = start.into();
        let stop = stop.into();
        for bound in [&start, &stop] {
            let valid = match bound {
                Constant::Timestamp(_) => true,
                Constant::String(text) => crate::model::Timestamp::parse(text).is_ok(),
                _ => false,
            };
            if !valid {
                return Err(PatternError::InvalidQualifier {
                    qualifier: "START/STOP",
                    value: bound.to_string(),
                });
            }
        }
        Ok(Qualifier::StartStop { start, stop })
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::Within(seconds) => write!(f, "WITHIN {} SECONDS", seconds),
            Qualifier::Repeats(times) => write!(f, "REPEATS {} TIMES", times),
            Qualifier::StartStop { start, stop } => write!(f, "START {} STOP {}", start, stop),
        }
    }
}

/// A complete pattern or any observation within one.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// `[<expression>]`
    Simple(Expression),
    Compound {
        operator: ObservationOperator,
        operands: Vec<Observation>,
    },
    Qualified {
        observation: Box<Observation>,
        qualifier: Qualifier,
    },
    Parenthetical(Box<Observation>),
}

impl Observation {
    pub fn qualify(self, qualifier: Qualifier) -> Self {
        Observation::Qualified {
            observation: Box::new(self),
            qualifier,
        }
    }
}

impl From<Expression> for Observation {
    fn from(value: Expression) -> Self {
        Observation::Simple(value)
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::Simple(expression) => write!(f, "[{}]", expression),
            Observation::Compound { operator, operands } => {
                let separator = format!(" {} ", operator.as_str());
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(&separator)?;
                    }
                    write!(f, "{}", operand)?;
                }
                Ok(())
            }
            Observation::Qualified {
                observation,
                qualifier,
            } => write!(f, "{} {}", observation, qualifier),
            Observation::Parenthetical(inner) => write!(f, "({})", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(text: &str) -> ObjectPath {
        text.parse().unwrap()
    }

    fn eq(lhs: &str, rhs: impl Into<Constant>) -> Expression {
        ComparisonExpression::new(ComparisonOperator::Equal, path(lhs), rhs).into()
    }

    #[test]
    fn test_comparison_rendering() {
        let exp = ComparisonExpression::new(
            ComparisonOperator::Equal,
            path("file:hashes.'SHA-256'"),
            "aec070645fe53ee3b3763059376134f058cc337247c978add178b6ccdfb0019f",
        );
        assert_eq!(
            exp.to_string(),
            "file:hashes.'SHA-256' = 'aec070645fe53ee3b3763059376134f058cc337247c978add178b6ccdfb0019f'"
        );
        let exp = ComparisonExpression::new(ComparisonOperator::LessThan, path("file:size"), 1024).negate();
        assert_eq!(exp.to_string(), "file:size NOT < 1024");
        let exp = ComparisonExpression::new(
            ComparisonOperator::In,
            path("process:name"),
            vec!["proccy", "proximus", "badproc"],
        );
        assert_eq!(exp.to_string(), "process:name IN ('proccy', 'proximus', 'badproc')");
    }

    #[test]
    fn test_path_components() {
        let p = path("file:extensions.'windows-pebinary-ext'.sections[*].entropy");
        assert_eq!(p.components.len(), 4);
        assert!(matches!(p.components[2], PathComponent::List { index: ListIndex::Any, .. }));
        assert_eq!(p.to_string(), "file:extensions.'windows-pebinary-ext'.sections[*].entropy");

        let p = path("email-message:from_ref.value");
        assert_eq!(p.components[0], PathComponent::Reference("from_ref".into()));
    }

    #[test]
    fn test_reserved_words_stay_quoted() {
        for name in ["true", "FALSE", "AND", "IN", "EXISTS", "WITHIN"] {
            let p = ObjectPath::new("a", vec![PathComponent::named(name), PathComponent::named("x")]).unwrap();
            assert_eq!(p.to_string(), format!("a:'{}'.x", name));
            assert_eq!(path(&p.to_string()), p);
        }
        let list = PathComponent::List {
            name: "OR".into(),
            index: ListIndex::Position(0),
            quoted: false,
        };
        assert_eq!(list.to_string(), "'OR'[0]");
        // Lowercase words are ordinary identifiers.
        assert_eq!(path("a:and.in").to_string(), "a:and.in");
        assert!(ObjectPath::new("NOT", vec![PathComponent::named("x")]).is_err());
    }

    #[test]
    fn test_boolean_root_types() {
        let and = BooleanExpression::new(
            BooleanOperator::And,
            vec![eq("user-account:display_name", "admin"), eq("email-addr:display_name", "admin")],
        );
        assert_eq!(and, Err(PatternError::MixedObjectTypes { operator: "AND" }));

        let or = BooleanExpression::new(BooleanOperator::Or, vec![eq("a:b", "1"), eq("b:c", "2")]).unwrap();
        let ungrouped = BooleanExpression::new(BooleanOperator::And, vec![or.clone().into(), eq("b:d", "3")]);
        assert_eq!(
            ungrouped,
            Err(PatternError::UngroupedOperand {
                outer: "AND",
                inner: "OR"
            })
        );
        let grouped = Expression::Parenthetical(Box::new(or.into()));
        let and = BooleanExpression::new(BooleanOperator::And, vec![grouped, eq("b:d", "3")]).unwrap();
        assert_eq!(and.root_types(), &BTreeSet::from(["b".to_string()]));
        assert_eq!(
            Observation::from(Expression::from(and)).to_string(),
            "[(a:b = '1' OR b:c = '2') AND b:d = '3']"
        );
    }

    #[test]
    fn test_compound_and_qualified_rendering() {
        let md5 = eq("file:hashes.MD5", "79054025255fb1a26e4bc422aef54eb4");
        let key = eq("windows-registry-key:key", "HKEY_LOCAL_MACHINE\\foo\\bar");
        let followed = Observation::Compound {
            operator: ObservationOperator::FollowedBy,
            operands: vec![md5.into(), key.into()],
        };
        let qualified = Observation::Parenthetical(Box::new(followed)).qualify(Qualifier::within(300).unwrap());
        assert_eq!(
            qualified.to_string(),
            "([file:hashes.MD5 = '79054025255fb1a26e4bc422aef54eb4'] FOLLOWEDBY \
             [windows-registry-key:key = 'HKEY_LOCAL_MACHINE\\\\foo\\\\bar']) WITHIN 300 SECONDS"
        );
    }

    #[test]
    fn test_qualifiers() {
        assert_eq!(Qualifier::repeats(5).unwrap().to_string(), "REPEATS 5 TIMES");
        assert!(Qualifier::repeats("foo").is_err());
        assert!(Qualifier::within("foo").is_err());
        assert!(Qualifier::within(-1).is_err());

        let q = Qualifier::start_stop(
            Constant::String("2016-06-01T00:00:00Z".into()),
            Constant::String("2017-03-12T08:30:00Z".into()),
        )
        .unwrap();
        assert_eq!(q.to_string(), "START '2016-06-01T00:00:00Z' STOP '2017-03-12T08:30:00Z'");
        assert!(Qualifier::start_stop("foo", Constant::String("2016-06-01T00:00:00Z".into())).is_err());
        assert!(Qualifier::start_stop(Constant::String("2016-06-01".into()), "2017-03-12T08:30:00Z").is_err());
    }
}
