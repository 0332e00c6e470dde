//! Recursive-descent parser for STIX patterns.
//!
//! Precedence, loosest first:
//!
//! ```text
//! pattern      := obs_or (FOLLOWEDBY obs_or)*
//! obs_or       := obs_and (OR obs_and)*
//! obs_and      := qualified (AND qualified)*
//! qualified    := obs_primary (WITHIN n SECONDS | REPEATS n TIMES | START t STOP t)*
//! obs_primary  := '[' expr_or ']' | '(' pattern ')'
//! expr_or      := expr_and (OR expr_and)*
//! expr_and     := prop_test (AND prop_test)*
//! prop_test    := '(' expr_or ')' | EXISTS path | path [NOT] operator literal
//! ```
//!
//! Runs of the same operator are collected into one flat node. Nesting of
//! brackets and parentheses is bounded by [`MAX_PATTERN_DEPTH`].

use crate::error::PatternError;
use crate::limits::{MAX_PATTERN_DEPTH, MAX_PATTERN_LEN};
use crate::model::SpecVersion;
use crate::pattern::ast::{
    BooleanOperator, ComparisonOperator, Expression, ListIndex, ObjectPath, Observation,
    ObservationOperator, PathComponent,
};
use crate::pattern::constant::Constant;
use crate::pattern::factory::{DefaultNodeFactory, NodeFactory};
use crate::pattern::lexer::{Keyword, Token, TokenKind, tokenize};

/// Parses a complete pattern.
pub(crate) fn parse_pattern(
    text: &str,
    version: SpecVersion,
    factory: &dyn NodeFactory,
) -> Result<Observation, PatternError> {
    let mut parser = Parser::new(text, version, factory)?;
    let observation = parser.followed_by()?;
    parser.expect_end()?;
    Ok(observation)
}

/// Parses a lone object path such as `file:hashes.'SHA-256'`.
pub(crate) fn parse_object_path(text: &str, version: SpecVersion) -> Result<ObjectPath, PatternError> {
    let mut parser = Parser::new(text, version, &DefaultNodeFactory)?;
    let path = parser.object_path()?;
    parser.expect_end()?;
    Ok(path)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    version: SpecVersion,
    factory: &'a dyn NodeFactory,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &str, version: SpecVersion, factory: &'a dyn NodeFactory) -> Result<Self, PatternError> {
        if text.len() > MAX_PATTERN_LEN {
            return Err(PatternError::TooLong {
                len: text.len(),
                max: MAX_PATTERN_LEN,
            });
        }
        Ok(Parser {
            tokens: tokenize(text)?,
            pos: 0,
            version,
            factory,
            depth: 0,
        })
    }

    // =========================================================================
    // TOKEN CURSOR
    // =========================================================================

    fn peek(&self) -> &TokenKind {
        // The token list always ends with Eof and the cursor never passes it.
        &self.tokens[self.pos].kind
    }

    fn peek_keyword(&self) -> Option<Keyword> {
        match self.peek() {
            TokenKind::Keyword(k) => Some(*k),
            _ => None,
        }
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.peek_keyword() == Some(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<(), PatternError> {
        if *self.peek() == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword, expected: &str) -> Result<(), PatternError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_end(&self) -> Result<(), PatternError> {
        match self.peek() {
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of pattern")),
        }
    }

    /// Error at the current token.
    fn unexpected(&self, expected: &str) -> PatternError {
        let token = &self.tokens[self.pos];
        mismatch(&token.kind, token.position, expected)
    }

    fn enter(&mut self) -> Result<(), PatternError> {
        self.depth += 1;
        if self.depth > MAX_PATTERN_DEPTH {
            return Err(PatternError::TooDeep {
                max: MAX_PATTERN_DEPTH,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // =========================================================================
    // OBSERVATIONS
    // =========================================================================

    fn followed_by(&mut self) -> Result<Observation, PatternError> {
        let mut operands = vec![self.observation_or()?];
        while self.eat_keyword(Keyword::FollowedBy) {
            operands.push(self.observation_or()?);
        }
        self.combine_observations(ObservationOperator::FollowedBy, operands)
    }

    fn observation_or(&mut self) -> Result<Observation, PatternError> {
        let mut operands = vec![self.observation_and()?];
        while self.eat_keyword(Keyword::Or) {
            operands.push(self.observation_and()?);
        }
        self.combine_observations(ObservationOperator::Or, operands)
    }

    fn observation_and(&mut self) -> Result<Observation, PatternError> {
        let mut operands = vec![self.qualified()?];
        while self.eat_keyword(Keyword::And) {
            operands.push(self.qualified()?);
        }
        self.combine_observations(ObservationOperator::And, operands)
    }

    fn combine_observations(
        &self,
        operator: ObservationOperator,
        mut operands: Vec<Observation>,
    ) -> Result<Observation, PatternError> {
        match operands.pop() {
            Some(only) if operands.is_empty() => Ok(only),
            Some(last) => {
                operands.push(last);
                self.factory.compound_observation(operator, operands)
            }
            None => Err(self.unexpected("an observation expression")),
        }
    }

    fn qualified(&mut self) -> Result<Observation, PatternError> {
        let mut observation = self.observation_primary()?;
        loop {
            let qualifier = match self.peek_keyword() {
                Some(Keyword::Within) => {
                    self.advance();
                    let seconds = self.number("a number of seconds")?;
                    self.expect_keyword(Keyword::Seconds, "SECONDS")?;
                    self.factory.within_qualifier(seconds)?
                }
                Some(Keyword::Repeats) => {
                    self.advance();
                    let times = self.number("a repeat count")?;
                    self.expect_keyword(Keyword::Times, "TIMES")?;
                    self.factory.repeat_qualifier(times)?
                }
                Some(Keyword::Start) => {
                    self.advance();
                    let start = self.start_stop_bound()?;
                    self.expect_keyword(Keyword::Stop, "STOP")?;
                    let stop = self.start_stop_bound()?;
                    self.factory.start_stop_qualifier(start, stop)?
                }
                _ => return Ok(observation),
            };
            observation = self.factory.qualified_observation(observation, qualifier)?;
        }
    }

    fn observation_primary(&mut self) -> Result<Observation, PatternError> {
        match self.peek() {
            TokenKind::LeftBracket => {
                self.advance();
                self.enter()?;
                let expression = self.expression_or()?;
                self.expect(TokenKind::RightBracket, "']'")?;
                self.leave();
                self.factory.observation(expression)
            }
            TokenKind::LeftParen => {
                self.advance();
                self.enter()?;
                let inner = self.followed_by()?;
                self.expect(TokenKind::RightParen, "')'")?;
                self.leave();
                self.factory.parenthetical_observation(inner)
            }
            _ => Err(self.unexpected("'[' or '('")),
        }
    }

    fn number(&mut self, expected: &str) -> Result<Constant, PatternError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Integer(i) => self.factory.integer_constant(i),
            TokenKind::Float(x) => self.factory.float_constant(x),
            other => Err(mismatch(&other, token.position, expected)),
        }
    }

    /// STIX 2.0 bounds are timestamp strings, STIX 2.1 bounds are `t'...'`.
    fn start_stop_bound(&mut self) -> Result<Constant, PatternError> {
        let token = self.advance();
        match (token.kind, self.version) {
            (TokenKind::String(text), SpecVersion::V20) => self.factory.string_constant(text),
            (TokenKind::Timestamp(text), SpecVersion::V21) => self.factory.timestamp_constant(text),
            (other, SpecVersion::V20) => Err(mismatch(&other, token.position, "a timestamp string")),
            (other, SpecVersion::V21) => Err(mismatch(&other, token.position, "a timestamp literal")),
        }
    }

    // =========================================================================
    // EXPRESSIONS
    // =========================================================================

    fn expression_or(&mut self) -> Result<Expression, PatternError> {
        let mut operands = vec![self.expression_and()?];
        while self.eat_keyword(Keyword::Or) {
            operands.push(self.expression_and()?);
        }
        self.combine_expressions(BooleanOperator::Or, operands)
    }

    fn expression_and(&mut self) -> Result<Expression, PatternError> {
        let mut operands = vec![self.prop_test()?];
        while self.eat_keyword(Keyword::And) {
            operands.push(self.prop_test()?);
        }
        self.combine_expressions(BooleanOperator::And, operands)
    }

    fn combine_expressions(
        &self,
        operator: BooleanOperator,
        mut operands: Vec<Expression>,
    ) -> Result<Expression, PatternError> {
        match operands.pop() {
            Some(only) if operands.is_empty() => Ok(only),
            Some(last) => {
                operands.push(last);
                self.factory.boolean_expression(operator, operands)
            }
            None => Err(self.unexpected("a comparison expression")),
        }
    }

    fn prop_test(&mut self) -> Result<Expression, PatternError> {
        match self.peek() {
            TokenKind::LeftParen => {
                self.advance();
                self.enter()?;
                let inner = self.expression_or()?;
                self.expect(TokenKind::RightParen, "')'")?;
                self.leave();
                return self.factory.parenthetical_expression(inner);
            }
            TokenKind::Keyword(Keyword::Exists) if self.version == SpecVersion::V21 => {
                self.advance();
                let path = self.object_path()?;
                return self.factory.exists(path);
            }
            _ => {}
        }

        let path = self.object_path()?;
        let negated = self.eat_keyword(Keyword::Not);
        let token = self.advance();
        let operator = match token.kind {
            TokenKind::Equal => ComparisonOperator::Equal,
            TokenKind::NotEqual => ComparisonOperator::NotEqual,
            TokenKind::Greater => ComparisonOperator::GreaterThan,
            TokenKind::GreaterEqual => ComparisonOperator::GreaterThanOrEqual,
            TokenKind::Less => ComparisonOperator::LessThan,
            TokenKind::LessEqual => ComparisonOperator::LessThanOrEqual,
            TokenKind::Keyword(Keyword::In) => ComparisonOperator::In,
            TokenKind::Keyword(Keyword::Like) => ComparisonOperator::Like,
            TokenKind::Keyword(Keyword::Matches) => ComparisonOperator::Matches,
            TokenKind::Keyword(Keyword::IsSubset) => ComparisonOperator::IsSubset,
            TokenKind::Keyword(Keyword::IsSuperset) => ComparisonOperator::IsSuperset,
            other => return Err(mismatch(&other, token.position, "a comparison operator")),
        };
        let rhs = match operator {
            ComparisonOperator::Equal | ComparisonOperator::NotEqual => self.literal(true)?,
            ComparisonOperator::GreaterThan
            | ComparisonOperator::LessThan
            | ComparisonOperator::GreaterThanOrEqual
            | ComparisonOperator::LessThanOrEqual => self.literal(false)?,
            ComparisonOperator::In => self.set_literal()?,
            ComparisonOperator::Like
            | ComparisonOperator::Matches
            | ComparisonOperator::IsSubset
            | ComparisonOperator::IsSuperset => self.string_literal()?,
        };
        self.factory.comparison(operator, path, rhs, negated)
    }

    // =========================================================================
    // LITERALS
    // =========================================================================

    /// A primitive literal; booleans only when `allow_boolean` is set.
    fn literal(&mut self, allow_boolean: bool) -> Result<Constant, PatternError> {
        let token = self.advance();
        match token.kind {
            TokenKind::String(s) => self.factory.string_constant(s),
            TokenKind::Integer(i) => self.factory.integer_constant(i),
            TokenKind::Float(x) => self.factory.float_constant(x),
            TokenKind::Hex(h) => self.factory.hex_constant(h),
            TokenKind::Binary(b) => self.factory.binary_constant(b),
            TokenKind::Timestamp(t) if self.version == SpecVersion::V21 => self.factory.timestamp_constant(t),
            TokenKind::Boolean(b) if allow_boolean => self.factory.boolean_constant(b),
            other => Err(mismatch(
                &other,
                token.position,
                if allow_boolean { "a literal" } else { "an orderable literal" },
            )),
        }
    }

    /// `( literal, ... )`, possibly empty.
    fn set_literal(&mut self) -> Result<Constant, PatternError> {
        self.expect(TokenKind::LeftParen, "'('")?;
        let mut values = Vec::new();
        if *self.peek() != TokenKind::RightParen {
            values.push(self.literal(true)?);
            while *self.peek() == TokenKind::Comma {
                self.advance();
                values.push(self.literal(true)?);
            }
        }
        self.expect(TokenKind::RightParen, "',' or ')'")?;
        self.factory.list_constant(values)
    }

    fn string_literal(&mut self) -> Result<Constant, PatternError> {
        let token = self.advance();
        match token.kind {
            TokenKind::String(s) => self.factory.string_constant(s),
            other => Err(mismatch(&other, token.position, "a string literal")),
        }
    }

    // =========================================================================
    // OBJECT PATHS
    // =========================================================================

    fn object_path(&mut self) -> Result<ObjectPath, PatternError> {
        let token = self.advance();
        let object_type = match token.kind {
            TokenKind::Identifier(name) => name,
            other => return Err(mismatch(&other, token.position, "an object type")),
        };
        self.expect(TokenKind::Colon, "':'")?;

        let mut components = vec![self.path_step()?];
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    components.push(self.path_step()?);
                }
                TokenKind::LeftBracket => {
                    let position = self.tokens[self.pos].position;
                    self.advance();
                    let index = self.list_index()?;
                    self.expect(TokenKind::RightBracket, "']'")?;
                    let indexed = match components.pop() {
                        Some((PathComponent::Basic(name) | PathComponent::Reference(name), quoted)) => {
                            PathComponent::List { name, index, quoted }
                        }
                        _ => {
                            return Err(PatternError::Syntax {
                                position,
                                message: "an index must follow a property name".to_string(),
                            });
                        }
                    };
                    components.push((indexed, false));
                }
                _ => break,
            }
        }
        let components = components.into_iter().map(|(component, _)| component).collect();
        self.factory.object_path(object_type, components)
    }

    /// One property step and whether it was quoted in the source.
    fn path_step(&mut self) -> Result<(PathComponent, bool), PatternError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Identifier(name) if name.contains('-') => Err(PatternError::Syntax {
                position: token.position,
                message: format!("property name '{}' must be quoted", name),
            }),
            TokenKind::Identifier(name) => Ok((PathComponent::named(name), false)),
            TokenKind::String(name) => Ok((PathComponent::Basic(name), true)),
            other => Err(mismatch(&other, token.position, "a property name")),
        }
    }

    fn list_index(&mut self) -> Result<ListIndex, PatternError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Integer(i) => Ok(ListIndex::Position(i)),
            TokenKind::Asterisk => Ok(ListIndex::Any),
            other => Err(mismatch(&other, token.position, "a list index or '*'")),
        }
    }
}

fn mismatch(found: &TokenKind, position: usize, expected: &str) -> PatternError {
    PatternError::Syntax {
        position,
        message: format!("expected {}, found {}", expected, found.describe()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(text: &str, version: SpecVersion) -> String {
        parse_pattern(text, version, &DefaultNodeFactory).unwrap().to_string()
    }

    fn parse_error(text: &str, version: SpecVersion) -> PatternError {
        parse_pattern(text, version, &DefaultNodeFactory).unwrap_err()
    }

    #[test]
    fn test_canonical_patterns_roundtrip() {
        let v20 = [
            "[file:hashes.'SHA-256' = 'aec070645fe53ee3b3763059376134f058cc337247c978add178b6ccdfb0019f']",
            "[network-traffic:dst_ref.type = 'domain-name' AND network-traffic:dst_ref.value = 'example.com'] REPEATS 5 TIMES WITHIN 1800 SECONDS",
            "[ipv4-addr:value = '1.2.3.4'] START '2016-06-01T00:00:00Z' STOP '2017-03-12T08:30:00Z'",
            "[network-traffic:src_ref.value IN ('10.0.0.0', '10.0.0.1', '10.0.0.2')]",
            "([file:hashes.MD5 = '79054025255fb1a26e4bc422aef54eb4'] FOLLOWEDBY [windows-registry-key:key = 'HKEY_LOCAL_MACHINE\\\\foo\\\\bar']) WITHIN 300 SECONDS",
            "[file:extensions.'windows-pebinary-ext'.sections[*].entropy > 7.0]",
            "[artifact:payload_bin = b'dGhpcyBpcyBhIHRlc3Q=']",
            "[file:mime_type = 'image/bmp' AND file:magic_number_hex = h'ffd8']",
            "[email-message:is_multipart = true]",
            "[file:size NOT < 1024]",
            "[directory:path LIKE 'C:\\\\Windows\\\\%\\\\foo']",
            "[ipv4-addr:value ISSUPERSET '198.51.100.0/24'] OR [ipv4-addr:value ISSUBSET '198.51.100.0/24']",
        ];
        for text in v20 {
            assert_eq!(roundtrip(text, SpecVersion::V20), text);
        }
        let v21 = [
            "[a:b = 1 AND a:b = 2 OR a:b = 3]",
            "[a:b = 1 OR a:b = 2 AND a:b = 3]",
            "[ipv4-addr:value = '1.2.3.4'] START t'2016-06-01T00:00:00Z' STOP t'2017-03-12T08:30:00.5Z'",
            "[file:created > t'2016-06-01T00:00:00Z']",
            "[EXISTS windows-registry-key:values AND windows-registry-key:key = 'k']",
            "[x:y IN ()]",
        ];
        for text in v21 {
            assert_eq!(roundtrip(text, SpecVersion::V21), text);
        }
    }

    #[test]
    fn test_normalized_rendering() {
        assert_eq!(roundtrip("[a:b[1]=2]", SpecVersion::V21), "[a:b[1] = 2]");
        assert_eq!(roundtrip("[a:'b'[1]=2]", SpecVersion::V21), "[a:'b'[1] = 2]");
        assert_eq!(roundtrip("[a:b.'b'[1]=2]", SpecVersion::V21), "[a:b.'b'[1] = 2]");
        assert_eq!(roundtrip("[a:'b'[1].'c' < 'foo']", SpecVersion::V21), "[a:'b'[1].c < 'foo']");
        assert_eq!(roundtrip("[a:b == 1 AND a:c <> +2]", SpecVersion::V21), "[a:b = 1 AND a:c != 2]");
        assert_eq!(roundtrip("[a:b = TRUE]", SpecVersion::V21), "[a:b = true]");
    }

    #[test]
    fn test_tree_shape() {
        let observation = parse_pattern("[a:b = 1 AND a:b = 2 OR a:b = 3]", SpecVersion::V21, &DefaultNodeFactory).unwrap();
        let Observation::Simple(Expression::Boolean(or)) = observation else {
            panic!("expected a boolean expression");
        };
        assert_eq!(or.operator(), BooleanOperator::Or);
        assert_eq!(or.operands().len(), 2);
        assert!(matches!(&or.operands()[0], Expression::Boolean(and) if and.operator() == BooleanOperator::And));

        let flat = parse_pattern("[a:b = 1] AND [c:d = 2] AND [e:f = 3]", SpecVersion::V21, &DefaultNodeFactory).unwrap();
        assert!(matches!(flat, Observation::Compound { operator: ObservationOperator::And, ref operands } if operands.len() == 3));
    }

    #[test]
    fn test_mixed_object_types() {
        let err = parse_error("[user-account:display_name = 'admin' AND email-addr:display_name = 'admin']", SpecVersion::V21);
        assert_eq!(err, PatternError::MixedObjectTypes { operator: "AND" });
        // OR accumulates root types, so an AND over the group still has one in common.
        roundtrip("[(a:b = '1' OR b:c = '2') AND b:d = '3']", SpecVersion::V21);
    }

    #[test]
    fn test_version_differences() {
        assert!(matches!(
            parse_error("[ipv4-addr:value = '1.2.3.4'] START '2016-06-01' STOP '2017-03-12T08:30:00Z'", SpecVersion::V20),
            PatternError::InvalidQualifier { qualifier: "START/STOP", .. }
        ));
        assert!(matches!(
            parse_error("[a:b = 1] START '2016-06-01T00:00:00Z' STOP '2017-03-12T08:30:00Z'", SpecVersion::V21),
            PatternError::Syntax { .. }
        ));
        assert!(matches!(parse_error("[EXISTS a:b]", SpecVersion::V20), PatternError::Syntax { .. }));
        assert!(matches!(
            parse_error("[a:b > t'2016-06-01T00:00:00Z']", SpecVersion::V20),
            PatternError::Syntax { .. }
        ));
    }

    #[test]
    fn test_syntax_errors() {
        let cases = [
            ("[a:b = 1", 8),
            ("[a:b = 1]]", 9),
            ("[a:b LIKE 1]", 10),
            ("[a:b > true]", 7),
            ("[a:hashes.SHA-256 = 'x']", 10),
            ("a:b = 1", 0),
            ("[a:b = 1] WITHIN 'x' SECONDS", 17),
        ];
        for (text, expected) in cases {
            match parse_error(text, SpecVersion::V21) {
                PatternError::Syntax { position, .. } => assert_eq!(position, expected, "{text}"),
                other => panic!("unexpected error for {text}: {other}"),
            }
        }
        assert!(matches!(
            parse_error("[a:b = h'abc']", SpecVersion::V21),
            PatternError::InvalidConstant { kind: "hex", .. }
        ));
    }

    #[test]
    fn test_limits() {
        let deep = format!("{}[a:b = 1]{}", "(".repeat(MAX_PATTERN_DEPTH + 1), ")".repeat(MAX_PATTERN_DEPTH + 1));
        assert_eq!(parse_error(&deep, SpecVersion::V21), PatternError::TooDeep { max: MAX_PATTERN_DEPTH });

        let long = format!("[a:b = '{}']", "x".repeat(MAX_PATTERN_LEN));
        assert!(matches!(parse_error(&long, SpecVersion::V21), PatternError::TooLong { .. }));
    }

    #[test]
    fn test_object_path_from_text() {
        let path = parse_object_path("file:hashes.'SHA-256'", SpecVersion::V21).unwrap();
        assert_eq!(path.object_type, "file");
        assert_eq!(path.components, vec![
            PathComponent::Basic("hashes".into()),
            PathComponent::Basic("SHA-256".into())
        ]);
        assert!(parse_object_path("file", SpecVersion::V21).is_err());
        assert!(parse_object_path("file:name = 'x'", SpecVersion::V21).is_err());
    }
}
