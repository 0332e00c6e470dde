//! Node construction hooks for the pattern parser.
//!
//! The parser never builds nodes directly: every production goes through a
//! [`NodeFactory`] method. Implementors override the productions they care
//! about (to count, specialize or reject nodes) and inherit the defaults for
//! the rest.
//!
//! ```rust
//! use std::cell::Cell;
//! use stix2::SpecVersion;
//! use stix2::pattern::{
//!     ComparisonOperator, Constant, Expression, NodeFactory, ObjectPath, PatternError,
//!     create_pattern_object_with,
//! };
//!
//! #[derive(Default)]
//! struct CountComparisons(Cell<usize>);
//!
//! impl NodeFactory for CountComparisons {
//!     fn comparison(
//!         &self,
//!         operator: ComparisonOperator,
//!         lhs: ObjectPath,
//!         rhs: Constant,
//!         negated: bool,
//!     ) -> Result<Expression, PatternError> {
//!         self.0.set(self.0.get() + 1);
//!         stix2::pattern::DefaultNodeFactory.comparison(operator, lhs, rhs, negated)
//!     }
//! }
//!
//! let counter = CountComparisons::default();
//! create_pattern_object_with("[a:b = 1 AND a:c = 2]", SpecVersion::V21, &counter).unwrap();
//! assert_eq!(counter.0.get(), 2);
//! ```

use crate::error::PatternError;
use crate::pattern::ast::{
    BooleanExpression, BooleanOperator, ComparisonExpression, ComparisonOperator, Expression,
    ObjectPath, Observation, ObservationOperator, PathComponent, Qualifier,
};
use crate::pattern::constant::Constant;

/// Builds AST nodes for each grammar production.
pub trait NodeFactory {
    // =========================================================================
    // CONSTANTS
    // =========================================================================

    fn string_constant(&self, value: String) -> Result<Constant, PatternError> {
        Ok(Constant::String(value))
    }

    fn integer_constant(&self, value: i64) -> Result<Constant, PatternError> {
        Ok(Constant::Integer(value))
    }

    fn float_constant(&self, value: f64) -> Result<Constant, PatternError> {
        Ok(Constant::Float(value))
    }

    fn boolean_constant(&self, value: bool) -> Result<Constant, PatternError> {
        Ok(Constant::Boolean(value))
    }

    fn hex_constant(&self, value: String) -> Result<Constant, PatternError> {
        Constant::hex(&value)
    }

    fn binary_constant(&self, value: String) -> Result<Constant, PatternError> {
        Constant::binary(&value)
    }

    fn timestamp_constant(&self, value: String) -> Result<Constant, PatternError> {
        Constant::timestamp(&value)
    }

    fn list_constant(&self, values: Vec<Constant>) -> Result<Constant, PatternError> {
        Ok(Constant::List(values))
    }

    // =========================================================================
    // EXPRESSIONS
    // =========================================================================

    fn object_path(
        &self,
        object_type: String,
        components: Vec<PathComponent>,
    ) -> Result<ObjectPath, PatternError> {
        ObjectPath::new(object_type, components)
    }

    fn comparison(
        &self,
        operator: ComparisonOperator,
        lhs: ObjectPath,
        rhs: Constant,
        negated: bool,
    ) -> Result<Expression, PatternError> {
        Ok(Expression::Comparison(ComparisonExpression {
            operator,
            lhs,
            rhs,
            negated,
        }))
    }

    fn exists(&self, path: ObjectPath) -> Result<Expression, PatternError> {
        Ok(Expression::Exists(path))
    }

    fn boolean_expression(
        &self,
        operator: BooleanOperator,
        operands: Vec<Expression>,
    ) -> Result<Expression, PatternError> {
        BooleanExpression::new(operator, operands).map(Expression::Boolean)
    }

    fn parenthetical_expression(&self, inner: Expression) -> Result<Expression, PatternError> {
        Ok(Expression::Parenthetical(Box::new(inner)))
    }

    // =========================================================================
    // OBSERVATIONS
    // =========================================================================

    fn observation(&self, expression: Expression) -> Result<Observation, PatternError> {
        Ok(Observation::Simple(expression))
    }

    fn compound_observation(
        &self,
        operator: ObservationOperator,
        operands: Vec<Observation>,
    ) -> Result<Observation, PatternError> {
        Ok(Observation::Compound { operator, operands })
    }

    fn parenthetical_observation(&self, inner: Observation) -> Result<Observation, PatternError> {
        Ok(Observation::Parenthetical(Box::new(inner)))
    }

    fn qualified_observation(
        &self,
        observation: Observation,
        qualifier: Qualifier,
    ) -> Result<Observation, PatternError> {
        Ok(observation.qualify(qualifier))
    }

    fn within_qualifier(&self, seconds: Constant) -> Result<Qualifier, PatternError> {
        Qualifier::within(seconds)
    }

    fn repeat_qualifier(&self, times: Constant) -> Result<Qualifier, PatternError> {
        Qualifier::repeats(times)
    }

    fn start_stop_qualifier(&self, start: Constant, stop: Constant) -> Result<Qualifier, PatternError> {
        Qualifier::start_stop(start, stop)
    }
}

/// Builds the standard node for every production.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNodeFactory;

impl NodeFactory for DefaultNodeFactory {}
