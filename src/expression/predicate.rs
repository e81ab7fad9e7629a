//! Boolean predicates with a neutral "always true" element.

use crate::expression::expr::Expression;
use crate::value::Value;
use std::fmt;
use std::ops::Not;

/// A composable boolean condition.
///
/// A predicate with no terms is "always true": it is the identity for
/// [`Predicate::and`] and absorbs [`Predicate::or`]. Plans carrying such a
/// predicate run unfiltered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Predicate {
    root: Option<Expression>,
}

impl Predicate {
    /// The neutral predicate
    pub fn always() -> Self {
        Self { root: None }
    }

    pub fn from_expression(expr: Expression) -> Self {
        Self { root: Some(expr) }
    }

    /// Whether no condition has been accumulated
    pub fn is_always(&self) -> bool {
        self.root.is_none()
    }

    pub fn and(self, other: Predicate) -> Predicate {
        match (self.root, other.root) {
            (None, root) | (root, None) => Predicate { root },
            (Some(left), Some(right)) => Predicate::from_expression(Expression::and(left, right)),
        }
    }

    pub fn or(self, other: Predicate) -> Predicate {
        match (self.root, other.root) {
            (Some(left), Some(right)) => Predicate::from_expression(Expression::or(left, right)),
            _ => Predicate::always(),
        }
    }

    pub fn expression(&self) -> Option<&Expression> {
        self.root.as_ref()
    }

    /// Lower to a plain expression; the neutral predicate becomes `TRUE`
    pub fn into_expression(self) -> Expression {
        self.root
            .unwrap_or(Expression::Literal(Value::Boolean(true)))
    }
}

impl Not for Predicate {
    type Output = Predicate;

    /// Negating "always true" yields a predicate no row satisfies.
    fn not(self) -> Predicate {
        match self.root {
            Some(expr) => Predicate::from_expression(Expression::not_expr(expr)),
            None => Predicate::from_expression(Expression::Literal(Value::Boolean(false))),
        }
    }
}

impl From<Expression> for Predicate {
    fn from(expr: Expression) -> Self {
        Predicate::from_expression(expr)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Some(expr) => write!(f, "{}", expr),
            None => f.write_str("TRUE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::expr::ColumnRef;
    use crate::value::DataType;

    fn age_over(n: i32) -> Predicate {
        let age = ColumnRef::new("member", "age", DataType::Int32, false);
        Predicate::from_expression(Expression::gt(
            Expression::column(age),
            Expression::literal(Value::Int32(n)),
        ))
    }

    #[test]
    fn test_neutral_element() {
        let p = age_over(10);
        assert_eq!(Predicate::always().and(p.clone()), p);
        assert_eq!(p.clone().and(Predicate::always()), p);
        assert!(Predicate::always().or(p.clone()).is_always());
        assert!(p.or(Predicate::always()).is_always());
        assert!(Predicate::default().is_always());
    }

    #[test]
    fn test_into_expression() {
        assert_eq!(
            Predicate::always().into_expression(),
            Expression::Literal(Value::Boolean(true))
        );
        let combined = age_over(10).and(age_over(20));
        assert!(matches!(
            combined.into_expression(),
            Expression::BinaryOp { .. }
        ));
    }

    #[test]
    fn test_not() {
        assert_eq!(
            (!Predicate::always()).into_expression(),
            Expression::Literal(Value::Boolean(false))
        );
        assert_eq!(
            (!age_over(10)).to_string(),
            "(NOT (member.age > 10))"
        );
    }
}
