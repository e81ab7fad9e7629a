//! Searched CASE expressions.

use crate::expression::column::{Expr, TypedExpr};
use crate::expression::expr::Expression;
use crate::expression::predicate::Predicate;
use crate::value::{IntoLiteral, SqlType};
use std::marker::PhantomData;

/// Start a CASE expression producing values of type `T`
pub fn case<T: SqlType>() -> CaseBuilder<T> {
    CaseBuilder {
        conditions: Vec::new(),
        _marker: PhantomData,
    }
}

#[derive(Debug)]
pub struct CaseBuilder<T> {
    conditions: Vec<(Expression, Expression)>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: SqlType> CaseBuilder<T> {
    pub fn when<V: IntoLiteral<T>>(mut self, condition: Predicate, value: V) -> Self {
        self.conditions.push((
            condition.into_expression(),
            Expression::Literal(value.into_literal()),
        ));
        self
    }

    pub fn when_expr<E: TypedExpr>(mut self, condition: Predicate, value: &E) -> Self {
        self.conditions
            .push((condition.into_expression(), value.expression()));
        self
    }

    pub fn otherwise<V: IntoLiteral<T>>(self, value: V) -> Expr<T> {
        Expr::new(Expression::Case {
            conditions: self.conditions,
            else_result: Some(Box::new(Expression::Literal(value.into_literal()))),
        })
    }

    /// Finish without an ELSE branch; unmatched rows yield NULL
    pub fn end(self) -> Expr<T::Nullable> {
        Expr::new(Expression::Case {
            conditions: self.conditions,
            else_result: None,
        })
    }
}
