//! Typed column handles and typed expressions.
//!
//! Every typed expression carries the Rust type of its value. Comparison
//! methods only accept literals convertible to that type, so
//! `MEMBER.age.eq("ten")` is rejected by the compiler. Comparisons between two
//! expressions (`eq_expr` and friends) are checked when the query is built.

use crate::expression::expr::{ColumnRef, Expression, SelectItem};
use crate::expression::operator::{AggregateFunction, BinaryOperator, UnaryOperator};
use crate::expression::order::{OrderSpec, SortOrder};
use crate::expression::predicate::Predicate;
use crate::expression::subquery::SubQuery;
use crate::value::{IntoLiteral, NumericType, SqlType, TextType, Value};
use std::fmt;
use std::marker::PhantomData;

/// An expression whose value decodes into `Self::Output`
pub trait TypedExpr {
    type Output: SqlType;

    fn expression(&self) -> Expression;

    fn select_item(&self) -> SelectItem {
        SelectItem::new(self.expression())
    }
}

/// Column of a table occurrence, typed by its Rust value type.
/// Nullable columns use `Option<T>`.
pub struct Column<T> {
    column: ColumnRef,
    _marker: PhantomData<fn() -> T>,
}

impl<T: SqlType> Column<T> {
    pub const fn new(table: &'static str, name: &'static str) -> Self {
        Self {
            column: ColumnRef::new(table, name, T::DATA_TYPE, T::NULLABLE),
            _marker: PhantomData,
        }
    }
}

impl<T> Column<T> {
    pub fn column_ref(&self) -> ColumnRef {
        self.column
    }

    pub fn name(&self) -> &'static str {
        self.column.name
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Column<T> {}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Column({})", self.column)
    }
}

impl<T: SqlType> TypedExpr for Column<T> {
    type Output = T;

    fn expression(&self) -> Expression {
        Expression::Column(self.column)
    }
}

/// Computed typed expression (arithmetic, aggregates, CASE, constants)
pub struct Expr<T> {
    expr: Expression,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Expr<T> {
    pub(crate) fn new(expr: Expression) -> Self {
        Self {
            expr,
            _marker: PhantomData,
        }
    }

    pub fn into_untyped(self) -> Expression {
        self.expr
    }
}

impl<T> Clone for Expr<T> {
    fn clone(&self) -> Self {
        Expr::new(self.expr.clone())
    }
}

impl<T> fmt::Debug for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({})", self.expr)
    }
}

impl<T: SqlType> TypedExpr for Expr<T> {
    type Output = T;

    fn expression(&self) -> Expression {
        self.expr.clone()
    }
}

/// A typed expression with an output alias
pub struct Aliased<T> {
    expr: Expression,
    alias: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Aliased<T> {
    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl<T> Clone for Aliased<T> {
    fn clone(&self) -> Self {
        Self {
            expr: self.expr.clone(),
            alias: self.alias.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Aliased<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Aliased({} AS {})", self.expr, self.alias)
    }
}

impl<T: SqlType> TypedExpr for Aliased<T> {
    type Output = T;

    fn expression(&self) -> Expression {
        self.expr.clone()
    }

    fn select_item(&self) -> SelectItem {
        SelectItem::aliased(self.expr.clone(), self.alias.clone())
    }
}

/// A typed constant (`SELECT 'A' ...`)
pub fn constant<T: SqlType>(value: impl IntoLiteral<T>) -> Expr<T> {
    Expr::new(Expression::Literal(value.into_literal()))
}

/// `COUNT(*)`
pub fn count_all() -> Expr<i64> {
    Expr::new(Expression::count_all())
}

fn compare<E: TypedExpr + ?Sized>(lhs: &E, op: BinaryOperator, rhs: Expression) -> Predicate {
    Predicate::from_expression(Expression::binary_op(op, lhs.expression(), rhs))
}

/// Operators available on every typed expression
pub trait ExprOps: TypedExpr {
    fn eq<V: IntoLiteral<Self::Output>>(&self, value: V) -> Predicate {
        compare(self, BinaryOperator::Eq, Expression::Literal(value.into_literal()))
    }

    fn ne<V: IntoLiteral<Self::Output>>(&self, value: V) -> Predicate {
        compare(self, BinaryOperator::Ne, Expression::Literal(value.into_literal()))
    }

    fn gt<V: IntoLiteral<Self::Output>>(&self, value: V) -> Predicate {
        compare(self, BinaryOperator::Gt, Expression::Literal(value.into_literal()))
    }

    /// Greater than or equal
    fn goe<V: IntoLiteral<Self::Output>>(&self, value: V) -> Predicate {
        compare(self, BinaryOperator::Ge, Expression::Literal(value.into_literal()))
    }

    fn lt<V: IntoLiteral<Self::Output>>(&self, value: V) -> Predicate {
        compare(self, BinaryOperator::Lt, Expression::Literal(value.into_literal()))
    }

    /// Less than or equal
    fn loe<V: IntoLiteral<Self::Output>>(&self, value: V) -> Predicate {
        compare(self, BinaryOperator::Le, Expression::Literal(value.into_literal()))
    }

    fn eq_expr<E: TypedExpr>(&self, other: &E) -> Predicate {
        compare(self, BinaryOperator::Eq, other.expression())
    }

    fn ne_expr<E: TypedExpr>(&self, other: &E) -> Predicate {
        compare(self, BinaryOperator::Ne, other.expression())
    }

    fn gt_expr<E: TypedExpr>(&self, other: &E) -> Predicate {
        compare(self, BinaryOperator::Gt, other.expression())
    }

    fn goe_expr<E: TypedExpr>(&self, other: &E) -> Predicate {
        compare(self, BinaryOperator::Ge, other.expression())
    }

    fn lt_expr<E: TypedExpr>(&self, other: &E) -> Predicate {
        compare(self, BinaryOperator::Lt, other.expression())
    }

    fn loe_expr<E: TypedExpr>(&self, other: &E) -> Predicate {
        compare(self, BinaryOperator::Le, other.expression())
    }

    /// Inclusive range
    fn between<V: IntoLiteral<Self::Output>>(&self, low: V, high: V) -> Predicate {
        Predicate::from_expression(Expression::Between {
            expr: Box::new(self.expression()),
            low: Box::new(Expression::Literal(low.into_literal())),
            high: Box::new(Expression::Literal(high.into_literal())),
            negated: false,
        })
    }

    fn in_list<V, I>(&self, values: I) -> Predicate
    where
        V: IntoLiteral<Self::Output>,
        I: IntoIterator<Item = V>,
    {
        Predicate::from_expression(Expression::In {
            expr: Box::new(self.expression()),
            list: values
                .into_iter()
                .map(|v| Expression::Literal(v.into_literal()))
                .collect(),
            negated: false,
        })
    }

    fn not_in<V, I>(&self, values: I) -> Predicate
    where
        V: IntoLiteral<Self::Output>,
        I: IntoIterator<Item = V>,
    {
        Predicate::from_expression(Expression::In {
            expr: Box::new(self.expression()),
            list: values
                .into_iter()
                .map(|v| Expression::Literal(v.into_literal()))
                .collect(),
            negated: true,
        })
    }

    fn in_subquery<S: SqlType>(&self, subquery: &SubQuery<S>) -> Predicate {
        Predicate::from_expression(Expression::InSubquery {
            expr: Box::new(self.expression()),
            subquery: Box::new(subquery.plan().clone()),
            negated: false,
        })
    }

    fn not_in_subquery<S: SqlType>(&self, subquery: &SubQuery<S>) -> Predicate {
        Predicate::from_expression(Expression::InSubquery {
            expr: Box::new(self.expression()),
            subquery: Box::new(subquery.plan().clone()),
            negated: true,
        })
    }

    fn is_null(&self) -> Predicate {
        Predicate::from_expression(Expression::unary_op(
            UnaryOperator::IsNull,
            self.expression(),
        ))
    }

    fn is_not_null(&self) -> Predicate {
        Predicate::from_expression(Expression::unary_op(
            UnaryOperator::IsNotNull,
            self.expression(),
        ))
    }

    /// Ascending, NULLs first unless overridden
    fn asc(&self) -> OrderSpec {
        OrderSpec::new(self.expression(), SortOrder::Asc)
    }

    /// Descending, NULLs last unless overridden
    fn desc(&self) -> OrderSpec {
        OrderSpec::new(self.expression(), SortOrder::Desc)
    }

    fn as_(&self, alias: impl Into<String>) -> Aliased<Self::Output> {
        Aliased {
            expr: self.expression(),
            alias: alias.into(),
            _marker: PhantomData,
        }
    }

    fn max(&self) -> Expr<<Self::Output as SqlType>::Nullable> {
        Expr::new(Expression::aggregate(AggregateFunction::Max, self.expression()))
    }

    fn min(&self) -> Expr<<Self::Output as SqlType>::Nullable> {
        Expr::new(Expression::aggregate(AggregateFunction::Min, self.expression()))
    }

    /// Number of non-NULL values in the group
    fn count(&self) -> Expr<i64> {
        Expr::new(Expression::aggregate(
            AggregateFunction::Count,
            self.expression(),
        ))
    }

    /// Text form of the value
    fn string_value(&self) -> Expr<Option<String>> {
        Expr::new(Expression::unary_op(
            UnaryOperator::ToText,
            self.expression(),
        ))
    }
}

impl<E: TypedExpr + ?Sized> ExprOps for E {}

/// Operators on text expressions
pub trait TextOps: TypedExpr
where
    Self::Output: TextType,
{
    /// Substring match. An empty needle matches every non-NULL value.
    fn contains(&self, needle: &str) -> Predicate {
        compare(
            self,
            BinaryOperator::Contains,
            Expression::Literal(Value::String(needle.to_string())),
        )
    }

    fn starts_with(&self, prefix: &str) -> Predicate {
        compare(
            self,
            BinaryOperator::StartsWith,
            Expression::Literal(Value::String(prefix.to_string())),
        )
    }

    fn ends_with(&self, suffix: &str) -> Predicate {
        compare(
            self,
            BinaryOperator::EndsWith,
            Expression::Literal(Value::String(suffix.to_string())),
        )
    }

    fn concat(&self, suffix: &str) -> Expr<Self::Output> {
        Expr::new(Expression::binary_op(
            BinaryOperator::Concat,
            self.expression(),
            Expression::Literal(Value::String(suffix.to_string())),
        ))
    }

    fn concat_expr<E>(&self, other: &E) -> Expr<Option<String>>
    where
        E: TypedExpr,
        E::Output: TextType,
    {
        Expr::new(Expression::binary_op(
            BinaryOperator::Concat,
            self.expression(),
            other.expression(),
        ))
    }
}

impl<E> TextOps for E
where
    E: TypedExpr + ?Sized,
    E::Output: TextType,
{
}

/// Operators on numeric expressions
pub trait NumericOps: TypedExpr
where
    Self::Output: NumericType,
{
    fn add<V: IntoLiteral<Self::Output>>(&self, value: V) -> Expr<Self::Output> {
        Expr::new(Expression::add_expr(
            self.expression(),
            Expression::Literal(value.into_literal()),
        ))
    }

    fn sub<V: IntoLiteral<Self::Output>>(&self, value: V) -> Expr<Self::Output> {
        Expr::new(Expression::binary_op(
            BinaryOperator::Sub,
            self.expression(),
            Expression::Literal(value.into_literal()),
        ))
    }

    fn sum(&self) -> Expr<<Self::Output as NumericType>::Sum> {
        Expr::new(Expression::aggregate(AggregateFunction::Sum, self.expression()))
    }

    fn avg(&self) -> Expr<Option<f64>> {
        Expr::new(Expression::aggregate(AggregateFunction::Avg, self.expression()))
    }
}

impl<E> NumericOps for E
where
    E: TypedExpr + ?Sized,
    E::Output: NumericType,
{
}
