//! Expression model for building queries.
//!
//! This module provides:
//! - Typed column handles and the operators that turn them into predicates
//! - The untyped expression AST that plans carry
//! - Type checking against the tables in scope
//! - Row evaluation with SQL NULL semantics

pub mod aggregate;
pub mod case;
pub mod column;
pub mod error;
pub mod eval;
pub mod expr;
pub mod operator;
pub mod order;
pub mod predicate;
pub mod subquery;
pub mod type_checker;

pub use aggregate::Accumulator;
pub use case::{case, CaseBuilder};
pub use column::{
    constant, count_all, Aliased, Column, Expr, ExprOps, NumericOps, TextOps, TypedExpr,
};
pub use error::{ExpressionError, ExpressionResult};
pub use eval::{EmptyRow, ExpressionEvaluator, RowSource, ScopedRow, SubqueryRunner};
pub use expr::{ColumnRef, Expression, SelectItem, SubqueryPlan};
pub use operator::{AggregateFunction, BinaryOperator, UnaryOperator};
pub use order::{NullOrder, OrderSpec, SortOrder};
pub use predicate::Predicate;
pub use subquery::{subquery, SubQuery, SubqueryBuilder};
pub use type_checker::{type_check_expression, TypeChecker};
