//! Error types for expression checking and evaluation.

use crate::value::DataType;
use thiserror::Error;

/// Errors that can occur while type checking or evaluating an expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Type mismatch in operation
    #[error("Type mismatch in {context}: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: DataType,
        actual: DataType,
        context: String,
    },

    /// Invalid operand types for operator
    #[error("Invalid operand types for operator {operator}: left={left_type:?}, right={right_type:?}")]
    InvalidOperandTypes {
        operator: String,
        left_type: Option<DataType>,
        right_type: Option<DataType>,
    },

    /// Column refers to a table occurrence that is not in scope
    #[error("Table '{alias}' is not in scope")]
    UnknownTable { alias: String },

    /// Column is not part of the table it claims to belong to
    #[error("Table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },

    /// Subquery reuses an alias of the enclosing query
    #[error("Subquery alias '{alias}' shadows an outer table")]
    AliasCollision { alias: String },

    /// Aggregate used where only row values are available
    #[error("Aggregate function not allowed in {context}")]
    MisplacedAggregate { context: String },

    /// Scalar subquery produced more than one row
    #[error("Scalar subquery returned {rows} rows")]
    ScalarSubqueryRows { rows: usize },

    /// Integer arithmetic overflowed
    #[error("Arithmetic overflow in {operator}")]
    ArithmeticOverflow { operator: String },

    /// Generic evaluation error
    #[error("Expression evaluation error: {message}")]
    EvaluationError { message: String },
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
