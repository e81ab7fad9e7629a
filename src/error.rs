//! Error types for query construction and execution.

use crate::expression::ExpressionError;
use crate::value::DataType;
use thiserror::Error;

/// A query or statement was assembled incorrectly. Raised while building,
/// before anything reaches the gateway.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("query has no source table")]
    MissingSource,

    #[error("table '{alias}' is referenced in {context} but has not been joined")]
    UnjoinedTable {
        alias: String,
        context: &'static str,
    },

    #[error("table alias '{0}' is used more than once in the same query")]
    DuplicateAlias(String),

    #[error("invalid {context}: {source}")]
    Expression {
        context: &'static str,
        #[source]
        source: ExpressionError,
    },

    #[error("'{expression}' in {context} must appear in GROUP BY or be aggregated")]
    UngroupedExpression {
        expression: String,
        context: &'static str,
    },

    #[error("column '{column}' does not belong to table '{table}'")]
    ForeignColumn { column: String, table: String },

    #[error("bulk update on '{0}' has no assignments")]
    EmptyAssignments(String),

    #[error("column '{0}' is the table identity and cannot be assigned")]
    IdentityAssignment(String),

    #[error("page size must be greater than zero")]
    InvalidPageSize,

    #[error("page size {requested} exceeds the configured maximum of {max}")]
    PageSizeTooLarge { requested: u64, max: u64 },
}

/// A projection does not fit its target type, or a row value does not fit
/// the declared projection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    #[error("{target} has no field named '{field}'")]
    UnknownField { target: &'static str, field: String },

    #[error("projection item {position} has no name to map onto {target}")]
    Unlabeled {
        target: &'static str,
        position: usize,
    },

    #[error("field '{field}' of {target} is mapped more than once")]
    DuplicateField { target: &'static str, field: String },

    #[error("{target} takes {expected} values but the projection declares {actual}")]
    ArityMismatch {
        target: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{target} expects {expected} for '{slot}' but the projection declares {actual}")]
    TypeMismatch {
        target: &'static str,
        slot: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("unexpected NULL for non-nullable {expected}")]
    UnexpectedNull { expected: DataType },

    #[error("expected {expected} value, got {actual:?}")]
    ValueType {
        expected: DataType,
        actual: Option<DataType>,
    },
}

/// Top-level error for every query, page, and bulk operation.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("'{0}' is not part of the projection")]
    Lookup(String),

    /// The gateway failed; the original error is kept as-is.
    #[error(transparent)]
    Execution(anyhow::Error),

    #[error("query returned no rows")]
    NotFound,

    #[error("query returned more than one row")]
    NonUnique,
}

impl QueryError {
    /// Whether this error reports a malformed query rather than a runtime
    /// failure.
    pub fn is_configuration(&self) -> bool {
        match self {
            QueryError::Configuration(_) => true,
            QueryError::Mapping(err) => !matches!(
                err,
                MappingError::UnexpectedNull { .. } | MappingError::ValueType { .. }
            ),
            _ => false,
        }
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::UnjoinedTable {
            alias: "team".to_string(),
            context: "WHERE clause",
        };
        assert_eq!(
            err.to_string(),
            "table 'team' is referenced in WHERE clause but has not been joined"
        );

        let err = MappingError::UnknownField {
            target: "UserDto",
            field: "nickname".to_string(),
        };
        assert_eq!(err.to_string(), "UserDto has no field named 'nickname'");

        let err = QueryError::from(ConfigError::InvalidPageSize);
        assert_eq!(err.to_string(), "page size must be greater than zero");
    }

    #[test]
    fn test_is_configuration() {
        assert!(QueryError::from(ConfigError::MissingSource).is_configuration());
        assert!(QueryError::from(MappingError::ArityMismatch {
            target: "MemberDto",
            expected: 2,
            actual: 3,
        })
        .is_configuration());
        assert!(!QueryError::from(MappingError::UnexpectedNull {
            expected: DataType::Int32
        })
        .is_configuration());
        assert!(!QueryError::NotFound.is_configuration());
        assert!(!QueryError::Execution(anyhow::anyhow!("connection reset")).is_configuration());
    }
}
