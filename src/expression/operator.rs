//! Operator definitions for expressions.

use crate::value::DataType;

/// Binary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Sub,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,

    // String operators
    Concat,
    Contains,
    StartsWith,
    EndsWith,
}

impl BinaryOperator {
    /// Get the output type of this operator given input types
    pub fn output_type(&self, left: DataType, right: DataType) -> Option<DataType> {
        match self {
            BinaryOperator::Add | BinaryOperator::Sub => left.widen(right),

            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Le
            | BinaryOperator::Gt
            | BinaryOperator::Ge => {
                if left.comparable_with(right) {
                    Some(DataType::Boolean)
                } else {
                    None
                }
            }

            BinaryOperator::And | BinaryOperator::Or => match (left, right) {
                (DataType::Boolean, DataType::Boolean) => Some(DataType::Boolean),
                _ => None,
            },

            BinaryOperator::Concat => match (left, right) {
                (DataType::Varchar, DataType::Varchar) => Some(DataType::Varchar),
                _ => None,
            },

            BinaryOperator::Contains | BinaryOperator::StartsWith | BinaryOperator::EndsWith => {
                match (left, right) {
                    (DataType::Varchar, DataType::Varchar) => Some(DataType::Boolean),
                    _ => None,
                }
            }
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Ne
                | BinaryOperator::Lt
                | BinaryOperator::Le
                | BinaryOperator::Gt
                | BinaryOperator::Ge
        )
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::Concat => "||",
            BinaryOperator::Contains => "CONTAINS",
            BinaryOperator::StartsWith => "STARTS WITH",
            BinaryOperator::EndsWith => "ENDS WITH",
        }
    }
}

/// Unary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    // Logical
    Not,

    // NULL checks
    IsNull,
    IsNotNull,

    // Arithmetic
    Minus,

    /// Text rendering of any value (`CAST(x AS VARCHAR)`)
    ToText,
}

impl UnaryOperator {
    /// Get the output type of this operator given input type
    pub fn output_type(&self, operand: DataType) -> Option<DataType> {
        match self {
            UnaryOperator::Not => match operand {
                DataType::Boolean => Some(DataType::Boolean),
                _ => None,
            },

            // NULL checks always return boolean regardless of input type
            UnaryOperator::IsNull | UnaryOperator::IsNotNull => Some(DataType::Boolean),

            UnaryOperator::Minus => operand.is_numeric().then_some(operand),

            UnaryOperator::ToText => Some(DataType::Varchar),
        }
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "NOT",
            UnaryOperator::IsNull => "IS NULL",
            UnaryOperator::IsNotNull => "IS NOT NULL",
            UnaryOperator::Minus => "-",
            UnaryOperator::ToText => "TEXT",
        }
    }
}

/// Supported aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    /// COUNT(*) or COUNT(expr) - counts non-NULL values
    Count,
    /// SUM(expr) - sums numeric values, ignoring NULLs
    Sum,
    /// AVG(expr) - average of numeric values, ignoring NULLs
    Avg,
    /// MIN(expr) - minimum value, ignoring NULLs
    Min,
    /// MAX(expr) - maximum value, ignoring NULLs
    Max,
}

impl AggregateFunction {
    /// Returns the name of the aggregate function
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }

    /// Output type for the given input type, or `None` if the input type is
    /// not accepted. `input` is `None` for `COUNT(*)` and NULL literals.
    pub fn output_type(&self, input: Option<DataType>) -> Option<DataType> {
        match (self, input) {
            (AggregateFunction::Count, _) => Some(DataType::Int64),
            (AggregateFunction::Sum, Some(DataType::Float64)) => Some(DataType::Float64),
            (AggregateFunction::Sum, Some(t)) if t.is_numeric() => Some(DataType::Int64),
            (AggregateFunction::Avg, Some(t)) if t.is_numeric() => Some(DataType::Float64),
            (AggregateFunction::Min | AggregateFunction::Max, Some(t)) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_operator_output_types() {
        assert_eq!(
            BinaryOperator::Add.output_type(DataType::Int32, DataType::Int32),
            Some(DataType::Int32)
        );
        assert_eq!(
            BinaryOperator::Add.output_type(DataType::Int32, DataType::Int64),
            Some(DataType::Int64)
        );
        assert_eq!(
            BinaryOperator::Add.output_type(DataType::Varchar, DataType::Varchar),
            None
        );

        assert_eq!(
            BinaryOperator::Eq.output_type(DataType::Int32, DataType::Int32),
            Some(DataType::Boolean)
        );
        assert_eq!(
            BinaryOperator::Ge.output_type(DataType::Int32, DataType::Float64),
            Some(DataType::Boolean)
        );
        assert_eq!(
            BinaryOperator::Eq.output_type(DataType::Int32, DataType::Varchar),
            None
        );

        assert_eq!(
            BinaryOperator::And.output_type(DataType::Int32, DataType::Boolean),
            None
        );

        assert_eq!(
            BinaryOperator::Concat.output_type(DataType::Varchar, DataType::Varchar),
            Some(DataType::Varchar)
        );
        assert_eq!(
            BinaryOperator::Contains.output_type(DataType::Varchar, DataType::Varchar),
            Some(DataType::Boolean)
        );
        assert_eq!(
            BinaryOperator::StartsWith.output_type(DataType::Int32, DataType::Varchar),
            None
        );
    }

    #[test]
    fn test_unary_operator_output_types() {
        assert_eq!(
            UnaryOperator::Not.output_type(DataType::Boolean),
            Some(DataType::Boolean)
        );
        assert_eq!(UnaryOperator::Not.output_type(DataType::Int32), None);
        assert_eq!(
            UnaryOperator::IsNull.output_type(DataType::Varchar),
            Some(DataType::Boolean)
        );
        assert_eq!(
            UnaryOperator::Minus.output_type(DataType::Int64),
            Some(DataType::Int64)
        );
        assert_eq!(UnaryOperator::Minus.output_type(DataType::Varchar), None);
        assert_eq!(
            UnaryOperator::ToText.output_type(DataType::Int32),
            Some(DataType::Varchar)
        );
    }

    #[test]
    fn test_aggregate_output_types() {
        assert_eq!(
            AggregateFunction::Count.output_type(None),
            Some(DataType::Int64)
        );
        assert_eq!(
            AggregateFunction::Sum.output_type(Some(DataType::Int32)),
            Some(DataType::Int64)
        );
        assert_eq!(
            AggregateFunction::Avg.output_type(Some(DataType::Int32)),
            Some(DataType::Float64)
        );
        assert_eq!(
            AggregateFunction::Max.output_type(Some(DataType::Varchar)),
            Some(DataType::Varchar)
        );
        assert_eq!(
            AggregateFunction::Sum.output_type(Some(DataType::Varchar)),
            None
        );
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(BinaryOperator::Add.as_str(), "+");
        assert_eq!(BinaryOperator::Ne.as_str(), "<>");
        assert_eq!(BinaryOperator::And.as_str(), "AND");
        assert_eq!(UnaryOperator::IsNotNull.as_str(), "IS NOT NULL");
        assert_eq!(AggregateFunction::Avg.name(), "AVG");
    }
}
