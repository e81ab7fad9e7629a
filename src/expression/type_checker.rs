//! Type checking for expressions.
//!
//! The checker resolves columns against the table occurrences in scope, so
//! the same pass catches operand type errors and references to tables that
//! have not been joined.

use crate::catalog::TableRef;
use crate::expression::expr::{ColumnRef, Expression, SubqueryPlan};
use crate::expression::{ExpressionError, ExpressionResult};
use crate::value::DataType;

/// Type checker for expressions
pub struct TypeChecker<'a> {
    /// Table occurrences visible to the expression
    scope: &'a [TableRef],
}

impl<'a> TypeChecker<'a> {
    pub fn new(scope: &'a [TableRef]) -> Self {
        Self { scope }
    }

    /// Type check an expression and return its output type.
    /// `None` means the type is unknown because of a NULL literal.
    pub fn check(&self, expr: &Expression) -> ExpressionResult<Option<DataType>> {
        match expr {
            Expression::Literal(value) => Ok(value.data_type()),

            Expression::Column(column) => self.check_column(column).map(Some),

            Expression::BinaryOp { op, left, right } => {
                let left_type = self.check(left)?;
                let right_type = self.check(right)?;

                match (left_type, right_type) {
                    (Some(lt), Some(rt)) => match op.output_type(lt, rt) {
                        Some(output_type) => Ok(Some(output_type)),
                        None => Err(ExpressionError::InvalidOperandTypes {
                            operator: op.as_str().to_string(),
                            left_type: Some(lt),
                            right_type: Some(rt),
                        }),
                    },
                    // NULL literals are allowed and will be handled at runtime
                    _ => Ok(None),
                }
            }

            Expression::UnaryOp { op, operand } => match self.check(operand)? {
                Some(ot) => match op.output_type(ot) {
                    Some(output_type) => Ok(Some(output_type)),
                    None => Err(ExpressionError::InvalidOperandTypes {
                        operator: op.as_str().to_string(),
                        left_type: Some(ot),
                        right_type: None,
                    }),
                },
                None => Ok(None),
            },

            Expression::Aggregate { function, arg } => {
                let input = match arg {
                    Some(arg) => {
                        if arg.contains_aggregate() {
                            return Err(ExpressionError::MisplacedAggregate {
                                context: format!("{} argument", function.name()),
                            });
                        }
                        self.check(arg)?
                    }
                    None => None,
                };
                match function.output_type(input) {
                    Some(output_type) => Ok(Some(output_type)),
                    None => Err(ExpressionError::InvalidOperandTypes {
                        operator: function.name().to_string(),
                        left_type: input,
                        right_type: None,
                    }),
                }
            }

            Expression::Case {
                conditions,
                else_result,
            } => {
                let mut result_type = None;
                let results = conditions
                    .iter()
                    .map(|(_, result)| result)
                    .chain(else_result.as_deref());
                for (condition, _) in conditions {
                    self.check_boolean(condition, "CASE condition")?;
                }
                for result in results {
                    result_type = self.unify(result_type, self.check(result)?, "CASE")?;
                }
                Ok(result_type)
            }

            Expression::In { expr, list, .. } => {
                let probe = self.check(expr)?;
                for item in list {
                    self.check_comparable(probe, self.check(item)?, "IN")?;
                }
                Ok(Some(DataType::Boolean))
            }

            Expression::InSubquery { expr, subquery, .. } => {
                let probe = self.check(expr)?;
                let element = self.check_subquery(subquery)?;
                self.check_comparable(probe, element, "IN")?;
                Ok(Some(DataType::Boolean))
            }

            Expression::Between {
                expr, low, high, ..
            } => {
                let probe = self.check(expr)?;
                self.check_comparable(probe, self.check(low)?, "BETWEEN")?;
                self.check_comparable(probe, self.check(high)?, "BETWEEN")?;
                Ok(Some(DataType::Boolean))
            }

            Expression::Subquery(subquery) => self.check_subquery(subquery),
        }
    }

    /// Check if an expression is valid for use as a filter predicate
    pub fn check_filter_predicate(&self, expr: &Expression, context: &str) -> ExpressionResult<()> {
        if expr.contains_aggregate() {
            return Err(ExpressionError::MisplacedAggregate {
                context: context.to_string(),
            });
        }
        self.check_boolean(expr, context)
    }

    /// Check that a value expression may be stored into `column`
    pub fn check_assignment(&self, column: &ColumnRef, value: &Expression) -> ExpressionResult<()> {
        if value.contains_aggregate() {
            return Err(ExpressionError::MisplacedAggregate {
                context: format!("assignment to {}", column),
            });
        }
        match self.check(value)? {
            None => Ok(()),
            Some(actual) if actual.assignable_to(column.data_type) => Ok(()),
            Some(actual) => Err(ExpressionError::TypeMismatch {
                expected: column.data_type,
                actual,
                context: format!("assignment to {}", column),
            }),
        }
    }

    fn check_boolean(&self, expr: &Expression, context: &str) -> ExpressionResult<()> {
        match self.check(expr)? {
            Some(DataType::Boolean) | None => Ok(()),
            Some(other_type) => Err(ExpressionError::TypeMismatch {
                expected: DataType::Boolean,
                actual: other_type,
                context: context.to_string(),
            }),
        }
    }

    fn check_column(&self, column: &ColumnRef) -> ExpressionResult<DataType> {
        let table = self
            .scope
            .iter()
            .find(|t| t.alias == column.table)
            .ok_or_else(|| ExpressionError::UnknownTable {
                alias: column.table.to_string(),
            })?;
        match table.info.column(column.name) {
            Some(info) if info.column_type == column.data_type => Ok(column.data_type),
            _ => Err(ExpressionError::UnknownColumn {
                table: table.table_name().to_string(),
                column: column.name.to_string(),
            }),
        }
    }

    fn check_subquery(&self, subquery: &SubqueryPlan) -> ExpressionResult<Option<DataType>> {
        if self.scope.iter().any(|t| t.alias == subquery.source.alias) {
            return Err(ExpressionError::AliasCollision {
                alias: subquery.source.alias.to_string(),
            });
        }
        let mut scope = self.scope.to_vec();
        scope.push(subquery.source);
        let inner = TypeChecker::new(&scope);
        if let Some(predicate) = subquery.predicate.expression() {
            inner.check_filter_predicate(predicate, "subquery WHERE clause")?;
        }
        inner.check(&subquery.select)
    }

    fn check_comparable(
        &self,
        left: Option<DataType>,
        right: Option<DataType>,
        operator: &str,
    ) -> ExpressionResult<()> {
        match (left, right) {
            (Some(lt), Some(rt)) if !lt.comparable_with(rt) => {
                Err(ExpressionError::InvalidOperandTypes {
                    operator: operator.to_string(),
                    left_type: Some(lt),
                    right_type: Some(rt),
                })
            }
            _ => Ok(()),
        }
    }

    fn unify(
        &self,
        current: Option<DataType>,
        next: Option<DataType>,
        context: &str,
    ) -> ExpressionResult<Option<DataType>> {
        match (current, next) {
            (None, t) | (t, None) => Ok(t),
            (Some(a), Some(b)) if a == b => Ok(Some(a)),
            (Some(a), Some(b)) => match a.widen(b) {
                Some(widened) => Ok(Some(widened)),
                None => Err(ExpressionError::TypeMismatch {
                    expected: a,
                    actual: b,
                    context: context.to_string(),
                }),
            },
        }
    }
}

/// Helper function to type check an expression
pub fn type_check_expression(
    expr: &Expression,
    scope: &[TableRef],
) -> ExpressionResult<Option<DataType>> {
    TypeChecker::new(scope).check(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MEMBER_TABLE, TEAM_TABLE};
    use crate::expression::{AggregateFunction, BinaryOperator, Predicate, UnaryOperator};
    use crate::value::Value;

    const MEMBER: TableRef = TableRef::new(MEMBER_TABLE, "member");
    const TEAM: TableRef = TableRef::new(TEAM_TABLE, "team");
    const AGE: ColumnRef = ColumnRef::new("member", "age", DataType::Int32, false);
    const NAME: ColumnRef = ColumnRef::new("member", "name", DataType::Varchar, true);
    const TEAM_NAME: ColumnRef = ColumnRef::new("team", "name", DataType::Varchar, false);

    #[test]
    fn test_literal_and_column_types() -> ExpressionResult<()> {
        let checker = TypeChecker::new(&[MEMBER]);
        assert_eq!(
            checker.check(&Expression::literal(Value::Int32(42)))?,
            Some(DataType::Int32)
        );
        assert_eq!(checker.check(&Expression::literal(Value::Null))?, None);
        assert_eq!(
            checker.check(&Expression::column(AGE))?,
            Some(DataType::Int32)
        );
        Ok(())
    }

    #[test]
    fn test_column_out_of_scope() {
        let checker = TypeChecker::new(&[MEMBER]);
        assert_eq!(
            checker.check(&Expression::column(TEAM_NAME)),
            Err(ExpressionError::UnknownTable {
                alias: "team".to_string()
            })
        );

        let bogus = ColumnRef::new("member", "email", DataType::Varchar, true);
        assert!(matches!(
            checker.check(&Expression::column(bogus)),
            Err(ExpressionError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_binary_op_type_checking() -> ExpressionResult<()> {
        let scope = [MEMBER, TEAM];
        let checker = TypeChecker::new(&scope);

        let expr = Expression::add_expr(Expression::column(AGE), Expression::literal(Value::Int32(1)));
        assert_eq!(checker.check(&expr)?, Some(DataType::Int32));

        let expr = Expression::add_expr(Expression::column(AGE), Expression::column(NAME));
        assert!(matches!(
            checker.check(&expr),
            Err(ExpressionError::InvalidOperandTypes { .. })
        ));

        // column-to-column comparison across joined tables
        let expr = Expression::eq(Expression::column(NAME), Expression::column(TEAM_NAME));
        assert_eq!(checker.check(&expr)?, Some(DataType::Boolean));

        let expr = Expression::binary_op(
            BinaryOperator::Contains,
            Expression::column(NAME),
            Expression::literal(Value::Int32(1)),
        );
        assert!(checker.check(&expr).is_err());

        let expr = Expression::add_expr(Expression::column(AGE), Expression::literal(Value::Null));
        assert_eq!(checker.check(&expr)?, None);
        Ok(())
    }

    #[test]
    fn test_filter_predicate_checking() {
        let checker = TypeChecker::new(&[MEMBER]);
        let expr = Expression::gt(Expression::column(AGE), Expression::literal(Value::Int32(5)));
        assert!(checker.check_filter_predicate(&expr, "WHERE clause").is_ok());

        assert!(matches!(
            checker.check_filter_predicate(&Expression::column(AGE), "WHERE clause"),
            Err(ExpressionError::TypeMismatch { .. })
        ));

        let expr = Expression::gt(
            Expression::aggregate(AggregateFunction::Max, Expression::column(AGE)),
            Expression::literal(Value::Int32(5)),
        );
        assert!(matches!(
            checker.check_filter_predicate(&expr, "WHERE clause"),
            Err(ExpressionError::MisplacedAggregate { .. })
        ));
    }

    #[test]
    fn test_case_and_in_checking() -> ExpressionResult<()> {
        let checker = TypeChecker::new(&[MEMBER]);
        let case = Expression::Case {
            conditions: vec![(
                Expression::lt(Expression::column(AGE), Expression::literal(Value::Int32(20))),
                Expression::literal(Value::String("young".to_string())),
            )],
            else_result: Some(Box::new(Expression::literal(Value::String(
                "old".to_string(),
            )))),
        };
        assert_eq!(checker.check(&case)?, Some(DataType::Varchar));

        let bad_case = Expression::Case {
            conditions: vec![(
                Expression::column(AGE),
                Expression::literal(Value::Int32(1)),
            )],
            else_result: None,
        };
        assert!(checker.check(&bad_case).is_err());

        let in_list = Expression::In {
            expr: Box::new(Expression::column(AGE)),
            list: vec![
                Expression::literal(Value::Int32(10)),
                Expression::literal(Value::String("x".to_string())),
            ],
            negated: false,
        };
        assert!(checker.check(&in_list).is_err());
        Ok(())
    }

    #[test]
    fn test_subquery_scope() -> ExpressionResult<()> {
        let checker = TypeChecker::new(&[MEMBER]);
        let sub_age = ColumnRef::new("member_sub", "age", DataType::Int32, false);
        let plan = SubqueryPlan {
            source: TableRef::new(MEMBER_TABLE, "member_sub"),
            // correlated reference to the outer member
            predicate: Predicate::from_expression(Expression::gt(
                Expression::column(sub_age),
                Expression::column(AGE),
            )),
            select: Expression::aggregate(AggregateFunction::Avg, Expression::column(sub_age)),
        };
        assert_eq!(
            checker.check(&Expression::Subquery(Box::new(plan)))?,
            Some(DataType::Float64)
        );

        let colliding = SubqueryPlan {
            source: MEMBER,
            predicate: Predicate::always(),
            select: Expression::column(AGE),
        };
        assert_eq!(
            checker.check(&Expression::Subquery(Box::new(colliding))),
            Err(ExpressionError::AliasCollision {
                alias: "member".to_string()
            })
        );
        Ok(())
    }

    #[test]
    fn test_assignment_checking() {
        let checker = TypeChecker::new(&[MEMBER]);
        let age_plus_one =
            Expression::add_expr(Expression::column(AGE), Expression::literal(Value::Int32(1)));
        assert!(checker.check_assignment(&AGE, &age_plus_one).is_ok());
        assert!(checker
            .check_assignment(&NAME, &Expression::literal(Value::Null))
            .is_ok());
        assert!(matches!(
            checker.check_assignment(&AGE, &Expression::literal(Value::String("x".to_string()))),
            Err(ExpressionError::TypeMismatch { .. })
        ));
        let text = Expression::unary_op(UnaryOperator::ToText, Expression::column(AGE));
        assert!(checker.check_assignment(&NAME, &text).is_ok());
    }
}
