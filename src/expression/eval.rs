//! Expression evaluation implementation.
//!
//! Evaluation follows SQL three-valued logic: comparisons with NULL yield
//! NULL, `AND`/`OR` absorb NULL where the other side decides the result, and
//! a filter keeps a row only when its predicate is TRUE.

use crate::expression::aggregate::Accumulator;
use crate::expression::expr::{ColumnRef, Expression, SubqueryPlan};
use crate::expression::predicate::Predicate;
use crate::expression::{BinaryOperator, ExpressionError, ExpressionResult, UnaryOperator};
use crate::value::{DataType, Value};
use std::cmp::Ordering;

/// Supplies column values for the row being evaluated
pub trait RowSource {
    /// Value of `column`, or `None` if its table is not part of this row
    fn column_value(&self, column: &ColumnRef) -> Option<Value>;
}

/// A row of explicit `(column, value)` pairs
impl RowSource for Vec<(ColumnRef, Value)> {
    fn column_value(&self, column: &ColumnRef) -> Option<Value> {
        self.iter()
            .find(|(c, _)| c.table == column.table && c.name == column.name)
            .map(|(_, v)| v.clone())
    }
}

/// A row without columns, used for aggregates over an empty group
pub struct EmptyRow;

impl RowSource for EmptyRow {
    fn column_value(&self, _column: &ColumnRef) -> Option<Value> {
        None
    }
}

/// Resolves columns from `inner` first and falls back to `outer`, which is
/// how a correlated subquery sees the enclosing row.
pub struct ScopedRow<'a> {
    pub inner: &'a dyn RowSource,
    pub outer: &'a dyn RowSource,
}

impl RowSource for ScopedRow<'_> {
    fn column_value(&self, column: &ColumnRef) -> Option<Value> {
        self.inner
            .column_value(column)
            .or_else(|| self.outer.column_value(column))
    }
}

/// Runs subqueries on behalf of the evaluator
pub trait SubqueryRunner {
    /// Values of the subquery's select expression, one per result row.
    /// `outer` is the enclosing row, visible for correlated references.
    fn run(&self, subquery: &SubqueryPlan, outer: &dyn RowSource) -> ExpressionResult<Vec<Value>>;
}

/// Evaluator for expressions
pub struct ExpressionEvaluator<'a> {
    row: &'a dyn RowSource,
    /// Rows of the current group, when aggregates are allowed
    group: Option<&'a [&'a dyn RowSource]>,
    subqueries: Option<&'a dyn SubqueryRunner>,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(row: &'a dyn RowSource) -> Self {
        Self {
            row,
            group: None,
            subqueries: None,
        }
    }

    /// Evaluate aggregates over `group`
    pub fn with_group(mut self, group: &'a [&'a dyn RowSource]) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_subqueries(mut self, runner: &'a dyn SubqueryRunner) -> Self {
        self.subqueries = Some(runner);
        self
    }

    /// Whether the row satisfies the predicate. NULL counts as not satisfied.
    pub fn matches(&self, predicate: &Predicate) -> ExpressionResult<bool> {
        let Some(expr) = predicate.expression() else {
            return Ok(true);
        };
        match self.evaluate(expr)? {
            Value::Boolean(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(ExpressionError::TypeMismatch {
                expected: DataType::Boolean,
                actual: other.data_type().unwrap_or(DataType::Boolean),
                context: "filter predicate".to_string(),
            }),
        }
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<Value> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),

            Expression::Column(column) => {
                self.row
                    .column_value(column)
                    .ok_or_else(|| ExpressionError::UnknownTable {
                        alias: column.table.to_string(),
                    })
            }

            Expression::BinaryOp { op, left, right } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                evaluate_binary_op(*op, left_val, right_val)
            }

            Expression::UnaryOp { op, operand } => {
                let operand_val = self.evaluate(operand)?;
                evaluate_unary_op(*op, operand_val)
            }

            Expression::Aggregate { function, arg } => {
                let group = self.group.ok_or_else(|| ExpressionError::MisplacedAggregate {
                    context: "ungrouped evaluation".to_string(),
                })?;
                let mut accumulator = Accumulator::new(*function);
                for row in group {
                    let value = match arg {
                        Some(arg) => self.for_row(*row).evaluate(arg)?,
                        // COUNT(*) counts rows, not values
                        None => Value::Boolean(true),
                    };
                    accumulator.update(&value)?;
                }
                Ok(accumulator.finish())
            }

            Expression::Case {
                conditions,
                else_result,
            } => {
                for (condition, result) in conditions {
                    if self.evaluate(condition)? == Value::Boolean(true) {
                        return self.evaluate(result);
                    }
                }
                match else_result {
                    Some(else_result) => self.evaluate(else_result),
                    None => Ok(Value::Null),
                }
            }

            Expression::In {
                expr,
                list,
                negated,
            } => {
                let probe = self.evaluate(expr)?;
                let values = list
                    .iter()
                    .map(|item| self.evaluate(item))
                    .collect::<ExpressionResult<Vec<_>>>()?;
                membership(&probe, &values, *negated)
            }

            Expression::InSubquery {
                expr,
                subquery,
                negated,
            } => {
                let probe = self.evaluate(expr)?;
                let values = self.run_subquery(subquery)?;
                membership(&probe, &values, *negated)
            }

            Expression::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let probe = self.evaluate(expr)?;
                let above = evaluate_binary_op(BinaryOperator::Ge, probe.clone(), self.evaluate(low)?)?;
                let below = evaluate_binary_op(BinaryOperator::Le, probe, self.evaluate(high)?)?;
                let within = evaluate_binary_op(BinaryOperator::And, above, below)?;
                if *negated {
                    evaluate_unary_op(UnaryOperator::Not, within)
                } else {
                    Ok(within)
                }
            }

            Expression::Subquery(subquery) => {
                let mut values = self.run_subquery(subquery)?;
                match values.len() {
                    0 => Ok(Value::Null),
                    1 => Ok(values.remove(0)),
                    rows => Err(ExpressionError::ScalarSubqueryRows { rows }),
                }
            }
        }
    }

    fn for_row(&self, row: &'a dyn RowSource) -> ExpressionEvaluator<'a> {
        ExpressionEvaluator {
            row,
            group: None,
            subqueries: self.subqueries,
        }
    }

    fn run_subquery(&self, subquery: &SubqueryPlan) -> ExpressionResult<Vec<Value>> {
        let runner = self
            .subqueries
            .ok_or_else(|| ExpressionError::EvaluationError {
                message: "subquery evaluation is not available here".to_string(),
            })?;
        runner.run(subquery, self.row)
    }
}

/// SQL `IN` semantics: TRUE on a match, NULL if no match but a NULL was
/// involved, FALSE otherwise. `negated` inverts TRUE and FALSE.
fn membership(probe: &Value, values: &[Value], negated: bool) -> ExpressionResult<Value> {
    if probe.is_null() {
        return Ok(Value::Null);
    }
    let mut saw_null = false;
    for value in values {
        if value.is_null() {
            saw_null = true;
            continue;
        }
        if compare(probe, value)? == Ordering::Equal {
            return Ok(Value::Boolean(!negated));
        }
    }
    if saw_null {
        Ok(Value::Null)
    } else {
        Ok(Value::Boolean(negated))
    }
}

fn compare(left: &Value, right: &Value) -> ExpressionResult<Ordering> {
    left.compare(right)
        .ok_or_else(|| ExpressionError::InvalidOperandTypes {
            operator: "comparison".to_string(),
            left_type: left.data_type(),
            right_type: right.data_type(),
        })
}

fn invalid_operands(op: BinaryOperator, left: &Value, right: &Value) -> ExpressionError {
    ExpressionError::InvalidOperandTypes {
        operator: op.as_str().to_string(),
        left_type: left.data_type(),
        right_type: right.data_type(),
    }
}

fn overflow(op: BinaryOperator) -> ExpressionError {
    ExpressionError::ArithmeticOverflow {
        operator: op.as_str().to_string(),
    }
}

/// Evaluate a binary operation
pub fn evaluate_binary_op(op: BinaryOperator, left: Value, right: Value) -> ExpressionResult<Value> {
    // Handle NULL propagation for most operators
    if left.is_null() || right.is_null() {
        return Ok(match op {
            // NULL AND false = false, NULL AND true = NULL
            BinaryOperator::And => match (&left, &right) {
                (Value::Boolean(false), _) | (_, Value::Boolean(false)) => Value::Boolean(false),
                _ => Value::Null,
            },
            // NULL OR true = true, NULL OR false = NULL
            BinaryOperator::Or => match (&left, &right) {
                (Value::Boolean(true), _) | (_, Value::Boolean(true)) => Value::Boolean(true),
                _ => Value::Null,
            },
            _ => Value::Null,
        });
    }

    match op {
        BinaryOperator::Add | BinaryOperator::Sub => {
            let add = op == BinaryOperator::Add;
            match (&left, &right) {
                (Value::Int32(a), Value::Int32(b)) => {
                    let result = if add { a.checked_add(*b) } else { a.checked_sub(*b) };
                    result.map(Value::Int32).ok_or_else(|| overflow(op))
                }
                (Value::Float64(_), _) | (_, Value::Float64(_)) => {
                    match (left.as_f64(), right.as_f64()) {
                        (Some(a), Some(b)) => Ok(Value::Float64(if add { a + b } else { a - b })),
                        _ => Err(invalid_operands(op, &left, &right)),
                    }
                }
                _ => match (left.as_i64(), right.as_i64()) {
                    (Some(a), Some(b)) => {
                        let result = if add { a.checked_add(b) } else { a.checked_sub(b) };
                        result.map(Value::Int64).ok_or_else(|| overflow(op))
                    }
                    _ => Err(invalid_operands(op, &left, &right)),
                },
            }
        }

        BinaryOperator::Eq => Ok(Value::Boolean(compare(&left, &right)? == Ordering::Equal)),
        BinaryOperator::Ne => Ok(Value::Boolean(compare(&left, &right)? != Ordering::Equal)),
        BinaryOperator::Lt => Ok(Value::Boolean(compare(&left, &right)? == Ordering::Less)),
        BinaryOperator::Le => Ok(Value::Boolean(compare(&left, &right)? != Ordering::Greater)),
        BinaryOperator::Gt => Ok(Value::Boolean(compare(&left, &right)? == Ordering::Greater)),
        BinaryOperator::Ge => Ok(Value::Boolean(compare(&left, &right)? != Ordering::Less)),

        BinaryOperator::And => match (&left, &right) {
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a && *b)),
            _ => Err(invalid_operands(op, &left, &right)),
        },

        BinaryOperator::Or => match (&left, &right) {
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a || *b)),
            _ => Err(invalid_operands(op, &left, &right)),
        },

        BinaryOperator::Concat => match (&left, &right) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            _ => Err(invalid_operands(op, &left, &right)),
        },

        BinaryOperator::Contains | BinaryOperator::StartsWith | BinaryOperator::EndsWith => {
            match (&left, &right) {
                (Value::String(haystack), Value::String(needle)) => {
                    Ok(Value::Boolean(match op {
                        BinaryOperator::Contains => haystack.contains(needle.as_str()),
                        BinaryOperator::StartsWith => haystack.starts_with(needle.as_str()),
                        _ => haystack.ends_with(needle.as_str()),
                    }))
                }
                _ => Err(invalid_operands(op, &left, &right)),
            }
        }
    }
}

/// Evaluate a unary operation
pub fn evaluate_unary_op(op: UnaryOperator, operand: Value) -> ExpressionResult<Value> {
    let invalid = |operand: &Value| ExpressionError::InvalidOperandTypes {
        operator: op.as_str().to_string(),
        left_type: operand.data_type(),
        right_type: None,
    };

    match op {
        UnaryOperator::IsNull => Ok(Value::Boolean(operand.is_null())),
        UnaryOperator::IsNotNull => Ok(Value::Boolean(!operand.is_null())),
        _ if operand.is_null() => Ok(Value::Null),

        UnaryOperator::Not => match operand {
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            other => Err(invalid(&other)),
        },

        UnaryOperator::Minus => match operand {
            Value::Int32(n) => n
                .checked_neg()
                .map(Value::Int32)
                .ok_or_else(|| ExpressionError::ArithmeticOverflow {
                    operator: "-".to_string(),
                }),
            Value::Int64(n) => n
                .checked_neg()
                .map(Value::Int64)
                .ok_or_else(|| ExpressionError::ArithmeticOverflow {
                    operator: "-".to_string(),
                }),
            Value::Float64(n) => Ok(Value::Float64(-n)),
            other => Err(invalid(&other)),
        },

        UnaryOperator::ToText => Ok(Value::String(operand.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::AggregateFunction;

    const AGE: ColumnRef = ColumnRef::new("member", "age", DataType::Int32, false);
    const NAME: ColumnRef = ColumnRef::new("member", "name", DataType::Varchar, true);

    fn member(name: Option<&str>, age: i32) -> Vec<(ColumnRef, Value)> {
        vec![
            (
                NAME,
                name.map_or(Value::Null, |n| Value::String(n.to_string())),
            ),
            (AGE, Value::Int32(age)),
        ]
    }

    fn lit(value: Value) -> Expression {
        Expression::literal(value)
    }

    #[test]
    fn test_column_evaluation() -> ExpressionResult<()> {
        let row = member(Some("member1"), 10);
        let evaluator = ExpressionEvaluator::new(&row);
        assert_eq!(evaluator.evaluate(&Expression::column(AGE))?, Value::Int32(10));

        let team_name = ColumnRef::new("team", "name", DataType::Varchar, false);
        assert!(matches!(
            evaluator.evaluate(&Expression::column(team_name)),
            Err(ExpressionError::UnknownTable { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_arithmetic_operations() {
        let row = member(None, 41);
        let evaluator = ExpressionEvaluator::new(&row);

        let expr = Expression::add_expr(Expression::column(AGE), lit(Value::Int32(1)));
        assert_eq!(evaluator.evaluate(&expr).unwrap(), Value::Int32(42));

        let expr = Expression::add_expr(lit(Value::Int32(1)), lit(Value::Int64(2)));
        assert_eq!(evaluator.evaluate(&expr).unwrap(), Value::Int64(3));

        let expr = Expression::add_expr(lit(Value::Int32(i32::MAX)), lit(Value::Int32(1)));
        assert!(matches!(
            evaluator.evaluate(&expr),
            Err(ExpressionError::ArithmeticOverflow { .. })
        ));

        let expr = Expression::add_expr(lit(Value::Int32(10)), lit(Value::String("5".to_string())));
        assert!(matches!(
            evaluator.evaluate(&expr),
            Err(ExpressionError::InvalidOperandTypes { .. })
        ));
    }

    #[test]
    fn test_three_valued_logic() {
        let row = member(None, 20);
        let evaluator = ExpressionEvaluator::new(&row);

        let name_eq = Expression::eq(
            Expression::column(NAME),
            lit(Value::String("member1".to_string())),
        );
        assert_eq!(evaluator.evaluate(&name_eq).unwrap(), Value::Null);

        let and_false = Expression::and(name_eq.clone(), lit(Value::Boolean(false)));
        assert_eq!(evaluator.evaluate(&and_false).unwrap(), Value::Boolean(false));

        let or_true = Expression::or(name_eq.clone(), lit(Value::Boolean(true)));
        assert_eq!(evaluator.evaluate(&or_true).unwrap(), Value::Boolean(true));

        assert!(!evaluator
            .matches(&Predicate::from_expression(name_eq))
            .unwrap());
        assert!(evaluator.matches(&Predicate::always()).unwrap());
    }

    #[test]
    fn test_string_operators() -> ExpressionResult<()> {
        let row = member(Some("member1"), 10);
        let evaluator = ExpressionEvaluator::new(&row);
        let contains = |needle: &str| {
            Expression::binary_op(
                BinaryOperator::Contains,
                Expression::column(NAME),
                lit(Value::String(needle.to_string())),
            )
        };

        assert_eq!(evaluator.evaluate(&contains("ber"))?, Value::Boolean(true));
        assert_eq!(evaluator.evaluate(&contains(""))?, Value::Boolean(true));
        assert_eq!(evaluator.evaluate(&contains("team"))?, Value::Boolean(false));

        let row = member(None, 10);
        let evaluator = ExpressionEvaluator::new(&row);
        assert_eq!(evaluator.evaluate(&contains(""))?, Value::Null);

        let concat = Expression::binary_op(
            BinaryOperator::Concat,
            lit(Value::String("member".to_string())),
            Expression::unary_op(UnaryOperator::ToText, lit(Value::Int32(7))),
        );
        assert_eq!(
            evaluator.evaluate(&concat)?,
            Value::String("member7".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_in_and_between() -> ExpressionResult<()> {
        let row = member(Some("member1"), 20);
        let evaluator = ExpressionEvaluator::new(&row);

        let in_list = |list: Vec<Value>, negated: bool| Expression::In {
            expr: Box::new(Expression::column(AGE)),
            list: list.into_iter().map(lit).collect(),
            negated,
        };
        assert_eq!(
            evaluator.evaluate(&in_list(vec![Value::Int32(10), Value::Int32(20)], false))?,
            Value::Boolean(true)
        );
        assert_eq!(
            evaluator.evaluate(&in_list(vec![Value::Int32(10), Value::Null], false))?,
            Value::Null
        );
        assert_eq!(
            evaluator.evaluate(&in_list(vec![Value::Int32(10)], true))?,
            Value::Boolean(true)
        );

        let between = Expression::Between {
            expr: Box::new(Expression::column(AGE)),
            low: Box::new(lit(Value::Int32(20))),
            high: Box::new(lit(Value::Int32(30))),
            negated: false,
        };
        assert_eq!(evaluator.evaluate(&between)?, Value::Boolean(true));
        Ok(())
    }

    #[test]
    fn test_case_expression() -> ExpressionResult<()> {
        let rank = Expression::Case {
            conditions: vec![(
                Expression::le(Expression::column(AGE), lit(Value::Int32(20))),
                lit(Value::String("young".to_string())),
            )],
            else_result: None,
        };
        let row = member(None, 10);
        assert_eq!(
            ExpressionEvaluator::new(&row).evaluate(&rank)?,
            Value::String("young".to_string())
        );
        let row = member(None, 30);
        assert_eq!(
            ExpressionEvaluator::new(&row).evaluate(&rank)?,
            Value::Null
        );
        Ok(())
    }

    #[test]
    fn test_aggregates_over_group() -> ExpressionResult<()> {
        let rows = [member(Some("a"), 10), member(None, 20), member(Some("b"), 30)];
        let group: Vec<&dyn RowSource> = rows.iter().map(|r| r as &dyn RowSource).collect();
        let evaluator = ExpressionEvaluator::new(&EmptyRow).with_group(&group);

        let avg = Expression::aggregate(AggregateFunction::Avg, Expression::column(AGE));
        assert_eq!(evaluator.evaluate(&avg)?, Value::Float64(20.0));
        let count_names = Expression::aggregate(AggregateFunction::Count, Expression::column(NAME));
        assert_eq!(evaluator.evaluate(&count_names)?, Value::Int64(2));
        assert_eq!(evaluator.evaluate(&Expression::count_all())?, Value::Int64(3));

        let ungrouped = ExpressionEvaluator::new(&EmptyRow);
        assert!(matches!(
            ungrouped.evaluate(&avg),
            Err(ExpressionError::MisplacedAggregate { .. })
        ));
        Ok(())
    }

    struct FixedRunner(Vec<Value>);

    impl SubqueryRunner for FixedRunner {
        fn run(&self, _subquery: &SubqueryPlan, _outer: &dyn RowSource) -> ExpressionResult<Vec<Value>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_scalar_subquery() -> ExpressionResult<()> {
        let plan = SubqueryPlan {
            source: crate::catalog::TableRef::new(crate::catalog::MEMBER_TABLE, "member_sub"),
            predicate: Predicate::always(),
            select: Expression::count_all(),
        };
        let row = member(None, 40);
        let scalar = Expression::Subquery(Box::new(plan));

        let runner = FixedRunner(vec![Value::Int32(40)]);
        let evaluator = ExpressionEvaluator::new(&row).with_subqueries(&runner);
        assert_eq!(evaluator.evaluate(&scalar)?, Value::Int32(40));

        let runner = FixedRunner(vec![]);
        let evaluator = ExpressionEvaluator::new(&row).with_subqueries(&runner);
        assert_eq!(evaluator.evaluate(&scalar)?, Value::Null);

        let runner = FixedRunner(vec![Value::Int32(1), Value::Int32(2)]);
        let evaluator = ExpressionEvaluator::new(&row).with_subqueries(&runner);
        assert_eq!(
            evaluator.evaluate(&scalar),
            Err(ExpressionError::ScalarSubqueryRows { rows: 2 })
        );
        Ok(())
    }
}
