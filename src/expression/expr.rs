//! Expression AST definitions.

use crate::catalog::TableRef;
use crate::expression::operator::{AggregateFunction, BinaryOperator, UnaryOperator};
use crate::expression::predicate::Predicate;
use crate::value::{DataType, Value};
use std::fmt;

/// Column of one table occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Alias of the table occurrence the column belongs to
    pub table: &'static str,
    pub name: &'static str,
    pub data_type: DataType,
    pub nullable: bool,
}

impl ColumnRef {
    pub const fn new(
        table: &'static str,
        name: &'static str,
        data_type: DataType,
        nullable: bool,
    ) -> Self {
        Self {
            table,
            name,
            data_type,
            nullable,
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.name)
    }
}

/// A subquery over a single table occurrence producing one column
#[derive(Debug, Clone, PartialEq)]
pub struct SubqueryPlan {
    pub source: TableRef,
    pub predicate: Predicate,
    pub select: Expression,
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal constant value
    Literal(Value),

    /// Column reference
    Column(ColumnRef),

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Aggregate over the rows of a group; `arg` is `None` for `COUNT(*)`
    Aggregate {
        function: AggregateFunction,
        arg: Option<Box<Expression>>,
    },

    /// Searched CASE expression
    Case {
        conditions: Vec<(Expression, Expression)>,
        else_result: Option<Box<Expression>>,
    },

    /// IN list
    In {
        expr: Box<Expression>,
        list: Vec<Expression>,
        negated: bool,
    },

    /// IN subquery
    InSubquery {
        expr: Box<Expression>,
        subquery: Box<SubqueryPlan>,
        negated: bool,
    },

    /// BETWEEN, inclusive on both ends
    Between {
        expr: Box<Expression>,
        low: Box<Expression>,
        high: Box<Expression>,
        negated: bool,
    },

    /// Scalar subquery
    Subquery(Box<SubqueryPlan>),
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: Value) -> Self {
        Expression::Literal(value)
    }

    /// Create a column reference expression
    pub fn column(column: ColumnRef) -> Self {
        Expression::Column(column)
    }

    /// Create a binary operation expression
    pub fn binary_op(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a unary operation expression
    pub fn unary_op(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::And, left, right)
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Or, left, right)
    }

    pub fn not_expr(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::Not, operand)
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Eq, left, right)
    }

    pub fn gt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Gt, left, right)
    }

    pub fn ge(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ge, left, right)
    }

    pub fn lt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Lt, left, right)
    }

    pub fn le(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Le, left, right)
    }

    pub fn add_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Add, left, right)
    }

    pub fn is_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNull, operand)
    }

    pub fn aggregate(function: AggregateFunction, arg: Expression) -> Self {
        Expression::Aggregate {
            function,
            arg: Some(Box::new(arg)),
        }
    }

    pub fn count_all() -> Self {
        Expression::Aggregate {
            function: AggregateFunction::Count,
            arg: None,
        }
    }

    /// Check if this expression is a constant (contains no column references)
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::Column(_) | Expression::Aggregate { .. } => false,
            Expression::BinaryOp { left, right, .. } => left.is_constant() && right.is_constant(),
            Expression::UnaryOp { operand, .. } => operand.is_constant(),
            Expression::Case {
                conditions,
                else_result,
            } => {
                conditions
                    .iter()
                    .all(|(cond, res)| cond.is_constant() && res.is_constant())
                    && else_result.as_ref().map_or(true, |e| e.is_constant())
            }
            Expression::In { expr, list, .. } => {
                expr.is_constant() && list.iter().all(|e| e.is_constant())
            }
            Expression::Between {
                expr, low, high, ..
            } => expr.is_constant() && low.is_constant() && high.is_constant(),
            Expression::InSubquery { .. } | Expression::Subquery(_) => false,
        }
    }

    /// Whether an aggregate appears at this query level. Aggregates inside
    /// subqueries belong to the subquery and are not counted.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expression::Aggregate { .. } => true,
            Expression::Literal(_) | Expression::Column(_) | Expression::Subquery(_) => false,
            Expression::BinaryOp { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            Expression::UnaryOp { operand, .. } => operand.contains_aggregate(),
            Expression::Case {
                conditions,
                else_result,
            } => {
                conditions
                    .iter()
                    .any(|(c, r)| c.contains_aggregate() || r.contains_aggregate())
                    || else_result.as_ref().map_or(false, |e| e.contains_aggregate())
            }
            Expression::In { expr, list, .. } => {
                expr.contains_aggregate() || list.iter().any(|e| e.contains_aggregate())
            }
            Expression::InSubquery { expr, .. } => expr.contains_aggregate(),
            Expression::Between {
                expr, low, high, ..
            } => expr.contains_aggregate() || low.contains_aggregate() || high.contains_aggregate(),
        }
    }

    /// Whether the value of this expression is fixed within a group formed by
    /// `group_by`: it is a grouping key, an aggregate, a constant, or built
    /// only from such parts.
    pub fn is_covered_by(&self, group_by: &[Expression]) -> bool {
        if group_by.contains(self) {
            return true;
        }
        match self {
            Expression::Literal(_) | Expression::Aggregate { .. } | Expression::Subquery(_) => {
                true
            }
            Expression::Column(_) => false,
            Expression::BinaryOp { left, right, .. } => {
                left.is_covered_by(group_by) && right.is_covered_by(group_by)
            }
            Expression::UnaryOp { operand, .. } => operand.is_covered_by(group_by),
            Expression::Case {
                conditions,
                else_result,
            } => {
                conditions
                    .iter()
                    .all(|(c, r)| c.is_covered_by(group_by) && r.is_covered_by(group_by))
                    && else_result
                        .as_ref()
                        .map_or(true, |e| e.is_covered_by(group_by))
            }
            Expression::In { expr, list, .. } => {
                expr.is_covered_by(group_by) && list.iter().all(|e| e.is_covered_by(group_by))
            }
            Expression::InSubquery { expr, .. } => expr.is_covered_by(group_by),
            Expression::Between {
                expr, low, high, ..
            } => {
                expr.is_covered_by(group_by)
                    && low.is_covered_by(group_by)
                    && high.is_covered_by(group_by)
            }
        }
    }

    /// Column this expression refers to directly, if it is a bare column
    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            Expression::Column(column) => Some(column),
            _ => None,
        }
    }
}

fn fmt_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        other => write!(f, "{}", other),
    }
}

fn fmt_list(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for SubqueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SELECT {} FROM {} {}",
            self.select,
            self.source.table_name(),
            self.source.alias
        )?;
        if let Some(predicate) = self.predicate.expression() {
            write!(f, " WHERE {}", predicate)?;
        }
        Ok(())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(value) => fmt_literal(f, value),
            Expression::Column(column) => write!(f, "{}", column),
            Expression::BinaryOp { op, left, right } => {
                write!(f, "({} {} {})", left, op.as_str(), right)
            }
            Expression::UnaryOp { op, operand } => match op {
                UnaryOperator::IsNull | UnaryOperator::IsNotNull => {
                    write!(f, "({} {})", operand, op.as_str())
                }
                UnaryOperator::ToText => write!(f, "CAST({} AS VARCHAR)", operand),
                _ => write!(f, "({} {})", op.as_str(), operand),
            },
            Expression::Aggregate { function, arg } => match arg {
                Some(arg) => write!(f, "{}({})", function.name(), arg),
                None => write!(f, "{}(*)", function.name()),
            },
            Expression::Case {
                conditions,
                else_result,
            } => {
                f.write_str("CASE")?;
                for (condition, result) in conditions {
                    write!(f, " WHEN {} THEN {}", condition, result)?;
                }
                if let Some(else_result) = else_result {
                    write!(f, " ELSE {}", else_result)?;
                }
                f.write_str(" END")
            }
            Expression::In {
                expr,
                list,
                negated,
            } => {
                write!(f, "({} {}IN (", expr, if *negated { "NOT " } else { "" })?;
                fmt_list(f, list)?;
                f.write_str("))")
            }
            Expression::InSubquery {
                expr,
                subquery,
                negated,
            } => write!(
                f,
                "({} {}IN ({}))",
                expr,
                if *negated { "NOT " } else { "" },
                subquery
            ),
            Expression::Between {
                expr,
                low,
                high,
                negated,
            } => write!(
                f,
                "({} {}BETWEEN {} AND {})",
                expr,
                if *negated { "NOT " } else { "" },
                low,
                high
            ),
            Expression::Subquery(subquery) => write!(f, "({})", subquery),
        }
    }
}

/// One output column of a query: an expression plus an optional alias
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expression,
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn new(expr: Expression) -> Self {
        Self { expr, alias: None }
    }

    pub fn aliased(expr: Expression, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }

    /// Name the item is known by: its alias, or the column name for a bare
    /// column. Computed items without an alias have no label.
    pub fn label(&self) -> Option<&str> {
        match (&self.alias, &self.expr) {
            (Some(alias), _) => Some(alias),
            (None, Expression::Column(column)) => Some(column.name),
            _ => None,
        }
    }
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} AS {}", self.expr, alias),
            None => write!(f, "{}", self.expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGE: ColumnRef = ColumnRef::new("member", "age", DataType::Int32, false);
    const NAME: ColumnRef = ColumnRef::new("member", "name", DataType::Varchar, true);

    #[test]
    fn test_is_constant() {
        assert!(Expression::literal(Value::Int32(42)).is_constant());
        assert!(!Expression::column(AGE).is_constant());
        assert!(Expression::add_expr(
            Expression::literal(Value::Int32(1)),
            Expression::literal(Value::Int32(2))
        )
        .is_constant());
        assert!(
            !Expression::add_expr(Expression::column(AGE), Expression::literal(Value::Int32(2)))
                .is_constant()
        );
        assert!(!Expression::count_all().is_constant());
    }

    #[test]
    fn test_contains_aggregate() {
        let avg = Expression::aggregate(AggregateFunction::Avg, Expression::column(AGE));
        assert!(avg.contains_aggregate());
        assert!(Expression::gt(avg, Expression::literal(Value::Int32(10))).contains_aggregate());
        assert!(!Expression::is_null(Expression::column(NAME)).contains_aggregate());
    }

    #[test]
    fn test_is_covered_by() {
        let group_by = vec![Expression::column(NAME)];
        assert!(Expression::column(NAME).is_covered_by(&group_by));
        assert!(!Expression::column(AGE).is_covered_by(&group_by));
        assert!(
            Expression::aggregate(AggregateFunction::Max, Expression::column(AGE))
                .is_covered_by(&group_by)
        );
        assert!(Expression::add_expr(
            Expression::count_all(),
            Expression::literal(Value::Int64(1))
        )
        .is_covered_by(&[]));
    }

    #[test]
    fn test_display() {
        let expr = Expression::and(
            Expression::eq(
                Expression::column(NAME),
                Expression::literal(Value::String("it's".to_string())),
            ),
            Expression::ge(Expression::column(AGE), Expression::literal(Value::Int32(20))),
        );
        assert_eq!(
            expr.to_string(),
            "((member.name = 'it''s') AND (member.age >= 20))"
        );
        assert_eq!(Expression::count_all().to_string(), "COUNT(*)");
    }

    #[test]
    fn test_select_item_label() {
        assert_eq!(SelectItem::new(Expression::column(NAME)).label(), Some("name"));
        assert_eq!(
            SelectItem::aliased(Expression::column(NAME), "username").label(),
            Some("username")
        );
        assert_eq!(SelectItem::new(Expression::count_all()).label(), None);
    }
}
