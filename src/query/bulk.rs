//! Set-based update and delete statements.
//!
//! A bulk statement touches every row of one table that matches its
//! predicate, in a single gateway call. Nothing tracks the affected rows;
//! callers holding copies of them must reload.

use crate::catalog::{AsTable, TableRef};
use crate::error::ConfigError;
use crate::expression::{Column, ColumnRef, Expression, Predicate, TypeChecker, TypedExpr};
use crate::query::builder::{check_filter, config_error};
use crate::value::{IntoLiteral, SqlType, Value};
use std::fmt;

/// `column = value` in a SET clause
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: ColumnRef,
    pub value: Expression,
}

impl Assignment {
    pub fn new<T: SqlType, V: IntoLiteral<T>>(column: &Column<T>, value: V) -> Self {
        Self {
            column: column.column_ref(),
            value: Expression::Literal(value.into_literal()),
        }
    }

    /// Assign a computed value, such as `age + 1`
    pub fn expr<T: SqlType, E: TypedExpr>(column: &Column<T>, value: &E) -> Self {
        Self {
            column: column.column_ref(),
            value: value.expression(),
        }
    }

    pub fn null<T>(column: &Column<Option<T>>) -> Self
    where
        Option<T>: SqlType,
    {
        Self {
            column: column.column_ref(),
            value: Expression::Literal(Value::Null),
        }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.column.name, self.value)
    }
}

/// Start an update of `table`
pub fn update<A: AsTable>(table: &A) -> UpdateBuilder {
    UpdateBuilder {
        target: table.table_ref(),
        assignments: Vec::new(),
        predicate: Predicate::always(),
    }
}

/// Start a delete from `table`
pub fn delete<A: AsTable>(table: &A) -> DeleteBuilder {
    DeleteBuilder {
        target: table.table_ref(),
        predicate: Predicate::always(),
    }
}

pub struct UpdateBuilder {
    target: TableRef,
    assignments: Vec<Assignment>,
    predicate: Predicate,
}

impl UpdateBuilder {
    pub fn set<T: SqlType, V: IntoLiteral<T>>(self, column: &Column<T>, value: V) -> Self {
        self.assign(Assignment::new(column, value))
    }

    pub fn set_expr<T: SqlType, E: TypedExpr>(self, column: &Column<T>, value: &E) -> Self {
        self.assign(Assignment::expr(column, value))
    }

    pub fn assign(mut self, assignment: Assignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        let current = std::mem::take(&mut self.predicate);
        self.predicate = current.and(predicate);
        self
    }

    pub fn build(self) -> Result<BulkUpdate, ConfigError> {
        if self.assignments.is_empty() {
            return Err(ConfigError::EmptyAssignments(
                self.target.table_name().to_string(),
            ));
        }
        let scope = [self.target];
        let checker = TypeChecker::new(&scope);
        for assignment in &self.assignments {
            check_owned_column(&self.target, &assignment.column)?;
            checker
                .check_assignment(&assignment.column, &assignment.value)
                .map_err(|e| config_error("SET clause", e))?;
        }
        check_filter(&scope, &self.predicate, "WHERE clause")?;

        Ok(BulkUpdate {
            target: self.target,
            assignments: self.assignments,
            predicate: self.predicate,
        })
    }
}

pub struct DeleteBuilder {
    target: TableRef,
    predicate: Predicate,
}

impl DeleteBuilder {
    pub fn filter(mut self, predicate: Predicate) -> Self {
        let current = std::mem::take(&mut self.predicate);
        self.predicate = current.and(predicate);
        self
    }

    pub fn build(self) -> Result<BulkDelete, ConfigError> {
        check_filter(&[self.target], &self.predicate, "WHERE clause")?;
        Ok(BulkDelete {
            target: self.target,
            predicate: self.predicate,
        })
    }
}

fn check_owned_column(target: &TableRef, column: &ColumnRef) -> Result<(), ConfigError> {
    if column.table != target.alias || target.info.column(column.name).is_none() {
        return Err(ConfigError::ForeignColumn {
            column: column.to_string(),
            table: target.alias.to_string(),
        });
    }
    if target.info.identity == Some(column.name) {
        return Err(ConfigError::IdentityAssignment(column.to_string()));
    }
    Ok(())
}

/// A validated set-based update
#[derive(Debug, Clone, PartialEq)]
pub struct BulkUpdate {
    pub target: TableRef,
    pub assignments: Vec<Assignment>,
    pub predicate: Predicate,
}

impl fmt::Display for BulkUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sets: Vec<String> = self.assignments.iter().map(|a| a.to_string()).collect();
        write!(
            f,
            "UPDATE {} {} SET {}",
            self.target.table_name(),
            self.target.alias,
            sets.join(", ")
        )?;
        if !self.predicate.is_always() {
            write!(f, " WHERE {}", self.predicate)?;
        }
        Ok(())
    }
}

/// A validated set-based delete
#[derive(Debug, Clone, PartialEq)]
pub struct BulkDelete {
    pub target: TableRef,
    pub predicate: Predicate,
}

impl fmt::Display for BulkDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DELETE FROM {} {}",
            self.target.table_name(),
            self.target.alias
        )?;
        if !self.predicate.is_always() {
            write!(f, " WHERE {}", self.predicate)?;
        }
        Ok(())
    }
}
