//! Lowering to PostgreSQL-flavoured SQL.
//!
//! Literals become positional parameters (`$1`, `$2`, ...) except NULL,
//! which is written inline. Every ORDER BY term spells out its NULL
//! placement.

use crate::catalog::TableRef;
use crate::expression::{
    BinaryOperator, Expression, NullOrder, OrderSpec, SelectItem, SortOrder, SubqueryPlan,
    UnaryOperator,
};
use crate::query::{BulkDelete, BulkUpdate, JoinSpec, QueryPlan};
use crate::value::Value;
use std::fmt;

/// SQL text plus its parameters, in `$n` order
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
            write!(f, " -- [{}]", params.join(", "))?;
        }
        Ok(())
    }
}

/// Renders plans and bulk statements
#[derive(Debug, Default)]
pub struct SqlRenderer {
    params: Vec<Value>,
}

impl SqlRenderer {
    pub fn select(plan: &QueryPlan) -> SqlStatement {
        let mut renderer = SqlRenderer::default();
        let sql = renderer.select_sql(plan, true);
        renderer.finish(sql)
    }

    /// `COUNT(*)` over the plan's rows, or over its groups when grouped
    pub fn count(plan: &QueryPlan) -> SqlStatement {
        let mut renderer = SqlRenderer::default();
        let sql = if plan.is_grouped() {
            format!(
                "SELECT COUNT(*) FROM ({}) AS grouped",
                renderer.select_sql(plan, false)
            )
        } else {
            let mut sql = String::from("SELECT COUNT(*)");
            renderer.push_from(&mut sql, plan);
            sql
        };
        renderer.finish(sql)
    }

    pub fn update(statement: &BulkUpdate) -> SqlStatement {
        let mut renderer = SqlRenderer::default();
        let sets: Vec<String> = statement
            .assignments
            .iter()
            .map(|a| format!("{} = {}", a.column.name, renderer.expr(&a.value)))
            .collect();
        let mut sql = format!(
            "UPDATE {} SET {}",
            table(&statement.target),
            sets.join(", ")
        );
        if let Some(predicate) = statement.predicate.expression() {
            let predicate = renderer.expr(predicate);
            sql.push_str(&format!(" WHERE {}", predicate));
        }
        renderer.finish(sql)
    }

    pub fn delete(statement: &BulkDelete) -> SqlStatement {
        let mut renderer = SqlRenderer::default();
        let mut sql = format!("DELETE FROM {}", table(&statement.target));
        if let Some(predicate) = statement.predicate.expression() {
            let predicate = renderer.expr(predicate);
            sql.push_str(&format!(" WHERE {}", predicate));
        }
        renderer.finish(sql)
    }

    fn finish(self, sql: String) -> SqlStatement {
        SqlStatement {
            sql,
            params: self.params,
        }
    }

    fn select_sql(&mut self, plan: &QueryPlan, with_order: bool) -> String {
        let items: Vec<String> = plan.select.iter().map(|i| self.select_item(i)).collect();
        let mut sql = format!("SELECT {}", items.join(", "));
        self.push_from(&mut sql, plan);
        if !plan.group_by.is_empty() {
            let keys: Vec<String> = plan.group_by.iter().map(|k| self.expr(k)).collect();
            sql.push_str(&format!(" GROUP BY {}", keys.join(", ")));
        }
        if with_order {
            if !plan.order_by.is_empty() {
                let terms: Vec<String> = plan.order_by.iter().map(|o| self.order(o)).collect();
                sql.push_str(&format!(" ORDER BY {}", terms.join(", ")));
            }
            if let Some(limit) = plan.limit {
                sql.push_str(&format!(" LIMIT {}", limit));
            }
            if let Some(offset) = plan.offset {
                sql.push_str(&format!(" OFFSET {}", offset));
            }
        }
        sql
    }

    /// FROM, JOIN and WHERE clauses
    fn push_from(&mut self, sql: &mut String, plan: &QueryPlan) {
        sql.push_str(&format!(" FROM {}", table(&plan.source)));
        for join in &plan.joins {
            let clause = self.join(join);
            sql.push_str(&clause);
        }
        if let Some(predicate) = plan.predicate.expression() {
            let predicate = self.expr(predicate);
            sql.push_str(&format!(" WHERE {}", predicate));
        }
    }

    fn join(&mut self, join: &JoinSpec) -> String {
        let on = match join.on.expression() {
            Some(expr) => self.expr(expr),
            None => "TRUE".to_string(),
        };
        format!(" {} {} ON {}", join.kind.sql_keyword(), table(&join.target), on)
    }

    fn select_item(&mut self, item: &SelectItem) -> String {
        let expr = self.expr(&item.expr);
        match &item.alias {
            Some(alias) => format!("{} AS {}", expr, alias),
            None => expr,
        }
    }

    fn order(&mut self, spec: &OrderSpec) -> String {
        let direction = match spec.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let nulls = match spec.nulls {
            NullOrder::First => "NULLS FIRST",
            NullOrder::Last => "NULLS LAST",
        };
        format!("{} {} {}", self.expr(&spec.expr), direction, nulls)
    }

    fn param(&mut self, value: Value) -> String {
        if value.is_null() {
            return "NULL".to_string();
        }
        self.params.push(value);
        format!("${}", self.params.len())
    }

    fn expr(&mut self, expr: &Expression) -> String {
        match expr {
            Expression::Literal(value) => self.param(value.clone()),
            Expression::Column(column) => column.to_string(),
            Expression::BinaryOp { op, left, right } => self.binary(*op, left, right),
            Expression::UnaryOp { op, operand } => {
                let operand = self.expr(operand);
                match op {
                    UnaryOperator::Not => format!("(NOT {})", operand),
                    UnaryOperator::IsNull => format!("({} IS NULL)", operand),
                    UnaryOperator::IsNotNull => format!("({} IS NOT NULL)", operand),
                    UnaryOperator::Minus => format!("(-{})", operand),
                    UnaryOperator::ToText => format!("CAST({} AS VARCHAR)", operand),
                }
            }
            Expression::Aggregate { function, arg } => match arg {
                Some(arg) => format!("{}({})", function.name(), self.expr(arg)),
                None => format!("{}(*)", function.name()),
            },
            Expression::Case {
                conditions,
                else_result,
            } => {
                let mut sql = String::from("CASE");
                for (condition, result) in conditions {
                    let condition = self.expr(condition);
                    let result = self.expr(result);
                    sql.push_str(&format!(" WHEN {} THEN {}", condition, result));
                }
                if let Some(else_result) = else_result {
                    sql.push_str(&format!(" ELSE {}", self.expr(else_result)));
                }
                sql.push_str(" END");
                sql
            }
            Expression::In {
                expr,
                list,
                negated,
            } => {
                let probe = self.expr(expr);
                // IN () is not valid SQL; a NULL probe still yields NULL
                if list.is_empty() {
                    let outcome = if *negated { "TRUE" } else { "FALSE" };
                    return format!(
                        "(CASE WHEN {} IS NULL THEN NULL ELSE {} END)",
                        probe, outcome
                    );
                }
                let items: Vec<String> = list.iter().map(|e| self.expr(e)).collect();
                let keyword = if *negated { "NOT IN" } else { "IN" };
                format!("({} {} ({}))", probe, keyword, items.join(", "))
            }
            Expression::InSubquery {
                expr,
                subquery,
                negated,
            } => {
                let probe = self.expr(expr);
                let keyword = if *negated { "NOT IN" } else { "IN" };
                format!("({} {} ({}))", probe, keyword, self.subquery(subquery))
            }
            Expression::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let value = self.expr(expr);
                let low = self.expr(low);
                let high = self.expr(high);
                let keyword = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                format!("({} {} {} AND {})", value, keyword, low, high)
            }
            Expression::Subquery(subquery) => format!("({})", self.subquery(subquery)),
        }
    }

    fn binary(&mut self, op: BinaryOperator, left: &Expression, right: &Expression) -> String {
        let lhs = self.expr(left);
        let pattern = |needle: &str| match op {
            BinaryOperator::Contains => format!("%{}%", escape_like(needle)),
            BinaryOperator::StartsWith => format!("{}%", escape_like(needle)),
            _ => format!("%{}", escape_like(needle)),
        };
        match op {
            BinaryOperator::Contains | BinaryOperator::StartsWith | BinaryOperator::EndsWith => {
                match right {
                    Expression::Literal(Value::String(needle)) => {
                        let param = self.param(Value::String(pattern(needle)));
                        format!("({} LIKE {} ESCAPE '!')", lhs, param)
                    }
                    other => {
                        let rhs = self.expr(other);
                        let wrapped = match op {
                            BinaryOperator::Contains => format!("'%' || {} || '%'", rhs),
                            BinaryOperator::StartsWith => format!("{} || '%'", rhs),
                            _ => format!("'%' || {}", rhs),
                        };
                        format!("({} LIKE ({}))", lhs, wrapped)
                    }
                }
            }
            _ => {
                let rhs = self.expr(right);
                format!("({} {} {})", lhs, op.as_str(), rhs)
            }
        }
    }

    fn subquery(&mut self, subquery: &SubqueryPlan) -> String {
        let select = self.expr(&subquery.select);
        let mut sql = format!("SELECT {} FROM {}", select, table(&subquery.source));
        if let Some(predicate) = subquery.predicate.expression() {
            let predicate = self.expr(predicate);
            sql.push_str(&format!(" WHERE {}", predicate));
        }
        sql
    }
}

fn table(table: &TableRef) -> String {
    if table.alias == table.table_name() {
        table.table_name().to_string()
    } else {
        format!("{} AS {}", table.table_name(), table.alias)
    }
}

/// Escape LIKE wildcards with `!`
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '!') {
            escaped.push('!');
        }
        escaped.push(c);
    }
    escaped
}
