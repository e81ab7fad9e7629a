//! In-memory reference gateway.
//!
//! Each statement runs against a consistent snapshot: selects hold the read
//! lock for their whole evaluation, mutations hold the write lock. Rows are
//! joined with nested loops, grouped in first-seen order and sorted with a
//! stable sort, so equal keys keep their insertion order.

use crate::catalog::{self, TableInfo, TableRef};
use crate::entity::Insertable;
use crate::expression::{
    ColumnRef, EmptyRow, ExpressionError, ExpressionEvaluator, ExpressionResult, Predicate,
    RowSource, ScopedRow, SubqueryPlan, SubqueryRunner,
};
use crate::gateway::sql::SqlRenderer;
use crate::gateway::{ExecutionGateway, Row};
use crate::query::{BulkDelete, BulkUpdate, JoinKind, QueryPlan};
use crate::value::Value;
use anyhow::{anyhow, bail, Context, Result};
use parking_lot::{Mutex, RwLock};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Kind of statement recorded in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Count,
    Update,
    Delete,
    Insert,
}

/// One executed statement
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRecord {
    pub kind: StatementKind,
    pub sql: String,
}

struct TableData {
    info: &'static TableInfo,
    rows: Vec<Vec<Value>>,
    next_id: i64,
}

impl TableData {
    fn new(info: &'static TableInfo) -> Self {
        Self {
            info,
            rows: Vec::new(),
            next_id: 1,
        }
    }
}

/// Gateway over in-memory tables for every known table
pub struct MemoryGateway {
    tables: RwLock<HashMap<&'static str, TableData>>,
    statements: Mutex<Vec<StatementRecord>>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        let tables = catalog::tables()
            .iter()
            .map(|info| (info.table_name, TableData::new(info)))
            .collect();
        Self {
            tables: RwLock::new(tables),
            statements: Mutex::new(Vec::new()),
        }
    }

    /// Insert a new row and return its identity
    pub fn insert<I: Insertable>(&self, row: I) -> Result<i64> {
        self.insert_values(I::TABLE, row.into_values())
    }

    /// Insert raw values in column order. A NULL identity is assigned from
    /// the table's sequence.
    pub fn insert_values(&self, info: &'static TableInfo, mut values: Vec<Value>) -> Result<i64> {
        if values.len() != info.columns.len() {
            bail!(
                "table '{}' has {} columns but {} values were given",
                info.table_name,
                info.columns.len(),
                values.len()
            );
        }
        let mut tables = self.tables.write();
        let table = table_mut(&mut tables, info.table_name)?;

        let identity = match info.identity.and_then(|name| info.column_index(name)) {
            Some(index) => {
                if values[index].is_null() {
                    values[index] = Value::Int64(table.next_id);
                }
                let id = values[index]
                    .as_i64()
                    .ok_or_else(|| anyhow!("identity of '{}' must be an integer", info.table_name))?;
                if table.rows.iter().any(|row| row[index].as_i64() == Some(id)) {
                    bail!("duplicate identity {} in table '{}'", id, info.table_name);
                }
                id
            }
            None => table.rows.len() as i64 + 1,
        };

        let values = conform(info, values)?;
        table.next_id = table.next_id.max(identity + 1);
        log::trace!("insert into {}: {:?}", info.table_name, values);
        table.rows.push(values);
        drop(tables);

        self.record(
            StatementKind::Insert,
            format!("INSERT INTO {} VALUES (..)", info.table_name),
        );
        Ok(identity)
    }

    /// Number of stored rows in `table_name`
    pub fn row_count(&self, table_name: &str) -> usize {
        self.tables
            .read()
            .get(table_name)
            .map_or(0, |t| t.rows.len())
    }

    /// Statements executed so far, oldest first
    pub fn statements(&self) -> Vec<StatementRecord> {
        self.statements.lock().clone()
    }

    pub fn clear_statements(&self) {
        self.statements.lock().clear();
    }

    fn record(&self, kind: StatementKind, sql: String) {
        self.statements.lock().push(StatementRecord { kind, sql });
    }
}

fn table_mut<'a>(
    tables: &'a mut HashMap<&'static str, TableData>,
    name: &str,
) -> Result<&'a mut TableData> {
    tables
        .get_mut(name)
        .ok_or_else(|| anyhow!("table '{}' not found", name))
}

/// Coerce values to the column types, rejecting NULLs in required columns
fn conform(info: &TableInfo, values: Vec<Value>) -> Result<Vec<Value>> {
    info.columns
        .iter()
        .zip(values)
        .map(|(column, value)| {
            let actual = value.data_type();
            let value = value.coerce_to(column.column_type).ok_or_else(|| {
                anyhow!(
                    "column '{}.{}' expects {}, got {:?}",
                    info.table_name,
                    column.column_name,
                    column.column_type,
                    actual
                )
            })?;
            if !column.accepts(&value) {
                bail!(
                    "column '{}.{}' does not accept NULL",
                    info.table_name,
                    column.column_name
                );
            }
            Ok(value)
        })
        .collect()
}

/// A row under construction: one slot per table occurrence joined so far.
/// An empty slot is the NULL side of a left join.
struct JoinedRow<'a> {
    scope: &'a [TableRef],
    slots: Vec<Option<&'a [Value]>>,
}

impl<'a> JoinedRow<'a> {
    fn extend(&self, slot: Option<&'a [Value]>) -> JoinedRow<'a> {
        let mut slots = self.slots.clone();
        slots.push(slot);
        JoinedRow {
            scope: self.scope,
            slots,
        }
    }
}

impl RowSource for JoinedRow<'_> {
    fn column_value(&self, column: &ColumnRef) -> Option<Value> {
        let index = self.scope.iter().position(|t| t.alias == column.table)?;
        let slot = self.slots.get(index)?;
        let position = self.scope[index].info.column_index(column.name)?;
        match slot {
            Some(values) => values.get(position).cloned(),
            None => Some(Value::Null),
        }
    }
}

/// Read-only view of the tables for the duration of one statement
struct Snapshot<'a> {
    tables: &'a HashMap<&'static str, TableData>,
}

impl<'a> Snapshot<'a> {
    fn rows(&self, table: &TableRef) -> Result<&'a [Vec<Value>]> {
        self.tables
            .get(table.table_name())
            .map(|t| t.rows.as_slice())
            .ok_or_else(|| anyhow!("table '{}' not found", table.table_name()))
    }

    fn evaluator<'r>(&'r self, row: &'r dyn RowSource) -> ExpressionEvaluator<'r> {
        ExpressionEvaluator::new(row).with_subqueries(self)
    }

    /// Joined and filtered rows of a plan
    fn matching_rows<'s>(&'s self, plan: &QueryPlan, scope: &'s [TableRef]) -> Result<Vec<JoinedRow<'s>>> {
        let mut rows: Vec<JoinedRow<'s>> = self
            .rows(&plan.source)?
            .iter()
            .map(|values| JoinedRow {
                scope,
                slots: vec![Some(values.as_slice())],
            })
            .collect();

        for join in &plan.joins {
            let targets = self.rows(&join.target)?;
            let mut joined = Vec::new();
            for left in &rows {
                let mut matched = false;
                for values in targets {
                    let candidate = left.extend(Some(values.as_slice()));
                    if self.evaluator(&candidate).matches(&join.on)? {
                        joined.push(candidate);
                        matched = true;
                    }
                }
                if !matched && join.kind == JoinKind::LeftOuter {
                    joined.push(left.extend(None));
                }
            }
            log::trace!(
                "joined {} ({:?}): {} -> {} rows",
                join.target.alias,
                join.kind,
                rows.len(),
                joined.len()
            );
            rows = joined;
        }

        let mut filtered = Vec::with_capacity(rows.len());
        for row in rows {
            if self.evaluator(&row).matches(&plan.predicate)? {
                filtered.push(row);
            }
        }
        Ok(filtered)
    }

    /// Rows grouped by the plan's keys, in first-seen order. Without keys
    /// everything is one group, even when there are no rows.
    fn groups<'s>(&self, plan: &QueryPlan, rows: Vec<JoinedRow<'s>>) -> Result<Vec<Vec<JoinedRow<'s>>>> {
        if plan.group_by.is_empty() {
            return Ok(vec![rows]);
        }
        let mut groups: Vec<(Vec<Value>, Vec<JoinedRow<'s>>)> = Vec::new();
        for row in rows {
            let key = plan
                .group_by
                .iter()
                .map(|expr| self.evaluator(&row).evaluate(expr))
                .collect::<ExpressionResult<Vec<_>>>()?;
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(row),
                None => groups.push((key, vec![row])),
            }
        }
        Ok(groups.into_iter().map(|(_, members)| members).collect())
    }

    fn select(&self, plan: &QueryPlan) -> Result<Vec<Row>> {
        let scope = plan.tables();
        let rows = self.matching_rows(plan, &scope)?;

        // (output values, sort keys) per result row
        let mut output: Vec<(Row, Vec<Value>)> = Vec::new();
        if plan.is_grouped() {
            for group in self.groups(plan, rows)? {
                let members: Vec<&dyn RowSource> =
                    group.iter().map(|r| r as &dyn RowSource).collect();
                let first: &dyn RowSource = members.first().copied().unwrap_or(&EmptyRow);
                let evaluator = self.evaluator(first).with_group(&members);
                output.push(self.project(plan, &evaluator)?);
            }
        } else {
            for row in &rows {
                output.push(self.project(plan, &self.evaluator(row))?);
            }
        }

        output.sort_by(|(_, a), (_, b)| {
            plan.order_by
                .iter()
                .zip(a.iter().zip(b))
                .map(|(spec, (x, y))| spec.compare(x, y))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        let offset = plan.offset.map_or(0, |o| o as usize);
        let limit = plan.limit.map_or(usize::MAX, |l| l as usize);
        Ok(output
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(values, _)| values)
            .collect())
    }

    fn project(&self, plan: &QueryPlan, evaluator: &ExpressionEvaluator<'_>) -> Result<(Row, Vec<Value>)> {
        let values = plan
            .select
            .iter()
            .map(|item| evaluator.evaluate(&item.expr))
            .collect::<ExpressionResult<Vec<_>>>()?;
        let keys = plan
            .order_by
            .iter()
            .map(|spec| evaluator.evaluate(&spec.expr))
            .collect::<ExpressionResult<Vec<_>>>()?;
        Ok((values, keys))
    }

    fn count(&self, plan: &QueryPlan) -> Result<u64> {
        let scope = plan.tables();
        let rows = self.matching_rows(plan, &scope)?;
        let count = if plan.is_grouped() {
            self.groups(plan, rows)?.len()
        } else {
            rows.len()
        };
        Ok(count as u64)
    }

    /// Indexes of the rows of `target` matching `predicate`
    fn matching_indexes(&self, target: &TableRef, predicate: &Predicate) -> Result<Vec<usize>> {
        let scope = [*target];
        let mut indexes = Vec::new();
        for (index, values) in self.rows(target)?.iter().enumerate() {
            let row = JoinedRow {
                scope: &scope,
                slots: vec![Some(values.as_slice())],
            };
            if self.evaluator(&row).matches(predicate)? {
                indexes.push(index);
            }
        }
        Ok(indexes)
    }
}

impl SubqueryRunner for Snapshot<'_> {
    fn run(&self, subquery: &SubqueryPlan, outer: &dyn RowSource) -> ExpressionResult<Vec<Value>> {
        let scope = [subquery.source];
        let rows = self
            .rows(&subquery.source)
            .map_err(|e| ExpressionError::EvaluationError {
                message: e.to_string(),
            })?;

        let candidates: Vec<JoinedRow<'_>> = rows
            .iter()
            .map(|values| JoinedRow {
                scope: &scope,
                slots: vec![Some(values.as_slice())],
            })
            .collect();
        let mut matching = Vec::new();
        for row in &candidates {
            let scoped = ScopedRow { inner: row, outer };
            if self.evaluator(&scoped).matches(&subquery.predicate)? {
                matching.push(scoped);
            }
        }

        if subquery.select.contains_aggregate() {
            let members: Vec<&dyn RowSource> =
                matching.iter().map(|r| r as &dyn RowSource).collect();
            let first: &dyn RowSource = members.first().copied().unwrap_or(outer);
            let value = self
                .evaluator(first)
                .with_group(&members)
                .evaluate(&subquery.select)?;
            return Ok(vec![value]);
        }
        matching
            .iter()
            .map(|row| self.evaluator(row).evaluate(&subquery.select))
            .collect()
    }
}

impl ExecutionGateway for MemoryGateway {
    fn execute_rows(&self, plan: &QueryPlan) -> Result<Vec<Row>> {
        self.record(StatementKind::Select, SqlRenderer::select(plan).sql);
        let tables = self.tables.read();
        let rows = Snapshot { tables: &tables }
            .select(plan)
            .with_context(|| format!("failed to execute: {}", plan))?;
        log::trace!("select returned {} rows", rows.len());
        Ok(rows)
    }

    fn execute_count(&self, plan: &QueryPlan) -> Result<u64> {
        self.record(StatementKind::Count, SqlRenderer::count(plan).sql);
        let tables = self.tables.read();
        Snapshot { tables: &tables }
            .count(plan)
            .with_context(|| format!("failed to count: {}", plan))
    }

    fn execute_bulk_update(&self, statement: &BulkUpdate) -> Result<u64> {
        self.record(StatementKind::Update, SqlRenderer::update(statement).sql);
        let mut tables = self.tables.write();
        let info = statement.target.info;

        // Every assignment sees the row as it was before the statement
        let updates = {
            let snapshot = Snapshot { tables: &tables };
            let rows = snapshot.rows(&statement.target)?;
            let scope = [statement.target];
            let mut updates = Vec::new();
            for index in snapshot.matching_indexes(&statement.target, &statement.predicate)? {
                let row = JoinedRow {
                    scope: &scope,
                    slots: vec![Some(rows[index].as_slice())],
                };
                let mut values = rows[index].clone();
                for assignment in &statement.assignments {
                    let position = info.column_index(assignment.column.name).ok_or_else(|| {
                        anyhow!(
                            "column '{}' not found in table '{}'",
                            assignment.column.name,
                            info.table_name
                        )
                    })?;
                    values[position] = snapshot.evaluator(&row).evaluate(&assignment.value)?;
                }
                updates.push((index, conform(info, values)?));
            }
            updates
        };

        let table = table_mut(&mut tables, info.table_name)?;
        let count = updates.len() as u64;
        for (index, values) in updates {
            table.rows[index] = values;
        }
        log::debug!("updated {} rows in {}", count, info.table_name);
        Ok(count)
    }

    fn execute_bulk_delete(&self, statement: &BulkDelete) -> Result<u64> {
        self.record(StatementKind::Delete, SqlRenderer::delete(statement).sql);
        let mut tables = self.tables.write();
        let doomed = Snapshot { tables: &tables }
            .matching_indexes(&statement.target, &statement.predicate)?;

        let table = table_mut(&mut tables, statement.target.table_name())?;
        let mut index = 0;
        table.rows.retain(|_| {
            let keep = doomed.binary_search(&index).is_err();
            index += 1;
            keep
        });
        log::debug!(
            "deleted {} rows from {}",
            doomed.len(),
            statement.target.table_name()
        );
        Ok(doomed.len() as u64)
    }
}
