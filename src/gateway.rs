//! Execution gateways.
//!
//! The query layer never touches storage itself. It hands validated plans
//! and bulk statements to an [`ExecutionGateway`] and maps what comes back.
//!
//! - `memory`: in-memory reference gateway
//! - `sql`: lowering of plans and statements to parameterised SQL

pub mod memory;
pub mod sql;

pub use memory::{MemoryGateway, StatementKind, StatementRecord};
pub use sql::{SqlRenderer, SqlStatement};

use crate::query::{BulkDelete, BulkUpdate, QueryPlan};
use crate::value::Value;
use anyhow::Result;

/// One result row, ordered as the plan's select list
pub type Row = Vec<Value>;

/// Runs plans and bulk statements against a datastore.
///
/// Failures are returned as-is; the query layer never retries.
pub trait ExecutionGateway: Send + Sync {
    /// Rows of the plan, ordered and windowed as the plan says
    fn execute_rows(&self, plan: &QueryPlan) -> Result<Vec<Row>>;

    /// Number of rows (or groups) the plan matches, ignoring ordering,
    /// offset and limit
    fn execute_count(&self, plan: &QueryPlan) -> Result<u64>;

    /// Apply the update to every matching row; returns the affected count
    fn execute_bulk_update(&self, statement: &BulkUpdate) -> Result<u64>;

    /// Delete every matching row; returns the affected count
    fn execute_bulk_delete(&self, statement: &BulkDelete) -> Result<u64>;
}
