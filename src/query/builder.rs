//! Fluent assembly and validation of select queries.
//!
//! ```ignore
//! let query = select(Projections::entity(&MEMBER))
//!     .from(&MEMBER)
//!     .left_join(&TEAM, MEMBER.belongs_to(&TEAM))
//!     .filter(MEMBER.age.goe(20))
//!     .order_by(MEMBER.age.desc())
//!     .build()?;
//! ```
//!
//! Everything that can be checked without data is checked in `build`: join
//! scope, alias uniqueness, operand types, grouping.

use crate::catalog::{AsTable, TableRef};
use crate::entity::EntityTable;
use crate::error::{ConfigError, MappingError};
use crate::expression::{
    Expression, ExpressionError, OrderSpec, Predicate, SelectItem, TypeChecker, TypedExpr,
};
use crate::projection::{self, Projection, RowMapper};
use crate::query::composer::compose;
use crate::query::plan::{JoinKind, JoinSpec, ProjectionShape, QueryPlan};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Start a query with the given projection
pub fn select<R>(projection: Projection<R>) -> QueryBuilder<R> {
    QueryBuilder::new(projection)
}

/// Start an entity query over `table`
pub fn select_from<T: EntityTable>(table: &T) -> QueryBuilder<T::Entity> {
    select(projection::Projections::entity(table)).from(table)
}

/// Builder for a [`Query`]
pub struct QueryBuilder<R> {
    source: Option<TableRef>,
    joins: Vec<JoinSpec>,
    predicate: Predicate,
    select: Vec<SelectItem>,
    shape: ProjectionShape,
    mapper: RowMapper<R>,
    group_by: Vec<Expression>,
    order_by: Vec<OrderSpec>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl<R> QueryBuilder<R> {
    fn new(projection: Projection<R>) -> Self {
        let (select, shape, mapper) = projection.into_parts();
        Self {
            source: None,
            joins: Vec::new(),
            predicate: Predicate::always(),
            select,
            shape,
            mapper,
            group_by: Vec::new(),
            order_by: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    pub fn from<A: AsTable>(mut self, table: &A) -> Self {
        self.source = Some(table.table_ref());
        self
    }

    pub fn inner_join<A: AsTable>(self, table: &A, on: Predicate) -> Self {
        self.join(table, on, JoinKind::Inner)
    }

    pub fn left_join<A: AsTable>(self, table: &A, on: Predicate) -> Self {
        self.join(table, on, JoinKind::LeftOuter)
    }

    fn join<A: AsTable>(mut self, table: &A, on: Predicate, kind: JoinKind) -> Self {
        self.joins.push(JoinSpec {
            target: table.table_ref(),
            on,
            kind,
        });
        self
    }

    /// AND a condition onto the WHERE clause
    pub fn filter(mut self, predicate: Predicate) -> Self {
        let current = std::mem::take(&mut self.predicate);
        self.predicate = current.and(predicate);
        self
    }

    /// AND every present condition onto the WHERE clause
    pub fn filter_all<I>(self, conditions: I) -> Self
    where
        I: IntoIterator<Item = Option<Predicate>>,
    {
        self.filter(compose(conditions))
    }

    pub fn group_by<E: TypedExpr>(mut self, expr: &E) -> Self {
        self.group_by.push(expr.expression());
        self
    }

    /// Add a sort key after the existing ones
    pub fn order_by(mut self, spec: OrderSpec) -> Self {
        self.order_by.push(spec);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Maximum number of rows; 0 yields no rows
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Validate and freeze the query
    pub fn build(self) -> Result<Query<R>, ConfigError> {
        let source = self.source.ok_or(ConfigError::MissingSource)?;

        let mut scope = vec![source];
        for join in &self.joins {
            if scope.iter().any(|t| t.alias == join.target.alias) {
                return Err(ConfigError::DuplicateAlias(join.target.alias.to_string()));
            }
            scope.push(join.target);
            // ON sees the source and everything joined so far
            check_filter(&scope, &join.on, "JOIN condition")?;
        }

        check_filter(&scope, &self.predicate, "WHERE clause")?;

        let checker = TypeChecker::new(&scope);
        for item in &self.select {
            check_value(&checker, &item.expr, "select list")?;
        }
        for key in &self.group_by {
            if key.contains_aggregate() {
                return Err(ConfigError::Expression {
                    context: "GROUP BY",
                    source: ExpressionError::MisplacedAggregate {
                        context: "GROUP BY".to_string(),
                    },
                });
            }
            check_value(&checker, key, "GROUP BY")?;
        }
        for spec in &self.order_by {
            check_value(&checker, &spec.expr, "ORDER BY")?;
        }

        let plan = QueryPlan {
            source,
            joins: self.joins,
            predicate: self.predicate,
            select: self.select,
            shape: self.shape,
            group_by: self.group_by,
            order_by: self.order_by,
            offset: self.offset,
            limit: self.limit,
        };
        if plan.is_grouped() {
            check_grouping(&plan)?;
        }

        Ok(Query {
            plan,
            mapper: self.mapper,
        })
    }
}

/// Map a type-checker failure onto the configuration error for `context`
pub(crate) fn config_error(context: &'static str, err: ExpressionError) -> ConfigError {
    match err {
        ExpressionError::UnknownTable { alias } => ConfigError::UnjoinedTable { alias, context },
        ExpressionError::AliasCollision { alias } => ConfigError::DuplicateAlias(alias),
        source => ConfigError::Expression { context, source },
    }
}

pub(crate) fn check_filter(
    scope: &[TableRef],
    predicate: &Predicate,
    context: &'static str,
) -> Result<(), ConfigError> {
    match predicate.expression() {
        Some(expr) => TypeChecker::new(scope)
            .check_filter_predicate(expr, context)
            .map_err(|e| config_error(context, e)),
        None => Ok(()),
    }
}

fn check_value(
    checker: &TypeChecker<'_>,
    expr: &Expression,
    context: &'static str,
) -> Result<(), ConfigError> {
    checker
        .check(expr)
        .map(|_| ())
        .map_err(|e| config_error(context, e))
}

fn check_grouping(plan: &QueryPlan) -> Result<(), ConfigError> {
    let select = plan.select.iter().map(|s| (&s.expr, "select list"));
    let order = plan.order_by.iter().map(|o| (&o.expr, "ORDER BY"));
    for (expr, context) in select.chain(order) {
        if !expr.is_covered_by(&plan.group_by) {
            return Err(ConfigError::UngroupedExpression {
                expression: expr.to_string(),
                context,
            });
        }
    }
    Ok(())
}

/// A validated plan and the mapper for its rows
pub struct Query<R> {
    plan: QueryPlan,
    mapper: RowMapper<R>,
}

impl<R> Query<R> {
    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    /// Decode one row returned for this plan
    pub fn map_row(&self, row: Vec<Value>) -> Result<R, MappingError> {
        projection::map_row(&self.mapper, self.plan.select.len(), row)
    }

    /// Same query restricted to another window
    pub fn with_window(&self, offset: Option<u64>, limit: Option<u64>) -> Query<R> {
        Query {
            plan: self.plan.clone().with_window(offset, limit),
            mapper: Arc::clone(&self.mapper),
        }
    }
}

impl<R> Clone for Query<R> {
    fn clone(&self) -> Self {
        Self {
            plan: self.plan.clone(),
            mapper: Arc::clone(&self.mapper),
        }
    }
}

impl<R> fmt::Debug for Query<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query").field("plan", &self.plan).finish()
    }
}
