//! Execution of built queries and bulk statements.
//!
//! A [`Session`] owns a handle to the gateway and the session settings. It
//! never inspects storage: plans go to the gateway and the rows that come
//! back are decoded by the query's own row mapper.

use crate::catalog::AsTable;
use crate::config::SessionConfig;
use crate::error::{QueryError, QueryResult};
use crate::expression::Predicate;
use crate::gateway::{ExecutionGateway, SqlRenderer};
use crate::query::{delete, update, Assignment, BulkDelete, BulkUpdate, Query, QueryPlan};
use crate::search::{Page, PageRequest};
use std::sync::Arc;

/// Runs queries against one gateway
#[derive(Clone)]
pub struct Session {
    gateway: Arc<dyn ExecutionGateway>,
    config: SessionConfig,
}

impl Session {
    pub fn new(gateway: Arc<dyn ExecutionGateway>) -> Self {
        Self::with_config(gateway, SessionConfig::default())
    }

    pub fn with_config(gateway: Arc<dyn ExecutionGateway>, config: SessionConfig) -> Self {
        Self { gateway, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<dyn ExecutionGateway> {
        &self.gateway
    }

    /// Every row of the query, decoded
    pub fn fetch<R>(&self, query: &Query<R>) -> QueryResult<Vec<R>> {
        let plan = query.plan();
        self.log_select(plan);
        let rows = self
            .gateway
            .execute_rows(plan)
            .map_err(QueryError::Execution)?;
        log::debug!("fetched {} rows", rows.len());

        rows.into_iter()
            .map(|row| query.map_row(row).map_err(QueryError::from))
            .collect()
    }

    /// Exactly one row. Fails with `NotFound` or `NonUnique` otherwise.
    pub fn fetch_one<R>(&self, query: &Query<R>) -> QueryResult<R> {
        let limit = query.plan().limit.map_or(2, |limit| limit.min(2));
        let windowed = query.with_window(query.plan().offset, Some(limit));
        let mut rows = self.fetch(&windowed)?;
        match rows.len() {
            0 => Err(QueryError::NotFound),
            1 => rows.pop().ok_or(QueryError::NotFound),
            _ => Err(QueryError::NonUnique),
        }
    }

    /// The first row in plan order, if any
    pub fn fetch_first<R>(&self, query: &Query<R>) -> QueryResult<Option<R>> {
        let windowed = query.with_window(query.plan().offset, Some(1));
        Ok(self.fetch(&windowed)?.into_iter().next())
    }

    /// Number of rows (or groups) matching the query, ignoring its window
    pub fn fetch_count<R>(&self, query: &Query<R>) -> QueryResult<u64> {
        let plan = query.plan().clone().with_window(None, None);
        if self.config.log_statements {
            log::debug!("{}", SqlRenderer::count(&plan));
        }
        self.gateway
            .execute_count(&plan)
            .map_err(QueryError::Execution)
    }

    /// One page of the query plus the total count of the unpaged query.
    ///
    /// The content is fetched with the page window, then the count is taken
    /// from the same query without it.
    pub fn fetch_page<R>(&self, query: &Query<R>, request: PageRequest) -> QueryResult<Page<R>> {
        self.config.check_page_size(request.limit)?;
        let windowed = query.with_window(Some(request.offset), Some(request.limit));

        let content = self.fetch(&windowed)?;
        let total_count = self.fetch_count(query)?;
        log::debug!(
            "page at offset {} holds {} of {} rows",
            request.offset,
            content.len(),
            total_count
        );
        Ok(Page::new(content, total_count, request))
    }

    pub fn execute_update(&self, statement: &BulkUpdate) -> QueryResult<u64> {
        if self.config.log_statements {
            log::debug!("{}", SqlRenderer::update(statement));
        }
        let affected = self
            .gateway
            .execute_bulk_update(statement)
            .map_err(QueryError::Execution)?;
        log::debug!("{} updated {} rows", statement.target.alias, affected);
        Ok(affected)
    }

    pub fn execute_delete(&self, statement: &BulkDelete) -> QueryResult<u64> {
        if self.config.log_statements {
            log::debug!("{}", SqlRenderer::delete(statement));
        }
        let affected = self
            .gateway
            .execute_bulk_delete(statement)
            .map_err(QueryError::Execution)?;
        log::debug!("{} deleted {} rows", statement.target.alias, affected);
        Ok(affected)
    }

    /// Build and run `UPDATE table SET assignments WHERE predicate`.
    ///
    /// Rows already loaded by the caller are not refreshed.
    pub fn bulk_update<A: AsTable>(
        &self,
        table: &A,
        predicate: Predicate,
        assignments: Vec<Assignment>,
    ) -> QueryResult<u64> {
        let statement = assignments
            .into_iter()
            .fold(update(table), |builder, assignment| builder.assign(assignment))
            .filter(predicate)
            .build()?;
        self.execute_update(&statement)
    }

    pub fn bulk_delete<A: AsTable>(&self, table: &A, predicate: Predicate) -> QueryResult<u64> {
        let statement = delete(table).filter(predicate).build()?;
        self.execute_delete(&statement)
    }

    fn log_select(&self, plan: &QueryPlan) {
        if self.config.log_statements {
            log::debug!("{}", SqlRenderer::select(plan));
        } else {
            log::trace!("executing {}", plan);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Member, NewMember, NewTeam, MEMBER, TEAM};
    use crate::error::ConfigError;
    use crate::expression::{ExprOps, NumericOps};
    use crate::gateway::{MemoryGateway, StatementKind};
    use crate::projection::Projections;
    use crate::query::{select, select_from};
    use anyhow::Result;

    fn setup() -> Result<(Arc<MemoryGateway>, Session)> {
        let gateway = Arc::new(MemoryGateway::new());
        let team_a = gateway.insert(NewTeam::new("teamA"))?;
        let team_b = gateway.insert(NewTeam::new("teamB"))?;
        for (i, age) in [10, 20, 30, 40].into_iter().enumerate() {
            let team = if i < 2 { team_a } else { team_b };
            gateway.insert(NewMember::new(format!("member{}", i + 1), age, Some(team)))?;
        }
        let session = Session::new(gateway.clone());
        Ok((gateway, session))
    }

    #[test]
    fn test_fetch_entities() -> Result<()> {
        let (_, session) = setup()?;
        let query = select_from(&MEMBER)
            .filter(MEMBER.age.goe(20))
            .order_by(MEMBER.age.desc())
            .build()?;
        let members: Vec<Member> = session.fetch(&query)?;
        let ages: Vec<i32> = members.iter().map(|m| m.age).collect();
        assert_eq!(ages, vec![40, 30, 20]);
        assert_eq!(session.fetch_count(&query)?, 3);
        Ok(())
    }

    #[test]
    fn test_fetch_one() -> Result<()> {
        let (_, session) = setup()?;
        let query = select_from(&MEMBER).filter(MEMBER.age.eq(30)).build()?;
        assert_eq!(session.fetch_one(&query)?.name.as_deref(), Some("member3"));

        let none = select_from(&MEMBER).filter(MEMBER.age.gt(100)).build()?;
        assert!(matches!(session.fetch_one(&none), Err(QueryError::NotFound)));
        assert!(session.fetch_first(&none)?.is_none());

        let many = select_from(&MEMBER).order_by(MEMBER.id.asc()).build()?;
        assert!(matches!(session.fetch_one(&many), Err(QueryError::NonUnique)));
        assert_eq!(session.fetch_first(&many)?.map(|m| m.age), Some(10));
        Ok(())
    }

    #[test]
    fn test_fetch_page_issues_rows_then_count() -> Result<()> {
        let (gateway, session) = setup()?;
        gateway.clear_statements();
        let query = select_from(&MEMBER).order_by(MEMBER.id.asc()).build()?;

        let page = session.fetch_page(&query, PageRequest::new(1, 2))?;
        assert_eq!(page.total_count, 4);
        assert_eq!(
            page.content.iter().map(|m| m.age).collect::<Vec<_>>(),
            vec![20, 30]
        );
        let kinds: Vec<StatementKind> = gateway.statements().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![StatementKind::Select, StatementKind::Count]);

        let past_end = session.fetch_page(&query, PageRequest::new(10, 2))?;
        assert!(past_end.content.is_empty());
        assert_eq!(past_end.total_count, 4);
        Ok(())
    }

    /// Counts by running the plan as given, window included
    struct LiteralCountGateway(Arc<MemoryGateway>);

    impl ExecutionGateway for LiteralCountGateway {
        fn execute_rows(&self, plan: &QueryPlan) -> Result<Vec<crate::gateway::Row>> {
            self.0.execute_rows(plan)
        }

        fn execute_count(&self, plan: &QueryPlan) -> Result<u64> {
            Ok(self.0.execute_rows(plan)?.len() as u64)
        }

        fn execute_bulk_update(&self, statement: &BulkUpdate) -> Result<u64> {
            self.0.execute_bulk_update(statement)
        }

        fn execute_bulk_delete(&self, statement: &BulkDelete) -> Result<u64> {
            self.0.execute_bulk_delete(statement)
        }
    }

    #[test]
    fn test_page_count_drops_window() -> Result<()> {
        let (gateway, _) = setup()?;
        let session = Session::new(Arc::new(LiteralCountGateway(gateway)));
        let query = select_from(&MEMBER).order_by(MEMBER.id.asc()).build()?;

        let page = session.fetch_page(&query, PageRequest::new(1, 2))?;
        assert_eq!(page.content.len(), 2);
        assert_eq!(page.total_count, 4);

        let windowed = query.with_window(Some(3), Some(1));
        assert_eq!(session.fetch_count(&windowed)?, 4);
        Ok(())
    }

    #[test]
    fn test_page_size_limits() -> Result<()> {
        let (gateway, session) = setup()?;
        let query = select_from(&MEMBER).build()?;
        assert!(matches!(
            session.fetch_page(&query, PageRequest::new(0, 0)),
            Err(QueryError::Configuration(ConfigError::InvalidPageSize))
        ));

        let strict = Session::with_config(gateway, SessionConfig::default().with_max_page_size(Some(3)));
        assert!(matches!(
            strict.fetch_page(&query, PageRequest::new(0, 4)),
            Err(QueryError::Configuration(ConfigError::PageSizeTooLarge { requested: 4, max: 3 }))
        ));
        assert_eq!(strict.fetch_page(&query, PageRequest::new(0, 3))?.content.len(), 3);
        Ok(())
    }

    #[test]
    fn test_bulk_operations() -> Result<()> {
        let (_, session) = setup()?;
        let affected = session.bulk_update(
            &MEMBER,
            MEMBER.age.lt(28),
            vec![Assignment::new(&MEMBER.name, "non-member")],
        )?;
        assert_eq!(affected, 2);

        let renamed = select_from(&MEMBER)
            .filter(MEMBER.name.eq("non-member"))
            .build()?;
        assert_eq!(session.fetch_count(&renamed)?, 2);

        let older = session.bulk_update(
            &MEMBER,
            Predicate::always(),
            vec![Assignment::expr(&MEMBER.age, &MEMBER.age.add(1))],
        )?;
        assert_eq!(older, 4);

        assert_eq!(session.bulk_delete(&MEMBER, MEMBER.age.gt(30))?, 2);
        let ages = select(Projections::value(&MEMBER.age))
            .from(&MEMBER)
            .order_by(MEMBER.age.asc())
            .build()?;
        assert_eq!(session.fetch(&ages)?, vec![11, 21]);

        assert!(matches!(
            session.bulk_update(&MEMBER, Predicate::always(), Vec::new()),
            Err(QueryError::Configuration(ConfigError::EmptyAssignments(_)))
        ));
        assert!(matches!(
            session.bulk_delete(&MEMBER, TEAM.name.eq("teamA")),
            Err(QueryError::Configuration(ConfigError::UnjoinedTable { .. }))
        ));
        Ok(())
    }
}
