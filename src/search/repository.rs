//! Member search and lookups.

use crate::entity::{Member, MEMBER, TEAM};
use crate::error::{QueryError, QueryResult};
use crate::expression::{ExprOps, Predicate};
use crate::gateway::ExecutionGateway;
use crate::query::{select, select_from, Query};
use crate::search::condition::MemberSearchCondition;
use crate::search::dto::MemberTeamDto;
use crate::search::page::{Page, PageRequest};
use crate::session::Session;
use std::sync::Arc;

/// Entry point for searching members with their teams.
///
/// Searches left-join member to team and order by member id, so members
/// without a team are included and results are deterministic.
#[derive(Clone)]
pub struct MemberRepository {
    session: Session,
}

impl MemberRepository {
    pub fn new(gateway: Arc<dyn ExecutionGateway>) -> Self {
        Self::with_session(Session::new(gateway))
    }

    pub fn with_session(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Search query built from the per-field predicates
    pub fn search_query(&self, condition: &MemberSearchCondition) -> QueryResult<Query<MemberTeamDto>> {
        Self::member_team_query(condition.to_predicate())
    }

    /// Search query built by accumulating conditions one by one
    pub fn builder_query(&self, condition: &MemberSearchCondition) -> QueryResult<Query<MemberTeamDto>> {
        Self::member_team_query(condition.to_builder().build())
    }

    fn member_team_query(predicate: Predicate) -> QueryResult<Query<MemberTeamDto>> {
        let query = select(MemberTeamDto::projection()?)
            .from(&MEMBER)
            .left_join(&TEAM, MEMBER.belongs_to(&TEAM))
            .filter(predicate)
            .order_by(MEMBER.id.asc())
            .build()?;
        Ok(query)
    }

    /// Members matching `condition`, optionally restricted to one page
    pub fn search(
        &self,
        condition: &MemberSearchCondition,
        page: Option<PageRequest>,
    ) -> QueryResult<Vec<MemberTeamDto>> {
        let query = self.search_query(condition)?;
        match page {
            Some(page) => {
                self.session.config().check_page_size(page.limit)?;
                self.session
                    .fetch(&query.with_window(Some(page.offset), Some(page.limit)))
            }
            None => self.session.fetch(&query),
        }
    }

    /// One page of matching members plus the total number of matches
    pub fn search_page(
        &self,
        condition: &MemberSearchCondition,
        page: PageRequest,
    ) -> QueryResult<Page<MemberTeamDto>> {
        let query = self.search_query(condition)?;
        self.session.fetch_page(&query, page)
    }

    /// Same results as [`Self::search`] without paging
    pub fn search_by_builder(&self, condition: &MemberSearchCondition) -> QueryResult<Vec<MemberTeamDto>> {
        let query = self.builder_query(condition)?;
        self.session.fetch(&query)
    }

    pub fn find_by_id(&self, id: i64) -> QueryResult<Option<Member>> {
        let query = select_from(&MEMBER).filter(MEMBER.id.eq(id)).build()?;
        match self.session.fetch_one(&query) {
            Ok(member) => Ok(Some(member)),
            Err(QueryError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn find_all(&self) -> QueryResult<Vec<Member>> {
        let query = select_from(&MEMBER).order_by(MEMBER.id.asc()).build()?;
        self.session.fetch(&query)
    }

    pub fn find_by_name(&self, name: &str) -> QueryResult<Vec<Member>> {
        let query = select_from(&MEMBER)
            .filter(MEMBER.name.eq(name))
            .order_by(MEMBER.id.asc())
            .build()?;
        self.session.fetch(&query)
    }

    /// Members whose `team_id` points at the team
    pub fn members_of_team(&self, team_id: i64) -> QueryResult<Vec<Member>> {
        let query = select_from(&MEMBER)
            .filter(MEMBER.team_id.eq(team_id))
            .order_by(MEMBER.id.asc())
            .build()?;
        self.session.fetch(&query)
    }
}
