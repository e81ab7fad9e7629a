pub mod catalog;
pub mod config;
pub mod entity;
pub mod error;
pub mod expression;
pub mod gateway;
pub mod projection;
pub mod query;
pub mod search;
pub mod session;
pub mod value;

/// Everything needed to build and run queries
pub mod prelude {
    pub use crate::config::SessionConfig;
    pub use crate::entity::{Member, MemberTable, NewMember, NewTeam, Team, TeamTable, MEMBER, TEAM};
    pub use crate::error::{ConfigError, MappingError, QueryError, QueryResult};
    pub use crate::expression::{
        case, constant, count_all, subquery, ExprOps, NumericOps, Predicate, TextOps,
    };
    pub use crate::gateway::{ExecutionGateway, MemoryGateway};
    pub use crate::projection::{Projections, Tuple};
    pub use crate::query::{compose, delete, select, select_from, update, Assignment, PredicateBuilder};
    pub use crate::search::{MemberRepository, MemberSearchCondition, MemberTeamDto, Page, PageRequest};
    pub use crate::session::Session;
}
