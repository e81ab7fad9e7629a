//! Member search.
//!
//! - `condition`: optional search fields and their per-field predicates
//! - `dto`: result shapes returned by searches
//! - `page`: page requests and page results
//! - `repository`: the search and lookup entry points

pub mod condition;
pub mod dto;
pub mod page;
pub mod repository;

pub use condition::{age_goe, age_loe, name_eq, team_name_eq, MemberSearchCondition};
pub use dto::{MemberDto, MemberTeamDto, UserDto};
pub use page::{Page, PageRequest};
pub use repository::MemberRepository;
