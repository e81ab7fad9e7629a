//! Query construction.
//!
//! - `composer`: folding optional predicates
//! - `plan`: the validated plan handed to gateways
//! - `builder`: fluent select builder
//! - `bulk`: set-based update and delete

pub mod builder;
pub mod bulk;
pub mod composer;
pub mod plan;

pub use builder::{select, select_from, Query, QueryBuilder};
pub use bulk::{delete, update, Assignment, BulkDelete, BulkUpdate, DeleteBuilder, UpdateBuilder};
pub use composer::{compose, PredicateBuilder};
pub use plan::{JoinKind, JoinSpec, ProjectionShape, QueryPlan};
