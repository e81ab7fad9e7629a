//! Entities and their typed table handles.
//!
//! Entities are plain values. A member refers to its team through the
//! `team_id` foreign key only; a team keeps no list of members, that list is
//! a query (see `MemberRepository::members_of_team`).

use crate::catalog::{AsTable, TableInfo, TableRef, MEMBER_TABLE, TEAM_TABLE};
use crate::error::MappingError;
use crate::expression::{Column, ColumnRef, ExprOps, Predicate};
use crate::value::{SqlType, Value};
use serde::{Deserialize, Serialize};

/// A row type stored in one known table
pub trait Entity: Sized + Send + 'static {
    const TABLE: &'static TableInfo;
    const NAME: &'static str;

    /// Decode a row whose values follow the table's column order
    fn from_row(values: Vec<Value>) -> Result<Self, MappingError>;
}

/// A typed handle on one occurrence of an entity's table
pub trait EntityTable: AsTable {
    type Entity: Entity;

    /// Every column of this occurrence, in table order
    fn columns(&self) -> Vec<ColumnRef> {
        let table = self.table_ref();
        table
            .info
            .columns
            .iter()
            .map(|c| ColumnRef::new(table.alias, c.column_name, c.column_type, c.nullable))
            .collect()
    }
}

/// A new row for a table with an identity column. The identity is assigned
/// by the store.
pub trait Insertable {
    const TABLE: &'static TableInfo;

    /// Values in column order, with NULL in the identity column
    fn into_values(self) -> Vec<Value>;
}

struct RowReader {
    values: std::vec::IntoIter<Value>,
}

impl RowReader {
    fn new<E: Entity>(values: Vec<Value>) -> Result<Self, MappingError> {
        if values.len() != E::TABLE.columns.len() {
            return Err(MappingError::ArityMismatch {
                target: E::NAME,
                expected: E::TABLE.columns.len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            values: values.into_iter(),
        })
    }

    fn next<T: SqlType>(&mut self) -> Result<T, MappingError> {
        T::from_value(self.values.next().unwrap_or(Value::Null))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: Option<String>,
    pub age: i32,
    pub team_id: Option<i64>,
}

impl Entity for Member {
    const TABLE: &'static TableInfo = MEMBER_TABLE;
    const NAME: &'static str = "Member";

    fn from_row(values: Vec<Value>) -> Result<Self, MappingError> {
        let mut row = RowReader::new::<Self>(values)?;
        Ok(Member {
            id: row.next()?,
            name: row.next()?,
            age: row.next()?,
            team_id: row.next()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
}

impl Entity for Team {
    const TABLE: &'static TableInfo = TEAM_TABLE;
    const NAME: &'static str = "Team";

    fn from_row(values: Vec<Value>) -> Result<Self, MappingError> {
        let mut row = RowReader::new::<Self>(values)?;
        Ok(Team {
            id: row.next()?,
            name: row.next()?,
        })
    }
}

/// Member to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMember {
    pub name: Option<String>,
    pub age: i32,
    pub team_id: Option<i64>,
}

impl NewMember {
    pub fn new(name: impl Into<String>, age: i32, team_id: Option<i64>) -> Self {
        Self {
            name: Some(name.into()),
            age,
            team_id,
        }
    }
}

impl Insertable for NewMember {
    const TABLE: &'static TableInfo = MEMBER_TABLE;

    fn into_values(self) -> Vec<Value> {
        vec![
            Value::Null,
            self.name.map_or(Value::Null, Value::String),
            Value::Int32(self.age),
            self.team_id.map_or(Value::Null, Value::Int64),
        ]
    }
}

/// Team to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
}

impl NewTeam {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Insertable for NewTeam {
    const TABLE: &'static TableInfo = TEAM_TABLE;

    fn into_values(self) -> Vec<Value> {
        vec![Value::Null, Value::String(self.name)]
    }
}

/// Typed handle on an occurrence of the member table
#[derive(Debug, Clone, Copy)]
pub struct MemberTable {
    table: TableRef,
    pub id: Column<i64>,
    pub name: Column<Option<String>>,
    pub age: Column<i32>,
    pub team_id: Column<Option<i64>>,
}

impl MemberTable {
    /// A separate occurrence of the member table, e.g. for a subquery
    pub const fn aliased(alias: &'static str) -> Self {
        Self {
            table: TableRef::new(MEMBER_TABLE, alias),
            id: Column::new(alias, "id"),
            name: Column::new(alias, "name"),
            age: Column::new(alias, "age"),
            team_id: Column::new(alias, "team_id"),
        }
    }

    pub fn alias(&self) -> &'static str {
        self.table.alias
    }

    /// `member.team_id = team.id`, the foreign-key join condition
    pub fn belongs_to(&self, team: &TeamTable) -> Predicate {
        self.team_id.eq_expr(&team.id)
    }
}

impl AsTable for MemberTable {
    fn table_ref(&self) -> TableRef {
        self.table
    }
}

impl EntityTable for MemberTable {
    type Entity = Member;
}

/// Typed handle on an occurrence of the team table
#[derive(Debug, Clone, Copy)]
pub struct TeamTable {
    table: TableRef,
    pub id: Column<i64>,
    pub name: Column<String>,
}

impl TeamTable {
    pub const fn aliased(alias: &'static str) -> Self {
        Self {
            table: TableRef::new(TEAM_TABLE, alias),
            id: Column::new(alias, "id"),
            name: Column::new(alias, "name"),
        }
    }

    pub fn alias(&self) -> &'static str {
        self.table.alias
    }
}

impl AsTable for TeamTable {
    fn table_ref(&self) -> TableRef {
        self.table
    }
}

impl EntityTable for TeamTable {
    type Entity = Team;
}

/// Default occurrence of the member table
pub const MEMBER: MemberTable = MemberTable::aliased("member");

/// Default occurrence of the team table
pub const TEAM: TeamTable = TeamTable::aliased("team");
