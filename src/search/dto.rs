//! Result shapes returned by member searches.

use crate::entity::{MEMBER, TEAM};
use crate::error::MappingError;
use crate::expression::ExprOps;
use crate::projection::{ConstructorTarget, FieldSpec, FieldTarget, ParamSpec, Projection, Projections};
use crate::value::{DataType, SqlType, Value};
use serde::{Deserialize, Serialize};

/// A member joined with its team. The team side is empty for members
/// without a team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberTeamDto {
    pub member_id: i64,
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
}

impl MemberTeamDto {
    /// Projection over `member LEFT JOIN team`, bound by position
    pub fn projection() -> Result<Projection<Self>, MappingError> {
        Projections::bind::<Self>(&[
            &MEMBER.id.as_("member_id"),
            &MEMBER.name.as_("username"),
            &MEMBER.age,
            &TEAM.id.as_("team_id"),
            &TEAM.name.as_("team_name"),
        ])
    }
}

impl ConstructorTarget for MemberTeamDto {
    const NAME: &'static str = "MemberTeamDto";
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("member_id", DataType::Int64),
        ParamSpec::new("username", DataType::Varchar),
        ParamSpec::new("age", DataType::Int32),
        ParamSpec::new("team_id", DataType::Int64),
        ParamSpec::new("team_name", DataType::Varchar),
    ];

    fn construct(values: Vec<Value>) -> Result<Self, MappingError> {
        let mut values = values.into_iter();
        let mut next = move || values.next().unwrap_or(Value::Null);
        Ok(MemberTeamDto {
            member_id: i64::from_value(next())?,
            username: Option::<String>::from_value(next())?,
            age: i32::from_value(next())?,
            team_id: Option::<i64>::from_value(next())?,
            team_name: Option::<String>::from_value(next())?,
        })
    }
}

impl FieldTarget for MemberTeamDto {
    const NAME: &'static str = "MemberTeamDto";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("member_id", DataType::Int64),
        FieldSpec::new("username", DataType::Varchar),
        FieldSpec::new("age", DataType::Int32),
        FieldSpec::new("team_id", DataType::Int64),
        FieldSpec::new("team_name", DataType::Varchar),
    ];

    fn set_field(&mut self, field: &str, value: Value) -> Result<(), MappingError> {
        match field {
            "member_id" => self.member_id = i64::from_value(value)?,
            "username" => self.username = Option::<String>::from_value(value)?,
            "age" => self.age = i32::from_value(value)?,
            "team_id" => self.team_id = Option::<i64>::from_value(value)?,
            "team_name" => self.team_name = Option::<String>::from_value(value)?,
            _ => return Err(unknown_field(<Self as FieldTarget>::NAME, field)),
        }
        Ok(())
    }
}

/// Name and age, bound by position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberDto {
    pub name: Option<String>,
    pub age: i32,
}

impl ConstructorTarget for MemberDto {
    const NAME: &'static str = "MemberDto";
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("name", DataType::Varchar),
        ParamSpec::new("age", DataType::Int32),
    ];

    fn construct(values: Vec<Value>) -> Result<Self, MappingError> {
        let mut values = values.into_iter();
        let mut next = move || values.next().unwrap_or(Value::Null);
        Ok(MemberDto {
            name: Option::<String>::from_value(next())?,
            age: i32::from_value(next())?,
        })
    }
}

/// Username and age, assigned by field name. Sources whose names differ
/// are renamed with an alias.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDto {
    pub username: Option<String>,
    pub age: Option<i32>,
}

impl FieldTarget for UserDto {
    const NAME: &'static str = "UserDto";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("username", DataType::Varchar),
        FieldSpec::new("age", DataType::Int32),
    ];

    fn set_field(&mut self, field: &str, value: Value) -> Result<(), MappingError> {
        match field {
            "username" => self.username = Option::<String>::from_value(value)?,
            "age" => self.age = Option::<i32>::from_value(value)?,
            _ => return Err(unknown_field(Self::NAME, field)),
        }
        Ok(())
    }
}

fn unknown_field(target: &'static str, field: &str) -> MappingError {
    MappingError::UnknownField {
        target,
        field: field.to_string(),
    }
}
