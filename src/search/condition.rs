//! Search conditions.
//!
//! Every field of [`MemberSearchCondition`] is optional. Each field has a
//! function turning its value into at most one predicate; a missing value,
//! or a blank string, yields `None`, and the composer skips it.

use crate::entity::{MEMBER, TEAM};
use crate::expression::{ExprOps, Predicate};
use crate::query::{compose, PredicateBuilder};
use serde::{Deserialize, Serialize};

/// Filters of a member search. Absent fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberSearchCondition {
    pub name: Option<String>,
    #[serde(alias = "groupName")]
    pub team_name: Option<String>,
    /// Minimum age, inclusive
    pub age_goe: Option<i32>,
    /// Maximum age, inclusive
    pub age_loe: Option<i32>,
}

impl MemberSearchCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_team_name(mut self, team_name: impl Into<String>) -> Self {
        self.team_name = Some(team_name.into());
        self
    }

    pub fn with_age_goe(mut self, age: i32) -> Self {
        self.age_goe = Some(age);
        self
    }

    pub fn with_age_loe(mut self, age: i32) -> Self {
        self.age_loe = Some(age);
        self
    }

    /// Whether no field filters anything
    pub fn is_empty(&self) -> bool {
        self.conditions().iter().all(Option::is_none)
    }

    /// One optional predicate per field, in field order
    pub fn conditions(&self) -> [Option<Predicate>; 4] {
        [
            name_eq(self.name.as_deref()),
            team_name_eq(self.team_name.as_deref()),
            age_goe(self.age_goe),
            age_loe(self.age_loe),
        ]
    }

    /// AND of the present field predicates
    pub fn to_predicate(&self) -> Predicate {
        compose(self.conditions())
    }

    /// The same filter, accumulated field by field
    pub fn to_builder(&self) -> PredicateBuilder {
        let mut builder = PredicateBuilder::new();
        if let Some(name) = present(self.name.as_deref()) {
            builder.and(MEMBER.name.eq(name));
        }
        if let Some(team_name) = present(self.team_name.as_deref()) {
            builder.and(TEAM.name.eq(team_name));
        }
        if let Some(age) = self.age_goe {
            builder.and(MEMBER.age.goe(age));
        }
        if let Some(age) = self.age_loe {
            builder.and(MEMBER.age.loe(age));
        }
        builder
    }
}

fn present(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// `member.name = name`
pub fn name_eq(name: Option<&str>) -> Option<Predicate> {
    present(name).map(|name| MEMBER.name.eq(name))
}

/// `team.name = team_name`; needs the team table joined
pub fn team_name_eq(team_name: Option<&str>) -> Option<Predicate> {
    present(team_name).map(|team_name| TEAM.name.eq(team_name))
}

pub fn age_goe(age: Option<i32>) -> Option<Predicate> {
    age.map(|age| MEMBER.age.goe(age))
}

pub fn age_loe(age: Option<i32>) -> Option<Predicate> {
    age.map(|age| MEMBER.age.loe(age))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_predicates() {
        assert!(name_eq(None).is_none());
        assert!(name_eq(Some("")).is_none());
        assert!(team_name_eq(Some("   ")).is_none());
        assert_eq!(name_eq(Some("member1")), Some(MEMBER.name.eq("member1")));
        assert_eq!(age_goe(Some(20)), Some(MEMBER.age.goe(20)));
        assert!(age_loe(None).is_none());
    }

    #[test]
    fn test_empty_condition_is_neutral() {
        let condition = MemberSearchCondition::new().with_name(" ");
        assert!(condition.is_empty());
        assert!(condition.to_predicate().is_always());
        assert!(!condition.to_builder().has_value());
    }

    #[test]
    fn test_strategies_agree() {
        let conditions = [
            MemberSearchCondition::new(),
            MemberSearchCondition::new().with_name("member1"),
            MemberSearchCondition::new()
                .with_team_name("teamA")
                .with_age_goe(20)
                .with_age_loe(41),
            MemberSearchCondition::new().with_name("").with_age_loe(30),
        ];
        for condition in &conditions {
            assert_eq!(condition.to_predicate(), condition.to_builder().build());
        }
        assert_eq!(
            conditions[2].to_predicate().to_string(),
            "(((team.name = 'teamA') AND (member.age >= 20)) AND (member.age <= 41))"
        );
    }

    #[test]
    fn test_deserialize() -> anyhow::Result<()> {
        let condition: MemberSearchCondition =
            serde_json::from_str(r#"{"name": "member1", "groupName": "teamA", "age_goe": 10}"#)?;
        assert_eq!(
            condition,
            MemberSearchCondition::new()
                .with_name("member1")
                .with_team_name("teamA")
                .with_age_goe(10)
        );
        let empty: MemberSearchCondition = serde_json::from_str("{}")?;
        assert!(empty.is_empty());
        Ok(())
    }
}
