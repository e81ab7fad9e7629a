//! Folding optional conditions into a single predicate.
//!
//! Search forms produce a handful of conditions, any of which may be
//! missing. Both helpers here skip absent conditions instead of failing, and
//! produce the neutral predicate when nothing was supplied, so callers never
//! branch on "is any filter set".

use crate::expression::Predicate;

/// AND of every present predicate. All absent yields [`Predicate::always`].
pub fn compose<I>(conditions: I) -> Predicate
where
    I: IntoIterator<Item = Option<Predicate>>,
{
    conditions
        .into_iter()
        .flatten()
        .fold(Predicate::always(), Predicate::and)
}

/// Incremental accumulator for predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateBuilder {
    predicate: Predicate,
}

impl PredicateBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// AND a condition onto the accumulator
    pub fn and(&mut self, predicate: Predicate) -> &mut Self {
        let current = std::mem::take(&mut self.predicate);
        self.predicate = current.and(predicate);
        self
    }

    /// AND a condition if present
    pub fn and_opt(&mut self, predicate: Option<Predicate>) -> &mut Self {
        if let Some(predicate) = predicate {
            self.and(predicate);
        }
        self
    }

    /// OR a condition onto the accumulator. On an empty accumulator the
    /// condition becomes the first term.
    pub fn or(&mut self, predicate: Predicate) -> &mut Self {
        let current = std::mem::take(&mut self.predicate);
        self.predicate = if current.is_always() {
            predicate
        } else {
            current.or(predicate)
        };
        self
    }

    /// Whether any term has been added
    pub fn has_value(&self) -> bool {
        !self.predicate.is_always()
    }

    pub fn value(&self) -> &Predicate {
        &self.predicate
    }

    pub fn build(self) -> Predicate {
        self.predicate
    }
}

impl From<PredicateBuilder> for Predicate {
    fn from(builder: PredicateBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{MEMBER, TEAM};
    use crate::expression::{ExprOps, TextOps};

    #[test]
    fn test_compose_skips_absent() {
        let composed = compose([
            Some(MEMBER.name.eq("member1")),
            None,
            Some(MEMBER.age.goe(10)),
        ]);
        assert_eq!(
            composed.to_string(),
            "((member.name = 'member1') AND (member.age >= 10))"
        );
        assert!(compose([None, None]).is_always());
        assert!(compose(Vec::<Option<Predicate>>::new()).is_always());
    }

    #[test]
    fn test_builder_accumulates() {
        let mut builder = PredicateBuilder::new();
        assert!(!builder.has_value());
        builder
            .and_opt(Some(MEMBER.name.eq("member1")))
            .and_opt(None)
            .and(TEAM.name.eq("teamB"));
        assert!(builder.has_value());
        assert_eq!(
            builder.build().to_string(),
            "((member.name = 'member1') AND (team.name = 'teamB'))"
        );
    }

    #[test]
    fn test_builder_matches_compose() {
        let conditions = || {
            [
                None,
                Some(MEMBER.age.goe(20)),
                Some(MEMBER.age.loe(40)),
            ]
        };
        let mut builder = PredicateBuilder::new();
        for condition in conditions() {
            builder.and_opt(condition);
        }
        assert_eq!(builder.build(), compose(conditions()));
    }

    #[test]
    fn test_or_on_empty_starts_accumulator() {
        let mut builder = PredicateBuilder::new();
        builder.or(MEMBER.name.contains("1"));
        assert_eq!(builder.value().to_string(), "(member.name CONTAINS '1')");
        builder.or(MEMBER.age.lt(5));
        assert_eq!(
            builder.value().to_string(),
            "((member.name CONTAINS '1') OR (member.age < 5))"
        );
    }
}
