//! Single-column subqueries.

use crate::catalog::{AsTable, TableRef};
use crate::expression::column::TypedExpr;
use crate::expression::expr::{Expression, SubqueryPlan};
use crate::expression::predicate::Predicate;
use crate::value::SqlType;
use std::marker::PhantomData;

/// Start a subquery over a table occurrence. The occurrence must use an alias
/// distinct from every table of the enclosing query.
pub fn subquery<A: AsTable>(table: &A) -> SubqueryBuilder {
    SubqueryBuilder {
        source: table.table_ref(),
        predicate: Predicate::always(),
    }
}

#[derive(Debug, Clone)]
pub struct SubqueryBuilder {
    source: TableRef,
    predicate: Predicate,
}

impl SubqueryBuilder {
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = self.predicate.and(predicate);
        self
    }

    pub fn select<E: TypedExpr>(self, expr: &E) -> SubQuery<E::Output> {
        SubQuery {
            plan: SubqueryPlan {
                source: self.source,
                predicate: self.predicate,
                select: expr.expression(),
            },
            _marker: PhantomData,
        }
    }
}

/// A subquery producing values of type `T`.
///
/// Used as a scalar it yields NULL when no row matches, so its typed value
/// is `T::Nullable`.
#[derive(Debug)]
pub struct SubQuery<T> {
    plan: SubqueryPlan,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SubQuery<T> {
    pub fn plan(&self) -> &SubqueryPlan {
        &self.plan
    }
}

impl<T> Clone for SubQuery<T> {
    fn clone(&self) -> Self {
        Self {
            plan: self.plan.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: SqlType> TypedExpr for SubQuery<T> {
    type Output = T::Nullable;

    fn expression(&self) -> Expression {
        Expression::Subquery(Box::new(self.plan.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MEMBER_TABLE;
    use crate::expression::column::{Column, ExprOps, NumericOps};

    const SUB: TableRef = TableRef::new(MEMBER_TABLE, "member_sub");
    const SUB_AGE: Column<i32> = Column::new("member_sub", "age");
    const AGE: Column<i32> = Column::new("member", "age");

    #[test]
    fn test_scalar_subquery_expression() {
        let max_age = subquery(&SUB).select(&SUB_AGE.max());
        let predicate = AGE.eq_expr(&max_age);
        assert_eq!(
            predicate.to_string(),
            "(member.age = (SELECT MAX(member_sub.age) FROM member member_sub))"
        );
    }

    #[test]
    fn test_filtered_subquery() {
        let ages = subquery(&SUB)
            .filter(SUB_AGE.gt(10))
            .select(&SUB_AGE);
        assert_eq!(ages.plan().source.alias, "member_sub");
        assert_eq!(
            AGE.in_subquery(&ages).to_string(),
            "(member.age IN (SELECT member_sub.age FROM member member_sub WHERE (member_sub.age > 10)))"
        );
        let avg = subquery(&SUB).select(&SUB_AGE.avg());
        assert!(matches!(avg.expression(), Expression::Subquery(_)));
    }
}
