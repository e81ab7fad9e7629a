//! Ordering terms.

use crate::expression::expr::Expression;
use crate::value::Value;
use std::cmp::Ordering;
use std::fmt;

/// Sort order for a term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// NULL ordering preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrder {
    First,
    Last,
}

/// One ORDER BY term. The null placement is always explicit.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpec {
    pub expr: Expression,
    pub order: SortOrder,
    pub nulls: NullOrder,
}

impl OrderSpec {
    /// New term with default NULL ordering
    /// (NULLs first for ASC, NULLs last for DESC)
    pub fn new(expr: Expression, order: SortOrder) -> Self {
        let nulls = match order {
            SortOrder::Asc => NullOrder::First,
            SortOrder::Desc => NullOrder::Last,
        };
        Self { expr, order, nulls }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullOrder::First;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullOrder::Last;
        self
    }

    /// Compare two sort keys according to this term
    pub fn compare(&self, v1: &Value, v2: &Value) -> Ordering {
        match (v1, v2) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => match self.nulls {
                NullOrder::First => Ordering::Less,
                NullOrder::Last => Ordering::Greater,
            },
            (_, Value::Null) => match self.nulls {
                NullOrder::First => Ordering::Greater,
                NullOrder::Last => Ordering::Less,
            },
            (v1, v2) => {
                // Mixed types never reach here after type checking
                let cmp = v1.compare(v2).unwrap_or(Ordering::Equal);
                match self.order {
                    SortOrder::Asc => cmp,
                    SortOrder::Desc => cmp.reverse(),
                }
            }
        }
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = match self.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let nulls = match self.nulls {
            NullOrder::First => "NULLS FIRST",
            NullOrder::Last => "NULLS LAST",
        };
        write!(f, "{} {} {}", self.expr, order, nulls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(order: SortOrder) -> OrderSpec {
        OrderSpec::new(Expression::literal(Value::Null), order)
    }

    #[test]
    fn test_default_null_order() {
        assert_eq!(term(SortOrder::Asc).nulls, NullOrder::First);
        assert_eq!(term(SortOrder::Desc).nulls, NullOrder::Last);
        assert_eq!(term(SortOrder::Asc).nulls_last().nulls, NullOrder::Last);
    }

    #[test]
    fn test_compare_with_nulls() {
        let asc_last = term(SortOrder::Asc).nulls_last();
        assert_eq!(
            asc_last.compare(&Value::Null, &Value::Int32(1)),
            Ordering::Greater
        );
        assert_eq!(
            asc_last.compare(&Value::Int32(1), &Value::Int32(2)),
            Ordering::Less
        );

        let desc_first = term(SortOrder::Desc).nulls_first();
        assert_eq!(
            desc_first.compare(&Value::Null, &Value::Int32(1)),
            Ordering::Less
        );
        assert_eq!(
            desc_first.compare(&Value::Int32(1), &Value::Int32(2)),
            Ordering::Greater
        );
        assert_eq!(
            desc_first.compare(&Value::Null, &Value::Null),
            Ordering::Equal
        );
    }
}
