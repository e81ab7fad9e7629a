//! Query plan definitions.
//!
//! A [`QueryPlan`] is the validated, not yet executed description of a
//! select. Gateways receive it by reference; nothing downstream mutates it.

use crate::catalog::TableRef;
use crate::expression::{Expression, OrderSpec, Predicate, SelectItem};
use crate::value::DataType;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
}

impl JoinKind {
    pub fn sql_keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
        }
    }
}

/// One joined table occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub target: TableRef,
    pub on: Predicate,
    pub kind: JoinKind,
}

/// Shape the rows of a plan are decoded into
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionShape {
    /// Every column of one table occurrence, decoded into its entity
    Entity { entity: &'static str },
    /// Values addressed by expression or label
    Tuple,
    /// Values assigned to named fields of a target
    FieldMapped {
        target: &'static str,
        fields: Vec<String>,
    },
    /// Values passed positionally to a constructor
    ConstructorBound {
        target: &'static str,
        params: Vec<DataType>,
    },
}

/// A validated select
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub source: TableRef,
    pub joins: Vec<JoinSpec>,
    pub predicate: Predicate,
    pub select: Vec<SelectItem>,
    pub shape: ProjectionShape,
    pub group_by: Vec<Expression>,
    pub order_by: Vec<OrderSpec>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl QueryPlan {
    /// Table occurrences in join order, starting with the source
    pub fn tables(&self) -> Vec<TableRef> {
        std::iter::once(self.source)
            .chain(self.joins.iter().map(|j| j.target))
            .collect()
    }

    /// Whether rows are collapsed into groups
    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty() || self.select.iter().any(|s| s.expr.contains_aggregate())
    }

    /// Same plan restricted to the window `[offset, offset + limit)`
    pub fn with_window(mut self, offset: Option<u64>, limit: Option<u64>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let select: Vec<String> = self.select.iter().map(|s| s.to_string()).collect();
        write!(
            f,
            "SELECT {} FROM {} {}",
            select.join(", "),
            self.source.table_name(),
            self.source.alias
        )?;
        for join in &self.joins {
            write!(
                f,
                " {} {} {} ON {}",
                join.kind.sql_keyword(),
                join.target.table_name(),
                join.target.alias,
                join.on
            )?;
        }
        if !self.predicate.is_always() {
            write!(f, " WHERE {}", self.predicate)?;
        }
        if !self.group_by.is_empty() {
            let keys: Vec<String> = self.group_by.iter().map(|e| e.to_string()).collect();
            write!(f, " GROUP BY {}", keys.join(", "))?;
        }
        if !self.order_by.is_empty() {
            let terms: Vec<String> = self.order_by.iter().map(|o| o.to_string()).collect();
            write!(f, " ORDER BY {}", terms.join(", "))?;
        }
        if let Some(offset) = self.offset {
            write!(f, " OFFSET {}", offset)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        Ok(())
    }
}
