//! Result rows addressed by the expressions that requested them.

use crate::error::{QueryError, QueryResult};
use crate::expression::{SelectItem, TypedExpr};
use crate::value::{SqlType, Value};
use std::sync::Arc;

/// One row of a tuple projection
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    items: Arc<[SelectItem]>,
    values: Vec<Value>,
}

impl Tuple {
    pub(crate) fn new(items: Arc<[SelectItem]>, values: Vec<Value>) -> Self {
        Self { items, values }
    }

    /// Value of a requested expression
    pub fn get<E: TypedExpr>(&self, expr: &E) -> QueryResult<E::Output> {
        let wanted = expr.expression();
        let index = self
            .items
            .iter()
            .position(|item| item.expr == wanted)
            .ok_or_else(|| QueryError::Lookup(wanted.to_string()))?;
        self.decode(index)
    }

    /// Value of the item with this alias, or this column name
    pub fn get_by_label<T: SqlType>(&self, label: &str) -> QueryResult<T> {
        let index = self
            .items
            .iter()
            .position(|item| item.label() == Some(label))
            .ok_or_else(|| QueryError::Lookup(label.to_string()))?;
        self.decode(index)
    }

    fn decode<T: SqlType>(&self, index: usize) -> QueryResult<T> {
        let value = self.values.get(index).cloned().unwrap_or(Value::Null);
        Ok(T::from_value(value)?)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
