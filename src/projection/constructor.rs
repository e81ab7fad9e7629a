//! Positional binding of result values to constructors.
//!
//! Two forms exist. [`ExprTuple`] binds a tuple of typed expressions to a
//! closure, so arity and types are fixed at compile time.
//! [`ConstructorTarget`] declares its parameters as data and is checked once
//! when the projection is declared.

use crate::error::MappingError;
use crate::expression::{SelectItem, TypedExpr};
use crate::projection::Selectable;
use crate::value::{DataType, SqlType, Value};

/// One positional parameter of a [`ConstructorTarget`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub data_type: DataType,
}

impl ParamSpec {
    pub const fn new(name: &'static str, data_type: DataType) -> Self {
        Self { name, data_type }
    }
}

/// A result type built from values in a fixed order
pub trait ConstructorTarget: Sized + Send + 'static {
    const NAME: &'static str;
    const PARAMS: &'static [ParamSpec];

    /// Build from values ordered as `PARAMS`
    fn construct(values: Vec<Value>) -> Result<Self, MappingError>;
}

/// Parameter types of `T`, after checking `items` against them
pub(crate) fn validate<T: ConstructorTarget>(
    items: &[&dyn Selectable],
) -> Result<Vec<DataType>, MappingError> {
    if items.len() != T::PARAMS.len() {
        return Err(MappingError::ArityMismatch {
            target: T::NAME,
            expected: T::PARAMS.len(),
            actual: items.len(),
        });
    }
    for (param, item) in T::PARAMS.iter().zip(items) {
        if !item.data_type().assignable_to(param.data_type) {
            return Err(MappingError::TypeMismatch {
                target: T::NAME,
                slot: param.name.to_string(),
                expected: param.data_type,
                actual: item.data_type(),
            });
        }
    }
    Ok(T::PARAMS.iter().map(|p| p.data_type).collect())
}

/// A tuple of typed expressions, decoded into the tuple of their values
pub trait ExprTuple {
    type Output;

    fn select_items(&self) -> Vec<SelectItem>;

    fn data_types() -> Vec<DataType>;

    fn decode(values: Vec<Value>) -> Result<Self::Output, MappingError>;
}

macro_rules! impl_expr_tuple {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: TypedExpr),+> ExprTuple for ($($name,)+) {
            type Output = ($(<$name as TypedExpr>::Output,)+);

            fn select_items(&self) -> Vec<SelectItem> {
                vec![$(self.$idx.select_item()),+]
            }

            fn data_types() -> Vec<DataType> {
                vec![$(<<$name as TypedExpr>::Output as SqlType>::DATA_TYPE),+]
            }

            fn decode(values: Vec<Value>) -> Result<Self::Output, MappingError> {
                let mut values = values.into_iter();
                Ok(($(
                    <<$name as TypedExpr>::Output as SqlType>::from_value(
                        values.next().unwrap_or(Value::Null),
                    )?,
                )+))
            }
        }
    };
}

impl_expr_tuple!(A 0);
impl_expr_tuple!(A 0, B 1);
impl_expr_tuple!(A 0, B 1, C 2);
impl_expr_tuple!(A 0, B 1, C 2, D 3);
impl_expr_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_expr_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_expr_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_expr_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{MEMBER, TEAM};
    use crate::expression::{constant, Column, ExprOps};

    #[test]
    fn test_tuple_decoding() -> Result<(), MappingError> {
        let decoded = <(Column<Option<String>>, Column<i32>, Column<String>) as ExprTuple>::decode(vec![
            Value::Null,
            Value::Int32(10),
            Value::String("teamA".to_string()),
        ])?;
        assert_eq!(decoded, (None, 10, "teamA".to_string()));
        Ok(())
    }

    #[test]
    fn test_select_items_keep_aliases() {
        let exprs = (MEMBER.name.as_("username"), TEAM.name, constant::<String>("A"));
        let items = exprs.select_items();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].label(), Some("username"));
        assert_eq!(items[1].label(), Some("name"));
        assert_eq!(items[2].label(), None);
        assert_eq!(
            <(Column<i32>,) as ExprTuple>::data_types(),
            vec![DataType::Int32]
        );
    }
}
