//! Projection shapes and the row mappers built from them.
//!
//! A [`Projection`] pairs the select list of a query with a function that
//! turns one result row into the caller's type. Every shape is validated when
//! it is declared, so a query never reaches the gateway with a projection
//! that cannot fit its target. Decoding a row can still fail when a NULL
//! arrives for a non-optional slot.

pub mod constructor;
pub mod fields;
pub mod tuple;

pub use constructor::{ConstructorTarget, ExprTuple, ParamSpec};
pub use fields::{FieldSpec, FieldTarget};
pub use tuple::Tuple;

use crate::entity::{Entity, EntityTable};
use crate::error::MappingError;
use crate::expression::{Expression, SelectItem, TypedExpr};
use crate::query::ProjectionShape;
use crate::value::{DataType, SqlType, Value};
use std::fmt;
use std::sync::Arc;

/// An expression usable in a select list, with its statically known type
pub trait Selectable {
    fn to_select_item(&self) -> SelectItem;
    fn data_type(&self) -> DataType;
    fn nullable(&self) -> bool;
}

impl<E: TypedExpr> Selectable for E {
    fn to_select_item(&self) -> SelectItem {
        self.select_item()
    }

    fn data_type(&self) -> DataType {
        <E::Output as SqlType>::DATA_TYPE
    }

    fn nullable(&self) -> bool {
        <E::Output as SqlType>::NULLABLE
    }
}

pub(crate) type RowMapper<R> = Arc<dyn Fn(Vec<Value>) -> Result<R, MappingError> + Send + Sync>;

/// Select list plus the mapper for its rows
pub struct Projection<R> {
    items: Vec<SelectItem>,
    shape: ProjectionShape,
    mapper: RowMapper<R>,
}

impl<R> Projection<R> {
    fn new<F>(items: Vec<SelectItem>, shape: ProjectionShape, mapper: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<R, MappingError> + Send + Sync + 'static,
    {
        Self {
            items,
            shape,
            mapper: Arc::new(mapper),
        }
    }

    pub fn items(&self) -> &[SelectItem] {
        &self.items
    }

    pub fn shape(&self) -> &ProjectionShape {
        &self.shape
    }

    /// Decode one result row
    pub fn map_row(&self, row: Vec<Value>) -> Result<R, MappingError> {
        map_row(&self.mapper, self.items.len(), row)
    }

    pub(crate) fn into_parts(self) -> (Vec<SelectItem>, ProjectionShape, RowMapper<R>) {
        (self.items, self.shape, self.mapper)
    }
}

pub(crate) fn map_row<R>(
    mapper: &RowMapper<R>,
    width: usize,
    row: Vec<Value>,
) -> Result<R, MappingError> {
    if row.len() != width {
        return Err(MappingError::ArityMismatch {
            target: "result row",
            expected: width,
            actual: row.len(),
        });
    }
    mapper(row)
}

impl<R> Clone for Projection<R> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            shape: self.shape.clone(),
            mapper: Arc::clone(&self.mapper),
        }
    }
}

impl<R> fmt::Debug for Projection<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projection")
            .field("items", &self.items)
            .field("shape", &self.shape)
            .finish()
    }
}

/// Constructors for every projection shape
pub struct Projections;

impl Projections {
    /// Values addressed later by expression or label
    pub fn tuple(items: &[&dyn Selectable]) -> Projection<Tuple> {
        let items: Vec<SelectItem> = items.iter().map(|i| i.to_select_item()).collect();
        let shared: Arc<[SelectItem]> = items.clone().into();
        Projection::new(items, ProjectionShape::Tuple, move |values| {
            Ok(Tuple::new(Arc::clone(&shared), values))
        })
    }

    /// Assign each item to the field of `T` named by its label.
    ///
    /// Fails if an item has no label, names no field of `T`, names a field
    /// twice, or has a type the field cannot hold.
    pub fn fields<T: FieldTarget>(items: &[&dyn Selectable]) -> Result<Projection<T>, MappingError> {
        let fields = fields::validate::<T>(items)?;
        let shape = ProjectionShape::FieldMapped {
            target: T::NAME,
            fields: fields.clone(),
        };
        let items = items.iter().map(|i| i.to_select_item()).collect();
        Ok(Projection::new(items, shape, move |values| {
            let mut target = T::default();
            for (field, value) in fields.iter().zip(values) {
                target.set_field(field, value)?;
            }
            Ok(target)
        }))
    }

    /// Pass the values of a tuple of typed expressions to `ctor`.
    /// Arity and types are checked by the compiler.
    pub fn constructor<A, R, F>(exprs: A, ctor: F) -> Projection<R>
    where
        A: ExprTuple,
        F: Fn(A::Output) -> R + Send + Sync + 'static,
    {
        let shape = ProjectionShape::ConstructorBound {
            target: std::any::type_name::<R>(),
            params: A::data_types(),
        };
        Projection::new(exprs.select_items(), shape, move |values| {
            A::decode(values).map(&ctor)
        })
    }

    /// Pass the values positionally to `T::construct`, after checking arity
    /// and types against `T::PARAMS`
    pub fn bind<T: ConstructorTarget>(items: &[&dyn Selectable]) -> Result<Projection<T>, MappingError> {
        let params = constructor::validate::<T>(items)?;
        let shape = ProjectionShape::ConstructorBound {
            target: T::NAME,
            params,
        };
        let items = items.iter().map(|i| i.to_select_item()).collect();
        Ok(Projection::new(items, shape, T::construct))
    }

    /// Every column of a table occurrence, decoded into its entity
    pub fn entity<T: EntityTable>(table: &T) -> Projection<T::Entity> {
        let items = table
            .columns()
            .into_iter()
            .map(|c| SelectItem::new(Expression::Column(c)))
            .collect();
        let shape = ProjectionShape::Entity {
            entity: <T::Entity as Entity>::NAME,
        };
        Projection::new(items, shape, <T::Entity as Entity>::from_row)
    }

    /// A single value per row
    pub fn value<E: TypedExpr>(expr: &E) -> Projection<E::Output> {
        let shape = ProjectionShape::ConstructorBound {
            target: std::any::type_name::<E::Output>(),
            params: vec![<E::Output as SqlType>::DATA_TYPE],
        };
        Projection::new(vec![expr.select_item()], shape, |values| {
            let value = values.into_iter().next().unwrap_or(Value::Null);
            E::Output::from_value(value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Member, MEMBER, TEAM};
    use crate::expression::{ExprOps, NumericOps};
    use crate::search::{MemberDto, UserDto};

    #[test]
    fn test_entity_projection() -> anyhow::Result<()> {
        let projection = Projections::entity(&MEMBER);
        assert_eq!(projection.items().len(), 4);
        assert_eq!(
            projection.shape(),
            &ProjectionShape::Entity { entity: "Member" }
        );
        let member = projection.map_row(vec![
            Value::Int64(3),
            Value::String("member3".to_string()),
            Value::Int32(30),
            Value::Int64(1),
        ])?;
        assert_eq!(
            member,
            Member {
                id: 3,
                name: Some("member3".to_string()),
                age: 30,
                team_id: Some(1),
            }
        );
        Ok(())
    }

    #[test]
    fn test_constructor_projection() -> anyhow::Result<()> {
        let projection = Projections::constructor((MEMBER.name, MEMBER.age), |(name, age)| {
            MemberDto { name, age }
        });
        assert_eq!(
            projection.shape(),
            &ProjectionShape::ConstructorBound {
                target: std::any::type_name::<MemberDto>(),
                params: vec![DataType::Varchar, DataType::Int32],
            }
        );
        let dto = projection.map_row(vec![Value::String("member1".to_string()), Value::Int32(10)])?;
        assert_eq!(dto.name.as_deref(), Some("member1"));
        assert_eq!(dto.age, 10);

        // NULL into a non-optional slot fails per row
        assert_eq!(
            projection
                .map_row(vec![Value::Null, Value::Null])
                .map(|_| ()),
            Err(MappingError::UnexpectedNull {
                expected: DataType::Int32
            })
        );
        Ok(())
    }

    #[test]
    fn test_fields_projection_renames() -> anyhow::Result<()> {
        let max_age = MEMBER.age.max();
        let projection = Projections::fields::<UserDto>(&[
            &MEMBER.name.as_("username"),
            &MEMBER.age.as_("age"),
        ])?;
        let dto = projection.map_row(vec![Value::String("member1".to_string()), Value::Int32(10)])?;
        assert_eq!(dto.username.as_deref(), Some("member1"));
        assert_eq!(dto.age, Some(10));

        // a bare column maps by its own name
        assert!(Projections::fields::<UserDto>(&[&MEMBER.age]).is_ok());
        // member.name has no counterpart without an alias
        assert_eq!(
            Projections::fields::<UserDto>(&[&MEMBER.name]).map(|_| ()),
            Err(MappingError::UnknownField {
                target: "UserDto",
                field: "name".to_string(),
            })
        );
        assert_eq!(
            Projections::fields::<UserDto>(&[&MEMBER.name.as_("nickname")]).map(|_| ()),
            Err(MappingError::UnknownField {
                target: "UserDto",
                field: "nickname".to_string(),
            })
        );
        assert_eq!(
            Projections::fields::<UserDto>(&[&max_age]).map(|_| ()),
            Err(MappingError::Unlabeled {
                target: "UserDto",
                position: 0,
            })
        );
        assert_eq!(
            Projections::fields::<UserDto>(&[&MEMBER.name.as_("age")]).map(|_| ()),
            Err(MappingError::TypeMismatch {
                target: "UserDto",
                slot: "age".to_string(),
                expected: DataType::Int32,
                actual: DataType::Varchar,
            })
        );
        assert_eq!(
            Projections::fields::<UserDto>(&[&MEMBER.name.as_("username"), &TEAM.name.as_("username")])
                .map(|_| ()),
            Err(MappingError::DuplicateField {
                target: "UserDto",
                field: "username".to_string(),
            })
        );
        Ok(())
    }

    #[test]
    fn test_bind_validates_once() {
        assert_eq!(
            Projections::bind::<MemberDto>(&[&MEMBER.name]).map(|_| ()),
            Err(MappingError::ArityMismatch {
                target: "MemberDto",
                expected: 2,
                actual: 1,
            })
        );
        assert_eq!(
            Projections::bind::<MemberDto>(&[&MEMBER.age, &MEMBER.name]).map(|_| ()),
            Err(MappingError::TypeMismatch {
                target: "MemberDto",
                slot: "name".to_string(),
                expected: DataType::Varchar,
                actual: DataType::Int32,
            })
        );
        assert!(Projections::bind::<MemberDto>(&[&MEMBER.name, &MEMBER.age]).is_ok());
    }

    #[test]
    fn test_value_projection() -> anyhow::Result<()> {
        let projection = Projections::value(&MEMBER.age.sum());
        assert_eq!(projection.map_row(vec![Value::Int64(100)])?, Some(100));
        assert_eq!(projection.map_row(vec![Value::Null])?, None);
        assert!(projection.map_row(vec![]).is_err());
        Ok(())
    }
}
