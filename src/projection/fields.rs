//! Targets populated field by field.

use crate::error::MappingError;
use crate::projection::Selectable;
use crate::value::{DataType, Value};

/// A named, typed field of a [`FieldTarget`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub data_type: DataType,
}

impl FieldSpec {
    pub const fn new(name: &'static str, data_type: DataType) -> Self {
        Self { name, data_type }
    }
}

/// A result type whose fields are assigned by name.
///
/// Fields not named by the projection keep their default value.
pub trait FieldTarget: Default + Send + 'static {
    const NAME: &'static str;
    const FIELDS: &'static [FieldSpec];

    /// Assign one decoded value to `field`
    fn set_field(&mut self, field: &str, value: Value) -> Result<(), MappingError>;
}

/// Resolve the target field of every item, in item order
pub(crate) fn validate<T: FieldTarget>(items: &[&dyn Selectable]) -> Result<Vec<String>, MappingError> {
    let mut fields: Vec<String> = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let select_item = item.to_select_item();
        let label = select_item.label().ok_or(MappingError::Unlabeled {
            target: T::NAME,
            position,
        })?;
        let spec = T::FIELDS
            .iter()
            .find(|f| f.name == label)
            .ok_or_else(|| MappingError::UnknownField {
                target: T::NAME,
                field: label.to_string(),
            })?;
        if fields.iter().any(|f| f == label) {
            return Err(MappingError::DuplicateField {
                target: T::NAME,
                field: label.to_string(),
            });
        }
        if !item.data_type().assignable_to(spec.data_type) {
            return Err(MappingError::TypeMismatch {
                target: T::NAME,
                slot: label.to_string(),
                expected: spec.data_type,
                actual: item.data_type(),
            });
        }
        fields.push(label.to_string());
    }
    Ok(fields)
}
