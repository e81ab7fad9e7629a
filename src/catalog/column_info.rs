//! Column information and metadata structures.

use crate::value::{DataType, Value};

/// Static description of one column of a known table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnInfo {
    pub column_name: &'static str,
    pub column_type: DataType,
    pub nullable: bool,
    pub column_order: u32,
}

impl ColumnInfo {
    pub const fn new(
        column_name: &'static str,
        column_type: DataType,
        nullable: bool,
        column_order: u32,
    ) -> Self {
        Self {
            column_name,
            column_type,
            nullable,
            column_order,
        }
    }

    /// Check that a value may be stored in this column
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return self.nullable;
        }
        value.is_compatible_with(self.column_type)
    }
}
