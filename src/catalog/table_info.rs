//! Table information and metadata structures.

use crate::catalog::column_info::ColumnInfo;
use crate::value::DataType;

/// Static description of a known table
#[derive(Debug, PartialEq, Eq)]
pub struct TableInfo {
    pub table_name: &'static str,
    /// Alias used by the default table handle
    pub default_alias: &'static str,
    pub columns: &'static [ColumnInfo],
    /// Identity column assigned on insert, if any
    pub identity: Option<&'static str>,
}

impl TableInfo {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.column_name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.column_name == name)
    }

    pub fn schema(&self) -> Vec<DataType> {
        self.columns.iter().map(|c| c.column_type).collect()
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.column_name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MEMBER_TABLE;

    #[test]
    fn test_column_lookup() {
        assert_eq!(MEMBER_TABLE.column_index("age"), Some(2));
        assert_eq!(
            MEMBER_TABLE.column("name").map(|c| c.nullable),
            Some(true)
        );
        assert!(MEMBER_TABLE.column("email").is_none());
        assert_eq!(
            MEMBER_TABLE.schema(),
            vec![
                DataType::Int64,
                DataType::Varchar,
                DataType::Int32,
                DataType::Int64
            ]
        );
    }
}
