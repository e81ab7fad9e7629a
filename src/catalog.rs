//! Known tables and table occurrences.
//!
//! The schema is fixed: members belong to teams. Each table is described
//! once as a `'static` [`TableInfo`]; queries refer to a table through a
//! [`TableRef`], which pairs the definition with the alias of one occurrence
//! of it (the default handle, or a second occurrence used by a subquery).

pub mod column_info;
pub mod table_info;

pub use column_info::ColumnInfo;
pub use table_info::TableInfo;

use crate::value::DataType;

pub const MEMBER_TABLE: &TableInfo = &TableInfo {
    table_name: "member",
    default_alias: "member",
    columns: &[
        ColumnInfo::new("id", DataType::Int64, false, 0),
        ColumnInfo::new("name", DataType::Varchar, true, 1),
        ColumnInfo::new("age", DataType::Int32, false, 2),
        ColumnInfo::new("team_id", DataType::Int64, true, 3),
    ],
    identity: Some("id"),
};

pub const TEAM_TABLE: &TableInfo = &TableInfo {
    table_name: "team",
    default_alias: "team",
    columns: &[
        ColumnInfo::new("id", DataType::Int64, false, 0),
        ColumnInfo::new("name", DataType::Varchar, false, 1),
    ],
    identity: Some("id"),
};

static TABLES: [&TableInfo; 2] = [MEMBER_TABLE, TEAM_TABLE];

/// All known tables
pub fn tables() -> &'static [&'static TableInfo] {
    &TABLES
}

/// Look up a table definition by name
pub fn lookup(table_name: &str) -> Option<&'static TableInfo> {
    TABLES.iter().copied().find(|t| t.table_name == table_name)
}

/// One occurrence of a table in a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef {
    pub info: &'static TableInfo,
    pub alias: &'static str,
}

impl TableRef {
    pub const fn new(info: &'static TableInfo, alias: &'static str) -> Self {
        Self { info, alias }
    }

    pub fn table_name(&self) -> &'static str {
        self.info.table_name
    }
}

/// Anything that names a table occurrence: typed handles and raw refs
pub trait AsTable {
    fn table_ref(&self) -> TableRef;
}

impl AsTable for TableRef {
    fn table_ref(&self) -> TableRef {
        *self
    }
}

impl<T: AsTable + ?Sized> AsTable for &T {
    fn table_ref(&self) -> TableRef {
        (**self).table_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("member").map(|t| t.columns.len()), Some(4));
        assert_eq!(lookup("team").map(|t| t.default_alias), Some("team"));
        assert!(lookup("orders").is_none());
        assert_eq!(tables().len(), 2);
    }

    #[test]
    fn test_table_ref_aliases() {
        let sub = TableRef::new(MEMBER_TABLE, "member_sub");
        assert_eq!(sub.table_name(), "member");
        assert_ne!(sub, TableRef::new(MEMBER_TABLE, "member"));
    }
}
