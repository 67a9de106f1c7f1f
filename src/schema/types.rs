//! Static description of catalogue tables, used to generate DDL and DML

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    /// Stored as 0/1
    Boolean,
    /// Serialized JSON stored as text
    Json,
}

impl ColumnType {
    /// SQLite storage class for the column
    pub const fn affinity(self) -> &'static str {
        match self {
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text | ColumnType::Json => "TEXT",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
}

impl Column {
    /// Auto-incrementing row id
    pub const fn id() -> Self {
        Self {
            name: "id",
            col_type: ColumnType::Integer,
            nullable: false,
            primary_key: true,
        }
    }

    pub const fn optional(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: true,
            primary_key: false,
        }
    }

    pub const fn not_null(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            nullable: false,
            ..Self::optional(name, col_type)
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Index {
    pub columns: &'static [&'static str],
    pub unique: bool,
}

impl Index {
    pub const fn lookup(columns: &'static [&'static str]) -> Self {
        Self {
            columns,
            unique: false,
        }
    }

    pub const fn unique(columns: &'static [&'static str]) -> Self {
        Self {
            columns,
            unique: true,
        }
    }

    /// `idx_<table>_<col1>_<col2>`
    pub fn name(&self, table: &str) -> String {
        format!("idx_{}_{}", table, self.columns.join("_"))
    }
}

#[derive(Debug)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub indexes: &'static [Index],
}

impl TableSchema {
    /// Columns written on insert and update, in declaration order
    pub fn data_columns(&self) -> impl Iterator<Item = &'static Column> {
        self.columns.iter().filter(|c| !c.primary_key)
    }

    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}
