//! Static description of the catalog tables.
//!
//! Column names that end up in SQL text come only from these tables; user
//! input is always bound.

/// Storage type of a column, used to coerce criterion values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub nullable: bool,
}

impl ColumnDef {
    const fn new(name: &'static str, sql_type: SqlType, nullable: bool) -> Self {
        Self {
            name,
            sql_type,
            nullable,
        }
    }
}

/// A table with the alias it gets in joins and the prefix its columns get in
/// the select list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub alias: &'static str,
    pub prefix: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// `alias.column`
    pub fn qualified(&self, column: &str) -> String {
        format!("{}.{}", self.alias, column)
    }

    /// `alias.column AS prefixcolumn` for every column
    pub fn select_list(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| format!("{}.{} AS {}{}", self.alias, c.name, self.prefix, c.name))
            .collect()
    }
}

pub const ALBUM_TABLE: TableDef = TableDef {
    name: "album",
    alias: "a",
    prefix: "",
    columns: &[
        ColumnDef::new("id", SqlType::Integer, false),
        ColumnDef::new("version", SqlType::Integer, false),
        ColumnDef::new("ean", SqlType::Text, false),
        ColumnDef::new("rating", SqlType::Integer, true),
        ColumnDef::new("album_type", SqlType::Text, true),
        ColumnDef::new("title", SqlType::Text, false),
        ColumnDef::new("price", SqlType::Real, false),
        ColumnDef::new("discount", SqlType::Real, true),
        ColumnDef::new("available", SqlType::Boolean, false),
        ColumnDef::new("release_date", SqlType::Text, true),
        ColumnDef::new("homepage", SqlType::Text, true),
        ColumnDef::new("genres", SqlType::Text, true),
        ColumnDef::new("created_at", SqlType::Integer, false),
        ColumnDef::new("updated_at", SqlType::Integer, false),
    ],
};

pub const ARTIST_TABLE: TableDef = TableDef {
    name: "artist",
    alias: "ar",
    prefix: "artist_",
    columns: &[
        ColumnDef::new("id", SqlType::Integer, false),
        ColumnDef::new("album_id", SqlType::Integer, false),
        ColumnDef::new("name", SqlType::Text, false),
        ColumnDef::new("birth_date", SqlType::Text, true),
    ],
};

pub const TRACK_TABLE: TableDef = TableDef {
    name: "track",
    alias: "t",
    prefix: "track_",
    columns: &[
        ColumnDef::new("id", SqlType::Integer, false),
        ColumnDef::new("album_id", SqlType::Integer, false),
        ColumnDef::new("title", SqlType::Text, false),
        ColumnDef::new("duration", SqlType::Text, true),
        ColumnDef::new("featured_artist", SqlType::Text, true),
    ],
};
