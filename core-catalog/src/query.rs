//! Criteria translation for album lookups.
//!
//! A caller hands over a flat map of criterion names to primitive values.
//! [`QueryBuilder`] turns it into SQL over `album` joined to `artist` plus
//! the values to bind:
//!
//! 1. `interpret` matches the artist name as a case-insensitive substring
//! 2. `pop` / `alternative` flags test the genres column for their tag
//! 3. every other name that is an album column becomes an equality test
//!
//! Names that are not album columns are skipped here; rejecting them is the
//! read service's job.

use crate::models::AlbumId;
use crate::schema::{SqlType, TableDef, ALBUM_TABLE, ARTIST_TABLE, TRACK_TABLE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Criterion matching the artist name by substring
pub const INTERPRET: &str = "interpret";

/// Genre shorthand flags and the tag each one tests for
pub const GENRE_FLAGS: &[(&str, &str)] = &[("pop", "POP"), ("alternative", "ALTERNATIVE")];

/// A single criterion value as received from a transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CriterionValue {
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl CriterionValue {
    /// `true` for a boolean true or the string `"true"`
    pub fn is_true(&self) -> bool {
        match self {
            CriterionValue::Bool(b) => *b,
            CriterionValue::Text(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    fn as_text(&self) -> String {
        match self {
            CriterionValue::Bool(b) => b.to_string(),
            CriterionValue::Integer(i) => i.to_string(),
            CriterionValue::Real(f) => f.to_string(),
            CriterionValue::Text(s) => s.clone(),
        }
    }

    /// Convert to the column's type. Values that do not convert are bound
    /// as-is and simply match nothing.
    fn coerce(&self, sql_type: SqlType) -> BindValue {
        match (sql_type, self) {
            (SqlType::Integer, CriterionValue::Integer(i)) => BindValue::Integer(*i),
            (SqlType::Integer, CriterionValue::Real(f)) if f.fract() == 0.0 => {
                BindValue::Integer(*f as i64)
            }
            (SqlType::Integer, CriterionValue::Text(s)) => s
                .trim()
                .parse::<i64>()
                .map(BindValue::Integer)
                .unwrap_or_else(|_| BindValue::Text(s.clone())),
            (SqlType::Real, CriterionValue::Real(f)) => BindValue::Real(*f),
            (SqlType::Real, CriterionValue::Integer(i)) => BindValue::Real(*i as f64),
            (SqlType::Real, CriterionValue::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(BindValue::Real)
                .unwrap_or_else(|_| BindValue::Text(s.clone())),
            (SqlType::Boolean, CriterionValue::Bool(b)) => BindValue::Bool(*b),
            (SqlType::Boolean, CriterionValue::Integer(i)) => BindValue::Bool(*i != 0),
            (SqlType::Boolean, CriterionValue::Text(s)) => match s.trim() {
                "true" | "1" => BindValue::Bool(true),
                "false" | "0" => BindValue::Bool(false),
                _ => BindValue::Text(s.clone()),
            },
            (SqlType::Text, value) => BindValue::Text(value.as_text()),
            (_, CriterionValue::Bool(b)) => BindValue::Bool(*b),
            (_, CriterionValue::Real(f)) => BindValue::Real(*f),
        }
    }
}

impl From<bool> for CriterionValue {
    fn from(value: bool) -> Self {
        CriterionValue::Bool(value)
    }
}

impl From<i64> for CriterionValue {
    fn from(value: i64) -> Self {
        CriterionValue::Integer(value)
    }
}

impl From<i32> for CriterionValue {
    fn from(value: i32) -> Self {
        CriterionValue::Integer(i64::from(value))
    }
}

impl From<f64> for CriterionValue {
    fn from(value: f64) -> Self {
        CriterionValue::Real(value)
    }
}

impl From<&str> for CriterionValue {
    fn from(value: &str) -> Self {
        CriterionValue::Text(value.to_string())
    }
}

impl From<String> for CriterionValue {
    fn from(value: String) -> Self {
        CriterionValue::Text(value)
    }
}

/// Named search filters, e.g. `{"interpret": "nd", "rating": 4}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Criteria(BTreeMap<String, CriterionValue>);

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<CriterionValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<CriterionValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&CriterionValue> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CriterionValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// JSON rendering for messages and logs
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| format!("{:?}", self.0))
    }
}

/// A value bound to a placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
}

/// SQL flavour to render for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `LIKE` is case-insensitive, `?` placeholders
    #[default]
    Sqlite,
    /// `LIKE` is case-sensitive so `ILIKE` is used, `$n` placeholders
    Postgres,
}

impl Dialect {
    fn placeholder(&self, position: usize) -> String {
        match self {
            Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => format!("${}", position),
        }
    }

    fn case_insensitive_like(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "LIKE",
            Dialect::Postgres => "ILIKE",
        }
    }
}

/// What a query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope {
    /// One album with its tracks, one row per track
    Single(AlbumId),
    /// Any number of albums, tracks not joined
    List,
}

/// Built SQL plus the values for its placeholders, in order
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumQuery {
    pub sql: String,
    pub binds: Vec<BindValue>,
    pub scope: QueryScope,
}

/// Translates criteria into [`AlbumQuery`] values
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBuilder {
    dialect: Dialect,
}

impl QueryBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Query for exactly one album, its artist and all its tracks.
    ///
    /// Tracks are left-joined so an album without tracks still yields a row.
    pub fn build_by_id(&self, id: AlbumId) -> AlbumQuery {
        let mut sql = select_from(&[&ALBUM_TABLE, &ARTIST_TABLE, &TRACK_TABLE]);
        sql.push_str(&format!(
            " LEFT JOIN {} {} ON {} = {}",
            TRACK_TABLE.name,
            TRACK_TABLE.alias,
            TRACK_TABLE.qualified("album_id"),
            ALBUM_TABLE.qualified("id"),
        ));
        sql.push_str(&format!(
            " WHERE {} = {}",
            ALBUM_TABLE.qualified("id"),
            self.dialect.placeholder(1)
        ));
        sql.push_str(&format!(" ORDER BY {}", TRACK_TABLE.qualified("id")));

        let query = AlbumQuery {
            sql,
            binds: vec![BindValue::Integer(id.0)],
            scope: QueryScope::Single(id),
        };

        debug!(album_id = %id, sql = %query.sql, "Built album query by id");
        query
    }

    /// Query for every album matching `criteria`, ordered by album id.
    pub fn build(&self, criteria: &Criteria) -> AlbumQuery {
        let mut conditions: Vec<String> = Vec::new();
        let mut binds: Vec<BindValue> = Vec::new();

        // Only a text value filters by artist
        if let Some(CriterionValue::Text(value)) = criteria.get(INTERPRET) {
            let pattern = format!("%{}%", escape_like(value));
            conditions.push(format!(
                "{} {} {} ESCAPE '\\'",
                ARTIST_TABLE.qualified("name"),
                self.dialect.case_insensitive_like(),
                self.dialect.placeholder(binds.len() + 1)
            ));
            binds.push(BindValue::Text(pattern));
        }

        for (flag, tag) in GENRE_FLAGS {
            if criteria.get(flag).is_some_and(CriterionValue::is_true) {
                conditions.push(format!(
                    "{} LIKE {}",
                    ALBUM_TABLE.qualified("genres"),
                    self.dialect.placeholder(binds.len() + 1)
                ));
                binds.push(BindValue::Text(format!("%{}%", tag)));
            }
        }

        for (name, value) in criteria.iter() {
            if is_shorthand(name) {
                continue;
            }

            let Some(column) = ALBUM_TABLE.column(name) else {
                debug!(criterion = name, "Skipping criterion without album column");
                continue;
            };

            conditions.push(format!(
                "{} = {}",
                ALBUM_TABLE.qualified(column.name),
                self.dialect.placeholder(binds.len() + 1)
            ));
            binds.push(value.coerce(column.sql_type));
        }

        let mut sql = select_from(&[&ALBUM_TABLE, &ARTIST_TABLE]);

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        sql.push_str(&format!(" ORDER BY {}", ALBUM_TABLE.qualified("id")));

        let query = AlbumQuery {
            sql,
            binds,
            scope: QueryScope::List,
        };

        debug!(
            criteria = %criteria.to_json(),
            sql = %query.sql,
            binds = query.binds.len(),
            "Built album query"
        );
        query
    }
}

/// Names handled by a dedicated predicate instead of column equality
fn is_shorthand(name: &str) -> bool {
    name == INTERPRET || GENRE_FLAGS.iter().any(|(flag, _)| *flag == name)
}

/// `SELECT <columns> FROM album a INNER JOIN artist ar ON ...`
fn select_from(tables: &[&TableDef]) -> String {
    let columns: Vec<String> = tables.iter().flat_map(|t| t.select_list()).collect();

    format!(
        "SELECT {} FROM {} {} INNER JOIN {} {} ON {} = {}",
        columns.join(", "),
        ALBUM_TABLE.name,
        ALBUM_TABLE.alias,
        ARTIST_TABLE.name,
        ARTIST_TABLE.alias,
        ARTIST_TABLE.qualified("album_id"),
        ALBUM_TABLE.qualified("id"),
    )
}

/// Escape LIKE wildcards so the value matches literally
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
