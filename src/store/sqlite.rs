//! SQLite-backed metadata store.

use super::{MetadataStore, StoreError};
use crate::meta::{Day, Metadata};
use rusqlite::{
    Connection, OptionalExtension, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use std::path::Path;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS metadata (
    id INTEGER PRIMARY KEY,
    filepath TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    created TEXT NOT NULL,
    last_updated TEXT NOT NULL,
    is_home INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS tag (
    metadata_id INTEGER NOT NULL REFERENCES metadata(id),
    tag_name TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tag_name ON tag(tag_name);
"#;

// Dates are stored as text. `YYYY-MM-DD` sorts chronologically, and the
// lenient read truncates any time-of-day suffix left by older databases.
impl ToSql for Day {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Day {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Day::parse_lenient(s).ok_or_else(|| FromSqlError::Other(format!("invalid date `{s}`").into()))
    }
}

/// Metadata store backed by a single SQLite database file.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create (or re-open) the database and apply the schema. Used by
    /// `loam init`; idempotent.
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Open an existing database. Fails when the file is absent so commands
    /// can tell the user to `loam init` first. The schema is re-applied so
    /// older databases pick up new tables.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::Missing(path.to_path_buf()));
        }
        Self::create(path)
    }

    #[cfg(test)]
    pub(crate) fn in_memory() -> Self {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
        Self { conn }
    }
}

fn row_to_metadata(row: &Row<'_>) -> rusqlite::Result<Metadata> {
    Ok(Metadata {
        id: row.get(0)?,
        filepath: row.get(1)?,
        title: row.get(2)?,
        author: row.get(3)?,
        created: row.get(4)?,
        last_updated: row.get(5)?,
        tags: Vec::new(),
        is_home: row.get(6)?,
    })
}

const METADATA_COLS: &str = "id, filepath, title, author, created, last_updated, is_home";

impl MetadataStore for SqliteStore {
    fn create_metadata(&self, m: &Metadata) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO metadata (filepath, title, author, created, last_updated, is_home)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![m.filepath, m.title, m.author, m.created, m.last_updated, m.is_home],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn metadata_exists(&self, filepath: &str) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM metadata WHERE filepath = ?1",
                [filepath],
                |r| r.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn read_metadata(&self, filepath: &str) -> Result<Metadata, StoreError> {
        let m = self
            .conn
            .query_row(
                &format!("SELECT {METADATA_COLS} FROM metadata WHERE filepath = ?1"),
                [filepath],
                row_to_metadata,
            )
            .optional()?;
        let mut m = m.ok_or_else(|| StoreError::NotFound(filepath.to_string()))?;
        m.tags = self.read_tags(m.id)?;
        Ok(m)
    }

    fn read_all_metadata(&self) -> Result<Vec<Metadata>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {METADATA_COLS} FROM metadata ORDER BY created DESC"))?;
        let records = stmt
            .query_map([], row_to_metadata)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        records
            .into_iter()
            .map(|mut m| {
                m.tags = self.read_tags(m.id)?;
                Ok(m)
            })
            .collect()
    }

    fn update_metadata(&self, m: &Metadata) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE metadata
             SET title = ?1, author = ?2, created = ?3, last_updated = ?4, is_home = ?5
             WHERE filepath = ?6",
            params![m.title, m.author, m.created, m.last_updated, m.is_home, m.filepath],
        )?;
        Ok(())
    }

    fn delete_metadata(&self, filepath: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM metadata WHERE filepath = ?1", [filepath])?;
        Ok(())
    }

    fn create_tag(&self, metadata_id: i64, name: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO tag (metadata_id, tag_name) VALUES (?1, ?2)",
            params![metadata_id, name],
        )?;
        Ok(())
    }

    fn tag_exists(&self, name: &str) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM tag WHERE tag_name = ?1", [name], |r| {
                r.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    fn read_tags(&self, metadata_id: i64) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT tag_name FROM tag WHERE metadata_id = ?1")?;
        let tags = stmt
            .query_map([metadata_id], |r| r.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(tags)
    }

    fn delete_tag(&self, name: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM tag WHERE tag_name = ?1", [name])?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
