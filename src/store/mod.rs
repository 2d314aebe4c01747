//! Persistent metadata store.
//!
//! The compiler and the dev server only ever see the [`MetadataStore`]
//! trait; any engine that supports filepath-keyed lookup and a date-ordered
//! full scan can back it. The shipped implementation is
//! [`sqlite::SqliteStore`].

mod sqlite;

pub use sqlite::SqliteStore;

use crate::meta::Metadata;
use std::path::PathBuf;
use thiserror::Error;

/// Persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no metadata record for `{0}`")]
    NotFound(String),

    #[error("database does not exist at `{0}`. run `loam init` first")]
    Missing(PathBuf),

    #[error("database error")]
    Sqlite(#[from] rusqlite::Error),
}

/// Durable mapping from content filepath to [`Metadata`], plus the tag
/// association table.
///
/// Existence probes return `Ok(bool)` on a definite answer and `Err` on a
/// lookup failure; callers must treat the failure as fatal rather than
/// defaulting to "does not exist" (that default would silently turn an
/// update into a create).
pub trait MetadataStore {
    /// Insert a new record and return the assigned id.
    fn create_metadata(&self, m: &Metadata) -> Result<i64, StoreError>;

    /// Is there a record keyed by this filepath?
    fn metadata_exists(&self, filepath: &str) -> Result<bool, StoreError>;

    /// Read one record (tags included) by filepath.
    fn read_metadata(&self, filepath: &str) -> Result<Metadata, StoreError>;

    /// All records, newest `created` first. Consumers rely on the order.
    fn read_all_metadata(&self) -> Result<Vec<Metadata>, StoreError>;

    /// Full replace of title/author/dates/is_home keyed by filepath.
    /// The id is not part of the update predicate and never changes.
    fn update_metadata(&self, m: &Metadata) -> Result<(), StoreError>;

    fn delete_metadata(&self, filepath: &str) -> Result<(), StoreError>;

    /// Link a tag name to a record.
    fn create_tag(&self, metadata_id: i64, name: &str) -> Result<(), StoreError>;

    /// Is this tag name present anywhere in the store (any record)?
    fn tag_exists(&self, name: &str) -> Result<bool, StoreError>;

    fn read_tags(&self, metadata_id: i64) -> Result<Vec<String>, StoreError>;

    fn delete_tag(&self, name: &str) -> Result<(), StoreError>;
}
