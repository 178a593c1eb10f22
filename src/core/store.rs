//! Store handle for the relational side of retrieval.
//!
//! A `Store` only names where the SQLite file lives. Connections are opened per
//! operation (see [`crate::core::db`]) and never held across turns, so a single
//! `Store` can be shared by reference between concurrent turns.

use std::path::{Path, PathBuf};

/// Handle to a SQLite database used for schema introspection and SELECT execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    /// Path to the SQLite database file
    pub db_path: PathBuf,
}

impl Store {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}
