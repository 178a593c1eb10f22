//! Schema digest: table definitions plus a few sample rows per table.
//!
//! The digest is what grounds SQL generation. It is built from one store
//! snapshot, never mutated afterwards, and shared by reference across turns.

use crate::core::db;
use crate::core::error::HybridRagError;
use crate::core::store::Store;
use crate::rag::value::{Row, ScalarValue};
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

pub const DEFAULT_SAMPLE_SIZE: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDigest {
    pub name: String,
    /// `CREATE TABLE` statement exactly as stored in `sqlite_master`
    pub definition: String,
    pub sample_rows: Vec<Row>,
}

/// Tables in `sqlite_master` order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaDigest {
    pub tables: Vec<TableDigest>,
}

impl SchemaDigest {
    pub fn get(&self, table: &str) -> Option<&TableDigest> {
        self.tables.iter().find(|t| t.name == table)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Prompt-ready rendering, embedded verbatim by the SQL generator.
    pub fn render_for_prompt(&self) -> String {
        let mut lines = Vec::new();
        for table in &self.tables {
            lines.push(format!("Table: {}", table.name));
            lines.push(format!("Schema: {}", table.definition));
            if !table.sample_rows.is_empty() {
                lines.push(format!("Sample rows (first {}):", table.sample_rows.len()));
                for row in &table.sample_rows {
                    lines.push(format!("  - {}", row));
                }
            }
            lines.push(String::new());
        }
        lines.join("\n")
    }
}

/// Build a digest of every user table in the store.
///
/// Fails with `StoreUnavailable` if the database cannot be opened.
pub fn digest(store: &Store, sample_size: usize) -> Result<SchemaDigest, HybridRagError> {
    let conn = db::open_read_only(store)?;
    let digest = digest_connection(&conn, sample_size)?;
    info!(
        tables = digest.tables.len(),
        names = ?digest.table_names(),
        "loaded schema digest"
    );
    Ok(digest)
}

fn digest_connection(conn: &Connection, sample_size: usize) -> Result<SchemaDigest, HybridRagError> {
    let mut stmt = conn.prepare(
        "SELECT name, sql FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'",
    )?;
    let entries = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut tables = Vec::with_capacity(entries.len());
    for (name, definition) in entries {
        let sample_rows = sample_rows(conn, &name, sample_size)?;
        tables.push(TableDigest {
            name,
            definition,
            sample_rows,
        });
    }
    Ok(SchemaDigest { tables })
}

fn sample_rows(conn: &Connection, table: &str, limit: usize) -> Result<Vec<Row>, HybridRagError> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let sql = format!("SELECT * FROM {} LIMIT ?1", db::quote_ident(table));
    let mut stmt = conn.prepare(&sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut rows = stmt.query([limit as i64])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut projected = Row::new();
        for (idx, column) in columns.iter().enumerate() {
            projected.push(column.clone(), ScalarValue::from(row.get_ref(idx)?));
        }
        out.push(projected);
    }
    Ok(out)
}
