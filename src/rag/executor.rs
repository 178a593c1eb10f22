use crate::core::db;
use crate::core::error::HybridRagError;
use crate::core::output::compact_line;
use crate::core::store::Store;
use crate::rag::validator::{self, Verdict};
use crate::rag::value::{QueryResult, Row, ScalarValue};
use rusqlite::Connection;
use tracing::{debug, warn};

/// Run a SAFE query once against a fresh read-only connection.
///
/// The query is validated again here; anything the gate rejects comes back
/// as `ValidationRejected` without a connection ever being opened. Reading
/// stops after `row_limit` rows and the result is marked truncated. The
/// connection is dropped on every return path.
pub fn execute(sql: &str, store: &Store, row_limit: usize) -> Result<QueryResult, HybridRagError> {
    let safe_sql = match validator::validate(sql) {
        Verdict::Safe(s) => s,
        Verdict::Unsafe(reason) => {
            warn!(%reason, "executor refused unvalidated SQL");
            return Err(HybridRagError::ValidationRejected { reason });
        }
    };

    let conn = db::open_read_only(store)?;
    let result = run_query(&conn, &safe_sql, row_limit.max(1))
        .map_err(|e| HybridRagError::ExecutionError(e.to_string()))?;
    debug!(
        sql = %compact_line(&safe_sql, 120),
        rows = result.rows.len(),
        truncated = result.truncated,
        "query executed"
    );
    Ok(result)
}

fn run_query(conn: &Connection, sql: &str, row_limit: usize) -> Result<QueryResult, rusqlite::Error> {
    let mut stmt = conn.prepare(sql)?;
    // SQLite's own classification, independent of the validator.
    if !stmt.readonly() {
        return Err(rusqlite::Error::InvalidQuery);
    }
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    let mut truncated = false;
    while let Some(row) = rows.next()? {
        if out.len() == row_limit {
            truncated = true;
            break;
        }
        let mut projected = Row::new();
        for (idx, column) in columns.iter().enumerate() {
            projected.push(column.clone(), ScalarValue::from(row.get_ref(idx)?));
        }
        out.push(projected);
    }

    Ok(QueryResult {
        rows: out,
        truncated,
    })
}
