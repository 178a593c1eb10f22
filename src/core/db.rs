use crate::core::error::HybridRagError;
use crate::core::store::Store;
use rusqlite::{Connection, OpenFlags};
use std::time::Duration;

const READ_BUSY_TIMEOUT_SECS: u64 = 5;

/// Open a fresh read-only connection to the store.
///
/// The file must already exist; SQLite is never allowed to create it here.
/// Every failure to obtain a usable handle maps to `StoreUnavailable`.
pub fn open_read_only(store: &Store) -> Result<Connection, HybridRagError> {
    let path = store.path();
    if !path.exists() {
        return Err(HybridRagError::StoreUnavailable(format!(
            "database not found: {}",
            path.display()
        )));
    }

    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags).map_err(|e| {
        HybridRagError::StoreUnavailable(format!("{}: {}", path.display(), e))
    })?;
    conn.busy_timeout(Duration::from_secs(READ_BUSY_TIMEOUT_SECS))
        .map_err(|e| HybridRagError::StoreUnavailable(e.to_string()))?;
    // A dangling file that is not a database only fails on first read.
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |_| Ok(()))
        .map_err(|e| HybridRagError::StoreUnavailable(format!("{}: {}", path.display(), e)))?;
    Ok(conn)
}

/// Open a read-write connection. Only the demo seeder uses this.
pub fn open_read_write(store: &Store) -> Result<Connection, HybridRagError> {
    if let Some(parent) = store.path().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(store.path())?;
    conn.busy_timeout(Duration::from_secs(READ_BUSY_TIMEOUT_SECS))?;
    conn.execute("PRAGMA foreign_keys=ON;", [])?;
    Ok(conn)
}

/// Quote an identifier for direct interpolation into SQLite text.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
