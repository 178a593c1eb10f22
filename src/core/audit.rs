use crate::core::error::HybridRagError;
use crate::core::output::{new_event_id, now_epoch_z};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One line in the turn audit log. The user's question is recorded only
/// as a SHA-256 digest.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TurnEvent {
    pub ts: String,
    pub event_id: String,
    pub query_sha256: String,
    pub sql_path: String,
    pub sql: Option<String>,
    pub passages: usize,
    pub status: String,
}

impl TurnEvent {
    pub fn new(query: &str, sql_path: &str, sql: Option<&str>, passages: usize, status: &str) -> Self {
        Self {
            ts: now_epoch_z(),
            event_id: new_event_id(),
            query_sha256: sha256_hex(query),
            sql_path: sql_path.to_string(),
            sql: sql.map(str::to_string),
            passages,
            status: status.to_string(),
        }
    }
}

pub fn sha256_hex(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Append-only JSONL sink for turn events.
pub struct AuditLog {
    events_path: PathBuf,
}

impl AuditLog {
    pub fn new(events_path: &Path) -> Self {
        Self {
            events_path: events_path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.events_path
    }

    pub fn append(&self, event: &TurnEvent) -> Result<(), HybridRagError> {
        // Concurrent turns in one process must not interleave partial lines.
        static APPEND_LOCK: Mutex<()> = Mutex::new(());
        let _lock = APPEND_LOCK
            .lock()
            .map_err(|_| HybridRagError::IoError(std::io::Error::other("audit lock poisoned")))?;

        if let Some(parent) = self.events_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let line = serde_json::to_string(event)?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.events_path)?;
        writeln!(f, "{}", line)?;
        Ok(())
    }
}
