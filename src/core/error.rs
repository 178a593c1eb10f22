use rusqlite;
use std::fmt;
use std::io;
use thiserror::Error;

/// Why the safety gate refused a candidate query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    EmptyInput,
    NotASelect,
    /// Carries the denylisted word that matched, lowercased.
    ForbiddenKeyword(String),
    ParseFailure(String),
}

impl RejectReason {
    /// Stable tag used in logs, audit events and JSON output.
    pub fn tag(&self) -> &'static str {
        match self {
            RejectReason::EmptyInput => "empty-input",
            RejectReason::NotASelect => "not-a-select",
            RejectReason::ForbiddenKeyword(_) => "forbidden-keyword",
            RejectReason::ParseFailure(_) => "parse-failure",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::EmptyInput | RejectReason::NotASelect => write!(f, "{}", self.tag()),
            RejectReason::ForbiddenKeyword(word) => write!(f, "{} ({})", self.tag(), word),
            RejectReason::ParseFailure(msg) => write!(f, "{} ({})", self.tag(), msg),
        }
    }
}

#[derive(Error, Debug)]
pub enum HybridRagError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("SQL rejected by safety validator: {reason}")]
    ValidationRejected { reason: RejectReason },
    #[error("SQL execution error: {0}")]
    ExecutionError(String),
    #[error("Generation failure: {0}")]
    GenerationFailure(String),
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
