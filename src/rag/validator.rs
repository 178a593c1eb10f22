//! SQL safety gate.
//!
//! A candidate query is SAFE only when it is non-empty, starts with `select`,
//! contains no denylisted word, and parses under the SQLite grammar. Checks
//! run in that order and stop at the first failure.
//!
//! No allow-list of tables or columns is applied here. Unknown names surface
//! as execution errors.

use crate::core::error::RejectReason;
use regex::Regex;
use serde::Serialize;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use std::sync::OnceLock;

/// Words that never appear in a read-only query, matched on word boundaries.
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "drop", "delete", "insert", "update", "alter", "create", "exec", "execute", "truncate",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Holds the trimmed query text that may be executed.
    Safe(String),
    Unsafe(RejectReason),
}

impl Verdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, Verdict::Safe(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Safe(_) => "SAFE",
            Verdict::Unsafe(_) => "UNSAFE",
        }
    }
}

#[derive(Serialize)]
struct VerdictJson<'a> {
    verdict: &'static str,
    sql: Option<&'a str>,
    reason: Option<&'static str>,
    detail: Option<String>,
}

impl Serialize for Verdict {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let json = match self {
            Verdict::Safe(sql) => VerdictJson {
                verdict: self.label(),
                sql: Some(sql.as_str()),
                reason: None,
                detail: None,
            },
            Verdict::Unsafe(reason) => VerdictJson {
                verdict: self.label(),
                sql: None,
                reason: Some(reason.tag()),
                detail: Some(reason.to_string()),
            },
        };
        json.serialize(serializer)
    }
}

fn forbidden_keyword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation = FORBIDDEN_KEYWORDS.join("|");
        Regex::new(&format!(r"(?i)\b({})\b", alternation))
            .expect("forbidden keyword pattern compiles")
    })
}

/// First denylisted word appearing as a whole word, lowercased.
pub fn find_forbidden_keyword(sql: &str) -> Option<String> {
    forbidden_keyword_re()
        .captures(sql)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// Classify `sql`. Pure: no store access, same input gives same verdict.
pub fn validate(sql: &str) -> Verdict {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Verdict::Unsafe(RejectReason::EmptyInput);
    }

    if !trimmed.to_lowercase().starts_with("select") {
        return Verdict::Unsafe(RejectReason::NotASelect);
    }

    if let Some(word) = find_forbidden_keyword(trimmed) {
        return Verdict::Unsafe(RejectReason::ForbiddenKeyword(word));
    }

    match Parser::parse_sql(&SQLiteDialect {}, trimmed) {
        Ok(statements) if statements.is_empty() => {
            Verdict::Unsafe(RejectReason::ParseFailure("no statement found".to_string()))
        }
        Ok(_) => Verdict::Safe(trimmed.to_string()),
        Err(e) => Verdict::Unsafe(RejectReason::ParseFailure(e.to_string())),
    }
}
