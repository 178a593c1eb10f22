//! Natural language to candidate SQL.
//!
//! This module only builds the prompt and cleans the response. It enforces
//! nothing: every candidate must still pass [`crate::rag::validator`].

use crate::core::error::HybridRagError;
use crate::core::llm::TextGenerator;
use crate::rag::schema_digest::SchemaDigest;
use std::fmt;

/// Raw generator output. Untrusted until validated; empty means the
/// generator declined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlCandidate(String);

impl SqlCandidate {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SqlCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn build_sql_prompt(nl_query: &str, digest: &SchemaDigest) -> String {
    format!(
        "You are a SQL expert. Convert the user's question into a safe, read-only SQL query.
- Use ONLY the tables and columns provided in the schema.
- ONLY generate a single SELECT statement. NO INSERT, UPDATE, DELETE, DROP, ALTER, etc.
- If unsure, return an empty string.

Schema:
{}

User question: {}

SQL query (only the SQL, no explanation):",
        digest.render_for_prompt(),
        nl_query
    )
}

/// Strip one enclosing markdown code fence (with or without a language tag)
/// and surrounding whitespace.
pub fn clean_sql_response(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest
                .strip_prefix("sqlite")
                .or_else(|| rest.strip_prefix("sql"))
                .or_else(|| rest.strip_prefix("SQL"))
                .unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest)
        }
        None => trimmed,
    };
    inner.trim().to_string()
}

pub struct SqlGenerator<'a> {
    generator: &'a dyn TextGenerator,
    model: &'a str,
}

impl<'a> SqlGenerator<'a> {
    pub fn new(generator: &'a dyn TextGenerator, model: &'a str) -> Self {
        Self { generator, model }
    }

    /// One generation call; no retries.
    pub fn generate(&self, nl_query: &str, digest: &SchemaDigest) -> Result<SqlCandidate, HybridRagError> {
        let prompt = build_sql_prompt(nl_query, digest);
        let raw = self.generator.generate(&prompt, self.model)?;
        Ok(SqlCandidate::new(clean_sql_response(&raw)))
    }
}
