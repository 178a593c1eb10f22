//! Evidence fusion and grounded answer generation.
//!
//! Structured and unstructured evidence for one turn is assembled into an
//! [`EvidenceBundle`], rendered into a single context block, and handed to
//! one generation call. The [`ProvenanceRecord`] returned with the answer is
//! built from the bundle itself, never from what the model says it used.

use crate::core::error::HybridRagError;
use crate::core::llm::TextGenerator;
use crate::rag::value::QueryResult;
use crate::rag::vector::RetrievedPassage;
use serde::Serialize;

pub const NO_DATA_STATEMENT: &str = "No data found in the database.";
pub const NO_CONTEXT_STATEMENT: &str = "No relevant context found.";
const MAX_PROVENANCE_SNIPPETS: usize = 2;

/// Query text and rows from a SQL path that actually executed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredEvidence {
    pub sql: String,
    pub result: QueryResult,
}

/// Everything one answer call may draw on. Built once per turn, consumed
/// once by [`Composer::compose`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceBundle {
    pub passages: Vec<RetrievedPassage>,
    /// `None` when no SQL ran (not generated, rejected, or failed).
    pub structured: Option<StructuredEvidence>,
}

impl EvidenceBundle {
    pub fn new(passages: Vec<RetrievedPassage>, structured: Option<StructuredEvidence>) -> Self {
        Self {
            passages,
            structured,
        }
    }

    /// Trimmed, non-empty passage texts in retrieval order.
    pub fn passage_texts(&self) -> Vec<String> {
        self.passages
            .iter()
            .map(|p| p.text.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn sql(&self) -> Option<&str> {
        self.structured.as_ref().map(|s| s.sql.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.passage_texts().is_empty() && self.structured.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProvenanceRecord {
    pub sql: Option<String>,
    pub passages: Vec<String>,
}

impl ProvenanceRecord {
    pub fn from_bundle(bundle: &EvidenceBundle) -> Self {
        Self {
            sql: bundle.sql().map(str::to_string),
            passages: bundle.passage_texts(),
        }
    }

    pub fn sql_used(&self) -> bool {
        self.sql.is_some()
    }

    /// Markdown panel shown next to the answer.
    pub fn render_markdown(&self) -> String {
        let mut out = String::from("## Provenance\n");
        match &self.sql {
            Some(sql) => out.push_str(&format!("**SQL Used:**\n```sql\n{}\n```\n\n", sql)),
            None => out.push_str("No SQL query generated.\n\n"),
        }
        if self.passages.is_empty() {
            out.push_str("No relevant document snippets found.");
        } else {
            out.push_str("**Retrieved Document Snippets:**\n");
            let snippets = self
                .passages
                .iter()
                .take(MAX_PROVENANCE_SNIPPETS)
                .map(|t| format!("- {}", t))
                .collect::<Vec<_>>()
                .join("\n");
            out.push_str(&snippets);
        }
        out
    }
}

/// Natural-language framing of a query result.
///
/// Exactly one row with exactly one column, not truncated, becomes a
/// single-value sentence;
/// any other non-empty result becomes a `key: value` listing per row; an
/// empty result becomes [`NO_DATA_STATEMENT`].
pub fn summarize_query_result(result: &QueryResult) -> String {
    if result.is_empty() {
        return NO_DATA_STATEMENT.to_string();
    }

    if !result.truncated && result.rows.len() == 1 && result.rows[0].len() == 1 {
        if let Some((_, value)) = result.rows[0].iter().next() {
            return format!("The result is: {}.", value);
        }
    }

    let mut lines = vec!["Database returned the following records:".to_string()];
    for row in &result.rows {
        lines.push(format!(" - {}", row));
    }
    if result.truncated {
        lines.push(format!(" (listing stopped after {} rows)", result.rows.len()));
    }
    lines.join("\n")
}

/// Render the evidence block: document section (only if some passage has
/// text), then database section with the SQL (only if SQL ran).
pub fn format_evidence(bundle: &EvidenceBundle) -> String {
    let mut parts = Vec::new();

    let texts = bundle.passage_texts();
    if !texts.is_empty() {
        let listing = texts
            .iter()
            .map(|t| format!("- {}", t))
            .collect::<Vec<_>>()
            .join("\n");
        parts.push(format!("## Unstructured Context (from documents):\n{}", listing));
    }

    if let Some(structured) = &bundle.structured {
        parts.push(format!(
            "## Structured Context (from database):\n{}",
            summarize_query_result(&structured.result)
        ));
        parts.push(format!("**SQL used:**\n```sql\n{}\n```", structured.sql));
    }

    if parts.is_empty() {
        NO_CONTEXT_STATEMENT.to_string()
    } else {
        parts.join("\n\n")
    }
}

pub fn build_answer_prompt(query: &str, evidence: &str) -> String {
    format!(
        "You are an intelligent assistant that answers questions using both document knowledge and live database results.

User question: {}

{}

Instructions:
- Answer concisely and truthfully.
- If data comes from the database, mention it (e.g., \"According to the database...\").
- If info comes from documents, cite it (e.g., \"The document states...\").
- If both sources are present, synthesize them logically.
- If the database returns several records that tie, report all of them; do not pick a single winner.
- Use only the evidence above. If it is insufficient, say \"I don't know\".
- Include the SQL query if it was used.

Final answer:",
        query, evidence
    )
}

pub struct Composer<'a> {
    generator: &'a dyn TextGenerator,
    model: &'a str,
}

impl<'a> Composer<'a> {
    pub fn new(generator: &'a dyn TextGenerator, model: &'a str) -> Self {
        Self { generator, model }
    }

    /// One grounded generation call over `bundle`.
    ///
    /// A failed call or an empty completion is `GenerationFailure`.
    pub fn compose(&self, query: &str, bundle: &EvidenceBundle) -> Result<(String, ProvenanceRecord), HybridRagError> {
        let provenance = ProvenanceRecord::from_bundle(bundle);
        let prompt = build_answer_prompt(query, &format_evidence(bundle));
        let answer = self.generator.generate(&prompt, self.model)?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(HybridRagError::GenerationFailure(
                "answer generation returned no text".to_string(),
            ));
        }
        Ok((answer.to_string(), provenance))
    }
}
