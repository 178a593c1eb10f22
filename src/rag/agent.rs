//! One user turn, end to end.
//!
//! ```text
//! query ─┬─ vector retrieval ─────────────────────────────┐
//!        └─ SQL generation → validation → execution ──────┴─ compose → (answer, provenance)
//! ```
//!
//! The two evidence paths run concurrently on the rayon pool and fail
//! independently: a failure on either side becomes "no evidence from this
//! source" and the other side is unaffected. Schema digest and passage index
//! are immutable and shared across turns; the store is opened per query.

use crate::core::audit::{AuditLog, TurnEvent};
use crate::core::config::Settings;
use crate::core::error::{HybridRagError, RejectReason};
use crate::core::llm::TextGenerator;
use crate::core::output::compact_line;
use crate::core::store::Store;
use crate::rag::composer::{Composer, EvidenceBundle, ProvenanceRecord, StructuredEvidence};
use crate::rag::executor;
use crate::rag::ingest;
use crate::rag::schema_digest::{self, SchemaDigest};
use crate::rag::sql_generator::SqlGenerator;
use crate::rag::validator::{self, Verdict};
use crate::rag::vector::{HashingEmbedder, InMemoryIndex, PassageIndex, RetrievedPassage, VectorRetriever};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// What happened on the SQL side of a turn. Only `Executed` produces
/// structured evidence, and it is only reachable through a SAFE verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum SqlPathOutcome {
    StoreUnavailable { message: String },
    GenerationFailed { message: String },
    NotGenerated,
    Rejected { reason: String, detail: String },
    ExecutionFailed { message: String },
    Executed { sql: String, rows: usize },
}

impl SqlPathOutcome {
    pub fn tag(&self) -> &'static str {
        match self {
            SqlPathOutcome::StoreUnavailable { .. } => "store-unavailable",
            SqlPathOutcome::GenerationFailed { .. } => "generation-failed",
            SqlPathOutcome::NotGenerated => "not-generated",
            SqlPathOutcome::Rejected { .. } => "rejected",
            SqlPathOutcome::ExecutionFailed { .. } => "execution-failed",
            SqlPathOutcome::Executed { .. } => "executed",
        }
    }

    fn rejected(reason: &RejectReason) -> Self {
        SqlPathOutcome::Rejected {
            reason: reason.tag().to_string(),
            detail: reason.to_string(),
        }
    }

    pub fn executed(&self) -> bool {
        matches!(self, SqlPathOutcome::Executed { .. })
    }
}

/// Result of one turn.
#[derive(Debug)]
pub struct Turn {
    pub answer: Result<String, HybridRagError>,
    /// Evidence actually supplied to the answer call.
    pub provenance: ProvenanceRecord,
    pub sql_path: SqlPathOutcome,
    pub passages_retrieved: usize,
}

impl Turn {
    /// The answer, or a single explicit error line when the turn failed.
    pub fn answer_text(&self) -> String {
        match &self.answer {
            Ok(text) => text.clone(),
            Err(e) => format!("Error: {}", e),
        }
    }

    pub fn is_answered(&self) -> bool {
        self.answer.is_ok()
    }
}

/// Request handler holding the read-only resources shared by every turn.
pub struct HybridRag {
    store: Store,
    digest: Option<Arc<SchemaDigest>>,
    index: Arc<dyn PassageIndex>,
    generator: Arc<dyn TextGenerator>,
    model: String,
    top_k: usize,
    row_limit: usize,
    audit: Option<AuditLog>,
}

impl HybridRag {
    /// `digest` is `None` when the store could not be introspected; the SQL
    /// path is then skipped on every turn.
    pub fn new(
        store: Store,
        digest: Option<Arc<SchemaDigest>>,
        index: Arc<dyn PassageIndex>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let defaults = Settings::default();
        Self {
            store,
            digest,
            index,
            generator,
            model: defaults.generation.model,
            top_k: defaults.retrieval.top_k,
            row_limit: defaults.store.row_limit,
            audit: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_row_limit(mut self, row_limit: usize) -> Self {
        self.row_limit = row_limit;
        self
    }

    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Build the shared context once: schema digest from the store, passage
    /// index from the corpus directory. An unavailable store only disables
    /// the SQL path.
    pub fn from_settings(settings: &Settings, generator: Arc<dyn TextGenerator>) -> Result<Self, HybridRagError> {
        let store = Store::new(settings.store.db_path.clone());
        let digest = match schema_digest::digest(&store, settings.store.sample_size) {
            Ok(d) => Some(Arc::new(d)),
            Err(e) => {
                warn!(error = %e, "schema digest unavailable; SQL path disabled");
                None
            }
        };

        let passages = ingest::load_corpus(
            &settings.retrieval.corpus_dir,
            settings.retrieval.chunk_size,
            settings.retrieval.chunk_overlap,
        )?;
        let index = InMemoryIndex::build(HashingEmbedder::new(settings.retrieval.dimensions), passages)?;

        let mut rag = Self::new(store, digest, Arc::new(index), generator)
            .with_model(settings.generation.model.clone())
            .with_top_k(settings.retrieval.top_k)
            .with_row_limit(settings.store.row_limit);
        if let Some(path) = &settings.audit.events_path {
            rag = rag.with_audit(AuditLog::new(path));
        }
        Ok(rag)
    }

    pub fn digest(&self) -> Option<&SchemaDigest> {
        self.digest.as_deref()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Entry point: answer text plus provenance. Never panics or errors; a
    /// failed turn yields one explicit error message as the answer.
    pub fn answer_query(&self, nl_text: &str) -> (String, ProvenanceRecord) {
        let turn = self.run_turn(nl_text);
        (turn.answer_text(), turn.provenance)
    }

    pub fn run_turn(&self, nl_text: &str) -> Turn {
        let (passages, (sql_path, structured)) = rayon::join(
            || self.retrieve_passages(nl_text),
            || self.structured_evidence(nl_text),
        );

        let passages_retrieved = passages.len();
        let bundle = EvidenceBundle::new(passages, structured);
        let composer = Composer::new(self.generator.as_ref(), &self.model);
        let (answer, provenance) = match composer.compose(nl_text, &bundle) {
            Ok((text, provenance)) => (Ok(text), provenance),
            Err(e) => {
                let error = if bundle.is_empty() {
                    warn!(error = %e, "no evidence from either source and answer generation failed");
                    HybridRagError::GenerationFailure(format!(
                        "no evidence was found and the answer could not be generated ({})",
                        e
                    ))
                } else {
                    warn!(error = %e, "answer generation failed");
                    e
                };
                (Err(error), ProvenanceRecord::from_bundle(&bundle))
            }
        };

        let turn = Turn {
            answer,
            provenance,
            sql_path,
            passages_retrieved,
        };
        self.record(nl_text, &turn);
        turn
    }

    /// Unstructured side. Index errors degrade to no passages.
    pub fn retrieve_passages(&self, query: &str) -> Vec<RetrievedPassage> {
        match VectorRetriever::new(self.index.as_ref()).retrieve(query, self.top_k) {
            Ok(passages) => passages,
            Err(e) => {
                warn!(error = %e, "vector retrieval failed; continuing without passages");
                Vec::new()
            }
        }
    }

    /// Structured side: generate, validate, execute. Every failure ends the
    /// path with a tagged outcome and no evidence.
    pub fn structured_evidence(&self, query: &str) -> (SqlPathOutcome, Option<StructuredEvidence>) {
        let Some(digest) = self.digest.as_deref() else {
            return (
                SqlPathOutcome::StoreUnavailable {
                    message: format!("no schema digest for {}", self.store.path().display()),
                },
                None,
            );
        };

        let generator = SqlGenerator::new(self.generator.as_ref(), &self.model);
        let candidate = match generator.generate(query, digest) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "SQL generation failed");
                return (SqlPathOutcome::GenerationFailed { message: e.to_string() }, None);
            }
        };
        if candidate.is_empty() {
            info!("generator declined to produce SQL");
            return (SqlPathOutcome::NotGenerated, None);
        }

        let safe_sql = match validator::validate(candidate.as_str()) {
            Verdict::Safe(sql) => sql,
            Verdict::Unsafe(reason) => {
                warn!(%reason, sql = %compact_line(candidate.as_str(), 160), "SQL rejected");
                return (SqlPathOutcome::rejected(&reason), None);
            }
        };

        match executor::execute(&safe_sql, &self.store, self.row_limit) {
            Ok(result) => {
                info!(rows = result.len(), "structured evidence ready");
                let outcome = SqlPathOutcome::Executed {
                    sql: safe_sql.clone(),
                    rows: result.len(),
                };
                (outcome, Some(StructuredEvidence { sql: safe_sql, result }))
            }
            Err(HybridRagError::StoreUnavailable(message)) => {
                warn!(%message, "store unavailable at execution time");
                (SqlPathOutcome::StoreUnavailable { message }, None)
            }
            Err(HybridRagError::ValidationRejected { reason }) => (SqlPathOutcome::rejected(&reason), None),
            Err(e) => {
                warn!(error = %e, sql = %compact_line(&safe_sql, 160), "SQL execution failed");
                (SqlPathOutcome::ExecutionFailed { message: e.to_string() }, None)
            }
        }
    }

    fn record(&self, query: &str, turn: &Turn) {
        let Some(audit) = &self.audit else {
            return;
        };
        let status = if turn.is_answered() { "answered" } else { "failed" };
        let event = TurnEvent::new(
            query,
            turn.sql_path.tag(),
            turn.provenance.sql.as_deref(),
            turn.provenance.passages.len(),
            status,
        );
        if let Err(e) = audit.append(&event) {
            warn!(error = %e, path = %audit.path().display(), "failed to append turn event");
        }
    }
}
