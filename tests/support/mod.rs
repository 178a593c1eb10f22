#![allow(dead_code)]

use hybrid_rag::core::error::HybridRagError;
use hybrid_rag::core::llm::TextGenerator;
use hybrid_rag::core::store::Store;
use hybrid_rag::rag::demo;
use std::sync::Mutex;
use tempfile::TempDir;

/// Query that answers "which artist has the most albums" correctly, ties included.
pub(crate) const MOST_ALBUMS_SQL: &str = "SELECT Artist.Name, COUNT(Album.AlbumId) AS AlbumCount
FROM Artist JOIN Album ON Album.ArtistId = Artist.ArtistId
GROUP BY Artist.ArtistId
HAVING COUNT(Album.AlbumId) = (
    SELECT MAX(c) FROM (SELECT COUNT(*) AS c FROM Album GROUP BY ArtistId) AS counts
)
ORDER BY Artist.ArtistId";

pub(crate) fn seeded_store() -> (TempDir, Store) {
    let tmp = TempDir::new().expect("tempdir");
    let store = Store::new(tmp.path().join("music.db"));
    demo::seed_music_db(&store).expect("seed music db");
    (tmp, store)
}

pub(crate) fn album_count(store: &Store) -> i64 {
    let conn = rusqlite::Connection::open(store.path()).expect("open verify");
    conn.query_row("SELECT COUNT(*) FROM Album", [], |row| row.get(0))
        .expect("Album table must still exist")
}

#[derive(Clone)]
pub(crate) enum Reply {
    Text(String),
    Fail(String),
    /// Answer with the evidence block of the prompt.
    EchoEvidence,
}

/// Deterministic generator: one reply for SQL prompts, one for answer
/// prompts. Every prompt is recorded.
pub(crate) struct ScriptedGenerator {
    sql_reply: Reply,
    answer_reply: Reply,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub(crate) fn new(sql_reply: Reply, answer_reply: Reply) -> Self {
        Self {
            sql_reply,
            answer_reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn sql(sql: &str) -> Self {
        Self::new(Reply::Text(sql.to_string()), Reply::EchoEvidence)
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }

    pub(crate) fn answer_prompts(&self) -> Vec<String> {
        self.prompts()
            .into_iter()
            .filter(|p| !is_sql_prompt(p))
            .collect()
    }

    pub(crate) fn sql_prompt_count(&self) -> usize {
        self.prompts().iter().filter(|p| is_sql_prompt(p)).count()
    }
}

fn is_sql_prompt(prompt: &str) -> bool {
    prompt.starts_with("You are a SQL expert.")
}

fn evidence_block(prompt: &str) -> String {
    let start = prompt.find("User question:").unwrap_or(0);
    let end = prompt.find("Instructions:").unwrap_or(prompt.len());
    prompt[start..end].to_string()
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, prompt: &str, _model: &str) -> Result<String, HybridRagError> {
        self.prompts.lock().expect("prompts lock").push(prompt.to_string());
        let reply = if is_sql_prompt(prompt) {
            &self.sql_reply
        } else {
            &self.answer_reply
        };
        match reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(msg) => Err(HybridRagError::GenerationFailure(msg.clone())),
            Reply::EchoEvidence => Ok(evidence_block(prompt)),
        }
    }
}
