//! Hybrid RAG: grounded answers from documents and a relational store.
//!
//! A question is answered by fusing two kinds of evidence:
//!
//! - **Passages** from a semantic index over a document corpus.
//! - **Rows** from a SQLite store, fetched by SQL that a text-generation
//!   model writes from the question and a schema digest.
//!
//! Generated SQL is untrusted. It must pass the safety gate in
//! [`rag::validator`] (single read-only `SELECT`, no denylisted keyword,
//! parses as SQLite) before [`rag::executor`] will run it, and the executor
//! checks again. Either evidence source can fail without failing the turn.
//! The answer comes back with a [`rag::composer::ProvenanceRecord`] listing
//! exactly the evidence that was supplied.
//!
//! # Examples
//!
//! ```bash
//! # Create the demo music database
//! hybrid-rag seed-demo
//!
//! # Inspect what the SQL generator will see
//! hybrid-rag schema
//!
//! # Check a query against the safety gate
//! hybrid-rag validate "SELECT * FROM Album; DROP TABLE Album;"
//!
//! # Ask a question
//! hybrid-rag ask "Which artist has the most albums?"
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: errors, configuration, store access, logging, audit, text-generation capability
//! - [`rag`]: the retrieval-fusion pipeline

pub mod core;
pub mod rag;

use crate::core::{
    config::{self, Settings},
    error::HybridRagError,
    llm::CommandGenerator,
    logging,
    output::{command_envelope, compact_line},
    store::Store,
};
use crate::rag::{
    agent::HybridRag,
    demo, ingest, schema_digest,
    validator::{self, Verdict},
    vector::{HashingEmbedder, InMemoryIndex, VectorRetriever},
};

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(
    name = "hybrid-rag",
    version = env!("CARGO_PKG_VERSION"),
    about = "Answer questions from documents and a SQLite store, with provenance"
)]
struct Cli {
    /// Config file (defaults to ./hybrid-rag.toml when present).
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer a question using passages and database rows
    Ask {
        question: String,
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Print the schema digest given to the SQL generator
    Schema {
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Classify a SQL string as SAFE or UNSAFE
    Validate {
        sql: String,
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Show the top-k passages for a query
    Retrieve {
        query: String,
        #[clap(short, long)]
        k: Option<usize>,
    },
    /// Create the demo music database
    SeedDemo {
        /// Database path (defaults to store.db_path from config).
        #[clap(long)]
        db: Option<PathBuf>,
    },
}

fn is_json(format: &str) -> bool {
    format.eq_ignore_ascii_case("json")
}

pub fn run() -> Result<(), HybridRagError> {
    let cli = Cli::parse();
    let current_dir = std::env::current_dir()?;
    let settings = config::load_settings(cli.config.as_deref(), &current_dir)?;
    logging::init_logging(&settings.logging)
        .map_err(|e| HybridRagError::ConfigError(e.to_string()))?;

    match cli.command {
        Command::Ask { question, format } => run_ask(&settings, &question, &format),
        Command::Schema { format } => run_schema(&settings, &format),
        Command::Validate { sql, format } => {
            run_validate(&sql, &format);
            Ok(())
        }
        Command::Retrieve { query, k } => run_retrieve(&settings, &query, k),
        Command::SeedDemo { db } => {
            let path = db.unwrap_or_else(|| settings.store.db_path.clone());
            demo::seed_music_db(&Store::new(path.clone()))?;
            println!("Demo database ready at {}", path.display());
            Ok(())
        }
    }
}

fn run_ask(settings: &Settings, question: &str, format: &str) -> Result<(), HybridRagError> {
    let generator = Arc::new(CommandGenerator::from_settings(&settings.generation));
    let rag = HybridRag::from_settings(settings, generator)?;
    let turn = rag.run_turn(question);

    if is_json(format) {
        let status = if turn.is_answered() { "ok" } else { "error" };
        let envelope = command_envelope(
            "ask",
            status,
            serde_json::json!({
                "answer": turn.answer_text(),
                "provenance": turn.provenance,
                "sql_path": turn.sql_path,
                "passages_retrieved": turn.passages_retrieved,
            }),
        );
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else {
        println!("{}", turn.answer_text());
        println!();
        println!("{}", turn.provenance.render_markdown());
    }
    Ok(())
}

fn run_schema(settings: &Settings, format: &str) -> Result<(), HybridRagError> {
    let store = Store::new(settings.store.db_path.clone());
    let digest = schema_digest::digest(&store, settings.store.sample_size)?;
    if is_json(format) {
        let envelope = command_envelope("schema", "ok", serde_json::json!({ "digest": digest }));
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else {
        print!("{}", digest.render_for_prompt());
    }
    Ok(())
}

fn run_validate(sql: &str, format: &str) {
    use colored::Colorize;

    let verdict = validator::validate(sql);
    if is_json(format) {
        let envelope = command_envelope("validate", "ok", serde_json::json!({ "result": verdict }));
        println!("{}", envelope);
        return;
    }
    match &verdict {
        Verdict::Safe(normalized) => {
            println!("{} {}", verdict.label().green().bold(), compact_line(normalized, 120));
        }
        Verdict::Unsafe(reason) => {
            println!("{} {}", verdict.label().red().bold(), reason);
        }
    }
}

fn run_retrieve(settings: &Settings, query: &str, k: Option<usize>) -> Result<(), HybridRagError> {
    let passages = ingest::load_corpus(
        &settings.retrieval.corpus_dir,
        settings.retrieval.chunk_size,
        settings.retrieval.chunk_overlap,
    )?;
    let index = InMemoryIndex::build(HashingEmbedder::new(settings.retrieval.dimensions), passages)?;
    let k = k.unwrap_or(settings.retrieval.top_k);
    let results = VectorRetriever::new(&index).retrieve(query, k)?;
    if results.is_empty() {
        println!("No passages found.");
    }
    for (rank, passage) in results.iter().enumerate() {
        println!(
            "{}. [{}] ({:.3}) {}",
            rank + 1,
            passage.source,
            passage.score.unwrap_or_default(),
            compact_line(&passage.text, 160)
        );
    }
    Ok(())
}
