#[path = "../support/mod.rs"]
mod support;

use hybrid_rag::core::error::HybridRagError;
use hybrid_rag::rag::composer::{
    Composer, EvidenceBundle, NO_CONTEXT_STATEMENT, NO_DATA_STATEMENT, StructuredEvidence,
    format_evidence, summarize_query_result,
};
use hybrid_rag::rag::value::{QueryResult, Row};
use hybrid_rag::rag::vector::RetrievedPassage;
use support::{Reply, ScriptedGenerator};

fn one_scalar() -> QueryResult {
    QueryResult::from_rows(vec![Row::new().with("Name", "Metallica")])
}

fn tie() -> QueryResult {
    QueryResult::from_rows(vec![
        Row::new().with("Name", "Iron Maiden").with("AlbumCount", 2_i64),
        Row::new().with("Name", "Metallica").with("AlbumCount", 2_i64),
    ])
}

#[test]
fn single_row_single_column_is_a_single_value_sentence() {
    let summary = summarize_query_result(&one_scalar());
    assert_eq!(summary, "The result is: Metallica.");
}

#[test]
fn empty_result_is_the_no_data_statement() {
    assert_eq!(summarize_query_result(&QueryResult::default()), NO_DATA_STATEMENT);
}

#[test]
fn multi_row_result_is_a_key_value_listing() {
    let summary = summarize_query_result(&tie());
    assert_eq!(
        summary,
        "Database returned the following records:\n - Name: Iron Maiden, AlbumCount: 2\n - Name: Metallica, AlbumCount: 2"
    );
}

#[test]
fn single_row_with_two_columns_is_tabular() {
    let result = QueryResult::from_rows(vec![Row::new().with("Name", "AC/DC").with("AlbumCount", 1_i64)]);
    assert!(summarize_query_result(&result).starts_with("Database returned the following records:"));
}

#[test]
fn evidence_omits_document_section_when_passages_are_blank() {
    let bundle = EvidenceBundle::new(
        vec![RetrievedPassage::new("   ", "file:a.md#chunk0")],
        Some(StructuredEvidence {
            sql: "SELECT Name FROM Artist LIMIT 1".to_string(),
            result: one_scalar(),
        }),
    );
    let evidence = format_evidence(&bundle);
    assert!(!evidence.contains("Unstructured Context"));
    assert!(evidence.contains("## Structured Context (from database):\nThe result is: Metallica."));
    assert!(evidence.contains("```sql\nSELECT Name FROM Artist LIMIT 1\n```"));
}

#[test]
fn evidence_keeps_structured_section_for_executed_empty_result() {
    let bundle = EvidenceBundle::new(
        vec![],
        Some(StructuredEvidence {
            sql: "SELECT Title FROM Album WHERE ArtistId = 99".to_string(),
            result: QueryResult::default(),
        }),
    );
    let evidence = format_evidence(&bundle);
    assert!(evidence.contains(NO_DATA_STATEMENT));
    assert!(evidence.contains("ArtistId = 99"));
}

#[test]
fn evidence_without_sql_has_no_structured_section() {
    let bundle = EvidenceBundle::new(
        vec![RetrievedPassage::new("Metallica formed in Los Angeles in 1981.", "file:bands.md#chunk0")],
        None,
    );
    let evidence = format_evidence(&bundle);
    assert!(evidence.starts_with("## Unstructured Context (from documents):\n- Metallica formed"));
    assert!(!evidence.contains("Structured Context"));
    assert!(!evidence.contains("SQL used"));
}

#[test]
fn no_evidence_at_all_renders_explicit_statement() {
    assert_eq!(format_evidence(&EvidenceBundle::default()), NO_CONTEXT_STATEMENT);
}

#[test]
fn compose_trims_answer_and_reports_supplied_evidence() {
    let generator = ScriptedGenerator::new(
        Reply::Text(String::new()),
        Reply::Text("  I used nothing at all.  \n".to_string()),
    );
    let composer = Composer::new(&generator, "test-model");
    let bundle = EvidenceBundle::new(
        vec![
            RetrievedPassage::new(" Iron Maiden is a British band. ", "file:bands.md#chunk0"),
            RetrievedPassage::new("", "file:bands.md#chunk1"),
        ],
        Some(StructuredEvidence {
            sql: "SELECT Name FROM Artist".to_string(),
            result: tie(),
        }),
    );

    let (answer, provenance) = composer.compose("Who?", &bundle).unwrap();
    assert_eq!(answer, "I used nothing at all.");
    assert_eq!(provenance.sql.as_deref(), Some("SELECT Name FROM Artist"));
    assert_eq!(provenance.passages, vec!["Iron Maiden is a British band."]);

    let prompts = generator.answer_prompts();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.contains("User question: Who?"));
    assert!(prompt.contains("I don't know"));
    assert!(prompt.contains("According to the database"));
    assert!(prompt.contains("The document states"));
    assert!(prompt.contains("Include the SQL query if it was used."));
}

#[test]
fn compose_reports_empty_completion_as_generation_failure() {
    let generator = ScriptedGenerator::new(Reply::Text(String::new()), Reply::Text("   ".to_string()));
    let composer = Composer::new(&generator, "m");
    let err = composer.compose("q", &EvidenceBundle::default()).unwrap_err();
    assert!(matches!(err, HybridRagError::GenerationFailure(_)));
}

#[test]
fn compose_propagates_generation_error() {
    let generator = ScriptedGenerator::new(Reply::Text(String::new()), Reply::Fail("quota".to_string()));
    let composer = Composer::new(&generator, "m");
    let err = composer.compose("q", &EvidenceBundle::default()).unwrap_err();
    assert!(err.to_string().contains("quota"));
}
