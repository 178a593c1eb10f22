use hybrid_rag::core::error::HybridRagError;
use hybrid_rag::rag::ingest::load_corpus;
use hybrid_rag::rag::vector::{
    HashingEmbedder, InMemoryIndex, PassageIndex, RetrievedPassage, VectorRetriever,
};
use tempfile::tempdir;

fn corpus() -> Vec<RetrievedPassage> {
    vec![
        RetrievedPassage::new("Iron Maiden is an English heavy metal band formed in London.", "doc#0"),
        RetrievedPassage::new("Metallica is an American heavy metal band from Los Angeles.", "doc#1"),
        RetrievedPassage::new("AC/DC recorded Back in Black in the Bahamas.", "doc#2"),
        RetrievedPassage::new("Sourdough bread needs a long fermentation.", "doc#3"),
    ]
}

fn index() -> InMemoryIndex<HashingEmbedder> {
    InMemoryIndex::build(HashingEmbedder::new(256), corpus()).unwrap()
}

#[test]
fn nearest_passage_ranks_first_and_scores_descend() {
    let index = index();
    let results = VectorRetriever::new(&index).retrieve("Where was Metallica from? Los Angeles?", 3).unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].source, "doc#1");
    let scores: Vec<f32> = results.iter().map(|p| p.score.unwrap()).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{scores:?}");
}

#[test]
fn fewer_passages_than_k_returns_all() {
    let index = index();
    let results = VectorRetriever::new(&index).retrieve("band", 10).unwrap();
    assert_eq!(results.len(), 4);
}

#[test]
fn k_zero_and_empty_index_return_nothing() {
    let index = index();
    assert!(VectorRetriever::new(&index).retrieve("band", 0).unwrap().is_empty());

    let empty = InMemoryIndex::new(HashingEmbedder::new(16));
    assert!(empty.is_empty());
    assert!(VectorRetriever::new(&empty).retrieve("band", 3).unwrap().is_empty());
}

#[test]
fn ties_keep_insertion_order() {
    let passages = vec![
        RetrievedPassage::new("alpha", "first"),
        RetrievedPassage::new("alpha", "second"),
        RetrievedPassage::new("alpha", "third"),
    ];
    let index = InMemoryIndex::build(HashingEmbedder::new(32), passages).unwrap();
    let results = VectorRetriever::new(&index).retrieve("alpha", 3).unwrap();
    let sources: Vec<&str> = results.iter().map(|p| p.source.as_str()).collect();
    assert_eq!(sources, vec!["first", "second", "third"]);
}

#[test]
fn retrieval_is_deterministic() {
    let a = index();
    let b = index();
    let q = "English heavy metal";
    assert_eq!(
        VectorRetriever::new(&a).retrieve(q, 2).unwrap(),
        VectorRetriever::new(&b).retrieve(q, 2).unwrap()
    );
}

/// Index that ignores `k` and ordering, to check the wrapper's contract.
struct SloppyIndex;

impl PassageIndex for SloppyIndex {
    fn search(&self, _query: &str, _k: usize) -> Result<Vec<RetrievedPassage>, HybridRagError> {
        Ok(vec![
            RetrievedPassage::new("low", "a").with_score(0.1),
            RetrievedPassage::new("high", "b").with_score(0.9),
            RetrievedPassage::new("mid", "c").with_score(0.5),
        ])
    }

    fn len(&self) -> usize {
        3
    }
}

#[test]
fn retriever_enforces_k_and_order_on_any_index() {
    let results = VectorRetriever::new(&SloppyIndex).retrieve("q", 2).unwrap();
    let texts: Vec<&str> = results.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, vec!["high", "mid"]);
}

#[test]
fn corpus_loader_chunks_text_files_in_name_order() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("b_bands.md"), "Metallica formed in 1981.").unwrap();
    std::fs::write(dir.path().join("a_intro.txt"), "Heavy metal history.\n\nSecond paragraph.").unwrap();
    std::fs::write(dir.path().join("ignored.pdf"), "binary").unwrap();

    let passages = load_corpus(dir.path(), 512, 50).unwrap();
    let sources: Vec<&str> = passages.iter().map(|p| p.source.as_str()).collect();
    assert_eq!(sources, vec!["file:a_intro.txt#chunk0", "file:b_bands.md#chunk0"]);
    assert_eq!(passages[1].text, "Metallica formed in 1981.");
}

#[test]
fn missing_corpus_directory_is_empty_not_error() {
    let dir = tempdir().unwrap();
    let passages = load_corpus(&dir.path().join("missing"), 512, 50).unwrap();
    assert!(passages.is_empty());
}
