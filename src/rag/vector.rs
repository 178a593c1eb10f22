//! Semantic passage retrieval.
//!
//! The retriever treats the index as an opaque nearest-neighbour oracle
//! behind [`PassageIndex`]. [`InMemoryIndex`] with [`HashingEmbedder`] is the
//! built-in offline implementation; other embedders or indexes plug in
//! through the same traits.

use crate::core::error::HybridRagError;
use rustc_hash::FxHasher;
use serde::Serialize;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedPassage {
    pub text: String,
    /// e.g. `file:artists.md#chunk0`
    pub source: String,
    pub score: Option<f32>,
}

impl RetrievedPassage {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            score: None,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// Nearest-neighbour lookup over a populated passage index.
pub trait PassageIndex: Send + Sync {
    /// At most `k` passages, most similar first.
    fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>, HybridRagError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, HybridRagError>;
}

/// Feature-hashing bag-of-words embedder.
///
/// Lowercased alphanumeric tokens are hashed into `dimensions` buckets and
/// the vector is L2-normalized. Deterministic across runs on the same target;
/// `FxHasher` output depends on pointer width.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, HybridRagError> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokenize(text) {
            let mut hasher = FxHasher::default();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimensions as u64) as usize;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let nb = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

struct IndexedPassage {
    passage: RetrievedPassage,
    vector: Vec<f32>,
}

/// Brute-force cosine index held in insertion order.
pub struct InMemoryIndex<E: Embedder> {
    embedder: E,
    entries: Vec<IndexedPassage>,
}

impl<E: Embedder> InMemoryIndex<E> {
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
        }
    }

    pub fn build(embedder: E, passages: Vec<RetrievedPassage>) -> Result<Self, HybridRagError> {
        let mut index = Self::new(embedder);
        for passage in passages {
            index.insert(passage)?;
        }
        Ok(index)
    }

    pub fn insert(&mut self, passage: RetrievedPassage) -> Result<(), HybridRagError> {
        let vector = self.embedder.embed(&passage.text)?;
        self.entries.push(IndexedPassage {
            passage: RetrievedPassage {
                score: None,
                ..passage
            },
            vector,
        });
        Ok(())
    }
}

impl<E: Embedder> PassageIndex for InMemoryIndex<E> {
    fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>, HybridRagError> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed(query)?;
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine(&query_vec, &e.vector)))
            .collect();
        // Stable: equal scores keep insertion order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| self.entries[i].passage.clone().with_score(score))
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Contract wrapper over any [`PassageIndex`].
///
/// Whatever the index returns, callers get at most `k` passages in
/// descending score order (ties in the order the index gave them).
pub struct VectorRetriever<'a> {
    index: &'a dyn PassageIndex,
}

impl<'a> VectorRetriever<'a> {
    pub fn new(index: &'a dyn PassageIndex) -> Self {
        Self { index }
    }

    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>, HybridRagError> {
        if k == 0 || self.index.is_empty() {
            return Ok(Vec::new());
        }
        let mut passages = self.index.search(query, k)?;
        if passages.iter().all(|p| p.score.is_some()) {
            passages.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(Ordering::Equal)
            });
        }
        passages.truncate(k);
        Ok(passages)
    }
}
