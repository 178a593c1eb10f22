//! Plain-text corpus loading and chunking for the passage index.

use crate::core::error::HybridRagError;
use crate::rag::vector::RetrievedPassage;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const SEPARATORS: &[&[char]] = &[&['\n', '\n'], &['\n'], &[' ']];
const CORPUS_EXTENSIONS: &[&str] = &["txt", "md"];

/// Last separator end inside `window` that lies beyond `min_end`.
fn find_break(window: &[char], min_end: usize) -> Option<usize> {
    for sep in SEPARATORS {
        if window.len() < sep.len() {
            continue;
        }
        for p in (0..=window.len() - sep.len()).rev() {
            let end = p + sep.len();
            if end <= min_end {
                break;
            }
            if &window[p..end] == *sep {
                return Some(end);
            }
        }
    }
    None
}

/// Split `text` into chunks of at most `chunk_size` characters, breaking at
/// paragraph, line, then word boundaries when possible. Consecutive chunks
/// share up to `overlap` characters. Blank chunks are dropped.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size - 1);
    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let hard_end = (start + chunk_size).min(chars.len());
        let end = if hard_end == chars.len() {
            hard_end
        } else {
            find_break(&chars[start..hard_end], overlap)
                .map(|offset| start + offset)
                .unwrap_or(hard_end)
        };

        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if end == chars.len() {
            break;
        }
        start = end - overlap;
    }
    chunks
}

/// Load `.txt` and `.md` files from `dir` (sorted by file name) as passages.
/// A missing directory yields an empty corpus.
pub fn load_corpus(dir: &Path, chunk_size: usize, overlap: usize) -> Result<Vec<RetrievedPassage>, HybridRagError> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "corpus directory not found; passage index will be empty");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let wanted = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| CORPUS_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false);
        if path.is_file() && wanted {
            files.push(path);
        }
    }
    files.sort();

    let mut passages = Vec::new();
    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let content = fs::read_to_string(path)?;
        for (i, chunk) in chunk_text(&content, chunk_size, overlap).into_iter().enumerate() {
            passages.push(RetrievedPassage::new(chunk, format!("file:{}#chunk{}", name, i)));
        }
    }
    info!(files = files.len(), chunks = passages.len(), "loaded corpus");
    Ok(passages)
}
