//! Vector search engine: cosine-similarity ranking over the parallel
//! embedding list.
//!
//! Chunk *i* scores against embedding *i*; a chunk past the end of the
//! embedding list (lexical-only tail) scores 0 rather than erroring.
//! Degenerate vectors never produce NaN: a zero norm or a length
//! mismatch is defined as similarity 0.

use crate::models::{Chunk, SearchHit};

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors, vectors of different lengths, or
/// when either norm is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Rank `chunks` by similarity of their embeddings to `query_embedding`.
///
/// Total: an empty chunk set or a missing/empty query embedding yields
/// an empty result. Missing embeddings score 0, so a corpus whose
/// embedding list is shorter than its chunk list still searches cleanly.
pub fn search(
    chunks: &[Chunk],
    query_embedding: &[f32],
    embeddings: &[Vec<f32>],
    top_k: usize,
) -> Vec<SearchHit> {
    if chunks.is_empty() || query_embedding.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let score = embeddings
                .get(i)
                .map(|e| cosine_similarity(query_embedding, e) as f64)
                .unwrap_or(0.0);
            SearchHit {
                chunk: chunk.clone(),
                score,
            }
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.truncate(top_k);
    hits
}
