//! Lexical search engine: term-heuristic ranking without embeddings.
//!
//! Scores chunks against a free-text query using word-boundary,
//! substring, and stem-prefix matching. No index is built; every call
//! scans the borrowed chunk slice, which is the right trade for a
//! corpus bounded at a few thousand chunks.
//!
//! # Scoring
//!
//! Per surviving query token (lowercased, length > 2):
//!
//! - `+3.0` per whole-word occurrence (word-boundary match)
//! - `+1.0` if the token occurs anywhere as a substring
//! - `+1.5` per word-prefix occurrence of the token's stem (trailing
//!   `ing`, `ed`, or `s` stripped), when the stem is longer than 2
//!
//! After token scoring: `+0.5` per distinct token (or its stem) found
//! anywhere in the chunk, and a flat `+0.2` when the chunk content
//! exceeds 200 characters. Zero-score chunks are excluded; the sort is
//! stable, so ties keep corpus order.

use crate::models::{Chunk, SearchHit};

/// Tokens at or below this length are discarded from the query.
const MIN_TOKEN_CHARS: usize = 2;

/// Content longer than this earns the flat length bonus.
const LENGTH_BONUS_THRESHOLD: usize = 200;

/// Rank `chunks` against `query`, returning at most `top_k` hits.
///
/// Total: an empty chunk set, a blank query, or a query with no token
/// longer than two characters yields an empty result, never an error.
pub fn search(chunks: &[Chunk], query: &str, top_k: usize) -> Vec<SearchHit> {
    if chunks.is_empty() || query.trim().is_empty() {
        return Vec::new();
    }

    let tokens = tokenize(query);
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit> = chunks
        .iter()
        .filter_map(|chunk| {
            let score = score_chunk(chunk, &tokens);
            if score > 0.0 {
                Some(SearchHit {
                    chunk: chunk.clone(),
                    score,
                })
            } else {
                None
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

/// Lowercase, whitespace-split, drop short tokens, dedupe in order.
fn tokenize(query: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for raw in query.to_lowercase().split_whitespace() {
        if raw.chars().count() <= MIN_TOKEN_CHARS {
            continue;
        }
        if !tokens.iter().any(|t| t == raw) {
            tokens.push(raw.to_string());
        }
    }
    tokens
}

fn score_chunk(chunk: &Chunk, tokens: &[String]) -> f64 {
    let content = chunk.content.to_lowercase();
    let mut score = 0.0;

    for token in tokens {
        let whole_words = count_matches(&content, token, true);
        score += 3.0 * whole_words as f64;

        if content.contains(token.as_str()) {
            score += 1.0;
        }

        let stem = stem(token);
        if stem.chars().count() > MIN_TOKEN_CHARS {
            let prefix_matches = count_matches(&content, stem, false);
            score += 1.5 * prefix_matches as f64;
        }

        // Coverage bonus: the token or its stem appears at all.
        if content.contains(token.as_str()) || content.contains(stem) {
            score += 0.5;
        }
    }

    if score > 0.0 && chunk.content.chars().count() > LENGTH_BONUS_THRESHOLD {
        score += 0.2;
    }

    score
}

/// Strip one trailing `ing`, `ed`, or `s`; unchanged if none applies.
fn stem(token: &str) -> &str {
    for suffix in ["ing", "ed", "s"] {
        if let Some(stripped) = token.strip_suffix(suffix) {
            return stripped;
        }
    }
    token
}

/// Count occurrences of `needle` in `haystack` that start at a word
/// boundary; with `require_end` the occurrence must also end at one.
fn count_matches(haystack: &str, needle: &str, require_end: bool) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack
        .match_indices(needle)
        .filter(|(idx, matched)| {
            let starts_word = haystack[..*idx]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());
            let ends_word = !require_end
                || haystack[idx + matched.len()..]
                    .chars()
                    .next()
                    .map_or(true, |c| !c.is_alphanumeric());
            starts_word && ends_word
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, content: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            document_id: "d1".to_string(),
            document_name: "doc".to_string(),
            content: content.to_string(),
            start_offset: 0,
            end_offset: content.chars().count(),
            hash: String::new(),
        }
    }

    #[test]
    fn test_empty_inputs_yield_empty_results() {
        assert!(search(&[], "machine", 5).is_empty());
        assert!(search(&[chunk("c1", "anything")], "", 5).is_empty());
        assert!(search(&[chunk("c1", "anything")], "   ", 5).is_empty());
    }

    #[test]
    fn test_short_tokens_are_discarded() {
        // Every token is <= 2 chars, so the query has no usable terms.
        assert!(search(&[chunk("c1", "it is an ok db")], "it is ok", 5).is_empty());
    }

    #[test]
    fn test_matching_chunk_outscores_unrelated() {
        let chunks = vec![
            chunk("c1", "Machine learning is great. Learning never stops."),
            chunk("c2", "Cooking pasta requires salted water and patience."),
        ];
        let hits = search(&chunks, "machine learning", 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, "c1");
    }

    #[test]
    fn test_whole_word_beats_substring() {
        let chunks = vec![
            chunk("sub", "The machinery hall hummed along quietly"),
            chunk("word", "The machine hall hummed along quietly "),
        ];
        let hits = search(&chunks, "machine", 5);
        assert_eq!(hits[0].chunk.id, "word");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_stem_prefix_matches_inflected_forms() {
        let chunks = vec![
            chunk("c1", "She was learning new things"),
            chunk("c2", "Entirely unrelated content here"),
        ];
        // "learns" stems to "learn", which prefix-matches "learning".
        let hits = search(&chunks, "learns", 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, "c1");
    }

    #[test]
    fn test_long_content_bonus() {
        let short = "machine ".to_string();
        let long = format!("machine {}", "filler ".repeat(40));
        let chunks = vec![chunk("short", &short), chunk("long", &long)];
        let hits = search(&chunks, "machine", 5);
        assert_eq!(hits[0].chunk.id, "long");
        assert!((hits[0].score - hits[1].score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let chunks = vec![
            chunk("first", "alpha beta gamma"),
            chunk("second", "alpha beta gamma"),
        ];
        let hits = search(&chunks, "alpha", 5);
        assert_eq!(hits[0].chunk.id, "first");
        assert_eq!(hits[1].chunk.id, "second");
    }

    #[test]
    fn test_top_k_truncates() {
        let chunks: Vec<Chunk> = (0..10)
            .map(|i| chunk(&format!("c{}", i), "relevant term here"))
            .collect();
        let hits = search(&chunks, "relevant", 3);
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_duplicate_query_tokens_do_not_double_score() {
        let chunks = vec![chunk("c1", "machine room")];
        let once = search(&chunks, "machine", 5);
        let twice = search(&chunks, "machine machine", 5);
        assert!((once[0].score - twice[0].score).abs() < 1e-9);
    }
}
