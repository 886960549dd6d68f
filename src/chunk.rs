//! Sliding-window text chunker with sentence-boundary snapping.
//!
//! Splits one document's text into overlapping [`Chunk`]s of roughly
//! `chunk_size` characters, preferring to end each chunk just past a
//! sentence terminator or newline near the window edge.
//!
//! # Algorithm
//!
//! 1. Slide a window of `chunk_size` characters from `start = 0`.
//! 2. If the naive right edge falls before the end of text, search the
//!    ±100-character region around it for the nearest sentence
//!    terminator (`.`, `?`, `!`); fall back to the nearest newline when
//!    no terminator is in range. Snap the edge just past the match.
//! 3. Trim the span; drop spans whose trimmed length is ≤ 50 characters
//!    (noise filter) instead of emitting them.
//! 4. Advance `start` to `actual_end - overlap`; if boundary snapping
//!    collapsed the window so that this does not strictly increase
//!    `start`, force `start = actual_end` to guarantee progress.
//! 5. Stop at `start >= len`, or after
//!    `ceil(len / (chunk_size - overlap)) + 100` iterations, returning
//!    whatever accumulated.
//!
//! All offsets and sizes are in characters, not bytes. The function is
//! pure and total: malformed configuration (`chunk_size == 0`) and
//! empty or whitespace-only text yield an empty sequence, and
//! `overlap >= chunk_size` is coerced to `chunk_size / 5`. Being
//! side-effect-free, it is safe to call concurrently for independent
//! documents.

use sha2::{Digest, Sha256};

use crate::config::ChunkingConfig;
use crate::models::Chunk;

/// How far around the naive window edge to look for a boundary.
const BOUNDARY_WINDOW: usize = 100;

/// Trimmed spans at or below this length are discarded as noise.
const MIN_CHUNK_CHARS: usize = 50;

/// Split `text` into overlapping chunks for `document_id`.
///
/// Returns chunks ordered by start offset. Each chunk id is
/// `"<document_id>:<start_offset>"`, deterministic across runs.
pub fn chunk_text(
    text: &str,
    document_id: &str,
    document_name: &str,
    config: &ChunkingConfig,
) -> Vec<Chunk> {
    if config.chunk_size == 0 {
        return Vec::new();
    }
    if text.trim().is_empty() {
        return Vec::new();
    }

    let chunk_size = config.chunk_size;
    let overlap = if config.overlap >= chunk_size {
        chunk_size / 5
    } else {
        config.overlap
    };

    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let step = chunk_size - overlap;
    let max_iterations = len.div_ceil(step) + 100;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut iterations = 0usize;

    while start < len && iterations < max_iterations {
        iterations += 1;

        let naive_end = (start + chunk_size).min(len);
        let actual_end = if naive_end < len {
            snap_to_boundary(&chars, start, naive_end, len)
        } else {
            naive_end
        };

        let span: String = chars[start..actual_end].iter().collect();
        let content = span.trim();
        if content.chars().count() > MIN_CHUNK_CHARS {
            chunks.push(make_chunk(
                document_id,
                document_name,
                content,
                start,
                actual_end,
            ));
        }

        let next_start = actual_end.saturating_sub(overlap);
        start = if next_start > start { next_start } else { actual_end };
    }

    chunks
}

/// Find the boundary nearest `naive_end` within the search window.
///
/// Sentence terminators win over newlines regardless of distance; the
/// returned edge sits just past the matched character. Falls back to
/// `naive_end` when the window holds neither.
fn snap_to_boundary(chars: &[char], start: usize, naive_end: usize, len: usize) -> usize {
    let lo = naive_end.saturating_sub(BOUNDARY_WINDOW).max(start);
    let hi = (naive_end + BOUNDARY_WINDOW).min(len);

    let nearest = |pred: fn(char) -> bool| -> Option<usize> {
        (lo..hi)
            .filter(|&i| pred(chars[i]))
            .min_by_key(|&i| i.abs_diff(naive_end))
    };

    let boundary = nearest(|c| matches!(c, '.' | '?' | '!')).or_else(|| nearest(|c| c == '\n'));

    match boundary {
        Some(pos) => pos + 1,
        None => naive_end,
    }
}

/// Create a single [`Chunk`] with a deterministic id and content hash.
fn make_chunk(
    document_id: &str,
    document_name: &str,
    content: &str,
    start: usize,
    end: usize,
) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: format!("{}:{}", document_id, start),
        document_id: document_id.to_string(),
        document_name: document_name.to_string(),
        content: content.to_string(),
        start_offset: start,
        end_offset: end,
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size,
            overlap,
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", "d1", "doc", &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn test_whitespace_only_text() {
        assert!(chunk_text("   \n\t  ", "d1", "doc", &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let text = "a".repeat(500);
        assert!(chunk_text(&text, "d1", "doc", &config(0, 0)).is_empty());
    }

    #[test]
    fn test_noise_filter_drops_short_spans() {
        // 40 trimmed characters, under the 50-character floor.
        let text = "Less than fifty characters live in here";
        assert!(chunk_text(text, "d1", "doc", &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn test_uniform_text_terminates_with_expected_count() {
        // Regression for the no-progress/boundary-snap case: no sentence
        // boundaries anywhere, so every edge is the naive one.
        let text = "A".repeat(1000);
        let chunks = chunk_text(&text, "d1", "doc", &ChunkingConfig::default());
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].content.chars().count(), 800);
        for c in &chunks {
            assert!(c.content.chars().count() > MIN_CHUNK_CHARS);
        }
    }

    #[test]
    fn test_snaps_to_sentence_terminator() {
        let text = format!("{}. {}", "a".repeat(780), "b".repeat(400));
        let chunks = chunk_text(&text, "d1", "doc", &ChunkingConfig::default());
        assert!(chunks.len() >= 2);
        // The '.' sits at offset 780, within ±100 of the naive edge 800.
        assert!(chunks[0].content.ends_with('.'));
        assert_eq!(chunks[0].end_offset, 781);
    }

    #[test]
    fn test_terminator_beats_closer_newline() {
        // '.' at 750, '\n' at 795: the terminator wins despite being
        // farther from the naive edge at 800.
        let mut text = "a".repeat(750);
        text.push('.');
        text.push_str(&"b".repeat(44));
        text.push('\n');
        text.push_str(&"c".repeat(400));
        let chunks = chunk_text(&text, "d1", "doc", &ChunkingConfig::default());
        assert_eq!(chunks[0].end_offset, 751);
        assert!(chunks[0].content.ends_with('.'));
    }

    #[test]
    fn test_newline_fallback() {
        let mut text = "a".repeat(790);
        text.push('\n');
        text.push_str(&"b".repeat(400));
        let chunks = chunk_text(&text, "d1", "doc", &ChunkingConfig::default());
        // No terminator in range, so the newline at 790 snaps the edge.
        assert_eq!(chunks[0].end_offset, 791);
    }

    #[test]
    fn test_overlap_between_consecutive_chunks() {
        let text = "A".repeat(1000);
        let chunks = chunk_text(&text, "d1", "doc", &ChunkingConfig::default());
        assert_eq!(chunks[1].start_offset, chunks[0].end_offset - 150);
    }

    #[test]
    fn test_overlap_coerced_when_too_large() {
        let text = "A".repeat(2000);
        let chunks = chunk_text(&text, "d1", "doc", &config(800, 900));
        // overlap coerces to 160 and progress stays monotonic.
        assert!(!chunks.is_empty());
        for pair in chunks.windows(2) {
            assert!(pair[1].start_offset > pair[0].start_offset);
        }
    }

    #[test]
    fn test_iteration_ceiling_bounds_work() {
        // Worst case for the default config is well under the ceiling;
        // a pathological tiny step still terminates.
        let text = "A".repeat(5000);
        let chunks = chunk_text(&text, "d1", "doc", &config(60, 59));
        assert!(!chunks.is_empty());
        let ceiling = 5000usize.div_ceil(1) + 100;
        assert!(chunks.len() <= ceiling);
    }

    #[test]
    fn test_ids_derive_from_document_and_offset() {
        let text = "A".repeat(1000);
        let chunks = chunk_text(&text, "doc-42", "notes", &ChunkingConfig::default());
        assert_eq!(chunks[0].id, "doc-42:0");
        assert_eq!(chunks[1].id, format!("doc-42:{}", chunks[1].start_offset));
        assert!(chunks.iter().all(|c| c.document_name == "notes"));
    }

    #[test]
    fn test_multibyte_text_uses_character_offsets() {
        let text = "é".repeat(900);
        let chunks = chunk_text(&text, "d1", "doc", &ChunkingConfig::default());
        assert_eq!(chunks[0].content.chars().count(), 800);
        assert_eq!(chunks[0].end_offset, 800);
    }

    #[test]
    fn test_deterministic() {
        let text = format!(
            "First sentence here. {} Another one? {}",
            "a".repeat(700),
            "b".repeat(700)
        );
        let first = chunk_text(&text, "d1", "doc", &ChunkingConfig::default());
        let second = chunk_text(&text, "d1", "doc", &ChunkingConfig::default());
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.content, b.content);
            assert_eq!(a.hash, b.hash);
        }
    }
}
