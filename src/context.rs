//! Context assembly: turn ranked hits into one bounded, attributed
//! passage for the downstream generator.
//!
//! Each hit contributes `"[From: <document_name>]\n<content>"`,
//! blank-line separated from the previous entry. Assembly walks hits
//! in rank order and stops before the first entry that would push the
//! accumulated character length past the budget — a chunk is never
//! split to fit. If even the top hit exceeds the budget, the result is
//! the empty string.

use crate::models::SearchHit;

/// How many hits retrieval fetches for assembly, independent of any
/// display-facing `top_k`.
pub const RETRIEVAL_BREADTH: usize = 6;

/// Assemble a context passage from ranked hits under `max_chars`.
///
/// Total: an empty hit list yields an empty string.
pub fn assemble_context(hits: &[SearchHit], max_chars: usize) -> String {
    let mut assembled = String::new();
    let mut assembled_chars = 0usize;

    for hit in hits {
        let entry = format!("[From: {}]\n{}", hit.chunk.document_name, hit.chunk.content);
        let entry_chars = entry.chars().count();
        let separator_chars = if assembled.is_empty() { 0 } else { 2 };

        if assembled_chars + separator_chars + entry_chars > max_chars {
            break;
        }

        if !assembled.is_empty() {
            assembled.push_str("\n\n");
        }
        assembled.push_str(&entry);
        assembled_chars += separator_chars + entry_chars;
    }

    assembled
}
