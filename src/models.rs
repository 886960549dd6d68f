//! Core data models used throughout ragmill.
//!
//! These types represent the documents, chunks, and ranked results that
//! flow through the indexing and retrieval pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A document admitted to the corpus registry.
///
/// Created by the loader (or any caller) before the core boundary;
/// owned by the corpus manager; destroyed on explicit removal or
/// corpus clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document id (UUID string).
    pub id: String,
    /// Display name (typically the file stem).
    pub name: String,
    /// Full plain text of the document.
    pub text: String,
    /// Character count of `text` (not bytes).
    pub char_count: usize,
    /// Byte size of `text`.
    pub byte_size: usize,
    /// Set when acquisition failed; errored documents are never indexed.
    pub error: bool,
    /// Ingestion timestamp.
    pub added_at: DateTime<Utc>,
}

impl Document {
    /// Build a document from raw text, computing the size fields.
    pub fn from_text(
        id: impl Into<String>,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        Self {
            id: id.into(),
            name: name.into(),
            char_count: text.chars().count(),
            byte_size: text.len(),
            text,
            error: false,
            added_at: Utc::now(),
        }
    }
}

/// A bounded span of a document's text — the atomic retrieval unit.
///
/// Chunks are created only during an indexing pass and never mutated
/// afterwards; they die with their parent document or with the corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic id: `"<document_id>:<start_offset>"`.
    pub id: String,
    /// Parent document id.
    pub document_id: String,
    /// Parent document name, denormalized for display and attribution.
    pub document_name: String,
    /// The chunk text (trimmed).
    pub content: String,
    /// Start offset in the parent text, in characters.
    pub start_offset: usize,
    /// End offset in the parent text, in characters (exclusive).
    pub end_offset: usize,
    /// SHA-256 of `content`, used by snapshot integrity checks.
    pub hash: String,
}

/// A ranked chunk returned from one of the search engines.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f64,
}

/// Why a document was skipped during an indexing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The document carried the acquisition error flag.
    Errored,
    /// The document text was empty or whitespace-only.
    Empty,
    /// The document exceeded the per-document character ceiling.
    TooLarge { chars: usize, limit: usize },
    /// The global chunk ceiling was reached before this document.
    ChunkCeiling,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Errored => write!(f, "document carries an error flag"),
            FailureReason::Empty => write!(f, "document is empty"),
            FailureReason::TooLarge { chars, limit } => {
                write!(f, "document has {} chars, over the {} limit", chars, limit)
            }
            FailureReason::ChunkCeiling => write!(f, "global chunk ceiling reached"),
        }
    }
}

/// A per-document failure recorded during `index()`.
#[derive(Debug, Clone)]
pub struct DocumentFailure {
    pub document_id: String,
    pub document_name: String,
    pub reason: FailureReason,
}

/// Outcome of a completed indexing pass.
///
/// Per-item failures are recorded here rather than aborting the run;
/// a report with failures is still a successful `index()`.
#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    /// Documents that were chunked into the corpus.
    pub indexed_documents: usize,
    /// Documents skipped, with reasons.
    pub failed_documents: Vec<DocumentFailure>,
    /// Chunks produced across all indexed documents.
    pub chunk_count: usize,
    /// Embeddings actually produced by the provider.
    pub embedded_count: usize,
    /// Chunks that received an inert fallback vector after a failed
    /// embedding sub-batch; these rank only lexically.
    pub lexical_only_fallbacks: usize,
    /// Embedding sub-batches that failed outright.
    pub failed_embedding_batches: usize,
    /// Wall-clock time spent in `index()`.
    pub elapsed: std::time::Duration,
}
