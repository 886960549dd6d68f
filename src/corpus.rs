//! The corpus manager: bounded in-memory owner of documents, chunks,
//! and embeddings, and the indexing pipeline over them.
//!
//! A [`CorpusManager`] is constructed explicitly by the caller and
//! passed by reference — there is no ambient global. Mutations take
//! `&mut self` and reads take `&self`, so the borrow checker enforces
//! the single-writer/many-reader discipline the parallel chunk and
//! embedding lists require: they are swapped as a pair and can never
//! be observed half-updated.
//!
//! # Indexing pipeline
//!
//! `index()` rebuilds chunks and embeddings from scratch:
//!
//! 1. Discard the previous generation.
//! 2. Chunk the registry in fixed-size document batches, skipping (and
//!    recording) errored, empty, or oversized documents.
//! 3. Enforce the global chunk ceiling; documents past it are recorded
//!    as failed rather than partially chunked.
//! 4. Embed chunk text in fixed-size sub-batches with a small
//!    inter-call delay, stopping at the embedding ceiling (the tail
//!    stays lexical-only). A failed sub-batch substitutes inert zero
//!    vectors — cosine scores 0 against everything, so those chunks
//!    rank only lexically — and is recorded in the report.
//! 5. Check the wall-clock deadline at every batch boundary.
//!
//! Fail-closed policy: on timeout or any pipeline-fatal failure the
//! chunk and embedding lists are reset to empty (trivially consistent)
//! while the document registry is retained, so the caller can adjust
//! and retry. A completed mutation always leaves
//! `embeddings.len() <= chunks.len()` with entry *i* describing chunk
//! *i*.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::chunk::chunk_text;
use crate::config::{ChunkingConfig, CorpusConfig};
use crate::context::{assemble_context, RETRIEVAL_BREADTH};
use crate::embedding::EmbeddingClient;
use crate::error::{Error, Result};
use crate::models::{
    Chunk, Document, DocumentFailure, FailureReason, IndexReport, SearchHit,
};
use crate::progress::{IndexProgressEvent, IndexProgressReporter, NoProgress};
use crate::{lexical, vector};

/// Owner of the corpus: document registry, chunk list, embedding list.
pub struct CorpusManager {
    chunking: ChunkingConfig,
    limits: CorpusConfig,
    documents: Vec<Document>,
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
}

impl CorpusManager {
    pub fn new(chunking: ChunkingConfig, limits: CorpusConfig) -> Self {
        Self {
            chunking,
            limits,
            documents: Vec::new(),
            chunks: Vec::new(),
            embeddings: Vec::new(),
        }
    }

    // ---- document lifecycle ----

    /// Admit a batch of documents to the registry.
    ///
    /// Errored and empty documents are dropped from the batch first.
    /// If admitting the remainder would push the total character volume
    /// past the ceiling, the **entire** batch is rejected unchanged
    /// with [`Error::Capacity`] — no partial admission. Returns the
    /// number of documents admitted.
    pub fn add_documents(&mut self, docs: Vec<Document>) -> Result<usize> {
        let admissible: Vec<Document> = docs
            .into_iter()
            .filter(|d| !d.error && !d.text.trim().is_empty())
            .collect();

        let incoming: usize = admissible.iter().map(|d| d.char_count).sum();
        let current = self.total_chars();
        if current + incoming > self.limits.max_total_chars {
            return Err(Error::Capacity {
                what: "total characters",
                observed: current + incoming,
                limit: self.limits.max_total_chars,
            });
        }

        let admitted = admissible.len();
        self.documents.extend(admissible);
        debug!(admitted, total = self.documents.len(), "documents admitted");
        Ok(admitted)
    }

    /// Remove a document and cascade to its chunks and, by position,
    /// exactly the embeddings aligned with them.
    ///
    /// Returns `false` when no document with `id` exists. The chunk and
    /// embedding lists stay contiguous and aligned afterwards.
    pub fn remove_document(&mut self, id: &str) -> bool {
        let Some(pos) = self.documents.iter().position(|d| d.id == id) else {
            return false;
        };
        self.documents.remove(pos);

        let old_chunks = std::mem::take(&mut self.chunks);
        let old_embeddings = std::mem::take(&mut self.embeddings);
        let embedded_len = old_embeddings.len();
        let mut embeddings_iter = old_embeddings.into_iter();

        for (i, chunk) in old_chunks.into_iter().enumerate() {
            let embedding = if i < embedded_len {
                embeddings_iter.next()
            } else {
                None
            };
            if chunk.document_id != id {
                self.chunks.push(chunk);
                if let Some(e) = embedding {
                    self.embeddings.push(e);
                }
            }
        }

        debug_assert!(self.embeddings.len() <= self.chunks.len());
        true
    }

    /// Empty the registry, the chunk list, and the embedding list.
    pub fn clear(&mut self) {
        self.documents.clear();
        self.chunks.clear();
        self.embeddings.clear();
    }

    // ---- indexing ----

    /// Rebuild chunks and embeddings from the registry.
    ///
    /// Pass `None` as the embedder to index lexical-only. See the
    /// module docs for the pipeline stages and the fail-closed policy.
    pub async fn index(
        &mut self,
        embedder: Option<&dyn EmbeddingClient>,
    ) -> Result<IndexReport> {
        self.index_with_progress(embedder, &NoProgress).await
    }

    /// [`index`](Self::index) with progress reported at batch boundaries.
    pub async fn index_with_progress(
        &mut self,
        embedder: Option<&dyn EmbeddingClient>,
        progress: &dyn IndexProgressReporter,
    ) -> Result<IndexReport> {
        let started = Instant::now();
        let deadline = Duration::from_secs(self.limits.deadline_secs);

        // Discard the previous generation up front: this is a
        // rebuild-from-scratch pipeline, not an incremental one.
        self.chunks.clear();
        self.embeddings.clear();

        let mut report = IndexReport::default();

        self.chunk_documents(&mut report, started, deadline, progress)?;
        report.chunk_count = self.chunks.len();

        if !self.chunks.is_empty() {
            if let Some(embedder) = embedder {
                self.embed_chunks(embedder, &mut report, started, deadline, progress)
                    .await?;
            }
        }

        if self.embeddings.len() > self.chunks.len() {
            let msg = format!(
                "{} embeddings for {} chunks",
                self.embeddings.len(),
                self.chunks.len()
            );
            self.fail_closed();
            return Err(Error::Integrity(msg));
        }

        report.elapsed = started.elapsed();
        info!(
            documents = report.indexed_documents,
            failed = report.failed_documents.len(),
            chunks = report.chunk_count,
            embedded = report.embedded_count,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "index pass complete"
        );
        Ok(report)
    }

    /// Chunking stage: registry → chunk list, in document batches.
    fn chunk_documents(
        &mut self,
        report: &mut IndexReport,
        started: Instant,
        deadline: Duration,
        progress: &dyn IndexProgressReporter,
    ) -> Result<()> {
        let total = self.documents.len();
        let mut produced: Vec<Chunk> = Vec::new();
        let mut ceiling_reached = false;
        let mut start = 0usize;

        while start < total {
            if started.elapsed() > deadline {
                self.fail_closed();
                return Err(Error::Timeout {
                    budget_secs: self.limits.deadline_secs,
                });
            }

            let end = (start + self.limits.doc_batch_size).min(total);
            for i in start..end {
                let doc = &self.documents[i];

                let reason = if doc.error {
                    Some(FailureReason::Errored)
                } else if doc.text.trim().is_empty() {
                    Some(FailureReason::Empty)
                } else if doc.char_count > self.limits.max_doc_chars {
                    Some(FailureReason::TooLarge {
                        chars: doc.char_count,
                        limit: self.limits.max_doc_chars,
                    })
                } else if ceiling_reached {
                    Some(FailureReason::ChunkCeiling)
                } else {
                    None
                };

                if let Some(reason) = reason {
                    warn!(document = %doc.name, %reason, "document skipped");
                    report.failed_documents.push(DocumentFailure {
                        document_id: doc.id.clone(),
                        document_name: doc.name.clone(),
                        reason,
                    });
                    continue;
                }

                let doc_chunks = chunk_text(&doc.text, &doc.id, &doc.name, &self.chunking);
                if produced.len() + doc_chunks.len() > self.limits.max_chunks {
                    // Never partially chunk a document; everything from
                    // here on is recorded against the ceiling.
                    ceiling_reached = true;
                    warn!(
                        document = %doc.name,
                        limit = self.limits.max_chunks,
                        "chunk ceiling reached"
                    );
                    report.failed_documents.push(DocumentFailure {
                        document_id: doc.id.clone(),
                        document_name: doc.name.clone(),
                        reason: FailureReason::ChunkCeiling,
                    });
                    continue;
                }

                produced.extend(doc_chunks);
                report.indexed_documents += 1;
            }

            progress.report(IndexProgressEvent::Chunking { done: end, total });
            start = end;
        }

        self.chunks = produced;
        Ok(())
    }

    /// Embedding stage: chunk list → parallel embedding list, in
    /// provider sub-batches with rate limiting.
    async fn embed_chunks(
        &mut self,
        embedder: &dyn EmbeddingClient,
        report: &mut IndexReport,
        started: Instant,
        deadline: Duration,
        progress: &dyn IndexProgressReporter,
    ) -> Result<()> {
        let target = self.chunks.len().min(self.limits.max_embeddings);
        if target < self.chunks.len() {
            info!(
                limit = self.limits.max_embeddings,
                lexical_only = self.chunks.len() - target,
                "embedding ceiling leaves a lexical-only tail"
            );
        }

        let mut pos = 0usize;
        while pos < target {
            if started.elapsed() > deadline {
                self.fail_closed();
                return Err(Error::Timeout {
                    budget_secs: self.limits.deadline_secs,
                });
            }

            if pos > 0 && self.limits.embed_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.limits.embed_delay_ms)).await;
            }

            let end = (pos + self.limits.embed_batch_size).min(target);
            // Batch-scoped buffer; dropped when the iteration ends.
            let texts: Vec<String> = self.chunks[pos..end]
                .iter()
                .map(|c| c.content.clone())
                .collect();

            match embedder.embed_batch(&texts).await {
                Ok(vectors) if vectors.len() == texts.len() => {
                    self.embeddings.extend(vectors);
                    report.embedded_count += end - pos;
                }
                Ok(vectors) => {
                    warn!(
                        expected = texts.len(),
                        got = vectors.len(),
                        "embedding batch returned wrong count, substituting fallbacks"
                    );
                    self.push_fallbacks(embedder, end - pos, report);
                }
                Err(e) => {
                    warn!(error = %e, "embedding batch failed, substituting fallbacks");
                    self.push_fallbacks(embedder, end - pos, report);
                }
            }

            progress.report(IndexProgressEvent::Embedding { done: end, total: target });
            pos = end;
        }

        Ok(())
    }

    /// Substitute inert zero vectors for a failed sub-batch so the
    /// lists stay aligned; the affected chunks rank only lexically.
    fn push_fallbacks(
        &mut self,
        embedder: &dyn EmbeddingClient,
        count: usize,
        report: &mut IndexReport,
    ) {
        let dims = embedder.dims();
        for _ in 0..count {
            self.embeddings.push(vec![0.0; dims]);
        }
        report.lexical_only_fallbacks += count;
        report.failed_embedding_batches += 1;
    }

    /// Reset the derived state after a pipeline-fatal failure; the
    /// registry is retained so the caller can retry.
    fn fail_closed(&mut self) {
        self.chunks.clear();
        self.embeddings.clear();
    }

    // ---- search & context ----

    /// Rank chunks lexically against `query`.
    pub fn search_lexical(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        lexical::search(&self.chunks, query, top_k)
    }

    /// Rank chunks by cosine similarity to `query_embedding`.
    pub fn search_vector(&self, query_embedding: &[f32], top_k: usize) -> Vec<SearchHit> {
        vector::search(&self.chunks, query_embedding, &self.embeddings, top_k)
    }

    /// Assemble a lexical-retrieval context passage under `max_chars`.
    pub fn lexical_context(&self, query: &str, max_chars: usize) -> String {
        let hits = lexical::search(&self.chunks, query, RETRIEVAL_BREADTH);
        assemble_context(&hits, max_chars)
    }

    /// Assemble a vector-retrieval context passage under `max_chars`.
    pub fn vector_context(&self, query_embedding: &[f32], max_chars: usize) -> String {
        let hits = vector::search(
            &self.chunks,
            query_embedding,
            &self.embeddings,
            RETRIEVAL_BREADTH,
        );
        assemble_context(&hits, max_chars)
    }

    // ---- accessors for persistence layering ----

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    /// Replace the document registry (snapshot restore).
    pub fn replace_documents(&mut self, documents: Vec<Document>) {
        self.documents = documents;
    }

    /// Replace the chunk list (snapshot restore).
    ///
    /// Clears the embedding list — embeddings describe chunk positions
    /// and must be restored after the chunks they belong to. Every
    /// chunk's parent must exist in the registry.
    pub fn replace_chunks(&mut self, chunks: Vec<Chunk>) -> Result<()> {
        for chunk in &chunks {
            if !self.documents.iter().any(|d| d.id == chunk.document_id) {
                return Err(Error::Integrity(format!(
                    "chunk {} references unknown document {}",
                    chunk.id, chunk.document_id
                )));
            }
        }
        self.chunks = chunks;
        self.embeddings.clear();
        Ok(())
    }

    /// Replace the embedding list (snapshot restore).
    ///
    /// The list may be at most as long as the chunk list.
    pub fn replace_embeddings(&mut self, embeddings: Vec<Vec<f32>>) -> Result<()> {
        if embeddings.len() > self.chunks.len() {
            return Err(Error::Integrity(format!(
                "{} embeddings for {} chunks",
                embeddings.len(),
                self.chunks.len()
            )));
        }
        self.embeddings = embeddings;
        Ok(())
    }

    // ---- stats ----

    /// Total character volume held by the registry.
    pub fn total_chars(&self) -> usize {
        self.documents.iter().map(|d| d.char_count).sum()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn embedding_count(&self) -> usize {
        self.embeddings.len()
    }

    /// True only when both chunks and embeddings are present.
    pub fn is_available(&self) -> bool {
        !self.chunks.is_empty() && !self.embeddings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic test embedder: vector `[text_len, 1.0]`, with an
    /// optional set of call indices that fail.
    struct TestEmbedder {
        calls: AtomicUsize,
        fail_calls: Vec<usize>,
    }

    impl TestEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_calls: Vec::new(),
            }
        }

        fn failing_on(fail_calls: Vec<usize>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_calls,
            }
        }
    }

    #[async_trait]
    impl EmbeddingClient for TestEmbedder {
        fn model_name(&self) -> &str {
            "test-embedder"
        }

        fn dims(&self) -> usize {
            2
        }

        async fn embed(&self, text: &str) -> crate::error::Result<Vec<f32>> {
            Ok(vec![text.chars().count() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_calls.contains(&call) {
                return Err(Error::Provider("test batch failure".into()));
            }
            Ok(texts
                .iter()
                .map(|t| vec![t.chars().count() as f32, 1.0])
                .collect())
        }
    }

    fn doc(id: &str, name: &str, text: String) -> Document {
        Document::from_text(id, name, text)
    }

    fn sentence_text(paragraphs: usize) -> String {
        (0..paragraphs)
            .map(|i| format!("Paragraph {} talks about retrieval engines at length. {}", i, "word ".repeat(120)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn manager() -> CorpusManager {
        CorpusManager::new(ChunkingConfig::default(), CorpusConfig::default())
    }

    fn manager_with(limits: CorpusConfig) -> CorpusManager {
        CorpusManager::new(ChunkingConfig::default(), limits)
    }

    #[test]
    fn test_add_filters_errored_and_empty() {
        let mut mgr = manager();
        let mut errored = doc("e1", "bad", sentence_text(2));
        errored.error = true;
        let docs = vec![
            errored,
            doc("e2", "blank", "   ".to_string()),
            doc("d1", "good", sentence_text(2)),
        ];
        let admitted = mgr.add_documents(docs).unwrap();
        assert_eq!(admitted, 1);
        assert_eq!(mgr.document_count(), 1);
        assert_eq!(mgr.documents()[0].id, "d1");
    }

    #[test]
    fn test_capacity_rejects_whole_batch_unchanged() {
        let limits = CorpusConfig {
            max_total_chars: 1_000,
            ..Default::default()
        };
        let mut mgr = manager_with(limits);
        mgr.add_documents(vec![doc("d1", "small", "x".repeat(400))])
            .unwrap();

        // 400 + 300 + 500 > 1000: the whole batch bounces, including
        // the document that would have fit alone.
        let result = mgr.add_documents(vec![
            doc("d2", "fits", "y".repeat(300)),
            doc("d3", "breaks", "z".repeat(500)),
        ]);
        assert!(matches!(result, Err(Error::Capacity { .. })));
        assert_eq!(mgr.document_count(), 1);
        assert_eq!(mgr.total_chars(), 400);
    }

    #[tokio::test]
    async fn test_index_aligns_chunks_and_embeddings() {
        let mut mgr = manager();
        mgr.add_documents(vec![
            doc("d1", "one", sentence_text(3)),
            doc("d2", "two", sentence_text(2)),
            doc("d3", "three", sentence_text(4)),
        ])
        .unwrap();

        let embedder = TestEmbedder::new();
        let report = mgr.index(Some(&embedder)).await.unwrap();

        assert_eq!(report.indexed_documents, 3);
        assert!(report.failed_documents.is_empty());
        assert!(report.chunk_count > 0);
        assert_eq!(mgr.chunk_count(), mgr.embedding_count());
        assert_eq!(report.embedded_count, report.chunk_count);
        assert!(mgr.is_available());
    }

    #[tokio::test]
    async fn test_index_without_embedder_is_lexical_only() {
        let mut mgr = manager();
        mgr.add_documents(vec![doc("d1", "one", sentence_text(3))])
            .unwrap();

        let report = mgr.index(None).await.unwrap();
        assert!(report.chunk_count > 0);
        assert_eq!(mgr.embedding_count(), 0);
        assert!(!mgr.is_available());
        assert!(!mgr.search_lexical("retrieval engines", 5).is_empty());
    }

    #[tokio::test]
    async fn test_index_rebuilds_from_scratch() {
        let mut mgr = manager();
        mgr.add_documents(vec![doc("d1", "one", sentence_text(3))])
            .unwrap();
        let embedder = TestEmbedder::new();
        mgr.index(Some(&embedder)).await.unwrap();
        let first_count = mgr.chunk_count();

        mgr.index(Some(&embedder)).await.unwrap();
        assert_eq!(mgr.chunk_count(), first_count);
        assert_eq!(mgr.embedding_count(), first_count);
    }

    #[tokio::test]
    async fn test_index_skips_oversized_documents() {
        let limits = CorpusConfig {
            max_doc_chars: 1_000,
            ..Default::default()
        };
        let mut mgr = manager_with(limits);
        mgr.add_documents(vec![
            doc("big", "big", "x".repeat(5_000)),
            doc("ok", "ok", sentence_text(2)),
        ])
        .unwrap();

        let report = mgr.index(None).await.unwrap();
        assert_eq!(report.indexed_documents, 1);
        assert_eq!(report.failed_documents.len(), 1);
        assert!(matches!(
            report.failed_documents[0].reason,
            FailureReason::TooLarge { .. }
        ));
        assert!(mgr.chunks().iter().all(|c| c.document_id == "ok"));
    }

    #[tokio::test]
    async fn test_chunk_ceiling_fails_documents_whole() {
        let limits = CorpusConfig {
            max_chunks: 2,
            ..Default::default()
        };
        let mut mgr = manager_with(limits);
        mgr.add_documents(vec![
            doc("d1", "one", sentence_text(2)),
            doc("d2", "two", sentence_text(6)),
            doc("d3", "three", sentence_text(2)),
        ])
        .unwrap();

        let report = mgr.index(None).await.unwrap();
        // The first document to cross the ceiling fails whole, as does
        // every document after it; nothing is partially chunked.
        assert!(report
            .failed_documents
            .iter()
            .any(|f| f.reason == FailureReason::ChunkCeiling));
        assert!(mgr.chunk_count() <= 2);
        assert!(mgr.chunks().iter().all(|c| c.document_id == "d1"));
    }

    #[tokio::test]
    async fn test_embedding_ceiling_leaves_lexical_tail() {
        let limits = CorpusConfig {
            max_embeddings: 2,
            embed_delay_ms: 0,
            ..Default::default()
        };
        let mut mgr = manager_with(limits);
        mgr.add_documents(vec![doc("d1", "one", sentence_text(8))])
            .unwrap();

        let embedder = TestEmbedder::new();
        let report = mgr.index(Some(&embedder)).await.unwrap();
        assert!(report.chunk_count > 2);
        assert_eq!(mgr.embedding_count(), 2);
        // Vector search stays total over the lexical-only tail.
        let hits = mgr.search_vector(&[100.0, 1.0], 10);
        assert_eq!(hits.len(), 10.min(report.chunk_count));
    }

    #[tokio::test]
    async fn test_failed_batch_substitutes_inert_fallbacks() {
        let limits = CorpusConfig {
            embed_batch_size: 1,
            embed_delay_ms: 0,
            ..Default::default()
        };
        let mut mgr = manager_with(limits);
        mgr.add_documents(vec![doc("d1", "one", sentence_text(3))])
            .unwrap();

        // Fail the second single-chunk sub-batch.
        let embedder = TestEmbedder::failing_on(vec![1]);
        let report = mgr.index(Some(&embedder)).await.unwrap();

        assert_eq!(mgr.chunk_count(), mgr.embedding_count());
        assert_eq!(report.lexical_only_fallbacks, 1);
        assert_eq!(report.failed_embedding_batches, 1);
        assert!(mgr.embeddings()[1].iter().all(|v| *v == 0.0));

        // The fallback never outranks a real match.
        let query = vec![mgr.chunks()[0].content.chars().count() as f32, 1.0];
        let hits = mgr.search_vector(&query, mgr.chunk_count());
        assert_eq!(hits.last().unwrap().score, 0.0);
        assert!(hits[0].score > 0.0);
    }

    #[tokio::test]
    async fn test_deadline_fails_closed_keeping_registry() {
        let limits = CorpusConfig {
            deadline_secs: 0,
            ..Default::default()
        };
        let mut mgr = manager_with(limits);
        mgr.add_documents(vec![doc("d1", "one", sentence_text(3))])
            .unwrap();

        let result = mgr.index(None).await;
        assert!(matches!(result, Err(Error::Timeout { .. })));
        assert_eq!(mgr.chunk_count(), 0);
        assert_eq!(mgr.embedding_count(), 0);
        assert_eq!(mgr.document_count(), 1);
        assert!(!mgr.is_available());
    }

    #[tokio::test]
    async fn test_remove_document_cascades_positionally() {
        let mut mgr = manager();
        mgr.add_documents(vec![
            doc("d1", "one", sentence_text(3)),
            doc("d2", "two", sentence_text(3)),
        ])
        .unwrap();
        let embedder = TestEmbedder::new();
        mgr.index(Some(&embedder)).await.unwrap();

        let d2_chunks: Vec<String> = mgr
            .chunks()
            .iter()
            .filter(|c| c.document_id == "d2")
            .map(|c| c.id.clone())
            .collect();
        let expected_remaining = mgr.chunk_count() - d2_chunks.len();

        assert!(mgr.remove_document("d2"));
        assert_eq!(mgr.chunk_count(), expected_remaining);
        assert_eq!(mgr.embedding_count(), expected_remaining);
        assert!(mgr.chunks().iter().all(|c| c.document_id == "d1"));
        assert_eq!(mgr.document_count(), 1);

        // Surviving embeddings still describe their own chunks.
        for (chunk, embedding) in mgr.chunks().iter().zip(mgr.embeddings()) {
            assert_eq!(embedding[0], chunk.content.chars().count() as f32);
        }
    }

    #[test]
    fn test_remove_unknown_document() {
        let mut mgr = manager();
        assert!(!mgr.remove_document("ghost"));
    }

    #[tokio::test]
    async fn test_clear_empties_everything() {
        let mut mgr = manager();
        mgr.add_documents(vec![doc("d1", "one", sentence_text(3))])
            .unwrap();
        let embedder = TestEmbedder::new();
        mgr.index(Some(&embedder)).await.unwrap();

        mgr.clear();
        assert_eq!(mgr.document_count(), 0);
        assert_eq!(mgr.chunk_count(), 0);
        assert_eq!(mgr.embedding_count(), 0);
    }

    #[test]
    fn test_replace_chunks_validates_parents() {
        let mut mgr = manager();
        let orphan = Chunk {
            id: "ghost:0".to_string(),
            document_id: "ghost".to_string(),
            document_name: "ghost".to_string(),
            content: "orphaned".to_string(),
            start_offset: 0,
            end_offset: 8,
            hash: String::new(),
        };
        assert!(matches!(
            mgr.replace_chunks(vec![orphan]),
            Err(Error::Integrity(_))
        ));
    }

    #[test]
    fn test_replace_embeddings_validates_length() {
        let mut mgr = manager();
        assert!(matches!(
            mgr.replace_embeddings(vec![vec![1.0]]),
            Err(Error::Integrity(_))
        ));
    }

    #[tokio::test]
    async fn test_context_assembly_respects_budget() {
        let mut mgr = manager();
        mgr.add_documents(vec![doc("d1", "one", sentence_text(4))])
            .unwrap();
        mgr.index(None).await.unwrap();

        let context = mgr.lexical_context("retrieval engines", 500);
        assert!(context.chars().count() <= 500);
    }
}
