//! JSON snapshot persistence, layered on the corpus accessors.
//!
//! The core only exposes get/replace primitives for its three lists;
//! this module turns them into a durable snapshot without the manager
//! knowing the storage medium. The CLI saves a snapshot after every
//! mutating command and loads it before every command, which is what
//! carries corpus state between invocations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::corpus::CorpusManager;
use crate::models::{Chunk, Document};

/// A point-in-time copy of the corpus, serializable as JSON.
#[derive(Debug, Serialize, Deserialize)]
pub struct CorpusSnapshot {
    /// When the snapshot was captured.
    pub created_at: DateTime<Utc>,
    /// Embedding model the vectors came from, if any.
    pub embedding_model: Option<String>,
    pub documents: Vec<Document>,
    pub chunks: Vec<Chunk>,
    pub embeddings: Vec<Vec<f32>>,
}

impl CorpusSnapshot {
    /// Capture the manager's current state through its get accessors.
    pub fn capture(manager: &CorpusManager, embedding_model: Option<String>) -> Self {
        Self {
            created_at: Utc::now(),
            embedding_model,
            documents: manager.documents().to_vec(),
            chunks: manager.chunks().to_vec(),
            embeddings: manager.embeddings().to_vec(),
        }
    }

    /// Restore this snapshot into `manager` through its replace
    /// accessors, inheriting their alignment validation.
    pub fn restore(self, manager: &mut CorpusManager) -> Result<()> {
        manager.replace_documents(self.documents);
        manager
            .replace_chunks(self.chunks)
            .context("snapshot chunks are inconsistent")?;
        manager
            .replace_embeddings(self.embeddings)
            .context("snapshot embeddings are inconsistent")?;
        Ok(())
    }

    /// Write the snapshot as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write snapshot: {}", path.display()))?;
        Ok(())
    }

    /// Read a snapshot from disk; `Ok(None)` when the file is absent.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot: {}", path.display()))?;
        let snapshot = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse snapshot: {}", path.display()))?;
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChunkingConfig, CorpusConfig};
    use crate::models::Document;

    fn manager_with_corpus() -> CorpusManager {
        let mut mgr = CorpusManager::new(ChunkingConfig::default(), CorpusConfig::default());
        let text = format!("A paragraph about indexing pipelines. {}", "word ".repeat(200));
        mgr.add_documents(vec![Document::from_text("d1", "one", text)])
            .unwrap();
        mgr
    }

    #[tokio::test]
    async fn test_capture_restore_roundtrip() {
        let mut mgr = manager_with_corpus();
        mgr.index(None).await.unwrap();
        mgr.replace_embeddings(vec![vec![1.0, 2.0]; mgr.chunk_count()])
            .unwrap();

        let snapshot = CorpusSnapshot::capture(&mgr, Some("test-model".into()));

        let mut restored = CorpusManager::new(ChunkingConfig::default(), CorpusConfig::default());
        snapshot.restore(&mut restored).unwrap();

        assert_eq!(restored.document_count(), mgr.document_count());
        assert_eq!(restored.chunk_count(), mgr.chunk_count());
        assert_eq!(restored.embedding_count(), mgr.embedding_count());
        assert_eq!(restored.chunks()[0].id, mgr.chunks()[0].id);
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let mut mgr = manager_with_corpus();
        mgr.index(None).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");

        CorpusSnapshot::capture(&mgr, None).save(&path).unwrap();
        let loaded = CorpusSnapshot::load(&path).unwrap().unwrap();
        assert_eq!(loaded.chunks.len(), mgr.chunk_count());
        assert_eq!(loaded.documents.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(CorpusSnapshot::load(Path::new("/nonexistent/corpus.json"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_restore_rejects_misaligned_snapshot() {
        let snapshot = CorpusSnapshot {
            created_at: Utc::now(),
            embedding_model: None,
            documents: Vec::new(),
            chunks: Vec::new(),
            // More embeddings than chunks can never be valid.
            embeddings: vec![vec![1.0]],
        };
        let mut mgr = CorpusManager::new(ChunkingConfig::default(), CorpusConfig::default());
        assert!(snapshot.restore(&mut mgr).is_err());
    }
}
