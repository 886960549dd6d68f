use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Window size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Overlap between consecutive windows, in characters.
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    800
}
fn default_overlap() -> usize {
    150
}

/// Resource ceilings and batch sizes for the indexing pipeline.
#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Where the JSON snapshot lives between CLI invocations.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    /// Total characters the registry may hold.
    #[serde(default = "default_max_total_chars")]
    pub max_total_chars: usize,
    /// Per-document character ceiling; larger documents are skipped.
    #[serde(default = "default_max_doc_chars")]
    pub max_doc_chars: usize,
    /// Global chunk-count ceiling.
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,
    /// Global embedding-count ceiling; chunks past it are lexical-only.
    #[serde(default = "default_max_embeddings")]
    pub max_embeddings: usize,
    /// Documents chunked per pipeline batch.
    #[serde(default = "default_doc_batch_size")]
    pub doc_batch_size: usize,
    /// Chunk texts per embedding provider call.
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: usize,
    /// Inter-call delay between embedding sub-batches, in milliseconds.
    #[serde(default = "default_embed_delay_ms")]
    pub embed_delay_ms: u64,
    /// Wall-clock budget for a full `index()` run, in seconds.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            max_total_chars: default_max_total_chars(),
            max_doc_chars: default_max_doc_chars(),
            max_chunks: default_max_chunks(),
            max_embeddings: default_max_embeddings(),
            doc_batch_size: default_doc_batch_size(),
            embed_batch_size: default_embed_batch_size(),
            embed_delay_ms: default_embed_delay_ms(),
            deadline_secs: default_deadline_secs(),
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("./ragmill.snapshot.json")
}
fn default_max_total_chars() -> usize {
    10_000_000
}
fn default_max_doc_chars() -> usize {
    500_000
}
fn default_max_chunks() -> usize {
    10_000
}
fn default_max_embeddings() -> usize {
    5_000
}
fn default_doc_batch_size() -> usize {
    5
}
fn default_embed_batch_size() -> usize {
    100
}
fn default_embed_delay_ms() -> u64 {
    50
}
fn default_deadline_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Results returned by `search`.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Character budget for an assembled context passage.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_max_context_chars() -> usize {
    2_800
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `disabled`, `ollama`, or `openai`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            base_url: default_ollama_url(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// `disabled` or `ollama`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    #[serde(default = "default_gen_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: default_ollama_url(),
            timeout_secs: default_gen_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_gen_timeout_secs() -> u64 {
    120
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl GenerationConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// Load and validate a TOML config file.
///
/// A missing file is not an error: every section has workable defaults,
/// so the binary runs out of the box with providers disabled.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.overlap >= config.chunking.chunk_size {
        anyhow::bail!("chunking.overlap must be < chunking.chunk_size");
    }

    // Validate corpus ceilings
    if config.corpus.max_total_chars == 0
        || config.corpus.max_doc_chars == 0
        || config.corpus.max_chunks == 0
    {
        anyhow::bail!("corpus ceilings must be > 0");
    }
    if config.corpus.doc_batch_size == 0 || config.corpus.embed_batch_size == 0 {
        anyhow::bail!("corpus batch sizes must be > 0");
    }
    if config.corpus.deadline_secs == 0 {
        anyhow::bail!("corpus.deadline_secs must be > 0");
    }

    // Validate retrieval
    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if config.retrieval.max_context_chars == 0 {
        anyhow::bail!("retrieval.max_context_chars must be > 0");
    }

    // Validate providers
    match config.embedding.provider.as_str() {
        "disabled" | "ollama" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, ollama, or openai.",
            other
        ),
    }
    if config.embedding.is_enabled() && config.embedding.model.is_none() {
        anyhow::bail!(
            "embedding.model must be specified when provider is '{}'",
            config.embedding.provider
        );
    }

    match config.generation.provider.as_str() {
        "disabled" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be disabled or ollama.",
            other
        ),
    }
    if config.generation.is_enabled() && config.generation.model.is_none() {
        anyhow::bail!(
            "generation.model must be specified when provider is '{}'",
            config.generation.provider
        );
    }

    Ok(config)
}
