//! # ragmill CLI
//!
//! The `ragmill` binary drives the in-memory RAG core from the command
//! line. Corpus state is carried between invocations by the JSON
//! snapshot configured at `[corpus].snapshot_path`.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ragmill add <paths…>` | Load files/directories into the corpus |
//! | `ragmill index` | Rebuild chunks and embeddings |
//! | `ragmill remove <id>` | Remove a document and its chunks |
//! | `ragmill search "<query>"` | Rank chunks lexically or by vector |
//! | `ragmill ask "<question>"` | Retrieve, assemble context, generate |
//! | `ragmill stats` | Corpus counts and availability |
//! | `ragmill clear` | Empty the corpus and the snapshot |
//!
//! ## Examples
//!
//! ```bash
//! ragmill add ./docs
//! ragmill index
//! ragmill search "deployment checklist"
//! ragmill search "deployment checklist" --mode vector
//! ragmill ask "How do we deploy?"
//! ```

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ragmill::config::{self, Config};
use ragmill::corpus::CorpusManager;
use ragmill::embedding;
use ragmill::generation;
use ragmill::loader;
use ragmill::progress::ProgressMode;
use ragmill::snapshot::CorpusSnapshot;

/// ragmill — an in-memory RAG indexing and retrieval core.
///
/// All commands accept a `--config` flag pointing to a TOML
/// configuration file; a missing file falls back to defaults with
/// providers disabled.
#[derive(Parser)]
#[command(
    name = "ragmill",
    about = "ragmill — chunk, index, and search documents for retrieval-augmented generation",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./ragmill.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Load documents from files or directories into the corpus.
    ///
    /// Directories are walked for `.md`/`.txt` files. The batch is
    /// admitted atomically: exceeding the corpus character ceiling
    /// rejects the whole batch.
    Add {
        /// Files or directories to ingest.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Rebuild chunks and embeddings from the document registry.
    ///
    /// Runs the full indexing pipeline under the configured memory and
    /// time budgets. With an embedding provider configured, chunk
    /// embeddings are generated in batches; otherwise the corpus is
    /// lexical-search-only.
    Index {
        /// Progress output: `auto`, `off`, `human`, or `json`.
        #[arg(long, default_value = "auto")]
        progress: String,
    },

    /// Remove a document and everything derived from it.
    Remove {
        /// Document id (as shown by `stats`).
        id: String,
    },

    /// Search indexed chunks.
    Search {
        /// The search query string.
        query: String,

        /// Search mode: `lexical` (term heuristics) or `vector`
        /// (embedding similarity; requires an embedding provider).
        #[arg(long, default_value = "lexical")]
        mode: String,

        /// Maximum number of results to return.
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Answer a question with retrieved context.
    ///
    /// Retrieves the best-matching chunks, assembles a bounded context
    /// passage, and sends it with the question to the generation
    /// provider.
    Ask {
        /// The question to answer.
        question: String,
    },

    /// Show corpus counts and search availability.
    Stats,

    /// Empty the corpus and delete the snapshot.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    let mut manager = CorpusManager::new(cfg.chunking.clone(), cfg.corpus.clone());
    if let Some(snapshot) = CorpusSnapshot::load(&cfg.corpus.snapshot_path)? {
        snapshot.restore(&mut manager)?;
    }

    match cli.command {
        Commands::Add { paths } => {
            let docs = loader::load_documents(&paths)?;
            let loaded = docs.len();
            let admitted = manager.add_documents(docs)?;
            save(&cfg, &manager)?;
            println!("add");
            println!("  files loaded: {}", loaded);
            println!("  documents admitted: {}", admitted);
            println!("  total characters: {}", manager.total_chars());
        }
        Commands::Index { progress } => {
            let embedder = embedding::create_client(&cfg.embedding)?;
            let reporter = parse_progress_mode(&progress)?.reporter();
            let report = manager
                .index_with_progress(embedder.as_deref(), reporter.as_ref())
                .await?;
            save(&cfg, &manager)?;

            println!("index");
            println!("  documents indexed: {}", report.indexed_documents);
            println!("  documents failed: {}", report.failed_documents.len());
            for failure in &report.failed_documents {
                println!("    {} — {}", failure.document_name, failure.reason);
            }
            println!("  chunks: {}", report.chunk_count);
            println!("  embedded: {}", report.embedded_count);
            if report.lexical_only_fallbacks > 0 {
                println!(
                    "  lexical-only fallbacks: {} (from {} failed batches)",
                    report.lexical_only_fallbacks, report.failed_embedding_batches
                );
            }
            println!("  elapsed: {:.2}s", report.elapsed.as_secs_f64());
            println!("ok");
        }
        Commands::Remove { id } => {
            if manager.remove_document(&id) {
                save(&cfg, &manager)?;
                println!("removed {}", id);
            } else {
                bail!("No document with id: {}", id);
            }
        }
        Commands::Search { query, mode, top_k } => {
            let top_k = top_k.unwrap_or(cfg.retrieval.top_k);
            let hits = match mode.as_str() {
                "lexical" => manager.search_lexical(&query, top_k),
                "vector" => {
                    let embedder = require_embedder(&cfg)?;
                    let query_vec = embedder.embed(&query).await?;
                    manager.search_vector(&query_vec, top_k)
                }
                other => bail!("Unknown search mode: {}. Use lexical or vector.", other),
            };

            if hits.is_empty() {
                println!("No results.");
            } else {
                for (i, hit) in hits.iter().enumerate() {
                    println!("{}. [{:.3}] {} ({})", i + 1, hit.score, hit.chunk.document_name, hit.chunk.id);
                    println!("   {}", excerpt(&hit.chunk.content, 160));
                }
            }
        }
        Commands::Ask { question } => {
            let Some(generator) = generation::create_client(&cfg.generation)? else {
                bail!("Generation provider is disabled. Set [generation] provider in config.");
            };

            // Prefer vector retrieval when embeddings are on and the
            // corpus actually carries them; fall back to lexical.
            let max_chars = cfg.retrieval.max_context_chars;
            let context = if cfg.embedding.is_enabled() && manager.is_available() {
                let embedder = require_embedder(&cfg)?;
                let query_vec = embedder.embed(&question).await?;
                manager.vector_context(&query_vec, max_chars)
            } else {
                manager.lexical_context(&question, max_chars)
            };

            let prompt = generation::build_prompt(&context, &question);
            let answer = generator.generate(&prompt).await?;
            println!("{}", answer);
        }
        Commands::Stats => {
            println!("ragmill — corpus stats");
            println!();
            println!("  documents:  {}", manager.document_count());
            println!("  characters: {}", manager.total_chars());
            println!("  chunks:     {}", manager.chunk_count());
            println!("  embeddings: {}", manager.embedding_count());
            println!(
                "  vector search: {}",
                if manager.is_available() { "available" } else { "unavailable" }
            );
            println!();
            for doc in manager.documents() {
                println!("  {}  {} ({} chars)", doc.id, doc.name, doc.char_count);
            }
        }
        Commands::Clear => {
            manager.clear();
            if cfg.corpus.snapshot_path.exists() {
                std::fs::remove_file(&cfg.corpus.snapshot_path)?;
            }
            println!("cleared");
        }
    }

    Ok(())
}

/// Save the corpus snapshot after a mutating command.
fn save(cfg: &Config, manager: &CorpusManager) -> Result<()> {
    CorpusSnapshot::capture(manager, cfg.embedding.model.clone())
        .save(&cfg.corpus.snapshot_path)
}

fn require_embedder(cfg: &Config) -> Result<Box<dyn embedding::EmbeddingClient>> {
    match embedding::create_client(&cfg.embedding)? {
        Some(client) => Ok(client),
        None => bail!("This operation requires embeddings. Set [embedding] provider in config."),
    }
}

fn parse_progress_mode(raw: &str) -> Result<ProgressMode> {
    Ok(match raw {
        "auto" => ProgressMode::default_for_tty(),
        "off" => ProgressMode::Off,
        "human" => ProgressMode::Human,
        "json" => ProgressMode::Json,
        other => bail!("Unknown progress mode: {}. Use auto, off, human, or json.", other),
    })
}

/// First `max_chars` characters of `content`, whitespace-flattened.
fn excerpt(content: &str, max_chars: usize) -> String {
    let flattened: String = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= max_chars {
        flattened
    } else {
        let cut: String = flattened.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}
