//! # ragmill
//!
//! An in-memory retrieval-augmented generation core.
//!
//! ragmill ingests plain-text documents, splits them into overlapping
//! retrieval chunks, indexes them under explicit memory and time
//! budgets, and answers queries by ranking chunks lexically or by
//! embedding similarity, assembling a length-bounded context passage
//! for a downstream text generator.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────────┐   ┌───────────────┐
//! │  Loader  │──▶│      CorpusManager        │──▶│ Lexical/Vector │
//! │ (fs, md) │   │ chunk → bound → embed     │   │    search      │
//! └──────────┘   └────────────┬─────────────┘   └───────┬───────┘
//!                             │                         ▼
//!                       ┌─────┴─────┐            ┌─────────────┐
//!                       │ Snapshot  │            │  Context →  │
//!                       │  (JSON)   │            │  Generator  │
//!                       └───────────┘            └─────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Typed error taxonomy |
//! | [`chunk`] | Sliding-window text chunking |
//! | [`corpus`] | Corpus manager and indexing pipeline |
//! | [`lexical`] | Term-heuristic search engine |
//! | [`vector`] | Cosine-similarity search engine |
//! | [`context`] | Bounded context assembly |
//! | [`embedding`] | Embedding provider clients |
//! | [`generation`] | Generation provider client |
//! | [`loader`] | Filesystem document loader |
//! | [`snapshot`] | JSON snapshot persistence |
//! | [`progress`] | Indexing progress reporting |

pub mod chunk;
pub mod config;
pub mod context;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod lexical;
pub mod loader;
pub mod models;
pub mod progress;
pub mod snapshot;
pub mod vector;
