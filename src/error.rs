//! Error taxonomy for the ragmill core.
//!
//! Library operations fail with one of five variants, matching the
//! failure classes of the pipeline contract:
//!
//! | Variant | Raised by |
//! |---------|-----------|
//! | [`Error::Validation`] | malformed chunk configuration, empty input |
//! | [`Error::Capacity`] | a character/chunk/embedding/document-size ceiling |
//! | [`Error::Timeout`] | the indexing wall-clock deadline |
//! | [`Error::Provider`] | a failed embedding or generation call |
//! | [`Error::Integrity`] | a chunk/embedding alignment violation |
//!
//! Search and context assembly are total and never return these; absent
//! inputs and degenerate vectors yield empty results instead.

use thiserror::Error;

/// Failure classes for corpus and provider operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed configuration or input rejected before processing.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A configured resource ceiling would be (or was) exceeded.
    #[error("capacity exceeded: {what} ({observed} > {limit})")]
    Capacity {
        /// Which ceiling was hit (e.g. "total characters").
        what: &'static str,
        /// The value that tripped the ceiling.
        observed: usize,
        /// The configured ceiling.
        limit: usize,
    },

    /// The indexing wall-clock budget was exhausted.
    #[error("indexing deadline of {budget_secs}s exceeded")]
    Timeout {
        /// The configured budget in seconds.
        budget_secs: u64,
    },

    /// An embedding or generation provider call failed.
    #[error("provider error: {0}")]
    Provider(String),

    /// The chunk/embedding positional correspondence was violated.
    #[error("corpus integrity violated: {0}")]
    Integrity(String),
}

pub type Result<T> = std::result::Result<T, Error>;
