//! Indexing progress reporting.
//!
//! Reports observable progress during `ragmill index` so users see how
//! far chunking and embedding have come. Progress is emitted on
//! **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event from the indexing pipeline.
#[derive(Clone, Debug)]
pub enum IndexProgressEvent {
    /// Chunking phase: `done` documents processed out of `total`.
    Chunking { done: usize, total: usize },
    /// Embedding phase: `done` chunks embedded out of `total`.
    Embedding { done: usize, total: usize },
}

/// Reports indexing progress. Implementations write to stderr.
pub trait IndexProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the indexing pipeline at
    /// batch boundaries.
    fn report(&self, event: IndexProgressEvent);
}

/// Human-friendly progress: "index  chunking  3 / 12 documents".
pub struct StderrProgress;

impl IndexProgressReporter for StderrProgress {
    fn report(&self, event: IndexProgressEvent) {
        let line = match &event {
            IndexProgressEvent::Chunking { done, total } => {
                format!("index  chunking   {} / {} documents\n", done, total)
            }
            IndexProgressEvent::Embedding { done, total } => {
                format!("index  embedding  {} / {} chunks\n", done, total)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl IndexProgressReporter for JsonProgress {
    fn report(&self, event: IndexProgressEvent) {
        let obj = match &event {
            IndexProgressEvent::Chunking { done, total } => serde_json::json!({
                "event": "progress",
                "phase": "chunking",
                "done": done,
                "total": total
            }),
            IndexProgressEvent::Embedding { done, total } => serde_json::json!({
                "event": "progress",
                "phase": "embedding",
                "done": done,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl IndexProgressReporter for NoProgress {
    fn report(&self, _event: IndexProgressEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode. Caller passes it to `index`.
    pub fn reporter(&self) -> Box<dyn IndexProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
