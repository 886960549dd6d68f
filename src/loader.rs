//! Filesystem document loader.
//!
//! Turns file and directory paths into [`Document`] records before the
//! core boundary: directories are walked for `.md` and `.txt` files,
//! contents are read as UTF-8, and size fields are computed. A file
//! that cannot be read still yields a document — with the error flag
//! set — so one bad file never aborts a batch; the corpus manager
//! filters flagged documents at admission.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::models::Document;

const SUPPORTED_EXTENSIONS: [&str; 2] = ["md", "txt"];

/// Load documents from a mix of file and directory paths.
///
/// Directories are walked recursively; files are taken as-is whatever
/// their extension (the caller asked for them explicitly).
pub fn load_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() && has_supported_extension(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else {
            files.push(path.clone());
        }
    }

    files.sort();
    Ok(files.iter().map(|f| load_file(f)).collect())
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read one file into a document, flagging it on failure.
fn load_file(path: &Path) -> Document {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string();
    let id = Uuid::new_v4().to_string();

    match std::fs::read_to_string(path) {
        Ok(text) => Document::from_text(id, name, text),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read file");
            let mut doc = Document::from_text(id, name, "");
            doc.error = true;
            doc
        }
    }
}
