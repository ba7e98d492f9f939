//! Bundled ingestion adapters.
//!
//! Only the local note producer ships with the core; web, PDF and trend
//! producers live with their extraction stacks and plug in through the same
//! `DocumentProducer` trait.

use std::path::PathBuf;

use tracing::warn;
use walkdir::WalkDir;

use vaultdb_core::error::Result;
use vaultdb_core::traits::DocumentProducer;
use vaultdb_core::types::{Document, SourceKind};

/// Produces one `note` document per `.txt`/`.md` file under a directory.
/// Document ids come from the file stem; files are visited in sorted order
/// so repeated runs are deterministic.
pub struct NoteFileProducer {
    root: PathBuf,
}

impl NoteFileProducer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DocumentProducer for NoteFileProducer {
    fn requires_network(&self) -> bool {
        false
    }

    fn produce(&self) -> Result<Vec<Document>> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| {
                matches!(p.extension().and_then(|s| s.to_str()), Some("txt") | Some("md"))
            })
            .collect();
        files.sort();

        let mut docs = Vec::with_capacity(files.len());
        for path in files {
            // Unreadable files are skipped, not fatal to the batch.
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable note");
                    continue;
                }
            };
            let id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("note")
                .to_string();
            let title = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or(&id)
                .to_string();
            let origin = path.display().to_string();
            docs.push(Document::new(id, SourceKind::Note, text, title, origin));
        }
        Ok(docs)
    }
}
