//! Candidate document discovery.
//!
//! # Invariants
//! - Depth 0 means the root directory itself, without subdirectories.
//! - Only `.md` files are returned, absolute and sorted.
//! - Walk errors are reported, never silently dropped.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const DOCUMENT_EXTENSION: &str = "md";

/// Markdown files found under a root plus the entries the walk could not read.
#[derive(Debug, Default)]
pub struct Discovery {
    pub documents: Vec<PathBuf>,
    pub skipped: Vec<walkdir::Error>,
}

/// Lists markdown files under `root`, at most `depth` directories deep.
pub fn discover_documents(root: &Path, depth: usize) -> Result<Discovery> {
    let root = std::fs::canonicalize(root)
        .with_context(|| format!("cannot open search path `{}`", root.display()))?;

    let mut discovery = Discovery::default();
    for entry in WalkDir::new(&root).follow_links(true).max_depth(depth + 1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(
                    "event=discover module=cli status=degraded path={} reason={}",
                    err.path()
                        .map(|path| path.display().to_string())
                        .unwrap_or_default(),
                    err
                );
                discovery.skipped.push(err);
                continue;
            }
        };
        let is_document = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == DOCUMENT_EXTENSION);
        if is_document {
            discovery.documents.push(entry.into_path());
        }
    }
    discovery.documents.sort();

    debug!(
        "event=discover module=cli status=ok root={} depth={} documents={} skipped={}",
        root.display(),
        depth,
        discovery.documents.len(),
        discovery.skipped.len()
    );
    Ok(discovery)
}
