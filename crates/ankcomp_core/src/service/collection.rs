//! Collection (deck) resolution.
//!
//! # Responsibility
//! - Group candidate documents by declared collection name.
//! - Resolve a collection into its ordered notes, reporting failures apart.
//! - Derive the durable numeric collection id.
//!
//! # Invariants
//! - `collection_id` is a pure function of the name and must never change:
//!   packaged decks keep their identity across re-compiles through it.
//! - Grouping reads document headers only.
//! - Note order is candidate path order, then block order.

use crate::config::EngineConfig;
use crate::model::note::{DocumentId, Note};
use crate::parse::frontmatter::read_header;
use crate::service::extract::{Document, DocumentError, NoteExtractor};
use log::{info, warn};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Number of leading digest bytes folded into the id.
const ID_DIGEST_BYTES: usize = 20;

/// Derives the durable collection id from its name.
///
/// Bits 0..=3 of each of the first 20 SHA-256 bytes add `2^24`, `2^16`,
/// `2^8` and `2^0` respectively, so the result always fits in 31 bits.
pub fn collection_id(name: &str) -> i64 {
    let digest = Sha256::digest(name.as_bytes());
    digest
        .iter()
        .take(ID_DIGEST_BYTES)
        .fold(0i64, |acc, byte| {
            (0..4u32).fold(acc, |acc, bit| {
                if (byte >> bit) & 1 == 1 {
                    acc + (1i64 << ((3 - bit) * 8))
                } else {
                    acc
                }
            })
        })
}

/// Maps a collection name to a file-name-safe slug.
pub fn clean_collection_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

/// Notes of one named collection plus the documents they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub name: String,
    pub id: i64,
    /// Member documents; `DocumentId(i)` indexes this list.
    pub documents: Vec<PathBuf>,
    pub notes: Vec<Note>,
}

impl Collection {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn document_path(&self, id: DocumentId) -> Option<&Path> {
        self.documents.get(id.0).map(PathBuf::as_path)
    }

    /// Union of every note's media, first-seen order.
    pub fn media(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.notes
            .iter()
            .flat_map(|note| note.media())
            .filter(|path| seen.insert(*path))
            .cloned()
            .collect()
    }
}

/// Resolved collection plus the documents that failed along the way.
#[derive(Debug)]
pub struct CollectionReport {
    pub collection: Collection,
    pub failures: Vec<DocumentError>,
}

impl CollectionReport {
    /// Strict view: the first failure wins over the collection.
    pub fn into_result(self) -> Result<Collection, DocumentError> {
        match self.failures.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.collection),
        }
    }
}

/// Every declared collection plus documents whose header could not be read.
#[derive(Debug)]
pub struct BatchReport {
    pub collections: Vec<CollectionReport>,
    pub failures: Vec<DocumentError>,
}

impl BatchReport {
    /// Counts header-read failures and per-collection failures.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
            + self
                .collections
                .iter()
                .map(|report| report.failures.len())
                .sum::<usize>()
    }
}

/// Candidate documents grouped by declared collection name.
#[derive(Debug, Default)]
pub struct CollectionScan {
    members: BTreeMap<String, Vec<PathBuf>>,
    pub failures: Vec<DocumentError>,
}

impl CollectionScan {
    /// Distinct declared names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.members.keys().cloned().collect()
    }

    /// Documents declaring `name`, in candidate order.
    pub fn files(&self, name: &str) -> &[PathBuf] {
        self.members.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Resolves collections over a pre-enumerated list of document paths.
#[derive(Debug, Clone)]
pub struct CollectionResolver {
    extractor: NoteExtractor,
}

impl CollectionResolver {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            extractor: NoteExtractor::new(config),
        }
    }

    /// Reads only the header of `path` and returns its collection name.
    pub fn declared_collection(&self, path: &Path) -> Result<Option<String>, DocumentError> {
        let read_error = |source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(read_error)?;
        let (header, warning) = read_header(BufReader::new(file)).map_err(read_error)?;
        if let Some(err) = warning {
            warn!(
                "event=header_parse module=collection status=degraded path={} reason={}",
                path.display(),
                err
            );
        }
        Ok(header.collection(self.extractor.config()))
    }

    /// Groups candidates by declared collection; unreadable files are failures.
    pub fn scan(&self, paths: &[PathBuf]) -> CollectionScan {
        let mut scan = CollectionScan::default();
        for path in paths {
            match self.declared_collection(path) {
                Ok(Some(name)) => scan.members.entry(name).or_default().push(path.clone()),
                Ok(None) => {}
                Err(err) => scan.failures.push(err),
            }
        }
        scan
    }

    /// Resolves the notes of `name` across `paths`.
    ///
    /// An unknown name yields an empty collection, not an error.
    pub fn resolve(&self, name: &str, paths: &[PathBuf]) -> CollectionReport {
        let scan = self.scan(paths);
        let mut report = self.resolve_members(name, scan.files(name));
        let mut failures = scan.failures;
        failures.append(&mut report.failures);
        report.failures = failures;
        report
    }

    /// Resolves every declared collection, sorted by name.
    pub fn resolve_all(&self, paths: &[PathBuf]) -> BatchReport {
        let scan = self.scan(paths);
        let collections = scan
            .members
            .iter()
            .map(|(name, files)| self.resolve_members(name, files))
            .collect();
        BatchReport {
            collections,
            failures: scan.failures,
        }
    }

    /// Resolves `name` from documents already known to declare it.
    pub fn resolve_members(&self, name: &str, files: &[PathBuf]) -> CollectionReport {
        let mut collection = Collection {
            name: name.to_string(),
            id: collection_id(name),
            documents: files.to_vec(),
            notes: Vec::new(),
        };
        let mut failures = Vec::new();

        for (index, path) in files.iter().enumerate() {
            let document = match Document::load(path) {
                Ok(document) => document,
                Err(err) => {
                    warn!(
                        "event=document_read module=collection status=error path={} reason={}",
                        path.display(),
                        err
                    );
                    failures.push(err);
                    continue;
                }
            };
            let extracted = self
                .extractor
                .extract_document_lenient(&document, DocumentId(index));
            collection.notes.extend(extracted.notes);
            failures.extend(extracted.failures.into_iter().map(DocumentError::from));
        }

        warn_duplicate_ids(&collection);
        info!(
            "event=collection_resolved module=collection status={} name={} id={} documents={} notes={} failures={}",
            if failures.is_empty() { "ok" } else { "degraded" },
            collection.name,
            collection.id,
            collection.documents.len(),
            collection.notes.len(),
            failures.len()
        );
        CollectionReport {
            collection,
            failures,
        }
    }
}

fn warn_duplicate_ids(collection: &Collection) {
    let mut seen = HashSet::new();
    for note in &collection.notes {
        if !seen.insert(note.id()) {
            warn!(
                "event=duplicate_id module=collection status=degraded name={} id={} path={}",
                collection.name,
                note.id(),
                collection
                    .document_path(note.document())
                    .map(|path| path.display().to_string())
                    .unwrap_or_default()
            );
        }
    }
}
