//! Document loading and note assembly.
//!
//! # Responsibility
//! - Load one markdown document into header + body.
//! - Assemble each block of a document into an immutable `Note`.
//! - Offer strict (stop at first failure) and lenient (collect failures)
//!   per-document entry points.
//!
//! # Invariants
//! - Assembly is all-or-nothing per block; no partial notes.
//! - Note tags are block tags first, then new document tags.
//! - Identifiers are read from metadata only, never generated.

use crate::config::EngineConfig;
use crate::model::note::{DocumentId, Note};
use crate::parse::classify::classify;
use crate::parse::fields::extract_fields;
use crate::parse::frontmatter::{split_frontmatter, DocumentHeader};
use crate::parse::metadata::MetadataExtractor;
use crate::parse::segment::{Block, BlockSegmenter};
use crate::parse::NoteError;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// One parsed source markdown file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    path: PathBuf,
    header: DocumentHeader,
    body: String,
    body_line: usize,
}

impl Document {
    /// Parses document text. A malformed header is logged and ignored.
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Self {
        let path = path.into();
        let normalized = text.replace("\r\n", "\n");
        let split = split_frontmatter(&normalized);
        if let Some(err) = &split.warning {
            warn!(
                "event=header_parse module=frontmatter status=degraded path={} reason={}",
                path.display(),
                err
            );
        }

        Self {
            header: split.header,
            body: split.body.to_string(),
            body_line: split.body_line,
            path,
        }
    }

    /// Reads and parses a document from disk.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let text = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(path, &text))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &DocumentHeader {
        &self.header
    }

    /// Directory media references resolve against.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A block failure with enough context to report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockError {
    pub path: PathBuf,
    /// 0-based block ordinal within the document.
    pub position: usize,
    /// 1-based line of the block's opening fence.
    pub line: usize,
    pub error: NoteError,
}

impl BlockError {
    /// 1-based block number as shown to authors.
    pub fn ordinal(&self) -> usize {
        self.position + 1
    }
}

impl Display for BlockError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} (block {}): {}",
            self.path.display(),
            self.line,
            self.ordinal(),
            self.error
        )
    }
}

impl Error for BlockError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

/// Failure to read or (in strict mode) fully extract one document.
#[derive(Debug)]
pub enum DocumentError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Block(BlockError),
}

impl DocumentError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } => path,
            Self::Block(err) => &err.path,
        }
    }
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
            Self::Block(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Block(err) => Some(err),
        }
    }
}

impl From<BlockError> for DocumentError {
    fn from(value: BlockError) -> Self {
        Self::Block(value)
    }
}

/// Notes and block failures of one leniently extracted document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentNotes {
    pub notes: Vec<Note>,
    pub failures: Vec<BlockError>,
}

/// Turns documents into notes using one key configuration.
#[derive(Debug, Clone)]
pub struct NoteExtractor {
    config: EngineConfig,
    segmenter: BlockSegmenter,
    metadata: MetadataExtractor,
}

impl NoteExtractor {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            segmenter: BlockSegmenter::new(&config),
            metadata: MetadataExtractor::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Segments the document body into raw blocks.
    pub fn blocks<'d>(&self, document: &'d Document) -> Vec<Block<'d>> {
        self.segmenter.segment(&document.body, document.body_line)
    }

    /// Assembles one block into a note.
    pub fn assemble(
        &self,
        block: &Block<'_>,
        document: &Document,
        document_id: DocumentId,
    ) -> Result<Note, NoteError> {
        let meta = self.metadata.extract(block.footer);
        let id = meta.note_id()?;
        let format = classify(block.body)?;
        let rendered = extract_fields(block.body, format, document.directory())?;

        let mut tags = meta.tags;
        tags.extend(document.header.tags(&self.config).iter());

        debug!(
            "event=note_assembled module=extract status=ok id={} format={} tags={} media={}",
            id,
            format,
            tags.len(),
            rendered.media.len()
        );
        Ok(Note::new(
            id,
            format,
            rendered.fields,
            tags,
            meta.sources,
            document_id,
            document.file_name(),
            rendered.media,
        ))
    }

    /// Extracts every note, stopping at the first failing block.
    pub fn extract_document(
        &self,
        document: &Document,
        document_id: DocumentId,
    ) -> Result<Vec<Note>, BlockError> {
        self.blocks(document)
            .iter()
            .map(|block| {
                self.assemble(block, document, document_id)
                    .map_err(|error| block_error(document, block, error))
            })
            .collect()
    }

    /// Extracts every note it can; failing blocks are reported, not fatal.
    pub fn extract_document_lenient(
        &self,
        document: &Document,
        document_id: DocumentId,
    ) -> DocumentNotes {
        let mut result = DocumentNotes::default();
        for block in self.blocks(document) {
            match self.assemble(&block, document, document_id) {
                Ok(note) => result.notes.push(note),
                Err(error) => {
                    let err = block_error(document, &block, error);
                    warn!(
                        "event=block_extract module=extract status=error path={} line={} block={} reason={}",
                        err.path.display(),
                        err.line,
                        err.ordinal(),
                        err.error
                    );
                    result.failures.push(err);
                }
            }
        }
        result
    }
}

fn block_error(document: &Document, block: &Block<'_>, error: NoteError) -> BlockError {
    BlockError {
        path: document.path.clone(),
        position: block.position,
        line: block.line,
        error,
    }
}
