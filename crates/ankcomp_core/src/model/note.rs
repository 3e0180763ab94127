//! Note domain model.
//!
//! # Responsibility
//! - Define the resolved flashcard record handed to packaging.
//! - Provide the identifier, tag-set and source-reference value types.
//!
//! # Invariants
//! - `NoteId` is always exactly 10 ASCII alphanumerics; it is read from
//!   metadata and never generated by extraction.
//! - `TagSet` is case-sensitive, duplicate-free and keeps first-seen order.
//! - A `Note` is immutable once assembled.

use crate::model::format::NoteFormat;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Required identifier length.
pub const NOTE_ID_LEN: usize = 10;

static LINK_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([^\]]*)\]\(([^)\s]+)\)$").expect("valid link ref regex"));
static WIKI_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[\[([^\[\]]+)\]\]$").expect("valid wiki ref regex"));

/// Stable externally supplied flashcard identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Validates length and charset; returns `None` instead of truncating.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.len() == NOTE_ID_LEN && trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            Some(Self(trimmed.to_string()))
        } else {
            None
        }
    }

    /// Wraps text already drawn from the identifier alphabet.
    pub(crate) fn from_alphanumeric(raw: String) -> Self {
        debug_assert!(
            raw.len() == NOTE_ID_LEN && raw.chars().all(|c| c.is_ascii_alphanumeric()),
            "identifier must be {NOTE_ID_LEN} ASCII alphanumerics"
        );
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, duplicate-free tag collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a trimmed tag; blank and already-present tags are ignored.
    ///
    /// Returns `true` when the tag was added.
    pub fn insert(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.0.push(tag.to_string());
        true
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|existing| existing == tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<'a> Extend<&'a str> for TagSet {
    fn extend<I: IntoIterator<Item = &'a str>>(&mut self, iter: I) {
        for tag in iter {
            self.insert(tag);
        }
    }
}

impl<'a> FromIterator<&'a str> for TagSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut tags = Self::new();
        tags.extend(iter);
        tags
    }
}

/// Where a note's content came from, as written in a `[^source]:` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceRef {
    /// `[label](url)`
    Link { label: String, url: String },
    /// `[[target]]`
    Wiki { target: String },
    /// Any other shape, kept verbatim.
    Other { text: String },
}

impl SourceRef {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(caps) = WIKI_REF_RE.captures(raw) {
            return Self::Wiki {
                target: caps[1].trim().to_string(),
            };
        }
        if let Some(caps) = LINK_REF_RE.captures(raw) {
            return Self::Link {
                label: caps[1].trim().to_string(),
                url: caps[2].to_string(),
            };
        }
        Self::Other {
            text: raw.to_string(),
        }
    }
}

/// Index of a document in the table that produced a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DocumentId(pub usize);

/// Fully classified, rendered flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    id: NoteId,
    format: NoteFormat,
    fields: Vec<String>,
    tags: TagSet,
    sources: Vec<SourceRef>,
    document: DocumentId,
    source_name: String,
    media: Vec<PathBuf>,
}

impl Note {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: NoteId,
        format: NoteFormat,
        fields: Vec<String>,
        tags: TagSet,
        sources: Vec<SourceRef>,
        document: DocumentId,
        source_name: String,
        media: Vec<PathBuf>,
    ) -> Self {
        Self {
            id,
            format,
            fields,
            tags,
            sources,
            document,
            source_name,
            media,
        }
    }

    pub fn id(&self) -> &NoteId {
        &self.id
    }

    pub fn format(&self) -> NoteFormat {
        self.format
    }

    /// Rendered format fields, in `NoteFormat::field_names` order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn sources(&self) -> &[SourceRef] {
        &self.sources
    }

    /// Owning document, as an index into the producing document table.
    pub fn document(&self) -> DocumentId {
        self.document
    }

    /// File name of the owning document.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Absolute media paths, first-seen order.
    pub fn media(&self) -> &[PathBuf] {
        &self.media
    }

    /// Fields as packaged: rendered fields plus the trailing source name.
    pub fn package_fields(&self) -> Vec<String> {
        let mut fields = self.fields.clone();
        fields.push(self.source_name.clone());
        fields
    }
}
