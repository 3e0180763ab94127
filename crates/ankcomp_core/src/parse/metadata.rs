//! Footer metadata extraction.
//!
//! # Responsibility
//! - Parse `[^key]: value` footer lines into a typed record.
//!
//! # Invariants
//! - Unknown keys are ignored.
//! - Tags and source references accumulate in order; the identifier is a
//!   scalar where the last occurrence wins.
//! - A missing or malformed identifier is surfaced, never defaulted.

use crate::config::EngineConfig;
use crate::model::note::{NoteId, SourceRef, TagSet};
use crate::parse::NoteError;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static FOOTER_ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\[\^(\w+)\]:[ \t]*(.*?)[ \t]*$").expect("valid footer entry regex")
});

/// Typed footer contents of one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMetadata {
    /// Raw identifier text; validated by [`BlockMetadata::note_id`].
    pub id: Option<String>,
    pub tags: TagSet,
    pub sources: Vec<SourceRef>,
}

impl BlockMetadata {
    /// Returns the validated identifier.
    pub fn note_id(&self) -> Result<NoteId, NoteError> {
        let raw = self.id.as_deref().ok_or(NoteError::MissingIdentifier)?;
        NoteId::parse(raw).ok_or_else(|| NoteError::InvalidIdentifier(raw.to_string()))
    }
}

/// Footer parser bound to one set of key names.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    id_key: String,
    tag_key: String,
    source_key: String,
}

impl MetadataExtractor {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            id_key: config.id_key.clone(),
            tag_key: config.tag_key.clone(),
            source_key: config.source_key.clone(),
        }
    }

    pub fn extract(&self, footer: &str) -> BlockMetadata {
        let mut meta = BlockMetadata::default();
        for caps in FOOTER_ENTRY_RE.captures_iter(footer) {
            let key = &caps[1];
            let value = caps[2].trim();
            if value.is_empty() {
                continue;
            }

            if key == self.id_key {
                if let Some(previous) = meta.id.replace(value.to_string()) {
                    debug!(
                        "event=footer_parse module=metadata status=degraded reason=repeated_id replaced={}",
                        previous
                    );
                }
            } else if key == self.tag_key {
                meta.tags.insert(value);
            } else if key == self.source_key {
                meta.sources.push(SourceRef::parse(value));
            }
        }
        meta
    }
}
