//! Markdown parsing stages, leaves first.
//!
//! # Responsibility
//! - Split headers from bodies, segment bodies into blocks, parse footers,
//!   classify bodies and render fields.
//! - Keep every grammar fragment as one named pattern per stage.
//!
//! # Invariants
//! - Stages are pure over in-memory text; none touches the file system
//!   except `frontmatter::read_header`, which reads the caller's reader.
//! - Per-block failures are typed `NoteError`s, never panics.

use crate::model::format::NoteFormat;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod classify;
pub mod fields;
pub mod frontmatter;
pub mod metadata;
pub mod segment;

/// Failure to turn one block into a note. Fatal for that block only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteError {
    /// The footer has no identifier line.
    MissingIdentifier,
    /// The identifier is not 10 ASCII alphanumerics.
    InvalidIdentifier(String),
    /// No format pattern matched the body.
    UnrecognizedFormat,
    /// More than one format pattern matched the body.
    AmbiguousFormat(Vec<NoteFormat>),
    /// The format matched but its fields could not be captured.
    FieldExtraction { format: NoteFormat, reason: String },
}

impl Display for NoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingIdentifier => write!(f, "block has no identifier"),
            Self::InvalidIdentifier(raw) => write!(
                f,
                "invalid identifier `{raw}`: expected 10 ASCII letters or digits"
            ),
            Self::UnrecognizedFormat => write!(f, "block body matches no note format"),
            Self::AmbiguousFormat(formats) => {
                let names = formats
                    .iter()
                    .map(|format| format.name())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "block body matches several note formats: {names}")
            }
            Self::FieldExtraction { format, reason } => {
                write!(f, "could not extract {format} fields: {reason}")
            }
        }
    }
}

impl Error for NoteError {}
