//! Closed catalog of note formats.
//!
//! # Responsibility
//! - Name every pedagogical template the engine can emit.
//! - Carry the downstream note-model identity for each format.
//!
//! # Invariants
//! - The catalog is static and never mutated.
//! - Model ids are durable: changing one orphans previously packaged notes.

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Stylesheet import shared by every note model.
pub const MODEL_CSS: &str = "@import url(\"_stylesheet.css\");";

/// Name of the trailing provenance field appended at packaging time.
pub const SOURCE_FIELD_NAME: &str = "Source";

/// One pedagogical template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteFormat {
    /// `question ::: answer`.
    QuestionAnswer,
    /// `front :: back`.
    FrontBack,
    /// Body with one or more `{{c<N>::text}}` spans.
    ClozeDeletion,
}

/// Downstream card template (question/answer markup).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CardTemplate {
    pub name: &'static str,
    pub question: &'static str,
    pub answer: &'static str,
}

/// Whether the downstream model renders cards from fields or cloze spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Standard,
    Cloze,
}

impl NoteFormat {
    /// Every format, in classification order.
    pub const ALL: [NoteFormat; 3] = [
        NoteFormat::QuestionAnswer,
        NoteFormat::FrontBack,
        NoteFormat::ClozeDeletion,
    ];

    /// Short stable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::QuestionAnswer => "QA",
            Self::FrontBack => "FrontBack",
            Self::ClozeDeletion => "Cloze",
        }
    }

    /// Number of rendered fields extracted from a body.
    pub fn arity(self) -> usize {
        self.field_names().len()
    }

    /// Names of the extracted fields, in order.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            Self::QuestionAnswer => &["Question", "Answer"],
            Self::FrontBack => &["Front", "Back"],
            Self::ClozeDeletion => &["Text"],
        }
    }

    /// Durable downstream model id.
    pub fn model_id(self) -> i64 {
        match self {
            Self::QuestionAnswer => 1_764_365_620,
            Self::FrontBack => 1_746_217_934,
            Self::ClozeDeletion => 1_783_507_665,
        }
    }

    pub fn model_name(self) -> &'static str {
        match self {
            Self::QuestionAnswer => "AnkCompiler-Question_Answer",
            Self::FrontBack => "AnkCompiler-Front_Back",
            Self::ClozeDeletion => "AnkCompiler-Cloze",
        }
    }

    pub fn model_kind(self) -> ModelKind {
        match self {
            Self::QuestionAnswer | Self::FrontBack => ModelKind::Standard,
            Self::ClozeDeletion => ModelKind::Cloze,
        }
    }

    pub fn template(self) -> CardTemplate {
        match self {
            Self::QuestionAnswer => CardTemplate {
                name: "QA",
                question: "{{Question}}",
                answer: "{{Question}}<hr id=answer>{{Answer}}",
            },
            Self::FrontBack => CardTemplate {
                name: "FrontBack",
                question: "{{Front}}",
                answer: "{{Front}}<hr id=answer>{{Back}}",
            },
            Self::ClozeDeletion => CardTemplate {
                name: "Cloze",
                question: "{{cloze:Text}}",
                answer: "{{cloze:Text}}",
            },
        }
    }
}

impl Display for NoteFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
