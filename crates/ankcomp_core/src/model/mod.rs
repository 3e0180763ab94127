//! Domain model for extracted flashcards.
//!
//! # Responsibility
//! - Define the note record and its value types.
//! - Define the closed catalog of note formats.
//!
//! # Invariants
//! - Every note is identified by an externally supplied `NoteId`.
//! - Note formats form a closed set; adding one means adding a variant.

pub mod format;
pub mod note;
