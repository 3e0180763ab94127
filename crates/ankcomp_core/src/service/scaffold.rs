//! Authoring scaffold for new note blocks.
//!
//! Extraction never calls into this module; it only helps authors start a
//! block with a fresh identifier.

use crate::config::EngineConfig;
use crate::model::note::{NoteId, NOTE_ID_LEN};
use uuid::Uuid;

const ID_ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Returns a fresh random identifier for a new block.
pub fn fresh_note_id() -> NoteId {
    let bytes = Uuid::new_v4().into_bytes();
    let raw: String = bytes
        .iter()
        .take(NOTE_ID_LEN)
        .map(|byte| char::from(ID_ALPHABET[usize::from(*byte) % ID_ALPHABET.len()]))
        .collect();
    NoteId::from_alphanumeric(raw)
}

/// Empty question/answer block with an identifier footer and a blank tag line.
pub fn new_block_template(config: &EngineConfig) -> String {
    format!(
        "---\n\nQuestion\n\n:::\n\nAnswer\n\n---\n[^{}]: {}\n[^{}]:\n",
        config.id_key,
        fresh_note_id(),
        config.tag_key
    )
}
