//! Core compiler logic for ankcomp.
//! Turns markdown documents into flashcard notes grouped by collection.

pub mod config;
pub mod logging;
pub mod model;
pub mod package;
pub mod parse;
pub mod service;

pub use config::{load_config, ConfigError, EngineConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::format::NoteFormat;
pub use model::note::{DocumentId, Note, NoteId, SourceRef, TagSet};
pub use package::{DeckPackager, ManifestPackager, PackageError, PackageRequest};
pub use parse::NoteError;
pub use service::collection::{
    clean_collection_name, collection_id, BatchReport, Collection, CollectionReport,
    CollectionResolver, CollectionScan,
};
pub use service::extract::{BlockError, Document, DocumentError, DocumentNotes, NoteExtractor};
pub use service::scaffold::{fresh_note_id, new_block_template};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
