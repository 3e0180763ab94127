//! Packaging seam between resolved collections and deck files.
//!
//! # Responsibility
//! - Define the request handed to a deck packager.
//! - Provide a JSON manifest packager for inspection and tooling.
//!
//! # Invariants
//! - Requests carry the durable collection id, never a per-run value.
//! - Media lists are a duplicate-free union in first-seen order.

use crate::model::format::{CardTemplate, ModelKind, NoteFormat, MODEL_CSS, SOURCE_FIELD_NAME};
use crate::model::note::Note;
use crate::service::collection::{clean_collection_name, Collection};
use log::info;
use serde::Serialize;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Everything a packager needs for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequest<'a> {
    pub deck_id: i64,
    pub deck_name: &'a str,
    pub notes: &'a [Note],
    pub media: Vec<PathBuf>,
}

impl<'a> PackageRequest<'a> {
    pub fn from_collection(collection: &'a Collection) -> Self {
        Self {
            deck_id: collection.id,
            deck_name: &collection.name,
            notes: &collection.notes,
            media: collection.media(),
        }
    }

    /// File stem derived from the deck name.
    pub fn file_stem(&self) -> String {
        clean_collection_name(self.deck_name)
    }
}

/// Turns one request into one packaged output file.
pub trait DeckPackager {
    /// Returns the path of the written package.
    fn package(&self, request: &PackageRequest<'_>) -> Result<PathBuf, PackageError>;
}

/// Writes `<deck>.json` manifests into a directory.
#[derive(Debug, Clone)]
pub struct ManifestPackager {
    output_dir: PathBuf,
}

impl ManifestPackager {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl DeckPackager for ManifestPackager {
    fn package(&self, request: &PackageRequest<'_>) -> Result<PathBuf, PackageError> {
        let manifest = DeckManifest::from_request(request);
        let json = serde_json::to_string_pretty(&manifest).map_err(PackageError::Serialize)?;

        let path = self.output_dir.join(format!("{}.json", request.file_stem()));
        std::fs::write(&path, json).map_err(|source| PackageError::Io {
            path: path.clone(),
            source,
        })?;

        info!(
            "event=package_written module=package status=ok deck_id={} notes={} media={} path={}",
            request.deck_id,
            request.notes.len(),
            request.media.len(),
            path.display()
        );
        Ok(path)
    }
}

#[derive(Debug, Serialize)]
struct DeckManifest<'a> {
    deck: DeckEntry<'a>,
    models: Vec<ModelEntry>,
    notes: Vec<NoteEntry<'a>>,
    media: &'a [PathBuf],
}

#[derive(Debug, Serialize)]
struct DeckEntry<'a> {
    id: i64,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct ModelEntry {
    id: i64,
    name: &'static str,
    kind: ModelKind,
    fields: Vec<&'static str>,
    template: CardTemplate,
    css: &'static str,
}

#[derive(Debug, Serialize)]
struct NoteEntry<'a> {
    guid: &'a str,
    model_id: i64,
    fields: Vec<String>,
    tags: &'a [String],
}

impl<'a> DeckManifest<'a> {
    fn from_request(request: &'a PackageRequest<'a>) -> Self {
        let formats: BTreeSet<NoteFormat> = request.notes.iter().map(Note::format).collect();
        Self {
            deck: DeckEntry {
                id: request.deck_id,
                name: request.deck_name,
            },
            models: formats.into_iter().map(ModelEntry::for_format).collect(),
            notes: request
                .notes
                .iter()
                .map(|note| NoteEntry {
                    guid: note.id().as_str(),
                    model_id: note.format().model_id(),
                    fields: note.package_fields(),
                    tags: note.tags().as_slice(),
                })
                .collect(),
            media: &request.media,
        }
    }
}

impl ModelEntry {
    fn for_format(format: NoteFormat) -> Self {
        let mut fields = format.field_names().to_vec();
        fields.push(SOURCE_FIELD_NAME);
        Self {
            id: format.model_id(),
            name: format.model_name(),
            kind: format.model_kind(),
            fields,
            template: format.template(),
            css: MODEL_CSS,
        }
    }
}

/// Failure to write a package.
#[derive(Debug)]
pub enum PackageError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Serialize(serde_json::Error),
}

impl Display for PackageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to write package `{}`: {source}", path.display())
            }
            Self::Serialize(err) => write!(f, "failed to encode package: {err}"),
        }
    }
}

impl Error for PackageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
        }
    }
}
