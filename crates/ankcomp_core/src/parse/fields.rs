//! Field rendering and media discovery.
//!
//! # Responsibility
//! - Render raw markdown fields to HTML.
//! - Collect local image references from rendered HTML.
//!
//! # Invariants
//! - Fenced code blocks are emitted as code, never reinterpreted as markdown.
//! - Media paths resolve against the owning document's directory and keep
//!   first-seen order without duplicates.

use crate::model::format::NoteFormat;
use crate::parse::classify::raw_fields;
use crate::parse::NoteError;
use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use std::path::{Path, PathBuf};

static IMG_SRC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid img src regex")
});

const REMOTE_PREFIXES: &[&str] = &["http://", "https://", "data:", "//"];

/// Rendered fields of one block plus the media they reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFields {
    pub fields: Vec<String>,
    pub media: Vec<PathBuf>,
}

/// Captures, renders and scans the fields of a classified body.
pub fn extract_fields(
    body: &str,
    format: NoteFormat,
    document_dir: &Path,
) -> Result<RenderedFields, NoteError> {
    let fields: Vec<String> = raw_fields(body, format)?
        .into_iter()
        .map(render_markdown)
        .collect();
    let media = media_references(&fields, document_dir);
    Ok(RenderedFields { fields, media })
}

/// Renders one markdown field to HTML.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);

    let mut rendered = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut rendered, parser);
    rendered
}

/// Returns local `<img src>` targets resolved against `document_dir`.
pub fn media_references(fields: &[String], document_dir: &Path) -> Vec<PathBuf> {
    let mut media: Vec<PathBuf> = Vec::new();
    for field in fields {
        for caps in IMG_SRC_RE.captures_iter(field) {
            let Some(src) = caps.get(1).or_else(|| caps.get(2)) else {
                continue;
            };
            let Some(relative) = local_source(src.as_str()) else {
                continue;
            };
            let resolved = document_dir.join(relative);
            if !media.contains(&resolved) {
                media.push(resolved);
            }
        }
    }
    media
}

fn local_source(src: &str) -> Option<PathBuf> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }
    let lowered = src.to_ascii_lowercase();
    if REMOTE_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix)) {
        return None;
    }

    let unescaped = src.replace("&amp;", "&");
    let decoded = urlencoding::decode(&unescaped)
        .map(|value| value.into_owned())
        .unwrap_or(unescaped);
    Some(PathBuf::from(decoded))
}

#[cfg(test)]
mod tests {
    use super::{extract_fields, media_references, render_markdown};
    use crate::model::format::NoteFormat;
    use std::path::{Path, PathBuf};

    #[test]
    fn renders_question_answer_fields() {
        let rendered = extract_fields("2+2:::4", NoteFormat::QuestionAnswer, Path::new("/d")).unwrap();
        assert_eq!(rendered.fields, vec!["<p>2+2</p>\n", "<p>4</p>\n"]);
        assert!(rendered.media.is_empty());
    }

    #[test]
    fn cloze_span_survives_rendering() {
        let rendered = extract_fields(
            "The capital of France is {{c1::Paris}}.",
            NoteFormat::ClozeDeletion,
            Path::new("/d"),
        )
        .unwrap();
        assert_eq!(
            rendered.fields,
            vec!["<p>The capital of France is {{c1::Paris}}.</p>\n"]
        );
    }

    #[test]
    fn fenced_code_is_kept_as_code() {
        let html = render_markdown("```\n# not a heading\n*not emphasis*\n```");
        assert!(html.contains("<pre><code># not a heading\n*not emphasis*\n</code></pre>"));
    }

    #[test]
    fn media_resolves_against_document_directory() {
        let fields = vec![r#"<p><img src="diagrams/fig1.png"></p>"#.to_string()];
        assert_eq!(
            media_references(&fields, Path::new("/decks/bio")),
            vec![PathBuf::from("/decks/bio/diagrams/fig1.png")]
        );
    }

    #[test]
    fn media_from_markdown_images_in_first_seen_order() {
        let rendered = extract_fields(
            "![b](b.png) then ![a](img/a%20b.png):::![b again](b.png) ![web](https://x.org/c.png)",
            NoteFormat::QuestionAnswer,
            Path::new("/notes"),
        )
        .unwrap();
        assert_eq!(
            rendered.media,
            vec![
                PathBuf::from("/notes/b.png"),
                PathBuf::from("/notes/img/a b.png"),
            ]
        );
    }
}
