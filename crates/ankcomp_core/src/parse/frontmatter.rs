//! Document header (frontmatter) splitting.
//!
//! # Responsibility
//! - Separate a leading `---` fenced YAML header from the document body.
//! - Read only the header of a file when the body is not needed.
//!
//! # Invariants
//! - Splitting never fails: a missing or malformed header yields an empty
//!   header and the whole text as body, with the problem flagged.
//! - A fenced region whose first line is blank is a note block, not a header.

use crate::config::EngineConfig;
use crate::model::note::TagSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::BufRead;

const HEADER_FENCE: &str = "---";

static HEADER_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A---[ \t]*\n(?s:(.*?)\n)?---[ \t]*(?:\n|\z)").expect("valid header fence regex")
});

/// Document-level key/value metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentHeader {
    entries: BTreeMap<String, Value>,
}

impl DocumentHeader {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Declared collection name, when present as a non-blank scalar.
    pub fn collection(&self, config: &EngineConfig) -> Option<String> {
        let name = match self.get(&config.collection_key)? {
            Value::String(value) => value.trim().to_string(),
            Value::Number(value) => value.to_string(),
            Value::Bool(value) => value.to_string(),
            _ => return None,
        };
        (!name.is_empty()).then_some(name)
    }

    /// Declared document tags; accepts a list or a single string.
    pub fn tags(&self, config: &EngineConfig) -> TagSet {
        let mut tags = TagSet::new();
        match self.get(&config.header_tags_key) {
            Some(Value::Sequence(items)) => {
                for item in items {
                    if let Some(tag) = scalar_text(item) {
                        tags.insert(&tag);
                    }
                }
            }
            Some(other) => {
                if let Some(tag) = scalar_text(other) {
                    tags.insert(&tag);
                }
            }
            None => {}
        }
        tags
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Malformed header condition; reported alongside an empty header.
#[derive(Debug)]
pub enum HeaderError {
    InvalidYaml(serde_yaml::Error),
    NotAMapping,
}

impl Display for HeaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidYaml(err) => write!(f, "malformed header: {err}"),
            Self::NotAMapping => write!(f, "malformed header: expected key/value pairs"),
        }
    }
}

impl Error for HeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidYaml(err) => Some(err),
            Self::NotAMapping => None,
        }
    }
}

/// Result of splitting a document into header and body.
#[derive(Debug)]
pub struct SplitDocument<'a> {
    pub header: DocumentHeader,
    pub body: &'a str,
    /// 1-based line of `text` where `body` starts.
    pub body_line: usize,
    /// Set when a header fence was present but could not be used.
    pub warning: Option<HeaderError>,
}

/// Splits `text` into header metadata and body.
pub fn split_frontmatter(text: &str) -> SplitDocument<'_> {
    let whole = |warning| SplitDocument {
        header: DocumentHeader::default(),
        body: text,
        body_line: 1,
        warning,
    };

    let Some(caps) = HEADER_FENCE_RE.captures(text) else {
        return whole(None);
    };
    let raw = caps.get(1).map_or("", |m| m.as_str());
    if starts_with_blank_line(raw) {
        return whole(None);
    }

    match parse_header_block(raw) {
        Ok(header) => {
            let end = caps.get(0).map_or(0, |m| m.end());
            let consumed = &text[..end];
            SplitDocument {
                header,
                body: &text[end..],
                body_line: 1 + consumed.matches('\n').count(),
                warning: None,
            }
        }
        Err(err) => whole(Some(err)),
    }
}

/// Parses header YAML into a key/value map. Blank headers are empty maps.
pub fn parse_header_block(raw: &str) -> Result<DocumentHeader, HeaderError> {
    if raw.trim().is_empty() {
        return Ok(DocumentHeader::default());
    }

    let value: Value = serde_yaml::from_str(raw).map_err(HeaderError::InvalidYaml)?;
    let mapping = match value {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Ok(DocumentHeader::default()),
        _ => return Err(HeaderError::NotAMapping),
    };

    let entries = mapping
        .into_iter()
        .filter_map(|(key, value)| match key {
            Value::String(key) => Some((key, value)),
            _ => None,
        })
        .collect();
    Ok(DocumentHeader { entries })
}

/// Reads lines up to the closing header fence and parses only the header.
///
/// Body lines after the closing fence are never read.
pub fn read_header<R: BufRead>(
    reader: R,
) -> std::io::Result<(DocumentHeader, Option<HeaderError>)> {
    let mut lines = reader.lines();
    match lines.next().transpose()? {
        Some(first) if is_fence_line(&first) => {}
        _ => return Ok((DocumentHeader::default(), None)),
    }

    let mut raw = String::new();
    for line in lines {
        let line = line?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if is_fence_line(line) {
            if starts_with_blank_line(&raw) {
                return Ok((DocumentHeader::default(), None));
            }
            return Ok(match parse_header_block(&raw) {
                Ok(header) => (header, None),
                Err(err) => (DocumentHeader::default(), Some(err)),
            });
        }
        raw.push_str(line);
        raw.push('\n');
    }

    // Unterminated fence: no header.
    Ok((DocumentHeader::default(), None))
}

fn is_fence_line(line: &str) -> bool {
    line.trim_end_matches(['\r', ' ', '\t']) == HEADER_FENCE
}

fn starts_with_blank_line(raw: &str) -> bool {
    raw.lines().next().is_some_and(|line| line.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{read_header, split_frontmatter, HeaderError};
    use crate::config::EngineConfig;
    use std::io::Cursor;

    #[test]
    fn splits_header_and_body() {
        let text = "---\ndeck: Biology\ntags: [cells, review]\n---\nbody line\n";
        let split = split_frontmatter(text);
        let config = EngineConfig::default();
        assert!(split.warning.is_none());
        assert_eq!(split.header.collection(&config).as_deref(), Some("Biology"));
        assert_eq!(split.header.tags(&config).as_slice(), ["cells", "review"]);
        assert_eq!(split.body, "body line\n");
        assert_eq!(split.body_line, 5);
    }

    #[test]
    fn missing_header_keeps_whole_text() {
        let split = split_frontmatter("just text\n");
        assert!(split.header.is_empty());
        assert!(split.warning.is_none());
        assert_eq!(split.body, "just text\n");
        assert_eq!(split.body_line, 1);
    }

    #[test]
    fn malformed_header_degrades_to_empty_map() {
        let text = "---\ndeck: [unclosed\n---\nbody\n";
        let split = split_frontmatter(text);
        assert!(matches!(split.warning, Some(HeaderError::InvalidYaml(_))));
        assert!(split.header.is_empty());
        assert_eq!(split.body, text);
    }

    #[test]
    fn scalar_header_is_flagged() {
        let split = split_frontmatter("---\njust a sentence\n---\nbody\n");
        assert!(matches!(split.warning, Some(HeaderError::NotAMapping)));
        assert!(split.header.is_empty());
    }

    #[test]
    fn leading_note_block_is_not_a_header() {
        let text = "---\n\nDefine ratio: a:::b\n\n---\n[^id]: AbC1234XYZ\n";
        let split = split_frontmatter(text);
        assert!(split.warning.is_none());
        assert!(split.header.is_empty());
        assert_eq!(split.body, text);
    }

    #[test]
    fn empty_header_fence_is_an_empty_map() {
        let split = split_frontmatter("---\n---\nbody");
        assert!(split.warning.is_none());
        assert_eq!(split.body, "body");
    }

    #[test]
    fn single_string_tag_is_accepted() {
        let split = split_frontmatter("---\ntags: solo\n---\n");
        let tags = split.header.tags(&EngineConfig::default());
        assert_eq!(tags.as_slice(), ["solo"]);
    }

    #[test]
    fn read_header_stops_at_closing_fence() {
        let text = "---\ndeck: Spanish\n---\nbody that is never parsed: [\n";
        let (header, warning) = read_header(Cursor::new(text)).unwrap();
        assert!(warning.is_none());
        assert_eq!(
            header.collection(&EngineConfig::default()).as_deref(),
            Some("Spanish")
        );
    }

    #[test]
    fn read_header_without_fence_is_empty() {
        let (header, warning) = read_header(Cursor::new("no header\n")).unwrap();
        assert!(header.is_empty());
        assert!(warning.is_none());
    }
}
