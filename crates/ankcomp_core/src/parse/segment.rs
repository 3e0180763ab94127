//! Block segmentation of a document body.
//!
//! # Responsibility
//! - Find `---` fenced note blocks and their trailing `[^key]: value` footers.
//!
//! # Invariants
//! - Segmentation is pattern-driven and never fails; no blocks is an empty list.
//! - Blocks keep document order.
//! - Only footer lines whose key is a configured footer key are consumed.

use crate::config::EngineConfig;
use once_cell::sync::Lazy;
use regex::Regex;

/// Fence, blank padding, body, blank padding, fence.
static BLOCK_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^---[ \t]*\n(?:[ \t]*\n)+(?s:(.+?))\n(?:[ \t]*\n)+---[ \t]*(?:\n|\z)")
        .expect("valid block fence regex")
});

/// One raw, unclassified note unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    /// 0-based ordinal within the document.
    pub position: usize,
    /// 1-based line of the opening fence.
    pub line: usize,
    /// Trimmed body text between the fences.
    pub body: &'a str,
    /// Consumed footer lines, possibly empty.
    pub footer: &'a str,
}

/// Splits bodies into blocks using the configured footer keys.
#[derive(Debug, Clone)]
pub struct BlockSegmenter {
    footer_line: Regex,
}

impl BlockSegmenter {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            footer_line: footer_line_regex(config),
        }
    }

    /// Segments `body`; `first_line` is the document line `body` starts on.
    pub fn segment<'a>(&self, body: &'a str, first_line: usize) -> Vec<Block<'a>> {
        let mut blocks = Vec::new();
        let mut cursor = 0;
        let mut line = first_line;
        let mut counted = 0;

        while let Some(caps) = BLOCK_FENCE_RE.captures_at(body, cursor) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                break;
            };

            line += body[counted..whole.start()].matches('\n').count();
            counted = whole.start();

            let footer_end = self.footer_end(body, whole.end());
            blocks.push(Block {
                position: blocks.len(),
                line,
                body: inner.as_str().trim(),
                footer: body[whole.end()..footer_end].trim_end(),
            });
            cursor = footer_end.max(whole.end());
            if cursor >= body.len() {
                break;
            }
        }

        blocks
    }

    /// Returns the end offset of the footer lines starting at `start`.
    fn footer_end(&self, text: &str, start: usize) -> usize {
        let mut end = start;
        let mut pos = start;
        while pos < text.len() {
            let rest = &text[pos..];
            let (line, next) = match rest.find('\n') {
                Some(i) => (&rest[..i], pos + i + 1),
                None => (rest, text.len()),
            };
            if line.trim().is_empty() {
                pos = next;
                continue;
            }
            if !self.footer_line.is_match(line) {
                break;
            }
            pos = next;
            end = next;
        }
        end
    }
}

fn footer_line_regex(config: &EngineConfig) -> Regex {
    let keys = [&config.id_key, &config.tag_key, &config.source_key]
        .iter()
        .map(|key| regex::escape(key))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"^\[\^(?:{keys})\]:[ \t]*\S"))
        .expect("escaped footer keys form a valid regex")
}

#[cfg(test)]
mod tests {
    use super::BlockSegmenter;
    use crate::config::EngineConfig;

    fn segmenter() -> BlockSegmenter {
        BlockSegmenter::new(&EngineConfig::default())
    }

    #[test]
    fn finds_blocks_with_footers_in_order() {
        let body = "intro\n\n---\n\n2+2:::4\n\n---\n[^id]: AbC1234XYZ\n[^tag]: math\n\n---\n\nfront::back\n\n---\n[^tag]: x\n[^id]: ZZZ1234XYZ\n";
        let blocks = segmenter().segment(body, 1);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].body, "2+2:::4");
        assert_eq!(blocks[0].footer, "[^id]: AbC1234XYZ\n[^tag]: math");
        assert_eq!(blocks[0].line, 3);
        assert_eq!(blocks[1].position, 1);
        assert_eq!(blocks[1].body, "front::back");
        assert_eq!(blocks[1].footer, "[^tag]: x\n[^id]: ZZZ1234XYZ");
        assert_eq!(blocks[1].line, 11);
    }

    #[test]
    fn stops_footer_at_foreign_line() {
        let body = "---\n\nq:::a\n\n---\n[^id]: AbC1234XYZ\nSome prose.\n[^tag]: stray\n";
        let blocks = segmenter().segment(body, 1);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].footer, "[^id]: AbC1234XYZ");
    }

    #[test]
    fn unknown_footer_keys_are_not_consumed() {
        let body = "---\n\nq:::a\n\n---\n[^note]: aside\n[^id]: AbC1234XYZ\n";
        let blocks = segmenter().segment(body, 1);
        assert_eq!(blocks[0].footer, "");
    }

    #[test]
    fn multiline_body_and_missing_trailing_newline() {
        let body = "---\n\nline one\n\nline two:::answer\n\n---";
        let blocks = segmenter().segment(body, 4);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "line one\n\nline two:::answer");
        assert_eq!(blocks[0].footer, "");
        assert_eq!(blocks[0].line, 4);
    }

    #[test]
    fn no_blocks_is_empty() {
        assert!(segmenter().segment("# Notes\n\nnothing here\n", 1).is_empty());
        assert!(segmenter().segment("---\nno padding\n---\n", 1).is_empty());
    }

    #[test]
    fn custom_footer_keys() {
        let config = EngineConfig {
            id_key: "guid".to_string(),
            ..EngineConfig::default()
        };
        let body = "---\n\nq:::a\n\n---\n[^guid]: AbC1234XYZ\n";
        let blocks = BlockSegmenter::new(&config).segment(body, 1);
        assert_eq!(blocks[0].footer, "[^guid]: AbC1234XYZ");
        let default_blocks = segmenter().segment(body, 1);
        assert_eq!(default_blocks[0].footer, "");
    }
}
