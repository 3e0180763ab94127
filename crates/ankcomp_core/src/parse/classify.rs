//! Note format classification and raw field capture.
//!
//! # Responsibility
//! - Hold the body pattern for every `NoteFormat` in one table.
//! - Classify a block body by evaluating every pattern uniformly.
//! - Capture the raw (markdown) fields of a classified body.
//!
//! # Invariants
//! - Classification is exactly-one-match: zero matches and multiple
//!   matches are distinct errors, never resolved by priority.
//! - Separators inside fenced code, inline code and cloze spans do not count.
//! - A separator is a colon run of exactly its own length, so `:::` is never
//!   read as `::` and vice versa.

use crate::model::format::NoteFormat;
use crate::parse::NoteError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

static FENCED_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)^[ \t]*(?:```|~~~).*?^[ \t]*(?:```|~~~)[ \t]*$")
        .expect("valid fenced code regex")
});
static INLINE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`[^`\n]+`").expect("valid inline code regex"));
static CLOZE_SPAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\{\{\s*c\d+\s*::.+?\}\}").expect("valid cloze span regex")
});
static COLON_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":+").expect("valid colon run regex"));

const QA_SEPARATOR: &str = ":::";
const FRONT_BACK_SEPARATOR: &str = "::";

/// How a format recognizes a body.
#[derive(Debug, Clone, Copy)]
enum BodyPattern {
    /// Exactly one separator token splits the body into two fields.
    Separator(&'static str),
    /// One or more inline spans; the whole body is the single field.
    Spans(&'static Lazy<Regex>),
}

#[derive(Debug, Clone, Copy)]
struct FormatRule {
    format: NoteFormat,
    pattern: BodyPattern,
}

static FORMAT_CATALOG: [FormatRule; 3] = [
    FormatRule {
        format: NoteFormat::QuestionAnswer,
        pattern: BodyPattern::Separator(QA_SEPARATOR),
    },
    FormatRule {
        format: NoteFormat::FrontBack,
        pattern: BodyPattern::Separator(FRONT_BACK_SEPARATOR),
    },
    FormatRule {
        format: NoteFormat::ClozeDeletion,
        pattern: BodyPattern::Spans(&CLOZE_SPAN_RE),
    },
];

/// A body plus its masked projections. All three share byte offsets.
struct BodyView<'a> {
    raw: &'a str,
    /// Code regions blanked.
    without_code: String,
    /// Code regions and cloze spans blanked.
    without_code_or_spans: String,
}

impl<'a> BodyView<'a> {
    fn new(raw: &'a str) -> Self {
        let without_fences = blank_out(raw, &FENCED_CODE_RE);
        let without_code = blank_out(&without_fences, &INLINE_CODE_RE).into_owned();
        let without_code_or_spans = blank_out(&without_code, &CLOZE_SPAN_RE).into_owned();
        Self {
            raw,
            without_code,
            without_code_or_spans,
        }
    }

    fn separators(&self, token: &str) -> Vec<(usize, usize)> {
        COLON_RUN_RE
            .find_iter(&self.without_code_or_spans)
            .filter(|m| m.as_str() == token)
            .map(|m| (m.start(), m.end()))
            .collect()
    }
}

/// Replaces every match with spaces of the same byte length.
fn blank_out<'t>(text: &'t str, re: &Regex) -> Cow<'t, str> {
    re.replace_all(text, |caps: &Captures<'_>| " ".repeat(caps[0].len()))
}

impl FormatRule {
    fn matches(&self, view: &BodyView<'_>) -> bool {
        match self.pattern {
            BodyPattern::Separator(token) => !view.separators(token).is_empty(),
            BodyPattern::Spans(re) => re.is_match(&view.without_code),
        }
    }

    fn raw_fields<'a>(&self, view: &BodyView<'a>) -> Result<Vec<&'a str>, NoteError> {
        let raw: &'a str = view.raw;
        let fields = match self.pattern {
            BodyPattern::Separator(token) => {
                let found = view.separators(token);
                let [(start, end)] = found.as_slice() else {
                    return Err(self.extraction_failure(format!(
                        "expected one `{token}` separator, found {}",
                        found.len()
                    )));
                };
                vec![raw[..*start].trim(), raw[*end..].trim()]
            }
            BodyPattern::Spans(re) => {
                if !re.is_match(&view.without_code) {
                    return Err(self.extraction_failure("no span found".to_string()));
                }
                vec![raw.trim()]
            }
        };

        if fields.len() != self.format.arity() {
            return Err(self.extraction_failure(format!(
                "expected {} fields, captured {}",
                self.format.arity(),
                fields.len()
            )));
        }
        for (name, value) in self.format.field_names().iter().zip(&fields) {
            if value.is_empty() {
                return Err(self.extraction_failure(format!("field `{name}` is empty")));
            }
        }
        Ok(fields)
    }

    fn extraction_failure(&self, reason: String) -> NoteError {
        NoteError::FieldExtraction {
            format: self.format,
            reason,
        }
    }
}

fn rule_for(format: NoteFormat) -> &'static FormatRule {
    match format {
        NoteFormat::QuestionAnswer => &FORMAT_CATALOG[0],
        NoteFormat::FrontBack => &FORMAT_CATALOG[1],
        NoteFormat::ClozeDeletion => &FORMAT_CATALOG[2],
    }
}

/// Returns the unique format whose pattern matches `body`.
pub fn classify(body: &str) -> Result<NoteFormat, NoteError> {
    let view = BodyView::new(body);
    let matched: Vec<NoteFormat> = FORMAT_CATALOG
        .iter()
        .filter(|rule| rule.matches(&view))
        .map(|rule| rule.format)
        .collect();

    match matched.as_slice() {
        [] => Err(NoteError::UnrecognizedFormat),
        [format] => Ok(*format),
        _ => Err(NoteError::AmbiguousFormat(matched)),
    }
}

/// Captures the raw markdown fields of `body` using `format`'s pattern.
pub fn raw_fields(body: &str, format: NoteFormat) -> Result<Vec<&str>, NoteError> {
    rule_for(format).raw_fields(&BodyView::new(body))
}

#[cfg(test)]
mod tests {
    use super::{classify, raw_fields};
    use crate::model::format::NoteFormat;
    use crate::parse::NoteError;

    #[test]
    fn catalog_rows_line_up_with_formats() {
        for format in NoteFormat::ALL {
            assert_eq!(super::rule_for(format).format, format);
        }
    }

    #[test]
    fn classifies_each_format() {
        assert_eq!(classify("2+2:::4").unwrap(), NoteFormat::QuestionAnswer);
        assert_eq!(classify("front::back").unwrap(), NoteFormat::FrontBack);
        assert_eq!(
            classify("The capital of France is {{c1::Paris}}.").unwrap(),
            NoteFormat::ClozeDeletion
        );
    }

    #[test]
    fn plain_text_is_unrecognized() {
        assert!(matches!(
            classify("no separator here: just prose"),
            Err(NoteError::UnrecognizedFormat)
        ));
    }

    #[test]
    fn cloze_inside_question_answer_is_ambiguous() {
        let err = classify("Capital of France? ::: {{c1::Paris}}").unwrap_err();
        match err {
            NoteError::AmbiguousFormat(formats) => assert_eq!(
                formats,
                vec![NoteFormat::QuestionAnswer, NoteFormat::ClozeDeletion]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn both_separators_are_ambiguous() {
        assert!(matches!(
            classify("a:::b and c::d"),
            Err(NoteError::AmbiguousFormat(_))
        ));
    }

    #[test]
    fn code_does_not_count_as_separator() {
        assert_eq!(
            classify("Which module reads files?:::`std::fs`").unwrap(),
            NoteFormat::QuestionAnswer
        );
        let fenced = "What does this print?\n\n```rust\nlet x = std::i32::MAX;\n```\n:::\nThe max.";
        assert_eq!(classify(fenced).unwrap(), NoteFormat::QuestionAnswer);
        assert_eq!(
            classify("Template: `{{c1::x}}` :: shown literally").unwrap(),
            NoteFormat::FrontBack
        );
    }

    #[test]
    fn text_after_fence_marker_does_not_close_code() {
        let body = "What follows?\n```\nlet x = 1;\n```:::the answer";
        assert_eq!(classify(body).unwrap(), NoteFormat::QuestionAnswer);
    }

    #[test]
    fn longer_colon_runs_are_neither_separator() {
        assert!(matches!(
            classify("a::::b"),
            Err(NoteError::UnrecognizedFormat)
        ));
    }

    #[test]
    fn captures_fields_around_single_separator() {
        assert_eq!(
            raw_fields(" 2+2 \n:::\n 4 ", NoteFormat::QuestionAnswer).unwrap(),
            vec!["2+2", "4"]
        );
        let cloze = "The capital of France is {{c1::Paris}}.";
        assert_eq!(
            raw_fields(cloze, NoteFormat::ClozeDeletion).unwrap(),
            vec![cloze]
        );
    }

    #[test]
    fn repeated_separator_is_an_extraction_failure() {
        let err = raw_fields("a:::b:::c", NoteFormat::QuestionAnswer).unwrap_err();
        assert!(matches!(
            err,
            NoteError::FieldExtraction {
                format: NoteFormat::QuestionAnswer,
                ..
            }
        ));
    }

    #[test]
    fn empty_side_is_an_extraction_failure() {
        assert!(matches!(
            raw_fields(":::answer", NoteFormat::QuestionAnswer),
            Err(NoteError::FieldExtraction { .. })
        ));
    }
}
