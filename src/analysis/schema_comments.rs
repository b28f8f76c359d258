//! Scanner for schema directives embedded in leading comments.
//!
//! Textprotos conventionally open with a comment block binding them to
//! their schema:
//!
//! ```text
//! # proto-file: some/file.proto
//! # proto-message: pkg.Message
//! # proto-import: extra/file.proto
//! ```
//!
//! Each matched directive yields the byte span of its trimmed value within
//! the original buffer, so the analyzer can anchor it without re-scanning.
//! Scanning stops at the first non-blank, non-comment line.

use crate::base::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive<'a> {
    /// Whitespace-trimmed value text.
    pub value: &'a str,
    /// Byte range of `value` within the scanned buffer.
    pub span: Span,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaComments<'a> {
    pub proto_file: Option<Directive<'a>>,
    pub proto_message: Option<Directive<'a>>,
    pub proto_imports: Vec<Directive<'a>>,
}

/// Scan the leading comment block of `text` for schema directives.
/// Directives with empty values are ignored; a repeated `proto-file` or
/// `proto-message` keeps the last occurrence.
pub fn scan(text: &str) -> SchemaComments<'_> {
    let mut comments = SchemaComments::default();
    let mut line_start = 0;
    for line in text.split_inclusive('\n') {
        let offset = line_start;
        line_start += line.len();

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !trimmed.starts_with('#') {
            break;
        }
        if let Some((key, directive)) = parse_directive(line, offset) {
            match key {
                "proto-file:" => comments.proto_file = Some(directive),
                "proto-message:" => comments.proto_message = Some(directive),
                _ => comments.proto_imports.push(directive),
            }
        }
    }
    comments
}

const DIRECTIVE_KEYS: [&str; 3] = ["proto-file:", "proto-message:", "proto-import:"];

fn parse_directive(line: &str, line_offset: usize) -> Option<(&'static str, Directive<'_>)> {
    let hash = line.find('#')?;
    let content = &line[hash + 1..];
    let keyed = content.trim_start();
    let key_offset = hash + 1 + (content.len() - keyed.len());

    for key in DIRECTIVE_KEYS {
        let Some(rest) = keyed.strip_prefix(key) else {
            continue;
        };
        let value = rest.trim();
        if value.is_empty() {
            return None;
        }
        let value_offset = key_offset + key.len() + (rest.len() - rest.trim_start().len());
        let begin = line_offset + value_offset;
        return Some((
            key,
            Directive {
                value,
                span: Span::new(begin, begin + value.len()),
            },
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_three_directives() {
        let text = "# proto-file: a.proto\n# proto-message: pkg.M\n# proto-import: b.proto\nfield: 1\n";
        let comments = scan(text);
        let file = comments.proto_file.unwrap();
        assert_eq!(file.value, "a.proto");
        assert_eq!(file.span.slice(text), "a.proto");
        let message = comments.proto_message.unwrap();
        assert_eq!(message.value, "pkg.M");
        assert_eq!(message.span.slice(text), "pkg.M");
        assert_eq!(comments.proto_imports.len(), 1);
        assert_eq!(comments.proto_imports[0].span.slice(text), "b.proto");
    }

    #[test]
    fn test_spans_are_buffer_absolute() {
        let text = "# proto-file: a.proto\n# proto-message: pkg.M\n";
        let comments = scan(text);
        assert_eq!(comments.proto_file.unwrap().span, Span::new(14, 21));
        assert_eq!(comments.proto_message.unwrap().span, Span::new(39, 44));
    }

    #[test]
    fn test_directives_after_body_are_ignored() {
        let text = "field: 1\n# proto-message: pkg.M\n";
        let comments = scan(text);
        assert!(comments.proto_message.is_none());
    }

    #[test]
    fn test_blank_lines_do_not_end_the_block() {
        let text = "# header comment\n\n# proto-message: pkg.M\nfield: 1\n";
        assert!(scan(text).proto_message.is_some());
    }

    #[test]
    fn test_repeated_imports_accumulate() {
        let text = "# proto-import: a.proto\n# proto-import: b.proto\n";
        let comments = scan(text);
        let values: Vec<&str> = comments.proto_imports.iter().map(|d| d.value).collect();
        assert_eq!(values, vec!["a.proto", "b.proto"]);
    }

    #[test]
    fn test_value_whitespace_is_trimmed_but_span_tight() {
        let text = "#   proto-file:    spaced.proto   \n";
        let comments = scan(text);
        let file = comments.proto_file.unwrap();
        assert_eq!(file.value, "spaced.proto");
        assert_eq!(file.span.slice(text), "spaced.proto");
    }

    #[test]
    fn test_empty_value_is_ignored() {
        assert!(scan("# proto-file:\n").proto_file.is_none());
    }

    #[test]
    fn test_unrelated_comments_are_skipped() {
        let comments = scan("# Copyright notice\n# proto-message: pkg.M\n");
        assert_eq!(comments.proto_message.unwrap().value, "pkg.M");
    }

    #[test]
    fn test_indented_comment_lines() {
        let comments = scan("  # proto-message: pkg.M\nfield: 1\n");
        assert_eq!(comments.proto_message.unwrap().value, "pkg.M");
    }

    #[test]
    fn test_last_occurrence_wins() {
        let comments = scan("# proto-message: pkg.A\n# proto-message: pkg.B\n");
        assert_eq!(comments.proto_message.unwrap().value, "pkg.B");
    }
}
