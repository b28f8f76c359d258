//! UTF-8 aware line/column to byte-offset conversion.
//!
//! Parse locations use code-point columns, but anchors are byte ranges.
//! The index is built once per buffer and consulted for every emitted span.

use crate::base::ParseLocation;

/// Maps (line, column) coordinates to absolute byte offsets in a buffer.
///
/// Lines are 1-indexed when querying (the textformat parser records them
/// 0-indexed and callers add 1). Columns are 0-indexed and count code
/// points, not bytes.
pub struct LineIndex<'a> {
    text: &'a str,
    /// Byte offset of the start of each line; `line_starts[0]` is line 1.
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { text, line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset of the start of a 1-indexed line.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        if line == 0 {
            return None;
        }
        self.line_starts.get(line - 1).copied()
    }

    /// Absolute byte offset for a 1-indexed line and 0-indexed code-point
    /// column. Columns past the end of the line clamp to the line end.
    pub fn offset(&self, line: usize, column: usize) -> Option<usize> {
        let start = self.line_start(line)?;
        let rest = &self.text[start..];
        let mut offset = start;
        let mut seen = 0;
        for (byte_pos, c) in rest.char_indices() {
            if c == '\n' || seen == column {
                return Some(start + byte_pos);
            }
            seen += 1;
            offset = start + byte_pos + c.len_utf8();
        }
        Some(offset)
    }

    /// Inverse conversion: byte offset to a 0-indexed line/column pair.
    /// The offset must lie on a char boundary.
    pub fn location(&self, offset: usize) -> ParseLocation {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let start = self.line_starts[line];
        let column = self.text[start..offset].chars().count();
        ParseLocation::new(line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_first_line() {
        let index = LineIndex::new("abc def");
        assert_eq!(index.offset(1, 0), Some(0));
        assert_eq!(index.offset(1, 4), Some(4));
    }

    #[test]
    fn test_offset_later_lines() {
        let index = LineIndex::new("ab\ncd\nef");
        assert_eq!(index.offset(2, 0), Some(3));
        assert_eq!(index.offset(2, 1), Some(4));
        assert_eq!(index.offset(3, 1), Some(7));
    }

    #[test]
    fn test_offset_line_out_of_range() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.offset(0, 0), None);
        assert_eq!(index.offset(3, 0), None);
    }

    #[test]
    fn test_offset_clamps_to_line_end() {
        let index = LineIndex::new("ab\ncd");
        // Column past the end of line 1 stops before the newline.
        assert_eq!(index.offset(1, 99), Some(2));
        assert_eq!(index.offset(2, 99), Some(5));
    }

    #[test]
    fn test_multibyte_columns_count_code_points() {
        // "é" is 2 bytes, "日" is 3 bytes.
        let index = LineIndex::new("é日x: 1");
        assert_eq!(index.offset(1, 0), Some(0));
        assert_eq!(index.offset(1, 1), Some(2));
        assert_eq!(index.offset(1, 2), Some(5));
        assert_eq!(index.offset(1, 3), Some(6));
    }

    #[test]
    fn test_multibyte_on_earlier_line_does_not_shift() {
        let index = LineIndex::new("# café\nfield: 1");
        // Line 2 starts after the 7-byte first line plus newline.
        assert_eq!(index.offset(2, 0), Some(8));
    }

    #[test]
    fn test_location_round_trip() {
        let text = "ab\ncdé\nf";
        let index = LineIndex::new(text);
        let loc = index.location(5);
        assert_eq!(loc, ParseLocation::new(1, 2));
        // location() is 0-indexed, offset() takes 1-indexed lines.
        assert_eq!(index.offset(loc.line + 1, loc.column), Some(5));
    }

    #[test]
    fn test_line_count() {
        assert_eq!(LineIndex::new("").line_count(), 1);
        assert_eq!(LineIndex::new("a\nb").line_count(), 2);
        assert_eq!(LineIndex::new("a\nb\n").line_count(), 3);
    }
}
