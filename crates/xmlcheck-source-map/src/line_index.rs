//! Newline index for offset to line lookups

use crate::types::Location;
use serde::{Deserialize, Serialize};

/// Sorted newline positions of a text.
///
/// Built once per document by scanning the content; every later lookup is a
/// binary search over the newline offsets, so converting a byte offset to a
/// row and column is O(log n) in the number of lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineIndex {
    /// Byte offsets of each line terminator: a `\n`, or a `\r` not
    /// followed by `\n`
    line_breaks: Vec<usize>,

    /// Total length of the text in bytes
    total_length: usize,
}

impl LineIndex {
    /// Index the line breaks of `content`.
    ///
    /// `\n`, `\r\n` and a lone `\r` each end one line.
    ///
    /// # Example
    ///
    /// ```
    /// use xmlcheck_source_map::LineIndex;
    ///
    /// let index = LineIndex::new("line 1\nline 2\nline 3");
    /// assert_eq!(index.line_count(), 3);
    /// ```
    pub fn new(content: &str) -> Self {
        let bytes = content.as_bytes();
        let line_breaks: Vec<usize> = bytes
            .iter()
            .enumerate()
            .filter_map(|(idx, &b)| {
                let ends_line = b == b'\n' || (b == b'\r' && bytes.get(idx + 1) != Some(&b'\n'));
                ends_line.then_some(idx)
            })
            .collect();

        LineIndex {
            line_breaks,
            total_length: content.len(),
        }
    }

    /// Convert a byte offset to a Location with row and column.
    ///
    /// A `\n` belongs to the line it terminates. Returns None if the offset
    /// is past the end of the text.
    ///
    /// # Example
    ///
    /// ```
    /// use xmlcheck_source_map::LineIndex;
    ///
    /// let index = LineIndex::new("hello\nworld");
    /// let loc = index.offset_to_location(6).unwrap();
    /// assert_eq!(loc.row, 1);
    /// assert_eq!(loc.column, 0);
    /// ```
    pub fn offset_to_location(&self, offset: usize) -> Option<Location> {
        if offset > self.total_length {
            return None;
        }

        // Ok(idx): offset sits on the idx-th newline, which ends row idx.
        // Err(idx): idx newlines precede the offset.
        let row = match self.line_breaks.binary_search(&offset) {
            Ok(idx) | Err(idx) => idx,
        };

        let line_start = if row == 0 {
            0
        } else {
            self.line_breaks[row - 1] + 1
        };

        Some(Location {
            offset,
            row,
            column: offset - line_start,
        })
    }

    /// The 1-based line number containing `offset`.
    pub fn line_number(&self, offset: usize) -> Option<usize> {
        self.offset_to_location(offset).map(|loc| loc.line())
    }

    /// Byte offset where the given 0-based row starts.
    pub fn row_start(&self, row: usize) -> Option<usize> {
        match row {
            0 => Some(0),
            r if r <= self.line_breaks.len() => Some(self.line_breaks[r - 1] + 1),
            _ => None,
        }
    }

    /// Get the total length of the text in bytes
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Get the number of lines in the text
    pub fn line_count(&self) -> usize {
        self.line_breaks.len() + 1
    }
}
