//! Located ranges in a source file

use crate::line_index::LineIndex;
use crate::types::{FileId, Location, Range};
use serde::{Deserialize, Serialize};

/// A range in one source file.
///
/// Row and column are resolved when the value is built, so reading the
/// line of a node afterwards needs no further lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// The file this range belongs to
    pub file_id: FileId,
    /// The range inside that file
    pub range: Range,
}

impl Default for SourceInfo {
    fn default() -> Self {
        SourceInfo::original(FileId(0), Range::default())
    }
}

impl SourceInfo {
    /// Create source info for an already-resolved range
    pub fn original(file_id: FileId, range: Range) -> Self {
        SourceInfo { file_id, range }
    }

    /// Create source info for the byte range `start..end`.
    ///
    /// Offsets past the end of the indexed text are clamped to its end.
    pub fn from_offsets(file_id: FileId, start: usize, end: usize, index: &LineIndex) -> Self {
        let resolve = |offset: usize| {
            let offset = offset.min(index.total_length());
            index.offset_to_location(offset).unwrap_or(Location {
                offset,
                row: 0,
                column: 0,
            })
        };
        let start_loc = resolve(start);
        let end_loc = resolve(end.max(start));
        SourceInfo::original(
            file_id,
            Range {
                start: start_loc,
                end: end_loc,
            },
        )
    }

    /// Byte offset where this range starts
    pub fn start_offset(&self) -> usize {
        self.range.start.offset
    }

    /// Byte offset where this range ends
    pub fn end_offset(&self) -> usize {
        self.range.end.offset
    }

    /// 1-based line number of the start of this range
    pub fn line(&self) -> usize {
        self.range.start.line()
    }

    /// Length of the range in bytes
    pub fn length(&self) -> usize {
        self.range.len()
    }
}
