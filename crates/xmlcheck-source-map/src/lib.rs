//! Source location tracking for xmlcheck
//!
//! This crate maps byte offsets in a source text to physical lines and
//! columns. Parsers record a [`SourceInfo`] for every node they build, so
//! that anything reported later can point back at the line it came from.
//!
//! # Overview
//!
//! The core types are:
//! - [`LineIndex`]: Newline index over a text, for O(log n) offset lookups
//! - [`SourceInfo`]: A located range in one file
//! - [`SourceContext`]: Registry of files, used when rendering snippets
//!
//! # Example
//!
//! ```rust
//! use xmlcheck_source_map::*;
//!
//! let index = LineIndex::new("<a>\n  <b/>\n</a>");
//! let info = SourceInfo::from_offsets(FileId(0), 6, 10, &index);
//!
//! assert_eq!(info.line(), 2);
//! assert_eq!(info.range.start.column, 2);
//! ```

pub mod context;
pub mod line_index;
pub mod source_info;
pub mod types;

// Re-export main types
pub use context::{SourceContext, SourceFile};
pub use line_index::LineIndex;
pub use source_info::SourceInfo;
pub use types::{FileId, Location, Range};
