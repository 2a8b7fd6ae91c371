//! Source context for managing files

use crate::line_index::LineIndex;
use crate::types::FileId;
use serde::{Deserialize, Serialize};

/// Registry of in-memory source files.
///
/// Diagnostics carry a [`FileId`]; renderers look the file up here to show
/// the offending snippet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceContext {
    files: Vec<SourceFile>,
}

/// A source file with content and its line index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// File path or identifier
    pub path: String,
    /// File content
    pub content: String,
    /// Line index, rebuilt from content when missing
    #[serde(skip)]
    line_index: Option<LineIndex>,
}

impl SourceFile {
    /// Line index for this file's content
    pub fn line_index(&self) -> LineIndex {
        self.line_index
            .clone()
            .unwrap_or_else(|| LineIndex::new(&self.content))
    }
}

impl SourceContext {
    /// Create a new empty source context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the context and return its ID
    pub fn add_file(&mut self, path: impl Into<String>, content: impl Into<String>) -> FileId {
        let id = FileId(self.files.len());
        let content = content.into();
        let line_index = Some(LineIndex::new(&content));
        self.files.push(SourceFile {
            path: path.into(),
            content,
            line_index,
        });
        id
    }

    /// Get a file by ID
    pub fn get_file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0)
    }

    /// Number of registered files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file has been registered
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
