//! Issues reported by checks.

use serde::Serialize;
use xmlcheck_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use xmlcheck_source_map::SourceInfo;

/// A finding at a 1-based line of the checked document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    line: usize,
    message: String,
    #[serde(skip)]
    location: Option<SourceInfo>,
}

impl Issue {
    /// An issue at `line` with no finer location.
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: line.max(1),
            message: message.into(),
            location: None,
        }
    }

    /// An issue covering the source range of a node.
    pub fn at(location: SourceInfo, message: impl Into<String>) -> Self {
        Self {
            line: location.line(),
            message: message.into(),
            location: Some(location),
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&SourceInfo> {
        self.location.as_ref()
    }

    /// A warning diagnostic for this issue, located when the issue is.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let builder = DiagnosticMessageBuilder::warning(self.message.clone());
        match &self.location {
            Some(location) => builder.with_location(location.clone()).build(),
            None => builder.add_note(format!("Reported at line {}", self.line)).build(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmlcheck_source_map::{FileId, LineIndex};

    #[test]
    fn test_line_comes_from_location() {
        let text = "<a>\n  <b/>\n</a>";
        let index = LineIndex::new(text);
        let issue = Issue::at(SourceInfo::from_offsets(FileId(0), 6, 10, &index), "found b");
        assert_eq!(issue.line(), 2);
        assert_eq!(issue.message(), "found b");
    }

    #[test]
    fn test_serializes_line_and_message_only() {
        let text = "<a/>";
        let index = LineIndex::new(text);
        let issue = Issue::at(SourceInfo::from_offsets(FileId(0), 0, 4, &index), "found a");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json, serde_json::json!({ "line": 1, "message": "found a" }));
    }

    #[test]
    fn test_unlocated_diagnostic() {
        insta::assert_snapshot!(Issue::new(1, "Document matches").to_diagnostic().to_text(None), @r"
        Warning: Document matches
        • Reported at line 1
        ");
    }
}
