//! Builder API for diagnostic messages.
//!
//! The builder follows the tidyverse structure: a title, an optional problem
//! statement, bulleted details, and hints.

use crate::diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};
use xmlcheck_source_map::SourceInfo;

/// Maximum number of details before [`DiagnosticMessageBuilder::build_with_validation`] warns.
const MAX_DETAILS: usize = 5;

/// Builder for [`DiagnosticMessage`].
///
/// # Example
///
/// ```
/// use xmlcheck_error_reporting::DiagnosticMessageBuilder;
///
/// let msg = DiagnosticMessageBuilder::error("Unbound namespace prefix")
///     .with_code("X-2-2")
///     .problem("Prefix `ui` is not bound to a namespace URI")
///     .add_hint("Add `ui` to the check's namespaces?")
///     .build();
/// assert_eq!(msg.code.as_deref(), Some("X-2-2"));
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosticMessageBuilder {
    message: DiagnosticMessage,
}

impl DiagnosticMessageBuilder {
    fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            message: DiagnosticMessage::new(kind, title),
        }
    }

    /// Start an error diagnostic.
    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    /// Start a warning diagnostic.
    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    /// Start an info diagnostic.
    pub fn info(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Info, title)
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.message.code = Some(code.into());
        self
    }

    /// Set the problem statement.
    pub fn problem(mut self, problem: impl Into<MessageContent>) -> Self {
        self.message.problem = Some(problem.into());
        self
    }

    /// Add an error detail (✖).
    pub fn add_detail(self, detail: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Error, detail.into(), None)
    }

    /// Add an error detail pointing at a source location.
    pub fn add_detail_at(self, detail: impl Into<MessageContent>, location: SourceInfo) -> Self {
        self.push_detail(DetailKind::Error, detail.into(), Some(location))
    }

    /// Add an info detail (ℹ).
    pub fn add_info(self, info: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Info, info.into(), None)
    }

    /// Add a note detail (•).
    pub fn add_note(self, note: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Note, note.into(), None)
    }

    /// Add a hint.
    pub fn add_hint(mut self, hint: impl Into<MessageContent>) -> Self {
        self.message.hints.push(hint.into());
        self
    }

    /// Attach the main source location.
    pub fn with_location(mut self, location: SourceInfo) -> Self {
        self.message.location = Some(location);
        self
    }

    fn push_detail(
        mut self,
        kind: DetailKind,
        content: MessageContent,
        location: Option<SourceInfo>,
    ) -> Self {
        self.message.details.push(DetailItem {
            kind,
            content,
            location,
        });
        self
    }

    /// Finish the message.
    pub fn build(self) -> DiagnosticMessage {
        self.message
    }

    /// Finish the message, also returning style warnings about its shape.
    pub fn build_with_validation(self) -> (DiagnosticMessage, Vec<String>) {
        let mut warnings = Vec::new();
        let msg = self.message;

        if msg.title.trim().is_empty() {
            warnings.push("Diagnostic has an empty title".to_string());
        }
        if msg.details.len() > MAX_DETAILS {
            warnings.push(format!(
                "Diagnostic has {} details; at most {} are recommended",
                msg.details.len(),
                MAX_DETAILS
            ));
        }
        if let Some(code) = &msg.code {
            if crate::catalog::get_error_info(code).is_none() {
                warnings.push(format!("Error code {} is not in the catalog", code));
            }
        }

        (msg, warnings)
    }
}
