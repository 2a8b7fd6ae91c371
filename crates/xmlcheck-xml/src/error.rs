//! Error types for XML parsing with source locations.

use xmlcheck_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use xmlcheck_source_map::SourceInfo;

/// Result type alias for xmlcheck-xml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for parse operations that return diagnostics.
pub type ParseResult<T> = std::result::Result<T, Vec<DiagnosticMessage>>;

/// Reasons a document is not well-formed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// XML syntax error reported by quick-xml.
    #[error("XML syntax error: {message}")]
    XmlSyntax {
        message: String,
        location: Option<SourceInfo>,
    },

    /// The input ended with elements still open.
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof {
        /// What was expected when EOF was encountered.
        expected: String,
        location: Option<SourceInfo>,
    },

    /// End tag does not close the innermost open element.
    #[error("Mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEndTag {
        expected: String,
        found: String,
        location: Option<SourceInfo>,
    },

    /// No root element.
    #[error("Empty XML document: no root element found")]
    EmptyDocument,

    #[error("Invalid XML: multiple root elements")]
    MultipleRoots { location: Option<SourceInfo> },

    /// A prefix used in an element or attribute name has no declaration in scope.
    #[error("Namespace prefix `{prefix}` is not bound")]
    UnboundPrefix {
        prefix: String,
        location: Option<SourceInfo>,
    },

    /// Non-whitespace character data before or after the root element.
    #[error("Character data outside the root element")]
    TextOutsideRoot { location: Option<SourceInfo> },

    /// An entity or character reference that cannot be resolved.
    #[error("Invalid entity reference: {message}")]
    InvalidEntity {
        message: String,
        location: Option<SourceInfo>,
    },
}

impl Error {
    /// Source location of the error, when known.
    pub fn location(&self) -> Option<&SourceInfo> {
        match self {
            Error::XmlSyntax { location, .. }
            | Error::UnexpectedEof { location, .. }
            | Error::MismatchedEndTag { location, .. }
            | Error::MultipleRoots { location }
            | Error::UnboundPrefix { location, .. }
            | Error::TextOutsideRoot { location }
            | Error::InvalidEntity { location, .. } => location.as_ref(),
            Error::EmptyDocument => None,
        }
    }

    /// Catalogued error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::XmlSyntax { .. } => "X-1-1",
            Error::UnexpectedEof { .. } => "X-1-2",
            Error::MismatchedEndTag { .. } => "X-1-3",
            Error::EmptyDocument => "X-1-4",
            Error::MultipleRoots { .. } => "X-1-5",
            Error::UnboundPrefix { .. } => "X-1-6",
            Error::TextOutsideRoot { .. } => "X-1-8",
            Error::InvalidEntity { .. } => "X-1-9",
        }
    }

    /// Convert this error to a DiagnosticMessage with its X-1-* code.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let builder = match self {
            Error::XmlSyntax { message, .. } => DiagnosticMessageBuilder::error("XML Syntax Error")
                .problem(message.clone()),

            Error::UnexpectedEof { expected, .. } => {
                DiagnosticMessageBuilder::error("Unexpected End of XML Input").problem(format!(
                    "The XML document ended unexpectedly; expected {}",
                    expected
                ))
            }

            Error::MismatchedEndTag {
                expected, found, ..
            } => DiagnosticMessageBuilder::error("Mismatched XML End Tag")
                .problem(format!(
                    "End tag </{}> does not match start tag <{}>",
                    found, expected
                ))
                .add_detail(format!("Expected: </{}>", expected))
                .add_detail(format!("Found: </{}>", found))
                .add_hint("Check that all opening tags have matching closing tags?"),

            Error::EmptyDocument => DiagnosticMessageBuilder::error("Empty XML Document")
                .problem("The XML document contains no root element")
                .add_hint("Add a root element to the document?"),

            Error::MultipleRoots { .. } => {
                DiagnosticMessageBuilder::error("Multiple XML Root Elements")
                    .problem("The XML document contains multiple root elements")
                    .add_detail("XML documents must have exactly one root element")
                    .add_hint("Wrap multiple elements in a single container element?")
            }

            Error::UnboundPrefix { prefix, .. } => {
                DiagnosticMessageBuilder::error("Unbound Namespace Prefix")
                    .problem(format!("Prefix `{}` is used but never declared", prefix))
                    .add_hint(format!(
                        "Declare it with `xmlns:{}=\"...\"` on this or an enclosing element?",
                        prefix
                    ))
            }

            Error::TextOutsideRoot { .. } => {
                DiagnosticMessageBuilder::error("Text Outside Root Element")
                    .problem("Character data must be inside the root element")
            }

            Error::InvalidEntity { message, .. } => {
                DiagnosticMessageBuilder::error("Invalid Entity Reference").problem(message.clone())
            }
        };

        let builder = builder.with_code(self.code());
        match self.location() {
            Some(loc) => builder.with_location(loc.clone()),
            None => builder,
        }
        .build()
    }
}
