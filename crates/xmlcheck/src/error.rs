//! Errors raised by checks.

use xmlcheck_error_reporting::{DetailItem, DetailKind, DiagnosticMessage, DiagnosticMessageBuilder};
use xmlcheck_xpath::XPathError;

/// Result type alias for check operations.
pub type Result<T> = std::result::Result<T, CheckError>;

/// A check could not run.
///
/// A malformed document is not an error: it yields no issues.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckError {
    /// The expression does not compile against the namespace bindings.
    #[error("Cannot compile `{expression}`: {source}")]
    Compile {
        expression: String,
        source: XPathError,
    },

    /// The expression compiled but failed against a document.
    #[error("Cannot evaluate `{expression}`: {source}")]
    Evaluation {
        expression: String,
        source: XPathError,
    },

    /// The configured namespace table binds a prefix twice.
    #[error("Invalid namespace bindings: {0}")]
    Namespaces(XPathError),

    /// The check configuration could not be read.
    #[error("Invalid check configuration: {message}")]
    Config { message: String },

    #[error("The XPath expression is empty")]
    EmptyExpression,
}

impl CheckError {
    /// Catalogued error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            CheckError::Compile { source, .. } | CheckError::Evaluation { source, .. } => {
                source.code()
            }
            CheckError::Namespaces(_) => "X-3-2",
            CheckError::Config { .. } => "X-3-1",
            CheckError::EmptyExpression => "X-3-3",
        }
    }

    /// Convert to a diagnostic message.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        match self {
            CheckError::Compile { source, .. } => source.to_diagnostic(),
            CheckError::Evaluation { expression, source } => {
                let mut diagnostic = source.to_diagnostic();
                diagnostic.details.insert(
                    0,
                    DetailItem {
                        kind: DetailKind::Info,
                        content: format!("While evaluating `{}`", expression).into(),
                        location: None,
                    },
                );
                diagnostic
            }
            CheckError::Namespaces(source) => source.to_diagnostic(),
            CheckError::Config { message } => {
                DiagnosticMessageBuilder::error("Invalid Check Configuration")
                    .with_code(self.code())
                    .problem("The check configuration could not be read")
                    .add_detail(message.clone())
                    .build()
            }
            CheckError::EmptyExpression => DiagnosticMessageBuilder::error("Empty XPath Expression")
                .with_code(self.code())
                .problem("A check needs a non-empty `expression`")
                .add_hint("Did you forget to set `expression` in the rule configuration?")
                .build(),
        }
    }
}
