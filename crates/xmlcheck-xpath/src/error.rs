//! Error types for XPath compilation and evaluation.

use xmlcheck_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};

/// Result type alias for xmlcheck-xpath operations.
pub type Result<T> = std::result::Result<T, XPathError>;

/// Errors raised while compiling or evaluating an XPath expression.
///
/// Everything except [`XPathError::Type`] is detected before the expression
/// touches a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XPathError {
    /// The expression does not match the XPath 1.0 grammar.
    #[error("Invalid XPath expression at position {position}: {message}")]
    Syntax {
        message: String,
        /// 0-based byte offset into the expression.
        position: usize,
        expression: String,
    },

    /// A name test or function uses a prefix with no binding.
    #[error("Namespace prefix `{prefix}` is not bound")]
    UnresolvedPrefix { prefix: String },

    #[error("Unknown XPath function `{name}()`")]
    UnknownFunction { name: String },

    #[error("Function `{name}()` expects {expected} argument(s), found {found}")]
    WrongArity {
        name: String,
        expected: String,
        found: usize,
    },

    /// Variables have no binding context in a check.
    #[error("Variable reference `${name}` is not supported")]
    VariableReference { name: String },

    /// The same prefix was bound to two different URIs.
    #[error("Namespace prefix `{prefix}` is bound to both `{first}` and `{second}`")]
    ConflictingBinding {
        prefix: String,
        first: String,
        second: String,
    },

    /// A value of the wrong type reached an operation at evaluation time.
    #[error("XPath type error: {message}")]
    Type { message: String },
}

impl XPathError {
    pub(crate) fn syntax(message: impl Into<String>, position: usize, expression: &str) -> Self {
        XPathError::Syntax {
            message: message.into(),
            position,
            expression: expression.to_string(),
        }
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        XPathError::Type {
            message: message.into(),
        }
    }

    /// Whether this error is found without evaluating against a document.
    pub fn is_compile_error(&self) -> bool {
        !matches!(self, XPathError::Type { .. })
    }

    /// Catalogued error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            XPathError::Syntax { .. } => "X-2-1",
            XPathError::UnresolvedPrefix { .. } => "X-2-2",
            XPathError::UnknownFunction { .. } => "X-2-3",
            XPathError::WrongArity { .. } => "X-2-4",
            XPathError::VariableReference { .. } => "X-2-5",
            XPathError::Type { .. } => "X-2-6",
            XPathError::ConflictingBinding { .. } => "X-3-2",
        }
    }

    /// Convert this error to a DiagnosticMessage with its catalogued code.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let builder = match self {
            XPathError::Syntax {
                message,
                position,
                expression,
            } => DiagnosticMessageBuilder::error("Invalid XPath Expression")
                .problem(format!("`{}` is not a valid XPath 1.0 expression", expression))
                .add_detail(format!("At position {}: {}", position, message)),

            XPathError::UnresolvedPrefix { prefix } => {
                DiagnosticMessageBuilder::error("Unresolved Namespace Prefix")
                    .problem(format!("Prefix `{}` has no namespace binding", prefix))
                    .add_hint(format!("Add `{}` to the check's namespaces?", prefix))
            }

            XPathError::UnknownFunction { name } => {
                DiagnosticMessageBuilder::error("Unknown XPath Function")
                    .problem(format!("`{}()` is not an XPath 1.0 core function", name))
            }

            XPathError::WrongArity {
                name,
                expected,
                found,
            } => DiagnosticMessageBuilder::error("Wrong Number of Arguments")
                .problem(format!("`{}()` was called with {} argument(s)", name, found))
                .add_info(format!("It expects {}", expected)),

            XPathError::VariableReference { name } => {
                DiagnosticMessageBuilder::error("Unsupported Variable Reference")
                    .problem(format!("`${}` cannot be bound in a check expression", name))
                    .add_hint("Inline the value as a literal?")
            }

            XPathError::ConflictingBinding {
                prefix,
                first,
                second,
            } => DiagnosticMessageBuilder::error("Conflicting Namespace Binding")
                .problem(format!("Prefix `{}` is bound more than once", prefix))
                .add_detail(format!("First bound to `{}`", first))
                .add_detail(format!("Then bound to `{}`", second)),

            XPathError::Type { message } => {
                DiagnosticMessageBuilder::error("XPath Type Error").problem(message.clone())
            }
        };

        builder.with_code(self.code()).build()
    }
}
