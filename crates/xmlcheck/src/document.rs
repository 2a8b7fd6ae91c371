//! Parsed source documents.

use std::fmt;

use xmlcheck_error_reporting::DiagnosticMessage;
use xmlcheck_source_map::{FileId, SourceContext};
use xmlcheck_xml::{NamespaceDecl, XmlDocument, XmlParseContext, parse_with_context_and_file_id};

const DEFAULT_PATH: &str = "<input>";

/// A well-formed document ready to be checked.
///
/// Keeps the source text registered in a [`SourceContext`] so diagnostics
/// about the document can be rendered with source snippets.
#[derive(Debug)]
pub struct SourceDocument {
    xml: XmlDocument,
    source_context: SourceContext,
    file_id: FileId,
    warnings: Vec<DiagnosticMessage>,
}

/// Why a document could not be checked.
#[derive(Debug)]
pub enum ParseOutcome {
    /// The text is not well-formed XML.
    Invalid {
        diagnostics: Vec<DiagnosticMessage>,
        source_context: SourceContext,
    },
}

impl SourceDocument {
    /// Parse `text` as an anonymous document.
    pub fn parse(text: &str) -> Result<Self, ParseOutcome> {
        Self::parse_named(DEFAULT_PATH, text)
    }

    /// Parse `text`, using `path` when rendering diagnostics.
    ///
    /// # Example
    ///
    /// ```rust
    /// use xmlcheck::SourceDocument;
    ///
    /// let doc = SourceDocument::parse_named("pom.xml", "<project>\n  <version/>\n</project>").unwrap();
    /// assert!(doc.warnings().is_empty());
    ///
    /// assert!(SourceDocument::parse("<project>").is_err());
    /// ```
    pub fn parse_named(path: impl Into<String>, text: &str) -> Result<Self, ParseOutcome> {
        let path = path.into();
        let mut source_context = SourceContext::new();
        let file_id = source_context.add_file(path.clone(), text);

        let mut ctx = XmlParseContext::new();
        match parse_with_context_and_file_id(text, file_id, &mut ctx) {
            Ok(xml) => {
                let warnings = ctx.take_diagnostics();
                if !warnings.is_empty() {
                    tracing::debug!(
                        path = %path,
                        warnings = warnings.len(),
                        "Document parsed with recovery"
                    );
                }
                Ok(Self {
                    xml,
                    source_context,
                    file_id,
                    warnings,
                })
            }
            Err(diagnostics) => {
                tracing::debug!(
                    path = %path,
                    error = diagnostics.first().map_or("", |d| d.title.as_str()),
                    "Document is not well-formed"
                );
                Err(ParseOutcome::Invalid {
                    diagnostics,
                    source_context,
                })
            }
        }
    }

    pub fn xml(&self) -> &XmlDocument {
        &self.xml
    }

    /// Recovery warnings recorded while parsing.
    pub fn warnings(&self) -> &[DiagnosticMessage] {
        &self.warnings
    }

    pub fn source_context(&self) -> &SourceContext {
        &self.source_context
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    /// Namespace declarations written on the document element that bind a
    /// prefix.
    pub fn root_namespaces(&self) -> impl Iterator<Item = &NamespaceDecl> + '_ {
        self.xml
            .document_element()
            .map(|root| self.xml.node(root).namespace_declarations())
            .unwrap_or_default()
            .iter()
            .filter(|decl| decl.prefix.is_some() && !decl.uri.is_empty())
    }

    /// Render a diagnostic about this document, with a source snippet when it
    /// is located.
    pub fn render(&self, diagnostic: &DiagnosticMessage) -> String {
        diagnostic.to_text(Some(&self.source_context))
    }
}

impl ParseOutcome {
    pub fn diagnostics(&self) -> &[DiagnosticMessage] {
        match self {
            ParseOutcome::Invalid { diagnostics, .. } => diagnostics,
        }
    }

    /// Render every diagnostic against the document text.
    pub fn render(&self) -> String {
        match self {
            ParseOutcome::Invalid {
                diagnostics,
                source_context,
            } => diagnostics
                .iter()
                .map(|d| d.to_text(Some(source_context)))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl fmt::Display for ParseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.diagnostics().first() {
            Some(diagnostic) => write!(f, "Document is not well-formed: {}", diagnostic.title),
            None => write!(f, "Document is not well-formed"),
        }
    }
}

impl std::error::Error for ParseOutcome {}
