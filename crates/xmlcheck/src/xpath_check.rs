//! The XPath check and its issue projector.

use std::sync::Arc;

use xmlcheck_xpath::{CompiledXPath, NamespaceBindings, XPathCache, XPathError, compile};

use crate::check::Check;
use crate::config::XPathCheckConfig;
use crate::document::SourceDocument;
use crate::error::{CheckError, Result};
use crate::issue::Issue;
use crate::result::XPathResult;

/// Reports every place in a document matched by an XPath expression.
///
/// A node-set result gives one issue per node, at the node's line. Any
/// other result gives one issue at line 1 when it is true under XPath
/// `boolean()`.
///
/// # Example
///
/// ```rust
/// use xmlcheck::{SourceDocument, XPathCheck, XPathCheckConfig};
///
/// let config = XPathCheckConfig::new("//m:version").with_namespace("m", "urn:maven");
/// let check = XPathCheck::from_config(config).unwrap();
///
/// let doc = SourceDocument::parse("<project xmlns=\"urn:maven\">\n  <version/>\n</project>").unwrap();
/// let issues = check.evaluate(&doc).unwrap();
/// assert_eq!(issues[0].line(), 2);
/// ```
#[derive(Debug)]
pub struct XPathCheck {
    key: String,
    config: XPathCheckConfig,
    bindings: NamespaceBindings,
    /// `None` when compilation waits for each document's namespaces.
    compiled: Option<Arc<CompiledXPath>>,
    cache: Option<Arc<XPathCache>>,
}

impl XPathCheck {
    pub const KEY: &'static str = "XPathCheck";

    /// A check for `expression` with the default message and no namespaces.
    pub fn new(expression: impl Into<String>) -> Result<Self> {
        Self::from_config(XPathCheckConfig::new(expression))
    }

    /// Build a check, compiling its expression.
    pub fn from_config(config: XPathCheckConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Build a check whose compilations go through a shared cache.
    pub fn with_cache(config: XPathCheckConfig, cache: Arc<XPathCache>) -> Result<Self> {
        Self::build(config, Some(cache))
    }

    fn build(config: XPathCheckConfig, cache: Option<Arc<XPathCache>>) -> Result<Self> {
        config.validate()?;
        let bindings = config.bindings()?;

        let mut check = Self {
            key: Self::KEY.to_string(),
            config,
            bindings,
            compiled: None,
            cache,
        };

        match check.compile_with(&check.bindings) {
            Ok(compiled) => check.compiled = Some(compiled),
            // Document declarations may still bind the prefix.
            Err(CheckError::Compile {
                source: XPathError::UnresolvedPrefix { .. },
                ..
            }) if check.config.document_namespaces => {}
            Err(err) => return Err(err),
        }
        Ok(check)
    }

    /// Replace the key issues are tagged with.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn config(&self) -> &XPathCheckConfig {
        &self.config
    }

    pub fn expression(&self) -> &str {
        &self.config.expression
    }

    /// Evaluate against `doc` and project the result to issues.
    pub fn evaluate(&self, doc: &SourceDocument) -> Result<Vec<Issue>> {
        let compiled = self.compiled_for(doc)?;
        let value = compiled
            .evaluate(doc.xml())
            .map_err(|source| CheckError::Evaluation {
                expression: self.config.expression.clone(),
                source,
            })?;

        let issues = project(doc, value.into(), &self.config.message);
        tracing::trace!(
            check = %self.key,
            expression = %self.config.expression,
            issues = issues.len(),
            "Evaluated check"
        );
        Ok(issues)
    }

    fn compiled_for(&self, doc: &SourceDocument) -> Result<Arc<CompiledXPath>> {
        if let Some(compiled) = &self.compiled {
            return Ok(Arc::clone(compiled));
        }

        let mut bindings = self.bindings.clone();
        for decl in doc.root_namespaces() {
            if let Some(prefix) = &decl.prefix {
                bindings.bind_if_absent(prefix.as_str(), decl.uri.as_str());
            }
        }
        tracing::debug!(
            check = %self.key,
            bindings = bindings.len(),
            "Compiling with document namespaces"
        );
        self.compile_with(&bindings)
    }

    fn compile_with(&self, bindings: &NamespaceBindings) -> Result<Arc<CompiledXPath>> {
        let expression = self.config.expression.as_str();
        let compiled = match &self.cache {
            Some(cache) => cache.get_or_compile(expression, bindings),
            None => compile(expression, bindings).map(Arc::new),
        };
        compiled.map_err(|source| CheckError::Compile {
            expression: expression.to_string(),
            source,
        })
    }
}

impl Check for XPathCheck {
    fn key(&self) -> &str {
        &self.key
    }

    fn check(&self, doc: &SourceDocument) -> Result<Vec<Issue>> {
        self.evaluate(doc)
    }
}

/// Turn an evaluation result into issues carrying `message`.
///
/// Node-sets give one issue per node in document order. Booleans and
/// scalars give a single issue at line 1 when true.
pub fn project(doc: &SourceDocument, result: XPathResult, message: &str) -> Vec<Issue> {
    let matched = match result {
        XPathResult::NodeSet(nodes) => {
            return nodes
                .into_iter()
                .map(|id| Issue::at(doc.xml().source_info(id).clone(), message))
                .collect();
        }
        XPathResult::Boolean(b) => b,
        XPathResult::Scalar(scalar) => scalar.is_truthy(),
    };

    if matched {
        vec![Issue::new(1, message)]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Scalar;

    const CATALOG: &str = r#"<catalog>
  <book id="b1"><title>Rust</title><price>30</price></book>
  <book id="b2"><title>XML</title><price>25</price></book>
</catalog>"#;

    fn lines(check: &XPathCheck, text: &str) -> Vec<usize> {
        let doc = SourceDocument::parse(text).unwrap();
        check.evaluate(&doc).unwrap().iter().map(Issue::line).collect()
    }

    #[test]
    fn test_node_set_issues_follow_document_order() {
        let check = XPathCheck::new("//price | //book").unwrap();
        assert_eq!(lines(&check, CATALOG), vec![2, 2, 3, 3]);
    }

    #[test]
    fn test_attribute_issues_use_their_element_line() {
        let check = XPathCheck::new("//book/@id").unwrap();
        assert_eq!(lines(&check, CATALOG), vec![2, 3]);
    }

    #[test]
    fn test_scalar_results() {
        assert_eq!(lines(&XPathCheck::new("count(//book)").unwrap(), CATALOG), vec![1]);
        assert!(lines(&XPathCheck::new("count(//dvd)").unwrap(), CATALOG).is_empty());
        assert!(lines(&XPathCheck::new("number('x')").unwrap(), CATALOG).is_empty());
        assert_eq!(lines(&XPathCheck::new("string(//title)").unwrap(), CATALOG), vec![1]);
        assert!(lines(&XPathCheck::new("string(//dvd)").unwrap(), CATALOG).is_empty());
    }

    #[test]
    fn test_project_boolean() {
        let doc = SourceDocument::parse(CATALOG).unwrap();
        assert_eq!(
            project(&doc, XPathResult::Boolean(true), "m"),
            vec![Issue::new(1, "m")]
        );
        assert!(project(&doc, XPathResult::Boolean(false), "m").is_empty());
        assert!(project(&doc, XPathResult::Scalar(Scalar::Number(-0.0)), "m").is_empty());
    }

    #[test]
    fn test_custom_message_and_key() {
        let config = XPathCheckConfig::new("//title").with_message("Titles are managed centrally");
        let check = XPathCheck::from_config(config).unwrap().with_key("no-title");
        let doc = SourceDocument::parse(CATALOG).unwrap();
        let issues = check.check(&doc).unwrap();
        assert_eq!(check.key(), "no-title");
        assert_eq!(issues[0].message(), "Titles are managed centrally");
    }

    #[test]
    fn test_compile_errors_surface_at_construction() {
        let err = XPathCheck::new("//ui:define").unwrap_err();
        assert!(matches!(
            err,
            CheckError::Compile {
                source: XPathError::UnresolvedPrefix { .. },
                ..
            }
        ));
        assert_eq!(XPathCheck::new("//a[").unwrap_err().code(), "X-2-1");
        assert_eq!(XPathCheck::new("").unwrap_err(), CheckError::EmptyExpression);
    }

    #[test]
    fn test_syntax_errors_are_not_deferred_by_document_namespaces() {
        let config = XPathCheckConfig::new("//ui:define[").with_document_namespaces(true);
        assert_eq!(XPathCheck::from_config(config).unwrap_err().code(), "X-2-1");
    }

    #[test]
    fn test_document_namespaces_fill_missing_prefixes() {
        let text = r#"<page xmlns:ui="urn:ui">
  <ui:define name="title"/>
</page>"#;
        let config = XPathCheckConfig::new("//ui:define").with_document_namespaces(true);
        let check = XPathCheck::from_config(config).unwrap();
        assert_eq!(lines(&check, text), vec![2]);

        let err = check
            .evaluate(&SourceDocument::parse("<page/>").unwrap())
            .unwrap_err();
        assert_eq!(err.code(), "X-2-2");
    }

    #[test]
    fn test_configured_prefixes_win_over_document_ones() {
        let text = r#"<page xmlns:ui="urn:document"><x:define xmlns:x="urn:configured"/></page>"#;
        let config = XPathCheckConfig::new("//ui:define")
            .with_namespace("ui", "urn:configured")
            .with_document_namespaces(true);
        let check = XPathCheck::from_config(config).unwrap();
        assert_eq!(lines(&check, text), vec![1]);
    }

    #[test]
    fn test_runtime_type_errors_are_reported() {
        let check = XPathCheck::new("count('x')").unwrap();
        let err = check
            .evaluate(&SourceDocument::parse(CATALOG).unwrap())
            .unwrap_err();
        assert!(matches!(err, CheckError::Evaluation { .. }));
        assert_eq!(err.code(), "X-2-6");
    }

    #[test]
    fn test_cached_checks_share_compilations() {
        let cache = Arc::new(XPathCache::default());
        let a = XPathCheck::with_cache(XPathCheckConfig::new("//book"), Arc::clone(&cache)).unwrap();
        let b = XPathCheck::with_cache(XPathCheckConfig::new("//book"), Arc::clone(&cache)).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(lines(&a, CATALOG), lines(&b, CATALOG));
    }
}
