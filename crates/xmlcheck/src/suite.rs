//! Running several checks over one document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use xmlcheck_error_reporting::DiagnosticMessage;

use crate::check::Check;
use crate::config::XPathCheckConfig;
use crate::document::SourceDocument;
use crate::error::{CheckError, Result};
use crate::issue::Issue;
use crate::xpath_check::XPathCheck;

/// An issue together with the key of the check that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedIssue {
    pub check: String,
    #[serde(flatten)]
    pub issue: Issue,
}

/// Everything a suite found in one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    /// False when the text was not well-formed and no check ran.
    pub valid: bool,
    pub issues: Vec<TaggedIssue>,
    /// Parse recovery warnings, or the reason the text was invalid.
    #[serde(skip)]
    pub diagnostics: Vec<DiagnosticMessage>,
}

impl CheckReport {
    /// Issues raised by the check with `key`.
    pub fn issues_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Issue> + 'a {
        self.issues
            .iter()
            .filter(move |tagged| tagged.check == key)
            .map(|tagged| &tagged.issue)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Suite configuration: named XPath checks, run in declaration order.
///
/// ```toml
/// [checks.no-line-breaks]
/// expression = "//br"
///
/// [checks.layout-title]
/// expression = "//ui:define[@name='title']"
/// namespaces = { ui = "http://java.sun.com/jsf/facelets" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteConfig {
    #[serde(default)]
    pub checks: IndexMap<String, XPathCheckConfig>,
}

/// An ordered collection of checks sharing one parse per document.
#[derive(Default)]
pub struct CheckSuite {
    checks: Vec<Box<dyn Check>>,
}

impl CheckSuite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build XPath checks from a suite configuration, keyed by their names.
    pub fn from_config(config: SuiteConfig) -> Result<Self> {
        let mut suite = Self::new();
        for (key, check) in config.checks {
            let check = XPathCheck::from_config(check).inspect_err(|err| {
                tracing::debug!(check = %key, error = %err, "Check failed to build");
            })?;
            suite.push(Box::new(check.with_key(key)));
        }
        Ok(suite)
    }

    /// Build a suite from a TOML suite configuration.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: SuiteConfig = toml::from_str(input).map_err(|err| CheckError::Config {
            message: err.message().to_string(),
        })?;
        Self::from_config(config)
    }

    pub fn push(&mut self, check: Box<dyn Check>) {
        self.checks.push(check);
    }

    pub fn extend(&mut self, checks: impl IntoIterator<Item = Box<dyn Check>>) {
        self.checks.extend(checks);
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Keys of the checks, in run order.
    pub fn keys(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.key()).collect()
    }

    /// Parse `text` once and run every check over it.
    ///
    /// Text that is not well-formed XML gives an empty, invalid report.
    pub fn run(&self, text: &str) -> Result<CheckReport> {
        self.run_named("<input>", text)
    }

    /// [`CheckSuite::run`] with a path for diagnostics.
    pub fn run_named(&self, path: &str, text: &str) -> Result<CheckReport> {
        match SourceDocument::parse_named(path, text) {
            Ok(doc) => self.run_document(&doc),
            Err(outcome) => {
                tracing::debug!(path, reason = %outcome, "Skipping invalid document");
                Ok(CheckReport {
                    valid: false,
                    issues: Vec::new(),
                    diagnostics: outcome.diagnostics().to_vec(),
                })
            }
        }
    }

    /// Run every check over an already parsed document.
    pub fn run_document(&self, doc: &SourceDocument) -> Result<CheckReport> {
        let mut issues = Vec::new();
        for check in &self.checks {
            tracing::debug!(check = check.key(), "Running check");
            let found = check.check(doc)?;
            issues.extend(found.into_iter().map(|issue| TaggedIssue {
                check: check.key().to_string(),
                issue,
            }));
        }
        Ok(CheckReport {
            valid: true,
            issues,
            diagnostics: doc.warnings().to_vec(),
        })
    }
}

impl std::fmt::Debug for CheckSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckSuite")
            .field("checks", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<page>\n  <br/>\n  <title>Home</title>\n</page>";

    #[test]
    fn test_checks_run_in_insertion_order() {
        let mut suite = CheckSuite::new();
        suite.push(Box::new(XPathCheck::new("//title").unwrap().with_key("title")));
        suite.push(Box::new(XPathCheck::new("//br").unwrap().with_key("br")));
        assert_eq!(suite.keys(), vec!["title", "br"]);

        let report = suite.run(PAGE).unwrap();
        assert!(report.valid);
        let tagged: Vec<(&str, usize)> = report
            .issues
            .iter()
            .map(|t| (t.check.as_str(), t.issue.line()))
            .collect();
        assert_eq!(tagged, vec![("title", 3), ("br", 2)]);
        assert_eq!(report.issues_for("br").count(), 1);
    }

    #[test]
    fn test_invalid_document_gives_empty_report() {
        let mut suite = CheckSuite::new();
        suite.push(Box::new(XPathCheck::new("//br").unwrap()));
        let report = suite.run("<page><br></page>").unwrap();
        assert!(!report.valid);
        assert!(report.is_empty());
        assert_eq!(report.diagnostics.len(), 1);
    }

    #[test]
    fn test_from_toml() {
        let suite = CheckSuite::from_toml_str(
            r#"
[checks.no-line-breaks]
expression = "//br"

[checks.has-title]
expression = "boolean(//title)"
message = "Page sets its own title"
"#,
        )
        .unwrap();
        assert_eq!(suite.keys(), vec!["no-line-breaks", "has-title"]);

        let report = suite.run(PAGE).unwrap();
        let has_title: Vec<_> = report.issues_for("has-title").collect();
        assert_eq!(has_title, vec![&Issue::new(1, "Page sets its own title")]);
    }

    #[test]
    fn test_bad_check_fails_construction() {
        let err = CheckSuite::from_toml_str(
            r#"
[checks.broken]
expression = "//ui:define"
"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), "X-2-2");
    }

    #[test]
    fn test_report_serializes_tagged_issues() {
        let mut suite = CheckSuite::new();
        suite.push(Box::new(XPathCheck::new("//br").unwrap().with_key("br")));
        let json = serde_json::to_value(suite.run(PAGE).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "valid": true,
                "issues": [{
                    "check": "br",
                    "line": 2,
                    "message": "The XPath expression matches this piece of code"
                }]
            })
        );
    }
}
