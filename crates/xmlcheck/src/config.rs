//! Check configuration.
//!
//! A check is configured by a rule record:
//!
//! ```toml
//! expression = "//ui:define[@name='title']"
//! message = "Use the layout title instead"
//!
//! [namespaces]
//! ui = "http://java.sun.com/jsf/facelets"
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use xmlcheck_xpath::NamespaceBindings;

use crate::error::{CheckError, Result};

/// Message used when a rule does not give one.
pub const DEFAULT_MESSAGE: &str = "The XPath expression matches this piece of code";

fn default_message() -> String {
    DEFAULT_MESSAGE.to_string()
}

/// Configuration of one XPath check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XPathCheckConfig {
    /// XPath 1.0 expression to evaluate against each document.
    pub expression: String,

    /// Message attached to every issue.
    #[serde(default = "default_message")]
    pub message: String,

    /// Prefix to namespace URI bindings, in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub namespaces: IndexMap<String, String>,

    /// Also bind prefixes declared on each document's root element.
    #[serde(default)]
    pub document_namespaces: bool,
}

impl XPathCheckConfig {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            message: default_message(),
            namespaces: IndexMap::new(),
            document_namespaces: false,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn with_document_namespaces(mut self, enabled: bool) -> Self {
        self.document_namespaces = enabled;
        self
    }

    /// Read a configuration from a TOML rule record.
    ///
    /// # Example
    ///
    /// ```rust
    /// use xmlcheck::XPathCheckConfig;
    ///
    /// let config = XPathCheckConfig::from_toml_str(r#"expression = "//br""#).unwrap();
    /// assert_eq!(config.message, xmlcheck::DEFAULT_MESSAGE);
    /// assert!(!config.document_namespaces);
    /// ```
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input).map_err(|err| CheckError::Config {
            message: err.message().to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot describe a check.
    pub fn validate(&self) -> Result<()> {
        if self.expression.trim().is_empty() {
            return Err(CheckError::EmptyExpression);
        }
        for (prefix, uri) in &self.namespaces {
            if prefix.is_empty() || prefix.contains(':') {
                return Err(CheckError::Config {
                    message: format!("`{}` is not a valid namespace prefix", prefix),
                });
            }
            if uri.is_empty() {
                return Err(CheckError::Config {
                    message: format!("Prefix `{}` is bound to an empty namespace URI", prefix),
                });
            }
        }
        Ok(())
    }

    /// The configured namespace table as compile-time bindings.
    pub fn bindings(&self) -> Result<NamespaceBindings> {
        NamespaceBindings::from_pairs(self.namespaces.iter().map(|(p, u)| (p.as_str(), u.as_str())))
            .map_err(CheckError::Namespaces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_with_namespaces() {
        let config = XPathCheckConfig::from_toml_str(
            r#"
expression = "//ui:define[@name='title']"

[namespaces]
ui = "http://java.sun.com/jsf/facelets"
h = "http://java.sun.com/jsf/html"
"#,
        )
        .unwrap();
        assert_eq!(config.message, DEFAULT_MESSAGE);
        let prefixes: Vec<&str> = config.namespaces.keys().map(String::as_str).collect();
        assert_eq!(prefixes, vec!["ui", "h"]);

        let bindings = config.bindings().unwrap();
        assert_eq!(bindings.resolve("ui"), Some("http://java.sun.com/jsf/facelets"));
    }

    #[test]
    fn test_missing_expression_is_a_config_error() {
        let err = XPathCheckConfig::from_toml_str(r#"message = "x""#).unwrap_err();
        assert_eq!(err.code(), "X-3-1");
        assert!(err.to_string().contains("expression"), "{}", err);
    }

    #[test]
    fn test_blank_expression_is_rejected() {
        let err = XPathCheckConfig::from_toml_str(r#"expression = "  ""#).unwrap_err();
        assert_eq!(err, CheckError::EmptyExpression);
    }

    #[test]
    fn test_invalid_prefix_is_rejected() {
        let err = XPathCheckConfig::new("//a")
            .with_namespace("a:b", "urn:x")
            .validate()
            .unwrap_err();
        assert_eq!(err.code(), "X-3-1");
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = XPathCheckConfig::new("//br")
            .with_message("No line breaks")
            .with_document_namespaces(true);
        let text = toml::to_string(&config).unwrap();
        assert_eq!(XPathCheckConfig::from_toml_str(&text).unwrap(), config);
    }
}
