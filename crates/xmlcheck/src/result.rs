//! Evaluation results as seen by the issue projector.

use xmlcheck_xml::NodeId;
use xmlcheck_xpath::XPathValue;

/// A number or string result.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    String(String),
}

impl Scalar {
    /// XPath `boolean()` of the value: `0`, `-0`, `NaN` and `""` are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Number(n) => *n != 0.0 && !n.is_nan(),
            Scalar::String(s) => !s.is_empty(),
        }
    }
}

/// What an expression evaluated to.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathResult {
    /// Nodes in document order.
    NodeSet(Vec<NodeId>),
    Boolean(bool),
    Scalar(Scalar),
}

impl From<XPathValue> for XPathResult {
    fn from(value: XPathValue) -> Self {
        match value {
            XPathValue::NodeSet(nodes) => XPathResult::NodeSet(nodes),
            XPathValue::Boolean(b) => XPathResult::Boolean(b),
            XPathValue::Number(n) => XPathResult::Scalar(Scalar::Number(n)),
            XPathValue::String(s) => XPathResult::Scalar(Scalar::String(s)),
        }
    }
}
