//! XPath 1.0 values and their conversions.

use std::fmt;

use xmlcheck_xml::{NodeId, XmlDocument};

/// The result of evaluating an XPath expression.
///
/// Node-sets are kept sorted in document order without duplicates.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue {
    NodeSet(Vec<NodeId>),
    Boolean(bool),
    Number(f64),
    String(String),
}

impl XPathValue {
    /// `boolean()` conversion.
    pub fn to_boolean(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::Boolean(b) => *b,
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::String(s) => !s.is_empty(),
        }
    }

    /// `number()` conversion. A node-set converts through the string-value
    /// of its first node.
    pub fn to_number(&self, doc: &XmlDocument) -> f64 {
        match self {
            XPathValue::NodeSet(_) => parse_xpath_number(&self.to_string_value(doc)),
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => parse_xpath_number(s),
        }
    }

    /// `string()` conversion.
    pub fn to_string_value(&self, doc: &XmlDocument) -> String {
        match self {
            XPathValue::NodeSet(nodes) => nodes
                .first()
                .map(|&id| doc.string_value(id))
                .unwrap_or_default(),
            XPathValue::Boolean(b) => b.to_string(),
            XPathValue::Number(n) => format_xpath_number(*n),
            XPathValue::String(s) => s.clone(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            XPathValue::NodeSet(_) => "node-set",
            XPathValue::Boolean(_) => "boolean",
            XPathValue::Number(_) => "number",
            XPathValue::String(_) => "string",
        }
    }
}

impl fmt::Display for XPathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPathValue::NodeSet(nodes) => write!(f, "node-set({})", nodes.len()),
            XPathValue::Boolean(b) => write!(f, "{}", b),
            XPathValue::Number(n) => f.write_str(&format_xpath_number(*n)),
            XPathValue::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Format a number the way `string()` does: `NaN`, `Infinity`, integers
/// without a decimal point, and no exponent notation.
pub fn format_xpath_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n == 0.0 {
        "0".to_string()
    } else {
        // f64's Display never uses an exponent and drops a zero fraction.
        n.to_string()
    }
}

/// Parse a string the way `number()` does.
///
/// Surrounding XML whitespace is ignored; anything but an optional minus
/// sign followed by `Digits ('.' Digits?)?` or `'.' Digits` is NaN.
pub fn parse_xpath_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(is_xml_whitespace);
    let unsigned = trimmed.strip_prefix('-').unwrap_or(trimmed);

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    let valid = match frac_part {
        Some(frac) => {
            (!int_part.is_empty() || !frac.is_empty()) && all_digits(int_part) && all_digits(frac)
        }
        None => !int_part.is_empty() && all_digits(int_part),
    };

    if valid {
        trimmed.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// `round()`: halves round towards positive infinity, and values in
/// `[-0.5, -0]` round to negative zero.
pub fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() || n == 0.0 {
        n
    } else if (-0.5..0.0).contains(&n) {
        -0.0
    } else {
        (n + 0.5).floor()
    }
}

pub(crate) fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}
