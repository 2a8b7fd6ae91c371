//! The XPath 1.0 core function library.

use xmlcheck_xml::{NodeId, NodeKind, XML_NAMESPACE, XmlDocument};

use crate::error::{Result, XPathError};
use crate::eval::Context;
use crate::value::{XPathValue, is_xml_whitespace, parse_xpath_number, xpath_round};

/// A core XPath 1.0 function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    // Node-set functions
    Last,
    Position,
    Count,
    Id,
    LocalName,
    NamespaceUri,
    Name,
    // String functions
    String,
    Concat,
    StartsWith,
    Contains,
    SubstringBefore,
    SubstringAfter,
    Substring,
    StringLength,
    NormalizeSpace,
    Translate,
    // Boolean functions
    Boolean,
    Not,
    True,
    False,
    Lang,
    // Number functions
    Number,
    Sum,
    Floor,
    Ceiling,
    Round,
}

const FUNCTIONS: &[(&str, Function)] = &[
    ("last", Function::Last),
    ("position", Function::Position),
    ("count", Function::Count),
    ("id", Function::Id),
    ("local-name", Function::LocalName),
    ("namespace-uri", Function::NamespaceUri),
    ("name", Function::Name),
    ("string", Function::String),
    ("concat", Function::Concat),
    ("starts-with", Function::StartsWith),
    ("contains", Function::Contains),
    ("substring-before", Function::SubstringBefore),
    ("substring-after", Function::SubstringAfter),
    ("substring", Function::Substring),
    ("string-length", Function::StringLength),
    ("normalize-space", Function::NormalizeSpace),
    ("translate", Function::Translate),
    ("boolean", Function::Boolean),
    ("not", Function::Not),
    ("true", Function::True),
    ("false", Function::False),
    ("lang", Function::Lang),
    ("number", Function::Number),
    ("sum", Function::Sum),
    ("floor", Function::Floor),
    ("ceiling", Function::Ceiling),
    ("round", Function::Round),
];

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        FUNCTIONS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, function)| function)
    }

    pub fn name(self) -> &'static str {
        FUNCTIONS
            .iter()
            .find(|&&(_, function)| function == self)
            .map_or("", |(name, _)| name)
    }

    /// Minimum and maximum argument counts; `None` means unbounded.
    pub fn arity(self) -> (usize, Option<usize>) {
        use Function::*;
        match self {
            Last | Position | True | False => (0, Some(0)),
            LocalName | NamespaceUri | Name | String | StringLength | NormalizeSpace | Number => {
                (0, Some(1))
            }
            Count | Id | Boolean | Not | Lang | Sum | Floor | Ceiling | Round => (1, Some(1)),
            StartsWith | Contains | SubstringBefore | SubstringAfter => (2, Some(2)),
            Substring => (2, Some(3)),
            Translate => (3, Some(3)),
            Concat => (2, None),
        }
    }

    pub fn check_arity(self, found: usize) -> Result<()> {
        let (min, max) = self.arity();
        if found >= min && max.is_none_or(|max| found <= max) {
            return Ok(());
        }
        let expected = match max {
            None => format!("at least {}", min),
            Some(max) if max == min => format!("exactly {}", min),
            Some(max) => format!("{} to {}", min, max),
        };
        Err(XPathError::WrongArity {
            name: self.name().to_string(),
            expected,
            found,
        })
    }

    pub(crate) fn call(
        self,
        doc: &XmlDocument,
        ctx: &Context,
        args: &[XPathValue],
    ) -> Result<XPathValue> {
        let string_arg = |i: usize| -> String {
            args.get(i)
                .map_or_else(|| doc.string_value(ctx.node), |v| v.to_string_value(doc))
        };
        let number_arg = |i: usize| -> f64 {
            args.get(i)
                .map_or(f64::NAN, |v: &XPathValue| v.to_number(doc))
        };

        let value = match self {
            Function::Last => XPathValue::Number(ctx.size as f64),
            Function::Position => XPathValue::Number(ctx.position as f64),
            Function::Count => XPathValue::Number(self.node_set(&args[0])?.len() as f64),
            Function::Id => XPathValue::NodeSet(select_ids(doc, &args[0])),

            Function::LocalName => {
                let local = self
                    .subject(ctx, args)?
                    .and_then(|id| doc.name(id))
                    .map(|name| name.local.clone());
                XPathValue::String(local.unwrap_or_default())
            }
            Function::NamespaceUri => {
                let uri = self
                    .subject(ctx, args)?
                    .and_then(|id| doc.name(id))
                    .and_then(|name| name.namespace.clone());
                XPathValue::String(uri.unwrap_or_default())
            }
            Function::Name => {
                let qualified = self
                    .subject(ctx, args)?
                    .and_then(|id| doc.name(id))
                    .map(|name| name.qualified());
                XPathValue::String(qualified.unwrap_or_default())
            }

            Function::String => XPathValue::String(string_arg(0)),
            Function::Concat => XPathValue::String(
                args.iter().map(|v| v.to_string_value(doc)).collect::<String>(),
            ),
            Function::StartsWith => XPathValue::Boolean(string_arg(0).starts_with(&string_arg(1))),
            Function::Contains => XPathValue::Boolean(string_arg(0).contains(&string_arg(1))),
            Function::SubstringBefore => {
                let s = string_arg(0);
                let before = s
                    .find(&string_arg(1))
                    .map(|idx| s[..idx].to_string())
                    .unwrap_or_default();
                XPathValue::String(before)
            }
            Function::SubstringAfter => {
                let s = string_arg(0);
                let needle = string_arg(1);
                let after = s
                    .find(&needle)
                    .map(|idx| s[idx + needle.len()..].to_string())
                    .unwrap_or_default();
                XPathValue::String(after)
            }
            Function::Substring => {
                let length = args.get(2).map(|v| v.to_number(doc));
                XPathValue::String(substring(&string_arg(0), number_arg(1), length))
            }
            Function::StringLength => XPathValue::Number(string_arg(0).chars().count() as f64),
            Function::NormalizeSpace => XPathValue::String(
                string_arg(0)
                    .split(is_xml_whitespace)
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            Function::Translate => {
                let from: Vec<char> = string_arg(1).chars().collect();
                let to: Vec<char> = string_arg(2).chars().collect();
                let translated = string_arg(0)
                    .chars()
                    .filter_map(|c| match from.iter().position(|&f| f == c) {
                        Some(idx) => to.get(idx).copied(),
                        None => Some(c),
                    })
                    .collect();
                XPathValue::String(translated)
            }

            Function::Boolean => XPathValue::Boolean(args[0].to_boolean()),
            Function::Not => XPathValue::Boolean(!args[0].to_boolean()),
            Function::True => XPathValue::Boolean(true),
            Function::False => XPathValue::Boolean(false),
            Function::Lang => XPathValue::Boolean(lang_matches(doc, ctx.node, &string_arg(0))),

            Function::Number => match args.first() {
                Some(v) => XPathValue::Number(v.to_number(doc)),
                None => XPathValue::Number(parse_xpath_number(&doc.string_value(ctx.node))),
            },
            Function::Sum => XPathValue::Number(
                self.node_set(&args[0])?
                    .iter()
                    .map(|&id| parse_xpath_number(&doc.string_value(id)))
                    .sum(),
            ),
            Function::Floor => XPathValue::Number(number_arg(0).floor()),
            Function::Ceiling => XPathValue::Number(number_arg(0).ceil()),
            Function::Round => XPathValue::Number(xpath_round(number_arg(0))),
        };
        Ok(value)
    }

    fn node_set<'v>(self, value: &'v XPathValue) -> Result<&'v [NodeId]> {
        match value {
            XPathValue::NodeSet(nodes) => Ok(nodes),
            other => Err(XPathError::type_error(format!(
                "{}() expects a node-set, found a {}",
                self.name(),
                other.type_name()
            ))),
        }
    }

    /// First node of the optional node-set argument, else the context node.
    fn subject(self, ctx: &Context, args: &[XPathValue]) -> Result<Option<NodeId>> {
        match args.first() {
            Some(value) => Ok(self.node_set(value)?.first().copied()),
            None => Ok(Some(ctx.node)),
        }
    }
}

/// Characters at 1-based positions `p` with `round(start) <= p < round(start) + round(length)`.
fn substring(s: &str, start: f64, length: Option<f64>) -> String {
    let first = xpath_round(start);
    let end = length.map_or(f64::INFINITY, |len| first + xpath_round(len));
    s.chars()
        .enumerate()
        .filter(|&(idx, _)| {
            let position = (idx + 1) as f64;
            position >= first && position < end
        })
        .map(|(_, c)| c)
        .collect()
}

/// Elements whose `id` or `xml:id` attribute is one of the whitespace
/// separated tokens of `value`.
fn select_ids(doc: &XmlDocument, value: &XPathValue) -> Vec<NodeId> {
    let text = match value {
        XPathValue::NodeSet(nodes) => nodes
            .iter()
            .map(|&id| doc.string_value(id))
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string_value(doc),
    };
    let tokens: Vec<&str> = text
        .split(is_xml_whitespace)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    doc.node_ids()
        .filter(|&id| doc.kind(id) == NodeKind::Element)
        .filter(|&id| {
            [None, Some(XML_NAMESPACE)].into_iter().any(|namespace| {
                doc.attribute_value(id, namespace, "id")
                    .is_some_and(|v| tokens.contains(&v.trim_matches(is_xml_whitespace)))
            })
        })
        .collect()
}

/// `xml:lang` of the nearest element at or above `node`, compared
/// case-insensitively, where `en` also matches `en-US`.
fn lang_matches(doc: &XmlDocument, node: NodeId, wanted: &str) -> bool {
    let declared = std::iter::once(node)
        .chain(doc.ancestors(node))
        .filter(|&id| doc.kind(id) == NodeKind::Element)
        .find_map(|id| doc.attribute_value(id, Some(XML_NAMESPACE), "lang"));

    let Some(declared) = declared else {
        return false;
    };
    let declared = declared.to_lowercase();
    let wanted = wanted.to_lowercase();
    declared == wanted
        || declared
            .strip_prefix(wanted.as_str())
            .is_some_and(|rest| rest.starts_with('-'))
}
