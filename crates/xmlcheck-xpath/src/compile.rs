//! Compilation: parse, resolve namespace prefixes and validate function calls.

use indexmap::IndexMap;
use xmlcheck_xml::{NodeId, XML_NAMESPACE, XmlDocument};

use crate::ast::{Expr, NodeTest, Step};
use crate::error::{Result, XPathError};
use crate::eval::{Context, Evaluator};
use crate::functions::Function;
use crate::parser::parse;
use crate::value::XPathValue;

/// Prefix to namespace URI bindings used to compile an expression.
///
/// Insertion order is kept. A prefix can only be bound to one URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceBindings {
    map: IndexMap<String, String>,
}

impl NamespaceBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build bindings from `(prefix, uri)` pairs.
    ///
    /// Repeating a prefix with the same URI is allowed; with a different URI
    /// it is an error.
    pub fn from_pairs<P, U>(pairs: impl IntoIterator<Item = (P, U)>) -> Result<Self>
    where
        P: Into<String>,
        U: Into<String>,
    {
        let mut bindings = Self::new();
        for (prefix, uri) in pairs {
            bindings.bind(prefix, uri)?;
        }
        Ok(bindings)
    }

    /// Bind `prefix` to `uri`.
    pub fn bind(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Result<()> {
        let prefix = prefix.into();
        let uri = uri.into();
        match self.map.get(&prefix) {
            Some(existing) if *existing != uri => Err(XPathError::ConflictingBinding {
                prefix,
                first: existing.clone(),
                second: uri,
            }),
            Some(_) => Ok(()),
            None => {
                self.map.insert(prefix, uri);
                Ok(())
            }
        }
    }

    /// Bind `prefix` unless it is already bound. Returns whether it was added.
    pub fn bind_if_absent(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> bool {
        let prefix = prefix.into();
        if self.map.contains_key(&prefix) {
            return false;
        }
        self.map.insert(prefix, uri.into());
        true
    }

    /// URI bound to `prefix`. `xml` resolves even when not bound explicitly.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        match self.map.get(prefix) {
            Some(uri) => Some(uri.as_str()),
            None if prefix == "xml" => Some(XML_NAMESPACE),
            None => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Owned `(prefix, uri)` pairs in insertion order.
    pub(crate) fn to_pairs(&self) -> Vec<(String, String)> {
        self.map
            .iter()
            .map(|(p, u)| (p.clone(), u.clone()))
            .collect()
    }
}

/// A parsed expression with every prefix resolved and every function call
/// checked. Immutable and shareable across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledXPath {
    source: String,
    expr: Expr,
}

impl CompiledXPath {
    /// The expression text this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate with the document node as context.
    pub fn evaluate(&self, doc: &XmlDocument) -> Result<XPathValue> {
        self.evaluate_from(doc, doc.root())
    }

    /// Evaluate with `node` as context.
    pub fn evaluate_from(&self, doc: &XmlDocument, node: NodeId) -> Result<XPathValue> {
        let value = Evaluator::new(doc).evaluate(&self.expr, &Context::new(node))?;
        tracing::trace!(expression = %self.source, result = %value, "Evaluated XPath");
        Ok(value)
    }
}

/// Compile `expression` against `bindings`.
///
/// Syntax errors, unbound prefixes, unknown functions, wrong argument counts
/// and variable references are all reported here.
///
/// # Example
///
/// ```rust
/// use xmlcheck_xpath::{compile, NamespaceBindings, XPathValue};
///
/// let bindings = NamespaceBindings::from_pairs([("m", "urn:maven")]).unwrap();
/// let xpath = compile("count(//m:dependency)", &bindings).unwrap();
///
/// let doc = xmlcheck_xml::parse(r#"<project xmlns="urn:maven"><dependency/></project>"#).unwrap();
/// assert_eq!(xpath.evaluate(&doc).unwrap(), XPathValue::Number(1.0));
/// ```
pub fn compile(expression: &str, bindings: &NamespaceBindings) -> Result<CompiledXPath> {
    let result = parse(expression).and_then(|mut expr| {
        resolve_expr(&mut expr, bindings)?;
        Ok(expr)
    });

    match result {
        Ok(expr) => Ok(CompiledXPath {
            source: expression.to_string(),
            expr,
        }),
        Err(err) => {
            tracing::debug!(expression, error = %err, "XPath compilation failed");
            Err(err)
        }
    }
}

fn resolve_expr(expr: &mut Expr, bindings: &NamespaceBindings) -> Result<()> {
    match expr {
        Expr::Number(_) | Expr::Literal(_) => Ok(()),
        Expr::Variable(name) => Err(XPathError::VariableReference { name: name.clone() }),
        Expr::Negate(inner) => resolve_expr(inner, bindings),
        Expr::Binary { left, right, .. } | Expr::Union(left, right) => {
            resolve_expr(left, bindings)?;
            resolve_expr(right, bindings)
        }
        Expr::FunctionCall { name, args } => {
            if name.contains(':') {
                // Extension functions are never available, but the prefix must still resolve
                let prefix = name.split(':').next().unwrap_or_default();
                resolve_prefix(prefix, bindings)?;
            }
            let function = Function::from_name(name)
                .ok_or_else(|| XPathError::UnknownFunction { name: name.clone() })?;
            function.check_arity(args.len())?;
            args.iter_mut().try_for_each(|arg| resolve_expr(arg, bindings))
        }
        Expr::Path(path) => resolve_steps(&mut path.steps, bindings),
        Expr::Filter {
            primary,
            predicates,
        } => {
            resolve_expr(primary, bindings)?;
            predicates
                .iter_mut()
                .try_for_each(|p| resolve_expr(p, bindings))
        }
        Expr::PathFrom { base, steps } => {
            resolve_expr(base, bindings)?;
            resolve_steps(steps, bindings)
        }
    }
}

fn resolve_steps(steps: &mut [Step], bindings: &NamespaceBindings) -> Result<()> {
    for step in steps {
        match &mut step.test {
            NodeTest::Name(test) => {
                if let Some(prefix) = &test.prefix {
                    test.namespace = Some(resolve_prefix(prefix, bindings)?);
                }
            }
            NodeTest::NamespaceWildcard { prefix, namespace } => {
                *namespace = Some(resolve_prefix(prefix, bindings)?);
            }
            _ => {}
        }
        for predicate in &mut step.predicates {
            resolve_expr(predicate, bindings)?;
        }
    }
    Ok(())
}

fn resolve_prefix(prefix: &str, bindings: &NamespaceBindings) -> Result<String> {
    bindings
        .resolve(prefix)
        .map(str::to_string)
        .ok_or_else(|| XPathError::UnresolvedPrefix {
            prefix: prefix.to_string(),
        })
}
