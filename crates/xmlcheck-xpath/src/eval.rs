//! Evaluation of compiled expressions against an [`XmlDocument`].

use xmlcheck_xml::{NodeId, NodeKind, XmlDocument};

use crate::ast::{Axis, BinaryOp, Expr, NodeTest, Step};
use crate::error::{Result, XPathError};
use crate::functions::Function;
use crate::value::XPathValue;

/// The evaluation context: context node, proximity position and size.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Context {
    pub node: NodeId,
    pub position: usize,
    pub size: usize,
}

impl Context {
    pub(crate) fn new(node: NodeId) -> Self {
        Self {
            node,
            position: 1,
            size: 1,
        }
    }
}

pub(crate) struct Evaluator<'d> {
    doc: &'d XmlDocument,
}

impl<'d> Evaluator<'d> {
    pub(crate) fn new(doc: &'d XmlDocument) -> Self {
        Self { doc }
    }

    pub(crate) fn evaluate(&self, expr: &Expr, ctx: &Context) -> Result<XPathValue> {
        match expr {
            Expr::Number(n) => Ok(XPathValue::Number(*n)),
            Expr::Literal(s) => Ok(XPathValue::String(s.clone())),
            Expr::Variable(name) => Err(XPathError::VariableReference { name: name.clone() }),
            Expr::Negate(inner) => {
                let value = self.evaluate(inner, ctx)?;
                Ok(XPathValue::Number(-value.to_number(self.doc)))
            }
            Expr::Binary { op, left, right } => self.evaluate_binary(*op, left, right, ctx),
            Expr::FunctionCall { name, args } => {
                let function = Function::from_name(name)
                    .ok_or_else(|| XPathError::UnknownFunction { name: name.clone() })?;
                function.check_arity(args.len())?;
                let values = args
                    .iter()
                    .map(|arg| self.evaluate(arg, ctx))
                    .collect::<Result<Vec<_>>>()?;
                function.call(self.doc, ctx, &values)
            }
            Expr::Union(left, right) => {
                let mut nodes = self.node_set(left, ctx, "|")?;
                nodes.extend(self.node_set(right, ctx, "|")?);
                nodes.sort_unstable();
                nodes.dedup();
                Ok(XPathValue::NodeSet(nodes))
            }
            Expr::Path(path) => {
                let start = if path.absolute {
                    self.doc.root()
                } else {
                    ctx.node
                };
                Ok(XPathValue::NodeSet(self.select(vec![start], &path.steps)?))
            }
            Expr::Filter {
                primary,
                predicates,
            } => {
                let mut nodes = self.node_set(primary, ctx, "a predicate")?;
                for predicate in predicates {
                    nodes = self.filter(nodes, predicate)?;
                }
                Ok(XPathValue::NodeSet(nodes))
            }
            Expr::PathFrom { base, steps } => {
                let nodes = self.node_set(base, ctx, "a path step")?;
                Ok(XPathValue::NodeSet(self.select(nodes, steps)?))
            }
        }
    }

    fn node_set(&self, expr: &Expr, ctx: &Context, usage: &str) -> Result<Vec<NodeId>> {
        match self.evaluate(expr, ctx)? {
            XPathValue::NodeSet(nodes) => Ok(nodes),
            other => Err(XPathError::type_error(format!(
                "{} needs a node-set, found a {}",
                usage,
                other.type_name()
            ))),
        }
    }

    fn evaluate_binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        ctx: &Context,
    ) -> Result<XPathValue> {
        match op {
            BinaryOp::Or => {
                if self.evaluate(left, ctx)?.to_boolean() {
                    return Ok(XPathValue::Boolean(true));
                }
                Ok(XPathValue::Boolean(self.evaluate(right, ctx)?.to_boolean()))
            }
            BinaryOp::And => {
                if !self.evaluate(left, ctx)?.to_boolean() {
                    return Ok(XPathValue::Boolean(false));
                }
                Ok(XPathValue::Boolean(self.evaluate(right, ctx)?.to_boolean()))
            }
            BinaryOp::Eq
            | BinaryOp::Neq
            | BinaryOp::Lt
            | BinaryOp::Lte
            | BinaryOp::Gt
            | BinaryOp::Gte => {
                let l = self.evaluate(left, ctx)?;
                let r = self.evaluate(right, ctx)?;
                Ok(XPathValue::Boolean(self.compare(op, &l, &r)))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let l = self.evaluate(left, ctx)?.to_number(self.doc);
                let r = self.evaluate(right, ctx)?.to_number(self.doc);
                let n = match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                    // Truncating remainder, sign follows the dividend
                    _ => l % r,
                };
                Ok(XPathValue::Number(n))
            }
        }
    }

    /// Comparison with node-set semantics: a node-set compares true when
    /// some node's string-value does.
    fn compare(&self, op: BinaryOp, left: &XPathValue, right: &XPathValue) -> bool {
        let strings = |nodes: &[NodeId]| -> Vec<XPathValue> {
            nodes
                .iter()
                .map(|&id| XPathValue::String(self.doc.string_value(id)))
                .collect()
        };

        match (left, right) {
            (XPathValue::NodeSet(_), XPathValue::Boolean(_))
            | (XPathValue::Boolean(_), XPathValue::NodeSet(_)) => compare_atomic(
                op,
                &XPathValue::Boolean(left.to_boolean()),
                &XPathValue::Boolean(right.to_boolean()),
                self.doc,
            ),
            (XPathValue::NodeSet(a), XPathValue::NodeSet(b)) => {
                let rights = strings(b);
                strings(a)
                    .iter()
                    .any(|l| rights.iter().any(|r| compare_atomic(op, l, r, self.doc)))
            }
            (XPathValue::NodeSet(a), other) => strings(a)
                .iter()
                .any(|l| compare_atomic(op, l, other, self.doc)),
            (other, XPathValue::NodeSet(b)) => strings(b)
                .iter()
                .any(|r| compare_atomic(op, other, r, self.doc)),
            _ => compare_atomic(op, left, right, self.doc),
        }
    }

    /// Apply location steps to every node of `start`.
    ///
    /// Predicates see each context node's axis separately; the combined
    /// result is sorted into document order.
    fn select(&self, start: Vec<NodeId>, steps: &[Step]) -> Result<Vec<NodeId>> {
        let mut current = start;
        for step in steps {
            let mut next = Vec::new();
            for &node in &current {
                let mut selected: Vec<NodeId> = self
                    .axis(node, step.axis)
                    .into_iter()
                    .filter(|&id| self.matches(id, step.axis, &step.test))
                    .collect();
                for predicate in &step.predicates {
                    selected = self.filter(selected, predicate)?;
                }
                next.extend(selected);
            }
            next.sort_unstable();
            next.dedup();
            current = next;
        }
        Ok(current)
    }

    /// Keep the nodes for which `predicate` holds. A numeric predicate
    /// compares against the proximity position.
    fn filter(&self, nodes: Vec<NodeId>, predicate: &Expr) -> Result<Vec<NodeId>> {
        let size = nodes.len();
        let mut kept = Vec::with_capacity(size);
        for (idx, node) in nodes.into_iter().enumerate() {
            let ctx = Context {
                node,
                position: idx + 1,
                size,
            };
            let keep = match self.evaluate(predicate, &ctx)? {
                XPathValue::Number(n) => n == ctx.position as f64,
                other => other.to_boolean(),
            };
            if keep {
                kept.push(node);
            }
        }
        Ok(kept)
    }

    /// Nodes on `axis` from `node`, in proximity order.
    fn axis(&self, node: NodeId, axis: Axis) -> Vec<NodeId> {
        let doc = self.doc;
        let is_attribute = doc.kind(node) == NodeKind::Attribute;
        match axis {
            Axis::SelfAxis => vec![node],
            Axis::Child => doc.children(node).to_vec(),
            Axis::Attribute => doc.attributes(node).to_vec(),
            Axis::Namespace => Vec::new(),
            Axis::Parent => doc.parent(node).into_iter().collect(),
            Axis::Ancestor => doc.ancestors(node).collect(),
            Axis::AncestorOrSelf => std::iter::once(node).chain(doc.ancestors(node)).collect(),
            Axis::Descendant => doc.descendants(node).collect(),
            Axis::DescendantOrSelf => std::iter::once(node).chain(doc.descendants(node)).collect(),
            Axis::FollowingSibling | Axis::PrecedingSibling if is_attribute => Vec::new(),
            Axis::FollowingSibling => self
                .siblings(node)
                .iter()
                .copied()
                .skip_while(|&id| id != node)
                .skip(1)
                .collect(),
            Axis::PrecedingSibling => self
                .siblings(node)
                .iter()
                .copied()
                .take_while(|&id| id != node)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect(),
            Axis::Following => {
                let end = doc.subtree_end(node).index();
                doc.node_ids()
                    .filter(|id| id.index() > end && doc.kind(*id) != NodeKind::Attribute)
                    .collect()
            }
            Axis::Preceding => {
                // Ancestors come nearest first, so reversed they are sorted
                let mut ancestors: Vec<NodeId> = doc.ancestors(node).collect();
                ancestors.reverse();
                let mut out: Vec<NodeId> = doc
                    .node_ids()
                    .take(node.index())
                    .filter(|id| {
                        doc.kind(*id) != NodeKind::Attribute && ancestors.binary_search(id).is_err()
                    })
                    .collect();
                out.reverse();
                out
            }
        }
    }

    fn siblings(&self, node: NodeId) -> &'d [NodeId] {
        match self.doc.parent(node) {
            Some(parent) => self.doc.children(parent),
            None => &[],
        }
    }

    fn matches(&self, node: NodeId, axis: Axis, test: &NodeTest) -> bool {
        let kind = self.doc.kind(node);
        let principal = if axis == Axis::Attribute {
            NodeKind::Attribute
        } else {
            NodeKind::Element
        };

        match test {
            NodeTest::Node => true,
            NodeTest::Text => kind == NodeKind::Text,
            NodeTest::Comment => kind == NodeKind::Comment,
            NodeTest::ProcessingInstruction(target) => {
                kind == NodeKind::ProcessingInstruction
                    && target.as_ref().is_none_or(|target| {
                        self.doc.name(node).is_some_and(|name| &name.local == target)
                    })
            }
            NodeTest::Any => kind == principal,
            NodeTest::NamespaceWildcard { namespace, .. } => {
                kind == principal
                    && self
                        .doc
                        .name(node)
                        .is_some_and(|name| name.namespace.is_some() && name.namespace == *namespace)
            }
            NodeTest::Name(test) => {
                if kind != principal {
                    return false;
                }
                let Some(name) = self.doc.name(node) else {
                    return false;
                };
                if name.local != test.local {
                    return false;
                }
                match (&test.prefix, kind) {
                    (Some(_), _) => name.namespace.is_some() && name.namespace == test.namespace,
                    // Unprefixed element tests match elements written without a prefix
                    (None, NodeKind::Element) => name.prefix.is_none(),
                    (None, _) => name.namespace.is_none(),
                }
            }
        }
    }
}

/// Comparison of two values that are not node-sets.
fn compare_atomic(op: BinaryOp, left: &XPathValue, right: &XPathValue, doc: &XmlDocument) -> bool {
    match op {
        BinaryOp::Eq | BinaryOp::Neq => {
            let equal = match (left, right) {
                (XPathValue::Boolean(_), _) | (_, XPathValue::Boolean(_)) => {
                    left.to_boolean() == right.to_boolean()
                }
                (XPathValue::Number(_), _) | (_, XPathValue::Number(_)) => {
                    left.to_number(doc) == right.to_number(doc)
                }
                _ => left.to_string_value(doc) == right.to_string_value(doc),
            };
            if op == BinaryOp::Eq { equal } else { !equal }
        }
        _ => {
            let l = left.to_number(doc);
            let r = right.to_number(doc);
            match op {
                BinaryOp::Lt => l < r,
                BinaryOp::Lte => l <= r,
                BinaryOp::Gt => l > r,
                _ => l >= r,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NamespaceBindings, compile};

    const CATALOG: &str = r#"<catalog xmlns:x="urn:x" xml:lang="en-GB">
  <book id="b1" year="2001"><title>Alpha</title><price>10</price></book>
  <book id="b2" year="1999"><title>Beta</title><price>5.5</price></book>
  <!-- sold out -->
  <x:book xml:id="b3"><title>Gamma</title><price>2</price></x:book>
  <?note check?>
</catalog>"#;

    fn eval(expr: &str) -> XPathValue {
        let doc = xmlcheck_xml::parse(CATALOG).unwrap();
        let bindings = NamespaceBindings::from_pairs([("x", "urn:x")]).unwrap();
        compile(expr, &bindings).unwrap().evaluate(&doc).unwrap()
    }

    fn lines(expr: &str) -> Vec<usize> {
        let doc = xmlcheck_xml::parse(CATALOG).unwrap();
        let bindings = NamespaceBindings::from_pairs([("x", "urn:x")]).unwrap();
        match compile(expr, &bindings).unwrap().evaluate(&doc).unwrap() {
            XPathValue::NodeSet(nodes) => nodes.into_iter().map(|id| doc.line(id)).collect(),
            other => panic!("expected a node-set, got {:?}", other),
        }
    }

    fn number(expr: &str) -> f64 {
        match eval(expr) {
            XPathValue::Number(n) => n,
            other => panic!("expected a number, got {:?}", other),
        }
    }

    fn string(expr: &str) -> String {
        match eval(expr) {
            XPathValue::String(s) => s,
            other => panic!("expected a string, got {:?}", other),
        }
    }

    fn boolean(expr: &str) -> bool {
        match eval(expr) {
            XPathValue::Boolean(b) => b,
            other => panic!("expected a boolean, got {:?}", other),
        }
    }

    #[test]
    fn test_child_and_descendant_paths() {
        assert_eq!(lines("/catalog/book"), vec![2, 3]);
        assert_eq!(lines("//title"), vec![2, 3, 5]);
        assert_eq!(lines("//x:book"), vec![5]);
        assert_eq!(lines("//x:*"), vec![5]);
        assert_eq!(number("count(//*)"), 10.0);
    }

    #[test]
    fn test_unprefixed_test_ignores_prefixed_elements() {
        assert_eq!(lines("//book"), vec![2, 3]);
        assert_eq!(lines("//*[local-name()='book']"), vec![2, 3, 5]);
    }

    #[test]
    fn test_predicates_and_positions() {
        assert_eq!(lines("//book[@year > 2000]"), vec![2]);
        assert_eq!(lines("//book[2]"), vec![3]);
        assert_eq!(lines("//book[last()]"), vec![3]);
        assert_eq!(lines("(//title)[last()]"), vec![5]);
        assert_eq!(string("string(//book[price < 6]/title)"), "Beta");
    }

    #[test]
    fn test_reverse_axis_positions() {
        assert_eq!(string("string(//x:book/preceding-sibling::*[1]/title)"), "Beta");
        assert_eq!(string("name(//title[.='Gamma']/ancestor::*[last()])"), "catalog");
        assert_eq!(number("count(//x:book/preceding::book)"), 2.0);
        assert_eq!(number("count(/catalog/book[1]/following::title)"), 2.0);
    }

    #[test]
    fn test_descendant_axis_on_deep_documents() {
        let depth = 50_000;
        let text = format!("<a>{}x{}</a>", "<a>".repeat(depth - 1), "</a>".repeat(depth - 1));
        let handle = std::thread::Builder::new()
            .stack_size(1024 * 1024)
            .spawn(move || {
                let doc = xmlcheck_xml::parse(&text).unwrap();
                let bindings = NamespaceBindings::new();
                let count = compile("count(//a)", &bindings).unwrap().evaluate(&doc).unwrap();
                let value = compile("string(/a)", &bindings).unwrap().evaluate(&doc).unwrap();
                (count, value)
            })
            .unwrap();
        let (count, value) = handle.join().unwrap();
        assert_eq!(count, XPathValue::Number(depth as f64));
        assert_eq!(value, XPathValue::String("x".to_string()));
    }

    #[test]
    fn test_preceding_axis_skips_ancestors() {
        assert_eq!(number("count(//x:book/title/preceding::*)"), 6.0);
        assert_eq!(lines("//x:book/preceding::title"), vec![2, 3]);
    }

    #[test]
    fn test_attribute_axis() {
        assert_eq!(number("count(//book/@*)"), 4.0);
        assert_eq!(string("name(//x:book/@*)"), "xml:id");
        assert_eq!(number("count(//@id/..)"), 2.0);
        assert_eq!(number("count(//@id/following-sibling::node())"), 0.0);
    }

    #[test]
    fn test_other_node_types() {
        assert_eq!(lines("//comment()"), vec![4]);
        assert_eq!(lines("//processing-instruction('note')"), vec![6]);
        assert_eq!(number("count(//processing-instruction('other'))"), 0.0);
        assert_eq!(string("string(//book[1]/title/text())"), "Alpha");
        assert_eq!(number("count(//namespace::*)"), 0.0);
    }

    #[test]
    fn test_node_set_comparisons() {
        assert!(boolean("//price = 2"));
        assert!(boolean("//price != 2"));
        assert!(!boolean("//price > 10"));
        assert!(boolean("//title = 'Gamma'"));
        assert!(boolean("//book/@id = //x:book/@xml:id | //book/@id"));
        assert!(!boolean("//missing = //missing"));
        assert!(boolean("//missing = false()"));
    }

    #[test]
    fn test_arithmetic_and_numbers() {
        assert_eq!(number("sum(//price)"), 17.5);
        assert_eq!(number("7 mod -3"), 1.0);
        assert_eq!(number("-7 mod 3"), -1.0);
        assert_eq!(number("1 div 0"), f64::INFINITY);
        assert!(number("number('x') + 1").is_nan());
        assert_eq!(number("floor(-1.5) + ceiling(1.2) + round(2.5)"), 3.0);
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(string("concat('a', 'b', 'c')"), "abc");
        assert_eq!(string("substring-before('2001-05', '-')"), "2001");
        assert_eq!(string("substring-after('2001-05', '-')"), "05");
        assert_eq!(string("normalize-space('  a \n b ')"), "a b");
        assert_eq!(string("translate('bar', 'abc', 'AB')"), "BAr");
        assert_eq!(number("string-length('héllo')"), 5.0);
        assert_eq!(string("substring('12345', 2, 3)"), "234");
        assert_eq!(string("string(1 div 0)"), "Infinity");
        assert!(boolean("starts-with(//book/title, 'Al') and contains('abc', 'b')"));
    }

    #[test]
    fn test_id_and_lang() {
        assert_eq!(lines("id('b2 b3')"), vec![3, 5]);
        assert_eq!(lines("id(//book[1]/@id)"), vec![2]);
        assert!(boolean("boolean(//title[lang('en')])"));
        assert!(!boolean("boolean(//title[lang('fr')])"));
    }

    #[test]
    fn test_names_and_namespaces() {
        assert_eq!(string("namespace-uri(//x:book)"), "urn:x");
        assert_eq!(string("name(//x:book)"), "x:book");
        assert_eq!(string("local-name(//x:book)"), "book");
        assert_eq!(string("local-name(//nothing)"), "");
    }

    #[test]
    fn test_boolean_short_circuit_skips_type_errors() {
        assert!(boolean("true() or count('x')"));
        assert!(!boolean("false() and count('x')"));
    }

    #[test]
    fn test_runtime_type_errors() {
        let doc = xmlcheck_xml::parse(CATALOG).unwrap();
        let bindings = NamespaceBindings::new();
        for expr in ["count('x')", "sum(1)", "'a' | //book", "('a')[1]", "'a'/b"] {
            let err = compile(expr, &bindings).unwrap().evaluate(&doc).unwrap_err();
            assert!(matches!(err, XPathError::Type { .. }), "{}: {:?}", expr, err);
        }
    }
}
