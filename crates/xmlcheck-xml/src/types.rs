//! Arena document model for line-mapped XML.

use xmlcheck_source_map::SourceInfo;

/// Namespace URI bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Index of a node in an [`XmlDocument`].
///
/// Nodes are allocated in document order, so comparing ids compares
/// document positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// Position of the node in document order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// A namespace-resolved name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    /// Prefix as written in the source, if any.
    pub prefix: Option<String>,
    /// Local part of the name.
    pub local: String,
    /// Namespace URI the name resolved to.
    pub namespace: Option<String>,
}

impl QName {
    pub fn new(prefix: Option<String>, local: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            prefix,
            local: local.into(),
            namespace,
        }
    }

    /// The name as written: `prefix:local` or `local`.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }
}

/// A namespace declaration (`xmlns` or `xmlns:prefix` attribute).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Declared prefix; `None` for the default namespace.
    pub prefix: Option<String>,
    /// Bound URI; empty when the default namespace is undeclared.
    pub uri: String,
}

/// A node in the document arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) name: Option<QName>,
    pub(crate) value: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) attributes: Vec<NodeId>,
    pub(crate) namespaces: Vec<NamespaceDecl>,
    pub(crate) source_info: SourceInfo,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, parent: Option<NodeId>, source_info: SourceInfo) -> Self {
        Self {
            kind,
            name: None,
            value: String::new(),
            parent,
            children: Vec::new(),
            attributes: Vec::new(),
            namespaces: Vec::new(),
            source_info,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Element or attribute name; for processing instructions, the target.
    pub fn name(&self) -> Option<&QName> {
        self.name.as_ref()
    }

    /// Attribute value, text content, comment body or PI data.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn attributes(&self) -> &[NodeId] {
        &self.attributes
    }

    /// Namespace declarations written on this element.
    pub fn namespace_declarations(&self) -> &[NamespaceDecl] {
        &self.namespaces
    }

    pub fn source_info(&self) -> &SourceInfo {
        &self.source_info
    }

    /// 1-based line where this node starts.
    pub fn line(&self) -> usize {
        self.source_info.line()
    }
}

/// A parsed XML document.
///
/// Node 0 is the document node. Every other node is reachable from it
/// through `children` and `attributes`.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    pub(crate) nodes: Vec<Node>,
}

impl XmlDocument {
    pub(crate) fn new(source_info: SourceInfo) -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document, None, source_info)],
        }
    }

    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The root element, if the document has one.
    pub fn document_element(&self) -> Option<NodeId> {
        self.node(self.root())
            .children
            .iter()
            .copied()
            .find(|&id| self.kind(id) == NodeKind::Element)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn name(&self, id: NodeId) -> Option<&QName> {
        self.node(id).name.as_ref()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn attributes(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).attributes
    }

    pub fn line(&self, id: NodeId) -> usize {
        self.node(id).line()
    }

    pub fn source_info(&self, id: NodeId) -> &SourceInfo {
        &self.node(id).source_info
    }

    /// Number of nodes, the document node included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// All node ids in document order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId::from_index)
    }

    /// The XPath string-value of a node.
    ///
    /// Elements and the document concatenate their descendant text;
    /// other nodes return their own value.
    pub fn string_value(&self, id: NodeId) -> String {
        match self.kind(id) {
            NodeKind::Document | NodeKind::Element => self
                .descendants(id)
                .filter(|&n| self.kind(n) == NodeKind::Text)
                .map(|n| self.node(n).value.as_str())
                .collect(),
            _ => self.node(id).value.clone(),
        }
    }

    /// Descendants of `id` in document order, attributes excluded.
    ///
    /// A subtree occupies a contiguous id range, so no recursion is needed.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        (id.index() + 1..=self.subtree_end(id).index())
            .map(NodeId::from_index)
            .filter(move |&n| self.kind(n) != NodeKind::Attribute)
    }

    /// Value of the attribute with the given namespace and local name.
    pub fn attribute_value(&self, element: NodeId, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attributes(element).iter().find_map(|&attr| {
            let name = self.name(attr)?;
            (name.local == local && name.namespace.as_deref() == namespace)
                .then(|| self.node(attr).value.as_str())
        })
    }

    /// Namespace bindings in scope at `id`, innermost declaration first.
    ///
    /// The `xml` prefix is always included. Undeclared default namespaces
    /// (`xmlns=""`) are dropped.
    pub fn in_scope_namespaces(&self, id: NodeId) -> Vec<NamespaceDecl> {
        let mut seen: Vec<NamespaceDecl> = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            for decl in &self.node(node_id).namespaces {
                if !seen.iter().any(|d| d.prefix == decl.prefix) {
                    seen.push(decl.clone());
                }
            }
            current = self.parent(node_id);
        }
        seen.retain(|d| !d.uri.is_empty());
        seen.push(NamespaceDecl {
            prefix: Some("xml".to_string()),
            uri: XML_NAMESPACE.to_string(),
        });
        seen
    }

    /// Ancestors of `id`, nearest first, not including `id`.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// Last node (in document order) of the subtree rooted at `id`.
    pub fn subtree_end(&self, id: NodeId) -> NodeId {
        let mut current = id;
        loop {
            let node = self.node(current);
            if let Some(&last) = node.children.last() {
                current = last;
            } else if let Some(&last) = node.attributes.last() {
                return last;
            } else {
                return current;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn test_qualified_name() {
        let name = QName::new(Some("ui".to_string()), "define", None);
        assert_eq!(name.qualified(), "ui:define");
        assert_eq!(QName::new(None, "br", None).qualified(), "br");
    }

    #[test]
    fn test_string_value_concatenates_descendant_text() {
        let doc = parse("<a>one<b>two</b><!--x-->three</a>").unwrap();
        let a = doc.document_element().unwrap();
        assert_eq!(doc.string_value(a), "onetwothree");
        assert_eq!(doc.string_value(doc.root()), "onetwothree");
    }

    #[test]
    fn test_descendants_skip_attributes() {
        let doc = parse(r#"<a x="1"><b y="2"><c/></b>text</a>"#).unwrap();
        let a = doc.document_element().unwrap();
        let names: Vec<String> = doc
            .descendants(a)
            .map(|n| match doc.kind(n) {
                NodeKind::Element => doc.name(n).map(|q| q.qualified()).unwrap_or_default(),
                _ => doc.string_value(n),
            })
            .collect();
        assert_eq!(names, vec!["b", "c", "text"]);
        let c = doc.descendants(a).nth(1).unwrap();
        assert_eq!(doc.descendants(c).count(), 0);
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let depth = 50_000;
        let text = format!("{}x{}", "<a>".repeat(depth), "</a>".repeat(depth));
        // A small stack would overflow on any per-level recursion.
        let handle = std::thread::Builder::new()
            .stack_size(1024 * 1024)
            .spawn(move || {
                let doc = parse(&text).unwrap();
                let root = doc.document_element().unwrap();
                (doc.descendants(root).count(), doc.string_value(root))
            })
            .unwrap();
        let (count, value) = handle.join().unwrap();
        assert_eq!(count, depth);
        assert_eq!(value, "x");
    }

    #[test]
    fn test_attribute_value_lookup() {
        let doc = parse(r#"<a xmlns:x="urn:x" id="1" x:id="2"/>"#).unwrap();
        let a = doc.document_element().unwrap();
        assert_eq!(doc.attribute_value(a, None, "id"), Some("1"));
        assert_eq!(doc.attribute_value(a, Some("urn:x"), "id"), Some("2"));
        assert_eq!(doc.attribute_value(a, None, "missing"), None);
    }

    #[test]
    fn test_in_scope_namespaces_inner_wins() {
        let doc = parse(r#"<a xmlns:p="urn:outer"><b xmlns:p="urn:inner" xmlns=""/></a>"#).unwrap();
        let a = doc.document_element().unwrap();
        let b = doc.children(a)[0];

        let scope = doc.in_scope_namespaces(b);
        let p = scope.iter().find(|d| d.prefix.as_deref() == Some("p")).unwrap();
        assert_eq!(p.uri, "urn:inner");
        assert!(scope.iter().all(|d| d.prefix.is_some()));
        assert!(scope.iter().any(|d| d.uri == XML_NAMESPACE));
    }

    #[test]
    fn test_subtree_end_and_ancestors() {
        let doc = parse(r#"<a><b c="1"/><d/></a>"#).unwrap();
        let a = doc.document_element().unwrap();
        let b = doc.children(a)[0];
        let d = doc.children(a)[1];

        assert_eq!(doc.subtree_end(a), d);
        assert_eq!(doc.subtree_end(b), doc.attributes(b)[0]);
        assert_eq!(doc.ancestors(d).collect::<Vec<_>>(), vec![a, doc.root()]);
    }
}
