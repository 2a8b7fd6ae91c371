//! XML parser that builds line-mapped [`XmlDocument`] arenas.

use crate::prolog;
use crate::types::{NamespaceDecl, Node, NodeId, NodeKind, QName, XML_NAMESPACE, XmlDocument};
use crate::{Error, ParseResult, Result, XmlParseContext};
use quick_xml::Reader;
use quick_xml::events::{BytesEnd, BytesPI, BytesStart, BytesText, Event};
use xmlcheck_error_reporting::DiagnosticMessage;
use xmlcheck_source_map::{FileId, LineIndex, SourceInfo};

/// Parse XML from a string into a line-mapped document.
///
/// # Example
///
/// ```rust
/// use xmlcheck_xml::parse;
///
/// let doc = parse("<root>\n  <child/>\n</root>").unwrap();
/// let root = doc.document_element().unwrap();
/// let child = doc.children(root)[1];
/// assert_eq!(doc.line(child), 2);
/// ```
///
/// # Errors
///
/// Returns an error if the document is not well-formed.
pub fn parse(content: &str) -> Result<XmlDocument> {
    parse_impl(content, FileId(0), &mut Vec::new())
}

/// Parse XML from a string with an associated file ID.
///
/// The file ID is recorded in every node's source info.
pub fn parse_with_file_id(content: &str, file_id: FileId) -> Result<XmlDocument> {
    parse_impl(content, file_id, &mut Vec::new())
}

/// Parse XML from a string with diagnostic collection.
///
/// Recovery warnings (such as content before the prolog) are added to the
/// context even when parsing succeeds. Errors are returned as X-1-*
/// diagnostics and also recorded in the context.
///
/// # Example
///
/// ```rust
/// use xmlcheck_xml::{parse_with_context, XmlParseContext};
///
/// let mut ctx = XmlParseContext::new();
/// let doc = parse_with_context("junk<?xml version=\"1.0\"?><root/>", &mut ctx).unwrap();
/// assert!(doc.document_element().is_some());
/// assert_eq!(ctx.diagnostics()[0].code.as_deref(), Some("X-1-7"));
/// ```
pub fn parse_with_context(content: &str, ctx: &mut XmlParseContext) -> ParseResult<XmlDocument> {
    parse_with_context_and_file_id(content, FileId(0), ctx)
}

/// [`parse_with_context`] with an associated file ID.
pub fn parse_with_context_and_file_id(
    content: &str,
    file_id: FileId,
    ctx: &mut XmlParseContext,
) -> ParseResult<XmlDocument> {
    let mut warnings = Vec::new();
    let result = parse_impl(content, file_id, &mut warnings);
    for warning in warnings {
        ctx.add_diagnostic(warning);
    }
    match result {
        Ok(doc) => Ok(doc),
        Err(err) => {
            let diagnostic = err.to_diagnostic();
            ctx.add_diagnostic(diagnostic.clone());
            Err(vec![diagnostic])
        }
    }
}

fn parse_impl(
    content: &str,
    file_id: FileId,
    warnings: &mut Vec<DiagnosticMessage>,
) -> Result<XmlDocument> {
    let index = LineIndex::new(content);
    let recovery = prolog::recover(content);

    let text = match &recovery {
        Some(recovery) => {
            if !recovery.junk.is_empty() {
                tracing::debug!(
                    blanked = recovery.blanked,
                    "Ignoring content before XML declaration"
                );
                let location = SourceInfo::from_offsets(file_id, 0, recovery.blanked, &index);
                warnings.push(recovery.to_diagnostic(location));
            }
            recovery.text.as_str()
        }
        None => content,
    };

    let result = XmlParser::new(text, file_id, index).parse();
    if let Err(err) = &result {
        tracing::debug!(code = err.code(), error = %err, "Document is not well-formed");
    }
    result
}

/// Internal parser state.
struct XmlParser<'a> {
    /// The source content being parsed.
    source: &'a str,

    /// The quick-xml reader.
    reader: Reader<&'a [u8]>,

    /// File ID for creating SourceInfo.
    file_id: FileId,

    /// Newline index of the source.
    index: LineIndex,

    /// Document under construction.
    doc: XmlDocument,

    /// Elements opened but not yet closed.
    stack: Vec<OpenElement>,

    /// Declarations of all open elements, innermost last.
    bindings: Vec<NamespaceDecl>,

    /// Whether the root element has been seen.
    root_seen: bool,
}

struct OpenElement {
    id: NodeId,
    /// Name as written in the start tag.
    qname: String,
    /// Byte offset of the `<` of the start tag.
    start_offset: usize,
    /// Length of `bindings` before this element's declarations.
    bindings_mark: usize,
}

/// An attribute as read from the tag, before namespace resolution.
struct RawAttribute {
    key: String,
    value: String,
    start: usize,
    end: usize,
}

impl<'a> XmlParser<'a> {
    fn new(source: &'a str, file_id: FileId, index: LineIndex) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        // End tags are checked here so the error carries a location
        reader.config_mut().check_end_names = false;

        let doc = XmlDocument::new(SourceInfo::from_offsets(file_id, 0, source.len(), &index));

        Self {
            source,
            reader,
            file_id,
            index,
            doc,
            stack: Vec::new(),
            bindings: Vec::new(),
            root_seen: false,
        }
    }

    fn parse(mut self) -> Result<XmlDocument> {
        loop {
            // Capture position before reading the event
            let event_start = self.reader.buffer_position() as usize;

            match self.reader.read_event() {
                Ok(Event::Start(e)) => self.handle_start(&e, event_start, false)?,
                Ok(Event::Empty(e)) => self.handle_start(&e, event_start, true)?,
                Ok(Event::End(e)) => self.handle_end(&e, event_start)?,
                Ok(Event::Text(e)) => self.handle_text(&e, event_start)?,
                Ok(Event::CData(e)) => {
                    let end_offset = self.position();
                    let text = String::from_utf8_lossy(&e).into_owned();
                    self.append_text(text, event_start, end_offset)?;
                }
                Ok(Event::Comment(e)) => self.handle_comment(&e, event_start)?,
                Ok(Event::PI(e)) => self.handle_pi(&e, event_start),
                Ok(Event::Decl(_) | Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Err(e) => {
                    let position = self.reader.error_position() as usize;
                    return Err(Error::XmlSyntax {
                        message: e.to_string(),
                        location: Some(self.make_source_info(position, position)),
                    });
                }
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(Error::UnexpectedEof {
                expected: format!("closing tag </{}>", open.qname),
                location: Some(self.doc.source_info(open.id).clone()),
            });
        }

        if !self.root_seen {
            return Err(Error::EmptyDocument);
        }

        Ok(self.doc)
    }

    fn position(&self) -> usize {
        self.reader.buffer_position() as usize
    }

    fn current_parent(&self) -> NodeId {
        self.stack
            .last()
            .map_or_else(|| self.doc.root(), |open| open.id)
    }

    fn handle_start(&mut self, e: &BytesStart<'_>, event_start: usize, empty: bool) -> Result<()> {
        let end_offset = self.position();
        let tag_source = self.make_source_info(event_start, end_offset);
        let qname = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        check_name(&qname, &tag_source)?;

        if self.stack.is_empty() {
            if self.root_seen {
                return Err(Error::MultipleRoots {
                    location: Some(tag_source),
                });
            }
            self.root_seen = true;
        }

        let mut declarations = Vec::new();
        let mut attributes = Vec::new();
        for raw in self.read_attributes(e, event_start, end_offset)? {
            if raw.key == "xmlns" {
                declarations.push(NamespaceDecl {
                    prefix: None,
                    uri: raw.value,
                });
            } else if let Some(prefix) = raw.key.strip_prefix("xmlns:") {
                declarations.push(NamespaceDecl {
                    prefix: Some(prefix.to_string()),
                    uri: raw.value,
                });
            } else {
                attributes.push(raw);
            }
        }
        let bindings_mark = self.bindings.len();
        self.bindings.extend(declarations.iter().cloned());

        let parent = self.current_parent();
        let mut element = Node::new(NodeKind::Element, Some(parent), tag_source.clone());
        element.name = Some(self.resolve(&qname, true, &tag_source)?);
        element.namespaces = declarations;
        let id = self.doc.push(element);
        self.doc.node_mut(parent).children.push(id);

        for raw in attributes {
            let location = self.make_source_info(raw.start, raw.end);
            let name = self.resolve(&raw.key, false, &location)?;
            let mut attribute = Node::new(NodeKind::Attribute, Some(id), location);
            attribute.name = Some(name);
            attribute.value = raw.value;
            let attribute_id = self.doc.push(attribute);
            self.doc.node_mut(id).attributes.push(attribute_id);
        }

        if empty {
            self.bindings.truncate(bindings_mark);
        } else {
            self.stack.push(OpenElement {
                id,
                qname,
                start_offset: event_start,
                bindings_mark,
            });
        }
        Ok(())
    }

    fn handle_end(&mut self, e: &BytesEnd<'_>, event_start: usize) -> Result<()> {
        let end_offset = self.position();
        let found = String::from_utf8_lossy(e.name().as_ref()).into_owned();

        let Some(open) = self.stack.pop() else {
            return Err(Error::XmlSyntax {
                message: format!("Unexpected closing tag </{}>", found),
                location: Some(self.make_source_info(event_start, end_offset)),
            });
        };

        if open.qname != found {
            return Err(Error::MismatchedEndTag {
                expected: open.qname,
                found,
                location: Some(self.make_source_info(event_start, end_offset)),
            });
        }

        self.bindings.truncate(open.bindings_mark);
        let source_info = self.make_source_info(open.start_offset, end_offset);
        self.doc.node_mut(open.id).source_info = source_info;
        Ok(())
    }

    fn handle_text(&mut self, e: &BytesText<'_>, event_start: usize) -> Result<()> {
        let end_offset = self.position();
        if e.windows(3).any(|w| w == b"]]>") {
            return Err(Error::XmlSyntax {
                message: "`]]>` is not allowed in character data".to_string(),
                location: Some(self.make_source_info(event_start, end_offset)),
            });
        }
        let text = e.unescape().map_err(|err| Error::InvalidEntity {
            message: err.to_string(),
            location: Some(self.make_source_info(event_start, end_offset)),
        })?;
        self.append_text(text.into_owned(), event_start, end_offset)
    }

    /// Add character data to the open element, merging with a preceding text node.
    fn append_text(&mut self, text: String, start: usize, end: usize) -> Result<()> {
        let Some(open) = self.stack.last() else {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(Error::TextOutsideRoot {
                location: Some(self.make_source_info(start, end)),
            });
        };
        if text.is_empty() {
            return Ok(());
        }
        let parent = open.id;

        // A text child that is last in its parent is also the last node allocated
        if let Some(&last) = self.doc.children(parent).last() {
            if self.doc.kind(last) == NodeKind::Text {
                let merged = self.make_source_info(self.doc.source_info(last).start_offset(), end);
                let node = self.doc.node_mut(last);
                node.value.push_str(&text);
                node.source_info = merged;
                return Ok(());
            }
        }

        let mut node = Node::new(NodeKind::Text, Some(parent), self.make_source_info(start, end));
        node.value = text;
        let id = self.doc.push(node);
        self.doc.node_mut(parent).children.push(id);
        Ok(())
    }

    fn handle_comment(&mut self, e: &BytesText<'_>, event_start: usize) -> Result<()> {
        let end_offset = self.position();
        if e.windows(2).any(|w| w == b"--") || e.ends_with(b"-") {
            return Err(Error::XmlSyntax {
                message: "`--` is not allowed inside a comment".to_string(),
                location: Some(self.make_source_info(event_start, end_offset)),
            });
        }
        let parent = self.current_parent();
        let mut node = Node::new(
            NodeKind::Comment,
            Some(parent),
            self.make_source_info(event_start, end_offset),
        );
        node.value = String::from_utf8_lossy(e).into_owned();
        let id = self.doc.push(node);
        self.doc.node_mut(parent).children.push(id);
        Ok(())
    }

    fn handle_pi(&mut self, e: &BytesPI<'_>, event_start: usize) {
        let end_offset = self.position();
        let parent = self.current_parent();
        let mut node = Node::new(
            NodeKind::ProcessingInstruction,
            Some(parent),
            self.make_source_info(event_start, end_offset),
        );
        let target = String::from_utf8_lossy(e.target()).into_owned();
        node.name = Some(QName::new(None, target, None));
        node.value = String::from_utf8_lossy(e.content()).trim_start().to_string();
        let id = self.doc.push(node);
        self.doc.node_mut(parent).children.push(id);
    }

    /// Resolve a written name against the namespace declarations in scope.
    ///
    /// Unprefixed element names take the default namespace; unprefixed
    /// attribute names have no namespace.
    fn resolve(&self, qname: &str, is_element: bool, location: &SourceInfo) -> Result<QName> {
        match qname.split_once(':') {
            Some((prefix, local)) => {
                let namespace = self
                    .lookup(Some(prefix))
                    .ok_or_else(|| Error::UnboundPrefix {
                        prefix: prefix.to_string(),
                        location: Some(location.clone()),
                    })?;
                Ok(QName::new(Some(prefix.to_string()), local, Some(namespace)))
            }
            None => {
                let namespace = if is_element { self.lookup(None) } else { None };
                Ok(QName::new(None, qname, namespace))
            }
        }
    }

    fn lookup(&self, prefix: Option<&str>) -> Option<String> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE.to_string());
        }
        self.bindings
            .iter()
            .rev()
            .find(|decl| decl.prefix.as_deref() == prefix)
            .map(|decl| decl.uri.clone())
            .filter(|uri| !uri.is_empty())
    }

    fn read_attributes(
        &self,
        e: &BytesStart<'_>,
        tag_start: usize,
        tag_end: usize,
    ) -> Result<Vec<RawAttribute>> {
        // The tag content starts after '<'
        let content_start = tag_start + 1;
        let tag_str = String::from_utf8_lossy(e);
        let mut cursor = e.name().as_ref().len();
        let mut attributes = Vec::new();

        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|err| Error::XmlSyntax {
                message: format!("Attribute error: {}", err),
                location: Some(self.make_source_info(tag_start, tag_end)),
            })?;

            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let tag_source = self.make_source_info(tag_start, tag_end);
            check_name(&key, &tag_source)?;
            if attr.value.contains(&b'<') {
                return Err(Error::XmlSyntax {
                    message: format!("`<` is not allowed in the value of attribute `{}`", key),
                    location: Some(tag_source),
                });
            }
            let value = attr.unescape_value().map_err(|err| Error::InvalidEntity {
                message: err.to_string(),
                location: Some(self.make_source_info(tag_start, tag_end)),
            })?;

            let (start, end) = locate_attribute(&tag_str, cursor, &key);
            cursor = end;

            attributes.push(RawAttribute {
                key,
                value: value.into_owned(),
                start: content_start + start,
                end: content_start + end,
            });
        }

        Ok(attributes)
    }

    fn make_source_info(&self, start: usize, end: usize) -> SourceInfo {
        debug_assert!(end <= self.source.len());
        SourceInfo::from_offsets(self.file_id, start, end, &self.index)
    }
}

/// Reject names that are not a `prefix:local` or `local` pair of XML
/// NCNames.
fn check_name(qname: &str, location: &SourceInfo) -> Result<()> {
    let valid = match qname.split_once(':') {
        Some((prefix, local)) => is_ncname(prefix) && is_ncname(local),
        None => is_ncname(qname),
    };
    if valid {
        return Ok(());
    }
    Err(Error::XmlSyntax {
        message: format!("`{}` is not a valid XML name", qname),
        location: Some(location.clone()),
    })
}

fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let starts =
        first == '_' || first.is_ascii_alphabetic() || (!first.is_ascii() && first.is_alphabetic());
    starts
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') || !c.is_ascii())
}

/// Find `key="value"` in the raw tag text, starting at byte `from`.
///
/// Returns the span from the start of the name to the end of the value
/// (closing quote included). Scanning resumes after the previous
/// attribute's value, so a name that also appears inside an earlier value
/// is not mistaken for the attribute.
fn locate_attribute(tag: &str, from: usize, key: &str) -> (usize, usize) {
    let from = from.min(tag.len());
    let Some(rel) = tag[from..].find(key) else {
        return (from, from);
    };
    let name_start = from + rel;
    let bytes = tag.as_bytes();

    let mut pos = name_start + key.len();
    while pos < bytes.len() && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b'=') {
        pos += 1;
    }

    let value_end = match bytes.get(pos) {
        Some(&quote) if quote == b'"' || quote == b'\'' => tag[pos + 1..]
            .find(quote as char)
            .map_or(tag.len(), |p| pos + 1 + p + 1),
        _ => tag[pos..]
            .find(|c: char| c.is_ascii_whitespace())
            .map_or(tag.len(), |p| pos + p),
    };

    (name_start, value_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_named(doc: &XmlDocument, local: &str) -> Vec<NodeId> {
        doc.node_ids()
            .filter(|&id| {
                doc.kind(id) == NodeKind::Element
                    && doc.name(id).is_some_and(|n| n.local == local)
            })
            .collect()
    }

    #[test]
    fn test_parse_simple_element() {
        let doc = parse("<root/>").unwrap();
        let root = doc.document_element().unwrap();
        assert_eq!(doc.name(root).unwrap().local, "root");
        assert!(doc.children(root).is_empty());
        assert_eq!(doc.parent(root), Some(doc.root()));
    }

    #[test]
    fn test_parse_text_content() {
        let doc = parse("<root>Hello, world!</root>").unwrap();
        let root = doc.document_element().unwrap();
        let text = doc.children(root)[0];
        assert_eq!(doc.kind(text), NodeKind::Text);
        assert_eq!(doc.node(text).value(), "Hello, world!");
    }

    #[test]
    fn test_entities_and_cdata_merge_into_one_text_node() {
        let doc = parse("<r>a &amp; b<![CDATA[ <c> ]]>d</r>").unwrap();
        let r = doc.document_element().unwrap();
        assert_eq!(doc.children(r).len(), 1);
        assert_eq!(doc.string_value(r), "a & b <c> d");
    }

    #[test]
    fn test_whitespace_text_is_kept() {
        let doc = parse("<r>\n  <a/>\n</r>").unwrap();
        let r = doc.document_element().unwrap();
        let kinds: Vec<_> = doc.children(r).iter().map(|&c| doc.kind(c)).collect();
        assert_eq!(kinds, vec![NodeKind::Text, NodeKind::Element, NodeKind::Text]);
    }

    #[test]
    fn test_node_ids_follow_document_order() {
        let doc = parse(r#"<a x="1"><b y="2">t</b><!--c--><?pi data?></a>"#).unwrap();
        let kinds: Vec<_> = doc.node_ids().map(|id| doc.kind(id)).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Document,
                NodeKind::Element,
                NodeKind::Attribute,
                NodeKind::Element,
                NodeKind::Attribute,
                NodeKind::Text,
                NodeKind::Comment,
                NodeKind::ProcessingInstruction,
            ]
        );
        let pi = doc.node_ids().last().unwrap();
        assert_eq!(doc.name(pi).unwrap().local, "pi");
        assert_eq!(doc.node(pi).value(), "data");
    }

    #[test]
    fn test_element_lines() {
        let content = "<project>\n  <dependencies>\n    <dependency>\n      <version>1</version>\n    </dependency>\n  </dependencies>\n</project>";
        let doc = parse(content).unwrap();
        let version = element_named(&doc, "version")[0];
        assert_eq!(doc.line(version), 4);

        let project = doc.document_element().unwrap();
        assert_eq!(doc.source_info(project).start_offset(), 0);
        assert_eq!(doc.source_info(project).end_offset(), content.len());
    }

    #[test]
    fn test_carriage_return_line_endings() {
        let doc = parse("<a>\r<b/>\r\n<c/></a>").unwrap();
        assert_eq!(doc.line(element_named(&doc, "b")[0]), 2);
        assert_eq!(doc.line(element_named(&doc, "c")[0]), 3);
    }

    #[test]
    fn test_default_namespace_applies_to_elements_only() {
        let doc = parse(r#"<html xmlns="http://www.w3.org/1999/xhtml" lang="en"><br/></html>"#)
            .unwrap();
        let html = doc.document_element().unwrap();
        let br = doc.children(html)[0];

        let br_name = doc.name(br).unwrap();
        assert_eq!(br_name.prefix, None);
        assert_eq!(br_name.namespace.as_deref(), Some("http://www.w3.org/1999/xhtml"));

        let lang = doc.attributes(html)[0];
        assert_eq!(doc.name(lang).unwrap().namespace, None);
        // xmlns is a declaration, not an attribute
        assert_eq!(doc.attributes(html).len(), 1);
        assert_eq!(doc.node(html).namespace_declarations().len(), 1);
    }

    #[test]
    fn test_prefixed_names_resolve() {
        let doc = parse(
            r#"<ui:composition xmlns:ui="http://java.sun.com/jsf/facelets"><ui:define name="title" xml:lang="en"/></ui:composition>"#,
        )
        .unwrap();
        let define = element_named(&doc, "define")[0];
        let name = doc.name(define).unwrap();
        assert_eq!(name.prefix.as_deref(), Some("ui"));
        assert_eq!(name.namespace.as_deref(), Some("http://java.sun.com/jsf/facelets"));
        assert_eq!(doc.attribute_value(define, Some(XML_NAMESPACE), "lang"), Some("en"));
    }

    #[test]
    fn test_unbound_prefix_error() {
        let result = parse("<ui:define/>");
        assert!(
            matches!(&result, Err(Error::UnboundPrefix { prefix, .. }) if prefix == "ui"),
            "{result:?}"
        );
    }

    #[test]
    fn test_attribute_position_tracking() {
        //          0         1         2         3
        //          0123456789012345678901234567890123456789
        let xml = r#"<root attr="value" other='test'/>"#;
        let doc = parse(xml).unwrap();
        let root = doc.document_element().unwrap();
        let attrs = doc.attributes(root);

        assert_eq!(doc.source_info(attrs[0]).start_offset(), 6);
        assert_eq!(doc.source_info(attrs[0]).end_offset(), 18);
        assert_eq!(doc.source_info(attrs[1]).start_offset(), 19);
        assert_eq!(doc.source_info(attrs[1]).end_offset(), 31);
    }

    #[test]
    fn test_attribute_name_inside_earlier_value() {
        //          0         1         2
        //          012345678901234567890123456789
        let xml = r#"<r a="name" name="x"/>"#;
        let doc = parse(xml).unwrap();
        let root = doc.document_element().unwrap();
        let name_attr = doc.attributes(root)[1];
        assert_eq!(doc.source_info(name_attr).start_offset(), 12);
    }

    #[test]
    fn test_attribute_on_continuation_line() {
        let doc = parse("<r\n   a=\"1\"\n   b=\"2\"/>").unwrap();
        let root = doc.document_element().unwrap();
        assert_eq!(doc.line(root), 1);
        assert_eq!(doc.line(doc.attributes(root)[0]), 2);
        assert_eq!(doc.line(doc.attributes(root)[1]), 3);
    }

    #[test]
    fn test_content_before_prolog_keeps_lines() {
        let content = "garbage\n<?xml version=\"1.0\"?>\n<root>\n  <child/>\n</root>";
        let mut ctx = XmlParseContext::new();
        let doc = parse_with_context(content, &mut ctx).unwrap();

        let child = element_named(&doc, "child")[0];
        assert_eq!(doc.line(child), 4);
        assert_eq!(ctx.diagnostics().len(), 1);
        assert_eq!(ctx.diagnostics()[0].code.as_deref(), Some("X-1-7"));
        assert!(!ctx.has_errors());
    }

    #[test]
    fn test_text_outside_root_without_prolog() {
        let result = parse("garbage<root/>");
        assert!(matches!(result, Err(Error::TextOutsideRoot { .. })), "{result:?}");
    }

    #[test]
    fn test_comments_outside_root_belong_to_document() {
        let doc = parse("<!-- head --><root/><!-- tail -->").unwrap();
        let kinds: Vec<_> = doc
            .children(doc.root())
            .iter()
            .map(|&c| doc.kind(c))
            .collect();
        assert_eq!(kinds, vec![NodeKind::Comment, NodeKind::Element, NodeKind::Comment]);
    }

    #[test]
    fn test_empty_document_error() {
        assert!(matches!(parse(""), Err(Error::EmptyDocument)));
        assert!(matches!(parse("  \n "), Err(Error::EmptyDocument)));
    }

    #[test]
    fn test_mismatched_tags_error() {
        let result = parse("<html><head><link rel=\"x\"></head></html>");
        assert!(
            matches!(
                &result,
                Err(Error::MismatchedEndTag { expected, found, .. })
                    if expected == "link" && found == "head"
            ),
            "{result:?}"
        );
    }

    #[test]
    fn test_multiple_roots_error() {
        assert!(matches!(
            parse("<root/><another/>"),
            Err(Error::MultipleRoots { .. })
        ));
    }

    #[test]
    fn test_unclosed_element_error() {
        let result = parse("<root>");
        assert!(
            matches!(result, Err(Error::UnexpectedEof { .. } | Error::XmlSyntax { .. })),
            "{result:?}"
        );
    }

    #[test]
    fn test_declaration_text_in_cdata_is_not_a_prolog() {
        let content = "<root>\n<a/>\n<![CDATA[<?xml version=\"1.0\"?>]]>\n</root>";
        let mut ctx = XmlParseContext::new();
        let doc = parse_with_context(content, &mut ctx).unwrap();

        assert_eq!(doc.line(element_named(&doc, "a")[0]), 2);
        assert!(ctx.diagnostics().is_empty());
        let root = doc.document_element().unwrap();
        assert!(doc.string_value(root).contains("<?xml version"));
    }

    #[test]
    fn test_byte_order_mark_before_declaration() {
        let content = "\u{FEFF}<?xml version=\"1.0\"?>\n<root>\n  <child/>\n</root>";
        let mut ctx = XmlParseContext::new();
        let doc = parse_with_context(content, &mut ctx).unwrap();

        assert_eq!(doc.line(element_named(&doc, "child")[0]), 3);
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_invalid_names_are_syntax_errors() {
        for content in [
            "<r><1bad/></r>",
            "<r><-x/></r>",
            "<r:a:b xmlns:r='u'/>",
            "<r :a='1'/>",
            "<r a:='1'/>",
            "<r 1a='1'/>",
        ] {
            let result = parse(content);
            assert!(matches!(result, Err(Error::XmlSyntax { .. })), "{content}: {result:?}");
        }
        assert!(parse("<r _a.b-c='1'><é.x/></r>").is_ok());
    }

    #[test]
    fn test_less_than_in_attribute_value_error() {
        let result = parse("<r a='<'/>");
        assert!(matches!(result, Err(Error::XmlSyntax { .. })), "{result:?}");
        assert!(parse("<r a='&lt;'/>").is_ok());
    }

    #[test]
    fn test_cdata_end_in_text_error() {
        let result = parse("<r>]]></r>");
        assert!(matches!(result, Err(Error::XmlSyntax { .. })), "{result:?}");
        assert!(parse("<r>]] ></r>").is_ok());
    }

    #[test]
    fn test_double_hyphen_in_comment_error() {
        for content in ["<r><!-- a -- b --></r>", "<r><!-- a ---></r>"] {
            let result = parse(content);
            assert!(matches!(result, Err(Error::XmlSyntax { .. })), "{content}: {result:?}");
        }
        assert!(parse("<r><!-- a - b --></r>").is_ok());
    }

    #[test]
    fn test_deep_nesting_with_namespaces() {
        let depth = 20_000;
        let text = format!(
            "<p:a xmlns:p='urn:p'>{}{}</p:a>",
            "<b>".repeat(depth),
            "</b>".repeat(depth)
        );
        let doc = parse(&text).unwrap();
        let deepest = element_named(&doc, "b")[depth - 1];
        assert_eq!(doc.name(deepest).unwrap().namespace, None);
        assert_eq!(doc.ancestors(deepest).count(), depth + 1);
    }

    #[test]
    fn test_undeclared_entity_error() {
        let result = parse("<p>&nbsp;</p>");
        assert!(matches!(result, Err(Error::InvalidEntity { .. })), "{result:?}");
    }

    #[test]
    fn test_syntax_error_diagnostic() {
        let mut ctx = XmlParseContext::new();
        let errors = parse_with_context("<root attr=unquoted/>", &mut ctx).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].code.as_deref().is_some_and(|c| c.starts_with("X-1-")));
        assert!(ctx.has_errors());
    }

    #[test]
    fn test_mismatched_end_tag_diagnostic_snapshot() {
        let mut ctx = XmlParseContext::new();
        let errors = parse_with_context("<a>\n<b>\n</a>", &mut ctx).unwrap_err();
        insta::assert_snapshot!(errors[0].to_text(None), @r"
        Error [X-1-3]: Mismatched XML End Tag at 3:1
        End tag </a> does not match start tag <b>
        ✖ Expected: </b>
        ✖ Found: </a>
        ? Check that all opening tags have matching closing tags?
        ");
    }

    #[test]
    fn test_file_id_is_recorded() {
        let doc = parse_with_file_id("<r/>", FileId(7)).unwrap();
        let root = doc.document_element().unwrap();
        assert_eq!(doc.source_info(root).file_id, FileId(7));
    }
}
