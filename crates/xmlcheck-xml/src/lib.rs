//! Line-mapped XML parsing for xmlcheck.
//!
//! This crate wraps [`quick-xml`] to build an [`XmlDocument`]: an arena of
//! nodes (document, element, attribute, text, comment, processing
//! instruction) where every node records the source range it came from.
//! Lines are physical lines of the input text, including when the input has
//! stray characters before its `<?xml` declaration.
//!
//! # Overview
//!
//! - [`parse`] / [`parse_with_context`]: build a document or report why the
//!   input is not well-formed
//! - [`XmlDocument`]: navigation, string-values and namespace scope
//! - [`NodeId`]: node handle whose ordering is document order
//!
//! # Example
//!
//! ```rust
//! use xmlcheck_xml::{parse, NodeKind};
//!
//! let doc = parse(r#"<pom xmlns="urn:maven">
//!   <version>1.0</version>
//! </pom>"#).unwrap();
//!
//! let version = doc
//!     .node_ids()
//!     .find(|&id| doc.name(id).is_some_and(|n| n.local == "version"))
//!     .unwrap();
//! assert_eq!(doc.kind(version), NodeKind::Element);
//! assert_eq!(doc.line(version), 2);
//! assert_eq!(doc.string_value(version), "1.0");
//! ```

pub mod context;
pub mod error;
pub mod parser;
mod prolog;
pub mod types;

// Re-export main types
pub use context::XmlParseContext;
pub use error::{Error, ParseResult, Result};
pub use parser::{parse, parse_with_context, parse_with_context_and_file_id, parse_with_file_id};
pub use types::{NamespaceDecl, Node, NodeId, NodeKind, QName, XML_NAMESPACE, XmlDocument};
pub use xmlcheck_source_map::SourceInfo;
