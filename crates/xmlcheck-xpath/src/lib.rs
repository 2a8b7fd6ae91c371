//! XPath 1.0 over line-mapped XML documents.
//!
//! Expressions go through three stages:
//!
//! 1. [`parser::parse`] turns text into an [`ast::Expr`]
//! 2. [`compile`] resolves namespace prefixes against [`NamespaceBindings`]
//!    and checks function names and argument counts, giving a
//!    [`CompiledXPath`]
//! 3. [`CompiledXPath::evaluate`] runs it against an
//!    [`xmlcheck_xml::XmlDocument`], giving an [`XPathValue`]
//!
//! Only type errors (for example `count('x')`) can happen during evaluation.
//! The full core function library and all thirteen axes are supported; the
//! namespace axis is always empty since namespace nodes are not
//! materialized.
//!
//! [`XPathCache`] shares compiled expressions between checks.

pub mod ast;
mod cache;
mod compile;
pub mod error;
mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

pub use cache::XPathCache;
pub use compile::{CompiledXPath, NamespaceBindings, compile};
pub use error::{Result, XPathError};
pub use functions::Function;
pub use value::{XPathValue, format_xpath_number, parse_xpath_number, xpath_round};
