//! Error reporting and diagnostic messages for xmlcheck.
//!
//! Errors from every layer (XML parsing, XPath compilation, check
//! configuration) convert to a [`DiagnosticMessage`], which follows the
//! tidyverse style:
//! - a short title and a catalogued error code
//! - a problem statement
//! - bulleted details (✖ error, ℹ info, • note)
//! - hints
//!
//! Messages render to plain text, to an ariadne source snippet when the
//! source is registered in a [`xmlcheck_source_map::SourceContext`], or to
//! JSON.
//!
//! # Example
//!
//! ```
//! use xmlcheck_error_reporting::DiagnosticMessageBuilder;
//!
//! let error = DiagnosticMessageBuilder::error("Mismatched end tag")
//!     .with_code("X-1-3")
//!     .problem("Expected `</dependency>`, found `</dependencies>`")
//!     .add_hint("Is an element left open?")
//!     .build();
//!
//! assert!(error.to_text(None).contains("[X-1-3]"));
//! ```

pub mod builder;
pub mod catalog;
pub mod diagnostic;

pub use builder::DiagnosticMessageBuilder;
pub use catalog::{ERROR_CATALOG, ErrorCodeInfo, get_error_info, get_subsystem};
pub use diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};
