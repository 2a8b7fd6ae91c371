//! Line-attributed XPath checks over XML sources.
//!
//! A check evaluates one XPath 1.0 expression against a parsed document and
//! reports an [`Issue`] for each match, at the physical line where the
//! matched node starts. Lines stay exact even when the text has stray
//! characters before its `<?xml` declaration.
//!
//! - [`SourceDocument`]: a well-formed document, or a [`ParseOutcome`]
//!   saying why the text could not be checked
//! - [`XPathCheck`]: compiles an expression from an [`XPathCheckConfig`] and
//!   projects results to issues
//! - [`Check`] / [`run_check`]: the check interface; invalid documents give
//!   no issues
//! - [`CheckSuite`]: several checks over one parse
//!
//! # Example
//!
//! ```rust
//! use xmlcheck::{run_check, XPathCheck, XPathCheckConfig};
//!
//! let config = XPathCheckConfig::new("//ui:define[@name='title']")
//!     .with_namespace("ui", "http://java.sun.com/jsf/facelets");
//! let check = XPathCheck::from_config(config).unwrap();
//!
//! let page = r#"<html xmlns:ui="http://java.sun.com/jsf/facelets">
//!   <ui:define name="title">Orders</ui:define>
//! </html>"#;
//! let issues = run_check(&check, page).unwrap();
//! assert_eq!(issues.len(), 1);
//! assert_eq!(issues[0].line(), 2);
//! ```

pub mod check;
pub mod config;
pub mod document;
pub mod error;
pub mod issue;
pub mod result;
pub mod suite;
pub mod xpath_check;

pub use check::{Check, run_check};
pub use config::{DEFAULT_MESSAGE, XPathCheckConfig};
pub use document::{ParseOutcome, SourceDocument};
pub use error::{CheckError, Result};
pub use issue::Issue;
pub use result::{Scalar, XPathResult};
pub use suite::{CheckReport, CheckSuite, SuiteConfig, TaggedIssue};
pub use xpath_check::{XPathCheck, project};
pub use xmlcheck_xpath::{NamespaceBindings, XPathCache};
