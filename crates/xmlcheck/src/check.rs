//! The check interface.

use crate::document::SourceDocument;
use crate::error::Result;
use crate::issue::Issue;

/// A check over one parsed document.
///
/// Checks are built once and run against many documents, possibly from
/// several threads.
pub trait Check: Send + Sync {
    /// Stable identifier used to tag this check's issues.
    fn key(&self) -> &str;

    /// Issues found in `doc`, in document order.
    fn check(&self, doc: &SourceDocument) -> Result<Vec<Issue>>;
}

/// Parse `text` and run `check` over it.
///
/// Text that is not well-formed XML yields no issues.
///
/// # Example
///
/// ```rust
/// use xmlcheck::{run_check, XPathCheck};
///
/// let check = XPathCheck::new("//br").unwrap();
/// let issues = run_check(&check, "<p>one<br/>two</p>").unwrap();
/// assert_eq!(issues.len(), 1);
///
/// assert!(run_check(&check, "<p><br></p").unwrap().is_empty());
/// ```
pub fn run_check(check: &dyn Check, text: &str) -> Result<Vec<Issue>> {
    match SourceDocument::parse(text) {
        Ok(doc) => check.check(&doc),
        Err(outcome) => {
            tracing::debug!(check = check.key(), reason = %outcome, "Skipping invalid document");
            Ok(Vec::new())
        }
    }
}
