//! Recovery for content written before the XML declaration.

use xmlcheck_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use xmlcheck_source_map::SourceInfo;

const BOM: char = '\u{FEFF}';

/// Text with the junk before `<?xml` blanked out.
pub(crate) struct PrologRecovery {
    /// Same length and newline positions as the input.
    pub(crate) text: String,
    /// End of the blanked byte range, which starts at offset 0.
    pub(crate) blanked: usize,
    /// The characters that were blanked, trimmed. A byte order mark alone
    /// leaves this empty.
    pub(crate) junk: String,
}

/// Blank a leading byte order mark and every non-newline byte before the
/// XML declaration, when that span holds anything other than whitespace.
///
/// The declaration only counts when it is the first markup in the text, so
/// `<?xml` inside a comment or CDATA section is never taken for one.
///
/// Returns `None` when there is nothing to recover.
pub(crate) fn recover(content: &str) -> Option<PrologRecovery> {
    let bom = if content.starts_with(BOM) { BOM.len_utf8() } else { 0 };
    let junk = find_declaration(content, bom)
        .map(|offset| (offset, content[bom..offset].trim()))
        .filter(|(_, junk)| !junk.is_empty());

    let blanked = match junk {
        Some((offset, _)) => offset,
        None if bom > 0 => bom,
        None => return None,
    };

    let mut bytes = content.as_bytes().to_vec();
    for b in &mut bytes[..blanked] {
        if *b != b'\n' {
            *b = b' ';
        }
    }

    Some(PrologRecovery {
        text: String::from_utf8(bytes).ok()?,
        blanked,
        junk: junk.map(|(_, junk)| junk.to_string()).unwrap_or_default(),
    })
}

fn find_declaration(content: &str, from: usize) -> Option<usize> {
    let idx = from + content[from..].find('<')?;
    let rest = content[idx..].strip_prefix("<?xml")?;
    rest.chars()
        .next()
        .is_some_and(|c| c.is_ascii_whitespace() || c == '?')
        .then_some(idx)
}

impl PrologRecovery {
    pub(crate) fn to_diagnostic(&self, location: SourceInfo) -> DiagnosticMessage {
        let shown: String = self.junk.chars().take(40).collect();
        DiagnosticMessageBuilder::warning("Content Before Prolog")
            .with_code("X-1-7")
            .problem("Characters before the XML declaration were ignored")
            .add_detail(format!("Found `{}`", shown))
            .add_note("Line numbers still refer to the original text")
            .with_location(location)
            .build()
    }
}
