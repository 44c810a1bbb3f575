use once_cell::sync::Lazy;
use regex::Regex;

use crate::index::Entry;
use crate::position::Span;

use super::util::line_before;
use super::{CompletionKind, Completer, Context};

/// A field value position: after `=` or a `#` concatenation, before any
/// quote or brace is opened.
static VALUE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[=#]\s*(?<name>[^\s"{}#,=()]*)$"#).unwrap());

/// Completes `@string` names in BibTeX field values.
pub struct AbbrevCompleter<'a> {
    name: Span,
    context: Context<'a>,
}

impl<'a> Completer<'a> for AbbrevCompleter<'a> {
    fn construct(context: Context<'a>) -> Option<Self> {
        if context.path.extension().and_then(|e| e.to_str()) != Some("bib") {
            return None;
        }
        let (line_start, before) = line_before(&context)?;
        let name = VALUE_PATTERN.captures(before)?.name("name")?;
        // numbers are literal values
        if name.as_str().starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        Some(AbbrevCompleter {
            name: Span::new(line_start + name.start(), name.len()),
            context,
        })
    }

    fn completions(&self) -> Vec<&'a Entry> {
        let prefix = &self.context.text[self.name.offset..self.name.end()];
        self.context
            .project
            .abbrevs()
            .get_completions(prefix)
            .map(|entries| entries.iter().collect())
            .unwrap_or_default()
    }

    fn replace(&self) -> Span {
        self.name
    }

    fn kind(&self) -> CompletionKind {
        CompletionKind::Abbrev
    }
}
