use once_cell::sync::Lazy;
use regex::Regex;

use crate::index::Entry;
use crate::latex_utils::is_escaped;
use crate::position::Span;

use super::util::{check_in_comment, line_before};
use super::{CompletionKind, Completer, Context};

static COMMAND_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\(?<name>[a-zA-Z]*)$").unwrap());

/// Completes built-in and user command names after a backslash.
pub struct CommandCompleter<'a> {
    name: Span,
    context: Context<'a>,
}

impl<'a> Completer<'a> for CommandCompleter<'a> {
    fn construct(context: Context<'a>) -> Option<Self> {
        if check_in_comment(&context) {
            return None;
        }
        let (line_start, before) = line_before(&context)?;
        let captures = COMMAND_PATTERN.captures(before)?;
        let backslash = line_start + captures.get(0)?.start();
        if is_escaped(context.text, backslash) {
            return None;
        }
        let name = captures.name("name")?;
        Some(CommandCompleter {
            name: Span::new(line_start + name.start(), name.len()),
            context,
        })
    }

    fn completions(&self) -> Vec<&'a Entry> {
        let prefix = &self.context.text[self.name.offset..self.name.end()];
        self.context
            .project
            .manager()
            .completions_command(prefix)
            .unwrap_or_default()
    }

    fn replace(&self) -> Span {
        self.name
    }

    fn kind(&self) -> CompletionKind {
        CompletionKind::Command
    }
}
