//! Completion of `\ref`-like label arguments and `\cite`-like key lists.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::index::Entry;
use crate::latex::{is_cite_command, is_ref_command};
use crate::position::Span;

use super::util::{check_in_comment, last_key, line_before};
use super::{CompletionKind, Completer, Context};

/// A command name, optional star and `[...]` arguments, then an open brace
/// whose argument runs up to the cursor.
static ARGUMENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?<command>[a-zA-Z]+)\*?(?:\s*\[[^\]]*\])*\s*\{(?<arg>[^{}]*)$").unwrap()
});

/// The key being typed inside the first argument of a command.
struct ArgumentContext<'a> {
    command: &'a str,
    key: Span,
    prefix: &'a str,
}

fn argument_context<'a>(context: &Context<'a>) -> Option<ArgumentContext<'a>> {
    if check_in_comment(context) {
        return None;
    }
    let (line_start, before) = line_before(context)?;
    let captures = ARGUMENT_PATTERN.captures(before)?;
    let command = captures.name("command")?;
    let arg = captures.name("arg")?;
    let (key, prefix) = last_key(arg.as_str(), line_start + arg.start());
    Some(ArgumentContext {
        command: command.as_str(),
        key,
        prefix,
    })
}

pub struct RefCompleter<'a> {
    argument: ArgumentContext<'a>,
    context: Context<'a>,
}

impl<'a> Completer<'a> for RefCompleter<'a> {
    fn construct(context: Context<'a>) -> Option<Self> {
        let argument = argument_context(&context)?;
        is_ref_command(argument.command).then_some(RefCompleter { argument, context })
    }

    fn completions(&self) -> Vec<&'a Entry> {
        self.context
            .project
            .manager()
            .completions_ref(self.argument.prefix)
            .map(|entries| entries.iter().collect())
            .unwrap_or_default()
    }

    fn replace(&self) -> Span {
        self.argument.key
    }

    fn kind(&self) -> CompletionKind {
        CompletionKind::Ref
    }
}

pub struct CiteCompleter<'a> {
    argument: ArgumentContext<'a>,
    context: Context<'a>,
}

impl<'a> Completer<'a> for CiteCompleter<'a> {
    fn construct(context: Context<'a>) -> Option<Self> {
        let argument = argument_context(&context)?;
        is_cite_command(argument.command).then_some(CiteCompleter { argument, context })
    }

    fn completions(&self) -> Vec<&'a Entry> {
        self.context
            .project
            .manager()
            .completions_bib(self.argument.prefix)
            .map(|entries| entries.iter().collect())
            .unwrap_or_default()
    }

    fn replace(&self) -> Span {
        self.argument.key
    }

    fn kind(&self) -> CompletionKind {
        CompletionKind::Cite
    }
}
