use std::path::Path;

use serde::Serialize;

use crate::index::Entry;
use crate::position::Span;
use crate::project::Project;

use self::abbrev_completer::AbbrevCompleter;
use self::command_completer::CommandCompleter;
use self::reference_completer::{CiteCompleter, RefCompleter};

mod abbrev_completer;
mod command_completer;
mod reference_completer;
mod util;

#[derive(Clone, Copy)]
pub struct Context<'a> {
    project: &'a Project,
    path: &'a Path,
    text: &'a str,
    offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    Ref,
    Cite,
    Command,
    Abbrev,
}

pub trait Completer<'a>: Sized {
    /// Recognizes the completion context at the cursor.
    fn construct(context: Context<'a>) -> Option<Self>;

    fn completions(&self) -> Vec<&'a Entry>;

    /// The region the chosen entry's key replaces.
    fn replace(&self) -> Span;

    fn kind(&self) -> CompletionKind;
}

/// The outcome of a completion request: what kind of key is being typed,
/// the typed prefix and the entries that extend it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completions<'a> {
    pub kind: CompletionKind,
    pub replace: Span,
    pub prefix: String,
    pub entries: Vec<&'a Entry>,
}

/// Completes the key at `offset` in `text`, the current contents of
/// `path`. Returns `None` when the cursor is not in a completable
/// position; a recognized position with no matches gives empty entries.
pub fn get_completions<'a>(
    project: &'a Project,
    path: &'a Path,
    text: &'a str,
    offset: usize,
) -> Option<Completions<'a>> {
    let context = Context {
        project,
        path,
        text,
        offset,
    };

    run_completer::<RefCompleter>(context)
        .or_else(|| run_completer::<CiteCompleter>(context))
        .or_else(|| run_completer::<CommandCompleter>(context))
        .or_else(|| run_completer::<AbbrevCompleter>(context))
}

fn run_completer<'a, T: Completer<'a>>(context: Context<'a>) -> Option<Completions<'a>> {
    let completer = T::construct(context)?;
    let replace = completer.replace();
    Some(Completions {
        kind: completer.kind(),
        replace,
        prefix: context.text[replace.offset..replace.end()].to_string(),
        entries: completer.completions(),
    })
}
