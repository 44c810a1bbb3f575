//! Hover information for references in LaTeX documents.
//!
//! | Target | Shows |
//! |--------|-------|
//! | `\ref{label}` argument | Source lines around the label |
//! | `\cite{key}` argument | Type and fields of the BibTeX record |
//! | Command name | User definition or built-in documentation |

use serde::Serialize;

use crate::gotodef::key_at;
use crate::index::Entry;
use crate::latex::{is_cite_command, is_ref_command};
use crate::latex_utils::{command_argument, command_at};
use crate::position::Span;
use crate::project::Project;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hover<'a> {
    /// The hovered key or command name.
    pub span: Span,
    pub entry: &'a Entry,
}

impl Hover<'_> {
    pub fn info(&self) -> &str {
        &self.entry.info
    }
}

/// The entry named at `offset`, if it is known to the project.
pub fn hover<'a>(project: &'a Project, text: &str, offset: usize) -> Option<Hover<'a>> {
    let command = command_at(text, offset)?;
    let name = &text[command.offset + 1..command.end()];
    let manager = project.manager();

    if offset < command.end() {
        return manager.command(name).map(|entry| Hover {
            span: command,
            entry,
        });
    }

    let argument = command_argument(text, command.offset)?;
    let span = key_at(text, argument, offset)?;
    let key = &text[span.offset..span.end()];
    let entry = if is_ref_command(name) {
        manager.label(key)
    } else if is_cite_command(name) {
        manager.bib(key)
    } else {
        None
    }?;
    Some(Hover { span, entry })
}
