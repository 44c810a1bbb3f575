use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::index::Entry;
use crate::latex::{is_cite_command, is_ref_command, split_keys};
use crate::latex_utils::{command_argument, command_at};
use crate::position::Span;
use crate::project::{resolve_target, with_extension, Project};

/// Where a declaration lives: a file and a 1-based line, with a byte
/// column on that line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub path: PathBuf,
    pub line: usize,
    pub column: usize,
}

/// Why a declaration could not be opened; the message is meant for a
/// status line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("No command found at the cursor")]
    NoCommandFound,
    #[error("No argument found for the command")]
    NoArgumentFound,
    #[error("No declaration found")]
    NoDeclarationFound,
    #[error("File {0} not found")]
    FileNotFound(String),
}

/// Finds the declaration of whatever the command at `offset` names.
///
/// On a command name a user definition of that command wins. Otherwise
/// `*ref*` arguments go to their label, `*cite*` arguments to the record
/// under the cursor, and file arguments to the file.
pub fn goto_declaration(
    project: &Project,
    path: &Path,
    text: &str,
    offset: usize,
) -> Result<Declaration, NavigationError> {
    let command = command_at(text, offset).ok_or(NavigationError::NoCommandFound)?;
    let name = &text[command.offset + 1..command.end()];
    let manager = project.manager();

    if offset < command.end() && manager.is_user_command(name) {
        return manager
            .command(name)
            .and_then(|entry| entry_declaration(project, entry, 0))
            .ok_or(NavigationError::NoDeclarationFound);
    }

    let file_extension = match name {
        "input" | "include" => Some("tex"),
        "bibliography" | "addbibresource" => Some("bib"),
        _ => None,
    };
    if file_extension.is_none() && !is_ref_command(name) && !is_cite_command(name) {
        return Err(NavigationError::NoDeclarationFound);
    }

    let argument =
        command_argument(text, command.offset).ok_or(NavigationError::NoArgumentFound)?;
    let key = key_at(text, argument, offset).ok_or(NavigationError::NoArgumentFound)?;
    let key = &text[key.offset..key.end()];

    if let Some(ext) = file_extension {
        let exists = |p: &Path| p.is_file() || project.document(p).is_some();
        return resolve_target(project.root_dir(), path, key, ext, exists)
            .map(|path| Declaration {
                path,
                line: 1,
                column: 0,
            })
            .ok_or_else(|| NavigationError::FileNotFound(with_extension(key, ext)));
    }

    let declaration = if is_ref_command(name) {
        manager
            .label(key)
            .and_then(|entry| entry_declaration(project, entry, entry.column))
    } else {
        manager
            .bib(key)
            .and_then(|entry| entry_declaration(project, entry, 0))
    };
    declaration.ok_or(NavigationError::NoDeclarationFound)
}

/// The key of a comma-separated argument the cursor is on. A cursor on a
/// separator belongs to the key before it; outside the argument the first
/// key is used.
pub(crate) fn key_at(text: &str, argument: Span, offset: usize) -> Option<Span> {
    let keys = split_keys(text, argument);
    if !argument.contains(offset) {
        return keys.first().copied();
    }
    keys.iter()
        .rev()
        .find(|key| key.offset <= offset)
        .or_else(|| keys.first())
        .copied()
}

fn entry_declaration(project: &Project, entry: &Entry, column: usize) -> Option<Declaration> {
    let file_name = entry.file_name.as_deref()?;
    Some(Declaration {
        path: project.path_of(file_name),
        line: entry.start_line,
        column,
    })
}
