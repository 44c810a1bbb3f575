//! Reference and abbreviation indexes.
//!
//! Every parser produces flat lists of [`Entry`] values. The containers in
//! this module keep them per source file, merge them into one sorted vector
//! and answer prefix and exact-key queries with binary search.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::position::{LineIndex, Span};

mod commands;
mod container;
mod manager;
mod sorted;

pub use commands::{builtin_commands, BuiltinCommand};
pub use container::ReferenceContainer;
pub use manager::{AbbrevManager, ReferenceManager};
pub use sorted::{completion_bounds, CaseMode, SortedIndex};

/// What an [`Entry`] stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryKind {
    /// A BibTeX record such as `@article{key, ...}`; `entry_type` is
    /// lowercase.
    BibRecord { entry_type: String },
    /// A `\label{key}` in a TeX file.
    Label,
    /// One key of a `\cite{a,b}` in a TeX file.
    Citation,
    /// A user command defined with `\newcommand` and friends.
    Command { arguments: usize },
    /// A BibTeX `@string` abbreviation.
    Abbreviation,
}

impl Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::BibRecord { entry_type } => write!(f, "@{}", entry_type),
            EntryKind::Label => write!(f, "label"),
            EntryKind::Citation => write!(f, "citation"),
            EntryKind::Command { arguments } => write!(f, "command/{}", arguments),
            EntryKind::Abbreviation => write!(f, "abbreviation"),
        }
    }
}

/// One piece of a BibTeX field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValuePart {
    /// Text of a quoted or braced literal, without its delimiters.
    Literal(String),
    Number(String),
    /// An `@string` name, resolved only when the value is read.
    Abbrev(String),
}

/// A field value as written in the source.
///
/// `text` is the display form: the inner text for a single literal, the
/// normalized source (`jan # " 1"`) for a concatenation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldValue {
    pub text: String,
    pub parts: Vec<ValuePart>,
}

impl FieldValue {
    pub fn literal(text: &str) -> FieldValue {
        FieldValue {
            text: text.to_string(),
            parts: vec![ValuePart::Literal(text.to_string())],
        }
    }

    /// Expands abbreviations with `lookup`; unknown names fall back to the
    /// standard month names and then to the name itself.
    pub fn resolve(&self, mut lookup: impl FnMut(&str) -> Option<String>) -> String {
        self.parts
            .iter()
            .map(|part| match part {
                ValuePart::Literal(text) | ValuePart::Number(text) => text.clone(),
                ValuePart::Abbrev(name) => lookup(name)
                    .or_else(|| month_name(name).map(str::to_string))
                    .unwrap_or_else(|| name.clone()),
            })
            .collect()
    }
}

const MONTHS: [(&str, &str); 12] = [
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// BibTeX's predefined month abbreviations.
pub fn month_name(abbrev: &str) -> Option<&'static str> {
    let abbrev = abbrev.to_ascii_lowercase();
    MONTHS
        .iter()
        .find(|(short, _)| *short == abbrev)
        .map(|(_, long)| *long)
}

/// A label, citation, command, abbreviation or BibTeX record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub kind: EntryKind,
    /// Root-relative path of the defining file, set by the container.
    pub file_name: Option<String>,
    /// 1-based.
    pub start_line: usize,
    /// 1-based, the line of the closing delimiter for records.
    pub end_line: usize,
    /// Byte column of the key on `start_line`; 0 for records.
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Span>,
    pub info: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Entry {
    pub fn new(key: impl Into<String>, kind: EntryKind, line: usize) -> Entry {
        Entry {
            key: key.into(),
            kind,
            file_name: None,
            start_line: line,
            end_line: line,
            column: 0,
            position: None,
            info: String::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Display text of field `name` (lowercase).
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|value| value.text.as_str())
    }

    pub fn entry_type(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::BibRecord { entry_type } => Some(entry_type),
            _ => None,
        }
    }

    /// Computes and caches the byte span of this entry in a document.
    ///
    /// Records cover their whole line range; keyed references cover the key
    /// itself. Returns `None` if the lines are not in `lines`.
    pub fn resolve_position(&mut self, lines: &LineIndex) -> Option<Span> {
        let start = lines.line_start(self.start_line.checked_sub(1)?)?;
        let span = match self.kind {
            EntryKind::BibRecord { .. } | EntryKind::Abbreviation => {
                let end = lines
                    .line_start(self.end_line)
                    .unwrap_or_else(|| lines.len());
                Span::new(start, end.max(start) - start)
            }
            _ => Span::new(start + self.column, self.key.len()),
        };
        self.position = Some(span);
        Some(span)
    }
}

/// Renders a record the way it is shown as completion or hover info:
/// the type on the first line, then one `field: value` line per field.
pub fn record_info<'a>(
    entry_type: &str,
    fields: impl IntoIterator<Item = (&'a str, &'a FieldValue)>,
) -> String {
    let mut info = entry_type.to_string();
    for (name, value) in fields {
        info.push('\n');
        info.push_str(name);
        info.push_str(": ");
        info.push_str(&value.text);
    }
    info
}
