//! Extraction of labels, citations, commands and file references from
//! LaTeX sources.
//!
//! This is not a LaTeX parser: it walks the command tokens of a buffer and
//! reads the arguments of the handful of commands the document model cares
//! about. Everything else, including text in comments, is skipped.

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::index::{Entry, EntryKind};
use crate::latex_utils::find_peer_char;
use crate::position::{LineIndex, Span};
use crate::scanner::{match_command, Dialect, Scanner, Side, TokenKind};

mod wordcount;

pub use wordcount::count_words;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Ref,
    Cite,
}

/// One key used by a `\ref`- or `\cite`-like command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    pub key: String,
    /// 1-based.
    pub line: usize,
    pub column: usize,
    pub length: usize,
    pub kind: ReferenceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeKind {
    Input,
    Include,
}

/// An `\input` or `\include` target as written, without extension added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeTarget {
    pub kind: IncludeKind,
    pub target: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TexParseResult {
    pub labels: Vec<Entry>,
    pub citations: Vec<Entry>,
    pub references: Vec<DocumentReference>,
    pub commands: Vec<Entry>,
    /// `\bibliography` and `\addbibresource` arguments, in order.
    pub bibliography: Vec<String>,
    pub bib_style: Option<String>,
    pub biblatex: bool,
    pub biblatex_backend: Option<String>,
    pub includes: Vec<IncludeTarget>,
    /// Set by `\makeindex` or `\printindex`.
    pub index: bool,
}

/// Commands like `\ref`, `\eqref`, `\cref` and `\pageref`.
pub fn is_ref_command(name: &str) -> bool {
    name != "href" && (name.ends_with("ref") || name.ends_with("Ref"))
}

/// Commands like `\cite`, `\nocite`, `\parencite` and `\citeauthor`.
pub fn is_cite_command(name: &str) -> bool {
    name.to_ascii_lowercase().contains("cite")
}

pub fn parse(text: &str, settings: &Settings) -> TexParseResult {
    let mut extractor = Extractor {
        text,
        lines: LineIndex::new(text),
        context_lines: settings.label_context_lines,
        result: TexParseResult::default(),
    };

    let mut scanner = Scanner::new(text, Dialect::Latex);
    while let Some(token) = scanner.next() {
        if token.kind != TokenKind::Command {
            continue;
        }
        let name = &text[token.span.offset + 1..token.span.end()];
        if let Some(end) = extractor.command(name, token.span.end()) {
            scanner.seek(end);
        }
    }
    extractor.result
}

/// Arguments read after a command name.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Arguments {
    pub optional: Vec<Span>,
    /// Inner regions of the `{...}` arguments.
    pub required: Vec<Span>,
    /// Offset just past the last argument read.
    pub end: usize,
}

/// Reads a star, `[...]` and `{...}` arguments starting at `pos` until
/// `max_required` brace groups are read or something else follows.
pub(crate) fn read_arguments(text: &str, pos: usize, max_required: usize) -> Arguments {
    let bytes = text.as_bytes();
    let mut pos = pos;
    if bytes.get(pos) == Some(&b'*') {
        pos += 1;
    }
    let mut args = Arguments {
        end: pos,
        ..Arguments::default()
    };
    while args.required.len() < max_required {
        let mut p = pos;
        while bytes.get(p).is_some_and(u8::is_ascii_whitespace) {
            p += 1;
        }
        let (open, close) = match bytes.get(p) {
            Some(b'[') => (b'[', b']'),
            Some(b'{') => (b'{', b'}'),
            _ => break,
        };
        let Some(close_at) = find_peer_char(text, p, Side::Right, open, close) else {
            break;
        };
        let inner = Span::new(p + 1, close_at - p - 1);
        if open == b'[' {
            args.optional.push(inner);
        } else {
            args.required.push(inner);
        }
        pos = close_at + 1;
        args.end = pos;
    }
    args
}

/// The non-empty, trimmed pieces of a comma-separated argument.
pub(crate) fn split_keys(text: &str, arg: Span) -> Vec<Span> {
    let inner = &text[arg.offset..arg.end()];
    let mut keys = Vec::new();
    let mut start = 0;
    for piece in inner.split(',') {
        let trimmed = piece.trim_start();
        let offset = start + (piece.len() - trimmed.len());
        let trimmed = trimmed.trim_end();
        if !trimmed.is_empty() {
            keys.push(Span::new(arg.offset + offset, trimmed.len()));
        }
        start += piece.len() + 1;
    }
    keys
}

fn trim_span(text: &str, span: Span) -> Span {
    let inner = &text[span.offset..span.end()];
    let start = inner.len() - inner.trim_start().len();
    Span::new(span.offset + start, inner.trim().len())
}

fn trimmed(text: &str, span: Span) -> &str {
    text[span.offset..span.end()].trim()
}

fn biblatex_backend(options: &str) -> Option<String> {
    options
        .split(',')
        .filter_map(|option| option.split_once('='))
        .find(|(name, _)| name.trim() == "backend")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

struct Extractor<'a> {
    text: &'a str,
    lines: LineIndex,
    context_lines: usize,
    result: TexParseResult,
}

impl Extractor<'_> {
    /// Handles one command; returns the offset scanning continues at if
    /// arguments were consumed.
    fn command(&mut self, name: &str, after: usize) -> Option<usize> {
        match name {
            "label" => {
                let args = read_arguments(self.text, after, 1);
                let key = trim_span(self.text, *args.required.first()?);
                if key.length > 0 {
                    self.label(key);
                }
                Some(args.end)
            }
            "newcommand" | "renewcommand" | "providecommand" | "DeclareRobustCommand" => {
                self.new_command(after)
            }
            "def" => self.def(after),
            "bibliography" | "addbibresource" => {
                let args = read_arguments(self.text, after, 1);
                let arg = *args.required.first()?;
                for file in split_keys(self.text, arg) {
                    let file = self.slice(file).to_string();
                    self.result.bibliography.push(file);
                }
                Some(args.end)
            }
            "bibliographystyle" => {
                let args = read_arguments(self.text, after, 1);
                let arg = *args.required.first()?;
                self.result.bib_style = Some(trimmed(self.text, arg).to_string());
                Some(args.end)
            }
            "usepackage" | "RequirePackage" => {
                let args = read_arguments(self.text, after, 1);
                let arg = *args.required.first()?;
                let packages = split_keys(self.text, arg);
                if packages.iter().any(|p| self.slice(*p) == "biblatex") {
                    self.result.biblatex = true;
                    self.result.biblatex_backend = args
                        .optional
                        .iter()
                        .find_map(|options| biblatex_backend(self.slice(*options)));
                }
                Some(args.end)
            }
            "input" | "include" => {
                let args = read_arguments(self.text, after, 1);
                let arg = *args.required.first()?;
                let target = trimmed(self.text, arg);
                if !target.is_empty() {
                    self.result.includes.push(IncludeTarget {
                        kind: if name == "input" {
                            IncludeKind::Input
                        } else {
                            IncludeKind::Include
                        },
                        target: target.to_string(),
                        line: self.line_of(arg.offset),
                    });
                }
                Some(args.end)
            }
            "makeindex" | "printindex" => {
                self.result.index = true;
                None
            }
            _ if is_cite_command(name) => {
                let args = read_arguments(self.text, after, 1);
                let arg = *args.required.first()?;
                for key in split_keys(self.text, arg) {
                    self.citation(key);
                }
                Some(args.end)
            }
            _ if is_ref_command(name) => {
                let args = read_arguments(self.text, after, 1);
                let arg = *args.required.first()?;
                for key in split_keys(self.text, arg) {
                    let reference = self.reference(key, ReferenceKind::Ref);
                    self.result.references.push(reference);
                }
                Some(args.end)
            }
            _ => None,
        }
    }

    fn slice(&self, span: Span) -> &str {
        &self.text[span.offset..span.end()]
    }

    fn line_of(&self, offset: usize) -> usize {
        self.lines.line_of_offset(offset) + 1
    }

    fn column_of(&self, offset: usize) -> usize {
        let line = self.lines.line_of_offset(offset);
        offset - self.lines.line_start(line).unwrap_or(0)
    }

    fn keyed_entry(&self, key: Span, kind: EntryKind) -> Entry {
        let mut entry = Entry::new(self.slice(key), kind, self.line_of(key.offset));
        entry.column = self.column_of(key.offset);
        entry.position = Some(key);
        entry
    }

    fn reference(&self, key: Span, kind: ReferenceKind) -> DocumentReference {
        DocumentReference {
            key: self.slice(key).to_string(),
            line: self.line_of(key.offset),
            column: self.column_of(key.offset),
            length: key.length,
            kind,
        }
    }

    fn label(&mut self, key: Span) {
        let mut entry = self.keyed_entry(key, EntryKind::Label);
        entry.info = self.context(self.lines.line_of_offset(key.offset));
        self.result.labels.push(entry);
    }

    fn citation(&mut self, key: Span) {
        // \nocite{*} pulls in the whole database
        if self.slice(key) == "*" {
            return;
        }
        let entry = self.keyed_entry(key, EntryKind::Citation);
        self.result.citations.push(entry);
        let reference = self.reference(key, ReferenceKind::Cite);
        self.result.references.push(reference);
    }

    /// The source lines around `line` (0-based), shown as label info.
    fn context(&self, line: usize) -> String {
        let first = line.saturating_sub(self.context_lines);
        let last = (line + self.context_lines).min(self.lines.line_count().saturating_sub(1));
        (first..=last)
            .filter_map(|l| {
                let start = self.lines.line_start(l)?;
                let end = self.lines.line_end(self.text, l)?;
                Some(&self.text[start..end])
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `\newcommand{\name}[n][default]{definition}`, braces around the name
    /// optional.
    fn new_command(&mut self, after: usize) -> Option<usize> {
        let bytes = self.text.as_bytes();
        let mut pos = after;
        if bytes.get(pos) == Some(&b'*') {
            pos += 1;
        }
        while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
            pos += 1;
        }
        let (name, name_offset, after_name) = match bytes.get(pos) {
            Some(b'{') => {
                let close = find_peer_char(self.text, pos, Side::Right, b'{', b'}')?;
                let inner = Span::new(pos + 1, close - pos - 1);
                let raw = self.slice(inner);
                let name = raw.trim().trim_start_matches('\\');
                let offset = inner.offset + raw.find(name).unwrap_or(0);
                (name, offset, close + 1)
            }
            Some(b'\\') => {
                let span = match_command(self.text, pos)?;
                (&self.text[span.offset + 1..span.end()], span.offset + 1, span.end())
            }
            _ => return None,
        };
        if name.is_empty() {
            return Some(after_name);
        }

        let args = read_arguments(self.text, after_name, 1);
        let Some(definition) = args.required.first() else {
            return Some(after_name);
        };
        let arguments = match args.optional.first() {
            Some(count) => match trimmed(self.text, *count).parse::<usize>() {
                Ok(count) => count,
                Err(_) => {
                    log::debug!("Ignoring \\newcommand with a bad argument count at {}", after);
                    return Some(args.end);
                }
            },
            None => 0,
        };
        let name = name.to_string();
        self.push_command(name, name_offset, arguments, *definition);
        Some(args.end)
    }

    /// `\def\name#1#2{definition}`.
    fn def(&mut self, after: usize) -> Option<usize> {
        let bytes = self.text.as_bytes();
        let mut pos = after;
        while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
            pos += 1;
        }
        let name = match_command(self.text, pos)?;
        let mut arguments = 0;
        let mut p = name.end();
        loop {
            match bytes.get(p) {
                Some(b'#') => arguments += 1,
                Some(c) if c.is_ascii_digit() || c.is_ascii_whitespace() => {}
                Some(b'{') => break,
                _ => return Some(name.end()),
            }
            p += 1;
        }
        let close = find_peer_char(self.text, p, Side::Right, b'{', b'}')?;
        let definition = Span::new(p + 1, close - p - 1);
        let key = self.text[name.offset + 1..name.end()].to_string();
        self.push_command(key, name.offset + 1, arguments, definition);
        Some(close + 1)
    }

    fn push_command(&mut self, name: String, offset: usize, arguments: usize, definition: Span) {
        let mut entry = Entry::new(name, EntryKind::Command { arguments }, self.line_of(offset));
        entry.column = self.column_of(offset);
        entry.info = self.slice(definition).to_string();
        self.result.commands.push(entry);
    }
}
