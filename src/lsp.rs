//! Conversions from the document model to Language Server Protocol types.
//!
//! Model positions are byte offsets or 1-based lines with byte columns; the
//! protocol wants 0-based lines and character columns, so every conversion
//! goes through the document's rope.

use std::ops::Range;

use ropey::Rope;
use tower_lsp::lsp_types::{
    self, CompletionItem, CompletionItemKind, CompletionTextEdit, DiagnosticSeverity,
    FoldingRange, FoldingRangeKind, HoverContents, Location, MarkupContent, MarkupKind, Position,
    TextEdit, Url,
};

use crate::completion::Completions;
use crate::diagnostics::{Diagnostic, Severity};
use crate::folding::FoldRegion;
use crate::gotodef::Declaration;
use crate::hover::Hover;
use crate::index::{Entry, EntryKind};

/// Converts a byte range to a protocol range.
pub fn lsp_range(rope: &Rope, range: Range<usize>) -> Option<lsp_types::Range> {
    Some(lsp_types::Range {
        start: byte_position(rope, range.start)?,
        end: byte_position(rope, range.end)?,
    })
}

fn byte_position(rope: &Rope, byte: usize) -> Option<Position> {
    // convert from byte offset to char offset
    let char_index = rope.try_byte_to_char(byte).ok()?;
    let line = rope.try_char_to_line(char_index).ok()?;
    let character = char_index - rope.try_line_to_char(line).ok()?;
    Some(Position {
        line: line as u32,
        character: character as u32,
    })
}

/// The byte offset of a 1-based line and byte column, clamped to the rope.
fn line_column_offset(rope: &Rope, line: usize, column: usize) -> usize {
    let line = line.saturating_sub(1).min(rope.len_lines().saturating_sub(1));
    let start = rope.try_line_to_byte(line).unwrap_or(0);
    (start + column).min(rope.len_bytes())
}

fn severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Task => DiagnosticSeverity::INFORMATION,
    }
}

pub fn to_lsp_diagnostic(rope: &Rope, diagnostic: &Diagnostic) -> Option<lsp_types::Diagnostic> {
    let start = line_column_offset(rope, diagnostic.line, diagnostic.column);
    let end = (start + diagnostic.length).min(rope.len_bytes());
    Some(lsp_types::Diagnostic {
        range: lsp_range(rope, start..end)?,
        message: diagnostic.message.clone(),
        source: Some("texlipse".into()),
        severity: Some(severity(diagnostic.severity)),
        ..Default::default()
    })
}

pub fn to_folding_range(region: &FoldRegion) -> FoldingRange {
    FoldingRange {
        start_line: region.start_line.saturating_sub(1) as u32,
        end_line: region.end_line.saturating_sub(1) as u32,
        kind: Some(FoldingRangeKind::Region),
        collapsed_text: Some(region.key.clone()),
        ..Default::default()
    }
}

fn completion_kind(kind: &EntryKind) -> CompletionItemKind {
    match kind {
        EntryKind::BibRecord { .. } => CompletionItemKind::REFERENCE,
        EntryKind::Label | EntryKind::Citation => CompletionItemKind::REFERENCE,
        EntryKind::Command { .. } => CompletionItemKind::FUNCTION,
        EntryKind::Abbreviation => CompletionItemKind::CONSTANT,
    }
}

pub fn to_completion_item(entry: &Entry, replace: Option<lsp_types::Range>) -> CompletionItem {
    let detail = match &entry.kind {
        EntryKind::Command { arguments } if *arguments > 0 => {
            Some(format!("{} argument{}", arguments, if *arguments == 1 { "" } else { "s" }))
        }
        _ => entry.file_name.clone(),
    };
    CompletionItem {
        label: entry.key.clone(),
        kind: Some(completion_kind(&entry.kind)),
        detail,
        documentation: (!entry.info.is_empty()).then(|| {
            lsp_types::Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::PlainText,
                value: entry.info.clone(),
            })
        }),
        filter_text: Some(entry.key.clone()),
        text_edit: replace.map(|range| {
            CompletionTextEdit::Edit(TextEdit {
                range,
                new_text: entry.key.clone(),
            })
        }),
        ..Default::default()
    }
}

pub fn to_completion_items(rope: &Rope, completions: &Completions) -> Vec<CompletionItem> {
    let replace = lsp_range(rope, completions.replace.offset..completions.replace.end());
    completions
        .entries
        .iter()
        .map(|entry| to_completion_item(entry, replace))
        .collect()
}

pub fn to_location(declaration: &Declaration, rope: Option<&Rope>) -> Option<Location> {
    let position = match rope {
        Some(rope) => {
            byte_position(rope, line_column_offset(rope, declaration.line, declaration.column))?
        }
        None => Position {
            line: declaration.line.saturating_sub(1) as u32,
            character: declaration.column as u32,
        },
    };
    Some(Location {
        uri: Url::from_file_path(&declaration.path).ok()?,
        range: lsp_types::Range {
            start: position,
            end: position,
        },
    })
}

pub fn to_hover(rope: &Rope, hover: &Hover) -> lsp_types::Hover {
    lsp_types::Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::PlainText,
            value: hover.info().to_string(),
        }),
        range: lsp_range(rope, hover.span.offset..hover.span.end()),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_range_counts_characters() {
        let rope = Rope::from_str("äb\n€x");
        // "€" is three bytes, "ä" two
        let range = lsp_range(&rope, 2..7).unwrap();
        assert_eq!(range.start, Position { line: 0, character: 1 });
        assert_eq!(range.end, Position { line: 1, character: 1 });
        assert!(lsp_range(&rope, 0..100).is_none());
    }

    #[test]
    fn test_diagnostic_conversion() {
        let rope = Rope::from_str("@book{a,\n  title = \"x\n}\n");
        let diagnostic = Diagnostic::new(Severity::Error, "Unterminated string".into(), 2, 10, 1);
        let converted = to_lsp_diagnostic(&rope, &diagnostic).unwrap();
        assert_eq!(converted.range.start, Position { line: 1, character: 10 });
        assert_eq!(converted.range.end, Position { line: 1, character: 11 });
        assert_eq!(converted.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(converted.source, Some("texlipse".to_string()));
    }

    #[test]
    fn test_folding_and_location() {
        let region = FoldRegion {
            key: "knuth84".into(),
            span: crate::position::Span::new(0, 10),
            start_line: 3,
            end_line: 7,
            collapsed: true,
        };
        let range = to_folding_range(&region);
        assert_eq!((range.start_line, range.end_line), (2, 6));

        let declaration = Declaration {
            path: PathBuf::from("/project/main.tex"),
            line: 2,
            column: 4,
        };
        let location = to_location(&declaration, None).unwrap();
        assert_eq!(location.range.start, Position { line: 1, character: 4 });
        assert!(location.uri.as_str().ends_with("/project/main.tex"));
    }

    #[test]
    fn test_completion_item_replaces_prefix() {
        let rope = Rope::from_str("\\cite{a, ke");
        let mut entry = Entry::new("key1", EntryKind::BibRecord { entry_type: "book".into() }, 1);
        entry.info = "Book\ntitle: A".into();
        let replace = lsp_range(&rope, 9..11);
        let item = to_completion_item(&entry, replace);
        assert_eq!(item.label, "key1");
        assert_eq!(item.kind, Some(CompletionItemKind::REFERENCE));
        match item.text_edit {
            Some(CompletionTextEdit::Edit(edit)) => {
                assert_eq!(edit.new_text, "key1");
                assert_eq!(edit.range.start.character, 9);
            }
            other => panic!("unexpected edit {:?}", other),
        }
    }
}
