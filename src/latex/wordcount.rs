use crate::scanner::{Dialect, Scanner, TokenKind};

use super::{is_cite_command, is_ref_command, read_arguments};

const SECTIONING: [&str; 7] = [
    "part",
    "chapter",
    "section",
    "subsection",
    "subsubsection",
    "paragraph",
    "subparagraph",
];

/// Commands whose arguments are names rather than prose.
const NON_PROSE: [&str; 14] = [
    "label",
    "begin",
    "end",
    "input",
    "include",
    "usepackage",
    "documentclass",
    "bibliography",
    "bibliographystyle",
    "addbibresource",
    "newcommand",
    "renewcommand",
    "providecommand",
    "includegraphics",
];

/// Counts the words of a LaTeX buffer.
///
/// Text in comments and in the arguments of structural commands does not
/// count; a sectioning title does, and each citation counts as one word.
pub fn count_words(text: &str) -> usize {
    let mut words = 0;
    let mut scanner = Scanner::new(text, Dialect::Latex);
    while let Some(token) = scanner.next() {
        match token.kind {
            TokenKind::Word => words += 1,
            TokenKind::Command => {
                let name = &token.text(text)[1..];
                if SECTIONING.contains(&name) {
                    let args = read_arguments(text, token.span.end(), 1);
                    if let Some(title) = args.required.first() {
                        words += text[title.offset..title.end()].split_whitespace().count();
                    }
                    scanner.seek(args.end);
                } else if is_cite_command(name) {
                    words += 1;
                    scanner.seek(read_arguments(text, token.span.end(), 1).end);
                } else if is_ref_command(name) || NON_PROSE.contains(&name) {
                    scanner.seek(read_arguments(text, token.span.end(), 1).end);
                }
            }
            _ => {}
        }
    }
    words
}
