//! Lexical rules for LaTeX and BibTeX source.
//!
//! The scanner does not build a syntax tree. It recognizes just enough
//! structure (commands, balanced groups, quoted strings, comments, words) for
//! highlighting, for delimiting parser units and for the spell-check word
//! finder. None of the matchers panic on malformed input: an unterminated
//! group is reported as "no match" and scanning resumes after it.

use serde::{Deserialize, Serialize};

use crate::position::Span;

/// Default bracket pairs for [`find_matching_bracket`]: each two consecutive
/// characters form an (opening, closing) pair.
pub const DEFAULT_PAIRS: &str = "{}[]()";

/// Matches a `{ ... }` group starting at `start`.
///
/// A `"` starts a quoted run inside which braces do not count toward the
/// group depth; braces opened inside the run have to close before the quote
/// can. Returns the inclusive region, or `None` if the input ends first.
pub fn match_balanced_braces(buffer: &str, start: usize) -> Option<Span> {
    let bytes = buffer.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth = 1usize;
    let mut in_string = false;
    let mut string_depth = 0usize;

    for (i, byte) in bytes.iter().enumerate().skip(start + 1) {
        match (*byte, in_string) {
            (b'"', false) => in_string = true,
            (b'"', true) if string_depth == 0 => in_string = false,
            (b'{', true) => string_depth += 1,
            (b'}', true) => string_depth = string_depth.saturating_sub(1),
            (b'{', false) => depth += 1,
            (b'}', false) => {
                depth -= 1;
                if depth == 0 {
                    return Some(Span::new(start, i - start + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Matches a `" ... "` string starting at `start`.
///
/// Braces inside the string nest; a `}` that would close a group opened
/// before the string is a premature terminator and yields `None`, leaving
/// the `}` for the enclosing brace rule.
pub fn match_balanced_string(buffer: &str, start: usize) -> Option<Span> {
    let bytes = buffer.as_bytes();
    if bytes.get(start) != Some(&b'"') {
        return None;
    }

    let mut depth = 0usize;
    for (i, byte) in bytes.iter().enumerate().skip(start + 1) {
        match *byte {
            b'{' => depth += 1,
            b'}' if depth == 0 => return None,
            b'}' => depth -= 1,
            b'"' if depth == 0 => return Some(Span::new(start, i - start + 1)),
            _ => {}
        }
    }
    None
}

/// Matches `@name` or `\name` at `start`, taking the longest run of letters.
///
/// A backslash followed by a single non-letter (`\%`, `\{`, `\\`) is a
/// control symbol and matches two characters.
pub fn match_command(buffer: &str, start: usize) -> Option<Span> {
    let rest = buffer.get(start..)?;
    let mut chars = rest.chars();
    let lead = chars.next()?;
    if lead != '@' && lead != '\\' {
        return None;
    }

    let letters: usize = chars
        .clone()
        .take_while(|c| c.is_alphabetic())
        .map(char::len_utf8)
        .sum();
    if letters > 0 {
        return Some(Span::new(start, 1 + letters));
    }

    match (lead, chars.next()) {
        ('\\', Some(symbol)) if !symbol.is_whitespace() => {
            Some(Span::new(start, 1 + symbol.len_utf8()))
        }
        _ => None,
    }
}

/// Which side of a bracket pair a match landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// The peer is an opening bracket to the left of the anchor.
    Left,
    /// The peer is a closing bracket to the right of the anchor.
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketMatch {
    pub offset: usize,
    pub side: Side,
}

/// Finds the peer of the bracket at `offset`.
///
/// Scans forward from an opening bracket and backward from a closing one,
/// counting nesting of that bracket type only. `pairs` lists (opening,
/// closing) ASCII characters back to back; an odd-length or non-ASCII list
/// matches nothing.
pub fn find_matching_bracket(buffer: &str, offset: usize, pairs: &str) -> Option<BracketMatch> {
    if pairs.len() % 2 == 1 || !pairs.is_ascii() {
        log::warn!("Bad bracket pair list: {}", pairs);
        return None;
    }
    let pairs: Vec<char> = pairs.chars().collect();

    let bytes = buffer.as_bytes();
    let current = *bytes.get(offset)? as char;
    let index = pairs.iter().position(|c| *c == current)?;

    if index % 2 == 0 {
        let (opening, closing) = (pairs[index] as u8, pairs[index + 1] as u8);
        let mut depth = 1usize;
        for (i, byte) in bytes.iter().enumerate().skip(offset + 1) {
            if *byte == opening {
                depth += 1;
            } else if *byte == closing {
                depth -= 1;
                if depth == 0 {
                    return Some(BracketMatch {
                        offset: i,
                        side: Side::Right,
                    });
                }
            }
        }
    } else {
        let (opening, closing) = (pairs[index - 1] as u8, pairs[index] as u8);
        let mut depth = 1usize;
        for i in (0..offset).rev() {
            if bytes[i] == closing {
                depth += 1;
            } else if bytes[i] == opening {
                depth -= 1;
                if depth == 0 {
                    return Some(BracketMatch {
                        offset: i,
                        side: Side::Left,
                    });
                }
            }
        }
    }
    None
}

/// Editor-style pair matching: looks at the character just before `caret`
/// and returns the region spanning both brackets.
pub fn match_pair(buffer: &str, caret: usize) -> Option<Span> {
    let anchor = caret.checked_sub(1)?;
    let found = find_matching_bracket(buffer, anchor, DEFAULT_PAIRS)?;
    match found.side {
        Side::Right => Some(Span::new(anchor, found.offset - anchor + 1)),
        Side::Left => Some(Span::new(found.offset, anchor - found.offset + 1)),
    }
}

/// Character classes shared by the scanner and the spell-check word finder.
pub trait WordDetector {
    fn is_word_start(&self, c: char) -> bool;
    fn is_word_part(&self, c: char) -> bool;
}

/// Words are runs of letters and digits, with inner apostrophes and hyphens.
pub struct TexWordDetector;

impl WordDetector for TexWordDetector {
    fn is_word_start(&self, c: char) -> bool {
        c.is_alphanumeric()
    }

    fn is_word_part(&self, c: char) -> bool {
        c.is_alphanumeric() || c == '\'' || c == '-'
    }
}

pub struct WhitespaceDetector;

impl WordDetector for WhitespaceDetector {
    fn is_word_start(&self, c: char) -> bool {
        c.is_whitespace()
    }

    fn is_word_part(&self, c: char) -> bool {
        c.is_whitespace()
    }
}

/// Length in bytes of the run starting at the beginning of `text`, or 0 if
/// the first character does not start a run.
pub fn detect_run(detector: &impl WordDetector, text: &str) -> usize {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if detector.is_word_start(first) => {
            first.len_utf8()
                + chars
                    .take_while(|c| detector.is_word_part(*c))
                    .map(char::len_utf8)
                    .sum::<usize>()
        }
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    /// `@` commands, brace groups and quoted strings are whole tokens.
    Bib,
    /// `\` commands; braces are single symbols so their content stays visible.
    Latex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Command,
    BraceGroup,
    QuotedString,
    Comment,
    Word,
    Whitespace,
    Symbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.offset..self.span.end()]
    }
}

/// Iterator over the tokens of a buffer.
pub struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    dialect: Dialect,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str, dialect: Dialect) -> Scanner<'a> {
        Scanner {
            text,
            pos: 0,
            dialect,
        }
    }

    /// Continues scanning at `pos`, skipping text a caller consumed itself.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.text.len());
    }

    fn comment_len(&self) -> usize {
        self.text[self.pos..]
            .find(['\n', '\r'])
            .unwrap_or(self.text.len() - self.pos)
    }

    fn next_kind(&self, first: char) -> (TokenKind, usize) {
        let rest = &self.text[self.pos..];

        let whitespace = detect_run(&WhitespaceDetector, rest);
        if whitespace > 0 {
            return (TokenKind::Whitespace, whitespace);
        }
        let word = detect_run(&TexWordDetector, rest);
        if word > 0 {
            return (TokenKind::Word, word);
        }

        let matched = match (first, self.dialect) {
            ('%', _) => return (TokenKind::Comment, self.comment_len()),
            ('\\', Dialect::Latex) | ('@', Dialect::Bib) => {
                match_command(self.text, self.pos).map(|span| (TokenKind::Command, span))
            }
            ('{', Dialect::Bib) => {
                match_balanced_braces(self.text, self.pos).map(|span| (TokenKind::BraceGroup, span))
            }
            ('"', Dialect::Bib) => match_balanced_string(self.text, self.pos)
                .map(|span| (TokenKind::QuotedString, span)),
            _ => None,
        };

        match matched {
            Some((kind, span)) => (kind, span.length),
            None => (TokenKind::Symbol, first.len_utf8()),
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let first = self.text.get(self.pos..)?.chars().next()?;
        let (kind, length) = self.next_kind(first);
        let token = Token {
            kind,
            span: Span::new(self.pos, length),
        };
        self.pos += length;
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_braces_match_to_closing_brace() {
        let text = "x{a{b}c}y";
        assert_eq!(match_balanced_braces(text, 1), Some(Span::new(1, 7)));
        // the interior group never extends past the outer close
        assert_eq!(match_balanced_braces(text, 3), Some(Span::new(3, 3)));
    }

    #[test]
    fn test_braces_inside_quotes_do_not_count() {
        let text = r#"{title = "a } b", x}"#;
        assert_eq!(match_balanced_braces(text, 0), Some(Span::new(0, text.len())));
    }

    #[test]
    fn test_truncated_groups_never_match() {
        let text = "{a{b}{c}d}";
        for end in 1..text.len() {
            assert_eq!(
                match_balanced_braces(&text[..end], 0),
                None,
                "prefix {:?} should not match",
                &text[..end]
            );
        }
        assert_eq!(match_balanced_braces("no brace", 0), None);
    }

    #[test]
    fn test_string_rule() {
        assert_eq!(match_balanced_string(r#""abc" x"#, 0), Some(Span::new(0, 5)));
        // quote inside braces does not close the string
        assert_eq!(
            match_balanced_string(r#""a {"} b" x"#, 0),
            Some(Span::new(0, 9))
        );
        assert_eq!(match_balanced_string(r#""a } b""#, 0), None);
        assert_eq!(match_balanced_string(r#""open"#, 0), None);
    }

    #[test]
    fn test_command_rule() {
        assert_eq!(match_command("@article{", 0), Some(Span::new(0, 8)));
        assert_eq!(match_command(r"x \section{", 2), Some(Span::new(2, 8)));
        assert_eq!(match_command(r"\%", 0), Some(Span::new(0, 2)));
        assert_eq!(match_command("@ x", 0), None);
        assert_eq!(match_command("\\", 0), None);
        assert_eq!(match_command("plain", 0), None);
    }

    #[test]
    fn test_matching_bracket_both_directions() {
        let text = "f(a[b]{c(d)})";
        assert_eq!(
            find_matching_bracket(text, 1, DEFAULT_PAIRS),
            Some(BracketMatch {
                offset: 12,
                side: Side::Right
            })
        );
        assert_eq!(
            find_matching_bracket(text, 12, DEFAULT_PAIRS),
            Some(BracketMatch {
                offset: 1,
                side: Side::Left
            })
        );
        assert_eq!(
            find_matching_bracket(text, 5, DEFAULT_PAIRS).map(|m| m.offset),
            Some(3)
        );
        assert_eq!(find_matching_bracket(text, 0, DEFAULT_PAIRS), None);
        assert_eq!(find_matching_bracket("{{}", 0, DEFAULT_PAIRS), None);
        assert_eq!(find_matching_bracket("{}", 0, "{}["), None);
        // non-ASCII pairs match nothing; byte 1 of "«" equals the code point of "«"
        assert_eq!(find_matching_bracket("«x»", 0, "«»"), None);
        assert_eq!(find_matching_bracket("«x»", 1, "«»"), None);
        assert_eq!(find_matching_bracket("()", 0, "()«»"), None);
    }

    #[test]
    fn test_match_pair_uses_character_before_caret() {
        let text = "a{bc}";
        assert_eq!(match_pair(text, 2), Some(Span::new(1, 4)));
        assert_eq!(match_pair(text, 5), Some(Span::new(1, 4)));
        assert_eq!(match_pair(text, 0), None);
    }

    #[test]
    fn test_latex_scanner_tokens() {
        let text = "\\emph{Hi} there % note\nx";
        let kinds: Vec<(TokenKind, &str)> = Scanner::new(text, Dialect::Latex)
            .map(|t| (t.kind, t.text(text)))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (TokenKind::Command, "\\emph"),
                (TokenKind::Symbol, "{"),
                (TokenKind::Word, "Hi"),
                (TokenKind::Symbol, "}"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Word, "there"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Comment, "% note"),
                (TokenKind::Whitespace, "\n"),
                (TokenKind::Word, "x"),
            ]
        );
    }

    #[test]
    fn test_bib_scanner_groups_and_recovers() {
        let text = "@string{a = \"b\"} {open";
        let kinds: Vec<TokenKind> = Scanner::new(text, Dialect::Bib).map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Command,
                TokenKind::BraceGroup,
                TokenKind::Whitespace,
                TokenKind::Symbol,
                TokenKind::Word,
            ]
        );
    }

    #[test]
    fn test_word_detector_runs() {
        assert_eq!(detect_run(&TexWordDetector, "don't stop"), 5);
        assert_eq!(detect_run(&TexWordDetector, "-x"), 0);
        assert_eq!(detect_run(&WhitespaceDetector, " \t\nx"), 3);
    }
}
