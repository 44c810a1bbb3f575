//! Error-tolerant BibTeX parser.
//!
//! Produces entries, `@string` abbreviations and preambles in file order.
//! Broken entries are reported as diagnostics and skipped; parsing resumes at
//! the next line that starts with `@`.

use std::collections::HashSet;

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, Severity};
use crate::index::{record_info, Entry, EntryKind, FieldValue, ValuePart};
use crate::position::LineIndex;
use crate::scanner::{match_balanced_braces, match_command};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub const DEFAULT_TASK_TAGS: [&str; 3] = ["TODO", "FIXME", "XXX"];

/// Required fields per entry type; inner slices are alternatives.
static REQUIRED_FIELDS: &[(&str, &[&[&str]])] = &[
    ("article", &[&["author"], &["title"], &["journal"], &["year"]]),
    ("book", &[&["author", "editor"], &["title"], &["publisher"], &["year"]]),
    ("booklet", &[&["title"]]),
    (
        "inbook",
        &[&["author", "editor"], &["title"], &["chapter", "pages"], &["publisher"], &["year"]],
    ),
    (
        "incollection",
        &[&["author"], &["title"], &["booktitle"], &["publisher"], &["year"]],
    ),
    ("inproceedings", &[&["author"], &["title"], &["booktitle"], &["year"]]),
    ("manual", &[&["title"]]),
    ("mastersthesis", &[&["author"], &["title"], &["school"], &["year"]]),
    ("misc", &[]),
    ("phdthesis", &[&["author"], &["title"], &["school"], &["year"]]),
    ("proceedings", &[&["title"], &["year"]]),
    ("techreport", &[&["author"], &["title"], &["institution"], &["year"]]),
    ("unpublished", &[&["author"], &["title"], &["note"]]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Words in text outside entries that produce task diagnostics.
    pub task_tags: Vec<String>,
    pub required_field_warnings: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            task_tags: DEFAULT_TASK_TAGS.iter().map(|t| t.to_string()).collect(),
            required_field_warnings: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibParseResult {
    pub entries: Vec<Entry>,
    pub abbreviations: Vec<Entry>,
    pub preambles: Vec<String>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub tasks: Vec<Diagnostic>,
}

impl BibParseResult {
    /// Errors, warnings and tasks in one list.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .chain(self.tasks.iter())
    }
}

/// Parses `text` with the default options.
pub fn parse(text: &str) -> BibParseResult {
    parse_with(text, &ParseOptions::default())
}

pub fn parse_with(text: &str, options: &ParseOptions) -> BibParseResult {
    BibParser::new(text, options).run()
}

struct SyntaxError {
    offset: usize,
    length: usize,
    message: String,
    /// Where parsing picks up again when that is known at the failure.
    resume: Option<usize>,
}

type Parsed<T> = Result<T, SyntaxError>;

struct BibParser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    lines: LineIndex,
    options: &'a ParseOptions,
    task_pattern: Option<Regex>,
    seen_keys: HashSet<String>,
    result: BibParseResult,
}

impl<'a> BibParser<'a> {
    fn new(text: &'a str, options: &'a ParseOptions) -> BibParser<'a> {
        let task_pattern = if options.task_tags.is_empty() {
            None
        } else {
            let tags = options.task_tags.iter().map(|t| regex::escape(t)).join("|");
            Regex::new(&format!(r"\b(?:{})\b[^\r\n]*", tags)).ok()
        };
        BibParser {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            lines: LineIndex::new(text),
            options,
            task_pattern,
            seen_keys: HashSet::new(),
            result: BibParseResult::default(),
        }
    }

    fn run(mut self) -> BibParseResult {
        while self.pos < self.bytes.len() {
            let next = self.text[self.pos..].find('@').map(|i| self.pos + i);
            let junk_end = next.unwrap_or(self.bytes.len());
            self.scan_tasks(self.pos, junk_end);
            let Some(at) = next else {
                break;
            };

            self.pos = at;
            if let Err(error) = self.parse_item() {
                let diagnostic =
                    self.diagnostic(Severity::Error, error.offset, error.length, error.message);
                log::debug!(
                    "BibTeX syntax error at {}:{}: {}",
                    diagnostic.line,
                    diagnostic.column,
                    diagnostic.message
                );
                self.result.errors.push(diagnostic);
                self.pos = match error.resume {
                    Some(resume) if resume > at => resume,
                    _ if error.offset > at && self.starts_entry_line(error.offset) => error.offset,
                    _ => self.next_entry_line(error.offset.max(at + 1)),
                };
            }
        }
        self.result
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn line_of(&self, offset: usize) -> usize {
        self.lines.line_of_offset(offset) + 1
    }

    fn diagnostic(
        &self,
        severity: Severity,
        offset: usize,
        length: usize,
        message: String,
    ) -> Diagnostic {
        let line = self.lines.line_of_offset(offset);
        let column = offset - self.lines.line_start(line).unwrap_or(0);
        Diagnostic::new(severity, message, line + 1, column, length)
    }

    fn fail<T>(&self, offset: usize, message: impl Into<String>) -> Parsed<T> {
        Err(SyntaxError {
            offset,
            length: 1,
            message: message.into(),
            resume: None,
        })
    }

    /// An entry opened at `at` runs into the next entry or the end of the
    /// text. The error marks the entry type and parsing resumes at the `@`
    /// that cut it short.
    fn missing_closing<T>(&self, at: usize, closing: u8) -> Parsed<T> {
        let length = match_command(self.text, at).map_or(1, |command| command.end() - at);
        Err(SyntaxError {
            offset: at,
            length,
            message: format!("Missing closing '{}'", closing as char),
            resume: (self.peek() == Some(b'@')).then_some(self.pos),
        })
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// True if `offset` is a line break and the next line's first non-blank
    /// character is `@`.
    fn entry_line_follows(&self, offset: usize) -> bool {
        if !matches!(self.bytes.get(offset), Some(b'\n') | Some(b'\r')) {
            return false;
        }
        self.bytes[offset + 1..]
            .iter()
            .find(|b| !matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
            .is_some_and(|b| *b == b'@')
    }

    /// True if `offset` holds an `@` preceded only by blanks on its line.
    fn starts_entry_line(&self, offset: usize) -> bool {
        self.bytes.get(offset) == Some(&b'@')
            && self.bytes[..offset]
                .iter()
                .rev()
                .take_while(|b| !matches!(b, b'\n' | b'\r'))
                .all(|b| matches!(b, b' ' | b'\t'))
    }

    /// Start of the next line after `from` whose first non-blank character
    /// is `@`, or the end of the text.
    fn next_entry_line(&self, from: usize) -> usize {
        let mut i = from;
        while i < self.bytes.len() {
            if self.entry_line_follows(i) {
                let at = self.bytes[i..].iter().position(|b| *b == b'@').unwrap_or(0);
                return i + at;
            }
            i += 1;
        }
        self.bytes.len()
    }

    fn scan_tasks(&mut self, start: usize, end: usize) {
        let Some(pattern) = &self.task_pattern else {
            return;
        };
        let tasks: Vec<Diagnostic> = pattern
            .find_iter(&self.text[start..end])
            .map(|m| {
                self.diagnostic(
                    Severity::Task,
                    start + m.start(),
                    m.len(),
                    m.as_str().trim_end().to_string(),
                )
            })
            .collect();
        self.result.tasks.extend(tasks);
    }

    fn parse_item(&mut self) -> Parsed<()> {
        let text = self.text;
        let at = self.pos;
        let Some(command) = match_command(text, at) else {
            return self.fail(at, "Expected entry type after '@'");
        };
        let written_type = &text[at + 1..command.end()];
        let entry_type = written_type.to_lowercase();
        self.pos = command.end();

        if entry_type == "comment" {
            self.skip_comment();
            return Ok(());
        }

        self.skip_whitespace();
        let closing = match self.peek() {
            Some(b'{') => b'}',
            Some(b'(') => b')',
            _ => return self.fail(self.pos, format!("Expected '{{' or '(' after @{}", written_type)),
        };
        self.pos += 1;

        match entry_type.as_str() {
            "string" => self.parse_string_body(at, closing),
            "preamble" => self.parse_preamble_body(at, closing),
            _ => self.parse_record_body(at, written_type, entry_type.clone(), closing),
        }
    }

    fn skip_comment(&mut self) {
        let start = self.pos;
        self.skip_whitespace();
        let end = match self.peek() {
            Some(b'{') => match_balanced_braces(self.text, self.pos).map(|span| span.end()),
            _ => None,
        };
        let end = end.unwrap_or_else(|| {
            self.text[start..]
                .find(['\n', '\r'])
                .map_or(self.bytes.len(), |i| start + i)
        });
        self.scan_tasks(start, end);
        self.pos = end;
    }

    fn expect_closing(&mut self, at: usize, closing: u8) -> Parsed<usize> {
        self.skip_whitespace();
        match self.peek() {
            Some(b) if b == closing => {
                self.pos += 1;
                Ok(self.pos - 1)
            }
            Some(b'@') | None => self.missing_closing(at, closing),
            Some(_) => self.fail(self.pos, format!("Expected '{}'", closing as char)),
        }
    }

    fn parse_string_body(&mut self, at: usize, closing: u8) -> Parsed<()> {
        loop {
            self.skip_whitespace();
            let name_start = self.pos;
            let name = self.read_name(closing);
            if name.is_empty() {
                return self.fail(self.pos, "Expected abbreviation name");
            }
            self.expect_equals()?;
            let value = self.parse_value(closing)?;

            let mut entry = Entry::new(name, EntryKind::Abbreviation, self.line_of(name_start));
            entry.end_line = self.line_of(self.pos);
            entry.info = value.text.clone();
            entry.fields.insert("value".to_string(), value);
            self.result.abbreviations.push(entry);

            self.skip_whitespace();
            if self.peek() == Some(b',') {
                self.pos += 1;
                self.skip_whitespace();
                if self.peek() == Some(closing) {
                    break;
                }
                continue;
            }
            break;
        }
        self.expect_closing(at, closing)?;
        Ok(())
    }

    fn parse_preamble_body(&mut self, at: usize, closing: u8) -> Parsed<()> {
        let value = self.parse_value(closing)?;
        self.expect_closing(at, closing)?;
        self.result.preambles.push(value.text);
        Ok(())
    }

    fn parse_record_body(
        &mut self,
        at: usize,
        written_type: &str,
        entry_type: String,
        closing: u8,
    ) -> Parsed<()> {
        self.skip_whitespace();
        let key_start = self.pos;
        let key = self.read_name(closing);
        if key.is_empty() {
            return self.fail(key_start, format!("Missing key in @{} entry", written_type));
        }

        let mut fields: Vec<(String, FieldValue)> = Vec::new();
        let end = loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b) if b == closing => {
                    self.pos += 1;
                    break self.pos - 1;
                }
                Some(b',') => self.pos += 1,
                Some(b'@') | None => return self.missing_closing(at, closing),
                Some(_) => return self.fail(self.pos, "Expected ',' between fields"),
            }

            self.skip_whitespace();
            if self.peek() == Some(closing) {
                continue;
            }
            let name_start = self.pos;
            let name = self.read_name(closing).to_lowercase();
            if name.is_empty() {
                return self.fail(name_start, "Expected field name");
            }
            self.expect_equals()?;
            let value = self.parse_value(closing)?;
            fields.push((name, value));
        };

        let info = record_info(
            written_type,
            fields.iter().map(|(name, value)| (name.as_str(), value)),
        );
        let mut entry = Entry::new(
            key,
            EntryKind::BibRecord { entry_type },
            self.line_of(key_start),
        );
        entry.end_line = self.line_of(end);
        entry.info = info;
        entry.fields = fields.into_iter().collect();

        if !self.seen_keys.insert(key.to_string()) {
            let warning = self.diagnostic(
                Severity::Warning,
                key_start,
                key.len(),
                format!("Duplicate key '{}'", key),
            );
            self.result.warnings.push(warning);
        }
        if self.options.required_field_warnings {
            self.check_required_fields(at, &entry);
        }
        self.result.entries.push(entry);
        Ok(())
    }

    fn check_required_fields(&mut self, at: usize, entry: &Entry) {
        // crossref'd entries inherit their missing fields
        if entry.fields.contains_key("crossref") {
            return;
        }
        let Some(entry_type) = entry.entry_type() else {
            return;
        };
        let Some((_, required)) = REQUIRED_FIELDS.iter().find(|(t, _)| *t == entry_type) else {
            return;
        };
        for alternatives in required.iter() {
            if alternatives.iter().any(|f| entry.fields.contains_key(*f)) {
                continue;
            }
            let warning = self.diagnostic(
                Severity::Warning,
                at,
                entry_type.len() + 1,
                format!(
                    "Missing required field '{}' in @{} entry '{}'",
                    alternatives.join("' or '"),
                    entry_type,
                    entry.key
                ),
            );
            self.result.warnings.push(warning);
        }
    }

    fn expect_equals(&mut self) -> Parsed<()> {
        self.skip_whitespace();
        if self.peek() != Some(b'=') {
            return self.fail(self.pos, "Expected '=' after field name");
        }
        self.pos += 1;
        Ok(())
    }

    /// Reads a key, field or abbreviation name.
    fn read_name(&mut self, closing: u8) -> &'a str {
        let text = self.text;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace()
                || b == closing
                || matches!(b, b',' | b'=' | b'{' | b'}' | b'(' | b')' | b'"' | b'#')
            {
                break;
            }
            self.pos += 1;
        }
        &text[start..self.pos]
    }

    fn parse_value(&mut self, closing: u8) -> Parsed<FieldValue> {
        let mut parts = Vec::new();
        let mut sources = Vec::new();
        loop {
            self.skip_whitespace();
            let start = self.pos;
            match self.peek() {
                Some(open @ (b'"' | b'{')) => {
                    let inner = collapse_whitespace(self.read_delimited(open)?);
                    let (left, right) = if open == b'"' { ('"', '"') } else { ('{', '}') };
                    sources.push(format!("{}{}{}", left, inner, right));
                    parts.push(ValuePart::Literal(inner));
                }
                Some(b) if b.is_ascii_digit() => {
                    while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                        self.pos += 1;
                    }
                    let number = self.text[start..self.pos].to_string();
                    sources.push(number.clone());
                    parts.push(ValuePart::Number(number));
                }
                Some(b) if b.is_ascii_alphabetic() => {
                    let name = self.read_name(closing).to_string();
                    sources.push(name.clone());
                    parts.push(ValuePart::Abbrev(name));
                }
                _ => return self.fail(start, "Expected field value"),
            }

            self.skip_whitespace();
            if self.peek() != Some(b'#') {
                break;
            }
            self.pos += 1;
        }

        let text = match parts.as_slice() {
            [ValuePart::Literal(text)] | [ValuePart::Number(text)] => text.clone(),
            _ => sources.join(" # "),
        };
        Ok(FieldValue { text, parts })
    }

    /// Reads a `"..."` or `{...}` literal and returns its inner text.
    fn read_delimited(&mut self, open: u8) -> Parsed<&'a str> {
        let text = self.text;
        let start = self.pos;
        let mut depth = 0usize;
        let mut i = start + 1;
        while let Some(&b) = self.bytes.get(i) {
            match b {
                b'{' => depth += 1,
                b'}' if depth > 0 => depth -= 1,
                b'}' if open == b'{' => {
                    self.pos = i + 1;
                    return Ok(&text[start + 1..i]);
                }
                b'}' => return self.fail(i, "Unbalanced '}' in quoted value"),
                b'"' if open == b'"' && depth == 0 => {
                    self.pos = i + 1;
                    return Ok(&text[start + 1..i]);
                }
                _ if self.entry_line_follows(i) => break,
                _ => {}
            }
            i += 1;
        }
        let message = if open == b'"' {
            "Unterminated string"
        } else {
            "Unterminated '{' group"
        };
        self.fail(start, message)
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(result: &BibParseResult) -> Vec<&str> {
        result.entries.iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn test_parses_records_with_both_delimiters() {
        let text = "@Article{knuth84,\n  author = {Donald   Knuth},\n  title = \"Literate Programming\",\n  journal = {CJ},\n  year = 1984\n}\n\n@misc(web, note = {x})\n";
        let result = parse(text);

        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        assert_eq!(keys(&result), vec!["knuth84", "web"]);

        let knuth = &result.entries[0];
        assert_eq!(knuth.entry_type(), Some("article"));
        assert_eq!(knuth.start_line, 1);
        assert_eq!(knuth.end_line, 6);
        assert_eq!(knuth.field("author"), Some("Donald Knuth"));
        assert_eq!(knuth.field("year"), Some("1984"));
        assert_eq!(
            knuth.info,
            "Article\nauthor: Donald Knuth\ntitle: Literate Programming\njournal: CJ\nyear: 1984"
        );
        assert_eq!(result.entries[1].start_line, 8);
    }

    #[test]
    fn test_strings_preambles_and_comments() {
        let text = "@string{acm = \"ACM\"}\n@STRING(ieee = {IEEE}, jcs = \"J. \" # acm)\n@preamble{\"\\newcommand{\\noop}[1]{}\"}\n@comment{ignored @article{no, title={x}} }\n@misc{m, publisher = acm # \" Press\", month = jan}\n";
        let result = parse(text);

        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        let names: Vec<_> = result.abbreviations.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(names, vec!["acm", "ieee", "jcs"]);
        assert_eq!(result.abbreviations[2].info, "\"J. \" # acm");
        assert_eq!(result.preambles, vec!["\\newcommand{\\noop}[1]{}".to_string()]);
        assert_eq!(keys(&result), vec!["m"]);

        let publisher = &result.entries[0].fields["publisher"];
        assert_eq!(publisher.text, "acm # \" Press\"");
        assert_eq!(
            publisher.parts,
            vec![
                ValuePart::Abbrev("acm".to_string()),
                ValuePart::Literal(" Press".to_string())
            ]
        );
        assert_eq!(result.entries[0].field("month"), Some("jan"));
    }

    #[test]
    fn test_runaway_string_stops_at_next_entry() {
        let text = "@article{bad, author=\"unterminated\n@article{key2, title={Fine}, author={A}, journal={J}, year=2001}\n";
        let result = parse(text);

        assert_eq!(result.errors.len(), 1, "errors: {:?}", result.errors);
        assert_eq!(result.errors[0].line, 1);
        assert_eq!(result.errors[0].column, 21);
        assert_eq!(keys(&result), vec!["key2"]);
        assert_eq!(result.entries[0].start_line, 2);
    }

    #[test]
    fn test_one_error_per_broken_entry() {
        let text = "@book{a, title = x y, year = 1}\n@book{b title = {T}}\n@book{c, editor={E}, title={T}, publisher={P}, year={2}}\n";
        let result = parse(text);
        assert_eq!(result.errors.len(), 2, "errors: {:?}", result.errors);
        assert_eq!(result.errors[0].line, 1);
        assert_eq!(result.errors[1].line, 2);
        assert_eq!(keys(&result), vec!["c"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_unterminated_entry_at_eof() {
        let result = parse("@article{open, title = {T}");
        assert_eq!(result.errors.len(), 1);
        assert!(result.entries.is_empty());
        assert!(result.errors[0].message.contains("Missing closing"));
    }

    #[test]
    fn test_unclosed_record_keeps_following_entry() {
        let result = parse("@article{a, title={T}\n@article{b, title={U}}\n");
        assert_eq!(result.errors.len(), 1, "errors: {:?}", result.errors);
        assert_eq!(result.errors[0].line, 1);
        assert_eq!(result.errors[0].column, 0);
        assert_eq!(result.errors[0].length, "@article".len());
        assert_eq!(result.errors[0].message, "Missing closing '}'");
        assert_eq!(keys(&result), vec!["b"]);
        assert_eq!(result.entries[0].start_line, 2);
    }

    #[test]
    fn test_unclosed_string_keeps_following_entry() {
        let result = parse("@string{x = \"y\"\n@article{b, title={U}}\n");
        assert_eq!(result.errors.len(), 1, "errors: {:?}", result.errors);
        assert_eq!(result.errors[0].line, 1);
        assert_eq!(keys(&result), vec!["b"]);
        assert_eq!(result.abbreviations.len(), 1);

        let result = parse("@preamble{\"x\"  @misc{c, note={n}}\n");
        assert_eq!(result.errors.len(), 1, "errors: {:?}", result.errors);
        assert_eq!(keys(&result), vec!["c"]);
    }

    #[test]
    fn test_missing_value_before_entry_line() {
        let result = parse("@misc{a, note =\n@misc{b, note={n}}\n");
        assert_eq!(result.errors.len(), 1, "errors: {:?}", result.errors);
        assert_eq!(keys(&result), vec!["b"]);
    }

    #[test]
    fn test_missing_key_and_type() {
        let result = parse("@article{, title={T}}\n@ {x}\n");
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].message.contains("Missing key"));
        assert!(result.errors[1].message.contains("entry type"));
    }

    #[test]
    fn test_duplicate_keys_and_missing_fields_warn() {
        let text = "@misc{dup, note={1}}\n@misc{dup, note={2}}\n@article{art, title={T}}\n";
        let result = parse(text);

        assert_eq!(keys(&result), vec!["dup", "dup", "art"]);
        let messages: Vec<_> = result.warnings.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Duplicate key 'dup'",
                "Missing required field 'author' in @article entry 'art'",
                "Missing required field 'journal' in @article entry 'art'",
                "Missing required field 'year' in @article entry 'art'",
            ]
        );
        assert_eq!(result.warnings[0].line, 2);

        let quiet = parse_with(
            text,
            &ParseOptions {
                required_field_warnings: false,
                ..ParseOptions::default()
            },
        );
        assert_eq!(quiet.warnings.len(), 1);
    }

    #[test]
    fn test_crossref_skips_required_fields() {
        let result = parse("@inproceedings{p, crossref={conf}, title={T}}");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_tasks_outside_entries() {
        let text = "TODO: check years\n@misc{a, note={TODO not a task}}\nFIXME later\n";
        let result = parse(text);
        let tasks: Vec<_> = result
            .tasks
            .iter()
            .map(|t| (t.line, t.message.as_str()))
            .collect();
        assert_eq!(tasks, vec![(1, "TODO: check years"), (3, "FIXME later")]);
        assert!(result.tasks.iter().all(|t| t.severity == Severity::Task));
    }

    #[test]
    fn test_reparse_is_deterministic() {
        let text = "@book{b, title={B}}\n@misc{a}\n@string{x = \"y\"}";
        assert_eq!(parse(text), parse(text));
    }

    #[test]
    fn test_key_only_record() {
        let result = parse("@misc{lonely}");
        assert_eq!(keys(&result), vec!["lonely"]);
        assert!(result.entries[0].fields.is_empty());
    }
}
