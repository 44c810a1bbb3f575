//! Line-oriented views of an editor selection.

use once_cell::sync::Lazy;
use regex::Regex;
use ropey::Rope;

static PARAGRAPH_LF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());
static PARAGRAPH_CRLF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n[ \t]*\r\n").unwrap());
static PARAGRAPH_CR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r[ \t]*\r").unwrap());

fn paragraph_separator(delimiter: &str) -> &'static Regex {
    match delimiter {
        "\r\n" => &PARAGRAPH_CRLF,
        "\r" => &PARAGRAPH_CR,
        _ => &PARAGRAPH_LF,
    }
}

/// A selection in a document snapshot, widened to whole lines or paragraphs
/// on request.
#[derive(Debug, Clone)]
pub struct TexSelection {
    rope: Rope,
    raw_offset: usize,
    raw_length: usize,
    start_line: usize,
    end_line: usize,
    start_offset: usize,
    length: usize,
    selection: String,
    delimiter: String,
}

impl TexSelection {
    /// Selection of `length` bytes at `offset`; line indices are derived
    /// the way an editor reports them.
    pub fn new(text: &str, offset: usize, length: usize) -> TexSelection {
        let rope = Rope::from_str(text);
        let (offset, length) = snap_to_chars(&rope, offset, length);
        let start_line = rope.byte_to_line(offset);
        let end_line = if length > 0 {
            rope.byte_to_line(offset + length - 1)
        } else {
            start_line
        };
        TexSelection::build(rope, offset, length, start_line, end_line)
    }

    /// Selection with line indices supplied by the host. An end line before
    /// the start line is clamped to the start line.
    pub fn from_raw(
        text: &str,
        offset: usize,
        length: usize,
        start_line: usize,
        end_line: usize,
    ) -> TexSelection {
        let rope = Rope::from_str(text);
        let last_line = rope.len_lines() - 1;
        let (offset, length) = snap_to_chars(&rope, offset, length);
        TexSelection::build(
            rope,
            offset,
            length,
            start_line.min(last_line),
            end_line.min(last_line),
        )
    }

    fn build(
        rope: Rope,
        offset: usize,
        length: usize,
        start_line: usize,
        end_line: usize,
    ) -> TexSelection {
        let raw_length = length;
        let end_line = end_line.max(start_line);
        let delimiter = line_delimiter(&rope, start_line).unwrap_or("\n").to_string();

        let (start_offset, length) = if length > 0 {
            (offset, length)
        } else {
            // nothing selected: the current line is the selection
            let (start, end) = line_bounds(&rope, start_line);
            (start, end - start)
        };
        let selection = rope
            .byte_slice(start_offset..start_offset + length)
            .to_string();

        TexSelection {
            rope,
            raw_offset: offset,
            raw_length,
            start_line,
            end_line,
            start_offset,
            length,
            selection,
            delimiter,
        }
    }

    /// Widens the selection to the start of its first line and the end of
    /// its last line, not counting the last line's terminator.
    pub fn select_complete_lines(&mut self) {
        let (start, _) = line_bounds(&self.rope, self.start_line);
        let (_, end) = line_bounds(&self.rope, self.end_line);
        self.start_offset = start;
        self.length = end - start;
    }

    /// With an empty raw selection, selects the paragraph around the cursor;
    /// paragraphs are separated by blank lines. Otherwise the same as
    /// [`TexSelection::select_complete_lines`].
    pub fn select_paragraph(&mut self) {
        if self.raw_length > 0 {
            self.select_complete_lines();
            return;
        }

        let text = self.rope.to_string();
        let separator = paragraph_separator(&self.delimiter);
        let offset = self.raw_offset;

        let begin = separator
            .find_iter(&text[..offset])
            .last()
            .map_or(0, |m| m.end());
        let end = separator
            .find(&text[offset..])
            .map_or(text.len(), |m| offset + m.start());

        self.start_line = self.rope.byte_to_line(begin);
        self.end_line = self.rope.byte_to_line(end);
        self.start_offset = begin;
        self.length = end - begin;
    }

    /// Text of line `i` without its terminator, or an empty string past the
    /// end of the document.
    pub fn line(&self, i: usize) -> String {
        if i >= self.rope.len_lines() {
            return String::new();
        }
        let (start, end) = line_bounds(&self.rope, i);
        self.rope.byte_slice(start..end).to_string()
    }

    /// Text from the start of the first selected line to the end of the last.
    pub fn complete_lines(&self) -> String {
        let (start, _) = line_bounds(&self.rope, self.start_line);
        let (_, end) = line_bounds(&self.rope, self.end_line);
        self.rope.byte_slice(start..end).to_string()
    }

    /// The selected text as it was when the selection was made.
    pub fn selection(&self) -> &str {
        &self.selection
    }

    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn raw_length(&self) -> usize {
        self.raw_length
    }

    pub fn line_delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn start_line_index(&self) -> usize {
        self.start_line
    }

    pub fn end_line_index(&self) -> usize {
        self.end_line
    }
}

/// Clamps the range to the document and moves both ends onto character
/// boundaries.
fn snap_to_chars(rope: &Rope, offset: usize, length: usize) -> (usize, usize) {
    let snap = |byte: usize| rope.char_to_byte(rope.byte_to_char(byte.min(rope.len_bytes())));
    let start = snap(offset);
    let end = snap(offset.saturating_add(length)).max(start);
    (start, end - start)
}

/// Byte range of line `line` without its terminator.
fn line_bounds(rope: &Rope, line: usize) -> (usize, usize) {
    let start = rope.line_to_byte(line);
    let slice = rope.line(line);
    let terminator = line_terminator(&slice.to_string()).map_or(0, str::len);
    (start, start + slice.len_bytes() - terminator)
}

fn line_terminator(line: &str) -> Option<&'static str> {
    if line.ends_with("\r\n") {
        Some("\r\n")
    } else if line.ends_with('\n') {
        Some("\n")
    } else if line.ends_with('\r') {
        Some("\r")
    } else {
        None
    }
}

fn line_delimiter(rope: &Rope, line: usize) -> Option<&'static str> {
    line_terminator(&rope.line(line).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_selection_grabs_current_line() {
        let sel = TexSelection::new("first\nsecond line\nthird", 8, 0);
        assert_eq!(sel.start_line_index(), 1);
        assert_eq!(sel.end_line_index(), 1);
        assert_eq!(sel.start_offset(), 6);
        assert_eq!(sel.length(), 11);
        assert_eq!(sel.selection(), "second line");
        assert_eq!(sel.line_delimiter(), "\n");
    }

    #[test]
    fn test_complete_lines_excludes_last_terminator() {
        let text = "aaa\nbbb\nccc\n";
        let mut sel = TexSelection::new(text, 1, 5);
        assert_eq!(sel.selection(), "aa\nbb");
        assert_eq!(sel.end_line_index(), 1);
        sel.select_complete_lines();
        assert_eq!(sel.start_offset(), 0);
        assert_eq!(sel.length(), 7);
        assert_eq!(sel.complete_lines(), "aaa\nbbb");
    }

    #[test]
    fn test_selection_ending_after_newline_stays_on_line() {
        // the terminator belongs to the line it ends
        let sel = TexSelection::new("aaa\nbbb", 0, 4);
        assert_eq!(sel.end_line_index(), 0);
    }

    #[test]
    fn test_paragraph_between_blank_lines() {
        let text = "abc\n\ndef\nghi\n\njkl";
        let mut sel = TexSelection::new(text, 6, 0);
        sel.select_paragraph();
        assert_eq!(sel.start_offset(), 5);
        assert_eq!(sel.length(), 7);
        assert_eq!(sel.start_line_index(), 2);
        assert_eq!(sel.end_line_index(), 3);
    }

    #[test]
    fn test_paragraph_at_document_edges() {
        let text = "one\ntwo\n  \nthree";
        let mut sel = TexSelection::new(text, 1, 0);
        sel.select_paragraph();
        assert_eq!((sel.start_offset(), sel.length()), (0, 7));

        let mut sel = TexSelection::new(text, 13, 0);
        sel.select_paragraph();
        assert_eq!((sel.start_offset(), sel.length()), (11, 5));
    }

    #[test]
    fn test_paragraph_uses_crlf_delimiter() {
        let text = "a\r\n\r\nb\r\nc";
        let mut sel = TexSelection::new(text, 5, 0);
        assert_eq!(sel.line_delimiter(), "\r\n");
        sel.select_paragraph();
        assert_eq!((sel.start_offset(), sel.length()), (5, 4));
    }

    #[test]
    fn test_paragraph_with_selection_selects_lines() {
        let text = "abc\n\ndef\nghi";
        let mut sel = TexSelection::new(text, 6, 4);
        sel.select_paragraph();
        assert_eq!((sel.start_offset(), sel.length()), (5, 7));
    }

    #[test]
    fn test_from_raw_clamps_end_line() {
        let sel = TexSelection::from_raw("a\nb\nc", 2, 0, 1, 0);
        assert_eq!(sel.start_line_index(), 1);
        assert_eq!(sel.end_line_index(), 1);
        assert_eq!(sel.selection(), "b");
    }

    #[test]
    fn test_line_accessor() {
        let sel = TexSelection::new("x\r\ny", 0, 0);
        assert_eq!(sel.line(0), "x");
        assert_eq!(sel.line(1), "y");
        assert_eq!(sel.line(7), "");
    }
}
