//! Byte spans, line-offset tables and position rebasing.
//!
//! Parsers record entries by line number only. Offsets are derived later from
//! whatever [`LineIndex`] the host currently has, and spans held across edits
//! are moved with [`rebase_positions`] instead of document listeners.

use ropey::Rope;
use serde::{Deserialize, Serialize};

/// A byte range into a document: `offset..offset + length`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub offset: usize,
    pub length: usize,
}

impl Span {
    pub fn new(offset: usize, length: usize) -> Span {
        Span { offset, length }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.offset <= offset && offset <= self.end()
    }

    /// Moves this span to where it lies after `edit` was applied.
    pub fn rebase(&self, edit: Edit) -> Span {
        let removed_end = edit.offset + edit.removed;

        if self.end() <= edit.offset {
            return *self;
        }
        if self.offset >= removed_end {
            return Span::new(self.offset + edit.inserted - edit.removed, self.length);
        }
        if self.offset <= edit.offset && self.end() >= removed_end {
            // the span encloses the removed range
            return Span::new(self.offset, self.length + edit.inserted - edit.removed);
        }
        if self.offset >= edit.offset && self.end() <= removed_end {
            return Span::new(edit.offset, 0);
        }
        if self.offset < edit.offset {
            // tail of the span was removed
            return Span::new(self.offset, edit.offset - self.offset);
        }
        // head of the span was removed; what is left starts after the insertion
        Span::new(edit.offset + edit.inserted, self.end() - removed_end)
    }
}

/// A single text replacement: `removed` bytes at `offset` replaced by
/// `inserted` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    pub offset: usize,
    pub removed: usize,
    pub inserted: usize,
}

impl Edit {
    pub fn insert(offset: usize, inserted: usize) -> Edit {
        Edit {
            offset,
            removed: 0,
            inserted,
        }
    }

    pub fn delete(offset: usize, removed: usize) -> Edit {
        Edit {
            offset,
            removed,
            inserted: 0,
        }
    }
}

/// Rebases every span in `positions` over `edit`.
///
/// Spans after the edit shift by `inserted - removed`, spans enclosing the
/// edit grow or shrink, partially overlapped spans are clipped to the part
/// that survives, and spans swallowed by the removal collapse to an empty
/// span at the edit offset.
pub fn rebase_positions(positions: &[Span], edit: Edit) -> Vec<Span> {
    positions.iter().map(|span| span.rebase(edit)).collect()
}

/// Line-offset table: `starts[i]` is the byte offset where line `i` begins.
///
/// Line numbers here are 0-based; entry line numbers are 1-based and are
/// converted by the callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> LineIndex {
        let bytes = text.as_bytes();
        let mut starts = vec![0];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    starts.push(i + 2);
                    i += 2;
                    continue;
                }
                b'\r' | b'\n' => starts.push(i + 1),
                _ => {}
            }
            i += 1;
        }
        LineIndex {
            starts,
            len: text.len(),
        }
    }

    /// Builds the table from a rope snapshot.
    pub fn from_rope(rope: &Rope) -> LineIndex {
        let starts = (0..rope.len_lines())
            .map(|line| rope.line_to_byte(line))
            .collect();
        LineIndex {
            starts,
            len: rope.len_bytes(),
        }
    }

    /// Wraps a table supplied by the host editor.
    ///
    /// # Panics
    ///
    /// If `starts` is empty, does not begin at 0, or is not increasing.
    pub fn from_line_starts(starts: Vec<usize>, len: usize) -> LineIndex {
        assert!(
            starts.first() == Some(&0),
            "line table must start with offset 0"
        );
        assert!(
            starts.windows(2).all(|w| w[0] < w[1]),
            "line table must be strictly increasing"
        );
        LineIndex { starts, len }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.starts.get(line).copied()
    }

    /// Start of the line after `line`, or the document length for the last line.
    fn next_line_start(&self, line: usize) -> Option<usize> {
        match self.starts.get(line + 1) {
            Some(next) => Some(*next),
            None if line < self.starts.len() => Some(self.len),
            None => None,
        }
    }

    /// End offset of `line` excluding its terminator.
    pub fn line_end(&self, text: &str, line: usize) -> Option<usize> {
        let start = self.line_start(line)?;
        let mut end = self.next_line_start(line)?;
        let bytes = text.as_bytes();
        while end > start && matches!(bytes.get(end - 1), Some(b'\n') | Some(b'\r')) {
            end -= 1;
        }
        Some(end)
    }

    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.starts.partition_point(|start| *start <= offset).saturating_sub(1)
    }
}
