use std::borrow::Cow;
use std::cmp::Ordering;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::Entry;

/// Key comparison used by a sorted index.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseMode {
    #[default]
    Sensitive,
    Insensitive,
}

impl CaseMode {
    fn normalize<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match self {
            CaseMode::Sensitive => Cow::Borrowed(key),
            CaseMode::Insensitive => Cow::Owned(key.to_lowercase()),
        }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.normalize(a).cmp(&self.normalize(b))
    }

    /// Stable sort by key; equal keys keep their relative order.
    pub fn sort(&self, entries: &mut [Entry]) {
        entries.sort_by(|a, b| self.compare(&a.key, &b.key));
    }
}

/// The index range of all entries whose key starts with `prefix`.
///
/// `entries` must be sorted under `mode`. An empty prefix matches every
/// entry; `None` means nothing matched.
pub fn completion_bounds(entries: &[Entry], prefix: &str, mode: CaseMode) -> Option<Range<usize>> {
    let prefix = mode.normalize(prefix);
    let lower = entries.partition_point(|entry| mode.normalize(&entry.key) < prefix);
    let upper = lower
        + entries[lower..]
            .partition_point(|entry| mode.normalize(&entry.key).starts_with(prefix.as_ref()));
    (upper > lower).then_some(lower..upper)
}

/// A sorted, binary-searchable entry list.
#[derive(Debug, Clone, Default)]
pub struct SortedIndex {
    entries: Vec<Entry>,
    mode: CaseMode,
}

impl SortedIndex {
    pub fn new(mode: CaseMode) -> SortedIndex {
        SortedIndex {
            entries: Vec::new(),
            mode,
        }
    }

    /// Sorts `entries` (stable) and wraps them.
    pub fn from_unsorted(mut entries: Vec<Entry>, mode: CaseMode) -> SortedIndex {
        mode.sort(&mut entries);
        SortedIndex { entries, mode }
    }

    /// Replaces the contents with an already sorted list.
    ///
    /// # Panics
    ///
    /// If `sorted` is not ordered under this index's case mode.
    pub fn set_entries(&mut self, sorted: Vec<Entry>) {
        assert!(
            sorted
                .windows(2)
                .all(|w| self.mode.compare(&w[0].key, &w[1].key) != Ordering::Greater),
            "entries passed to SortedIndex::set_entries must be sorted"
        );
        self.entries = sorted;
    }

    pub fn get_completions(&self, prefix: &str) -> Option<&[Entry]> {
        completion_bounds(&self.entries, prefix, self.mode).map(|range| &self.entries[range])
    }

    /// First entry (in stable order) whose key equals `key`.
    pub fn get_exact(&self, key: &str) -> Option<&Entry> {
        let wanted = self.mode.normalize(key);
        let lower = self
            .entries
            .partition_point(|entry| self.mode.normalize(&entry.key) < wanted);
        self.entries
            .get(lower)
            .filter(|entry| self.mode.normalize(&entry.key) == wanted)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get_exact(key).is_some()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn mode(&self) -> CaseMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
