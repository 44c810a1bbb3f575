//! Outline trees over the entries of one BibTeX file.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::str::FromStr;

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::index::{AbbrevManager, Entry};

pub const MAX_PARTITION_SIZE: usize = 15;

static ESCAPED_CHAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\(.)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    Natural,
    Year,
    Author,
    Journal,
    Index,
}

impl Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SortMode::Natural => "natural",
            SortMode::Year => "year",
            SortMode::Author => "author",
            SortMode::Journal => "journal",
            SortMode::Index => "index",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "natural" => Ok(SortMode::Natural),
            "year" => Ok(SortMode::Year),
            "author" => Ok(SortMode::Author),
            "journal" => Ok(SortMode::Journal),
            "index" => Ok(SortMode::Index),
            other => Err(format!("unknown sort mode '{}'", other)),
        }
    }
}

/// A node of an outline tree. Leaves point into the natural entry list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutlineNode {
    Leaf { label: String, entry: usize },
    Group { label: String, children: Vec<OutlineNode> },
}

impl OutlineNode {
    pub fn label(&self) -> &str {
        match self {
            OutlineNode::Leaf { label, .. } | OutlineNode::Group { label, .. } => label,
        }
    }

    pub fn children(&self) -> &[OutlineNode] {
        match self {
            OutlineNode::Leaf { .. } => &[],
            OutlineNode::Group { children, .. } => children,
        }
    }

    /// Entry indices of all leaves below this node, depth first.
    pub fn leaf_entries(&self) -> Vec<usize> {
        match self {
            OutlineNode::Leaf { entry, .. } => vec![*entry],
            OutlineNode::Group { children, .. } => {
                children.iter().flat_map(OutlineNode::leaf_entries).collect()
            }
        }
    }
}

/// Entries of a BibTeX file plus lazily built, cached sort trees.
///
/// Field values are grouped after `@string` expansion, so `journal = jacm`
/// lands with the records that spell the journal out.
#[derive(Debug, Clone)]
pub struct BibOutline {
    entries: Vec<Entry>,
    abbrevs: AbbrevManager,
    partition_size: usize,
    cache: HashMap<SortMode, OutlineNode>,
}

impl BibOutline {
    pub fn new(entries: Vec<Entry>) -> BibOutline {
        BibOutline::with_partition_size(entries, MAX_PARTITION_SIZE)
    }

    pub fn with_partition_size(entries: Vec<Entry>, partition_size: usize) -> BibOutline {
        BibOutline {
            entries,
            abbrevs: AbbrevManager::new(),
            partition_size: partition_size.max(2),
            cache: HashMap::new(),
        }
    }

    /// Uses the `@string` definitions of the file when grouping.
    pub fn with_abbreviations(mut self, abbreviations: Vec<Entry>) -> BibOutline {
        self.set_abbreviations(abbreviations);
        self
    }

    pub fn set_abbreviations(&mut self, abbreviations: Vec<Entry>) {
        self.abbrevs.set_abbrevs(abbreviations);
        self.invalidate();
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The tree for `mode`, built on first access.
    pub fn tree(&mut self, mode: SortMode) -> &OutlineNode {
        let entries = &self.entries;
        let abbrevs = &self.abbrevs;
        let size = self.partition_size;
        self.cache
            .entry(mode)
            .or_insert_with(|| build_tree(entries, abbrevs, mode, size))
    }

    pub fn is_cached(&self, mode: SortMode) -> bool {
        self.cache.contains_key(&mode)
    }

    /// Drops all cached trees.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// Swaps in a freshly parsed entry list.
    pub fn replace_entries(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
        self.invalidate();
    }
}

fn leaf(entries: &[Entry], index: usize) -> OutlineNode {
    OutlineNode::Leaf {
        label: entries[index].key.clone(),
        entry: index,
    }
}

fn group(label: impl Into<String>, entries: &[Entry], members: &[usize]) -> OutlineNode {
    OutlineNode::Group {
        label: label.into(),
        children: members.iter().map(|i| leaf(entries, *i)).collect(),
    }
}

fn build_tree(
    entries: &[Entry],
    abbrevs: &AbbrevManager,
    mode: SortMode,
    partition_size: usize,
) -> OutlineNode {
    log::debug!("Building {} outline over {} entries", mode, entries.len());
    let children = match mode {
        SortMode::Natural => (0..entries.len()).map(|i| leaf(entries, i)).collect(),
        SortMode::Year => year_buckets(entries, abbrevs),
        SortMode::Author => author_buckets(entries, abbrevs),
        SortMode::Journal => journal_buckets(entries, abbrevs),
        SortMode::Index => index_partitions(entries, partition_size),
    };
    OutlineNode::Group {
        label: mode.to_string(),
        children,
    }
}

/// A field with its abbreviations expanded.
fn resolved_field(entry: &Entry, name: &str, abbrevs: &AbbrevManager) -> Option<String> {
    entry
        .fields
        .get(name)
        .map(|value| value.resolve(|abbrev| abbrevs.value(abbrev)))
}

fn year_buckets(entries: &[Entry], abbrevs: &AbbrevManager) -> Vec<OutlineNode> {
    let mut years: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    let mut missing = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let year = resolved_field(entry, "year", abbrevs);
        match year.and_then(|y| y.trim().parse::<i64>().ok()) {
            Some(year) => years.entry(year).or_default().push(i),
            None => missing.push(i),
        }
    }

    let mut nodes: Vec<OutlineNode> = years
        .iter()
        .map(|(year, members)| group(year.to_string(), entries, members))
        .collect();
    if !missing.is_empty() {
        nodes.push(group("(no year)", entries, &missing));
    }
    nodes
}

/// Buckets keyed case-insensitively, labelled with the first spelling seen.
#[derive(Default)]
struct Buckets {
    named: BTreeMap<String, (String, Vec<usize>)>,
    missing: Vec<usize>,
}

impl Buckets {
    fn add(&mut self, name: &str, index: usize) {
        let bucket = self
            .named
            .entry(name.to_lowercase())
            .or_insert_with(|| (name.to_string(), Vec::new()));
        if bucket.1.last() != Some(&index) {
            bucket.1.push(index);
        }
    }

    fn into_nodes(self, entries: &[Entry], missing_label: &str) -> Vec<OutlineNode> {
        let mut nodes: Vec<OutlineNode> = self
            .named
            .into_values()
            .map(|(label, members)| group(label, entries, &members))
            .collect();
        if !self.missing.is_empty() {
            nodes.push(group(missing_label, entries, &self.missing));
        }
        nodes
    }
}

fn author_buckets(entries: &[Entry], abbrevs: &AbbrevManager) -> Vec<OutlineNode> {
    let mut buckets = Buckets::default();
    for (i, entry) in entries.iter().enumerate() {
        let names = resolved_field(entry, "author", abbrevs)
            .map(|field| split_authors(&field))
            .unwrap_or_default();
        if names.is_empty() {
            buckets.missing.push(i);
        }
        for name in names {
            buckets.add(&name, i);
        }
    }
    buckets.into_nodes(entries, "(no author)")
}

fn journal_buckets(entries: &[Entry], abbrevs: &AbbrevManager) -> Vec<OutlineNode> {
    let mut buckets = Buckets::default();
    for (i, entry) in entries.iter().enumerate() {
        match resolved_field(entry, "journal", abbrevs).map(|journal| strip_braces(&journal)) {
            Some(journal) if !journal.trim().is_empty() => buckets.add(journal.trim(), i),
            _ => buckets.missing.push(i),
        }
    }
    buckets.into_nodes(entries, "(no journal)")
}

fn strip_braces(text: &str) -> String {
    text.chars().filter(|c| *c != '{' && *c != '}').collect()
}

/// Splits a BibTeX author list and turns each name into `Last, First`.
///
/// Names that already contain a comma or are wrapped in braces (corporate
/// authors) keep their order.
pub fn split_authors(field: &str) -> Vec<String> {
    let unescaped = ESCAPED_CHAR.replace_all(field, "$1");
    unescaped
        .split(" and ")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            let braced = name.starts_with('{') && name.ends_with('}');
            let reordered = match name.rfind(' ') {
                Some(space) if !name.contains(',') && !braced => {
                    format!("{}, {}", &name[space + 1..], &name[..space])
                }
                _ => name.to_string(),
            };
            strip_braces(&reordered)
        })
        .collect()
}

/// Shortest prefix of `s1` that tells it apart from `s2`, at least four
/// characters when they differ early.
fn differentiating_prefix(s1: &str, s2: &str) -> String {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let shorter = a.len().min(b.len());
    let take = match (0..shorter).find(|i| a[*i] != b[*i]) {
        Some(i) => (i + 1).max(4),
        None if a.len() == shorter => a.len(),
        None => shorter + 1,
    };
    a[..take.min(a.len())].iter().collect()
}

fn index_partitions(entries: &[Entry], size: usize) -> Vec<OutlineNode> {
    let sorted: Vec<usize> = (0..entries.len())
        .sorted_by(|a, b| entries[*a].key.cmp(&entries[*b].key))
        .collect();
    if sorted.len() < size {
        return sorted.iter().map(|i| leaf(entries, *i)).collect();
    }

    let chunks: Vec<&[usize]> = sorted.chunks(size).collect();
    let key = |i: usize| entries[i].key.as_str();
    let mut previous = key(sorted[0]);
    let mut labelled: Vec<(String, String, OutlineNode)> = Vec::new();
    for (n, chunk) in chunks.iter().enumerate() {
        let first = key(chunk[0]);
        let last = key(chunk[chunk.len() - 1]);
        let start = differentiating_prefix(first, previous);
        let end = match chunks.get(n + 1) {
            Some(next) => differentiating_prefix(last, key(next[0])),
            None => last.to_string(),
        };
        previous = last;
        let node = group(format!("{}...{}", start, end), entries, chunk);
        labelled.push((start, end, node));
    }

    while labelled.len() > size {
        labelled = labelled
            .into_iter()
            .chunks(size)
            .into_iter()
            .map(|chunk| {
                let children: Vec<(String, String, OutlineNode)> = chunk.collect();
                let start = children[0].0.clone();
                let end = children[children.len() - 1].1.clone();
                let node = OutlineNode::Group {
                    label: format!("{}...{}", start, end),
                    children: children.into_iter().map(|(_, _, node)| node).collect(),
                };
                (start, end, node)
            })
            .collect();
    }
    labelled.into_iter().map(|(_, _, node)| node).collect()
}
