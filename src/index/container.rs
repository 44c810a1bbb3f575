use std::collections::BTreeMap;

use crate::latex::DocumentReference;

use super::{CaseMode, Entry, SortedIndex};

/// Entries of one kind for a whole project, kept per source file and merged
/// into one sorted index by [`ReferenceContainer::organize`].
#[derive(Debug, Clone, Default)]
pub struct ReferenceContainer {
    sources: BTreeMap<String, Vec<Entry>>,
    sorted: SortedIndex,
}

impl ReferenceContainer {
    pub fn new(mode: CaseMode) -> ReferenceContainer {
        ReferenceContainer {
            sources: BTreeMap::new(),
            sorted: SortedIndex::new(mode),
        }
    }

    /// Stores `entries` as the sub-list of `file`, tagging each with the
    /// file name. The merged index is not rebuilt until [`organize`] runs.
    ///
    /// Returns true if the sub-list differs from the one it replaced.
    ///
    /// [`organize`]: ReferenceContainer::organize
    pub fn add_source(&mut self, file: &str, mut entries: Vec<Entry>) -> bool {
        for entry in entries.iter_mut() {
            entry.file_name = Some(file.to_string());
        }
        match self.sources.insert(file.to_string(), entries) {
            Some(old) => Some(&old) != self.sources.get(file),
            None => true,
        }
    }

    /// Replaces the sub-list of a file that is already known and rebuilds
    /// the index. Unknown files are ignored and report no change.
    pub fn update_source(&mut self, file: &str, entries: Vec<Entry>) -> bool {
        if !self.sources.contains_key(file) {
            return false;
        }
        let changed = self.add_source(file, entries);
        if changed {
            self.organize();
        }
        changed
    }

    /// Drops the sub-list of `file` and rebuilds the index.
    pub fn remove_source(&mut self, file: &str) -> bool {
        let removed = self.sources.remove(file).is_some();
        if removed {
            self.organize();
        }
        removed
    }

    /// Merges all sub-lists in file-name order and stably sorts them.
    pub fn organize(&mut self) {
        let merged: Vec<Entry> = self.sources.values().flatten().cloned().collect();
        self.sorted = SortedIndex::from_unsorted(merged, self.sorted.mode());
    }

    /// Restricts the container to `files`: sub-lists of files still listed
    /// are kept, all others dropped. Returns the listed files that have no
    /// sub-list yet and need to be parsed.
    pub fn update_file_set(&mut self, files: &[String]) -> Vec<String> {
        let mut kept = BTreeMap::new();
        let mut to_parse = Vec::new();
        for file in files {
            match self.sources.remove(file) {
                Some(entries) => {
                    kept.insert(file.clone(), entries);
                }
                None if !kept.contains_key(file) => to_parse.push(file.clone()),
                None => {}
            }
        }
        self.sources = kept;
        self.organize();
        to_parse
    }

    /// True if the container holds exactly the sub-lists of `files`.
    pub fn check_freshness(&self, files: &[String]) -> bool {
        files.len() == self.sources.len() && files.iter().all(|f| self.sources.contains_key(f))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sorted.contains(key)
    }

    /// Removes every reference whose key is defined in this container,
    /// leaving only the unresolved ones.
    pub fn remove_false_references(&self, references: &mut Vec<DocumentReference>) {
        references.retain(|reference| !self.contains(&reference.key));
    }

    pub fn sorted_entries(&self) -> &[Entry] {
        self.sorted.entries()
    }

    pub fn index(&self) -> &SortedIndex {
        &self.sorted
    }

    pub fn source(&self, file: &str) -> Option<&[Entry]> {
        self.sources.get(file).map(Vec::as_slice)
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::EntryKind;
    use crate::latex::ReferenceKind;

    fn entries(keys: &[&str]) -> Vec<Entry> {
        keys.iter()
            .map(|key| Entry::new(*key, EntryKind::Label, 1))
            .collect()
    }

    fn sorted_keys(container: &ReferenceContainer) -> Vec<&str> {
        container.sorted_entries().iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn test_add_and_organize_merges_files() {
        let mut container = ReferenceContainer::new(CaseMode::Sensitive);
        assert!(container.add_source("b.tex", entries(&["z", "m"])));
        assert!(container.add_source("a.tex", entries(&["m", "a"])));
        container.organize();

        assert_eq!(sorted_keys(&container), vec!["a", "m", "m", "z"]);
        // equal keys come in file-name order
        let files: Vec<_> = container
            .sorted_entries()
            .iter()
            .filter(|e| e.key == "m")
            .map(|e| e.file_name.as_deref().unwrap())
            .collect();
        assert_eq!(files, vec!["a.tex", "b.tex"]);
    }

    #[test]
    fn test_update_reports_structural_change() {
        let mut container = ReferenceContainer::new(CaseMode::Sensitive);
        container.add_source("a.tex", entries(&["x"]));
        container.organize();

        assert!(!container.update_source("a.tex", entries(&["x"])));
        assert!(container.update_source("a.tex", entries(&["x", "y"])));
        assert_eq!(sorted_keys(&container), vec!["x", "y"]);

        // unknown file is not added by update
        assert!(!container.update_source("new.tex", entries(&["n"])));
        assert!(!container.contains("n"));
    }

    #[test]
    fn test_update_file_set_reports_missing() {
        let mut container = ReferenceContainer::new(CaseMode::Sensitive);
        container.add_source("a.bib", entries(&["a1"]));
        container.add_source("b.bib", entries(&["b1"]));
        container.organize();

        let wanted = vec!["b.bib".to_string(), "c.bib".to_string()];
        assert!(!container.check_freshness(&wanted));
        let to_parse = container.update_file_set(&wanted);

        assert_eq!(to_parse, vec!["c.bib".to_string()]);
        assert_eq!(container.files().collect::<Vec<_>>(), vec!["b.bib"]);
        assert!(!container.contains("a1"));

        container.add_source("c.bib", entries(&["c1"]));
        assert!(container.check_freshness(&wanted));
    }

    #[test]
    fn test_remove_false_references() {
        let mut container = ReferenceContainer::new(CaseMode::Sensitive);
        container.add_source("a.tex", entries(&["known"]));
        container.organize();

        let reference = |key: &str| DocumentReference {
            key: key.to_string(),
            line: 1,
            column: 0,
            length: key.len(),
            kind: ReferenceKind::Ref,
        };
        let mut refs = vec![reference("known"), reference("unknown")];
        container.remove_false_references(&mut refs);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].key, "unknown");
    }

    #[test]
    fn test_remove_source() {
        let mut container = ReferenceContainer::new(CaseMode::Sensitive);
        container.add_source("a.tex", entries(&["a"]));
        container.organize();
        assert!(container.remove_source("a.tex"));
        assert!(!container.remove_source("a.tex"));
        assert!(container.is_empty());
        assert!(container.sorted_entries().is_empty());
    }
}
