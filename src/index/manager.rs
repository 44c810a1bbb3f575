use std::collections::HashSet;

use itertools::Itertools;
use once_cell::sync::Lazy;

use super::commands::builtin_entries;
use super::{CaseMode, Entry, ReferenceContainer, SortedIndex};

static BUILTINS: Lazy<SortedIndex> =
    Lazy::new(|| SortedIndex::from_unsorted(builtin_entries(), CaseMode::Sensitive));

/// Read-only view over a project's label, bibliography and command
/// containers.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceManager<'a> {
    labels: &'a ReferenceContainer,
    bibs: &'a ReferenceContainer,
    commands: &'a ReferenceContainer,
}

impl<'a> ReferenceManager<'a> {
    pub fn new(
        labels: &'a ReferenceContainer,
        bibs: &'a ReferenceContainer,
        commands: &'a ReferenceContainer,
    ) -> ReferenceManager<'a> {
        ReferenceManager {
            labels,
            bibs,
            commands,
        }
    }

    /// Labels starting with `prefix`; `None` if nothing matches.
    pub fn completions_ref(&self, prefix: &str) -> Option<&'a [Entry]> {
        self.labels.index().get_completions(prefix)
    }

    /// BibTeX records starting with `prefix`.
    pub fn completions_bib(&self, prefix: &str) -> Option<&'a [Entry]> {
        self.bibs.index().get_completions(prefix)
    }

    /// User and built-in commands starting with `prefix`, merged by name.
    /// A user command sorts before a built-in of the same name.
    pub fn completions_command(&self, prefix: &str) -> Option<Vec<&'a Entry>> {
        let user = self.commands.index().get_completions(prefix).unwrap_or_default();
        let builtin = BUILTINS.get_completions(prefix).unwrap_or_default();
        let merged: Vec<&Entry> = user
            .iter()
            .merge_by(builtin.iter(), |a, b| a.key <= b.key)
            .collect();
        (!merged.is_empty()).then_some(merged)
    }

    pub fn label(&self, key: &str) -> Option<&'a Entry> {
        self.labels.index().get_exact(key)
    }

    pub fn bib(&self, key: &str) -> Option<&'a Entry> {
        self.bibs.index().get_exact(key)
    }

    /// A user definition of `name`, else the built-in one.
    pub fn command(&self, name: &str) -> Option<&'a Entry> {
        self.commands
            .index()
            .get_exact(name)
            .or_else(|| BUILTINS.get_exact(name))
    }

    /// True if `name` is defined in a project file rather than built in.
    pub fn is_user_command(&self, name: &str) -> bool {
        self.commands.contains(name)
    }
}

/// BibTeX `@string` abbreviations. Names compare case-insensitively, as in
/// BibTeX itself.
#[derive(Debug, Clone)]
pub struct AbbrevManager {
    index: SortedIndex,
}

impl Default for AbbrevManager {
    fn default() -> Self {
        AbbrevManager {
            index: SortedIndex::new(CaseMode::Insensitive),
        }
    }
}

impl AbbrevManager {
    pub fn new() -> AbbrevManager {
        AbbrevManager::default()
    }

    pub fn set_abbrevs(&mut self, abbrevs: Vec<Entry>) {
        self.index = SortedIndex::from_unsorted(abbrevs, CaseMode::Insensitive);
    }

    pub fn get_completions(&self, prefix: &str) -> Option<&[Entry]> {
        self.index.get_completions(prefix)
    }

    pub fn get_exact(&self, name: &str) -> Option<&Entry> {
        self.index.get_exact(name)
    }

    /// The value of abbreviation `name`, for [`FieldValue::resolve`].
    ///
    /// Abbreviations used inside the value are expanded too. A name met
    /// again while it is being expanded stays as written.
    ///
    /// [`FieldValue::resolve`]: super::FieldValue::resolve
    pub fn value(&self, name: &str) -> Option<String> {
        self.expand(name, &mut HashSet::new())
    }

    fn expand(&self, name: &str, active: &mut HashSet<String>) -> Option<String> {
        let entry = self.get_exact(name)?;
        let key = entry.key.to_lowercase();
        if !active.insert(key.clone()) {
            log::debug!("Abbreviation '{}' refers to itself", entry.key);
            return None;
        }
        let expanded = match entry.fields.get("value") {
            Some(value) => value.resolve(|inner| self.expand(inner, active)),
            None => entry.info.clone(),
        };
        active.remove(&key);
        Some(expanded)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
