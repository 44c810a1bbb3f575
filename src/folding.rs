//! Fold regions for BibTeX entries that survive re-parses.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::index::Entry;
use crate::position::{LineIndex, Span};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldRegion {
    pub key: String,
    pub span: Span,
    /// 1-based, like the entry lines.
    pub start_line: usize,
    pub end_line: usize,
    pub collapsed: bool,
}

/// Keys added and removed by one [`FoldingModel::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldUpdate {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// Fold regions of one document.
///
/// Regions are matched to entries by key rather than position, so a region
/// the user collapsed stays collapsed when edits above it move it.
#[derive(Debug, Clone, Default)]
pub struct FoldingModel {
    regions: Vec<FoldRegion>,
    initialized: bool,
}

impl FoldingModel {
    pub fn new() -> FoldingModel {
        FoldingModel::default()
    }

    /// Recomputes the regions for a freshly parsed entry list.
    ///
    /// The first call collapses every region if `fold_initially` is set;
    /// later calls keep the state of matched regions and add new ones
    /// expanded.
    pub fn update(&mut self, entries: &[Entry], lines: &LineIndex, fold_initially: bool) -> FoldUpdate {
        let mut previous: HashMap<String, VecDeque<FoldRegion>> = HashMap::new();
        for region in self.regions.drain(..) {
            previous.entry(region.key.clone()).or_default().push_back(region);
        }

        let mut update = FoldUpdate::default();
        for entry in entries {
            let mut entry = entry.clone();
            let Some(span) = entry.resolve_position(lines) else {
                log::warn!("Entry '{}' lies outside the document, no fold region", entry.key);
                continue;
            };
            let collapsed = match previous.get_mut(&entry.key).and_then(VecDeque::pop_front) {
                Some(old) => old.collapsed,
                None if !self.initialized => fold_initially,
                None => {
                    update.added.push(entry.key.clone());
                    false
                }
            };
            self.regions.push(FoldRegion {
                key: entry.key,
                span,
                start_line: entry.start_line,
                end_line: entry.end_line,
                collapsed,
            });
        }

        let mut removed: Vec<String> = previous
            .into_values()
            .flatten()
            .map(|region| region.key)
            .collect();
        removed.sort();
        update.removed = removed;
        if !self.initialized {
            update.added = self.regions.iter().map(|r| r.key.clone()).collect();
            self.initialized = true;
        }
        update
    }

    /// Sets the collapsed state of the first region for `key`. Returns false
    /// if there is no such region.
    pub fn set_collapsed(&mut self, key: &str, collapsed: bool) -> bool {
        match self.regions.iter_mut().find(|r| r.key == key) {
            Some(region) => {
                region.collapsed = collapsed;
                true
            }
            None => false,
        }
    }

    pub fn regions(&self) -> &[FoldRegion] {
        &self.regions
    }
}
