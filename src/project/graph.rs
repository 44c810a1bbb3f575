//! The include graph of a project.
//!
//! Each `.tex` and `.bib` file is a node; `\input`, `\include` and
//! `\bibliography` commands that resolve to a project file are edges from
//! the referring file to the target. Targets that resolve to nothing are
//! left out of the graph and show up as navigation errors instead.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use petgraph::algo::tarjan_scc;
use petgraph::prelude::*;
use serde::{Deserialize, Serialize};

use crate::latex::IncludeKind;

use super::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Input,
    Include,
    Bibliography,
}

impl From<IncludeKind> for EdgeKind {
    fn from(kind: IncludeKind) -> Self {
        match kind {
            IncludeKind::Input => EdgeKind::Input,
            IncludeKind::Include => EdgeKind::Include,
        }
    }
}

/// Appends `.ext` unless `target` already ends with it.
pub fn with_extension(target: &str, ext: &str) -> String {
    let suffix = format!(".{ext}");
    if target.ends_with(&suffix) {
        target.to_string()
    } else {
        format!("{target}{suffix}")
    }
}

/// Resolves a file argument the way LaTeX does for a project: relative to
/// the project root first, then to the directory of the referring file.
pub fn resolve_target(
    root: &Path,
    from: &Path,
    target: &str,
    ext: &str,
    exists: impl Fn(&Path) -> bool,
) -> Option<PathBuf> {
    let file = with_extension(target, ext);
    let from_root = root.join(&file);
    if exists(&from_root) {
        return Some(from_root);
    }
    let sibling = from.parent()?.join(&file);
    exists(&sibling).then_some(sibling)
}

#[derive(Debug, Clone, Default)]
pub struct IncludeGraph {
    graph: DiGraph<PathBuf, EdgeKind>,
    nodes: HashMap<PathBuf, NodeIndex>,
}

impl IncludeGraph {
    /// Builds the graph for all parsed documents of a project.
    pub fn build(root: &Path, documents: &HashMap<PathBuf, Document>) -> IncludeGraph {
        let mut graph = IncludeGraph::default();
        // sorted so node indices do not depend on hash order
        let mut paths: Vec<&PathBuf> = documents.keys().collect();
        paths.sort();
        for path in &paths {
            graph.node(path);
        }

        let exists = |p: &Path| documents.contains_key(p);
        for path in paths {
            let Some(tex) = documents.get(path).and_then(Document::as_tex) else {
                continue;
            };
            for include in &tex.includes {
                match resolve_target(root, path, &include.target, "tex", exists) {
                    Some(target) => graph.add_edge(path, &target, include.kind.into()),
                    None => log::debug!(
                        "{} includes missing file '{}'",
                        path.display(),
                        include.target
                    ),
                }
            }
            for bib in &tex.bibliography {
                if let Some(target) = resolve_target(root, path, bib, "bib", exists) {
                    graph.add_edge(path, &target, EdgeKind::Bibliography);
                }
            }
        }
        graph
    }

    fn node(&mut self, path: &Path) -> NodeIndex {
        if let Some(index) = self.nodes.get(path) {
            return *index;
        }
        let index = self.graph.add_node(path.to_path_buf());
        self.nodes.insert(path.to_path_buf(), index);
        index
    }

    fn add_edge(&mut self, from: &Path, to: &Path, kind: EdgeKind) {
        let from = self.node(from);
        let to = self.node(to);
        self.graph.update_edge(from, to, kind);
    }

    /// Files directly referenced by `path`, with the kind of reference.
    pub fn targets(&self, path: &Path) -> Vec<(&Path, EdgeKind)> {
        let Some(index) = self.nodes.get(path) else {
            return vec![];
        };
        let mut targets: Vec<_> = self
            .graph
            .edges(*index)
            .map(|edge| (self.graph[edge.target()].as_path(), *edge.weight()))
            .collect();
        targets.sort();
        targets
    }

    /// Every file reachable from `root`, in depth-first order, without
    /// `root` itself.
    pub fn dependencies(&self, root: &Path) -> Vec<&Path> {
        let Some(start) = self.nodes.get(root) else {
            return vec![];
        };
        let mut dfs = Dfs::new(&self.graph, *start);
        let mut found = Vec::new();
        while let Some(node) = dfs.next(&self.graph) {
            if node != *start {
                found.push(self.graph[node].as_path());
            }
        }
        found
    }

    /// TeX files that no other file inputs or includes.
    pub fn main_documents(&self) -> Vec<&Path> {
        let mut mains: Vec<&Path> = self
            .graph
            .node_indices()
            .filter(|node| {
                let path = &self.graph[*node];
                path.extension().is_some_and(|ext| ext == "tex")
                    && self
                        .graph
                        .neighbors_directed(*node, Direction::Incoming)
                        .all(|from| from == *node)
            })
            .map(|node| self.graph[node].as_path())
            .collect();
        mains.sort();
        mains
    }

    /// Groups of files that include each other, each sorted by path.
    ///
    /// A file that includes itself is a cycle of one.
    pub fn cycles(&self) -> Vec<Vec<&Path>> {
        let mut cycles: Vec<Vec<&Path>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|node| self.graph.contains_edge(*node, *node))
            })
            .map(|component| {
                let mut paths: Vec<&Path> = component
                    .into_iter()
                    .map(|node| self.graph[node].as_path())
                    .collect();
                paths.sort();
                paths
            })
            .collect();
        cycles.sort();
        cycles
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn tex(text: &str) -> Document {
        Document::Tex(crate::latex::parse(text, &Settings::default()))
    }

    fn bib() -> Document {
        Document::Bib(crate::bib::parse(""))
    }

    fn project(files: Vec<(&str, Document)>) -> (PathBuf, HashMap<PathBuf, Document>) {
        let root = PathBuf::from("/project");
        let documents = files
            .into_iter()
            .map(|(name, doc)| (root.join(name), doc))
            .collect();
        (root, documents)
    }

    #[test]
    fn test_edges_and_main_documents() {
        let (root, documents) = project(vec![
            ("main.tex", tex("\\input{chapters/one}\n\\include{two}\n\\bibliography{refs}")),
            ("chapters/one.tex", tex("one")),
            ("two.tex", tex("\\input{missing}")),
            ("refs.bib", bib()),
            ("standalone.tex", tex("")),
        ]);
        let graph = IncludeGraph::build(&root, &documents);

        let main = root.join("main.tex");
        let targets: Vec<_> = graph.targets(&main);
        assert_eq!(
            targets,
            vec![
                (root.join("chapters/one.tex").as_path(), EdgeKind::Input),
                (root.join("refs.bib").as_path(), EdgeKind::Bibliography),
                (root.join("two.tex").as_path(), EdgeKind::Include),
            ]
        );
        assert_eq!(
            graph.main_documents(),
            vec![main.as_path(), root.join("standalone.tex").as_path()]
        );
        assert_eq!(graph.dependencies(&main).len(), 3);
        assert!(graph.cycles().is_empty());
    }

    /// Test: A chapter inputs a file next to it before the root lookup fails.
    #[test]
    fn test_sibling_lookup() {
        let (root, documents) = project(vec![
            ("chapters/one.tex", tex("\\input{part}")),
            ("chapters/part.tex", tex("")),
        ]);
        let graph = IncludeGraph::build(&root, &documents);
        assert_eq!(
            graph.dependencies(&root.join("chapters/one.tex")),
            vec![root.join("chapters/part.tex").as_path()]
        );
    }

    #[test]
    fn test_cycles() {
        let (root, documents) = project(vec![
            ("a.tex", tex("\\input{b}")),
            ("b.tex", tex("\\input{a.tex}")),
            ("self.tex", tex("\\include{self}")),
        ]);
        let graph = IncludeGraph::build(&root, &documents);
        assert_eq!(
            graph.cycles(),
            vec![
                vec![root.join("a.tex").as_path(), root.join("b.tex").as_path()],
                vec![root.join("self.tex").as_path()],
            ]
        );
        // self-inclusion does not stop a file from being a main document
        assert_eq!(graph.main_documents(), vec![root.join("self.tex").as_path()]);
    }

    #[test]
    fn test_with_extension() {
        assert_eq!(with_extension("intro", "tex"), "intro.tex");
        assert_eq!(with_extension("intro.tex", "tex"), "intro.tex");
        assert_eq!(with_extension("refs.bib", "tex"), "refs.bib.tex");
    }
}
