//! A directory of LaTeX and BibTeX files and the indexes built from them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use itertools::Itertools;
use rayon::prelude::*;
use ropey::Rope;
use walkdir::WalkDir;

use crate::bib::{self, BibParseResult};
use crate::config::Settings;
use crate::index::{AbbrevManager, CaseMode, ReferenceContainer, ReferenceManager};
use crate::latex::{self, TexParseResult};

mod graph;

pub use graph::{resolve_target, with_extension, EdgeKind, IncludeGraph};

/// The parsed form of one project file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Tex(TexParseResult),
    Bib(BibParseResult),
}

impl Document {
    pub fn as_tex(&self) -> Option<&TexParseResult> {
        match self {
            Document::Tex(tex) => Some(tex),
            Document::Bib(_) => None,
        }
    }

    pub fn as_bib(&self) -> Option<&BibParseResult> {
        match self {
            Document::Bib(bib) => Some(bib),
            Document::Tex(_) => None,
        }
    }
}

pub fn is_project_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("tex") | Some("bib")
    )
}

/// One file parsed outside of any lock, ready to be swapped in.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    path: PathBuf,
    rope: Rope,
    document: Document,
}

impl ParsedFile {
    pub fn parse(settings: &Settings, path: &Path, text: &str) -> ParsedFile {
        let document = match path.extension().and_then(|e| e.to_str()) {
            Some("bib") => Document::Bib(bib::parse_with(text, &settings.parse_options())),
            _ => Document::Tex(latex::parse(text, settings)),
        };
        ParsedFile {
            path: path.to_path_buf(),
            rope: Rope::from_str(text),
            document,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Project {
    root_dir: PathBuf,
    settings: Settings,
    documents: HashMap<PathBuf, Document>,
    ropes: HashMap<PathBuf, Rope>,
    labels: ReferenceContainer,
    citations: ReferenceContainer,
    commands: ReferenceContainer,
    bibs: ReferenceContainer,
    abbrev_sources: ReferenceContainer,
    abbrevs: AbbrevManager,
    graph: IncludeGraph,
}

impl Project {
    fn empty(settings: &Settings, root_dir: &Path) -> Project {
        Project {
            root_dir: root_dir.to_path_buf(),
            settings: settings.clone(),
            documents: HashMap::new(),
            ropes: HashMap::new(),
            labels: ReferenceContainer::new(settings.case_matching),
            citations: ReferenceContainer::new(CaseMode::Sensitive),
            commands: ReferenceContainer::new(CaseMode::Sensitive),
            bibs: ReferenceContainer::new(CaseMode::Sensitive),
            abbrev_sources: ReferenceContainer::new(CaseMode::Insensitive),
            abbrevs: AbbrevManager::new(),
            graph: IncludeGraph::default(),
        }
    }

    /// Parses every `.tex` and `.bib` file under `root_dir`. Hidden files
    /// and directories are skipped.
    pub fn construct(settings: &Settings, root_dir: &Path) -> Result<Project, std::io::Error> {
        if !root_dir.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", root_dir.display()),
            ));
        }
        let file_paths = WalkDir::new(root_dir)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e
                        .file_name()
                        .to_str()
                        .map(|s| s.starts_with('.'))
                        .unwrap_or(false)
            })
            .flatten()
            .filter(|f| f.file_type().is_file() && is_project_file(f.path()))
            .collect_vec();

        let parsed: Vec<ParsedFile> = file_paths
            .par_iter()
            .filter_map(|entry| match std::fs::read_to_string(entry.path()) {
                Ok(text) => Some(ParsedFile::parse(settings, entry.path(), &text)),
                Err(err) => {
                    log::warn!("Skipping {}: {err}", entry.path().display());
                    None
                }
            })
            .collect();

        let mut project = Project::empty(settings, root_dir);
        for file in parsed {
            project.store(file);
        }
        project.organize();
        log::info!(
            "Indexed {} files under {}",
            project.documents.len(),
            root_dir.display()
        );
        Ok(project)
    }

    /// Re-parses one file and replaces its data. Returns true if any label,
    /// citation, command, record or abbreviation changed.
    pub fn update_file(&mut self, path: &Path, text: &str) -> bool {
        let parsed = ParsedFile::parse(&self.settings, path, text);
        self.apply(parsed)
    }

    /// Swaps in a file parsed with [`ParsedFile::parse`].
    pub fn apply(&mut self, parsed: ParsedFile) -> bool {
        let changed = self.store(parsed);
        if changed {
            self.organize();
        } else {
            // file references may move without any entry changing
            self.graph = IncludeGraph::build(&self.root_dir, &self.documents);
        }
        changed
    }

    pub fn remove_file(&mut self, path: &Path) -> bool {
        if self.documents.remove(path).is_none() {
            return false;
        }
        self.ropes.remove(path);
        let name = self.file_name(path);
        let mut changed = false;
        for container in self.containers_mut() {
            changed |= container.remove_source(&name);
        }
        self.abbrevs
            .set_abbrevs(self.abbrev_sources.sorted_entries().to_vec());
        self.graph = IncludeGraph::build(&self.root_dir, &self.documents);
        log::debug!("Removed {name}");
        changed
    }

    /// Stores the per-file sub-lists without rebuilding the merged indexes.
    fn store(&mut self, parsed: ParsedFile) -> bool {
        let name = self.file_name(&parsed.path);
        let mut changed = false;
        match &parsed.document {
            Document::Tex(tex) => {
                changed |= self.labels.add_source(&name, tex.labels.clone());
                changed |= self.citations.add_source(&name, tex.citations.clone());
                changed |= self.commands.add_source(&name, tex.commands.clone());
            }
            Document::Bib(bib) => {
                changed |= self.bibs.add_source(&name, bib.entries.clone());
                changed |= self
                    .abbrev_sources
                    .add_source(&name, bib.abbreviations.clone());
            }
        }
        log::debug!("Parsed {name}, changed: {changed}");
        self.ropes.insert(parsed.path.clone(), parsed.rope);
        self.documents.insert(parsed.path, parsed.document);
        changed
    }

    fn organize(&mut self) {
        for container in self.containers_mut() {
            container.organize();
        }
        self.abbrevs
            .set_abbrevs(self.abbrev_sources.sorted_entries().to_vec());
        self.graph = IncludeGraph::build(&self.root_dir, &self.documents);
    }

    fn containers_mut(&mut self) -> [&mut ReferenceContainer; 5] {
        [
            &mut self.labels,
            &mut self.citations,
            &mut self.commands,
            &mut self.bibs,
            &mut self.abbrev_sources,
        ]
    }

    pub fn manager(&self) -> ReferenceManager<'_> {
        ReferenceManager::new(&self.labels, &self.bibs, &self.commands)
    }

    pub fn abbrevs(&self) -> &AbbrevManager {
        &self.abbrevs
    }

    /// Citations of the whole project, merged.
    pub fn citations(&self) -> &ReferenceContainer {
        &self.citations
    }

    pub fn document(&self, path: &Path) -> Option<&Document> {
        self.documents.get(path)
    }

    pub fn rope(&self, path: &Path) -> Option<&Rope> {
        self.ropes.get(path)
    }

    /// All parsed files, sorted by path.
    pub fn files(&self) -> Vec<&Path> {
        let mut files: Vec<&Path> = self.documents.keys().map(PathBuf::as_path).collect();
        files.sort();
        files
    }

    pub fn graph(&self) -> &IncludeGraph {
        &self.graph
    }

    pub fn root_dir(&self) -> &PathBuf {
        &self.root_dir
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The root-relative, `/`-separated name entries are tagged with.
    pub fn file_name(&self, path: &Path) -> String {
        let relative = pathdiff::diff_paths(path, &self.root_dir).unwrap_or_else(|| path.into());
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .join("/")
    }

    /// Inverse of [`Project::file_name`].
    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.root_dir.join(file_name)
    }
}

/// A project shared between an editor's threads.
///
/// Writers parse outside the lock and only swap the results in under it,
/// so readers never see a file half replaced.
#[derive(Debug, Clone)]
pub struct SharedProject(Arc<RwLock<Project>>);

impl SharedProject {
    pub fn new(project: Project) -> SharedProject {
        SharedProject(Arc::new(RwLock::new(project)))
    }

    /// Runs a query under the read lock.
    pub fn read<R>(&self, query: impl FnOnce(&Project) -> R) -> R {
        // writers replace whole sub-lists, so a poisoned lock still holds
        // consistent data
        let project = self.0.read().unwrap_or_else(PoisonError::into_inner);
        query(&project)
    }

    pub fn update_file(&self, path: &Path, text: &str) -> bool {
        let settings = self.read(|project| project.settings.clone());
        let parsed = ParsedFile::parse(&settings, path, text);
        let mut project = self.0.write().unwrap_or_else(PoisonError::into_inner);
        project.apply(parsed)
    }

    pub fn remove_file(&self, path: &Path) -> bool {
        let mut project = self.0.write().unwrap_or_else(PoisonError::into_inner);
        project.remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::test_utils::create_test_project_dir;

    fn setup() -> (tempfile::TempDir, PathBuf, Project) {
        let (temp_dir, root) = create_test_project_dir();
        fs::write(
            root.join("main.tex"),
            "\\section{Intro}\\label{sec:intro}\n\\input{chapter}\n\\cite{knuth84}\n\\bibliography{refs}\n",
        )
        .unwrap();
        fs::write(
            root.join("chapter.tex"),
            "\\newcommand{\\R}{\\mathbb{R}}\n\\label{sec:chapter}\n",
        )
        .unwrap();
        fs::write(
            root.join("refs.bib"),
            "@string{acm = \"ACM\"}\n@book{knuth84, author={Knuth}, title={TeX}, publisher=acm, year=1984}\n",
        )
        .unwrap();
        fs::create_dir(root.join(".hidden")).unwrap();
        fs::write(root.join(".hidden/skip.tex"), "\\label{hidden}").unwrap();
        let project = Project::construct(&Settings::default(), &root).unwrap();
        (temp_dir, root, project)
    }

    /// Test: Construction indexes every visible file.
    #[test]
    fn test_construct_indexes_files() {
        let (_temp_dir, root, project) = setup();
        assert_eq!(project.files().len(), 3, "hidden directory must be skipped");

        let manager = project.manager();
        let label = manager.label("sec:chapter").expect("label indexed");
        assert_eq!(label.file_name.as_deref(), Some("chapter.tex"));
        assert!(manager.label("hidden").is_none());
        assert!(manager.bib("knuth84").is_some());
        assert!(manager.is_user_command("R"));
        assert_eq!(project.abbrevs().value("ACM").as_deref(), Some("ACM"));
        assert!(project.citations().contains("knuth84"));

        assert_eq!(project.graph().main_documents(), vec![root.join("main.tex").as_path()]);
    }

    #[test]
    fn test_update_file_reports_changes() {
        let (_temp_dir, root, mut project) = setup();
        let chapter = root.join("chapter.tex");

        // same labels and commands, only prose changed
        assert!(!project.update_file(
            &chapter,
            "\\newcommand{\\R}{\\mathbb{R}}\n\\label{sec:chapter}\n"
        ));
        assert!(project.update_file(&chapter, "\\label{sec:renamed}\n"));
        assert!(project.manager().label("sec:renamed").is_some());
        assert!(project.manager().label("sec:chapter").is_none());
        assert!(!project.manager().is_user_command("R"));

        // a new file is added
        let extra = root.join("extra.tex");
        assert!(project.update_file(&extra, "\\label{extra}"));
        assert_eq!(project.files().len(), 4);

        assert!(project.remove_file(&extra));
        assert!(!project.remove_file(&extra));
        assert!(project.manager().label("extra").is_none());
    }

    #[test]
    fn test_file_name_is_root_relative() {
        let (_temp_dir, root, project) = setup();
        assert_eq!(project.file_name(&root.join("sub").join("a.tex")), "sub/a.tex");
        assert_eq!(project.path_of("sub/a.tex"), root.join("sub/a.tex"));
    }

    #[test]
    fn test_shared_project_swaps_under_lock() {
        let (_temp_dir, root, project) = setup();
        let shared = SharedProject::new(project);
        let reader = shared.clone();

        let handle = std::thread::spawn(move || {
            shared.update_file(&root.join("main.tex"), "\\label{threaded}")
        });
        assert!(handle.join().unwrap());
        assert!(reader.read(|p| p.manager().label("threaded").is_some()));
    }

    #[test]
    fn test_construct_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Project::construct(&Settings::default(), &dir.path().join("nope")).is_err());
    }
}
