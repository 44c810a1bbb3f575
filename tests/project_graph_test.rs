//! Integration tests for the include graph of a project.
//!
//! Edges come from `\input`, `\include` and `\bibliography`; targets are
//! looked up from the project root first, then next to the referring file.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use texlipse::config::Settings;
use texlipse::project::{EdgeKind, Project};

fn create_project(files: &[(&str, &str)]) -> (TempDir, PathBuf, Project) {
    let _ = env_logger::builder().is_test(true).try_init();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let root = temp_dir.path().join("project");
    for (name, content) in files {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
    }
    let project = Project::construct(&Settings::default(), &root).unwrap();
    (temp_dir, root, project)
}

fn names<'a>(project: &Project, paths: impl IntoIterator<Item = &'a Path>) -> Vec<String> {
    paths.into_iter().map(|p| project.file_name(p)).collect()
}

#[test]
fn test_targets_and_dependencies() {
    let (_temp_dir, root, project) = create_project(&[
        ("thesis.tex", "\\include{chapters/one}\n\\bibliography{refs}\n"),
        ("chapters/one.tex", "\\input{figure}\n"),
        ("chapters/figure.tex", "A figure."),
        ("refs.bib", "@misc{a, note={x}}"),
    ]);
    let graph = project.graph();
    let thesis = root.join("thesis.tex");

    let targets: Vec<(String, EdgeKind)> = graph
        .targets(&thesis)
        .into_iter()
        .map(|(path, kind)| (project.file_name(path), kind))
        .collect();
    assert_eq!(
        targets,
        vec![
            ("chapters/one.tex".to_string(), EdgeKind::Include),
            ("refs.bib".to_string(), EdgeKind::Bibliography),
        ]
    );

    // figure is found next to one.tex, not at the root
    let mut dependencies = names(&project, graph.dependencies(&thesis));
    dependencies.sort();
    assert_eq!(
        dependencies,
        vec!["chapters/figure.tex", "chapters/one.tex", "refs.bib"]
    );
    assert_eq!(names(&project, graph.main_documents()), vec!["thesis.tex"]);
}

#[test]
fn test_cycles_are_grouped() {
    let (_temp_dir, _root, project) = create_project(&[
        ("a.tex", "\\input{b}"),
        ("b.tex", "\\input{a}"),
        ("self.tex", "\\input{self}"),
        ("main.tex", "\\input{a}"),
    ]);

    let cycles: Vec<Vec<String>> = project
        .graph()
        .cycles()
        .into_iter()
        .map(|cycle| names(&project, cycle))
        .collect();
    assert_eq!(cycles, vec![vec!["a.tex", "b.tex"], vec!["self.tex"]]);
    assert_eq!(names(&project, project.graph().main_documents()), vec!["main.tex", "self.tex"]);
}

#[test]
fn test_removing_a_file_drops_its_edges() {
    let (_temp_dir, root, mut project) = create_project(&[
        ("main.tex", "\\input{part}"),
        ("part.tex", "\\label{x}"),
    ]);
    assert_eq!(project.graph().dependencies(&root.join("main.tex")).len(), 1);

    assert!(project.remove_file(&root.join("part.tex")));
    assert!(project.graph().dependencies(&root.join("main.tex")).is_empty());
    assert!(project.manager().label("x").is_none());
}
