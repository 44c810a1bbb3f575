use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use crate::bib::{parse_with, BibOutline, OutlineNode, SortMode};
use crate::config::Settings;
use crate::diagnostics::{diagnostics, Diagnostic};
use crate::gotodef::goto_declaration;
use crate::index::Entry;
use crate::latex::count_words;
use crate::project::Project;

#[derive(Parser, Debug)]
#[command(name = "texlipse")]
#[command(author, version)]
#[command(about = "Checks, outlines and queries LaTeX and BibTeX projects")]
#[command(after_help = "\
EXAMPLES:

    # Report undefined references, include cycles and BibTeX errors
    texlipse check thesis/

    # Group the records of a BibTeX file by year
    texlipse outline refs.bib --sort year

    # Bib keys starting with knu
    texlipse complete thesis/ --kind cite --prefix knu

CONFIGURATION:

Settings are read from ~/.config/texlipse/settings.toml and then from
<project>/.texlipse.toml, where later values win.")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Diagnostics for every file of a project
    Check { dir: PathBuf },
    /// The outline tree of a BibTeX file
    Outline {
        file: PathBuf,
        /// natural, year, author, journal or index
        #[arg(long, default_value = "natural")]
        sort: SortMode,
    },
    /// Known keys of one kind starting with a prefix
    Complete {
        dir: PathBuf,
        #[arg(long, value_enum)]
        kind: KeyKind,
        #[arg(long, default_value = "")]
        prefix: String,
    },
    /// Words of running text in a LaTeX file
    Wordcount { file: PathBuf },
    /// The declaration of whatever is named at a byte offset of a file
    Goto {
        dir: PathBuf,
        /// Relative to `dir` unless absolute
        file: PathBuf,
        offset: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyKind {
    Ref,
    Cite,
    Command,
    Abbrev,
}

fn load_project(dir: &Path) -> anyhow::Result<Project> {
    let root = fs::canonicalize(dir).with_context(|| format!("Can't open {}", dir.display()))?;
    let settings = Settings::new(&root)?;
    let project = Project::construct(&settings, &root)
        .with_context(|| format!("Can't read project {}", root.display()))?;
    Ok(project)
}

/// Runs one command, writing its output to `out`.
pub fn run(cli: &Cli, out: &mut impl Write) -> anyhow::Result<()> {
    log::debug!("Running {:?}", cli.command);
    match &cli.command {
        Commands::Check { dir } => check(dir, cli.json, out),
        Commands::Outline { file, sort } => outline(file, *sort, cli.json, out),
        Commands::Complete { dir, kind, prefix } => complete(dir, *kind, prefix, cli.json, out),
        Commands::Wordcount { file } => {
            let text = fs::read_to_string(file)
                .with_context(|| format!("Can't read {}", file.display()))?;
            let words = count_words(&text);
            if cli.json {
                writeln!(out, "{}", json!({ "file": file, "words": words }))?;
            } else {
                writeln!(out, "{}", words)?;
            }
            Ok(())
        }
        Commands::Goto { dir, file, offset } => {
            let project = load_project(dir)?;
            let path = if file.is_absolute() {
                fs::canonicalize(file)?
            } else {
                project.root_dir().join(file)
            };
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Can't read {}", path.display()))?;
            let declaration = goto_declaration(&project, &path, &text, *offset)?;
            if cli.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&declaration)?)?;
            } else {
                writeln!(
                    out,
                    "{}:{}:{}",
                    declaration.path.display(),
                    declaration.line,
                    declaration.column
                )?;
            }
            Ok(())
        }
    }
}

fn check(dir: &Path, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    let project = load_project(dir)?;
    let found: Vec<Diagnostic> = project
        .files()
        .into_iter()
        .flat_map(|path| diagnostics(&project, project.settings(), path))
        .collect();

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&found)?)?;
        return Ok(());
    }
    for diagnostic in &found {
        writeln!(
            out,
            "{}:{}:{}: {}: {}",
            diagnostic.file_name.as_deref().unwrap_or("<unknown>"),
            diagnostic.line,
            diagnostic.column,
            diagnostic.severity,
            diagnostic.message
        )?;
    }
    writeln!(out, "Found {} issue(s)", found.len())?;
    Ok(())
}

fn outline(file: &Path, sort: SortMode, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    let text =
        fs::read_to_string(file).with_context(|| format!("Can't read {}", file.display()))?;
    let settings = Settings::new(file.parent().unwrap_or(Path::new(".")))?;
    let parsed = parse_with(&text, &settings.parse_options());
    for error in &parsed.errors {
        log::warn!("{}:{}: {}", file.display(), error.line, error.message);
    }

    let mut outline = BibOutline::with_partition_size(parsed.entries, settings.partition_size)
        .with_abbreviations(parsed.abbreviations);
    let tree = outline.tree(sort).clone();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&tree)?)?;
    } else {
        write_tree(&tree, 0, out)?;
    }
    Ok(())
}

fn write_tree(node: &OutlineNode, depth: usize, out: &mut impl Write) -> std::io::Result<()> {
    // the root group is the file itself
    if depth > 0 {
        writeln!(out, "{}{}", "  ".repeat(depth - 1), node.label())?;
    }
    for child in node.children() {
        write_tree(child, depth + 1, out)?;
    }
    Ok(())
}

fn complete(
    dir: &Path,
    kind: KeyKind,
    prefix: &str,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let project = load_project(dir)?;
    let manager = project.manager();
    let entries: Vec<&Entry> = match kind {
        KeyKind::Ref => manager.completions_ref(prefix).unwrap_or_default().iter().collect(),
        KeyKind::Cite => manager.completions_bib(prefix).unwrap_or_default().iter().collect(),
        KeyKind::Command => manager.completions_command(prefix).unwrap_or_default(),
        KeyKind::Abbrev => project
            .abbrevs()
            .get_completions(prefix)
            .unwrap_or_default()
            .iter()
            .collect(),
    };

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else {
        for entry in entries {
            writeln!(out, "{}", entry.key)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_project_dir;

    fn run_args(args: &[&str]) -> anyhow::Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("texlipse").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        run(&cli, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    fn write_project(root: &Path) {
        fs::write(root.join("main.tex"), "\\section{Two words} one\n\\cite{knuth84} \\ref{none}\n")
            .unwrap();
        fs::write(
            root.join("refs.bib"),
            "@string{tug = \"TeX Users Group\"}\n@misc{knuth84, title={TeX}, year=1984}\n\
             @misc{knuth86, title={METAFONT}, year=1986}\n",
        )
        .unwrap();
    }

    #[test]
    fn test_check_lists_undefined_reference() {
        let (_temp_dir, root) = create_test_project_dir();
        write_project(&root);

        let output = run_args(&["check", root.to_str().unwrap()]).unwrap();
        assert!(
            output.contains("main.tex:2:20: warning: Undefined reference 'none'"),
            "got {output}"
        );
        assert!(output.ends_with("Found 1 issue(s)\n"));

        let output = run_args(&["--json", "check", root.to_str().unwrap()]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["severity"], "warning");
    }

    #[test]
    fn test_complete_and_outline() {
        let (_temp_dir, root) = create_test_project_dir();
        write_project(&root);
        let dir = root.to_str().unwrap();

        let output = run_args(&["complete", dir, "--kind", "cite", "--prefix", "knuth8"]).unwrap();
        assert_eq!(output, "knuth84\nknuth86\n");
        let output = run_args(&["complete", dir, "--kind", "abbrev"]).unwrap();
        assert_eq!(output, "tug\n");

        let bib = root.join("refs.bib");
        let output = run_args(&["outline", bib.to_str().unwrap(), "--sort", "year"]).unwrap();
        assert_eq!(output, "1984\n  knuth84\n1986\n  knuth86\n");
        assert!(run_args(&["outline", bib.to_str().unwrap(), "--sort", "color"]).is_err());
    }

    #[test]
    fn test_wordcount_and_goto() {
        let (_temp_dir, root) = create_test_project_dir();
        write_project(&root);
        let main = root.join("main.tex");

        let output = run_args(&["wordcount", main.to_str().unwrap()]).unwrap();
        assert_eq!(output, "4\n");

        let offset = "\\section{Two words} one\n\\cite{kn".len();
        let output = run_args(&[
            "goto",
            root.to_str().unwrap(),
            "main.tex",
            &offset.to_string(),
        ])
        .unwrap();
        assert!(output.ends_with("refs.bib:2:0\n"), "got {output}");

        let error = run_args(&["goto", root.to_str().unwrap(), "main.tex", "0"]).unwrap_err();
        assert_eq!(error.to_string(), "No declaration found");
    }
}
