use std::fmt::Display;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::latex::{DocumentReference, ReferenceKind};
use crate::project::{resolve_target, Document, Project};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    /// A task tag such as `TODO` found outside entries.
    Task,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Task => write!(f, "task"),
        }
    }
}

/// A problem found in a file. Lines are 1-based, columns are byte offsets
/// into the line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        message: String,
        line: usize,
        column: usize,
        length: usize,
    ) -> Diagnostic {
        Diagnostic {
            severity,
            message,
            line,
            column,
            length,
            file_name: None,
        }
    }
}

/// All diagnostics for the file at `path`.
///
/// BibTeX parse problems are always reported. Undefined references and
/// citations and include cycles are reported unless
/// `settings.unresolved_diagnostics` is off.
pub fn diagnostics(project: &Project, settings: &Settings, path: &Path) -> Vec<Diagnostic> {
    let Some(document) = project.document(path) else {
        return vec![];
    };
    let file_name = project.file_name(path);

    let mut diagnostics: Vec<Diagnostic> = match document {
        Document::Bib(bib) => bib.diagnostics().cloned().collect(),
        Document::Tex(_) => vec![],
    };

    if settings.unresolved_diagnostics {
        if let Document::Tex(tex) = document {
            diagnostics.extend(unresolved_references(project, &tex.references));
        }
        diagnostics.extend(include_cycles(project, path));
    }

    for diagnostic in diagnostics.iter_mut() {
        diagnostic.file_name = Some(file_name.clone());
    }
    diagnostics
}

fn is_defined(project: &Project, reference: &DocumentReference) -> bool {
    let manager = project.manager();
    match reference.kind {
        ReferenceKind::Ref => manager.label(&reference.key).is_some(),
        ReferenceKind::Cite => manager.bib(&reference.key).is_some(),
    }
}

fn unresolved_references(project: &Project, references: &[DocumentReference]) -> Vec<Diagnostic> {
    let all_references: Vec<&DocumentReference> = project
        .files()
        .into_iter()
        .filter_map(|file| project.document(file)?.as_tex())
        .flat_map(|tex| tex.references.iter())
        .collect();

    references
        .par_iter()
        .filter(|reference| !is_defined(project, reference))
        .map(|reference| {
            // Count how many times this same unresolved key is used
            let usage_count = all_references
                .iter()
                .filter(|other| other.kind == reference.kind && other.key == reference.key)
                .count();
            Diagnostic::new(
                Severity::Warning,
                generate_diagnostic_message(reference, usage_count),
                reference.line,
                reference.column,
                reference.length,
            )
        })
        .collect()
}

fn generate_diagnostic_message(reference: &DocumentReference, usage_count: usize) -> String {
    let base_message = match reference.kind {
        ReferenceKind::Ref => format!("Undefined reference '{}'", reference.key),
        ReferenceKind::Cite => format!("Undefined citation '{}'", reference.key),
    };

    if usage_count > 1 {
        format!("{} (used {} times)", base_message, usage_count)
    } else {
        base_message
    }
}

/// One error on every include of `path` that leads back into a cycle
/// `path` is part of.
fn include_cycles(project: &Project, path: &Path) -> Vec<Diagnostic> {
    let Some(tex) = project.document(path).and_then(Document::as_tex) else {
        return vec![];
    };
    let cycles = project.graph().cycles();
    let Some(cycle) = cycles.iter().find(|cycle| cycle.contains(&path)) else {
        return vec![];
    };
    let names: Vec<String> = cycle.iter().map(|p| project.file_name(p)).collect();

    let exists = |p: &Path| project.document(p).is_some();
    tex.includes
        .iter()
        .filter(|include| {
            resolve_target(project.root_dir(), path, &include.target, "tex", exists)
                .is_some_and(|target| cycle.contains(&target.as_path()))
        })
        .map(|include| {
            Diagnostic::new(
                Severity::Error,
                format!("Include cycle through {}", names.join(", ")),
                include.line,
                0,
                0,
            )
        })
        .collect()
}
