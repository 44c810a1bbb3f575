//! texlipse: a document model for LaTeX and BibTeX projects
//!
//! This crate holds the editor-independent core behind LaTeX editing
//! support: scanning, BibTeX parsing, reference indexes, outlines, folding
//! and the queries an editor asks of them.
//!
//! # Architecture
//!
//! - [`scanner`] and [`latex_utils`]: tokenizing and command lookup in raw text
//! - [`bib`]: the BibTeX parser and outline trees
//! - [`latex`]: labels, citations, commands and includes of `.tex` files
//! - [`index`]: sorted, prefix-searchable entry indexes per project
//! - [`project`]: all files of a root directory and their include graph
//! - [`completion`], [`gotodef`], [`hover`], [`diagnostics`]: editor queries
//! - [`selection`], [`position`] and [`folding`]: positions that follow edits
//! - [`spelling`]: dictionary spell checking of prose
//! - [`lsp`]: conversions to Language Server Protocol types
//! - [`config`] and [`cli`]: settings and the `texlipse` binary
//!
//! ```ignore
//! use texlipse::config::Settings;
//! use texlipse::project::Project;
//!
//! let settings = Settings::new(&root)?;
//! let project = Project::construct(&settings, &root)?;
//! let diagnostics = texlipse::diagnostics::diagnostics(&project, &settings, &main);
//! ```

// Text primitives
pub mod latex_utils;
pub mod position;
pub mod scanner;
pub mod selection;

// Document model
pub mod bib;
pub mod folding;
pub mod index;
pub mod latex;
pub mod project;

// Queries
pub mod completion;
pub mod diagnostics;
pub mod gotodef;
pub mod hover;
pub mod spelling;

// Surfaces
pub mod cli;
pub mod config;
pub mod lsp;

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;
