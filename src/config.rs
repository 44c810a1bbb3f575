use std::path::Path;

use anyhow::anyhow;
use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::bib::parser::DEFAULT_TASK_TAGS;
use crate::bib::{ParseOptions, MAX_PARTITION_SIZE};
use crate::index::CaseMode;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Key comparison for labels; bib keys are always case sensitive.
    pub case_matching: CaseMode,
    pub unresolved_diagnostics: bool,
    pub required_field_warnings: bool,
    /// Collapse every BibTeX entry when a file is first folded.
    pub bib_fold_initial: bool,
    /// Lines of context before and after a label shown as its info.
    pub label_context_lines: usize,
    pub task_tags: Vec<String>,
    pub partition_size: usize,
}

impl Settings {
    /// Reads `~/.config/texlipse/settings.*` and then `<root>/.texlipse.*`;
    /// missing files are fine, the later source wins.
    pub fn new(root_dir: &Path) -> anyhow::Result<Settings> {
        let expanded = shellexpand::tilde("~/.config/texlipse/settings");
        let defaults = Settings::default();
        let settings = Config::builder()
            .add_source(File::with_name(&expanded).required(false))
            .add_source(
                File::with_name(&format!(
                    "{}/.texlipse",
                    root_dir
                        .to_str()
                        .ok_or(anyhow!("Can't convert root_dir to str"))?
                ))
                .required(false),
            )
            .set_default("case_matching", "sensitive")?
            .set_default("unresolved_diagnostics", defaults.unresolved_diagnostics)?
            .set_default("required_field_warnings", defaults.required_field_warnings)?
            .set_default("bib_fold_initial", defaults.bib_fold_initial)?
            .set_default("label_context_lines", defaults.label_context_lines as u64)?
            .set_default("task_tags", defaults.task_tags)?
            .set_default("partition_size", defaults.partition_size as u64)?
            .build()
            .map_err(|err| anyhow!("Build err: {err}"))?;

        let settings = settings.try_deserialize::<Settings>()?;

        anyhow::Ok(settings)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            task_tags: self.task_tags.clone(),
            required_field_warnings: self.required_field_warnings,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            case_matching: CaseMode::Sensitive,
            unresolved_diagnostics: true,
            required_field_warnings: true,
            bib_fold_initial: false,
            label_context_lines: 2,
            task_tags: DEFAULT_TASK_TAGS.iter().map(|t| t.to_string()).collect(),
            partition_size: MAX_PARTITION_SIZE,
        }
    }
}
