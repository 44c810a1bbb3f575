//! Dictionary spell checking of LaTeX sources.
//!
//! A [`SpellService`] is created per language by whoever hosts it and is
//! passed to the code that checks text; nothing here is global.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use spellbook::Dictionary;

use crate::latex::{is_cite_command, is_ref_command, read_arguments};
use crate::latex_utils::is_escaped;
use crate::position::Span;
use crate::scanner::{Dialect, Scanner, Token, TokenKind};

/// Words shorter than this are never reported.
const MIN_WORD_LENGTH: usize = 3;

const MAX_SUGGESTIONS: usize = 4;

/// Commands whose arguments are names, not prose.
const NAME_ARGUMENTS: [&str; 16] = [
    "label",
    "begin",
    "end",
    "input",
    "include",
    "usepackage",
    "documentclass",
    "bibliography",
    "bibliographystyle",
    "addbibresource",
    "newcounter",
    "setcounter",
    "addtocounter",
    "stepcounter",
    "newenvironment",
    "renewenvironment",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub language: String,
    /// Hunspell affix file (`en_US.aff`).
    pub affix: PathBuf,
    /// Hunspell word list (`en_US.dic`).
    pub dictionary: PathBuf,
    /// Words the user added, one per line; created on shutdown if missing.
    pub user_words: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Misspelling {
    pub region: Span,
    pub word: String,
}

pub struct SpellService {
    config: LanguageConfig,
    dictionary: Dictionary,
    user_words: HashSet<String>,
}

impl std::fmt::Debug for SpellService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpellService")
            .field("language", &self.config.language)
            .field("user_words", &self.user_words.len())
            .finish()
    }
}

fn read_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

fn read_file(path: &Path, what: &str, language: &str) -> anyhow::Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Can't read {} {} {}", language, what, path.display()))
}

impl SpellService {
    pub fn create(config: LanguageConfig) -> anyhow::Result<SpellService> {
        let language = config.language.as_str();
        let affix = read_file(&config.affix, "affix file", language)?;
        let words = read_file(&config.dictionary, "dictionary", language)?;

        let dictionary = Dictionary::new(&affix, &words).map_err(|err| {
            anyhow::anyhow!(
                "Can't parse {} dictionary {}: {}",
                language,
                config.dictionary.display(),
                err
            )
        })?;

        let user_words = match &config.user_words {
            Some(path) if path.exists() => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Can't read user words {}", path.display()))?;
                read_words(&text).collect()
            }
            _ => HashSet::new(),
        };
        log::info!(
            "Loaded {} dictionary ({} user words)",
            language,
            user_words.len()
        );
        Ok(SpellService {
            config,
            dictionary,
            user_words,
        })
    }

    pub fn language(&self) -> &str {
        &self.config.language
    }

    pub fn is_correct(&self, word: &str) -> bool {
        self.dictionary.check(word)
            || self.user_words.contains(word)
            || self.user_words.contains(&word.to_lowercase())
    }

    pub fn add_word(&mut self, word: &str) {
        self.user_words.insert(word.to_string());
    }

    /// Up to four replacements for a misspelled word, best first.
    pub fn suggest(&self, word: &str) -> Vec<String> {
        let mut suggestions = Vec::new();
        self.dictionary.suggest(word, &mut suggestions);
        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }

    /// Misspelled words of `text`, in order.
    ///
    /// Short words, words with digits and words with capitals after the
    /// first letter (acronyms, `LaTeX`) are never reported.
    pub fn check(&self, text: &str) -> Vec<Misspelling> {
        TexWordFinder::new(text)
            .filter(|region| {
                let word = &text[region.offset..region.end()];
                is_checkable(word) && !self.is_correct(word)
            })
            .map(|region| Misspelling {
                region,
                word: text[region.offset..region.end()].to_string(),
            })
            .collect()
    }

    /// Writes the user words back, if a file was configured, and drops the
    /// service.
    pub fn shutdown(self) -> anyhow::Result<()> {
        let Some(path) = &self.config.user_words else {
            return Ok(());
        };
        let mut words: Vec<&String> = self.user_words.iter().collect();
        words.sort();
        let mut content = String::new();
        for word in words {
            content.push_str(word);
            content.push('\n');
        }
        fs::write(path, content)
            .with_context(|| format!("Can't write user words {}", path.display()))?;
        log::debug!("Saved user words for {}", self.config.language);
        Ok(())
    }
}

fn is_checkable(word: &str) -> bool {
    word.chars().count() >= MIN_WORD_LENGTH
        && !word.chars().any(|c| c.is_ascii_digit())
        && !word.chars().skip(1).any(char::is_uppercase)
}

/// Iterator over the prose words of a LaTeX buffer.
///
/// Skips comments, command names, inline and display math, and the
/// arguments of commands that take labels, keys, file or environment names.
pub struct TexWordFinder<'a> {
    text: &'a str,
    scanner: Scanner<'a>,
}

impl<'a> TexWordFinder<'a> {
    pub fn new(text: &'a str) -> TexWordFinder<'a> {
        TexWordFinder {
            text,
            scanner: Scanner::new(text, Dialect::Latex),
        }
    }

    /// Offset just past the math that starts with `token`, if it does.
    fn math_end(&self, token: &Token) -> Option<usize> {
        let open = token.text(self.text);
        let close = match open {
            "$" if self.text[token.span.end()..].starts_with('$') => "$$",
            "$" => "$",
            "\\(" => "\\)",
            "\\[" => "\\]",
            _ => return None,
        };
        let start = token.span.offset + close.len();
        let mut pos = start;
        while let Some(found) = self.text.get(pos..).and_then(|rest| rest.find(close)) {
            let candidate = pos + found;
            if close.starts_with('\\') || !is_escaped(self.text, candidate) {
                return Some(candidate + close.len());
            }
            pos = candidate + 1;
        }
        // unterminated math runs to the end
        Some(self.text.len())
    }
}

impl Iterator for TexWordFinder<'_> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        loop {
            let token = self.scanner.next()?;
            if let Some(end) = self.math_end(&token) {
                self.scanner.seek(end);
                continue;
            }
            match token.kind {
                TokenKind::Word => {
                    let word = token.text(self.text);
                    let trimmed = word.trim_end_matches(['\'', '-']);
                    if trimmed.chars().any(char::is_alphabetic) {
                        return Some(Span::new(token.span.offset, trimmed.len()));
                    }
                }
                TokenKind::Command => {
                    let name = &token.text(self.text)[1..];
                    if NAME_ARGUMENTS.contains(&name) || is_ref_command(name) || is_cite_command(name)
                    {
                        let args = read_arguments(self.text, token.span.end(), 1);
                        self.scanner.seek(args.end);
                    }
                }
                _ => {}
            }
        }
    }
}
