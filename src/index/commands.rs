use super::{Entry, EntryKind};

/// A command LaTeX (or a standard package) defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinCommand {
    /// Name without the backslash.
    pub name: &'static str,
    pub arguments: usize,
    pub documentation: &'static str,
}

const fn cmd(name: &'static str, arguments: usize, documentation: &'static str) -> BuiltinCommand {
    BuiltinCommand {
        name,
        arguments,
        documentation,
    }
}

// sorted by name
static BUILTIN_COMMANDS: &[BuiltinCommand] = &[
    cmd("addbibresource", 1, "Adds a bibliography database (biblatex)."),
    cmd("appendix", 0, "Starts the appendix; following chapters or sections are lettered."),
    cmd("author", 1, "Sets the document author used by \\maketitle."),
    cmd("autocite", 1, "Citation in the style's preferred form (biblatex)."),
    cmd("begin", 1, "Opens an environment."),
    cmd("bibliography", 1, "Reads the named .bib files and places the bibliography here."),
    cmd("bibliographystyle", 1, "Selects the BibTeX style file."),
    cmd("caption", 1, "Caption of a figure or table."),
    cmd("chapter", 1, "Starts a chapter."),
    cmd("cite", 1, "Citation of one or more bibliography keys."),
    cmd("citeauthor", 1, "Author names of a citation (natbib, biblatex)."),
    cmd("citep", 1, "Parenthetical citation (natbib)."),
    cmd("citet", 1, "Textual citation (natbib)."),
    cmd("citeyear", 1, "Year of a citation (natbib, biblatex)."),
    cmd("date", 1, "Sets the date used by \\maketitle."),
    cmd("def", 0, "TeX primitive macro definition."),
    cmd("documentclass", 1, "Selects the document class."),
    cmd("emph", 1, "Emphasized text."),
    cmd("end", 1, "Closes an environment."),
    cmd("eqref", 1, "Reference to an equation, in parentheses (amsmath)."),
    cmd("footnote", 1, "Footnote."),
    cmd("frac", 2, "Fraction in math mode."),
    cmd("hline", 0, "Horizontal rule in a tabular."),
    cmd("hspace", 1, "Horizontal space."),
    cmd("include", 1, "Includes a .tex file on a new page; usable with \\includeonly."),
    cmd("includegraphics", 1, "Inserts an image (graphicx)."),
    cmd("input", 1, "Inserts the contents of a .tex file."),
    cmd("item", 0, "Item of a list environment."),
    cmd("label", 1, "Defines a cross-reference label."),
    cmd("makeindex", 0, "Enables index generation."),
    cmd("maketitle", 0, "Typesets the title block."),
    cmd("newcommand", 2, "Defines a new command."),
    cmd("newenvironment", 3, "Defines a new environment."),
    cmd("newpage", 0, "Ends the current page."),
    cmd("nocite", 1, "Adds keys to the bibliography without citing them."),
    cmd("pageref", 1, "Page number of a label."),
    cmd("paragraph", 1, "Starts a paragraph heading."),
    cmd("parencite", 1, "Parenthetical citation (biblatex)."),
    cmd("part", 1, "Starts a part."),
    cmd("printbibliography", 0, "Places the bibliography (biblatex)."),
    cmd("printindex", 0, "Places the index."),
    cmd("providecommand", 2, "Defines a command unless it exists."),
    cmd("ref", 1, "Number of a label."),
    cmd("renewcommand", 2, "Redefines an existing command."),
    cmd("section", 1, "Starts a section."),
    cmd("sqrt", 1, "Square root in math mode."),
    cmd("subparagraph", 1, "Starts a subparagraph heading."),
    cmd("subsection", 1, "Starts a subsection."),
    cmd("subsubsection", 1, "Starts a subsubsection."),
    cmd("tableofcontents", 0, "Typesets the table of contents."),
    cmd("textbf", 1, "Bold text."),
    cmd("textcite", 1, "Textual citation (biblatex)."),
    cmd("textit", 1, "Italic text."),
    cmd("texttt", 1, "Typewriter text."),
    cmd("title", 1, "Sets the document title used by \\maketitle."),
    cmd("url", 1, "Typesets a URL (url, hyperref)."),
    cmd("usepackage", 1, "Loads a package."),
    cmd("vspace", 1, "Vertical space."),
];

/// The built-in command table, sorted by name.
pub fn builtin_commands() -> &'static [BuiltinCommand] {
    BUILTIN_COMMANDS
}

pub(crate) fn builtin_entries() -> Vec<Entry> {
    BUILTIN_COMMANDS
        .iter()
        .map(|command| {
            let mut entry = Entry::new(
                command.name,
                EntryKind::Command {
                    arguments: command.arguments,
                },
                0,
            );
            entry.info = command.documentation.to_string();
            entry
        })
        .collect()
}
