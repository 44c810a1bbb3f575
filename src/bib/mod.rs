//! BibTeX parsing and outline construction.

pub mod outline;
pub mod parser;

pub use outline::{BibOutline, OutlineNode, SortMode, MAX_PARTITION_SIZE};
pub use parser::{parse, parse_with, BibParseResult, ParseOptions};
