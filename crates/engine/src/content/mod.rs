mod loader;
mod types;

pub use loader::{load_puzzle_file, parse_puzzle_document};
pub use types::{ContentErrorCode, ContentLoadError, PuzzleDefinition, SourceLocation};
