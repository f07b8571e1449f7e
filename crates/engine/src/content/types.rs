use std::fmt;
use std::path::PathBuf;

use crate::puzzle::{
    CombinationRegistry, GameSession, Inventory, Room, SessionError, UseRuleTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownElement,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateId,
    DanglingReference,
    NoRooms,
}

#[derive(Debug, Clone)]
pub struct ContentLoadError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentLoadError {}

/// Everything a room definition file describes, ready to seed a session.
#[derive(Debug, Clone, Default)]
pub struct PuzzleDefinition {
    pub rooms: Vec<Room>,
    pub combinations: CombinationRegistry,
    pub use_rules: UseRuleTable,
}

impl PuzzleDefinition {
    pub fn into_session(self, inventory_capacity: usize) -> Result<GameSession, SessionError> {
        Ok(GameSession::new(self.rooms, Inventory::new(inventory_capacity))?
            .with_combinations(self.combinations)
            .with_use_rules(self.use_rules))
    }

    pub fn object_count(&self) -> usize {
        self.rooms.iter().map(|room| room.objects().len()).sum()
    }
}
