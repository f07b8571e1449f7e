use serde::Serialize;

use super::code_lock::CodeLockSession;
use super::geometry::Rect;
use super::item::Item;
use super::object::{InteractiveObject, ObjectId};
use super::room::RoomId;

/// Read-only view of the session handed to renderers and debug tooling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub room_id: RoomId,
    pub room_name: String,
    pub status_message: String,
    pub won: bool,
    pub held_item: Option<String>,
    pub inventory: Vec<Item>,
    pub inventory_capacity: usize,
    pub objects: Vec<ObjectSnapshot>,
    pub obstacles: Vec<Rect>,
    pub code_lock: Option<CodeLockSnapshot>,
    pub solved_rooms: Vec<RoomId>,
}

impl SessionSnapshot {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSnapshot {
    pub id: ObjectId,
    pub name: String,
    pub behavior: &'static str,
    pub bounds: Rect,
    pub visible: bool,
    pub locked: bool,
    pub remaining_contents: usize,
}

impl From<&InteractiveObject> for ObjectSnapshot {
    fn from(object: &InteractiveObject) -> Self {
        Self {
            id: object.id.clone(),
            name: object.name.clone(),
            behavior: object.behavior.label(),
            bounds: object.bounds,
            visible: object.visible,
            locked: object.locked,
            remaining_contents: object.contents.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeLockSnapshot {
    pub target: ObjectId,
    pub buffer: String,
    pub expected_length: usize,
}

impl From<&CodeLockSession> for CodeLockSnapshot {
    fn from(session: &CodeLockSession) -> Self {
        Self {
            target: session.target().clone(),
            buffer: session.buffer().to_string(),
            expected_length: session.expected_length(),
        }
    }
}
