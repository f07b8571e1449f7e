use std::fmt;

use serde::Serialize;

use super::geometry::{Rect, Vec2};
use super::object::{InteractiveObject, ObjectId};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub entry_message: String,
    objects: Vec<InteractiveObject>,
    obstacles: Vec<Rect>,
}

impl Room {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        entry_message: impl Into<String>,
    ) -> Self {
        Self {
            id: RoomId::new(id),
            name: name.into(),
            entry_message: entry_message.into(),
            objects: Vec::new(),
            obstacles: Vec::new(),
        }
    }

    pub fn with_object(mut self, object: InteractiveObject) -> Self {
        self.objects.push(object);
        self
    }

    pub fn with_obstacle(mut self, obstacle: Rect) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    pub fn push_object(&mut self, object: InteractiveObject) {
        self.objects.push(object);
    }

    pub fn push_obstacle(&mut self, obstacle: Rect) {
        self.obstacles.push(obstacle);
    }

    pub fn objects(&self) -> &[InteractiveObject] {
        &self.objects
    }

    /// Read-only obstacle snapshot for the movement collaborator.
    pub fn obstacles(&self) -> &[Rect] {
        &self.obstacles
    }

    pub fn object(&self, id: &ObjectId) -> Option<&InteractiveObject> {
        self.objects.iter().find(|object| &object.id == id)
    }

    pub fn object_mut(&mut self, id: &ObjectId) -> Option<&mut InteractiveObject> {
        self.objects.iter_mut().find(|object| &object.id == id)
    }

    /// First visible object under `position`, in placement order.
    pub fn hit_test(&self, position: Vec2) -> Option<usize> {
        self.objects.iter().position(|object| object.hit(position))
    }

    pub(crate) fn object_at_mut(&mut self, index: usize) -> Option<&mut InteractiveObject> {
        self.objects.get_mut(index)
    }

    /// A room is solved once any of its exits is unlocked. Rooms without exits
    /// count as solved.
    pub fn is_solved(&self) -> bool {
        let mut exits = self
            .objects
            .iter()
            .filter(|object| object.behavior.is_exit())
            .peekable();
        exits.peek().is_none() || exits.any(|object| !object.locked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::{BehaviorKind, ExitTarget};

    fn scenery(id: &str, bounds: Rect) -> InteractiveObject {
        InteractiveObject::new(
            id,
            id,
            bounds,
            BehaviorKind::Scenery {
                flavor: String::new(),
            },
        )
    }

    #[test]
    fn hit_test_skips_invisible_objects() {
        let mut hidden = scenery("hidden", Rect::new(0, 0, 50, 50));
        hidden.visible = false;
        let room = Room::new("r", "R", "")
            .with_object(hidden)
            .with_object(scenery("below", Rect::new(0, 0, 100, 100)));

        assert_eq!(room.hit_test(Vec2::new(10.0, 10.0)), Some(1));
        assert_eq!(room.hit_test(Vec2::new(200.0, 10.0)), None);
    }

    #[test]
    fn solved_tracks_exit_lock_state() {
        let door = InteractiveObject::new(
            "door",
            "Door",
            Rect::new(0, 0, 10, 10),
            BehaviorKind::Exit {
                key: None,
                leads_to: ExitTarget::NextRoom,
            },
        )
        .locked(true);
        let mut room = Room::new("r", "R", "").with_object(door);
        assert!(!room.is_solved());

        room.object_mut(&ObjectId::new("door"))
            .expect("door")
            .unlock();
        assert!(room.is_solved());
    }

    #[test]
    fn one_open_exit_solves_a_room_with_a_locked_second_exit() {
        let exit = |id: &str| {
            InteractiveObject::new(
                id,
                id,
                Rect::new(0, 0, 10, 10),
                BehaviorKind::Exit {
                    key: None,
                    leads_to: ExitTarget::NextRoom,
                },
            )
            .locked(true)
        };
        let mut room = Room::new("r", "R", "")
            .with_object(exit("door"))
            .with_object(exit("hatch"));
        assert!(!room.is_solved());

        room.object_mut(&ObjectId::new("door"))
            .expect("door")
            .unlock();
        assert!(room.is_solved());
        assert!(Room::new("empty", "Empty", "").is_solved());
    }
}
