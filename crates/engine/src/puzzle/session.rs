use thiserror::Error;
use tracing::{debug, info, warn};

use super::code_lock::{CodeLockSession, CodeLockState, PuzzleKey};
use super::combination::{CombinationRegistry, CombineOutcome};
use super::focus::{InputFocus, Modal};
use super::geometry::{Rect, Vec2};
use super::inventory::Inventory;
use super::item::Item;
use super::object::{ClickEffect, ExitTarget, ObjectId};
use super::room::{Room, RoomId};
use super::snapshot::{CodeLockSnapshot, ObjectSnapshot, SessionSnapshot};
use super::use_rules::UseRuleTable;

pub const WRONG_CODE_MESSAGE: &str = "Wrong code.";
pub const ROOM_BLOCKED_MESSAGE: &str = "The way forward is still locked.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    RoomEntered(RoomId),
    ItemAcquired(String),
    CodeAccepted(ObjectId),
    /// Transient feedback cue for the renderer (panel shake).
    CodeRejected(ObjectId),
    CodeCancelled(ObjectId),
    Won,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    None,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Entered,
    AlreadyActive,
    Blocked,
    Unknown,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a game session needs at least one room")]
    NoRooms,
    #[error("duplicate room id: {0}")]
    DuplicateRoom(RoomId),
}

/// Aggregate root of a playthrough. Every puzzle mutation goes through here,
/// one input event at a time.
#[derive(Debug, Clone)]
pub struct GameSession {
    rooms: Vec<Room>,
    active: usize,
    inventory: Inventory,
    combinations: CombinationRegistry,
    use_rules: UseRuleTable,
    held_item: Option<Item>,
    focus: InputFocus,
    status_message: String,
    won: bool,
    events: Vec<SessionEvent>,
}

impl GameSession {
    pub fn new(rooms: Vec<Room>, inventory: Inventory) -> Result<Self, SessionError> {
        let Some(first) = rooms.first() else {
            return Err(SessionError::NoRooms);
        };
        for (index, room) in rooms.iter().enumerate() {
            if rooms[..index].iter().any(|earlier| earlier.id == room.id) {
                return Err(SessionError::DuplicateRoom(room.id.clone()));
            }
        }
        let status_message = first.entry_message.clone();
        let events = vec![SessionEvent::RoomEntered(first.id.clone())];
        Ok(Self {
            rooms,
            active: 0,
            inventory,
            combinations: CombinationRegistry::default(),
            use_rules: UseRuleTable::default(),
            held_item: None,
            focus: InputFocus::default(),
            status_message,
            won: false,
            events,
        })
    }

    pub fn with_combinations(mut self, combinations: CombinationRegistry) -> Self {
        self.combinations = combinations;
        self
    }

    pub fn with_use_rules(mut self, use_rules: UseRuleTable) -> Self {
        self.use_rules = use_rules;
        self
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn won(&self) -> bool {
        self.won
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn active_room(&self) -> &Room {
        &self.rooms[self.active]
    }

    pub fn active_room_index(&self) -> usize {
        self.active
    }

    pub fn obstacles(&self) -> &[Rect] {
        self.active_room().obstacles()
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn held_item(&self) -> Option<&Item> {
        self.held_item.as_ref()
    }

    pub fn focus(&self) -> &InputFocus {
        &self.focus
    }

    pub fn code_lock(&self) -> Option<&CodeLockSession> {
        self.focus.code_lock()
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|room| &room.id == id)
    }

    /// The named gating predicate: some exit of the room is unlocked.
    pub fn room_solved(&self, id: &RoomId) -> bool {
        self.room(id).is_some_and(Room::is_solved)
    }

    pub fn solved_rooms(&self) -> Vec<RoomId> {
        self.rooms
            .iter()
            .filter(|room| room.is_solved())
            .map(|room| room.id.clone())
            .collect()
    }

    /// Pointer routing: inventory slots first, then visible objects of the
    /// active room, otherwise the held item is put away. Ignored while a modal
    /// owns input or after the game is won.
    pub fn pointer_down(&mut self, position: Vec2) {
        if self.won {
            return;
        }
        if !self.focus.room_has_focus() {
            debug!(depth = self.focus.depth(), "pointer_ignored_modal_focus");
            return;
        }

        if let Some(item) = self.inventory.handle_click(position).cloned() {
            self.select_inventory_item(item);
            return;
        }

        if let Some(index) = self.rooms[self.active].hit_test(position) {
            match self.held_item.clone() {
                Some(item) => self.use_held_item(&item, index),
                None => self.click_object(index),
            }
            return;
        }

        if let Some(item) = self.held_item.take() {
            self.status_message = format!("You put the {} away.", item.name);
        }
    }

    pub fn key_down(&mut self, key: PuzzleKey) -> SessionCommand {
        if self.won {
            return match key {
                PuzzleKey::Cancel => SessionCommand::Quit,
                _ => SessionCommand::None,
            };
        }
        if !self.focus.room_has_focus() {
            self.route_key_to_modal(key);
            return SessionCommand::None;
        }
        match key {
            PuzzleKey::Cancel => {
                info!(reason = "cancel_key", "quit_requested");
                SessionCommand::Quit
            }
            PuzzleKey::ToggleRoom => {
                self.toggle_room();
                SessionCommand::None
            }
            _ => SessionCommand::None,
        }
    }

    /// Makes `id` the active room. Rooms ahead of the active one are reachable
    /// only when every room before them is solved. Room state is kept as is.
    pub fn switch_room(&mut self, id: &RoomId) -> TransitionOutcome {
        let Some(index) = self.rooms.iter().position(|room| &room.id == id) else {
            warn!(room = %id, "switch_room_unknown");
            return TransitionOutcome::Unknown;
        };
        if index == self.active {
            return TransitionOutcome::AlreadyActive;
        }
        if !self.is_reachable(index) {
            info!(room = %id, "switch_room_blocked");
            self.status_message = ROOM_BLOCKED_MESSAGE.to_string();
            return TransitionOutcome::Blocked;
        }
        self.enter_room_at(index);
        TransitionOutcome::Entered
    }

    pub fn enter_next_room(&mut self) -> TransitionOutcome {
        match self.rooms.get(self.active + 1) {
            Some(next) => {
                let id = next.id.clone();
                self.switch_room(&id)
            }
            None => TransitionOutcome::Unknown,
        }
    }

    /// Debug shortcut: cycle to the following room, wrapping to the first.
    pub fn toggle_room(&mut self) -> TransitionOutcome {
        let next = (self.active + 1) % self.rooms.len();
        let id = self.rooms[next].id.clone();
        self.switch_room(&id)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let room = self.active_room();
        SessionSnapshot {
            room_id: room.id.clone(),
            room_name: room.name.clone(),
            status_message: self.status_message.clone(),
            won: self.won,
            held_item: self.held_item.as_ref().map(|item| item.name.clone()),
            inventory: self.inventory.items().to_vec(),
            inventory_capacity: self.inventory.capacity(),
            objects: room.objects().iter().map(ObjectSnapshot::from).collect(),
            obstacles: room.obstacles().to_vec(),
            code_lock: self.code_lock().map(CodeLockSnapshot::from),
            solved_rooms: self.solved_rooms(),
        }
    }

    fn is_reachable(&self, index: usize) -> bool {
        index <= self.active || self.rooms[..index].iter().all(Room::is_solved)
    }

    fn enter_room_at(&mut self, index: usize) {
        self.active = index;
        self.held_item = None;
        self.focus.clear();
        let room = &self.rooms[index];
        self.status_message = room.entry_message.clone();
        self.events.push(SessionEvent::RoomEntered(room.id.clone()));
        info!(room = %room.id, index, "room_entered");
    }

    fn select_inventory_item(&mut self, item: Item) {
        match self.held_item.take() {
            Some(held) if held.name != item.name => self.combine(&held.name, &item.name),
            _ => {
                self.status_message = format!("Holding: {}", item.name);
                debug!(item = %item.name, "item_selected");
                self.held_item = Some(item);
            }
        }
    }

    fn combine(&mut self, first: &str, second: &str) {
        let outcome = self.combinations.combine(&mut self.inventory, first, second);
        self.status_message = match outcome {
            CombineOutcome::Combined { result } => {
                info!(first, second, result = %result.name, "items_combined");
                self.events
                    .push(SessionEvent::ItemAcquired(result.name.clone()));
                format!("You combined the {first} and the {second} into the {}.", result.name)
            }
            CombineOutcome::NoRecipe | CombineOutcome::SameItem => {
                format!("The {first} and the {second} don't go together.")
            }
            CombineOutcome::MissingIngredient { name } => format!("You don't have the {name}."),
            CombineOutcome::ResultAlreadyHeld { result } => {
                format!("You already have the {}.", result.name)
            }
        };
        self.held_item = None;
    }

    fn use_held_item(&mut self, item: &Item, index: usize) {
        let Some(object) = self.rooms[self.active].object_at_mut(index) else {
            return;
        };
        let outcome = self.use_rules.apply(item, object);
        if outcome.unlocked {
            info!(item = %item.name, object = %object.id, "object_unlocked_by_item");
        }
        self.status_message = outcome.message;
    }

    fn click_object(&mut self, index: usize) {
        let room = &mut self.rooms[self.active];
        let Some(object) = room.object_at_mut(index) else {
            return;
        };
        let object_id = object.id.clone();
        let outcome = object.on_click(&mut self.inventory);
        self.status_message = outcome.message;
        debug!(object = %object_id, effect = ?outcome.effect, "object_clicked");

        match outcome.effect {
            ClickEffect::None => {}
            ClickEffect::OpenCodeLock { expected_length } => {
                info!(object = %object_id, expected_length, "code_lock_opened");
                self.focus
                    .push(Modal::CodeLock(CodeLockSession::new(object_id, expected_length)));
            }
            ClickEffect::ItemAcquired { name } => {
                info!(object = %object_id, item = %name, "item_acquired");
                self.events.push(SessionEvent::ItemAcquired(name));
            }
            ClickEffect::ExitThrough(ExitTarget::NextRoom)
                if self.active + 1 < self.rooms.len() =>
            {
                // The unlocked exit is the gate; no solved-room check here.
                self.enter_room_at(self.active + 1);
            }
            ClickEffect::ExitThrough(_) => {
                info!(object = %object_id, "game_won");
                self.won = true;
                self.held_item = None;
                self.events.push(SessionEvent::Won);
            }
        }
    }

    fn route_key_to_modal(&mut self, key: PuzzleKey) {
        let Some(Modal::CodeLock(session)) = self.focus.top() else {
            return;
        };
        let target = session.target().clone();
        let required_code = self.rooms[self.active]
            .object(&target)
            .and_then(|object| object.required_code.clone())
            .unwrap_or_default();

        let Some(Modal::CodeLock(session)) = self.focus.top_mut() else {
            return;
        };
        let state = session.handle_key(key, &required_code);
        if !state.is_terminal() {
            return;
        }
        self.focus.pop();

        match state {
            CodeLockState::SubmittedCorrect => {
                let Some(object) = self.rooms[self.active].object_mut(&target) else {
                    warn!(object = %target, "code_lock_target_missing");
                    return;
                };
                let result = object.unlock();
                self.status_message = format!("Correct code! {}", object.unlock_message(result));
                info!(object = %target, "code_accepted");
                self.events.push(SessionEvent::CodeAccepted(target));
            }
            CodeLockState::SubmittedIncorrect => {
                self.status_message = WRONG_CODE_MESSAGE.to_string();
                info!(object = %target, "code_rejected");
                self.events.push(SessionEvent::CodeRejected(target));
            }
            CodeLockState::Cancelled => {
                debug!(object = %target, "code_lock_cancelled");
                self.events.push(SessionEvent::CodeCancelled(target));
            }
            CodeLockState::Entering => {}
        }
    }
}
