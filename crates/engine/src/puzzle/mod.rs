//! Puzzle state: objects, inventory, combinations, code locks and the room
//! graph. Nothing in here knows about windows, pixels or assets.

mod code_lock;
mod combination;
mod focus;
mod geometry;
mod inventory;
mod item;
mod object;
mod room;
mod session;
mod snapshot;
mod use_rules;

pub use code_lock::{CodeLockSession, CodeLockState, PuzzleKey};
pub use combination::{CombinationRegistry, CombineOutcome, PairKey};
pub use focus::{InputFocus, Modal};
pub use geometry::{Rect, Vec2};
pub use inventory::{
    Inventory, SlotLayout, DEFAULT_INVENTORY_CAPACITY, SCREEN_HEIGHT, SCREEN_WIDTH,
};
pub use item::{Item, DEFAULT_ICON_COLOR};
pub use object::{
    BehaviorKind, ClickEffect, ClickOutcome, ExitTarget, InteractiveObject, ObjectId,
    ObjectMessages, UnlockResult, INVENTORY_FULL_MESSAGE,
};
pub use room::{Room, RoomId};
pub use session::{
    GameSession, SessionCommand, SessionError, SessionEvent, TransitionOutcome,
    ROOM_BLOCKED_MESSAGE, WRONG_CODE_MESSAGE,
};
pub use snapshot::{CodeLockSnapshot, ObjectSnapshot, SessionSnapshot};
pub use use_rules::{UseEffect, UseOutcome, UseRule, UseRuleTable, CANNOT_USE_MESSAGE};
