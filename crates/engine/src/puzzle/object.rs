use std::fmt;

use serde::Serialize;

use super::geometry::{Rect, Vec2};
use super::inventory::Inventory;
use super::item::Item;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitTarget {
    NextRoom,
    Escape,
}

/// Semantic role of an object. Click and use semantics come from here and
/// never from the display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BehaviorKind {
    Exit {
        key: Option<String>,
        leads_to: ExitTarget,
    },
    CodeContainer,
    KeyContainer {
        key: String,
    },
    Collectible {
        item: Item,
    },
    Scenery {
        flavor: String,
    },
}

impl BehaviorKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exit { .. } => "Exit",
            Self::CodeContainer => "CodeContainer",
            Self::KeyContainer { .. } => "KeyContainer",
            Self::Collectible { .. } => "Collectible",
            Self::Scenery { .. } => "Scenery",
        }
    }

    /// Name of the item that opens this object, if a key opens it at all.
    pub fn unlock_key(&self) -> Option<&str> {
        match self {
            Self::Exit { key, .. } => key.as_deref(),
            Self::KeyContainer { key } => Some(key),
            _ => None,
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, Self::Exit { .. })
    }
}

/// Per-object text overrides. Unset entries fall back to phrasing built from
/// the display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMessages {
    pub locked: Option<String>,
    pub unlocked: Option<String>,
    pub empty: Option<String>,
    pub pass_through: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockResult {
    Unlocked,
    AlreadyUnlocked,
}

/// What the owning session must do after an object handled a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEffect {
    None,
    OpenCodeLock { expected_length: usize },
    ItemAcquired { name: String },
    ExitThrough(ExitTarget),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickOutcome {
    pub message: String,
    pub effect: ClickEffect,
}

impl ClickOutcome {
    fn message(message: String) -> Self {
        Self {
            message,
            effect: ClickEffect::None,
        }
    }

    fn with_effect(message: String, effect: ClickEffect) -> Self {
        Self { message, effect }
    }
}

#[derive(Debug, Clone)]
pub struct InteractiveObject {
    pub id: ObjectId,
    pub name: String,
    pub bounds: Rect,
    pub color: [u8; 3],
    pub visible: bool,
    pub locked: bool,
    pub required_code: Option<String>,
    pub contents: Vec<Item>,
    pub behavior: BehaviorKind,
    pub messages: ObjectMessages,
}

impl InteractiveObject {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        bounds: Rect,
        behavior: BehaviorKind,
    ) -> Self {
        Self {
            id: ObjectId::new(id),
            name: name.into(),
            bounds,
            color: [200, 200, 200],
            visible: true,
            locked: false,
            required_code: None,
            contents: Vec::new(),
            behavior,
            messages: ObjectMessages::default(),
        }
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.required_code = Some(code.into());
        self
    }

    pub fn with_contents(mut self, contents: Vec<Item>) -> Self {
        self.contents = contents;
        self
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn with_messages(mut self, messages: ObjectMessages) -> Self {
        self.messages = messages;
        self
    }

    /// Invisible objects are never hit.
    pub fn hit(&self, position: Vec2) -> bool {
        self.visible && self.bounds.contains(position)
    }

    pub fn accepts_key(&self, item: &Item) -> bool {
        self.behavior
            .unlock_key()
            .is_some_and(|key| item.is_named(key))
    }

    /// The single unlock primitive shared by code entry, key clicks and item use.
    pub fn unlock(&mut self) -> UnlockResult {
        if !self.locked {
            return UnlockResult::AlreadyUnlocked;
        }
        self.locked = false;
        UnlockResult::Unlocked
    }

    pub fn unlock_message(&self, result: UnlockResult) -> String {
        match result {
            UnlockResult::Unlocked => self
                .messages
                .unlocked
                .clone()
                .unwrap_or_else(|| format!("The {} is now unlocked.", self.name)),
            UnlockResult::AlreadyUnlocked => format!("The {} is already unlocked.", self.name),
        }
    }

    pub fn locked_message(&self) -> String {
        if let Some(message) = &self.messages.locked {
            return message.clone();
        }
        match &self.behavior {
            BehaviorKind::CodeContainer => format!(
                "The {} has a {}-digit combination lock.",
                self.name,
                self.code_length()
            ),
            _ if self.behavior.unlock_key().is_some() => {
                format!("The {} is locked. It seems to need a key.", self.name)
            }
            _ => format!("The {} is locked.", self.name),
        }
    }

    pub fn code_length(&self) -> usize {
        self.required_code
            .as_deref()
            .map(|code| code.chars().count())
            .unwrap_or(0)
    }

    /// Click with nothing held. Use of a held item goes through the use rules.
    pub fn on_click(&mut self, inventory: &mut Inventory) -> ClickOutcome {
        match &self.behavior {
            BehaviorKind::Exit { leads_to, .. } => {
                if self.locked {
                    return ClickOutcome::message(self.locked_message());
                }
                let message = self.messages.pass_through.clone().unwrap_or_else(|| {
                    match leads_to {
                        ExitTarget::NextRoom => {
                            format!("You open the {} and step into the next room.", self.name)
                        }
                        ExitTarget::Escape => {
                            format!("You push the {} open and escape!", self.name)
                        }
                    }
                });
                ClickOutcome::with_effect(message, ClickEffect::ExitThrough(*leads_to))
            }
            BehaviorKind::CodeContainer => {
                if self.locked {
                    return ClickOutcome::with_effect(
                        self.locked_message(),
                        ClickEffect::OpenCodeLock {
                            expected_length: self.code_length(),
                        },
                    );
                }
                self.take_first_item(inventory)
            }
            BehaviorKind::KeyContainer { .. } => {
                if self.locked {
                    return ClickOutcome::message(self.locked_message());
                }
                self.take_first_item(inventory)
            }
            BehaviorKind::Collectible { item } => {
                let item = item.clone();
                if !inventory.add(item.clone()) {
                    return ClickOutcome::message(INVENTORY_FULL_MESSAGE.to_string());
                }
                self.visible = false;
                ClickOutcome::with_effect(
                    format!("You picked up the {}.", item.name),
                    ClickEffect::ItemAcquired { name: item.name },
                )
            }
            BehaviorKind::Scenery { flavor } => ClickOutcome::message(flavor.clone()),
        }
    }

    fn take_first_item(&mut self, inventory: &mut Inventory) -> ClickOutcome {
        let Some(first) = self.contents.first() else {
            return ClickOutcome::message(
                self.messages
                    .empty
                    .clone()
                    .unwrap_or_else(|| format!("The {} is empty.", self.name)),
            );
        };
        if !inventory.add(first.clone()) {
            return ClickOutcome::message(INVENTORY_FULL_MESSAGE.to_string());
        }
        let item = self.contents.remove(0);
        ClickOutcome::with_effect(
            format!("You took the {} from the {}.", item.name, self.name),
            ClickEffect::ItemAcquired { name: item.name },
        )
    }
}

pub const INVENTORY_FULL_MESSAGE: &str = "Your inventory is full.";

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> Item {
        Item::new("Key", "Opens a door.")
    }

    fn drawer() -> InteractiveObject {
        InteractiveObject::new(
            "drawer",
            "Drawer",
            Rect::new(0, 0, 10, 10),
            BehaviorKind::CodeContainer,
        )
        .locked(true)
        .with_code("314")
        .with_contents(vec![key()])
    }

    #[test]
    fn locked_code_container_requests_code_lock() {
        let mut inventory = Inventory::new(3);
        let outcome = drawer().on_click(&mut inventory);
        assert_eq!(
            outcome.effect,
            ClickEffect::OpenCodeLock { expected_length: 3 }
        );
        assert!(inventory.is_empty());
    }

    #[test]
    fn unlocked_container_hands_out_items_in_order_then_reports_empty() {
        let mut inventory = Inventory::new(3);
        let mut drawer = drawer().with_contents(vec![key(), Item::new("Coin", "")]);
        drawer.unlock();

        let first = drawer.on_click(&mut inventory);
        let second = drawer.on_click(&mut inventory);
        let third = drawer.on_click(&mut inventory);

        assert_eq!(
            first.effect,
            ClickEffect::ItemAcquired {
                name: "Key".to_string()
            }
        );
        assert_eq!(
            second.effect,
            ClickEffect::ItemAcquired {
                name: "Coin".to_string()
            }
        );
        assert_eq!(third.message, "The Drawer is empty.");
        assert_eq!(inventory.len(), 2);
        assert!(drawer.contents.is_empty());
    }

    #[test]
    fn full_inventory_keeps_container_item_inside() {
        let mut inventory = Inventory::new(1);
        inventory.add(Item::new("Pebble", ""));
        let mut drawer = drawer();
        drawer.unlock();

        let outcome = drawer.on_click(&mut inventory);

        assert_eq!(outcome.message, INVENTORY_FULL_MESSAGE);
        assert_eq!(drawer.contents.len(), 1);
    }

    #[test]
    fn unlock_is_idempotent() {
        let mut drawer = drawer();
        assert_eq!(drawer.unlock(), UnlockResult::Unlocked);
        assert_eq!(drawer.unlock(), UnlockResult::AlreadyUnlocked);
        assert!(!drawer.locked);
        assert_eq!(
            drawer.unlock_message(UnlockResult::AlreadyUnlocked),
            "The Drawer is already unlocked."
        );
    }

    #[test]
    fn collectible_hides_itself_after_pickup() {
        let mut inventory = Inventory::new(3);
        let mut note = InteractiveObject::new(
            "note",
            "Note",
            Rect::new(0, 0, 10, 10),
            BehaviorKind::Collectible {
                item: Item::new("Note", "It reads 3-1-4."),
            },
        );

        let outcome = note.on_click(&mut inventory);

        assert!(!note.visible);
        assert!(!note.hit(Vec2::new(5.0, 5.0)));
        assert_eq!(outcome.message, "You picked up the Note.");
        assert!(inventory.has("Note"));
    }

    #[test]
    fn collectible_stays_visible_when_inventory_is_full() {
        let mut inventory = Inventory::new(0);
        let mut note = InteractiveObject::new(
            "note",
            "Note",
            Rect::new(0, 0, 10, 10),
            BehaviorKind::Collectible {
                item: Item::new("Note", ""),
            },
        );
        let outcome = note.on_click(&mut inventory);
        assert!(note.visible);
        assert_eq!(outcome.effect, ClickEffect::None);
    }

    #[test]
    fn behavior_ignores_display_name() {
        let mut inventory = Inventory::new(3);
        let mut renamed = InteractiveObject::new(
            "door",
            "Drawer",
            Rect::new(0, 0, 10, 10),
            BehaviorKind::Exit {
                key: Some("Key".to_string()),
                leads_to: ExitTarget::NextRoom,
            },
        );
        let outcome = renamed.on_click(&mut inventory);
        assert_eq!(outcome.effect, ClickEffect::ExitThrough(ExitTarget::NextRoom));
        assert!(renamed.accepts_key(&key()));
    }

    #[test]
    fn scenery_returns_flavor_without_mutation() {
        let mut inventory = Inventory::new(3);
        let mut shelf = InteractiveObject::new(
            "shelf",
            "Bookshelf",
            Rect::new(0, 0, 10, 10),
            BehaviorKind::Scenery {
                flavor: "Old books.".to_string(),
            },
        );
        let outcome = shelf.on_click(&mut inventory);
        assert_eq!(outcome.message, "Old books.");
        assert!(shelf.visible);
        assert!(inventory.is_empty());
    }
}
