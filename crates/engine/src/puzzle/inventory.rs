use super::geometry::{Rect, Vec2};
use super::item::Item;

pub const SCREEN_WIDTH: i32 = 960;
pub const SCREEN_HEIGHT: i32 = 540;
pub const DEFAULT_INVENTORY_CAPACITY: usize = 7;
const SLOT_WIDTH: i32 = 88;
const SLOT_HEIGHT: i32 = 80;
const SLOT_MARGIN: i32 = 12;
const SLOT_ROW_OFFSET_FROM_BOTTOM: i32 = 100;

/// Screen placement of the inventory bar. Slot `i` is always `items[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    pub origin_x: i32,
    pub origin_y: i32,
    pub slot_width: i32,
    pub slot_height: i32,
    pub margin: i32,
}

impl SlotLayout {
    /// Centers `capacity` slots horizontally near the bottom of the screen.
    pub fn centered(capacity: usize, screen_width: i32, screen_height: i32) -> Self {
        let capacity = capacity as i32;
        let row_width = (SLOT_WIDTH + SLOT_MARGIN) * capacity - SLOT_MARGIN;
        Self {
            origin_x: (screen_width - row_width) / 2,
            origin_y: screen_height - SLOT_ROW_OFFSET_FROM_BOTTOM,
            slot_width: SLOT_WIDTH,
            slot_height: SLOT_HEIGHT,
            margin: SLOT_MARGIN,
        }
    }

    pub fn slot_rect(&self, index: usize) -> Rect {
        Rect::new(
            self.origin_x + index as i32 * (self.slot_width + self.margin),
            self.origin_y,
            self.slot_width,
            self.slot_height,
        )
    }
}

#[derive(Debug, Clone)]
pub struct Inventory {
    capacity: usize,
    items: Vec<Item>,
    layout: SlotLayout,
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self::with_layout(
            capacity,
            SlotLayout::centered(capacity, SCREEN_WIDTH, SCREEN_HEIGHT),
        )
    }

    pub fn with_layout(capacity: usize, layout: SlotLayout) -> Self {
        Self {
            capacity,
            items: Vec::with_capacity(capacity),
            layout,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn layout(&self) -> SlotLayout {
        self.layout
    }

    /// Returns false only when the inventory is full. The capacity check runs
    /// before the duplicate guard, so an item already present is accepted
    /// without taking a second slot.
    pub fn add(&mut self, item: Item) -> bool {
        if self.is_full() {
            return false;
        }
        if !self.has(&item.name) {
            self.items.push(item);
        }
        true
    }

    /// Removes the first entry with this name; later slots shift down by one.
    pub fn remove(&mut self, name: &str) -> Option<Item> {
        let index = self.items.iter().position(|item| item.is_named(name))?;
        Some(self.items.remove(index))
    }

    pub fn has(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.is_named(name))
    }

    pub fn slot_rect(&self, index: usize) -> Rect {
        self.layout.slot_rect(index)
    }

    pub fn slot_at(&self, position: Vec2) -> Option<usize> {
        (0..self.capacity).find(|index| self.slot_rect(*index).contains(position))
    }

    /// Hit-tests the slot row. Empty slots yield `None`.
    pub fn handle_click(&self, position: Vec2) -> Option<&Item> {
        self.slot_at(position)
            .and_then(|index| self.items.get(index))
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(DEFAULT_INVENTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> Item {
        Item::new(name, "")
    }

    #[test]
    fn add_never_exceeds_capacity() {
        let mut inventory = Inventory::new(3);
        for index in 0..10 {
            let was_full = inventory.is_full();
            let added = inventory.add(item(&format!("item-{index}")));
            assert_eq!(added, !was_full);
            assert!(inventory.len() <= inventory.capacity());
        }
        assert_eq!(inventory.len(), 3);
    }

    #[test]
    fn duplicate_add_is_accepted_without_a_second_slot() {
        let mut inventory = Inventory::new(3);
        assert!(inventory.add(item("Note")));
        assert!(inventory.add(item("Note")));
        assert_eq!(inventory.len(), 1);
    }

    #[test]
    fn duplicate_add_into_full_inventory_is_rejected() {
        let mut inventory = Inventory::new(1);
        assert!(inventory.add(item("Note")));
        assert!(!inventory.add(item("Note")));
        assert_eq!(inventory.len(), 1);
    }

    #[test]
    fn remove_shifts_later_slots_down() {
        let mut inventory = Inventory::new(4);
        inventory.add(item("a"));
        inventory.add(item("b"));
        inventory.add(item("c"));

        assert_eq!(inventory.remove("b").map(|it| it.name), Some("b".to_string()));
        let names: Vec<_> = inventory.items().iter().map(|it| it.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
        assert!(inventory.remove("missing").is_none());
        assert_eq!(inventory.len(), 2);
    }

    #[test]
    fn handle_click_maps_slot_index_to_item() {
        let mut inventory = Inventory::new(7);
        inventory.add(item("Key"));
        inventory.add(item("Note"));

        let second = inventory.slot_rect(1).center();
        let third = inventory.slot_rect(2).center();
        assert_eq!(
            inventory.handle_click(second).map(|it| it.name.as_str()),
            Some("Note")
        );
        assert!(inventory.handle_click(third).is_none());
        assert!(inventory.handle_click(Vec2::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn centered_layout_matches_screen_geometry() {
        let layout = SlotLayout::centered(7, SCREEN_WIDTH, SCREEN_HEIGHT);
        assert_eq!(layout.origin_x, 136);
        assert_eq!(layout.origin_y, 440);
        assert_eq!(layout.slot_rect(6).right(), SCREEN_WIDTH - 136);
    }
}
