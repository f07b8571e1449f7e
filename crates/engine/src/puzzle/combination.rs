use std::collections::BTreeMap;

use super::inventory::Inventory;
use super::item::Item;

/// Lexicographically ordered pair, so `(a, b)` and `(b, a)` share one entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    pub fn names(&self) -> (&str, &str) {
        (&self.first, &self.second)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombineOutcome {
    Combined { result: Item },
    NoRecipe,
    MissingIngredient { name: String },
    SameItem,
    /// The result is already in the inventory; adding it again would be a no-op
    /// and the two sources would vanish.
    ResultAlreadyHeld { result: Item },
}

#[derive(Debug, Clone, Default)]
pub struct CombinationRegistry {
    recipes: BTreeMap<PairKey, Item>,
}

impl CombinationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a recipe. A later registration for the same pair replaces the
    /// earlier result.
    pub fn register(&mut self, a: &str, b: &str, result: Item) -> Option<Item> {
        self.recipes.insert(PairKey::new(a, b), result)
    }

    pub fn lookup(&self, a: &str, b: &str) -> Option<&Item> {
        self.recipes.get(&PairKey::new(a, b))
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Combines two inventory items. Every check runs before the first removal,
    /// so a failed combination leaves the inventory untouched.
    pub fn combine(&self, inventory: &mut Inventory, a: &str, b: &str) -> CombineOutcome {
        if a == b {
            return CombineOutcome::SameItem;
        }
        for name in [a, b] {
            if !inventory.has(name) {
                return CombineOutcome::MissingIngredient {
                    name: name.to_string(),
                };
            }
        }
        let Some(result) = self.lookup(a, b).cloned() else {
            return CombineOutcome::NoRecipe;
        };
        if inventory.has(&result.name) {
            return CombineOutcome::ResultAlreadyHeld { result };
        }

        inventory.remove(a);
        inventory.remove(b);
        // Two slots were just freed, so the result always fits.
        inventory.add(result.clone());
        CombineOutcome::Combined { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CombinationRegistry {
        let mut registry = CombinationRegistry::new();
        registry.register("Stick", "Tape", Item::new("Hook", "A makeshift hook."));
        registry
    }

    fn stocked_inventory(names: &[&str]) -> Inventory {
        let mut inventory = Inventory::new(4);
        for name in names {
            assert!(inventory.add(Item::new(*name, "")));
        }
        inventory
    }

    #[test]
    fn pair_key_is_order_independent() {
        assert_eq!(PairKey::new("b", "a"), PairKey::new("a", "b"));
        assert_eq!(PairKey::new("b", "a").names(), ("a", "b"));
        assert!(registry().lookup("Tape", "Stick").is_some());
    }

    #[test]
    fn successful_combination_replaces_both_sources_with_result() {
        let registry = registry();
        let mut inventory = stocked_inventory(&["Stick", "Note", "Tape"]);

        let outcome = registry.combine(&mut inventory, "Tape", "Stick");

        assert!(matches!(
            outcome,
            CombineOutcome::Combined { ref result } if result.name == "Hook"
        ));
        assert!(!inventory.has("Stick"));
        assert!(!inventory.has("Tape"));
        assert!(inventory.has("Hook"));
        assert_eq!(inventory.len(), 2);
    }

    #[test]
    fn failed_combination_leaves_both_sources_present() {
        let registry = registry();
        let mut inventory = stocked_inventory(&["Stick", "Note"]);

        let outcome = registry.combine(&mut inventory, "Stick", "Note");

        assert_eq!(outcome, CombineOutcome::NoRecipe);
        assert!(inventory.has("Stick"));
        assert!(inventory.has("Note"));
        assert_eq!(inventory.len(), 2);
    }

    #[test]
    fn missing_ingredient_is_reported_before_any_removal() {
        let registry = registry();
        let mut inventory = stocked_inventory(&["Stick"]);

        let outcome = registry.combine(&mut inventory, "Stick", "Tape");

        assert_eq!(
            outcome,
            CombineOutcome::MissingIngredient {
                name: "Tape".to_string()
            }
        );
        assert!(inventory.has("Stick"));
    }

    #[test]
    fn result_already_in_inventory_leaves_everything_in_place() {
        let registry = registry();
        let mut inventory = stocked_inventory(&["Stick", "Tape", "Hook"]);

        let outcome = registry.combine(&mut inventory, "Stick", "Tape");

        assert!(matches!(
            outcome,
            CombineOutcome::ResultAlreadyHeld { ref result } if result.name == "Hook"
        ));
        assert_eq!(inventory.len(), 3);
        assert!(inventory.has("Stick"));
        assert!(inventory.has("Tape"));
        assert!(inventory.has("Hook"));
    }

    #[test]
    fn combining_an_item_with_itself_is_rejected() {
        let registry = registry();
        let mut inventory = stocked_inventory(&["Stick"]);
        assert_eq!(
            registry.combine(&mut inventory, "Stick", "Stick"),
            CombineOutcome::SameItem
        );
        assert_eq!(inventory.len(), 1);
    }
}
