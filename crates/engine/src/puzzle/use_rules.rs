use std::collections::HashMap;

use super::item::Item;
use super::object::{InteractiveObject, ObjectId, UnlockResult};

pub const CANNOT_USE_MESSAGE: &str = "That can't be used here.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UseEffect {
    /// Opens the object whether or not a key is configured for it.
    Open,
    Inspect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseRule {
    pub effect: UseEffect,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RuleTarget {
    Object(ObjectId),
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseOutcome {
    pub message: String,
    pub unlocked: bool,
}

/// Rules for applying a held item to an object. Items are tools: no rule
/// consumes the item it is applied with.
#[derive(Debug, Clone, Default)]
pub struct UseRuleTable {
    rules: HashMap<(String, RuleTarget), UseRule>,
}

impl UseRuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: &str, target: Option<ObjectId>, rule: UseRule) {
        let target = match target {
            Some(id) => RuleTarget::Object(id),
            None => RuleTarget::Any,
        };
        self.rules.insert((item.to_string(), target), rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn lookup(&self, item: &str, object: &ObjectId) -> Option<&UseRule> {
        self.rules
            .get(&(item.to_string(), RuleTarget::Object(object.clone())))
            .or_else(|| self.rules.get(&(item.to_string(), RuleTarget::Any)))
    }

    /// Resolves `item` on `object`: explicit rule, then wildcard rule, then the
    /// object's own key. Anything else changes nothing.
    pub fn apply(&self, item: &Item, object: &mut InteractiveObject) -> UseOutcome {
        if let Some(rule) = self.lookup(&item.name, &object.id) {
            return match rule.effect {
                UseEffect::Inspect => UseOutcome {
                    message: rule
                        .message
                        .clone()
                        .unwrap_or_else(|| item.description.clone()),
                    unlocked: false,
                },
                UseEffect::Open => unlock_outcome(object, rule.message.as_deref()),
            };
        }

        if object.accepts_key(item) {
            return unlock_outcome(object, None);
        }

        UseOutcome {
            message: CANNOT_USE_MESSAGE.to_string(),
            unlocked: false,
        }
    }
}

fn unlock_outcome(object: &mut InteractiveObject, custom: Option<&str>) -> UseOutcome {
    let result = object.unlock();
    let message = match (result, custom) {
        (UnlockResult::Unlocked, Some(custom)) => custom.to_string(),
        _ => object.unlock_message(result),
    };
    UseOutcome {
        message,
        unlocked: result == UnlockResult::Unlocked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::{BehaviorKind, ExitTarget, Rect};

    fn door() -> InteractiveObject {
        InteractiveObject::new(
            "door",
            "Door",
            Rect::new(0, 0, 10, 10),
            BehaviorKind::Exit {
                key: Some("Key".to_string()),
                leads_to: ExitTarget::Escape,
            },
        )
        .locked(true)
    }

    fn table() -> UseRuleTable {
        let mut table = UseRuleTable::new();
        table.insert(
            "Axe",
            Some(ObjectId::new("door")),
            UseRule {
                effect: UseEffect::Open,
                message: Some("You hack the door open!".to_string()),
            },
        );
        table.insert(
            "Note",
            None,
            UseRule {
                effect: UseEffect::Inspect,
                message: Some("It says 3-1-4.".to_string()),
            },
        );
        table
    }

    #[test]
    fn configured_key_unlocks_without_a_rule() {
        let mut door = door();
        let outcome = UseRuleTable::new().apply(&Item::new("Key", ""), &mut door);
        assert!(outcome.unlocked);
        assert!(!door.locked);
    }

    #[test]
    fn key_on_unlocked_object_reports_already_unlocked() {
        let mut door = door();
        door.unlock();
        let outcome = UseRuleTable::new().apply(&Item::new("Key", ""), &mut door);
        assert!(!outcome.unlocked);
        assert_eq!(outcome.message, "The Door is already unlocked.");
    }

    #[test]
    fn open_rule_uses_custom_message() {
        let mut door = door();
        let outcome = table().apply(&Item::new("Axe", ""), &mut door);
        assert_eq!(outcome.message, "You hack the door open!");
        assert!(!door.locked);
    }

    #[test]
    fn wildcard_inspect_rule_matches_any_object_and_changes_nothing() {
        let mut door = door();
        let outcome = table().apply(&Item::new("Note", ""), &mut door);
        assert_eq!(outcome.message, "It says 3-1-4.");
        assert!(door.locked);
    }

    #[test]
    fn unmatched_pair_cannot_be_used() {
        let mut door = door();
        let outcome = table().apply(&Item::new("Coin", ""), &mut door);
        assert_eq!(outcome.message, CANNOT_USE_MESSAGE);
        assert!(door.locked);
    }
}
