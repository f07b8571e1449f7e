use super::code_lock::CodeLockSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    CodeLock(CodeLockSession),
}

/// Push-down input focus. The room owns input only while the stack is empty;
/// otherwise the top modal receives every key and pointer input is dropped.
#[derive(Debug, Clone, Default)]
pub struct InputFocus {
    stack: Vec<Modal>,
}

impl InputFocus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room_has_focus(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn push(&mut self, modal: Modal) {
        self.stack.push(modal);
    }

    pub fn pop(&mut self) -> Option<Modal> {
        self.stack.pop()
    }

    pub fn top(&self) -> Option<&Modal> {
        self.stack.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Modal> {
        self.stack.last_mut()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    pub fn code_lock(&self) -> Option<&CodeLockSession> {
        self.stack.iter().rev().find_map(|modal| match modal {
            Modal::CodeLock(session) => Some(session),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::ObjectId;

    #[test]
    fn push_takes_focus_and_pop_restores_room() {
        let mut focus = InputFocus::new();
        assert!(focus.room_has_focus());

        focus.push(Modal::CodeLock(CodeLockSession::new(ObjectId::new("drawer"), 3)));
        assert!(!focus.room_has_focus());
        assert_eq!(
            focus.code_lock().map(|session| session.target().as_str()),
            Some("drawer")
        );

        assert!(focus.pop().is_some());
        assert!(focus.room_has_focus());
        assert!(focus.pop().is_none());
    }
}
