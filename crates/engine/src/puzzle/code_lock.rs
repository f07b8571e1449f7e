use super::object::ObjectId;

/// Keys the puzzle layer understands. The window layer maps physical keys
/// (top row and keypad digits alike) onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuzzleKey {
    Digit(u8),
    Backspace,
    Submit,
    Cancel,
    ToggleRoom,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeLockState {
    Entering,
    SubmittedCorrect,
    SubmittedIncorrect,
    Cancelled,
}

impl CodeLockState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Entering)
    }
}

/// Modal code entry bound to one object. The session never touches the object
/// directly; it reports a terminal state and the owner applies the unlock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLockSession {
    target: ObjectId,
    expected_length: usize,
    buffer: String,
    state: CodeLockState,
}

impl CodeLockSession {
    pub fn new(target: ObjectId, expected_length: usize) -> Self {
        Self {
            target,
            expected_length,
            buffer: String::with_capacity(expected_length),
            state: CodeLockState::Entering,
        }
    }

    pub fn target(&self) -> &ObjectId {
        &self.target
    }

    pub fn expected_length(&self) -> usize {
        self.expected_length
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn state(&self) -> CodeLockState {
        self.state
    }

    /// Buffer padded with underscores up to the expected length, as shown on
    /// the panel.
    pub fn display_text(&self) -> String {
        let missing = self.expected_length.saturating_sub(self.buffer.len());
        format!("{}{}", self.buffer, "_".repeat(missing))
    }

    /// Feeds one key. `required_code` is the target's stored code; it is only
    /// read on submit. Keys after a terminal state are ignored.
    pub fn handle_key(&mut self, key: PuzzleKey, required_code: &str) -> CodeLockState {
        if self.state.is_terminal() {
            return self.state;
        }
        match key {
            PuzzleKey::Digit(digit) if digit <= 9 => {
                if self.buffer.len() < self.expected_length {
                    self.buffer.push(char::from(b'0' + digit));
                }
            }
            PuzzleKey::Backspace => {
                self.buffer.pop();
            }
            PuzzleKey::Cancel => self.state = CodeLockState::Cancelled,
            PuzzleKey::Submit => {
                self.state = if self.buffer == required_code {
                    CodeLockState::SubmittedCorrect
                } else {
                    CodeLockState::SubmittedIncorrect
                };
            }
            _ => {}
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> CodeLockSession {
        CodeLockSession::new(ObjectId::new("drawer"), 3)
    }

    fn type_digits(session: &mut CodeLockSession, digits: &str) {
        for ch in digits.chars() {
            let digit = ch.to_digit(10).expect("digit") as u8;
            session.handle_key(PuzzleKey::Digit(digit), "314");
        }
    }

    #[test]
    fn digits_stop_at_expected_length() {
        let mut session = session();
        type_digits(&mut session, "31459");
        assert_eq!(session.buffer(), "314");
        assert_eq!(session.state(), CodeLockState::Entering);
    }

    #[test]
    fn backspace_drops_last_digit_and_is_noop_when_empty() {
        let mut session = session();
        session.handle_key(PuzzleKey::Backspace, "314");
        assert_eq!(session.buffer(), "");
        type_digits(&mut session, "31");
        session.handle_key(PuzzleKey::Backspace, "314");
        assert_eq!(session.buffer(), "3");
        assert_eq!(session.display_text(), "3__");
    }

    #[test]
    fn exact_code_submits_correct() {
        let mut session = session();
        type_digits(&mut session, "314");
        assert_eq!(
            session.handle_key(PuzzleKey::Submit, "314"),
            CodeLockState::SubmittedCorrect
        );
    }

    #[test]
    fn wrong_or_short_code_submits_incorrect() {
        for attempt in ["999", "31", "", "413"] {
            let mut session = session();
            type_digits(&mut session, attempt);
            assert_eq!(
                session.handle_key(PuzzleKey::Submit, "314"),
                CodeLockState::SubmittedIncorrect,
                "attempt {attempt:?}"
            );
        }
    }

    #[test]
    fn non_digit_keys_are_ignored_while_entering() {
        let mut session = session();
        type_digits(&mut session, "3");
        session.handle_key(PuzzleKey::ToggleRoom, "314");
        session.handle_key(PuzzleKey::Other, "314");
        session.handle_key(PuzzleKey::Digit(12), "314");
        assert_eq!(session.buffer(), "3");
        assert_eq!(session.state(), CodeLockState::Entering);
    }

    #[test]
    fn terminal_state_absorbs_further_keys() {
        let mut session = session();
        session.handle_key(PuzzleKey::Cancel, "314");
        type_digits(&mut session, "314");
        assert_eq!(session.buffer(), "");
        assert_eq!(
            session.handle_key(PuzzleKey::Submit, "314"),
            CodeLockState::Cancelled
        );
    }
}
