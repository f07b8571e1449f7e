use std::collections::{HashSet, VecDeque};

use winit::event::{ElementState, MouseButton};
use tracing::warn;
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::puzzle::{PuzzleKey, Vec2};

/// Actions beyond this many pending ones are dropped until the loop catches up.
pub(crate) const MAX_PENDING_ACTIONS: usize = 8;

/// One discrete thing the player did. The loop applies at most one per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    Pointer(Vec2),
    Key(PuzzleKey),
    DumpState,
}

/// Collects window events between ticks. Keys and the left button are
/// edge-triggered: holding a key down queues exactly one action.
#[derive(Debug, Default)]
pub(crate) struct InputCollector {
    queue: VecDeque<InputAction>,
    keys_down: HashSet<KeyCode>,
    left_mouse_is_down: bool,
    cursor_position: Option<Vec2>,
}

impl InputCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn handle_key(&mut self, key: PhysicalKey, state: ElementState) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match state {
            ElementState::Pressed => {
                if !self.keys_down.insert(code) {
                    return;
                }
                if let Some(action) = action_for_key(code) {
                    self.enqueue(action);
                }
            }
            ElementState::Released => {
                self.keys_down.remove(&code);
            }
        }
    }

    /// `position` is already in logical screen space; `None` means the cursor
    /// is outside the drawable area.
    pub(crate) fn set_cursor_position(&mut self, position: Option<Vec2>) {
        self.cursor_position = position;
    }

    pub(crate) fn cursor_position(&self) -> Option<Vec2> {
        self.cursor_position
    }

    pub(crate) fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => {
                if !self.left_mouse_is_down {
                    if let Some(position) = self.cursor_position {
                        self.enqueue(InputAction::Pointer(position));
                    }
                }
                self.left_mouse_is_down = true;
            }
            ElementState::Released => self.left_mouse_is_down = false,
        }
    }

    fn enqueue(&mut self, action: InputAction) {
        if self.queue.len() >= MAX_PENDING_ACTIONS {
            warn!(
                action = ?action,
                max_pending = MAX_PENDING_ACTIONS,
                "input_backlog_dropped"
            );
            return;
        }
        self.queue.push_back(action);
    }

    pub(crate) fn next_action(&mut self) -> Option<InputAction> {
        self.queue.pop_front()
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.len()
    }
}

fn action_for_key(code: KeyCode) -> Option<InputAction> {
    let key = match code {
        KeyCode::Digit0 | KeyCode::Numpad0 => PuzzleKey::Digit(0),
        KeyCode::Digit1 | KeyCode::Numpad1 => PuzzleKey::Digit(1),
        KeyCode::Digit2 | KeyCode::Numpad2 => PuzzleKey::Digit(2),
        KeyCode::Digit3 | KeyCode::Numpad3 => PuzzleKey::Digit(3),
        KeyCode::Digit4 | KeyCode::Numpad4 => PuzzleKey::Digit(4),
        KeyCode::Digit5 | KeyCode::Numpad5 => PuzzleKey::Digit(5),
        KeyCode::Digit6 | KeyCode::Numpad6 => PuzzleKey::Digit(6),
        KeyCode::Digit7 | KeyCode::Numpad7 => PuzzleKey::Digit(7),
        KeyCode::Digit8 | KeyCode::Numpad8 => PuzzleKey::Digit(8),
        KeyCode::Digit9 | KeyCode::Numpad9 => PuzzleKey::Digit(9),
        KeyCode::Backspace => PuzzleKey::Backspace,
        KeyCode::Enter | KeyCode::NumpadEnter => PuzzleKey::Submit,
        KeyCode::Escape => PuzzleKey::Cancel,
        KeyCode::Tab => PuzzleKey::ToggleRoom,
        KeyCode::F2 => return Some(InputAction::DumpState),
        _ => PuzzleKey::Other,
    };
    Some(InputAction::Key(key))
}
