use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::game::{Action, Direction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Absolute steering; the engine ignores exact reversals
    GameAction(Action),
    Restart,
    TogglePause,
    /// Speed preset selected with the number keys, 0-based
    Speed(usize),
    Quit,
    None,
}

/// Number of speed presets reachable from the keyboard (keys 1..=4)
pub const SPEED_PRESETS: usize = 4;

pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_key_event(&self, key: KeyEvent) -> KeyAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }

        match key.code {
            // Movement - Arrow keys
            KeyCode::Up => KeyAction::GameAction(Action::Steer(Direction::Up)),
            KeyCode::Down => KeyAction::GameAction(Action::Steer(Direction::Down)),
            KeyCode::Left => KeyAction::GameAction(Action::Steer(Direction::Left)),
            KeyCode::Right => KeyAction::GameAction(Action::Steer(Direction::Right)),

            // Movement - WASD
            KeyCode::Char('w') | KeyCode::Char('W') => {
                KeyAction::GameAction(Action::Steer(Direction::Up))
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                KeyAction::GameAction(Action::Steer(Direction::Down))
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                KeyAction::GameAction(Action::Steer(Direction::Left))
            }
            KeyCode::Char('d') | KeyCode::Char('D') => {
                KeyAction::GameAction(Action::Steer(Direction::Right))
            }

            // Controls
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Restart,
            KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => KeyAction::TogglePause,
            KeyCode::Char(c @ '1'..='4') => KeyAction::Speed(c as usize - '1' as usize),

            _ => KeyAction::None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
