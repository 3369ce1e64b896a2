//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! It is driven both by the keyboard variant and by the learning agent.

pub mod action;
pub mod config;
pub mod engine;
pub mod state;

// Re-export commonly used types
pub use action::{Action, Direction, RelativeAction};
pub use config::GameConfig;
pub use engine::{GameEngine, StepInfo, StepResult};
pub use state::{CollisionType, GameState, Position, Snake};
