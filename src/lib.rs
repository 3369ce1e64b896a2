//! Q-Snake - Snake with an online Q-learning agent
//!
//! This library provides:
//! - Core game logic (`game`)
//! - 11-feature observations, Q-network, replay memory and agent (`rl`)
//! - Training statistics and dashboard data (`metrics`)
//! - TUI rendering and keyboard input (`render`, `input`)
//! - Training and keyboard-play modes (`modes`)

pub mod config;
pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod render;
pub mod rl;
