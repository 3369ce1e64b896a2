//! Top-level application configuration
//!
//! Groups the game, agent and training settings so a whole run can be described
//! by one JSON file:
//!
//! ```json
//! {
//!   "game": { "width": 320, "height": 240 },
//!   "agent": { "gamma": 0.95 },
//!   "train": { "num_episodes": 500, "save_path": "runs/small.bin" }
//! }
//! ```
//!
//! Missing sections and fields fall back to their defaults.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::game::GameConfig;
use crate::modes::TrainConfig;
use crate::rl::AgentConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub agent: AgentConfig,
    pub train: TrainConfig,
}

impl AppConfig {
    /// Read a configuration file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: AppConfig = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config
            .validate()
            .map_err(|e| anyhow!("invalid configuration in {:?}: {}", path, e))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.game.validate().map_err(|e| format!("game: {}", e))?;
        self.agent.validate().map_err(|e| format!("agent: {}", e))?;
        self.train.validate().map_err(|e| format!("train: {}", e))?;
        Ok(())
    }
}
