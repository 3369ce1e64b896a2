//! Q-learning agent for the Snake game
//!
//! Provides:
//! - 11-feature board observations
//! - Feed-forward Q-network (11 → 256 → 3)
//! - Epsilon-greedy agent with short- and long-memory updates
//! - Bounded experience replay
//! - Checkpoint save/restore

pub mod agent;
pub mod backend;
pub mod buffer;
pub mod config;
pub mod environment;
pub mod network;
pub mod observation;
pub mod persistence;

pub use agent::{ActionChoice, QAgent, QValues};
pub use backend::{InferenceBackend, TrainingBackend, default_device};
pub use buffer::{ReplayBuffer, Transition};
pub use config::AgentConfig;
pub use environment::SnakeEnvironment;
pub use network::{QNetwork, QNetworkConfig};
pub use observation::{OBSERVATION_SIZE, Observation, observe};
pub use persistence::{
    CheckpointMetadata, checkpoint_exists, load_checkpoint, load_metadata, restore_agent,
    save_checkpoint,
};
