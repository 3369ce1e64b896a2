//! Checkpoint persistence for the Q-learning agent
//!
//! A checkpoint is two files next to each other:
//! - `<path>.mpk` - network weights (Burn named MessagePack record)
//! - `<path>.meta.json` - layer sizes, games played and best score

use super::{QAgent, QNetwork};
use crate::rl::network::QNetworkConfig;
use anyhow::{Context, Result, bail};
use burn::{
    module::Module,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata saved with the weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Layer sizes of the saved network
    pub network: QNetworkConfig,

    /// Games completed when the checkpoint was written
    pub games_played: usize,

    /// Best score at save time
    pub record: u32,

    /// Crate version that wrote the checkpoint
    pub version: String,
}

impl CheckpointMetadata {
    pub fn new(network: QNetworkConfig, games_played: usize, record: u32) -> Self {
        Self {
            network,
            games_played,
            record,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Path of the metadata file belonging to a checkpoint
pub fn metadata_path(path: &Path) -> PathBuf {
    path.with_extension("meta.json")
}

/// Whether a checkpoint has been written at `path`
pub fn checkpoint_exists(path: &Path) -> bool {
    metadata_path(path).is_file()
}

/// Save the agent's network and training progress.
///
/// Parent directories are created as needed; an existing checkpoint at the same
/// path is overwritten.
pub fn save_checkpoint<B: AutodiffBackend>(agent: &QAgent<B>, record: u32, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    recorder
        .record(agent.network().clone().into_record(), path.to_path_buf())
        .context("Failed to save network weights")?;

    let metadata = CheckpointMetadata::new(
        QAgent::<B>::network_config(agent.config()),
        agent.games_played(),
        record,
    );

    let meta_path = metadata_path(path);
    let meta_json =
        serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?;
    std::fs::write(&meta_path, meta_json)
        .with_context(|| format!("Failed to write metadata to {:?}", meta_path))?;

    Ok(())
}

/// Read only the metadata of a checkpoint
pub fn load_metadata(path: &Path) -> Result<CheckpointMetadata> {
    let meta_path = metadata_path(path);
    let meta_json = std::fs::read_to_string(&meta_path)
        .with_context(|| format!("Failed to read metadata from {:?}", meta_path))?;
    serde_json::from_str(&meta_json).context("Failed to deserialize metadata")
}

/// Load a network saved by [`save_checkpoint`].
///
/// Fails if the saved layer sizes differ from `expected`.
pub fn load_checkpoint<B: AutodiffBackend>(
    path: &Path,
    expected: QNetworkConfig,
    device: &B::Device,
) -> Result<(QNetwork<B>, CheckpointMetadata)> {
    let metadata = load_metadata(path)?;

    if metadata.network != expected {
        bail!(
            "checkpoint {:?} has layers {:?}, expected {:?}",
            path,
            metadata.network,
            expected
        );
    }

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let record = recorder
        .load(path.to_path_buf(), device)
        .with_context(|| format!("Failed to load network weights from {:?}", path))?;

    let network = metadata.network.init::<B>(device).load_record(record);

    Ok((network, metadata))
}

/// Rebuild an agent from a checkpoint, restoring its game counter.
///
/// Returns the agent and the saved record score.
pub fn restore_agent<B: AutodiffBackend>(
    path: &Path,
    config: super::AgentConfig,
    device: B::Device,
) -> Result<(QAgent<B>, u32)> {
    let expected = QAgent::<B>::network_config(&config);
    let (network, metadata) = load_checkpoint::<B>(path, expected, &device)?;

    let mut agent = QAgent::from_network(network, config, device)?;
    agent.set_games_played(metadata.games_played);

    Ok((agent, metadata.record))
}
