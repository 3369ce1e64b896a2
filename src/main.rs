use anyhow::Result;
use clap::{Parser, ValueEnum};
use env_logger::Env;
use q_snake::config::AppConfig;
use q_snake::modes::{HumanMode, Trainer, human::HUMAN_TICK_MS};
use q_snake::rl::{TrainingBackend, default_device};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "q_snake")]
#[command(version, about = "Snake game with an online Q-learning agent")]
struct Cli {
    /// What to run
    #[arg(long, value_enum, default_value = "train")]
    mode: Mode,

    /// Number of training episodes (default: until interrupted)
    #[arg(long)]
    episodes: Option<usize>,

    /// Checkpoint path; weights and metadata are written next to it
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Train without the dashboard
    #[arg(long)]
    headless: bool,

    /// Milliseconds per game tick
    #[arg(long)]
    tick_ms: Option<u64>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for exploration and food placement
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    /// Train the agent
    Train,
    /// Play snake with keyboard controls
    Play,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The dashboards draw on stderr, so only warnings get through by default there.
    let default_level = match (&cli.mode, cli.headless) {
        (Mode::Train, true) => "info",
        _ => "warn",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    if let Some(episodes) = cli.episodes {
        config.train.num_episodes = Some(episodes);
    }
    if let Some(path) = cli.model_path {
        config.train.save_path = path;
    }
    if let Some(tick_ms) = cli.tick_ms {
        config.train.tick_ms = tick_ms;
    }
    if let Some(seed) = cli.seed {
        config.train.seed = Some(seed);
    }

    match cli.mode {
        Mode::Train => {
            let mut trainer = Trainer::<TrainingBackend>::new(
                config.game,
                config.agent,
                config.train,
                default_device(),
            )?;

            if cli.headless {
                trainer.run_headless()?;
            } else {
                trainer.run().await?;
            }
        }
        Mode::Play => {
            let tick_ms = cli.tick_ms.unwrap_or(HUMAN_TICK_MS);
            let mut human_mode = HumanMode::new(config.game, tick_ms)?;
            human_mode.run().await?;
        }
    }

    Ok(())
}
