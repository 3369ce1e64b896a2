//! Online training mode for the Q-learning agent
//!
//! [`Trainer::step`] advances the run by exactly one game step:
//!
//! 1. Acting: observe the board, pick an action epsilon-greedily and apply it
//! 2. Evaluating: one short-memory update on the new transition, then store it
//! 3. Episode end (only when the step was terminal): reset the board, count the
//!    game, run a long-memory update, checkpoint on a new record and report
//!
//! The driver is external: [`Trainer::run_headless`] loops in place, while
//! [`Trainer::run`] steps once per timer tick and draws the dashboard.
//!
//! # Example
//!
//! ```rust,no_run
//! use q_snake::game::GameConfig;
//! use q_snake::modes::{TrainConfig, Trainer};
//! use q_snake::rl::{AgentConfig, TrainingBackend, default_device};
//!
//! let config = TrainConfig {
//!     num_episodes: Some(100),
//!     ..Default::default()
//! };
//!
//! let mut trainer = Trainer::<TrainingBackend>::new(
//!     GameConfig::default(),
//!     AgentConfig::default(),
//!     config,
//!     default_device(),
//! )?;
//! trainer.run_headless()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context, Result, anyhow};
use burn::tensor::backend::AutodiffBackend;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use log::{debug, info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::{Deserialize, Serialize};
use std::io::{Stderr, stderr};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{Interval, interval};

use crate::game::{GameConfig, RelativeAction};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::{Dashboard, TrainingStats};
use crate::render::{Renderer, TrainingView};
use crate::rl::{
    AgentConfig, Observation, QAgent, QValues, SnakeEnvironment, Transition, checkpoint_exists,
    restore_agent, save_checkpoint,
};

/// Tick lengths selected with keys 1-4 in the dashboard
pub const SPEED_PRESETS_MS: [u64; 4] = [100, 25, 5, 1];

/// Configuration for training mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Number of episodes to train; `None` trains until interrupted
    pub num_episodes: Option<usize>,

    /// Checkpoint location; weights go to `<path>.mpk`, metadata to `<path>.meta.json`
    pub save_path: PathBuf,

    /// Milliseconds between training steps in the dashboard
    pub tick_ms: u64,

    /// Print a progress line every N episodes when headless
    pub log_frequency: usize,

    /// Rolling window for smoothed statistics
    pub stats_window: usize,

    /// Seed for exploration, replay sampling and food placement
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            num_episodes: None,
            save_path: PathBuf::from("model/model.bin"),
            tick_ms: 25,
            log_frequency: 10,
            stats_window: 100,
            seed: None,
        }
    }
}

impl TrainConfig {
    pub fn new(num_episodes: usize, save_path: PathBuf) -> Self {
        Self {
            num_episodes: Some(num_episodes),
            save_path,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.num_episodes == Some(0) {
            return Err("num_episodes must be at least 1".to_string());
        }

        if self.tick_ms == 0 {
            return Err("tick_ms must be at least 1".to_string());
        }

        if self.log_frequency == 0 {
            return Err("log_frequency must be at least 1".to_string());
        }

        if self.stats_window == 0 {
            return Err("stats_window must be at least 1".to_string());
        }

        if self.save_path.as_os_str().is_empty() {
            return Err("save_path must not be empty".to_string());
        }

        Ok(())
    }
}

/// Report emitted when an episode finishes
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    /// Games played by the agent, including any restored from a checkpoint
    pub game: usize,
    pub score: u32,
    pub record: u32,
    /// Total score divided by episodes of this run
    pub mean_score: f32,
    pub new_record: bool,
    pub steps: usize,
    /// Loss of the long-memory update
    pub long_memory_loss: Option<f32>,
}

/// Everything that happened in one call to [`Trainer::step`]
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub action: RelativeAction,
    /// Present when the action was chosen greedily
    pub q_values: Option<QValues>,
    pub reward: f32,
    pub done: bool,
    /// Score after the step (before any reset)
    pub score: u32,
    /// Loss of the short-memory update
    pub loss: f32,
    pub episode: Option<EpisodeSummary>,
}

/// Online Q-learning trainer
pub struct Trainer<B: AutodiffBackend> {
    agent: QAgent<B>,
    env: SnakeEnvironment,
    stats: TrainingStats,
    dashboard: Dashboard,
    config: TrainConfig,
    observation: Observation,
    episode_steps: usize,
}

impl<B: AutodiffBackend> Trainer<B> {
    /// Create a trainer, restoring the checkpoint at `config.save_path` if present
    pub fn new(
        game_config: GameConfig,
        agent_config: AgentConfig,
        config: TrainConfig,
        device: B::Device,
    ) -> Result<Self> {
        game_config
            .validate()
            .map_err(|e| anyhow!("invalid game configuration: {}", e))?;
        config
            .validate()
            .map_err(|e| anyhow!("invalid training configuration: {}", e))?;

        let (agent, record) = if checkpoint_exists(&config.save_path) {
            let (agent, record) = restore_agent::<B>(&config.save_path, agent_config, device)
                .with_context(|| format!("Failed to restore checkpoint {:?}", config.save_path))?;
            info!(
                "Loaded checkpoint {:?}: {} games played, record {}",
                config.save_path,
                agent.games_played(),
                record
            );
            (agent, record)
        } else {
            warn!(
                "No checkpoint at {:?}; starting from random weights",
                config.save_path
            );
            (QAgent::new(agent_config, device)?, 0)
        };

        let (agent, env) = match config.seed {
            Some(seed) => (
                agent.with_seed(seed),
                SnakeEnvironment::with_seed(game_config.clone(), seed.wrapping_add(1)),
            ),
            None => (agent, SnakeEnvironment::new(game_config.clone())),
        };

        let observation = env.observation();

        Ok(Self {
            agent,
            env,
            stats: TrainingStats::new(config.stats_window).with_record(record),
            dashboard: Dashboard::new(game_config.cols(), game_config.rows()),
            config,
            observation,
            episode_steps: 0,
        })
    }

    /// Run one game step, including the episode-end bookkeeping when it is terminal
    pub fn step(&mut self) -> Result<StepOutcome> {
        let observation = self.observation;
        let choice = self.agent.select_action(&observation)?;
        let block_size = self.env.config().block_size;
        self.dashboard
            .record_visit(self.env.state().snake.head(), block_size);

        let result = self.env.step_detailed(choice.action);
        let next_observation = self.env.observation();
        let head = self.env.state().snake.head();

        let transition = Transition {
            observation,
            action: choice.action,
            reward: result.reward,
            next_observation,
            done: result.terminated,
        };
        let loss = self.agent.train_short_memory(&transition);
        self.agent.remember(transition);

        self.stats.record_loss(loss);
        self.dashboard.record_step(
            choice.action,
            choice.q_values,
            result.reward,
            head,
            block_size,
        );
        self.episode_steps += 1;

        debug!(
            "step {}: {:?} reward {} loss {:.4}{}",
            self.episode_steps,
            choice.action,
            result.reward,
            loss,
            if choice.explored() { " (explore)" } else { "" }
        );

        let episode = if result.terminated {
            Some(self.finish_episode(result.score)?)
        } else {
            self.observation = next_observation;
            None
        };

        Ok(StepOutcome {
            action: choice.action,
            q_values: choice.q_values,
            reward: result.reward,
            done: result.terminated,
            score: result.score,
            loss,
            episode,
        })
    }

    fn finish_episode(&mut self, score: u32) -> Result<EpisodeSummary> {
        self.observation = self.env.reset();
        self.agent.increment_games();

        let long_memory_loss = self.agent.train_long_memory();
        if let Some(loss) = long_memory_loss {
            self.stats.record_loss(loss);
        }

        let steps = self.episode_steps;
        self.episode_steps = 0;
        let new_record = self.stats.record_episode(score, steps);

        if new_record {
            save_checkpoint(&self.agent, score, &self.config.save_path).with_context(|| {
                format!("Failed to save checkpoint to {:?}", self.config.save_path)
            })?;
            info!(
                "New record {}; checkpoint saved to {:?}",
                score, self.config.save_path
            );
        }

        let summary = EpisodeSummary {
            game: self.agent.games_played(),
            score,
            record: self.stats.record(),
            mean_score: self.stats.mean_score(),
            new_record,
            steps,
            long_memory_loss,
        };

        info!(
            "Game {} Score {} Record {} Mean {:.2}",
            summary.game, summary.score, summary.record, summary.mean_score
        );

        Ok(summary)
    }

    /// Whether the configured number of episodes has been played
    pub fn is_finished(&self) -> bool {
        self.config
            .num_episodes
            .is_some_and(|n| self.stats.episodes() >= n)
    }

    /// Train without a terminal UI until the episode budget is used up
    pub fn run_headless(&mut self) -> Result<()> {
        self.print_header();

        while !self.is_finished() {
            if let Some(summary) = self.step()?.episode {
                if self.stats.episodes() % self.config.log_frequency == 0 {
                    self.print_progress(&summary);
                }
            }
        }

        println!("\nTraining complete!");
        println!("Best model saved to: {:?}", self.config.save_path);
        println!("\nFinal Statistics:");
        println!("{}", self.stats.format_summary());

        Ok(())
    }

    /// Train with the live dashboard, one step per tick
    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        let result = self.run_training_loop(&mut terminal).await;

        cleanup_terminal(&mut terminal)?;

        if result.is_ok() {
            println!("{}", self.stats.format_summary());
        }
        result
    }

    async fn run_training_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();
        let input_handler = InputHandler::new();

        let mut tick_ms = self.config.tick_ms;
        let mut tick_timer = interval(Duration::from_millis(tick_ms));

        // Render at 30 FPS
        let mut render_timer = interval(Duration::from_millis(33));

        let mut paused = false;
        let mut should_quit = false;

        loop {
            tokio::select! {
                maybe_event = event_stream.next() => {
                    if let Some(Ok(Event::Key(key))) = maybe_event {
                        if key.kind == KeyEventKind::Press {
                            match input_handler.handle_key_event(key) {
                                KeyAction::Quit => should_quit = true,
                                KeyAction::TogglePause => paused = !paused,
                                KeyAction::Speed(preset) => {
                                    tick_ms = SPEED_PRESETS_MS[preset.min(SPEED_PRESETS_MS.len() - 1)];
                                    change_tick(&mut tick_timer, tick_ms);
                                }
                                _ => {}
                            }
                        }
                    }
                }

                _ = tick_timer.tick() => {
                    if !paused {
                        self.step()?;
                        if self.is_finished() {
                            should_quit = true;
                        }
                    }
                }

                _ = render_timer.tick() => {
                    let view = TrainingView {
                        state: self.env.state(),
                        stats: &self.stats,
                        dashboard: &self.dashboard,
                        games_played: self.agent.games_played(),
                        epsilon: self.agent.epsilon(),
                        paused,
                        tick_ms,
                    };
                    terminal.draw(|frame| {
                        Renderer::new().render_training(frame, &view);
                    }).context("Failed to draw frame")?;
                }

                _ = tokio::signal::ctrl_c() => {
                    should_quit = true;
                }
            }

            if should_quit {
                break;
            }
        }

        Ok(())
    }

    fn print_header(&self) {
        let agent = self.agent.config();
        println!("{}", "=".repeat(70));
        println!("Q-Learning Training - Snake");
        println!("{}", "=".repeat(70));
        match self.config.num_episodes {
            Some(n) => println!("Episodes: {}", n),
            None => println!("Episodes: until interrupted"),
        }
        let game = self.env.config();
        println!(
            "Board: {}x{} px ({}x{} cells)",
            game.width,
            game.height,
            game.cols(),
            game.rows()
        );
        println!("Agent Config:");
        println!("  Learning rate: {}", agent.learning_rate);
        println!("  Gamma: {}", agent.gamma);
        println!("  Replay memory: {}", agent.memory_capacity);
        println!("  Batch size: {}", agent.batch_size);
        println!("  Hidden layer: {}", agent.hidden_size);
        println!("Games already played: {}", self.agent.games_played());
        println!("Save path: {:?}", self.config.save_path);
        println!("{}", "=".repeat(70));
        println!();
    }

    fn print_progress(&self, summary: &EpisodeSummary) {
        println!(
            "[Game {}] Score: {} | {}",
            summary.game,
            summary.score,
            self.stats.format_summary()
        );
    }

    pub fn agent(&self) -> &QAgent<B> {
        &self.agent
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn environment(&self) -> &SnakeEnvironment {
        &self.env
    }
}

fn change_tick(tick_timer: &mut Interval, tick_ms: u64) {
    *tick_timer = interval(Duration::from_millis(tick_ms));
}

pub(crate) fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stderr>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}
