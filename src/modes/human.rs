use anyhow::{Context, Result, anyhow};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, enable_raw_mode},
};
use futures::StreamExt;
use log::info;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::time::Duration;
use tokio::time::interval;

use super::train::cleanup_terminal;
use crate::game::{Action, Direction, GameConfig, GameEngine, GameState};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::TrainingStats;
use crate::render::Renderer;

/// Default tick for keyboard play
pub const HUMAN_TICK_MS: u64 = 150;

/// Keyboard-driven Snake on the same engine the agent trains on
pub struct HumanMode {
    engine: GameEngine,
    state: GameState,
    stats: TrainingStats,
    renderer: Renderer,
    input_handler: InputHandler,
    tick: Duration,
    should_quit: bool,
    paused: bool,
    pending_direction: Option<Direction>,
}

impl HumanMode {
    /// Create a game; the stagnation cutoff is dropped for keyboard play
    pub fn new(config: GameConfig, tick_ms: u64) -> Result<Self> {
        let config = GameConfig {
            stagnation_factor: None,
            ..config
        };
        config
            .validate()
            .map_err(|e| anyhow!("invalid game configuration: {}", e))?;

        let mut engine = GameEngine::new(config);
        let state = engine.reset();

        Ok(Self {
            engine,
            state,
            stats: TrainingStats::new(100),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            tick: Duration::from_millis(tick_ms.max(1)),
            should_quit: false,
            paused: false,
            pending_direction: None,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        let result = self.run_game_loop(&mut terminal).await;

        cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();
        let mut tick_timer = interval(self.tick);

        // Render at 30 FPS (33ms per frame)
        let mut render_timer = interval(Duration::from_millis(33));

        loop {
            tokio::select! {
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event);
                    }
                }

                _ = tick_timer.tick() => {
                    if self.state.is_alive && !self.paused {
                        self.update_game();
                    }
                }

                _ = render_timer.tick() => {
                    terminal.draw(|frame| {
                        self.renderer.render(frame, &self.state, &self.stats, self.paused);
                    }).context("Failed to draw frame")?;
                }

                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return;
            }

            match self.input_handler.handle_key_event(key) {
                KeyAction::GameAction(Action::Steer(dir)) => {
                    self.pending_direction = Some(dir);
                }
                KeyAction::Restart => self.reset_game(),
                KeyAction::TogglePause => self.paused = !self.paused,
                KeyAction::Quit => self.should_quit = true,
                KeyAction::GameAction(_) | KeyAction::Speed(_) | KeyAction::None => {}
            }
        }
    }

    fn update_game(&mut self) {
        let action = self
            .pending_direction
            .take()
            .map(Action::Steer)
            .unwrap_or(Action::Continue);

        let result = self.engine.step(&mut self.state, action);

        if result.terminated {
            let new_record = self
                .stats
                .record_episode(self.state.score, self.state.frame_iteration as usize);
            info!(
                "Game over: score {}{}",
                self.state.score,
                if new_record { " (new record)" } else { "" }
            );
        }
    }

    fn reset_game(&mut self) {
        self.state = self.engine.reset();
        self.pending_direction = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Position;

    fn create_mode() -> HumanMode {
        HumanMode::new(GameConfig::default(), HUMAN_TICK_MS).unwrap()
    }

    #[test]
    fn test_game_initialization() {
        let mode = create_mode();
        assert!(mode.state.is_alive);
        assert_eq!(mode.state.score, 0);
        assert_eq!(mode.engine.config().stagnation_factor, None);
        assert_eq!(mode.tick, Duration::from_millis(150));
    }

    #[test]
    fn test_game_reset() {
        let mut mode = create_mode();
        mode.state.score = 10;
        mode.state.is_alive = false;
        mode.pending_direction = Some(Direction::Up);
        mode.reset_game();
        assert_eq!(mode.state.score, 0);
        assert!(mode.state.is_alive);
        assert_eq!(mode.pending_direction, None);
    }

    #[test]
    fn test_pending_direction_applies_once() {
        let mut mode = create_mode();
        mode.state.food = Position::new(0, 0);
        mode.pending_direction = Some(Direction::Up);

        mode.update_game();
        assert_eq!(mode.state.snake.direction, Direction::Up);
        assert_eq!(mode.pending_direction, None);

        mode.update_game();
        assert_eq!(mode.state.snake.direction, Direction::Up);
    }

    #[test]
    fn test_reversal_is_ignored() {
        let mut mode = create_mode();
        mode.state.food = Position::new(0, 0);
        mode.pending_direction = Some(Direction::Left);

        mode.update_game();

        assert_eq!(mode.state.snake.direction, Direction::Right);
        assert!(mode.state.is_alive);
    }

    #[test]
    fn test_game_over_is_recorded() {
        let mut mode = create_mode();
        mode.state.food = Position::new(0, 0);

        // Straight into the right wall from the centre.
        while mode.state.is_alive {
            mode.update_game();
        }

        assert_eq!(mode.stats.episodes(), 1);
        assert_eq!(mode.stats.last_score(), Some(0));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GameConfig {
            block_size: 0,
            ..Default::default()
        };
        assert!(HumanMode::new(config, HUMAN_TICK_MS).is_err());
    }
}
