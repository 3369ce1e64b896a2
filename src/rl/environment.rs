use super::observation::{Observation, observe};
use crate::game::{GameConfig, GameEngine, GameState, RelativeAction, StepResult};

/// Snake environment for reinforcement learning
///
/// Wraps the game engine and recomputes the 11-feature observation after every
/// transition:
/// - Discrete action space (3 relative actions: Straight, Right, Left)
/// - Standard RL interface (reset, step)
pub struct SnakeEnvironment {
    engine: GameEngine,
    state: GameState,
}

impl SnakeEnvironment {
    /// Create a new Snake environment
    pub fn new(config: GameConfig) -> Self {
        Self::from_engine(GameEngine::new(config))
    }

    /// Create an environment with deterministic food placement
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::from_engine(GameEngine::with_seed(config, seed))
    }

    fn from_engine(mut engine: GameEngine) -> Self {
        let state = engine.reset();
        Self { engine, state }
    }

    /// Start a new episode and return its first observation
    pub fn reset(&mut self) -> Observation {
        self.state = self.engine.reset();
        observe(&self.state)
    }

    /// Apply one relative action
    ///
    /// Returns: (observation, reward, done, score)
    pub fn step(&mut self, action: RelativeAction) -> (Observation, f32, bool, u32) {
        let result = self.step_detailed(action);
        (observe(&self.state), result.reward, result.terminated, result.score)
    }

    /// Apply one relative action and return the engine's full step result
    pub fn step_detailed(&mut self, action: RelativeAction) -> StepResult {
        self.engine.step(&mut self.state, action.into())
    }

    /// Observation of the current board without stepping
    pub fn observation(&self) -> Observation {
        observe(&self.state)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        self.engine.config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{CollisionType, Direction};

    #[test]
    fn test_environment_creation() {
        let env = SnakeEnvironment::with_seed(GameConfig::default(), 1);

        assert!(env.state().is_alive);
        assert_eq!(env.state().score, 0);
        assert_eq!(env.state().frame_iteration, 0);
        assert_eq!(env.state().snake.len(), 3);
    }

    #[test]
    fn test_reset_returns_valid_observation() {
        let mut env = SnakeEnvironment::with_seed(GameConfig::default(), 2);

        let obs = env.reset();

        assert_eq!(obs.len(), 11);
        // Heading right at the start.
        assert_eq!(&obs[3..7], &[0.0, 1.0, 0.0, 0.0]);
        assert_eq!(obs, env.observation());
    }

    #[test]
    fn test_step_straight() {
        let mut env = SnakeEnvironment::with_seed(GameConfig::default(), 3);
        let head = env.state().snake.head();

        let (obs, reward, done, score) = env.step(RelativeAction::Straight);

        assert!(!done);
        assert!(reward == 0.0 || reward == 10.0);
        assert_eq!(score, env.state().score);
        assert_eq!(env.state().snake.head().x, head.x + 20);
        assert_eq!(obs, env.observation());
    }

    #[test]
    fn test_relative_turns_change_heading() {
        let mut env = SnakeEnvironment::with_seed(GameConfig::default(), 4);

        env.step(RelativeAction::TurnRight);
        assert_eq!(env.state().snake.direction, Direction::Down);

        env.step(RelativeAction::TurnLeft);
        assert_eq!(env.state().snake.direction, Direction::Right);

        env.step(RelativeAction::TurnLeft);
        assert_eq!(env.state().snake.direction, Direction::Up);
    }

    #[test]
    fn test_episode_ends_at_wall() {
        let mut env = SnakeEnvironment::with_seed(GameConfig::default(), 5);

        let mut last = None;
        for _ in 0..40 {
            let result = env.step_detailed(RelativeAction::Straight);
            if result.terminated {
                last = Some(result);
                break;
            }
        }

        let result = last.expect("snake should reach the right wall");
        assert_eq!(result.reward, -10.0);
        assert_eq!(result.info.collision, Some(CollisionType::Wall));
        assert!(!env.state().is_alive);

        env.reset();
        assert!(env.state().is_alive);
        assert_eq!(env.state().score, 0);
    }
}
