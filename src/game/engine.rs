use super::{
    action::{Action, Direction},
    config::GameConfig,
    state::{CollisionType, GameState, Position, Snake},
};
use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

/// Random draws tried before falling back to scanning every free cell
pub const MAX_RANDOM_FOOD_ATTEMPTS: usize = 256;

/// Information about a step
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    /// Whether the snake ate food this step
    pub ate_food: bool,
    /// Reason the episode ended, if it ended through a collision or stagnation
    pub collision: Option<CollisionType>,
    /// The snake filled every cell, so no food could be placed
    pub board_full: bool,
}

/// Result of a game step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Reward for this step
    pub reward: f32,
    /// Whether the episode has terminated
    pub terminated: bool,
    /// Score after the step
    pub score: u32,
    pub info: StepInfo,
}

/// The game engine that handles all game logic
pub struct GameEngine {
    config: GameConfig,
    rng: StdRng,
}

impl GameEngine {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Engine with a fixed seed, for reproducible food placement
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Start a new episode: a horizontal snake centred on the board, heading right
    pub fn reset(&mut self) -> GameState {
        let block = self.config.block_size;
        let head = Position::new(
            (self.config.cols() as i32 / 2) * block,
            (self.config.rows() as i32 / 2) * block,
        );

        let snake = Snake::new(
            head,
            Direction::Right,
            self.config.initial_snake_length,
            block,
        );

        // A fresh snake never covers the whole board.
        let food = self.spawn_food(&snake).unwrap_or(head);

        GameState::new(
            snake,
            food,
            self.config.width,
            self.config.height,
            block,
        )
    }

    /// Execute one step of the game
    pub fn step(&mut self, state: &mut GameState, action: Action) -> StepResult {
        if !state.is_alive {
            return StepResult {
                reward: 0.0,
                terminated: true,
                score: state.score,
                info: StepInfo {
                    ate_food: false,
                    collision: None,
                    board_full: false,
                },
            };
        }

        state.frame_iteration += 1;

        match action {
            Action::Turn(turn) => {
                state.snake.direction = state.snake.direction.apply(turn);
            }
            Action::Steer(direction) => {
                if !state.snake.direction.is_opposite(direction) {
                    state.snake.direction = direction;
                }
            }
            Action::Continue => {}
        }

        let new_head = state
            .snake
            .head()
            .stepped(state.snake.direction, state.block_size);
        state.snake.body.insert(0, new_head);

        // On a terminal step the new head stays in the body and nothing is popped.
        if let Some(collision) = self.check_terminal(state) {
            state.is_alive = false;
            debug!(
                "episode over: {:?} at ({}, {}), score {}",
                collision, new_head.x, new_head.y, state.score
            );

            return StepResult {
                reward: self.config.death_penalty,
                terminated: true,
                score: state.score,
                info: StepInfo {
                    ate_food: false,
                    collision: Some(collision),
                    board_full: false,
                },
            };
        }

        if new_head != state.food {
            state.snake.body.pop();

            return StepResult {
                reward: 0.0,
                terminated: false,
                score: state.score,
                info: StepInfo {
                    ate_food: false,
                    collision: None,
                    board_full: false,
                },
            };
        }

        state.score += 1;
        let board_full = match self.spawn_food(&state.snake) {
            Some(food) => {
                state.food = food;
                false
            }
            None => {
                state.is_alive = false;
                true
            }
        };

        StepResult {
            reward: self.config.food_reward,
            terminated: board_full,
            score: state.score,
            info: StepInfo {
                ate_food: true,
                collision: None,
                board_full,
            },
        }
    }

    /// Collision with a wall or the body, then the stagnation cutoff
    fn check_terminal(&self, state: &GameState) -> Option<CollisionType> {
        let head = state.snake.head();

        if !state.is_in_bounds(head) {
            return Some(CollisionType::Wall);
        }

        if state.snake.collides_with_body(head) {
            return Some(CollisionType::SelfCollision);
        }

        if let Some(factor) = self.config.stagnation_factor {
            if state.frame_iteration as usize > factor as usize * state.snake.len() {
                return Some(CollisionType::Stagnation);
            }
        }

        None
    }

    /// Pick a random cell not covered by the snake.
    ///
    /// Returns `None` only when the snake covers every cell.
    pub fn spawn_food(&mut self, snake: &Snake) -> Option<Position> {
        let (cols, rows) = (self.config.cols(), self.config.rows());
        let block = self.config.block_size;

        for _ in 0..MAX_RANDOM_FOOD_ATTEMPTS {
            let x = self.rng.gen_range(0..cols) as i32 * block;
            let y = self.rng.gen_range(0..rows) as i32 * block;
            let pos = Position::new(x, y);

            if !snake.contains(pos) {
                return Some(pos);
            }
        }

        let free: Vec<Position> = (0..rows as i32)
            .flat_map(|row| (0..cols as i32).map(move |col| Position::new(col * block, row * block)))
            .filter(|pos| !snake.contains(*pos))
            .collect();

        free.choose(&mut self.rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::RelativeAction;

    fn centred_state(food: Position) -> GameState {
        GameState::new(
            Snake::new(Position::new(320, 240), Direction::Right, 3, 20),
            food,
            640,
            480,
            20,
        )
    }

    #[test]
    fn test_reset() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 7);
        let state = engine.reset();

        assert!(state.is_alive);
        assert_eq!(state.score, 0);
        assert_eq!(state.frame_iteration, 0);
        assert_eq!(state.snake.direction, Direction::Right);
        assert_eq!(
            state.snake.body,
            vec![
                Position::new(320, 240),
                Position::new(300, 240),
                Position::new(280, 240)
            ]
        );
        assert!(!state.snake.contains(state.food));
        assert!(state.is_in_bounds(state.food));
        assert_eq!(state.food.x % 20, 0);
        assert_eq!(state.food.y % 20, 0);
    }

    #[test]
    fn test_straight_moves_keep_length() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 1);
        let mut state = centred_state(Position::new(0, 0));

        let result = engine.step(&mut state, RelativeAction::Straight.into());
        assert_eq!(state.snake.head(), Position::new(340, 240));
        assert_eq!(state.snake.len(), 3);
        assert_eq!(result.reward, 0.0);
        assert!(!result.terminated);

        let result = engine.step(&mut state, RelativeAction::Straight.into());
        assert_eq!(state.snake.head(), Position::new(360, 240));
        assert_eq!(state.snake.len(), 3);
        assert!(!result.terminated);
        assert_eq!(state.frame_iteration, 2);
    }

    #[test]
    fn test_turns_update_heading() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 1);
        let mut state = centred_state(Position::new(0, 0));

        engine.step(&mut state, RelativeAction::TurnRight.into());
        assert_eq!(state.snake.direction, Direction::Down);
        assert_eq!(state.snake.head(), Position::new(320, 260));

        engine.step(&mut state, RelativeAction::TurnLeft.into());
        assert_eq!(state.snake.direction, Direction::Right);
        assert_eq!(state.snake.head(), Position::new(340, 260));

        engine.step(&mut state, RelativeAction::TurnLeft.into());
        assert_eq!(state.snake.direction, Direction::Up);
        assert_eq!(state.snake.head(), Position::new(340, 240));
    }

    #[test]
    fn test_food_consumption() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 3);
        let mut state = centred_state(Position::new(340, 240));

        let result = engine.step(&mut state, RelativeAction::Straight.into());

        assert!(result.info.ate_food);
        assert_eq!(result.reward, 10.0);
        assert_eq!(result.score, 1);
        assert_eq!(state.score, 1);
        assert_eq!(state.snake.len(), 4);
        assert!(!state.snake.contains(state.food));
    }

    #[test]
    fn test_wall_collision() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 1);
        let mut state = GameState::new(
            Snake::new(Position::new(620, 240), Direction::Right, 3, 20),
            Position::new(0, 0),
            640,
            480,
            20,
        );
        let body_before = state.snake.len();

        let result = engine.step(&mut state, RelativeAction::Straight.into());

        assert!(result.terminated);
        assert_eq!(result.reward, -10.0);
        assert_eq!(result.score, 0);
        assert!(!state.is_alive);
        assert_eq!(state.snake.head().x, 640);
        assert_eq!(state.snake.len(), body_before + 1);
        assert_eq!(result.info.collision, Some(CollisionType::Wall));
    }

    #[test]
    fn test_self_collision() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 1);
        let snake = Snake::new(Position::new(320, 240), Direction::Right, 5, 20);
        let mut state = GameState::new(snake, Position::new(0, 0), 640, 480, 20);
        state.score = 4;

        engine.step(&mut state, RelativeAction::TurnRight.into());
        engine.step(&mut state, RelativeAction::TurnRight.into());
        let result = engine.step(&mut state, RelativeAction::TurnRight.into());

        assert!(result.terminated);
        assert_eq!(result.reward, -10.0);
        assert_eq!(result.score, 4);
        assert_eq!(result.info.collision, Some(CollisionType::SelfCollision));
    }

    #[test]
    fn test_stagnation_cutoff() {
        let config = GameConfig {
            stagnation_factor: Some(2),
            ..GameConfig::default()
        };
        let mut engine = GameEngine::with_seed(config, 1);
        let mut state = centred_state(Position::new(0, 0));
        // Length is 4 while the cutoff is checked (head already inserted).
        state.frame_iteration = 8;

        let result = engine.step(&mut state, RelativeAction::Straight.into());

        assert!(result.terminated);
        assert_eq!(result.reward, -10.0);
        assert_eq!(result.info.collision, Some(CollisionType::Stagnation));
    }

    #[test]
    fn test_default_stagnation_limit() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 1);
        let mut state = centred_state(Position::new(0, 0));
        state.frame_iteration = 399;

        // Frame 400 is not above 100 * 4.
        assert!(!engine.step(&mut state, Action::Steer(Direction::Down)).terminated);
        let result = engine.step(&mut state, Action::Continue);
        assert!(result.terminated);
        assert_eq!(result.info.collision, Some(CollisionType::Stagnation));
    }

    #[test]
    fn test_human_config_never_stagnates() {
        let mut engine = GameEngine::with_seed(GameConfig::human(), 1);
        let mut state = centred_state(Position::new(0, 0));
        state.frame_iteration = 10_000;

        assert!(!engine.step(&mut state, Action::Continue).terminated);
    }

    #[test]
    fn test_prevent_180_degree_turn() {
        let mut engine = GameEngine::with_seed(GameConfig::human(), 1);
        let mut state = centred_state(Position::new(0, 0));

        let result = engine.step(&mut state, Action::Steer(Direction::Left));

        assert!(!result.terminated);
        assert_eq!(state.snake.direction, Direction::Right);
        assert_eq!(state.snake.head(), Position::new(340, 240));

        engine.step(&mut state, Action::Steer(Direction::Up));
        assert_eq!(state.snake.direction, Direction::Up);
    }

    #[test]
    fn test_terminated_game_no_update() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 1);
        let mut state = engine.reset();
        state.is_alive = false;
        let before = state.clone();

        let result = engine.step(&mut state, Action::Continue);

        assert!(result.terminated);
        assert_eq!(result.reward, 0.0);
        assert_eq!(state, before);
    }

    #[test]
    fn test_food_never_spawns_on_snake() {
        let config = GameConfig::new(100, 20);
        let mut engine = GameEngine::with_seed(config, 11);
        // Covers four of the five cells on a 5x1 board.
        let snake = Snake::new(Position::new(60, 0), Direction::Right, 4, 20);

        for _ in 0..50 {
            assert_eq!(engine.spawn_food(&snake), Some(Position::new(80, 0)));
        }
    }

    #[test]
    fn test_full_board_ends_episode() {
        let config = GameConfig::new(60, 20);
        let mut engine = GameEngine::with_seed(config, 5);
        let snake = Snake::new(Position::new(20, 0), Direction::Right, 2, 20);
        let mut state = GameState::new(snake, Position::new(40, 0), 60, 20, 20);

        let result = engine.step(&mut state, RelativeAction::Straight.into());

        assert!(result.terminated);
        assert!(result.info.ate_food);
        assert!(result.info.board_full);
        assert_eq!(result.reward, 10.0);
        assert_eq!(state.score, 1);
        assert!(!state.is_alive);
    }

    #[test]
    fn test_length_invariant_over_random_play() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 42);
        let mut state = engine.reset();
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..500 {
            let len_before = state.snake.len();
            let action = RelativeAction::ALL[rng.gen_range(0..3)];
            let result = engine.step(&mut state, action.into());

            if result.terminated {
                state = engine.reset();
                continue;
            }

            let expected = if result.info.ate_food { len_before + 1 } else { len_before };
            assert_eq!(state.snake.len(), expected);
            assert!(!state.snake.contains(state.food));
        }
    }
}
