use crate::game::{Direction, GameState, RelativeAction};

/// Length of the feature vector fed to the Q-network
pub const OBSERVATION_SIZE: usize = 11;

/// Hand-crafted features of a board, each 0.0 or 1.0
///
/// Layout:
/// - 0..3: danger straight / right / left
/// - 3..7: heading one-hot (left, right, up, down)
/// - 7..11: food left-of, right-of, above, below the head
pub type Observation = [f32; OBSERVATION_SIZE];

/// Compute the observation for a state.
///
/// Pure function of the board; it is recomputed every step because the head and
/// food move.
pub fn observe(state: &GameState) -> Observation {
    let head = state.snake.head();
    let heading = state.snake.direction;
    let danger = |turn: RelativeAction| {
        let probe = head.stepped(heading.apply(turn), state.block_size);
        state.is_collision(probe)
    };

    let flags = [
        danger(RelativeAction::Straight),
        danger(RelativeAction::TurnRight),
        danger(RelativeAction::TurnLeft),
        heading == Direction::Left,
        heading == Direction::Right,
        heading == Direction::Up,
        heading == Direction::Down,
        state.food.x < head.x,
        state.food.x > head.x,
        state.food.y < head.y,
        state.food.y > head.y,
    ];

    flags.map(|flag| if flag { 1.0 } else { 0.0 })
}
