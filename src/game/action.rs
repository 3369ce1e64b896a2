use serde::{Deserialize, Serialize};

/// Absolute heading of the snake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    /// Headings in clockwise order, starting from Right
    pub const CLOCKWISE: [Direction; 4] = [
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::Up,
    ];

    fn clockwise_index(&self) -> usize {
        match self {
            Direction::Right => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Up => 3,
        }
    }

    /// Next heading clockwise (a right turn)
    pub fn turned_right(&self) -> Direction {
        Self::CLOCKWISE[(self.clockwise_index() + 1) % 4]
    }

    /// Next heading counter-clockwise (a left turn)
    pub fn turned_left(&self) -> Direction {
        Self::CLOCKWISE[(self.clockwise_index() + 3) % 4]
    }

    /// Heading after applying a relative action
    pub fn apply(&self, action: RelativeAction) -> Direction {
        match action {
            RelativeAction::Straight => *self,
            RelativeAction::TurnRight => self.turned_right(),
            RelativeAction::TurnLeft => self.turned_left(),
        }
    }

    /// Returns true if turning from self to other would be a 180-degree turn
    pub fn is_opposite(&self, other: Direction) -> bool {
        matches!(
            (self, other),
            (Direction::Up, Direction::Down)
                | (Direction::Down, Direction::Up)
                | (Direction::Left, Direction::Right)
                | (Direction::Right, Direction::Left)
        )
    }

    /// Unit delta (dx, dy) in cells; y grows downwards
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Move relative to the current heading.
///
/// Discriminants are the Q-network output indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelativeAction {
    Straight = 0,
    TurnRight = 1,
    TurnLeft = 2,
}

impl RelativeAction {
    pub const COUNT: usize = 3;

    pub const ALL: [RelativeAction; 3] = [
        RelativeAction::Straight,
        RelativeAction::TurnRight,
        RelativeAction::TurnLeft,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            RelativeAction::Straight => "Straight",
            RelativeAction::TurnRight => "Right",
            RelativeAction::TurnLeft => "Left",
        }
    }
}

/// Action that can be taken in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Turn relative to the current heading (agent play)
    Turn(RelativeAction),
    /// Steer to an absolute heading; reversals are ignored (human play)
    Steer(Direction),
    /// Keep the current heading
    Continue,
}

impl From<RelativeAction> for Action {
    fn from(action: RelativeAction) -> Self {
        Action::Turn(action)
    }
}

impl From<Direction> for Action {
    fn from(direction: Direction) -> Self {
        Action::Steer(direction)
    }
}
