use super::action::Direction;

/// A position on the board, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move position one cell of `block_size` pixels in a direction
    pub fn stepped(&self, direction: Direction, block_size: i32) -> Self {
        let (dx, dy) = direction.delta();
        self.moved_by(dx * block_size, dy * block_size)
    }

    /// Grid (column, row) containing this pixel; negative off the top or left edge
    pub fn cell(&self, block_size: i32) -> (i32, i32) {
        (self.x.div_euclid(block_size), self.y.div_euclid(block_size))
    }
}

/// The snake in the game
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at index 0
    pub body: Vec<Position>,
    /// Current heading
    pub direction: Direction,
}

impl Snake {
    /// Create a snake whose body trails behind the head, one cell per segment
    pub fn new(head: Position, direction: Direction, length: usize, block_size: i32) -> Self {
        let (dx, dy) = direction.delta();
        let body = (0..length as i32)
            .map(|i| head.moved_by(-dx * block_size * i, -dy * block_size * i))
            .collect();

        Self { body, direction }
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Get body segments (excluding head)
    pub fn body_segments(&self) -> &[Position] {
        &self.body[1..]
    }

    /// Check if position collides with snake body (excluding head)
    pub fn collides_with_body(&self, pos: Position) -> bool {
        self.body_segments().contains(&pos)
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Why an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionType {
    /// Snake left the board
    Wall,
    /// Snake ran into its own body
    SelfCollision,
    /// Frame counter passed the stagnation cutoff
    Stagnation,
}

/// Complete game state
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub snake: Snake,
    pub food: Position,
    pub width: i32,
    pub height: i32,
    pub block_size: i32,
    pub score: u32,
    /// Steps taken since the last reset
    pub frame_iteration: u32,
    pub is_alive: bool,
}

impl GameState {
    pub fn new(snake: Snake, food: Position, width: i32, height: i32, block_size: i32) -> Self {
        Self {
            snake,
            food,
            width,
            height,
            block_size,
            score: 0,
            frame_iteration: 0,
            is_alive: true,
        }
    }

    /// Check if a position is within the board
    pub fn is_in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// True if a head at `pos` would die: off the board or on a non-head body cell
    pub fn is_collision(&self, pos: Position) -> bool {
        !self.is_in_bounds(pos) || self.snake.collides_with_body(pos)
    }
}
