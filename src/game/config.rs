use serde::{Deserialize, Serialize};

/// Configuration for the game
///
/// Coordinates are in pixels; the snake moves one `block_size` per step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board width in pixels
    pub width: i32,
    /// Board height in pixels
    pub height: i32,
    /// Edge length of one grid cell in pixels
    pub block_size: i32,
    /// Initial length of the snake
    pub initial_snake_length: usize,

    /// Reward for eating food
    pub food_reward: f32,
    /// Reward for dying (collision or stagnation)
    pub death_penalty: f32,
    /// Episode ends once the frame counter exceeds this factor times the snake
    /// length. `None` disables the cutoff.
    pub stagnation_factor: Option<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            block_size: 20,
            initial_snake_length: 3,
            food_reward: 10.0,
            death_penalty: -10.0,
            stagnation_factor: Some(100),
        }
    }
}

impl GameConfig {
    /// Create a new configuration with a custom board size in pixels
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Configuration for the keyboard-driven variant: no stagnation cutoff
    pub fn human() -> Self {
        Self {
            stagnation_factor: None,
            ..Default::default()
        }
    }

    /// Create a small board for testing (10x10 cells)
    pub fn small() -> Self {
        Self::new(200, 200)
    }

    /// Number of grid columns
    pub fn cols(&self) -> usize {
        (self.width / self.block_size) as usize
    }

    /// Number of grid rows
    pub fn rows(&self) -> usize {
        (self.height / self.block_size) as usize
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.block_size <= 0 {
            return Err(format!("block_size must be positive, got {}", self.block_size));
        }

        if self.width % self.block_size != 0 || self.height % self.block_size != 0 {
            return Err(format!(
                "board {}x{} is not a whole number of {}px cells",
                self.width, self.height, self.block_size
            ));
        }

        if self.initial_snake_length == 0 {
            return Err("initial_snake_length must be at least 1".to_string());
        }

        // The snake starts centred with its body extending to the left.
        if self.initial_snake_length > self.cols() / 2 + 1 || self.rows() == 0 {
            return Err(format!(
                "a {}-cell snake does not fit on a {}x{} grid",
                self.initial_snake_length,
                self.cols(),
                self.rows()
            ));
        }

        if self.stagnation_factor == Some(0) {
            return Err("stagnation_factor must be positive when set".to_string());
        }

        Ok(())
    }
}
