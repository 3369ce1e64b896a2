//! Q-learning agent hyperparameter configuration

use serde::{Deserialize, Serialize};

/// Configuration for the online Q-learning agent
///
/// Defaults: Adam at 1e-3, discount 0.9,
/// a 100k transition replay memory and 1000-transition long-memory batches.
///
/// # Example
///
/// ```rust
/// use q_snake::rl::AgentConfig;
///
/// let config = AgentConfig {
///     gamma: 0.95,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Learning rate for the Adam optimizer
    ///
    /// Default: 1e-3
    pub learning_rate: f64,

    /// Discount factor applied to the bootstrapped next-state value
    ///
    /// Default: 0.9
    pub gamma: f32,

    /// Capacity of the replay memory; the oldest transitions are evicted first
    ///
    /// Default: 100_000
    pub memory_capacity: usize,

    /// Transitions sampled for each long-memory update
    ///
    /// Default: 1000
    pub batch_size: usize,

    /// Exploration budget: epsilon is `exploration_games - games_played`
    ///
    /// Default: 80
    pub exploration_games: i64,

    /// Upper bound (exclusive) of the draw compared against epsilon
    ///
    /// Default: 200
    pub exploration_range: i64,

    /// Width of the hidden layer
    ///
    /// Default: 256
    pub hidden_size: usize,
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that all hyperparameters are in valid ranges
    pub fn validate(&self) -> Result<(), String> {
        if self.learning_rate <= 0.0 {
            return Err(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }

        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(format!("gamma must be in [0, 1], got {}", self.gamma));
        }

        if self.memory_capacity == 0 {
            return Err("memory_capacity must be at least 1".to_string());
        }

        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }

        if self.exploration_range <= 0 {
            return Err(format!(
                "exploration_range must be positive, got {}",
                self.exploration_range
            ));
        }

        if self.hidden_size == 0 {
            return Err("hidden_size must be at least 1".to_string());
        }

        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            gamma: 0.9,
            memory_capacity: 100_000,
            batch_size: 1000,
            exploration_games: 80,
            exploration_range: 200,
            hidden_size: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.learning_rate, 1e-3);
        assert_eq!(config.gamma, 0.9);
        assert_eq!(config.memory_capacity, 100_000);
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.exploration_games, 80);
        assert_eq!(config.exploration_range, 200);
        assert_eq!(config.hidden_size, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_negative_learning_rate() {
        let mut config = AgentConfig::default();
        config.learning_rate = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_gamma_out_of_range() {
        let mut config = AgentConfig::default();
        config.gamma = 1.5;
        assert!(config.validate().is_err());

        config.gamma = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_sizes() {
        let mut config = AgentConfig::default();
        config.memory_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = AgentConfig::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = AgentConfig::default();
        config.hidden_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_exploration_range() {
        let mut config = AgentConfig::default();
        config.exploration_range = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_exploration_budget_is_allowed() {
        let config = AgentConfig {
            exploration_games: -5,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip_keeps_overrides() {
        let json = r#"{"gamma": 0.5, "batch_size": 64}"#;
        let config: AgentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.gamma, 0.5);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.memory_capacity, 100_000);
    }
}
