//! Engine settings shared by the command line and the GTP dispatcher.

use std::time::Duration;

use thiserror::Error;

use crate::constants::{DEFAULT_SIZE, DEFAULT_TIME_BUDGET, EXPLORATION, MAX_SIZE, MIN_SIZE, N_SIMS};
use crate::policy::PlayoutPolicy;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("board size {0} out of range {MIN_SIZE}..={MAX_SIZE}")]
    BoardSize(usize),
    #[error("exploration constant must be finite and non-negative, got {0}")]
    Exploration(f64),
}

/// Runtime engine parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub board_size: usize,
    /// MCTS playouts per generated move
    pub simulations: usize,
    /// UCT exploration constant
    pub exploration: f64,
    /// Solver budget per `genmove`/`solve`; zero skips the solver entirely
    pub time_limit: Duration,
    pub policy: PlayoutPolicy,
    /// Seed for rollouts; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_SIZE,
            simulations: N_SIMS,
            exploration: EXPLORATION,
            time_limit: DEFAULT_TIME_BUDGET,
            policy: PlayoutPolicy::default(),
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&self.board_size) {
            return Err(ConfigError::BoardSize(self.board_size));
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(ConfigError::Exploration(self.exploration));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.board_size, 7);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = EngineConfig {
            board_size: 4,
            ..EngineConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::BoardSize(4)));

        let config = EngineConfig {
            exploration: -0.1,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Exploration(_))));
    }
}
