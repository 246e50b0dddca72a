//! Linear epsilon decay for epsilon-greedy exploration.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ExplorationSchedule`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ExplorationScheduleConfig {
    /// Epsilon at the beginning of training.
    pub eps_start: f64,

    /// Lower bound of epsilon.
    pub eps_min: f64,

    /// The number of decisions over which epsilon falls from `eps_start` to `eps_min`.
    pub eps_decay_steps: usize,
}

impl Default for ExplorationScheduleConfig {
    fn default() -> Self {
        Self {
            eps_start: 1.0,
            eps_min: 0.1,
            eps_decay_steps: 100_000,
        }
    }
}

impl ExplorationScheduleConfig {
    /// Sets the initial epsilon.
    pub fn eps_start(mut self, v: f64) -> Self {
        self.eps_start = v;
        self
    }

    /// Sets the lower bound of epsilon.
    pub fn eps_min(mut self, v: f64) -> Self {
        self.eps_min = v;
        self
    }

    /// Sets the number of decisions to reach the lower bound.
    pub fn eps_decay_steps(mut self, v: usize) -> Self {
        self.eps_decay_steps = v;
        self
    }

    /// Constructs [`ExplorationScheduleConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ExplorationScheduleConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Epsilon decreasing linearly per decision, floored at `eps_min`.
///
/// Epsilon never increases. With `eps_decay_steps == 0` the first
/// [`advance`](ExplorationSchedule::advance) jumps to the floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationSchedule {
    epsilon: f64,
    eps_min: f64,
    decrement: f64,
}

impl ExplorationSchedule {
    /// Starts the schedule at `eps_start`.
    pub fn new(config: &ExplorationScheduleConfig) -> Self {
        let eps_start = config.eps_start.max(config.eps_min);
        let decrement = match config.eps_decay_steps {
            0 => f64::INFINITY,
            n => (eps_start - config.eps_min) / n as f64,
        };

        Self {
            epsilon: eps_start,
            eps_min: config.eps_min,
            decrement,
        }
    }

    /// Starts the schedule at the floor, for resumed training.
    pub fn resumed(config: &ExplorationScheduleConfig) -> Self {
        let mut schedule = Self::new(config);
        schedule.epsilon = schedule.eps_min;
        schedule
    }

    /// Returns the current epsilon.
    pub fn value(&self) -> f32 {
        self.epsilon as f32
    }

    /// Decrements epsilon by one step.
    pub fn advance(&mut self) {
        self.epsilon = (self.epsilon - self.decrement).max(self.eps_min);
    }
}
