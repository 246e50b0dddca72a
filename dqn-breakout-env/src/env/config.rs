//! Configuration of [`BreakoutEnv`](super::BreakoutEnv).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
/// Configurations of [`BreakoutEnv`](super::BreakoutEnv).
pub struct BreakoutEnvConfig {
    /// Training mode: an episode ends at life loss and rewards are sign-clipped.
    pub train: bool,

    /// The number of frames an action is repeated for.
    pub frame_skip: usize,

    /// Episodes are truncated after this number of steps.
    pub max_episode_steps: Option<usize>,

    /// Serves the ball at the start of every life.
    pub fire_on_reset: bool,
}

impl Default for BreakoutEnvConfig {
    fn default() -> Self {
        Self {
            train: true,
            frame_skip: 4,
            max_episode_steps: Some(27_000),
            fire_on_reset: true,
        }
    }
}

impl BreakoutEnvConfig {
    /// Sets the evaluation flag.
    pub fn eval(mut self) -> Self {
        self.train = false;
        self
    }

    /// Sets the number of repeated frames per action.
    pub fn frame_skip(mut self, v: usize) -> Self {
        self.frame_skip = v;
        self
    }

    /// Sets the step limit of an episode.
    pub fn max_episode_steps(mut self, v: Option<usize>) -> Self {
        self.max_episode_steps = v;
        self
    }

    /// Sets whether the ball is served at the start of every life.
    pub fn fire_on_reset(mut self, v: bool) -> Self {
        self.fire_on_reset = v;
        self
    }

    /// Constructs [`BreakoutEnvConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`BreakoutEnvConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
