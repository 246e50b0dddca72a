//! Configuration of [`Trainer`](super::Trainer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// Training stops before this episode index.
    pub n_episodes: usize,

    /// Environment steps with random actions before epsilon-greedy selection,
    /// and before any learning update.
    pub warmup_steps: usize,

    /// Interval of evaluation in episodes.
    pub eval_interval: usize,

    /// Action taken right after every reset. Its transition is not stored.
    pub fire_action: Option<usize>,

    /// Where to save the trained model.
    pub model_dir: Option<String>,

    /// Index of the first episode. Non-zero for resumed training.
    pub start_episode: usize,

    /// If `true`, episode-indexed saves include the target network and the
    /// optimizer state.
    pub full_checkpoints: bool,

    /// Weight of the latest episode reward in its exponential moving average.
    pub ewma_smoothing: f32,

    /// Seed of the training environment and of warmup action sampling.
    pub seed: i64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_episodes: 20_000,
            warmup_steps: 20_000,
            eval_interval: 500,
            fire_action: Some(1),
            model_dir: None,
            start_episode: 0,
            full_checkpoints: false,
            ewma_smoothing: 0.05,
            seed: 20230422,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of episodes.
    pub fn n_episodes(mut self, v: usize) -> Self {
        self.n_episodes = v;
        self
    }

    /// Sets warmup period in environment steps.
    pub fn warmup_steps(mut self, v: usize) -> Self {
        self.warmup_steps = v;
        self
    }

    /// Sets the interval of evaluation in episodes.
    pub fn eval_interval(mut self, v: usize) -> Self {
        self.eval_interval = v;
        self
    }

    /// Sets the action forced after every reset.
    pub fn fire_action(mut self, v: Option<usize>) -> Self {
        self.fire_action = v;
        self
    }

    /// Sets the directory where the trained model is saved.
    pub fn model_dir<T: Into<String>>(mut self, model_dir: T) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Sets the index of the first episode.
    pub fn start_episode(mut self, v: usize) -> Self {
        self.start_episode = v;
        self
    }

    /// Sets whether episode-indexed saves are full checkpoints.
    pub fn full_checkpoints(mut self, v: bool) -> Self {
        self.full_checkpoints = v;
        self
    }

    /// Sets the smoothing factor of the reward average.
    pub fn ewma_smoothing(mut self, v: f32) -> Self {
        self.ewma_smoothing = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: i64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
