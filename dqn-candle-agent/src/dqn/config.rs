//! Configuration of DQN agent.
use crate::{opt::OptimizerConfig, util::OutDim, Device};
use anyhow::Result;
use dqn_core::{ExplorationScheduleConfig, ReplayMemoryConfig};
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Dqn`](super::Dqn) agent.
///
/// `Q` is the configuration of the action-value network.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<Q> {
    /// Configuration of the action-value network.
    pub model_config: Option<Q>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,

    /// Configuration of the replay memory owned by the agent.
    pub memory_config: ReplayMemoryConfig,

    /// Configuration of the epsilon schedule.
    pub exploration_config: ExplorationScheduleConfig,

    /// The number of transitions in a minibatch.
    pub batch_size: usize,

    /// Discount factor.
    pub discount_factor: f64,

    /// A learning update runs every `learn_interval` steps.
    pub learn_interval: usize,

    /// The target network is synchronized every `target_sync_interval` steps.
    pub target_sync_interval: usize,

    /// Device on which the networks are placed.
    pub device: Option<Device>,

    /// Seed of the exploration random number generator.
    pub seed: u64,

    /// If `true`, epsilon starts at its lower bound.
    pub resume: bool,
}

impl<Q> Default for DqnConfig<Q> {
    fn default() -> Self {
        Self {
            model_config: None,
            opt_config: OptimizerConfig::default(),
            memory_config: ReplayMemoryConfig::default(),
            exploration_config: ExplorationScheduleConfig::default(),
            batch_size: 32,
            discount_factor: 0.99,
            learn_interval: 4,
            target_sync_interval: 10_000,
            device: Some(Device::Cpu),
            seed: 42,
            resume: false,
        }
    }
}

impl<Q> DqnConfig<Q>
where
    Q: OutDim,
{
    /// Sets the configuration of the action-value network.
    pub fn model_config(mut self, v: Q) -> Self {
        self.model_config = Some(v);
        self
    }

    /// Sets output dimension of the model.
    pub fn out_dim(mut self, v: i64) -> Self {
        if let Some(model_config) = &mut self.model_config {
            model_config.set_out_dim(v);
        }
        self
    }

    /// Sets the optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Sets the replay memory configuration.
    pub fn memory_config(mut self, v: ReplayMemoryConfig) -> Self {
        self.memory_config = v;
        self
    }

    /// Sets the epsilon schedule.
    pub fn exploration_config(mut self, v: ExplorationScheduleConfig) -> Self {
        self.exploration_config = v;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Sets the interval of learning updates in steps.
    pub fn learn_interval(mut self, v: usize) -> Self {
        self.learn_interval = v;
        self
    }

    /// Sets the interval of target synchronization in steps.
    pub fn target_sync_interval(mut self, v: usize) -> Self {
        self.target_sync_interval = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = Some(v);
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets whether the agent resumes a previous run.
    pub fn resume(mut self, v: bool) -> Self {
        self.resume = v;
        self
    }
}

impl<Q> DqnConfig<Q>
where
    Q: Serialize + for<'de> Deserialize<'de>,
{
    /// Constructs [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnn::CnnConfig;
    use tempdir::TempDir;

    #[test]
    fn test_serde_dqn_config() -> Result<()> {
        let config = DqnConfig::default()
            .model_config(CnnConfig::new(4, 1))
            .out_dim(4)
            .batch_size(16)
            .opt_config(OptimizerConfig::default().learning_rate(1e-4));

        let dir = TempDir::new("dqn_config")?;
        let path = dir.path().join("agent.yaml");

        config.save(&path)?;
        let config_ = DqnConfig::<CnnConfig>::load(&path)?;
        assert_eq!(config, config_);
        assert_eq!(config_.model_config.unwrap().get_out_dim(), 4);
        Ok(())
    }
}
