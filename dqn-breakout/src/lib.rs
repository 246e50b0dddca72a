//! Trains and tests a DQN agent on [`BreakoutEnv`].
//!
//! Training writes TensorBoard logs, the configuration and the checkpoints under
//! `--logdir`: `best/` holds the parameters with the highest evaluation score and
//! `<episode>/` those at every evaluation. The final behavior network is saved in
//! `--model`.
//!
//! ```bash
//! # Train
//! cargo run --release -p dqn-breakout -- --logdir log/breakout
//!
//! # Resume from the checkpoint at episode 1000
//! cargo run --release -p dqn-breakout -- --logdir log/breakout --resume 1000
//!
//! # Evaluate the best model
//! cargo run --release -p dqn-breakout -- --logdir log/breakout --test-only
//! ```
use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use dqn_breakout_env::{BreakoutAction, BreakoutEnv};
use dqn_candle_agent::{cnn::Cnn, dqn::Dqn as Dqn_};
use dqn_core::{
    Agent, Configurable, DefaultEvaluator, Evaluator as _, Trainer, TrainingSession,
};
use dqn_tensorboard::TensorboardRecorder;
use log::info;
use std::{fs, path::Path};

pub type Env = BreakoutEnv;
pub type Dqn = Dqn_<Env, Cnn>;
pub type Evaluator = DefaultEvaluator<Env>;

/// Device on which the networks run.
#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum DeviceArg {
    /// CPU.
    Cpu,

    /// The first CUDA device, or the CPU if CUDA is not available.
    Cuda,
}

/// Train/test DQN agent in Breakout
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Args {
    /// Device for the networks
    #[arg(short, long, value_enum, default_value_t = DeviceArg::Cuda)]
    pub device: DeviceArg,

    /// Directory where the final model is saved
    #[arg(short, long, default_value = "dqn_breakout")]
    pub model: String,

    /// Directory of logs and checkpoints
    #[arg(long, default_value = "log/breakout")]
    pub logdir: String,

    /// Environment steps with random actions before learning starts
    #[arg(long, default_value_t = 20000)]
    pub warmup: usize,

    /// The number of training episodes
    #[arg(long, default_value_t = 20000)]
    pub episode: usize,

    /// Capacity of the replay memory
    #[arg(long, default_value_t = 100000)]
    pub capacity: usize,

    /// Batch size of a learning update
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Learning rate
    #[arg(long, default_value_t = 0.0000625)]
    pub lr: f64,

    /// The number of decisions over which epsilon decays to its minimum
    #[arg(long, default_value_t = 100000)]
    pub eps_decay: usize,

    /// Minimum of epsilon
    #[arg(long, default_value_t = 0.1)]
    pub eps_min: f64,

    /// Discount factor
    #[arg(long, default_value_t = 0.99)]
    pub gamma: f64,

    /// Interval of learning updates in steps
    #[arg(long, default_value_t = 4)]
    pub freq: usize,

    /// Interval of target network synchronization in steps
    #[arg(long, default_value_t = 10000)]
    pub target_freq: usize,

    /// Interval of evaluation in episodes
    #[arg(long, default_value_t = 500)]
    pub eval_freq: usize,

    /// Resume training from the checkpoint of this episode
    #[arg(long, default_value_t = 0)]
    pub resume: usize,

    /// Save the target network and the optimizer state in episode checkpoints
    #[arg(long, default_value_t = false)]
    pub full_checkpoints: bool,

    /// Evaluate the best model, not train
    #[arg(long, default_value_t = false)]
    pub test_only: bool,

    /// The number of evaluation episodes
    #[arg(long, default_value_t = 10)]
    pub test_episode: usize,

    /// Random seed
    #[arg(long, default_value_t = 20230422)]
    pub seed: i64,

    /// Epsilon during evaluation
    #[arg(long, default_value_t = 0.01)]
    pub test_epsilon: f32,

    /// Step limit of an episode
    #[arg(long)]
    pub max_episode_steps: Option<usize>,

    /// Print the configuration and exit
    #[arg(long, default_value_t = false)]
    pub show_config: bool,
}

pub mod config {
    //! Configurations built from [`Args`].
    use super::*;
    use dqn_breakout_env::{BreakoutEnvConfig, N_STACK};
    use dqn_candle_agent::{cnn::CnnConfig, dqn::DqnConfig, opt::OptimizerConfig, Device};
    use dqn_core::{ExplorationScheduleConfig, ReplayMemoryConfig, TrainerConfig};
    use serde::{Deserialize, Serialize};

    /// All configurations of a run.
    #[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
    pub struct BreakoutConfig {
        pub env: BreakoutEnvConfig,
        pub agent: DqnConfig<CnnConfig>,
        pub trainer: TrainerConfig,
    }

    impl BreakoutConfig {
        /// Constructs the configurations from command line arguments.
        ///
        /// The warmup period must fill the replay memory with at least one batch.
        pub fn from_args(args: &Args) -> Result<Self> {
            if args.warmup < args.batch_size {
                bail!(
                    "warmup ({}) must not be smaller than batch_size ({})",
                    args.warmup,
                    args.batch_size
                );
            }

            Ok(Self {
                env: env_config(args),
                agent: agent_config(args),
                trainer: trainer_config(args),
            })
        }

        /// Saves the configurations as a YAML file.
        pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
            fs::write(path, serde_yaml::to_string(self)?)?;
            Ok(())
        }
    }

    /// Configuration of the training environment.
    pub fn env_config(args: &Args) -> BreakoutEnvConfig {
        let config = BreakoutEnvConfig::default();
        match args.max_episode_steps {
            None => config,
            Some(n) => config.max_episode_steps(Some(n)),
        }
    }

    pub fn agent_config(args: &Args) -> DqnConfig<CnnConfig> {
        let device = match args.device {
            DeviceArg::Cpu => Device::Cpu,
            DeviceArg::Cuda => Device::cuda_if_available(),
        };

        DqnConfig::default()
            .model_config(CnnConfig::new(N_STACK as _, BreakoutAction::COUNT as _))
            .opt_config(OptimizerConfig::default().learning_rate(args.lr))
            .memory_config(
                ReplayMemoryConfig::default()
                    .capacity(args.capacity)
                    .seed(args.seed as u64),
            )
            .exploration_config(
                ExplorationScheduleConfig::default()
                    .eps_min(args.eps_min)
                    .eps_decay_steps(args.eps_decay),
            )
            .batch_size(args.batch_size)
            .discount_factor(args.gamma)
            .learn_interval(args.freq)
            .target_sync_interval(args.target_freq)
            .device(device)
            .seed(args.seed as u64)
            .resume(args.resume != 0)
    }

    pub fn trainer_config(args: &Args) -> TrainerConfig {
        TrainerConfig::default()
            .n_episodes(args.episode)
            .warmup_steps(args.warmup)
            .eval_interval(args.eval_freq)
            .fire_action(Some(BreakoutAction::Fire as usize))
            .model_dir(&args.logdir)
            .start_episode(args.resume)
            .full_checkpoints(args.full_checkpoints)
            .seed(args.seed)
    }

    pub fn show_config(config: &BreakoutConfig) -> Result<()> {
        println!("{}", serde_yaml::to_string(config)?);
        Ok(())
    }
}

fn evaluator(args: &Args) -> Result<Evaluator> {
    let env_config = config::env_config(args).eval();
    Evaluator::new(&env_config, args.seed, args.test_episode, args.test_epsilon)
}

/// Trains the agent and saves the final behavior network in `--model`.
pub fn train(args: &Args) -> Result<TrainingSession> {
    let config = config::BreakoutConfig::from_args(args)?;
    fs::create_dir_all(&args.logdir)?;
    config.save(Path::new(&args.logdir).join("config.yaml"))?;

    let mut agent = Dqn::build(config.agent)?;
    if args.resume != 0 {
        let path = Path::new(&args.logdir).join(args.resume.to_string());
        agent.load_params(&path, args.full_checkpoints)?;
        info!("Resume training from {:?}", path);
    }

    let mut recorder = TensorboardRecorder::new(&args.logdir);
    let mut evaluator = evaluator(args)?;
    let mut trainer = Trainer::<Env>::build(config.trainer, config.env);
    let session = trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    agent.save_params(Path::new(&args.model), false)?;
    info!("Saved the final model in {:?}", args.model);

    Ok(session)
}

/// Evaluates the best model in `--logdir` and returns the average reward.
pub fn test(args: &Args) -> Result<f32> {
    let mut agent = Dqn::build(config::agent_config(args))?;
    agent.load_params(&Path::new(&args.logdir).join("best"), false)?;

    let mut evaluator = evaluator(args)?;
    let average = evaluator.evaluate(&mut agent)?;
    println!("Average Reward: {:.2}", average);

    Ok(average)
}

pub fn run(args: &Args) -> Result<()> {
    if args.show_config {
        config::show_config(&config::BreakoutConfig::from_args(args)?)
    } else if args.test_only {
        test(args).map(|_| ())
    } else {
        train(args).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::try_parse_from(["dqn-breakout"]).unwrap();
        assert_eq!(args.device, DeviceArg::Cuda);
        assert_eq!(args.warmup, 20000);
        assert_eq!(args.batch_size, 32);
        assert_eq!(args.lr, 0.0000625);
        assert_eq!(args.eps_decay, 100000);
        assert_eq!(args.freq, 4);
        assert_eq!(args.target_freq, 10000);
        assert_eq!(args.eval_freq, 500);
        assert_eq!(args.test_episode, 10);
        assert_eq!(args.seed, 20230422);
        assert!(!args.test_only);
    }

    #[test]
    fn test_warmup_shorter_than_batch_is_rejected() {
        let args =
            Args::try_parse_from(["dqn-breakout", "--warmup", "0", "--batch-size", "32"]).unwrap();
        assert!(config::BreakoutConfig::from_args(&args).is_err());

        let args =
            Args::try_parse_from(["dqn-breakout", "--warmup", "32", "--batch-size", "32"]).unwrap();
        assert!(config::BreakoutConfig::from_args(&args).is_ok());
    }

    #[test]
    fn test_config_from_args() {
        let args = Args::try_parse_from([
            "dqn-breakout",
            "-d",
            "cpu",
            "--batch-size",
            "8",
            "--resume",
            "100",
            "--max-episode-steps",
            "50",
        ])
        .unwrap();
        let config = config::BreakoutConfig::from_args(&args).unwrap();

        assert_eq!(config.agent.batch_size, 8);
        assert!(config.agent.resume);
        assert_eq!(config.agent.device, Some(dqn_candle_agent::Device::Cpu));
        assert_eq!(config.trainer.start_episode, 100);
        assert_eq!(config.trainer.fire_action, Some(1));
        assert_eq!(config.trainer.model_dir.as_deref(), Some("log/breakout"));
        assert_eq!(config.env.max_episode_steps, Some(50));
        assert!(config.env.train);
    }
}
