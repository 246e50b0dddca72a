#![warn(missing_docs)]
//! Core components of deep Q-learning with experience replay.
//!
//! This crate is independent of any tensor backend. It provides:
//!
//! * the interfaces between an environment, a policy and a learning agent
//!   ([`Env`], [`Policy`], [`Agent`]),
//! * a bounded replay memory of [`Transition`]s with uniform sampling
//!   ([`ReplayMemory`]),
//! * a linearly decaying exploration rate ([`ExplorationSchedule`]),
//! * the episode-driven training loop ([`Trainer`]) and the evaluation loop
//!   ([`DefaultEvaluator`]),
//! * key-value records for logging metrics ([`record`]).
//!
//! Neural networks live in a separate crate; the core only talks to them through
//! [`Agent`].
pub mod dummy;
pub mod error;
pub mod record;

mod base;
pub use base::{ActionSpace, Agent, Configurable, Env, Info, Obs, Policy, Step};

mod replay_memory;
pub use replay_memory::{ReplayMemory, ReplayMemoryConfig, Transition, TransitionBatch};

mod exploration;
pub use exploration::{ExplorationSchedule, ExplorationScheduleConfig};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{Trainer, TrainerConfig, TrainingPhase, TrainingSession};
