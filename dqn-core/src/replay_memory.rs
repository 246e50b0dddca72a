//! Replay memory of transitions.
//!
//! [`ReplayMemory`] is a bounded FIFO buffer of [`Transition`]s. Once it holds
//! `capacity` transitions, every push evicts the oldest one. Sampling draws
//! distinct stored transitions uniformly at random and transposes them into a
//! columnar [`TransitionBatch`].
mod base;
mod batch;
mod config;
mod transition;
pub use base::ReplayMemory;
pub use batch::TransitionBatch;
pub use config::ReplayMemoryConfig;
pub use transition::Transition;
