//! Agent.
use super::{Env, Policy};
use crate::{record::Record, Transition};
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
///
/// The agent owns its replay memory and its exploration schedule. The trainer
/// feeds it transitions with [`Agent::observe`] and drives learning with
/// [`Agent::step`].
pub trait Agent<E: Env>: Policy<E> {
    /// Returns the current exploration rate.
    fn epsilon(&self) -> f32;

    /// Advances the exploration schedule by one decision.
    fn advance_exploration(&mut self);

    /// Stores a transition in the replay memory.
    fn observe(&mut self, transition: Transition<E::Obs>);

    /// Performs the periodic work scheduled at `total_steps`.
    ///
    /// A learning update runs when `total_steps` is a multiple of the learning
    /// interval, then the target network is synchronized when it is a multiple of
    /// the synchronization interval. Returns the record of the learning update,
    /// if one ran.
    fn step(&mut self, total_steps: usize) -> Result<Option<Record>>;

    /// Save the parameters of the agent in the given directory.
    ///
    /// The behavior network is always saved. With `checkpoint == true`, the target
    /// network and the optimizer state are saved as well.
    fn save_params(&self, path: &Path, checkpoint: bool) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    ///
    /// `checkpoint` must match the mode the parameters were saved with.
    fn load_params(&mut self, path: &Path, checkpoint: bool) -> Result<()>;
}
