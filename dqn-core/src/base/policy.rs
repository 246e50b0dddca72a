//! Policy.
use super::{ActionSpace, Env};
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::path::Path;

/// A policy on an environment.
///
/// Policy is a mapping from an observation to an action index.
pub trait Policy<E: Env> {
    /// Selects an action epsilon-greedily.
    ///
    /// With probability `epsilon` a uniformly random action of `action_space` is
    /// returned without evaluating the policy; otherwise the greedy action is
    /// returned. Ties are broken towards the lowest action index.
    fn select_action(
        &mut self,
        obs: &E::Obs,
        epsilon: f32,
        action_space: &ActionSpace,
    ) -> Result<usize>;
}

/// A configurable object, having type parameter.
pub trait Configurable {
    /// Configuration.
    type Config: Clone + DeserializeOwned;

    /// Builds the object.
    fn build(config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Build the object with the configuration in the yaml file of the given path.
    fn build_from_path(path: impl AsRef<Path>) -> Result<Self>
    where
        Self: Sized,
    {
        let file = std::fs::File::open(path)?;
        let rdr = std::io::BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)?;
        Self::build(config)
    }
}
