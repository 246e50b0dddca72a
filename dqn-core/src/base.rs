//! Core functionalities.
mod action_space;
mod agent;
mod env;
mod policy;
mod step;
pub use action_space::ActionSpace;
pub use agent::Agent;
pub use env::Env;
pub use policy::{Configurable, Policy};
use std::fmt::Debug;
pub use step::{Info, Step};

/// An observation of an environment.
///
/// Observations are stored by value in the replay memory, so cloning one must
/// produce an independent copy.
pub trait Obs: Clone + Debug {}
