//! DQN agent.
mod base;
mod config;
mod model;
pub use base::{Dqn, GRAD_CLIP_NORM};
pub use config::DqnConfig;
pub use model::DqnModel;
