//! Convolutional neural network of the DQN Nature paper.
mod base;
mod config;
pub use base::Cnn;
pub use config::CnnConfig;
