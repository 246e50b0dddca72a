//! Types and traits for recording training metrics.
//!
//! # Core Components
//!
//! * [`Record`] - A container for key-value pairs of various data types
//! * [`RecordValue`] - An enum of the values that can be stored
//! * [`Recorder`] - A trait for writing records to some destination
//! * [`BufferedRecorder`] - A recorder that keeps records in memory
//! * [`NullRecorder`] - A recorder that discards all records
//!
//! # Basic Usage
//!
//! ```rust
//! use dqn_core::record::{Record, RecordValue};
//!
//! // following values are obtained with some process in reality
//! let episode = 1;
//! let reward = -1f32;
//!
//! let mut record = Record::empty();
//! record.insert("episode", RecordValue::Scalar(episode as f32));
//! record.insert("Train/Episode Reward", RecordValue::Scalar(reward));
//! ```
//!
//! The [`Trainer`](crate::Trainer) writes one record per episode. Its `"episode"`
//! entry is the step key used by recorders that need an x-axis.
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
