//! Errors in the library.
use std::{error::Error, path::PathBuf};
use thiserror::Error;

/// Errors raised by replay sampling, learning steps, checkpointing and records.
///
/// Fallible functions in this workspace return [`anyhow::Result`]; the kind of a
/// failure is recovered with `err.downcast_ref::<DqnError>()`.
#[derive(Error, Debug)]
pub enum DqnError {
    /// More transitions were requested than the replay memory holds.
    #[error("requested {requested} transitions, but the replay memory holds {available}")]
    InsufficientData {
        /// The requested batch size.
        requested: usize,

        /// The number of stored transitions.
        available: usize,
    },

    /// A loss or gradient became NaN or infinite.
    #[error("numeric instability: {0}")]
    NumericInstability(String),

    /// Reading or writing a checkpoint failed.
    #[error("checkpoint I/O failed at {path:?}")]
    CheckpointIo {
        /// The file or directory being accessed.
        path: PathBuf,

        /// The underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}

impl DqnError {
    /// Wraps a persistence failure at `path`.
    pub fn checkpoint_io(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::CheckpointIo {
            path: path.into(),
            source: source.into(),
        }
    }
}
