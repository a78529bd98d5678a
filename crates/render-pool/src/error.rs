//! Pool setup and job failure types

use thiserror::Error;

/// Fatal errors raised while starting the pool
#[derive(Error, Debug)]
pub enum PoolSetupError {
    #[error("Pool size must be at least 1")]
    NoSlots,

    #[error("Pool must be started inside a tokio runtime")]
    NoRuntime,

    #[error("Failed to spawn worker slot {slot}: {source}")]
    Spawn {
        slot: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker slot {slot} failed to initialize: {reason}")]
    SlotInit { slot: usize, reason: String },
}

/// Terminal failure of a single submitted job
#[derive(Error, Debug)]
pub enum PoolError<E> {
    /// The worker returned an error for this job
    #[error("{0}")]
    Job(E),

    /// The worker panicked while running this job
    #[error("Worker slot {slot} panicked: {message}")]
    Panicked { slot: usize, message: String },

    /// The pool is shutting down or already gone
    #[error("Worker pool is shut down")]
    Closed,

    /// Every slot has been retired
    #[error("No worker slots available")]
    Unavailable,
}

impl<E> PoolError<E> {
    /// The worker's own error, if this failure came from the job itself
    pub fn job_error(&self) -> Option<&E> {
        match self {
            PoolError::Job(e) => Some(e),
            _ => None,
        }
    }
}
