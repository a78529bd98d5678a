//! The unit of work a slot executes

use std::fmt::Display;

/// Per-slot worker state.
///
/// One instance lives on each slot thread and is never shared, so `run` may
/// mutate registration state freely. The worker itself does not need to be
/// `Send`: it is constructed on the thread that uses it.
pub trait SlotWorker: 'static {
    type Job: Send + 'static;
    type Output: Send + 'static;
    type Error: Display + Send + 'static;

    /// Execute one job to completion
    fn run(&mut self, job: Self::Job) -> Result<Self::Output, Self::Error>;
}
