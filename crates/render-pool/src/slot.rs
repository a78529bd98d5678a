//! Worker slot threads
//!
//! Each slot is a dedicated OS thread owning exactly one worker. Jobs arrive
//! over a per-slot channel; results go straight back to the submitter and the
//! dispatcher is told the slot is free only after the result was delivered.

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self as std_mpsc, Receiver};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::dispatcher::{Command, Pending};
use crate::error::{PoolError, PoolSetupError};
use crate::worker::SlotWorker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotState {
    Idle,
    Busy { job: u64, since: Instant },
    Retired,
}

/// Dispatcher-side view of a slot
pub(crate) struct SlotHandle<W: SlotWorker> {
    /// Dropping this sender tells the slot thread to exit
    pub assignments: Option<std_mpsc::Sender<Pending<W>>>,
    pub thread: Option<JoinHandle<()>>,
    pub state: SlotState,
}

pub(crate) fn spawn<W, F, E>(
    slot: usize,
    thread_name: &str,
    factory: Arc<F>,
    commands: mpsc::UnboundedSender<Command<W>>,
    ready: oneshot::Sender<Result<(), String>>,
) -> Result<SlotHandle<W>, PoolSetupError>
where
    W: SlotWorker,
    F: Fn(usize) -> Result<W, E> + Send + Sync + 'static,
    E: Display,
{
    let (assignments, rx) = std_mpsc::channel();

    let thread = std::thread::Builder::new()
        .name(format!("{}-{}", thread_name, slot))
        .spawn(move || slot_main(slot, factory, rx, commands, ready))
        .map_err(|source| PoolSetupError::Spawn { slot, source })?;

    Ok(SlotHandle {
        assignments: Some(assignments),
        thread: Some(thread),
        state: SlotState::Idle,
    })
}

fn slot_main<W, F, E>(
    slot: usize,
    factory: Arc<F>,
    assignments: Receiver<Pending<W>>,
    commands: mpsc::UnboundedSender<Command<W>>,
    ready: oneshot::Sender<Result<(), String>>,
) where
    W: SlotWorker,
    F: Fn(usize) -> Result<W, E>,
    E: Display,
{
    let mut worker = match build_worker(slot, factory.as_ref()) {
        Ok(worker) => worker,
        Err(reason) => {
            let _ = ready.send(Err(reason));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        return;
    }
    debug!(slot, "Worker slot ready");

    while let Ok(Pending { id, job, reply }) = assignments.recv() {
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| worker.run(job)));
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let next = match outcome {
            Ok(Ok(output)) => {
                debug!(slot, job = id, elapsed_ms, "Job completed");
                let _ = reply.send(Ok(output));
                Command::Finished {
                    slot,
                    succeeded: true,
                }
            }
            Ok(Err(e)) => {
                warn!(slot, job = id, elapsed_ms, error = %e, "Job failed");
                let _ = reply.send(Err(PoolError::Job(e)));
                Command::Finished {
                    slot,
                    succeeded: false,
                }
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(slot, job = id, %message, "Job panicked; restarting slot");
                let _ = reply.send(Err(PoolError::Panicked { slot, message }));

                match build_worker(slot, factory.as_ref()) {
                    Ok(fresh) => {
                        worker = fresh;
                        info!(slot, "Worker slot restarted");
                        Command::Finished {
                            slot,
                            succeeded: false,
                        }
                    }
                    Err(reason) => {
                        let _ = commands.send(Command::Retired { slot, reason });
                        return;
                    }
                }
            }
        };

        if commands.send(next).is_err() {
            break;
        }
    }

    debug!(slot, "Worker slot exiting");
}

fn build_worker<W, F, E>(slot: usize, factory: &F) -> Result<W, String>
where
    F: Fn(usize) -> Result<W, E>,
    E: Display,
{
    match panic::catch_unwind(AssertUnwindSafe(|| factory(slot))) {
        Ok(Ok(worker)) => Ok(worker),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(format!(
            "worker factory panicked: {}",
            panic_message(payload.as_ref())
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
