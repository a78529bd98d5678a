//! Public pool handle

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::dispatcher::{Command, Dispatcher, Pending};
use crate::error::{PoolError, PoolSetupError};
use crate::slot;
use crate::worker::SlotWorker;

/// Pool sizing, fixed at startup
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker slots (maximum concurrent jobs)
    pub size: usize,
    /// Thread name prefix; slots are named `<prefix>-<index>`
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 2,
            thread_name: "render-slot".to_string(),
        }
    }
}

impl PoolConfig {
    pub fn with_size(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }
}

/// Point-in-time view of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub slots: usize,
    pub live_slots: usize,
    pub busy: usize,
    pub queued: usize,
    pub completed: u64,
    pub failed: u64,
    pub accepting: bool,
}

impl PoolStatus {
    fn closed(slots: usize) -> Self {
        Self {
            slots,
            live_slots: 0,
            busy: 0,
            queued: 0,
            completed: 0,
            failed: 0,
            accepting: false,
        }
    }
}

/// Handle to a running pool. Cheap to clone.
///
/// Dropping the last handle drains the pool in the background.
pub struct WorkerPool<W: SlotWorker> {
    inner: Arc<PoolInner<W>>,
}

struct PoolInner<W: SlotWorker> {
    commands: mpsc::UnboundedSender<Command<W>>,
    next_id: AtomicU64,
    size: usize,
}

impl<W: SlotWorker> Drop for PoolInner<W> {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown { done: None });
    }
}

impl<W: SlotWorker> Clone for WorkerPool<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: SlotWorker> WorkerPool<W> {
    /// Spawn the slots and the dispatcher.
    ///
    /// `factory` runs on each slot's own thread, once at startup and again
    /// whenever the slot restarts after a panic. Startup fails if any slot's
    /// first build fails.
    pub async fn start<F, E>(config: PoolConfig, factory: F) -> Result<Self, PoolSetupError>
    where
        F: Fn(usize) -> Result<W, E> + Send + Sync + 'static,
        E: Display,
    {
        if config.size == 0 {
            return Err(PoolSetupError::NoSlots);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| PoolSetupError::NoRuntime)?;

        let factory = Arc::new(factory);
        let (commands, inbox) = mpsc::unbounded_channel();

        let mut slots = Vec::with_capacity(config.size);
        let mut ready = Vec::with_capacity(config.size);
        for index in 0..config.size {
            let (ready_tx, ready_rx) = oneshot::channel();
            let handle = slot::spawn(
                index,
                &config.thread_name,
                Arc::clone(&factory),
                commands.clone(),
                ready_tx,
            )?;
            slots.push(handle);
            ready.push(ready_rx);
        }

        for (index, ready_rx) in ready.into_iter().enumerate() {
            match ready_rx.await {
                Ok(Ok(())) => {}
                Ok(Err(reason)) => {
                    return Err(PoolSetupError::SlotInit {
                        slot: index,
                        reason,
                    })
                }
                Err(_) => {
                    return Err(PoolSetupError::SlotInit {
                        slot: index,
                        reason: "slot thread exited during startup".to_string(),
                    })
                }
            }
        }

        runtime.spawn(Dispatcher::new(inbox, slots).run());
        info!(
            slots = config.size,
            thread_name = %config.thread_name,
            "Render pool started"
        );

        Ok(Self {
            inner: Arc::new(PoolInner {
                commands,
                next_id: AtomicU64::new(1),
                size: config.size,
            }),
        })
    }

    /// Queue a job. Returns immediately; the handle resolves when the job
    /// reaches a terminal state.
    pub fn submit(&self, job: W::Job) -> JobHandle<W::Output, W::Error> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply, rx) = oneshot::channel();

        // A failed send drops `reply`, which resolves the handle as Closed.
        if self
            .inner
            .commands
            .send(Command::Submit(Pending { id, job, reply }))
            .is_err()
        {
            debug!(job = id, "Submit after pool shutdown");
        }

        JobHandle { id, rx }
    }

    /// Current slot and queue counters
    pub async fn status(&self) -> PoolStatus {
        let (tx, rx) = oneshot::channel();
        if self.inner.commands.send(Command::Status(tx)).is_ok() {
            if let Ok(status) = rx.await {
                return status;
            }
        }
        PoolStatus::closed(self.inner.size)
    }

    /// Stop accepting jobs, finish everything already submitted, and join
    /// all slot threads. Safe to call more than once.
    pub async fn shutdown(&self) {
        let (done, rx) = oneshot::channel();
        if self
            .inner
            .commands
            .send(Command::Shutdown { done: Some(done) })
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    /// Configured number of slots
    pub fn size(&self) -> usize {
        self.inner.size
    }
}

/// Pending result of a submitted job
#[derive(Debug)]
pub struct JobHandle<O, E> {
    id: u64,
    rx: oneshot::Receiver<Result<O, PoolError<E>>>,
}

impl<O, E> JobHandle<O, E> {
    /// Submission sequence number, unique per pool
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<O, E> Future for JobHandle<O, E> {
    type Output = Result<O, PoolError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(PoolError::Closed)))
    }
}
