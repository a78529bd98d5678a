//! Single serialization point for the pending queue and slot states
//!
//! Submissions, completions, retirements, status queries, and shutdown all
//! arrive on one channel and are applied in order, so no two submissions can
//! interleave mid-assignment.

use std::collections::VecDeque;
use std::sync::mpsc::SendError;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::PoolError;
use crate::pool::PoolStatus;
use crate::slot::{SlotHandle, SlotState};
use crate::worker::SlotWorker;

pub(crate) type JobResult<W> =
    Result<<W as SlotWorker>::Output, PoolError<<W as SlotWorker>::Error>>;

/// A submitted job waiting for (or assigned to) a slot
pub(crate) struct Pending<W: SlotWorker> {
    pub id: u64,
    pub job: W::Job,
    pub reply: oneshot::Sender<JobResult<W>>,
}

pub(crate) enum Command<W: SlotWorker> {
    Submit(Pending<W>),
    /// A slot delivered its job's result and is idle again
    Finished { slot: usize, succeeded: bool },
    /// A slot could not rebuild its worker and has exited
    Retired { slot: usize, reason: String },
    Status(oneshot::Sender<PoolStatus>),
    Shutdown { done: Option<oneshot::Sender<()>> },
}

pub(crate) struct Dispatcher<W: SlotWorker> {
    inbox: mpsc::UnboundedReceiver<Command<W>>,
    slots: Vec<SlotHandle<W>>,
    idle: VecDeque<usize>,
    pending: VecDeque<Pending<W>>,
    accepting: bool,
    drain_waiters: Vec<oneshot::Sender<()>>,
    completed: u64,
    failed: u64,
}

impl<W: SlotWorker> Dispatcher<W> {
    pub fn new(inbox: mpsc::UnboundedReceiver<Command<W>>, slots: Vec<SlotHandle<W>>) -> Self {
        let idle = (0..slots.len()).collect();
        Self {
            inbox,
            slots,
            idle,
            pending: VecDeque::new(),
            accepting: true,
            drain_waiters: Vec::new(),
            completed: 0,
            failed: 0,
        }
    }

    pub async fn run(mut self) {
        while let Some(command) = self.inbox.recv().await {
            self.apply(command);
            self.dispatch();

            if self.live_slots() == 0 && !self.pending.is_empty() {
                warn!(
                    queued = self.pending.len(),
                    "No live worker slots; failing queued jobs"
                );
                self.fail_pending(|| PoolError::Unavailable);
            }

            if !self.accepting && self.pending.is_empty() && self.busy() == 0 {
                break;
            }
        }

        self.release().await;
    }

    fn apply(&mut self, command: Command<W>) {
        match command {
            Command::Submit(pending) => {
                if !self.accepting {
                    let _ = pending.reply.send(Err(PoolError::Closed));
                } else if self.live_slots() == 0 {
                    let _ = pending.reply.send(Err(PoolError::Unavailable));
                } else {
                    debug!(
                        job = pending.id,
                        queued = self.pending.len() + 1,
                        "Job queued"
                    );
                    self.pending.push_back(pending);
                }
            }
            Command::Finished { slot, succeeded } => {
                if succeeded {
                    self.completed += 1;
                } else {
                    self.failed += 1;
                }
                if let Some(handle) = self.slots.get_mut(slot) {
                    if let SlotState::Busy { job, since } = handle.state {
                        debug!(
                            slot,
                            job,
                            held_ms = since.elapsed().as_millis() as u64,
                            "Slot free"
                        );
                    }
                    if handle.state != SlotState::Retired {
                        handle.state = SlotState::Idle;
                        self.idle.push_back(slot);
                    }
                }
            }
            Command::Retired { slot, reason } => {
                self.failed += 1;
                warn!(slot, %reason, "Worker slot retired; running with reduced capacity");
                self.retire(slot);
            }
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
            Command::Shutdown { done } => {
                if self.accepting {
                    info!(
                        queued = self.pending.len(),
                        busy = self.busy(),
                        "Render pool draining"
                    );
                    self.accepting = false;
                }
                if let Some(done) = done {
                    self.drain_waiters.push(done);
                }
            }
        }
    }

    /// Hand queued jobs to idle slots, oldest first
    fn dispatch(&mut self) {
        while !self.pending.is_empty() {
            let Some(slot) = self.idle.pop_front() else {
                break;
            };
            let Some(job) = self.pending.pop_front() else {
                break;
            };

            let id = job.id;
            let handle = &mut self.slots[slot];
            let Some(assignments) = handle.assignments.as_ref() else {
                self.pending.push_front(job);
                continue;
            };

            match assignments.send(job) {
                Ok(()) => {
                    handle.state = SlotState::Busy {
                        job: id,
                        since: Instant::now(),
                    };
                    debug!(job = id, slot, "Job dispatched");
                }
                Err(SendError(job)) => {
                    warn!(slot, "Worker slot thread is gone; retiring it");
                    self.retire(slot);
                    self.pending.push_front(job);
                }
            }
        }
    }

    fn retire(&mut self, slot: usize) {
        if let Some(handle) = self.slots.get_mut(slot) {
            handle.state = SlotState::Retired;
            handle.assignments = None;
        }
        self.idle.retain(|&idle| idle != slot);
    }

    fn fail_pending(&mut self, error: impl Fn() -> PoolError<W::Error>) {
        for pending in self.pending.drain(..) {
            self.failed += 1;
            let _ = pending.reply.send(Err(error()));
        }
    }

    fn live_slots(&self) -> usize {
        self.slots
            .iter()
            .filter(|handle| handle.state != SlotState::Retired)
            .count()
    }

    fn busy(&self) -> usize {
        self.slots
            .iter()
            .filter(|handle| matches!(handle.state, SlotState::Busy { .. }))
            .count()
    }

    fn status(&self) -> PoolStatus {
        PoolStatus {
            slots: self.slots.len(),
            live_slots: self.live_slots(),
            busy: self.busy(),
            queued: self.pending.len(),
            completed: self.completed,
            failed: self.failed,
            accepting: self.accepting,
        }
    }

    /// Close every slot's assignment channel and join the threads
    async fn release(&mut self) {
        self.fail_pending(|| PoolError::Closed);

        let threads: Vec<_> = self
            .slots
            .iter_mut()
            .filter_map(|handle| {
                handle.assignments = None;
                handle.thread.take()
            })
            .collect();

        let joined = tokio::task::spawn_blocking(move || {
            threads
                .into_iter()
                .filter_map(|thread| thread.join().err())
                .count()
        })
        .await;

        match joined {
            Ok(0) => info!("Render pool released all worker slots"),
            Ok(crashed) => warn!(crashed, "Render pool released; some slot threads panicked"),
            Err(e) => warn!(error = %e, "Failed to join worker slot threads"),
        }

        for waiter in self.drain_waiters.drain(..) {
            let _ = waiter.send(());
        }
    }
}
