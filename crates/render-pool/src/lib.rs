//! Bounded render worker pool
//!
//! Offloads CPU-heavy, non-interruptible work from the async front end onto a
//! fixed number of dedicated OS threads ("slots").
//!
//! - Each slot builds its own worker inside its own thread, so per-worker
//!   registration state is never shared between slots or with the caller.
//! - `submit` never blocks. Jobs beyond the slot count wait in a FIFO queue.
//! - All queue bookkeeping happens in a single dispatcher task.
//! - A panicking job fails alone; its slot rebuilds its worker and keeps
//!   serving. A slot whose rebuild fails is retired and the pool continues
//!   with reduced capacity.
//!
//! ```rust,ignore
//! let pool = WorkerPool::start(PoolConfig::default(), |slot| MyWorker::new(slot)).await?;
//! let output = pool.submit(job).await?;
//! pool.shutdown().await;
//! ```

mod dispatcher;
pub mod error;
pub mod pool;
mod slot;
pub mod worker;

pub use error::{PoolError, PoolSetupError};
pub use pool::{JobHandle, PoolConfig, PoolStatus, WorkerPool};
pub use worker::SlotWorker;
