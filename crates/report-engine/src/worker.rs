//! Pool adapter for the report renderer

use std::time::Instant;

use render_pool::SlotWorker;

use crate::compiler::RenderError;
use crate::report::{RenderJob, RenderResult, ReportRenderer};

/// Age, in evictions, after which memoized compilation results are dropped
const CACHE_MAX_AGE: usize = 10;

/// One slot's renderer.
///
/// Built on the slot thread via [`ReportWorker::new`], so font registration
/// happens once per slot and never crosses threads.
pub struct ReportWorker {
    slot: usize,
    renderer: ReportRenderer,
}

impl ReportWorker {
    pub fn new(slot: usize) -> Result<Self, RenderError> {
        let started = Instant::now();
        let renderer = ReportRenderer::new()?;

        tracing::info!(
            "Slot {} ready with {} fonts in {:?}",
            slot,
            renderer.fonts().len(),
            started.elapsed()
        );

        Ok(Self { slot, renderer })
    }
}

impl SlotWorker for ReportWorker {
    type Job = RenderJob;
    type Output = RenderResult;
    type Error = RenderError;

    fn run(&mut self, job: RenderJob) -> Result<RenderResult, RenderError> {
        let started = Instant::now();
        let result = self.renderer.render(&job.todos);

        comemo::evict(CACHE_MAX_AGE);

        match &result {
            Ok(report) => tracing::debug!(
                "Slot {} rendered {} todos into {} pages ({} bytes) in {:?}",
                self.slot,
                job.todos.len(),
                report.page_count,
                report.bytes.len(),
                started.elapsed()
            ),
            Err(e) => tracing::warn!("Slot {} render failed: {}", self.slot, e),
        }

        result
    }
}
