//! Todo List report assembly

use std::collections::HashMap;

use chrono::{Datelike, Utc};
use serde_json::Value;
use shared_types::{TodoItem, TodoRow};
use typst::foundations::Bytes;

use crate::chart::{self, TrendChart};
use crate::compiler::{self, RenderError};
use crate::templates::{CHART_PATH, TODO_REPORT_TEMPLATE};
use crate::world::{FontCache, ReportWorld};

/// Heading printed above the table
pub const REPORT_TITLE: &str = "Todo List";

/// One render request as it travels through the pool
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub todos: Vec<TodoItem>,
}

impl RenderJob {
    pub fn new(todos: Vec<TodoItem>) -> Self {
        Self { todos }
    }
}

/// A finished report
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Turns todo lists into PDF reports.
///
/// Owns its font book; build one per thread.
pub struct ReportRenderer {
    fonts: FontCache,
}

impl ReportRenderer {
    /// Register fonts. This is the expensive, once-per-slot step.
    pub fn new() -> Result<Self, RenderError> {
        Ok(Self {
            fonts: FontCache::embedded()?,
        })
    }

    pub fn fonts(&self) -> &FontCache {
        &self.fonts
    }

    /// Render `todos` into a finished PDF
    pub fn render(&self, todos: &[TodoItem]) -> Result<RenderResult, RenderError> {
        let rows = todo_rows(todos);

        let chart = TrendChart::sample(Utc::now().year());
        let chart_png = chart::rasterize(&chart, &self.fonts)?;

        let mut inputs = HashMap::new();
        inputs.insert("title".to_string(), Value::from(REPORT_TITLE));
        inputs.insert("rows".to_string(), rows_to_json(&rows));
        inputs.insert("chart".to_string(), Value::from(CHART_PATH));

        let mut world = ReportWorld::new(&self.fonts, TODO_REPORT_TEMPLATE.to_string(), inputs)?;
        world.mount_asset(CHART_PATH, Bytes::from(chart_png))?;

        let (document, warnings) = compiler::compile(&world)?;
        if !warnings.is_empty() {
            tracing::debug!("Report compiled with {} warnings", warnings.len());
        }

        let page_count = document.pages.len();
        let bytes = compiler::export_pdf(&document)?;

        Ok(RenderResult { bytes, page_count })
    }
}

/// Project items into display rows, preserving order
pub fn todo_rows(todos: &[TodoItem]) -> Vec<TodoRow> {
    todos.iter().map(TodoRow::from).collect()
}

fn rows_to_json(rows: &[TodoRow]) -> Value {
    Value::Array(
        rows.iter()
            .map(|row| Value::Array(row.cells().into_iter().map(Value::String).collect()))
            .collect(),
    )
}
