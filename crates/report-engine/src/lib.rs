//! Todo List report rendering
//!
//! Turns a list of todo items into a PDF: a table of the items plus a
//! rasterized trend chart, laid out by an embedded Typst template.
//!
//! Rendering is synchronous and CPU-bound. [`ReportWorker`] adapts it to the
//! render pool so each pool slot owns its own renderer and font book.

pub mod chart;
pub mod compiler;
pub mod report;
pub mod templates;
pub mod worker;
pub mod world;

pub use compiler::{CompileError, RenderError};
pub use report::{todo_rows, RenderJob, RenderResult, ReportRenderer};
pub use worker::ReportWorker;
