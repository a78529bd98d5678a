//! Typst compilation and export

pub mod errors;
pub mod render;

pub use errors::{CompileError, ErrorSeverity, RenderError};
pub use render::{compile, export_pdf, rasterize_first_page};
