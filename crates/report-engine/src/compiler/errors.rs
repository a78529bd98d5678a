//! Error types for report compilation

use thiserror::Error;

/// A Typst diagnostic reduced to its message and hints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub message: String,
    pub hint: Option<String>,
    pub severity: ErrorSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Error,
    Warning,
}

/// Failure inside the rendering function
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No fonts available for rendering")]
    NoFonts,

    #[error("Compilation failed: {}", join_messages(.0))]
    Compile(Vec<CompileError>),

    #[error("Document has no pages")]
    EmptyDocument,

    #[error("PDF export failed: {0}")]
    PdfExport(String),

    #[error("PNG encoding failed: {0}")]
    PngEncode(String),

    #[error("Invalid input '{0}': {1}")]
    InvalidInput(String, String),

    #[error("Path security violation: {0}")]
    PathSecurityViolation(String),
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            hint: None,
            severity: ErrorSeverity::Error,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn as_warning(mut self) -> Self {
        self.severity = ErrorSeverity::Warning;
        self
    }
}

fn join_messages(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_display_joins_messages() {
        let err = RenderError::Compile(vec![
            CompileError::new("unknown variable: rows"),
            CompileError::new("expected content").with_hint("wrap it in brackets"),
        ]);

        assert_eq!(
            err.to_string(),
            "Compilation failed: unknown variable: rows; expected content"
        );
    }

    #[test]
    fn test_warning_builder() {
        let warning = CompileError::new("unknown font family").as_warning();
        assert_eq!(warning.severity, ErrorSeverity::Warning);
        assert!(warning.hint.is_none());
    }
}
