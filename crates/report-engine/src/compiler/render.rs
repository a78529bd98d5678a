//! Compile a world and export the result
//!
//! Everything here is synchronous and CPU-bound; callers run it on a pool
//! slot, never on the async runtime.

use typst::diag::{Severity, SourceDiagnostic};
use typst::model::Document;

use super::errors::{CompileError, RenderError};
use crate::world::ReportWorld;

/// Compile the world's main file into a laid-out document.
///
/// Returns the document together with any warnings.
pub fn compile(world: &ReportWorld<'_>) -> Result<(Document, Vec<CompileError>), RenderError> {
    let warned = typst::compile(world);
    let (_, warnings) = categorize_diagnostics(&warned.warnings);

    match warned.output {
        Ok(document) => {
            for warning in &warnings {
                tracing::debug!("Typst warning: {}", warning.message);
            }
            Ok((document, warnings))
        }
        Err(diagnostics) => {
            let (errors, _) = categorize_diagnostics(&diagnostics);
            if errors.is_empty() {
                Err(RenderError::Compile(vec![CompileError::new(
                    "Compilation failed with unknown error",
                )]))
            } else {
                Err(RenderError::Compile(errors))
            }
        }
    }
}

/// Export every page as PDF
pub fn export_pdf(document: &Document) -> Result<Vec<u8>, RenderError> {
    if document.pages.is_empty() {
        return Err(RenderError::EmptyDocument);
    }

    typst_pdf::pdf(document, &typst_pdf::PdfOptions::default()).map_err(|diagnostics| {
        let (errors, _) = categorize_diagnostics(&diagnostics);
        RenderError::PdfExport(
            errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; "),
        )
    })
}

/// Rasterize the first page to PNG at `pixels_per_point`
pub fn rasterize_first_page(
    document: &Document,
    pixels_per_point: f32,
) -> Result<Vec<u8>, RenderError> {
    let page = document.pages.first().ok_or(RenderError::EmptyDocument)?;

    typst_render::render(page, pixels_per_point)
        .encode_png()
        .map_err(|e| RenderError::PngEncode(e.to_string()))
}

/// Split diagnostics into errors and warnings
fn categorize_diagnostics(
    diagnostics: &[SourceDiagnostic],
) -> (Vec<CompileError>, Vec<CompileError>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for diag in diagnostics {
        let mut compile_error = CompileError::new(diag.message.to_string());

        if !diag.hints.is_empty() {
            let hint = diag
                .hints
                .iter()
                .map(|h| h.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            compile_error = compile_error.with_hint(hint);
        }

        match diag.severity {
            Severity::Error => errors.push(compile_error),
            Severity::Warning => warnings.push(compile_error.as_warning()),
        }
    }

    (errors, warnings)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::world::FontCache;

    #[test]
    fn test_compile_simple_document() {
        let fonts = FontCache::embedded().unwrap();
        let world = ReportWorld::new(&fonts, "Hello, *World*!".to_string(), HashMap::new()).unwrap();

        let (document, _) = compile(&world).unwrap();
        assert_eq!(document.pages.len(), 1);

        let pdf = export_pdf(&document).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_compile_error_is_reported() {
        let fonts = FontCache::embedded().unwrap();
        let world = ReportWorld::new(&fonts, "#let x = ".to_string(), HashMap::new()).unwrap();

        match compile(&world) {
            Err(RenderError::Compile(errors)) => assert!(!errors.is_empty()),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("broken source should not compile"),
        }
    }

    #[test]
    fn test_rasterize_produces_png() {
        let fonts = FontCache::embedded().unwrap();
        let source = "#set page(width: 100pt, height: 50pt)\n#rect(width: 50pt, height: 20pt, fill: red)";
        let world = ReportWorld::new(&fonts, source.to_string(), HashMap::new()).unwrap();

        let (document, _) = compile(&world).unwrap();
        let png = rasterize_first_page(&document, 2.0).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
