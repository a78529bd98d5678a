//! In-memory file tree for one compilation
//!
//! Holds the main template and any binary assets (the rasterized chart).
//! Nothing is read from or written to the real filesystem.

use std::collections::HashMap;

use typst::foundations::Bytes;
use typst::syntax::{FileId, Source, VirtualPath};

use crate::compiler::errors::RenderError;

const MAIN_PATH: &str = "/main.typ";

#[derive(Debug)]
pub struct VirtualFilesystem {
    files: HashMap<FileId, Bytes>,
    main_id: FileId,
}

impl VirtualFilesystem {
    /// Create a filesystem whose entry point is `main_source`
    pub fn new(main_source: String) -> Self {
        let main_id = file_id(MAIN_PATH);
        let mut files = HashMap::new();
        files.insert(main_id, Bytes::from(main_source.into_bytes()));

        Self { files, main_id }
    }

    pub fn main_id(&self) -> FileId {
        self.main_id
    }

    /// Mount a binary asset, e.g. `chart.png`
    pub fn mount(&mut self, path: &str, content: Bytes) -> Result<FileId, RenderError> {
        if path.contains("..") {
            return Err(RenderError::PathSecurityViolation(format!(
                "'{}' escapes the document root",
                path
            )));
        }

        let id = file_id(&normalize(path));
        self.files.insert(id, content);
        Ok(id)
    }

    /// Source text for `.typ` files
    pub fn source(&self, id: FileId) -> Option<Source> {
        let content = self.files.get(&id)?;
        let text = std::str::from_utf8(content).ok()?;
        Some(Source::new(id, text.to_string()))
    }

    pub fn file(&self, id: FileId) -> Option<&Bytes> {
        self.files.get(&id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn file_id(path: &str) -> FileId {
    FileId::new(None, VirtualPath::new(path))
}

fn normalize(path: &str) -> String {
    let mut normalized = format!("/{}", path.trim_start_matches('/'));
    while normalized.contains("//") {
        normalized = normalized.replace("//", "/");
    }
    normalized
}
