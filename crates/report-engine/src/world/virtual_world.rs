//! `ReportWorld`: the Typst `World` for one render
//!
//! Borrows the worker's own font cache, so a world can only live as long as
//! the job that created it.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Timelike, Utc};
use typst::diag::{FileError, FileResult};
use typst::foundations::{Array, Bytes, Datetime, Dict, Value};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, World};

use super::fonts::FontCache;
use super::virtual_fs::VirtualFilesystem;
use crate::compiler::errors::RenderError;

pub struct ReportWorld<'a> {
    filesystem: VirtualFilesystem,
    fonts: &'a FontCache,
    /// Standard library with `sys.inputs` populated
    library: LazyHash<Library>,
    /// Captured once so every `today()` call agrees
    time: DateTime<Utc>,
}

impl<'a> ReportWorld<'a> {
    /// Create a world for `source` with JSON `inputs` exposed as `sys.inputs`
    pub fn new(
        fonts: &'a FontCache,
        source: String,
        inputs: HashMap<String, serde_json::Value>,
    ) -> Result<Self, RenderError> {
        let inputs = convert_inputs(inputs)?;

        Ok(Self {
            filesystem: VirtualFilesystem::new(source),
            fonts,
            library: LazyHash::new(Library::builder().with_inputs(inputs).build()),
            time: Utc::now(),
        })
    }

    /// Make a binary asset available to the template
    pub fn mount_asset(&mut self, path: &str, content: Bytes) -> Result<(), RenderError> {
        self.filesystem.mount(path, content)?;
        Ok(())
    }
}

fn convert_inputs(inputs: HashMap<String, serde_json::Value>) -> Result<Dict, RenderError> {
    let mut dict = Dict::new();
    for (key, value) in inputs {
        let value = json_to_typst_value(&key, &value)?;
        dict.insert(key.into(), value);
    }
    Ok(dict)
}

fn json_to_typst_value(key: &str, json: &serde_json::Value) -> Result<Value, RenderError> {
    match json {
        serde_json::Value::Null => Ok(Value::None),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(RenderError::InvalidInput(
                    key.to_string(),
                    format!("unrepresentable number {}", n),
                ))
            }
        }
        serde_json::Value::String(s) => Ok(Value::Str(s.as_str().into())),
        serde_json::Value::Array(items) => {
            let items = items
                .iter()
                .map(|item| json_to_typst_value(key, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(Array::from(items.as_slice())))
        }
        serde_json::Value::Object(fields) => {
            let mut dict = Dict::new();
            for (name, value) in fields {
                dict.insert(name.as_str().into(), json_to_typst_value(key, value)?);
            }
            Ok(Value::Dict(dict))
        }
    }
}

impl World for ReportWorld<'_> {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        self.fonts.book()
    }

    fn main(&self) -> FileId {
        self.filesystem.main_id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        self.filesystem
            .source(id)
            .ok_or_else(|| FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        self.filesystem
            .file(id)
            .cloned()
            .ok_or_else(|| FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.font(index)
    }

    fn today(&self, offset: Option<i64>) -> Option<Datetime> {
        let adjusted = self.time + chrono::Duration::hours(offset.unwrap_or(0));

        Datetime::from_ymd_hms(
            adjusted.year(),
            adjusted.month() as u8,
            adjusted.day() as u8,
            adjusted.hour() as u8,
            adjusted.minute() as u8,
            adjusted.second() as u8,
        )
    }
}
