//! Log export
//!
//! A record set is written to one file per requested extension. Formats are
//! looked up in a registry keyed by extension, so adding a format means
//! registering one more [`LogFormat`] implementation:
//! - `.csv`  - semicolon delimited, header once
//! - `.json` - array of objects, append re-reads and rewrites the file
//! - `.txt`  - one `name : value` block per record
//! - `.xlsx` - worksheet table

mod formats;

pub use formats::{CsvFormat, JsonFormat, TextFormat, XlsxFormat};

use crate::error::LogExportError;
use crate::types::{CoordinatePair, FileResult, SystemError};
use chrono::{DateTime, Local};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Timestamp layout used in every log format
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Timestamp(DateTime<Local>),
    /// Error carried as data; every format reduces it to its message
    Error(String),
    Empty,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) | FieldValue::Error(s) => write!(f, "{}", s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Timestamp(t) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
            FieldValue::Empty => Ok(()),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::Empty => serializer.serialize_none(),
            other => serializer.collect_str(other),
        }
    }
}

/// Ordered set of named fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogRecord {
    fields: Vec<(String, FieldValue)>,
}

impl LogRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Union of field names across records, in first-seen order
pub fn column_names(records: &[LogRecord]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for record in records {
        for (name, _) in record.fields() {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// A serializer for one file format
pub trait LogFormat {
    /// Extension including the leading dot, lowercase
    fn extension(&self) -> &'static str;

    fn write(&self, records: &[LogRecord], path: &Path, append: bool)
        -> Result<(), LogExportError>;
}

/// Registry of log formats keyed by extension
pub struct LogExporter {
    formats: BTreeMap<&'static str, Box<dyn LogFormat>>,
}

impl LogExporter {
    pub fn empty() -> Self {
        Self {
            formats: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, format: Box<dyn LogFormat>) {
        self.formats.insert(format.extension(), format);
    }

    pub fn supports(&self, extension: &str) -> bool {
        self.formats.contains_key(normalize_extension(extension).as_str())
    }

    pub fn extensions(&self) -> Vec<&'static str> {
        self.formats.keys().copied().collect()
    }

    /// Write `records` to `<prefix><ext>` for each requested extension.
    ///
    /// An unknown extension fails the whole request before anything is
    /// written. A failing format is logged and skipped. Returns the files
    /// actually produced.
    pub fn export(
        &self,
        records: &[LogRecord],
        prefix: &Path,
        extensions: &[String],
        append: bool,
    ) -> Result<Vec<PathBuf>, LogExportError> {
        let mut wanted: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = normalize_extension(ext);
            if !self.formats.contains_key(ext.as_str()) {
                return Err(LogExportError::UnknownFormat(ext));
            }
            if !wanted.contains(&ext) {
                wanted.push(ext);
            }
        }

        if records.is_empty() {
            debug!(prefix = %prefix.display(), "no records to export");
            return Ok(Vec::new());
        }

        let mut produced = Vec::new();
        for ext in wanted {
            let path = with_extension(prefix, &ext);
            let Some(format) = self.formats.get(ext.as_str()) else {
                continue;
            };
            match format.write(records, &path, append) {
                Ok(()) => {
                    debug!(path = %path.display(), records = records.len(), "log written");
                    produced.push(path);
                }
                Err(e) => warn!(path = %path.display(), "failed to export log: {}", e),
            }
        }

        Ok(produced)
    }
}

impl Default for LogExporter {
    fn default() -> Self {
        let mut exporter = Self::empty();
        exporter.register(Box::new(CsvFormat));
        exporter.register(Box::new(JsonFormat));
        exporter.register(Box::new(TextFormat));
        exporter.register(Box::new(XlsxFormat));
        exporter
    }
}

fn normalize_extension(extension: &str) -> String {
    let ext = extension.trim().to_ascii_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

/// Append an extension to a prefix that may itself contain dots
fn with_extension(prefix: &Path, ext: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(ext);
    PathBuf::from(name)
}

//==============================================================================
// Record builders
//==============================================================================

/// Log record of one pair, as written to the per-file action logs
pub fn pair_record(file: &FileResult, pair: &CoordinatePair) -> LogRecord {
    let route = pair.api_result();
    let number = |v: Option<f64>| v.map(FieldValue::Number).unwrap_or(FieldValue::Empty);
    let error = if pair.has_errors() {
        FieldValue::Error(pair.errors().join("; "))
    } else {
        FieldValue::Empty
    };

    LogRecord::new()
        .with("timestamp", FieldValue::Timestamp(pair.timestamp))
        .with("file", FieldValue::Text(file.name()))
        .with("startCoordinate", FieldValue::Text(pair.start.clone()))
        .with(
            "destinationCoordinate",
            FieldValue::Text(pair.destination.clone()),
        )
        .with("distanceCell", FieldValue::Text(pair.distance_cell.clone()))
        .with("durationCell", FieldValue::Text(pair.duration_cell.clone()))
        .with("distanceInMeters", number(route.map(|r| r.distance)))
        .with("durationInSeconds", number(route.map(|r| r.duration)))
        .with("error", error)
}

pub fn system_error_record(error: &SystemError) -> LogRecord {
    LogRecord::new()
        .with("timestamp", FieldValue::Timestamp(error.timestamp))
        .with("message", FieldValue::Error(error.message.clone()))
}
