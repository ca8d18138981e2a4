use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

//==============================================================================
// Pairs
//==============================================================================

/// Distance and duration returned by the routing service for one pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteSummary {
    /// Driving distance in meters
    pub distance: f64,
    /// Driving duration in seconds
    pub duration: f64,
}

/// A start/destination combination found on a worksheet.
///
/// Errors are append-only and the route result is set at most once, so a
/// pair carrying errors never reaches the write-back step.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatePair {
    pub start: String,
    pub destination: String,
    pub distance_cell: String,
    pub duration_cell: String,
    pub timestamp: DateTime<Local>,
    api_result: Option<RouteSummary>,
    errors: Vec<String>,
}

impl CoordinatePair {
    pub fn new(
        start: impl Into<String>,
        destination: impl Into<String>,
        distance_cell: impl Into<String>,
        duration_cell: impl Into<String>,
    ) -> Self {
        Self {
            start: start.into(),
            destination: destination.into(),
            distance_cell: distance_cell.into(),
            duration_cell: duration_cell.into(),
            timestamp: Local::now(),
            api_result: None,
            errors: Vec::new(),
        }
    }

    pub fn api_result(&self) -> Option<RouteSummary> {
        self.api_result
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Store the routing result. Returns false (and keeps the first result)
    /// when one was already recorded.
    pub fn record_route(&mut self, route: RouteSummary) -> bool {
        if self.api_result.is_some() {
            return false;
        }
        self.api_result = Some(route);
        true
    }

    /// Ready for write-back: resolved and error-free
    pub fn is_updatable(&self) -> bool {
        self.api_result.is_some() && self.errors.is_empty()
    }
}

/// All pairs extracted from one input file
#[derive(Debug, Clone, PartialEq)]
pub struct FileResult {
    pub file: PathBuf,
    pub pairs: Vec<CoordinatePair>,
}

impl FileResult {
    pub fn new(file: PathBuf, pairs: Vec<CoordinatePair>) -> Self {
        Self { file, pairs }
    }

    /// File name used in logs and reports
    pub fn name(&self) -> String {
        self.file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.display().to_string())
    }

    pub fn error_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.has_errors()).count()
    }
}

//==============================================================================
// Run-level records
//==============================================================================

/// Run-level failure: config, file open/save/archive, log, mail
#[derive(Debug, Clone, PartialEq)]
pub struct SystemError {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl SystemError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Severity of an operating-system event log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventEntryType {
    Information,
    Warning,
    Error,
    SuccessAudit,
    FailureAudit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLogEntry {
    pub timestamp: Option<DateTime<Local>>,
    pub message: String,
    pub entry_type: EventEntryType,
    pub event_id: u32,
}

impl EventLogEntry {
    pub fn new(entry_type: EventEntryType, event_id: u32, message: impl Into<String>) -> Self {
        Self {
            timestamp: Some(Local::now()),
            message: message.into(),
            entry_type,
            event_id,
        }
    }
}
