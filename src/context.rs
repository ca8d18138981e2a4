//! Run-wide accumulators threaded through every pipeline step

use crate::types::{EventEntryType, EventLogEntry, SystemError};
use chrono::{DateTime, Local};
use tracing::debug;
use uuid::Uuid;

/// State shared by all steps of one run.
///
/// Everything here is append-only; the pipeline is single-threaded so the
/// context is passed by `&mut` rather than shared.
#[derive(Debug)]
pub struct RunContext {
    pub run_id: Uuid,
    pub started: DateTime<Local>,
    system_errors: Vec<SystemError>,
    events: Vec<EventLogEntry>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started: Local::now(),
            system_errors: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Record a run-level failure
    pub fn system_error(&mut self, message: impl Into<String>) {
        let error = SystemError::new(message);
        debug!(run_id = %self.run_id, "system error recorded: {}", error.message);
        self.system_errors.push(error);
    }

    pub fn event(&mut self, entry_type: EventEntryType, event_id: u32, message: impl Into<String>) {
        self.events
            .push(EventLogEntry::new(entry_type, event_id, message));
    }

    pub fn system_errors(&self) -> &[SystemError] {
        &self.system_errors
    }

    pub fn has_system_errors(&self) -> bool {
        !self.system_errors.is_empty()
    }

    pub fn events(&self) -> &[EventLogEntry] {
        &self.events
    }

    /// Process exit status: 0 for a clean run, 1 as soon as any system error exists
    pub fn exit_code(&self) -> i32 {
        if self.system_errors.is_empty() {
            0
        } else {
            1
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
