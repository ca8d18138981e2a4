//! Operating-system style event log

use crate::config::EventLogConfig;
use crate::context::RunContext;
use crate::types::{EventEntryType, EventLogEntry};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

pub const EVENT_RUN_STARTED: u32 = 1000;
pub const EVENT_RUN_FINISHED: u32 = 1002;
pub const EVENT_RUN_FINISHED_WITH_ERRORS: u32 = 1003;
pub const EVENT_SYSTEM_ERROR: u32 = 2000;

/// Event log backend
pub trait EventLog {
    fn exists(&self, log_name: &str, source: &str) -> io::Result<bool>;

    fn create(&mut self, log_name: &str, source: &str) -> io::Result<()>;

    fn write_entry(
        &mut self,
        source: &str,
        log_name: &str,
        entry_type: EventEntryType,
        event_id: u32,
        message: &str,
    ) -> io::Result<()>;
}

/// Event log kept as JSON lines, one journal file per log name
pub struct JournalEventLog {
    folder: PathBuf,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JournalLine<'a> {
    time_generated: String,
    source: &'a str,
    log_name: &'a str,
    entry_type: EventEntryType,
    event_id: u32,
    message: &'a str,
}

impl JournalEventLog {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    fn journal(&self, log_name: &str) -> PathBuf {
        self.folder.join(format!("{}.jsonl", log_name))
    }
}

impl EventLog for JournalEventLog {
    fn exists(&self, log_name: &str, _source: &str) -> io::Result<bool> {
        Ok(self.journal(log_name).is_file())
    }

    fn create(&mut self, log_name: &str, _source: &str) -> io::Result<()> {
        fs::create_dir_all(&self.folder)?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.journal(log_name))?;
        Ok(())
    }

    fn write_entry(
        &mut self,
        source: &str,
        log_name: &str,
        entry_type: EventEntryType,
        event_id: u32,
        message: &str,
    ) -> io::Result<()> {
        let line = JournalLine {
            time_generated: chrono::Local::now().to_rfc3339(),
            source,
            log_name,
            entry_type,
            event_id,
            message,
        };
        let mut file = OpenOptions::new()
            .append(true)
            .open(self.journal(log_name))?;
        let json = serde_json::to_string(&line).map_err(io::Error::other)?;
        writeln!(file, "{}", json)
    }
}

/// Flush every collected event to the configured log, creating it first if
/// needed. Failures become system errors.
pub fn flush_events(
    config: &EventLogConfig,
    log: &mut dyn EventLog,
    events: &[EventLogEntry],
    ctx: &mut RunContext,
) {
    if !config.enabled {
        return;
    }

    let ready = log
        .exists(&config.log_name, &config.source)
        .and_then(|exists| {
            if exists {
                Ok(())
            } else {
                log.create(&config.log_name, &config.source)
            }
        });
    if let Err(e) = ready {
        ctx.system_error(format!(
            "Failed to create event log '{}' with source '{}': {}",
            config.log_name, config.source, e
        ));
        return;
    }

    for event in events {
        if let Err(e) = log.write_entry(
            &config.source,
            &config.log_name,
            event.entry_type,
            event.event_id,
            &event.message,
        ) {
            warn!(event_id = event.event_id, "event log write failed: {}", e);
            ctx.system_error(format!(
                "Failed to write to event log '{}': {}",
                config.log_name, e
            ));
            return;
        }
    }
    debug!(count = events.len(), log = %config.log_name, "events flushed");
}
