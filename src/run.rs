//! One end-to-end run
//!
//! Files are processed sequentially; then logs are exported, old logs swept,
//! the notification decided and the events flushed. Each step runs even when
//! an earlier one failed.

use crate::config::{LogConfig, MailConfig, RunConfig};
use crate::context::RunContext;
use crate::events::{
    flush_events, EventLog, EVENT_RUN_FINISHED, EVENT_RUN_FINISHED_WITH_ERRORS, EVENT_RUN_STARTED,
    EVENT_SYSTEM_ERROR,
};
use crate::logs::{pair_record, system_error_record, LogExporter, LogRecord};
use crate::notify::{
    render_report, should_send, MailMessage, MailTransport, MailTrigger, ReportInput, RunSummary,
};
use crate::processor::{discover_input_files, process_file, ProcessOptions};
use crate::retention::{sweep, RetentionPolicy};
use crate::routing::RouteService;
use crate::types::{EventEntryType, FileResult, SystemError};
use chrono::Local;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// External collaborators of a run
pub struct Services<'a> {
    pub router: &'a dyn RouteService,
    pub mailer: Option<&'a dyn MailTransport>,
    pub event_log: Option<&'a mut dyn EventLog>,
}

/// Outcome of a run
#[derive(Debug)]
pub struct RunReport {
    pub results: Vec<FileResult>,
    pub system_errors: Vec<SystemError>,
    pub log_files: Vec<PathBuf>,
    pub mail_sent: bool,
    pub exit_code: i32,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_results(&self.results, self.system_errors.len())
    }
}

pub fn run(config: &RunConfig, services: Services<'_>, options: ProcessOptions) -> RunReport {
    let mut ctx = RunContext::new();
    info!(run_id = %ctx.run_id, drop_folder = %config.drop_folder.display(), "run started");
    ctx.event(
        EventEntryType::Information,
        EVENT_RUN_STARTED,
        format!("Run started for drop folder '{}'", config.drop_folder.display()),
    );

    let results = process_drop_folder(config, services.router, options, &mut ctx);

    let log_files = match &config.log {
        Some(log) => export_logs(log, &results, &mut ctx),
        None => Vec::new(),
    };

    // Anchored to the run start; this run's own logs are never swept
    if let Some(log) = &config.log {
        if let Some(days) = log.retention_days {
            let policy = RetentionPolicy::new(&log.folder, days);
            sweep(&policy, ctx.started, &log_files, &mut ctx);
        }
    }

    let mail_sent = match (&config.send_mail, services.mailer) {
        (Some(mail), Some(mailer)) if !options.dry_run => {
            notify(config, mail, mailer, &results, &log_files, &mut ctx)
        }
        _ => false,
    };

    finish_events(&mut ctx);
    if let (Some(event_config), Some(event_log)) = (&config.event_log, services.event_log) {
        let events = ctx.events().to_vec();
        flush_events(event_config, event_log, &events, &mut ctx);
    }

    report_system_errors(&ctx);
    let exit_code = ctx.exit_code();
    info!(run_id = %ctx.run_id, files = results.len(), exit_code, "run finished");

    RunReport {
        results,
        system_errors: ctx.system_errors().to_vec(),
        log_files,
        mail_sent,
        exit_code,
    }
}

fn process_drop_folder(
    config: &RunConfig,
    router: &dyn RouteService,
    options: ProcessOptions,
    ctx: &mut RunContext,
) -> Vec<FileResult> {
    let files = match discover_input_files(&config.drop_folder) {
        Ok(files) => files,
        Err(e) => {
            ctx.system_error(format!(
                "Failed to read drop folder '{}': {}",
                config.drop_folder.display(),
                e
            ));
            return Vec::new();
        }
    };
    info!(count = files.len(), "input files found");

    files
        .iter()
        .filter_map(|path| process_file(path, config, router, options, ctx))
        .collect()
}

/// Records for one file's action log, filtered by the `what` flags
fn action_records(log: &LogConfig, result: &FileResult) -> Vec<LogRecord> {
    let what = log.what;
    result
        .pairs
        .iter()
        .filter(|pair| what.all_actions || (what.only_action_errors && pair.has_errors()))
        .map(|pair| pair_record(result, pair))
        .collect()
}

fn export_logs(log: &LogConfig, results: &[FileResult], ctx: &mut RunContext) -> Vec<PathBuf> {
    if let Err(e) = fs::create_dir_all(&log.folder) {
        ctx.system_error(format!(
            "Failed to create log folder '{}': {}",
            log.folder.display(),
            e
        ));
        return Vec::new();
    }

    let exporter = LogExporter::default();
    let stamp = ctx.started.format("%Y-%m-%d %H%M%S").to_string();
    let mut produced = Vec::new();

    for result in results {
        let records = action_records(log, result);
        let stem = result
            .file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| result.name());
        let prefix = log.folder.join(format!("{} - {}", stamp, stem));
        match exporter.export(&records, &prefix, &log.extensions, false) {
            Ok(files) => produced.extend(files),
            Err(e) => ctx.system_error(format!(
                "Failed to export log for '{}': {}",
                result.name(),
                e
            )),
        }
    }

    if log.what.system_errors && ctx.has_system_errors() {
        let records: Vec<LogRecord> = ctx
            .system_errors()
            .iter()
            .map(system_error_record)
            .collect();
        let prefix = log.folder.join(format!("{} - System errors", stamp));
        match exporter.export(&records, &prefix, &log.extensions, true) {
            Ok(files) => produced.extend(files),
            Err(e) => ctx.system_error(format!("Failed to export system error log: {}", e)),
        }
    }

    produced
}

fn notify(
    config: &RunConfig,
    mail: &MailConfig,
    mailer: &dyn MailTransport,
    results: &[FileResult],
    log_files: &[PathBuf],
    ctx: &mut RunContext,
) -> bool {
    let trigger: MailTrigger = match mail.when.parse() {
        Ok(trigger) => trigger,
        Err(e) => {
            ctx.system_error(e.to_string());
            return false;
        }
    };

    let summary = RunSummary::from_results(results, ctx.system_errors().len());
    if !should_send(trigger, &summary) {
        info!(?trigger, "no mail needed");
        return false;
    }

    let html = render_report(&ReportInput {
        message: &mail.body,
        summary: &summary,
        results,
        system_errors: ctx.system_errors(),
        source_folder: &config.drop_folder,
        archive_folder: config.archive_folder.as_deref(),
        started: ctx.started,
        finished: Local::now(),
    });

    let sent = MailMessage::prepare(mail, html, summary.priority(), log_files)
        .and_then(|message| mailer.deliver(&message));
    match sent {
        Ok(()) => true,
        Err(e) => {
            ctx.system_error(format!("Notification failed: {}", e));
            false
        }
    }
}

/// One warning per system error, once the run is over
fn report_system_errors(ctx: &RunContext) {
    for error in ctx.system_errors() {
        warn!(run_id = %ctx.run_id, "system error: {}", error.message);
    }
}

fn finish_events(ctx: &mut RunContext) {
    let messages: Vec<String> = ctx
        .system_errors()
        .iter()
        .map(|e| e.message.clone())
        .collect();
    for message in &messages {
        ctx.event(EventEntryType::Error, EVENT_SYSTEM_ERROR, message.clone());
    }

    if messages.is_empty() {
        ctx.event(
            EventEntryType::Information,
            EVENT_RUN_FINISHED,
            "Run finished without errors",
        );
    } else {
        ctx.event(
            EventEntryType::Warning,
            EVENT_RUN_FINISHED_WITH_ERRORS,
            format!("Run finished with {} system error(s)", messages.len()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogWhat;
    use crate::types::CoordinatePair;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing::Level;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn log_config(what: LogWhat) -> LogConfig {
        LogConfig {
            folder: PathBuf::from("logs"),
            extensions: vec![".csv".to_string()],
            retention_days: None,
            what,
        }
    }

    fn result() -> FileResult {
        let ok = CoordinatePair::new("1", "2", "C3", "D3");
        let mut bad = CoordinatePair::new("3", "4", "C5", "D5");
        bad.push_error("Failed API request: 500");
        FileResult::new(PathBuf::from("trips.xlsx"), vec![ok, bad])
    }

    #[test]
    fn test_action_records_follow_flags() {
        let all = LogWhat {
            system_errors: true,
            all_actions: true,
            only_action_errors: false,
        };
        let errors_only = LogWhat {
            all_actions: false,
            only_action_errors: true,
            ..all
        };
        let nothing = LogWhat {
            all_actions: false,
            only_action_errors: false,
            ..all
        };

        assert_eq!(action_records(&log_config(all), &result()).len(), 2);
        assert_eq!(action_records(&log_config(errors_only), &result()).len(), 1);
        assert!(action_records(&log_config(nothing), &result()).is_empty());
    }

    #[test]
    fn test_finish_events_reports_errors() {
        let mut ctx = RunContext::new();
        ctx.system_error("Failed to open file 'x.xlsx'");
        finish_events(&mut ctx);

        let ids: Vec<u32> = ctx.events().iter().map(|e| e.event_id).collect();
        assert_eq!(ids, vec![EVENT_SYSTEM_ERROR, EVENT_RUN_FINISHED_WITH_ERRORS]);
    }

    #[test]
    fn test_system_errors_warned_once() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut ctx = RunContext::new();
            ctx.system_error("Failed to open file 'x.xlsx'");
            report_system_errors(&ctx);
        });

        let output = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("Failed to open file 'x.xlsx'").count(), 1);
    }
}
