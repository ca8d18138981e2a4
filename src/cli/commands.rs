use crate::config::RunConfig;
use crate::error::{RoadsheetError, RoadsheetResult};
use crate::events::{EventLog, JournalEventLog};
use crate::notify::{MailTransport, SmtpMailer};
use crate::processor::ProcessOptions;
use crate::routing::OsrmClient;
use crate::run::{self, RunReport, Services};
use colored::Colorize;
use std::path::PathBuf;

/// Execute the run command; returns the process exit code
pub fn run(config_path: PathBuf, dry_run: bool) -> RoadsheetResult<i32> {
    println!("{}", "🚗 Roadsheet - Resolving route distances".bold().green());
    println!("   Config: {}", config_path.display());

    let config = RunConfig::load(&config_path)?;
    println!("   Drop folder: {}", config.drop_folder.display());
    println!("   Worksheet: {}\n", config.worksheet_name);

    if dry_run {
        println!(
            "{}",
            "📋 DRY RUN MODE - No workbooks saved or archived, no mail sent\n".yellow()
        );
    }

    let router = OsrmClient::new(&config.routing)
        .map_err(|e| RoadsheetError::Config(format!("Routing client: {}", e)))?;
    let mailer = config
        .send_mail
        .as_ref()
        .map(|mail| SmtpMailer::new(mail.smtp.clone()));
    let mut journal = config
        .event_log
        .as_ref()
        .filter(|e| e.enabled)
        .map(|e| JournalEventLog::new(&e.folder));

    let report = run::run(
        &config,
        Services {
            router: &router,
            mailer: mailer.as_ref().map(|m| m as &dyn MailTransport),
            event_log: journal.as_mut().map(|j| j as &mut dyn EventLog),
        },
        ProcessOptions { dry_run },
    );

    print_report(&report);
    Ok(report.exit_code)
}

/// Execute the check-config command
pub fn check_config(config_path: PathBuf) -> RoadsheetResult<()> {
    println!("{}", "✅ Checking configuration".bold().green());
    println!("   File: {}\n", config_path.display());

    let config = match RunConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("{}", format!("❌ {}", e).bold().red());
            return Err(e);
        }
    };

    println!("   Worksheet: {}", config.worksheet_name.bright_blue());
    let columns = &config.columns;
    println!(
        "   Columns: marker {} | coordinate {} | distance {} | duration {}",
        columns.start_destination, columns.coordinate, columns.distance, columns.duration
    );
    println!("   Routing: {}", config.routing.base_url);
    if let Some(log) = &config.log {
        println!(
            "   Logs: {} ({})",
            log.folder.display(),
            log.extensions.join(", ")
        );
    }
    if let Some(mail) = &config.send_mail {
        println!("   Mail: {} via {}", mail.when, mail.smtp.server);
    }
    println!("\n{}", "✅ Configuration is valid".bold().green());
    Ok(())
}

fn print_report(report: &RunReport) {
    let summary = report.summary();

    println!("{}", "📊 Run Results:".bold().green());
    for result in &report.results {
        let errors = result.error_count();
        let line = format!(
            "   📄 {} - {} pair(s), {} error(s)",
            result.name(),
            result.pairs.len(),
            errors
        );
        if errors == 0 {
            println!("{}", line);
        } else {
            println!("{}", line.yellow());
        }
    }
    if report.results.is_empty() {
        println!("   No workbooks processed");
    }

    if !report.log_files.is_empty() {
        println!("\n   📝 Log files:");
        for file in &report.log_files {
            println!("      {}", file.display());
        }
    }
    if report.mail_sent {
        println!("\n   ✉️  Report mail sent");
    }

    if report.system_errors.is_empty() {
        println!(
            "\n{}",
            format!(
                "✅ Done: {} file(s), {} pair(s), {} pair error(s)",
                summary.files, summary.pairs, summary.pair_errors
            )
            .bold()
            .green()
        );
    } else {
        println!("\n{}", "❌ System errors:".bold().red());
        for error in &report.system_errors {
            println!("   {}", error.to_string().red());
        }
    }
}
