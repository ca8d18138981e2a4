//! HTML report body

use super::RunSummary;
use crate::types::{FileResult, SystemError};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::path::Path;

/// Everything the report shows besides the caller's own message
pub struct ReportInput<'a> {
    pub message: &'a str,
    pub summary: &'a RunSummary,
    pub results: &'a [FileResult],
    pub system_errors: &'a [SystemError],
    pub source_folder: &'a Path,
    pub archive_folder: Option<&'a Path>,
    pub started: DateTime<Local>,
    pub finished: DateTime<Local>,
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `file://` link; Unix paths bring their own leading slash, drive paths do not
fn folder_link(path: &Path) -> String {
    let shown = escape(&path.display().to_string());
    let target = path.display().to_string().replace('\\', "/");
    let href = if target.starts_with('/') {
        format!("file://{}", target)
    } else {
        format!("file:///{}", target)
    };
    format!("<a href=\"{}\">{}</a>", escape(&href), shown)
}

fn format_duration(started: DateTime<Local>, finished: DateTime<Local>) -> String {
    let secs = (finished - started).num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Render the report: caller message, summary table, then any system errors
pub fn render_report(input: &ReportInput<'_>) -> String {
    let mut html = String::new();
    let summary = input.summary;

    // Writing into a String cannot fail
    let _ = writeln!(html, "<p>{}</p>", input.message);
    html.push_str("<table>\n");

    let mut row = |label: &str, value: String| {
        let _ = writeln!(html, "<tr><th align=\"left\">{}</th><td>{}</td></tr>", label, value);
    };
    row("System errors", summary.system_errors.to_string());
    row("Action errors", summary.pair_errors.to_string());
    row("Actions", summary.pairs.to_string());
    row(
        "Files",
        if input.results.is_empty() {
            "-".to_string()
        } else {
            input
                .results
                .iter()
                .map(|r| escape(&r.name()))
                .collect::<Vec<_>>()
                .join("<br>")
        },
    );
    row("Source folder", folder_link(input.source_folder));
    if let Some(archive) = input.archive_folder {
        row("Archive folder", folder_link(archive));
    }
    row(
        "Start time",
        input.started.format("%d/%m/%Y %H:%M:%S").to_string(),
    );
    row("Duration", format_duration(input.started, input.finished));
    html.push_str("</table>\n");

    if !input.system_errors.is_empty() {
        html.push_str("<p>System errors:</p>\n<ul>\n");
        for error in input.system_errors {
            let _ = writeln!(html, "<li>{}</li>", escape(&error.message));
        }
        html.push_str("</ul>\n");
    }

    html
}
