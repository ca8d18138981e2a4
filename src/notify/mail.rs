//! Mail message contract and attachment budget

use crate::config::MailConfig;
use crate::error::NotifyError;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Normal,
    High,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// A validated message ready for a transport
#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub priority: Priority,
    pub attachments: Vec<Attachment>,
}

/// Delivers a message; the SMTP client in production, a recorder in tests
pub trait MailTransport {
    fn deliver(&self, message: &MailMessage) -> Result<(), NotifyError>;
}

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+\-']+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$";

static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());

pub fn is_valid_email(address: &str) -> bool {
    EMAIL_RE
        .as_ref()
        .map(|re| re.is_match(address.trim()))
        .unwrap_or(false)
}

impl MailMessage {
    /// Build a message from the mail config, enforcing the transport contract:
    /// a sender, at least one To or Bcc recipient, well-formed addresses and
    /// an attachment budget. Attachments over budget or unreadable are left
    /// out and a single notice is appended to the body.
    pub fn prepare(
        config: &MailConfig,
        html_body: String,
        priority: Priority,
        attachment_paths: &[PathBuf],
    ) -> Result<Self, NotifyError> {
        if config.from.trim().is_empty() {
            return Err(NotifyError::Contract("sender address is required".to_string()));
        }
        if config.to.is_empty() && config.bcc.is_empty() {
            return Err(NotifyError::Contract(
                "at least one To or Bcc recipient is required".to_string(),
            ));
        }
        for address in std::iter::once(&config.from)
            .chain(config.to.iter())
            .chain(config.bcc.iter())
        {
            if !is_valid_email(address) {
                return Err(NotifyError::Contract(format!(
                    "invalid email address '{}'",
                    address
                )));
            }
        }

        let budget = (config.max_attachments_size_mb * 1024.0 * 1024.0) as u64;
        let loaded = load_attachments(attachment_paths, budget);

        let mut html_body = html_body;
        let left_out = loaded.over_budget + loaded.unreadable;
        if left_out > 0 {
            warn!(
                over_budget = loaded.over_budget,
                unreadable = loaded.unreadable,
                budget_bytes = budget,
                "attachments left out"
            );
            let mut reasons = Vec::new();
            if loaded.over_budget > 0 {
                reasons.push(format!(
                    "total size exceeds {} MB",
                    config.max_attachments_size_mb
                ));
            }
            if loaded.unreadable > 0 {
                reasons.push(format!("{} could not be read", loaded.unreadable));
            }
            html_body.push_str(&format!(
                "<p><i>* {} attachment(s) not included: {}</i></p>",
                left_out,
                reasons.join("; ")
            ));
        }

        Ok(Self {
            from: config.from.trim().to_string(),
            to: config.to.iter().map(|a| a.trim().to_string()).collect(),
            bcc: config.bcc.iter().map(|a| a.trim().to_string()).collect(),
            subject: config.subject.clone(),
            html_body,
            priority,
            attachments: loaded.attachments,
        })
    }
}

#[derive(Debug, Default)]
struct LoadedAttachments {
    attachments: Vec<Attachment>,
    over_budget: usize,
    unreadable: usize,
}

/// Read attachments in order, deduplicated, skipping unreadable files and any
/// that would take the running total past `budget` bytes
fn load_attachments(paths: &[PathBuf], budget: u64) -> LoadedAttachments {
    let mut seen: Vec<&Path> = Vec::new();
    let mut loaded = LoadedAttachments::default();
    let mut total: u64 = 0;

    for path in paths {
        if seen.contains(&path.as_path()) {
            continue;
        }
        seen.push(path.as_path());

        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), "attachment skipped: {}", e);
                loaded.unreadable += 1;
                continue;
            }
        };
        let size = content.len() as u64;
        if total + size > budget {
            loaded.over_budget += 1;
            continue;
        }
        total += size;

        loaded.attachments.push(Attachment {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "attachment".to_string()),
            content,
        });
    }

    loaded
}
