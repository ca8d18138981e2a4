//! Run notification
//!
//! Decides whether a run warrants an email, renders the HTML report and
//! hands the message to a [`MailTransport`].

mod mail;
mod report;
mod smtp;

pub use mail::{Attachment, MailMessage, MailTransport, Priority};
pub use report::{render_report, ReportInput};
pub use smtp::SmtpMailer;

use crate::error::NotifyError;
use crate::types::FileResult;
use std::str::FromStr;

/// When a run sends its report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTrigger {
    Never,
    Always,
    OnError,
    OnErrorOrAction,
}

impl FromStr for MailTrigger {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Never" => Ok(MailTrigger::Never),
            "Always" => Ok(MailTrigger::Always),
            "OnError" => Ok(MailTrigger::OnError),
            "OnErrorOrAction" => Ok(MailTrigger::OnErrorOrAction),
            other => Err(NotifyError::UnknownTrigger(other.to_string())),
        }
    }
}

/// Counts the decision and the report are based on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub system_errors: usize,
    pub pair_errors: usize,
    pub pairs: usize,
    pub files: usize,
}

impl RunSummary {
    pub fn from_results(results: &[FileResult], system_errors: usize) -> Self {
        Self {
            system_errors,
            pair_errors: results.iter().map(FileResult::error_count).sum(),
            pairs: results.iter().map(|r| r.pairs.len()).sum(),
            files: results.len(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.system_errors > 0 || self.pair_errors > 0
    }

    pub fn priority(&self) -> Priority {
        if self.has_errors() {
            Priority::High
        } else {
            Priority::Normal
        }
    }
}

pub fn should_send(trigger: MailTrigger, summary: &RunSummary) -> bool {
    match trigger {
        MailTrigger::Never => false,
        MailTrigger::Always => true,
        MailTrigger::OnError => summary.has_errors(),
        MailTrigger::OnErrorOrAction => summary.has_errors() || summary.pairs > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(system_errors: usize, pair_errors: usize, pairs: usize) -> RunSummary {
        RunSummary {
            system_errors,
            pair_errors,
            pairs,
            files: 1,
        }
    }

    #[test]
    fn test_parse_trigger() {
        assert_eq!("OnError".parse::<MailTrigger>().unwrap(), MailTrigger::OnError);
        assert_eq!(
            " OnErrorOrAction ".parse::<MailTrigger>().unwrap(),
            MailTrigger::OnErrorOrAction
        );
        assert!(matches!(
            "Sometimes".parse::<MailTrigger>(),
            Err(NotifyError::UnknownTrigger(_))
        ));
    }

    #[test]
    fn test_decision_table() {
        let clean = summary(0, 0, 0);
        let action = summary(0, 0, 3);
        let pair_error = summary(0, 1, 3);
        let system_error = summary(1, 0, 0);

        assert!(!should_send(MailTrigger::Never, &system_error));
        assert!(should_send(MailTrigger::Always, &clean));

        assert!(!should_send(MailTrigger::OnError, &clean));
        assert!(!should_send(MailTrigger::OnError, &action));
        assert!(should_send(MailTrigger::OnError, &pair_error));
        assert!(should_send(MailTrigger::OnError, &system_error));

        assert!(!should_send(MailTrigger::OnErrorOrAction, &clean));
        assert!(should_send(MailTrigger::OnErrorOrAction, &action));
        assert!(should_send(MailTrigger::OnErrorOrAction, &system_error));
    }

    #[test]
    fn test_priority_follows_errors() {
        assert_eq!(summary(0, 1, 1).priority(), Priority::High);
        assert_eq!(summary(0, 0, 1).priority(), Priority::Normal);
    }
}
