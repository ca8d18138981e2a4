//! SMTP delivery through lettre

use super::mail::{MailMessage, MailTransport, Priority};
use crate::config::SmtpConfig;
use crate::error::NotifyError;
use lettre::message::header::{ContentType, Header, HeaderName, HeaderValue};
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

/// `X-Priority` header; mail clients show `1` as high importance
#[derive(Debug, Clone)]
struct XPriority(String);

impl Header for XPriority {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-Priority")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<SmtpTransport, NotifyError> {
        let builder = if self.config.use_tls {
            SmtpTransport::starttls_relay(&self.config.server)
                .map_err(|e| NotifyError::Transport(e.to_string()))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.server)
        };
        let mut builder = builder.port(self.config.port);

        if let Some(username) = &self.config.username {
            let password = match &self.config.password_env {
                Some(var) => std::env::var(var).map_err(|_| {
                    NotifyError::Transport(format!(
                        "environment variable '{}' with the SMTP password is not set",
                        var
                    ))
                })?,
                None => String::new(),
            };
            builder = builder.credentials(Credentials::new(username.clone(), password));
        }

        Ok(builder.build())
    }

    fn build(&self, message: &MailMessage) -> Result<Message, NotifyError> {
        let mailbox = |address: &str| {
            address
                .parse::<Mailbox>()
                .map_err(|e| NotifyError::Contract(format!("invalid address '{}': {}", address, e)))
        };

        let mut builder = Message::builder()
            .from(mailbox(&message.from)?)
            .subject(message.subject.clone());
        for to in &message.to {
            builder = builder.to(mailbox(to)?);
        }
        for bcc in &message.bcc {
            builder = builder.bcc(mailbox(bcc)?);
        }
        if message.priority == Priority::High {
            builder = builder.header(XPriority("1".to_string()));
        }

        let mut body = MultiPart::mixed().singlepart(SinglePart::html(message.html_body.clone()));
        let octet_stream = ContentType::parse("application/octet-stream")
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        for attachment in &message.attachments {
            body = body.singlepart(
                MimeAttachment::new(attachment.file_name.clone())
                    .body(attachment.content.clone(), octet_stream.clone()),
            );
        }

        builder
            .multipart(body)
            .map_err(|e| NotifyError::Transport(e.to_string()))
    }
}

impl MailTransport for SmtpMailer {
    fn deliver(&self, message: &MailMessage) -> Result<(), NotifyError> {
        let email = self.build(message)?;
        self.transport()?
            .send(&email)
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        info!(
            server = %self.config.server,
            recipients = message.to.len() + message.bcc.len(),
            attachments = message.attachments.len(),
            "report mail sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Attachment;

    fn smtp() -> SmtpConfig {
        SmtpConfig {
            server: "localhost".to_string(),
            port: 2525,
            use_tls: false,
            username: None,
            password_env: None,
        }
    }

    fn message(priority: Priority) -> MailMessage {
        MailMessage {
            from: "bot@example.com".to_string(),
            to: vec!["ops@example.com".to_string()],
            bcc: vec!["audit@example.com".to_string()],
            subject: "Routes".to_string(),
            html_body: "<p>ok</p>".to_string(),
            priority,
            attachments: vec![Attachment {
                file_name: "log.csv".to_string(),
                content: b"a;b\n".to_vec(),
            }],
        }
    }

    #[test]
    fn test_build_sets_priority_header_and_attachment() {
        let mailer = SmtpMailer::new(smtp());
        let email = mailer.build(&message(Priority::High)).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();

        assert!(raw.contains("X-Priority: 1"));
        assert!(raw.contains("log.csv"));
        assert!(raw.contains("Subject: Routes"));
    }

    #[test]
    fn test_build_normal_priority_has_no_header() {
        let mailer = SmtpMailer::new(smtp());
        let email = mailer.build(&message(Priority::Normal)).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(!raw.contains("X-Priority"));
    }

    #[test]
    fn test_missing_password_variable_is_error() {
        let mut config = smtp();
        config.username = Some("bot".to_string());
        config.password_env = Some("ROADSHEET_TEST_UNSET_PASSWORD_VAR".to_string());
        let mailer = SmtpMailer::new(config);
        assert!(matches!(mailer.transport(), Err(NotifyError::Transport(_))));
    }
}
