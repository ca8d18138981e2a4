//! Run configuration
//!
//! Loaded once at startup from JSON or YAML, checked against the embedded
//! JSON Schema, then deserialized and semantically validated.

use crate::error::{RoadsheetError, RoadsheetResult};
use crate::logs::LogExporter;
use crate::sheet::column_letter_to_index;
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Public OSRM demo server; production runs should point at their own instance
pub const DEFAULT_ROUTING_URL: &str = "https://router.project-osrm.org/route/v1/driving";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    pub worksheet_name: String,
    pub columns: ColumnConfig,
    pub drop_folder: PathBuf,
    #[serde(default)]
    pub archive_folder: Option<PathBuf>,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub log: Option<LogConfig>,
    #[serde(default)]
    pub event_log: Option<EventLogConfig>,
    #[serde(default)]
    pub send_mail: Option<MailConfig>,
}

/// Column letters of the four columns the pipeline reads and writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    pub start_destination: String,
    pub coordinate: String,
    pub distance: String,
    pub duration: String,
}

impl ColumnConfig {
    pub fn all(&self) -> [&str; 4] {
        [
            &self.start_destination,
            &self.coordinate,
            &self.distance,
            &self.duration,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingConfig {
    #[serde(default = "default_routing_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: default_routing_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_routing_url() -> String {
    DEFAULT_ROUTING_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    pub folder: PathBuf,
    pub extensions: Vec<String>,
    #[serde(default)]
    pub retention_days: Option<u32>,
    #[serde(default)]
    pub what: LogWhat,
}

/// Which records end up in the log files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogWhat {
    #[serde(default = "default_true")]
    pub system_errors: bool,
    #[serde(default = "default_true")]
    pub all_actions: bool,
    #[serde(default)]
    pub only_action_errors: bool,
}

impl Default for LogWhat {
    fn default() -> Self {
        Self {
            system_errors: true,
            all_actions: true,
            only_action_errors: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLogConfig {
    pub enabled: bool,
    #[serde(default = "default_event_log_name")]
    pub log_name: String,
    #[serde(default = "default_event_source")]
    pub source: String,
    #[serde(default = "default_event_folder")]
    pub folder: PathBuf,
}

fn default_event_log_name() -> String {
    "Scripts".to_string()
}

fn default_event_source() -> String {
    "roadsheet".to_string()
}

fn default_event_folder() -> PathBuf {
    PathBuf::from("events")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailConfig {
    /// Never, Always, OnError or OnErrorOrAction; parsed when the mail step runs
    pub when: String,
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub bcc: Vec<String>,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default = "default_attachment_budget")]
    pub max_attachments_size_mb: f64,
    pub smtp: SmtpConfig,
}

fn default_subject() -> String {
    "Route distance report".to_string()
}

fn default_attachment_budget() -> f64 {
    20.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpConfig {
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub use_tls: bool,
    #[serde(default)]
    pub username: Option<String>,
    /// Name of the environment variable holding the SMTP password
    #[serde(default)]
    pub password_env: Option<String>,
}

fn default_smtp_port() -> u16 {
    25
}

impl RunConfig {
    /// Load, schema-check and validate a config file (.json, .yaml or .yml)
    pub fn load(path: &Path) -> RoadsheetResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .as_deref(),
            Some("yaml") | Some("yml")
        );

        let document: serde_json::Value = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        validate_against_schema(&document)?;

        let config: RunConfig = serde_json::from_value(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic checks the schema cannot express
    pub fn validate(&self) -> RoadsheetResult<()> {
        let mut seen = HashSet::new();
        for column in self.columns.all() {
            column_letter_to_index(column).map_err(|_| {
                RoadsheetError::Validation(format!("Invalid column identifier '{}'", column))
            })?;
            if !seen.insert(column.to_ascii_uppercase()) {
                return Err(RoadsheetError::Validation(format!(
                    "Column '{}' is used for more than one purpose",
                    column
                )));
            }
        }

        if !self.drop_folder.is_dir() {
            return Err(RoadsheetError::Validation(format!(
                "Drop folder '{}' not found",
                self.drop_folder.display()
            )));
        }

        if let Some(log) = &self.log {
            let exporter = LogExporter::default();
            for ext in &log.extensions {
                if !exporter.supports(ext) {
                    return Err(RoadsheetError::Validation(format!(
                        "Unsupported log file extension '{}' (supported: {})",
                        ext,
                        exporter.extensions().join(", ")
                    )));
                }
            }
        }

        if let Some(mail) = &self.send_mail {
            if mail.max_attachments_size_mb < 0.0 {
                return Err(RoadsheetError::Validation(
                    "sendMail.maxAttachmentsSizeMb must not be negative".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn validate_against_schema(document: &serde_json::Value) -> RoadsheetResult<()> {
    let schema_str = include_str!("../schema/config.schema.json");
    let schema_value: serde_json::Value = serde_json::from_str(schema_str)
        .map_err(|e| RoadsheetError::Validation(format!("Failed to parse schema: {}", e)))?;

    let compiled_schema = JSONSchema::compile(&schema_value)
        .map_err(|e| RoadsheetError::Validation(format!("Failed to compile schema: {}", e)))?;

    if let Err(errors) = compiled_schema.validate(document) {
        let error_messages: Vec<String> = errors.map(|e| format!("  - {}", e)).collect();
        return Err(RoadsheetError::Config(format!(
            "Schema validation failed:\n{}",
            error_messages.join("\n")
        )));
    }

    Ok(())
}
