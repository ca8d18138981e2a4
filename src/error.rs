use thiserror::Error;

pub type RoadsheetResult<T> = Result<T, RoadsheetError>;

#[derive(Error, Debug)]
pub enum RoadsheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Worksheet '{0}' not found")]
    WorksheetNotFound(String),

    #[error("Invalid cell address: {0}")]
    Address(String),
}

/// Failure of a single routing request; always scoped to one pair.
#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("routing service returned code '{code}': {message}")]
    Service { code: String, message: String },

    #[error("routing service returned no route")]
    NoRoute,

    #[error("Invalid coordinate '{0}'")]
    Coordinate(String),
}

#[derive(Error, Debug)]
pub enum LogExportError {
    #[error("Unknown log file extension '{0}'")]
    UnknownFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Excel error: {0}")]
    Excel(String),
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Invalid sendMail.when value '{0}' (expected Never, Always, OnError or OnErrorOrAction)")]
    UnknownTrigger(String),

    #[error("Mail contract violated: {0}")]
    Contract(String),

    #[error("Failed to send mail: {0}")]
    Transport(String),
}

impl From<calamine::XlsxError> for RoadsheetError {
    fn from(e: calamine::XlsxError) -> Self {
        RoadsheetError::Workbook(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for RoadsheetError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        RoadsheetError::Workbook(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for LogExportError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        LogExportError::Excel(e.to_string())
    }
}

impl From<calamine::XlsxError> for LogExportError {
    fn from(e: calamine::XlsxError) -> Self {
        LogExportError::Excel(e.to_string())
    }
}
