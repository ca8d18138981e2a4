//! Roadsheet - route distances for spreadsheet batches
//!
//! This library scans workbooks dropped into a folder for start/destination
//! marked rows, resolves each pair through a routing service and writes the
//! driving distance and duration back into the sheet.
//!
//! # Features
//!
//! - Start/destination pair extraction from marked rows
//! - OSRM-compatible routing client
//! - Per-file action logs in CSV, JSON, text or Excel format
//! - Log retention, HTML report mail and an event journal
//! - JSON Schema validated configuration (JSON or YAML)
//!
//! # Example
//!
//! ```no_run
//! use roadsheet::config::RunConfig;
//! use roadsheet::processor::ProcessOptions;
//! use roadsheet::routing::OsrmClient;
//! use roadsheet::run::{run, Services};
//! use std::path::Path;
//!
//! let config = RunConfig::load(Path::new("roadsheet.yaml"))?;
//! let router = OsrmClient::new(&config.routing)?;
//!
//! let report = run(
//!     &config,
//!     Services { router: &router, mailer: None, event_log: None },
//!     ProcessOptions::default(),
//! );
//! println!("Files: {}", report.results.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod extract;
pub mod logs;
pub mod notify;
pub mod processor;
pub mod retention;
pub mod routing;
pub mod run;
pub mod sheet;
pub mod types;
pub mod updater;

// Re-export commonly used types
pub use error::{RoadsheetError, RoadsheetResult};
pub use types::{CoordinatePair, FileResult, RouteSummary, SystemError};
