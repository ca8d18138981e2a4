//! CLI command handlers

pub mod commands;

pub use commands::{check_config, run};
