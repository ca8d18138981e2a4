use clap::{Parser, Subcommand};
use roadsheet::cli;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "roadsheet")]
#[command(about = "Fill spreadsheet distance and duration cells from a routing service")]
#[command(long_about = "Roadsheet - route distances for dropped workbooks

Every .xlsx workbook in the drop folder is scanned for rows marked S (start)
and D (destination). Each start/destination pair is sent to a routing
service and the driving distance (km) and duration (minutes) are written
back into the destination row. Processed workbooks are moved to the archive
folder.

COMMANDS:
  run           - Process the drop folder once
  check-config  - Validate a configuration file

EXAMPLES:
  roadsheet run --config roadsheet.yaml
  roadsheet run --config roadsheet.yaml --dry-run
  roadsheet check-config --config roadsheet.json

Logging: set RUST_LOG (default roadsheet=info).")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Process every workbook in the drop folder once.

Per-file action logs and the system error log are written to the log folder,
old logs are pruned, a report mail is sent when the trigger matches and the
run's events are flushed to the event journal.

Exit code is 1 when any system error occurred, otherwise 0. Errors on single
pairs are reported in the logs and do not change the exit code.

Use --dry-run to resolve routes without saving, archiving or mailing.")]
    /// Process the drop folder once
    Run {
        /// Path to the configuration file (.json, .yaml or .yml)
        #[arg(short, long, env = "ROADSHEET_CONFIG")]
        config: PathBuf,

        /// Resolve routes without writing workbooks, archiving or sending mail
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Validate a configuration file without running
    CheckConfig {
        /// Path to the configuration file (.json, .yaml or .yml)
        #[arg(short, long, env = "ROADSHEET_CONFIG")]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roadsheet=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, dry_run } => {
            let code = cli::run(config, dry_run)?;
            Ok(if code == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::CheckConfig { config } => {
            cli::check_config(config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
