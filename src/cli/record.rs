//! Record command and top-level CLI definition

use crate::config::{RecorderConfig, DEFAULT_CONFIG_FILE};
use crate::downloader::{JobExecutor, RunSummary};
use crate::metrics;
use crate::schedule::load_schedule;
use crate::session::{build_http_client, RadikoSession};
use crate::shutdown::SharedShutdown;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use super::{parse_now, CliError, ResolveArgs, ValidateArgs};

/// Default schedule file name
pub const DEFAULT_SCHEDULE_FILE: &str = "schedule.json";

/// Time-shift radio recorder CLI
#[derive(Parser, Debug)]
#[command(name = "timeshift-recorder")]
#[command(about = "Record the latest broadcast of weekly radio programs from a time-shift service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (created with defaults if missing)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record the most recent broadcast of every schedule entry
    Record(RecordArgs),
    /// Print the occurrence and output path of every entry without recording
    Resolve(ResolveArgs),
    /// Check every schedule entry for a valid weekday and start time
    Validate(ValidateArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

/// Arguments of `record`
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Schedule file (JSON array of entries)
    #[arg(long, short, default_value = DEFAULT_SCHEDULE_FILE)]
    pub file: PathBuf,

    /// Output directory, overriding the config file
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Re-record even if the output file already exists
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// Reference "now" (RFC3339, or naive local JST); defaults to the current time
    #[arg(long)]
    pub now: Option<String>,

    /// Expose Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

impl RecordArgs {
    /// Execute the record command
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<RunSummary, CliError> {
        let mut config = RecorderConfig::load_or_create(&cli.config)?;
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }

        let entries = load_schedule(&self.file)?;
        let now = parse_now(self.now.as_deref())?;

        if let Some(addr) = self.metrics_addr {
            metrics::init_metrics(addr).await?;
        }

        info!(
            entries = entries.len(),
            now = %now,
            output_dir = %config.output_dir.display(),
            "Starting schedule run"
        );

        let client = build_http_client(&config.http_settings())?;
        let mut session = RadikoSession::new(client.clone(), config.session_config());
        let executor = JobExecutor::new(config.executor_settings(self.force), client)
            .with_shutdown(shutdown)
            .with_progress_bars(cli.output_format == OutputFormat::Human);

        let summary = executor.run_schedule(&mut session, &entries, now).await;

        match cli.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string(&summary)?),
            OutputFormat::Human => output_human(&summary),
        }

        if summary.has_failures() {
            return Err(CliError::JobsFailed {
                failed: summary.failed,
                interrupted: summary.interrupted,
            });
        }
        Ok(summary)
    }
}

fn output_human(summary: &RunSummary) {
    println!("\nSchedule run finished");
    println!("Recorded: {}", summary.completed);
    println!("Skipped:  {}", summary.skipped);
    println!("Failed:   {}", summary.failed);
    if summary.interrupted {
        println!("Run was interrupted before all entries were processed");
    }
}
