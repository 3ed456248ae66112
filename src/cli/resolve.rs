//! Resolve command: show what `record` would fetch
//!
//! Only the program guide is fetched, and only with `--titles`.

use crate::config::RecorderConfig;
use crate::downloader::plan_job;
use crate::schedule::{load_schedule, ScheduleEntry};
use crate::session::program_guide::ProgramGuide;
use crate::session::{build_http_client, RadikoSession};
use chrono::{DateTime, FixedOffset};
use clap::Args;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

use super::record::DEFAULT_SCHEDULE_FILE;
use super::{parse_now, Cli, CliError, OutputFormat};

/// Arguments of `resolve`
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Schedule file (JSON array of entries)
    #[arg(long, short, default_value = DEFAULT_SCHEDULE_FILE)]
    pub file: PathBuf,

    /// Reference "now" (RFC3339, or naive local JST); defaults to the current time
    #[arg(long)]
    pub now: Option<String>,

    /// Look up each program's title in the station's weekly guide
    #[arg(long, default_value_t = false)]
    pub titles: bool,
}

impl ResolveArgs {
    /// Execute the resolve command
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let config = RecorderConfig::load_or_create(&cli.config)?;
        let settings = config.executor_settings(false);
        let entries = load_schedule(&self.file)?;
        let now = parse_now(self.now.as_deref())?;

        let guides = if self.titles {
            let client = build_http_client(&config.http_settings())?;
            let session = RadikoSession::new(client, config.session_config());
            fetch_guides(&session, &entries).await
        } else {
            HashMap::new()
        };

        let mut rows = Vec::with_capacity(entries.len());
        let mut invalid = 0;

        for entry in &entries {
            match plan_job(&settings, entry, &now) {
                Ok(job) => {
                    let title = guides
                        .get(&job.entry.station_id)
                        .and_then(|guide| guide_title(guide, &job.entry, &job.occurrence));
                    if cli.output_format == OutputFormat::Human {
                        println!(
                            "{} [{}] {} -> {}{}",
                            job.entry.program_name,
                            job.entry.station_id,
                            job.occurrence.to_rfc3339(),
                            job.output_path.display(),
                            title.as_deref().map(|t| format!(" (guide: {t})")).unwrap_or_default()
                        );
                    }
                    rows.push(json!({
                        "program_name": job.entry.program_name,
                        "station_id": job.entry.station_id,
                        "occurrence": job.occurrence.to_rfc3339(),
                        "output_path": job.output_path.display().to_string(),
                        "exists": job.output_path.exists(),
                        "guide_title": title,
                    }));
                }
                Err(e) => {
                    invalid += 1;
                    if cli.output_format == OutputFormat::Human {
                        eprintln!("{e}");
                    }
                    rows.push(json!({
                        "program_name": entry.program_name,
                        "station_id": entry.station_id,
                        "error": e.source.to_string(),
                    }));
                }
            }
        }

        if cli.output_format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }

        if invalid > 0 {
            return Err(CliError::InvalidEntries(invalid));
        }
        Ok(())
    }
}

/// Fetch the weekly guide of every distinct station; failures are logged.
async fn fetch_guides(session: &RadikoSession, entries: &[ScheduleEntry]) -> HashMap<String, ProgramGuide> {
    let mut guides = HashMap::new();
    for entry in entries {
        if guides.contains_key(&entry.station_id) {
            continue;
        }
        match session.fetch_program_guide(&entry.station_id).await {
            Ok(guide) => {
                guides.insert(entry.station_id.clone(), guide);
            }
            Err(e) => warn!(station = %entry.station_id, error = %e, "Failed to fetch program guide"),
        }
    }
    guides
}

/// Title of the program starting at the occurrence, per the station's guide.
fn guide_title(
    guide: &ProgramGuide,
    entry: &ScheduleEntry,
    occurrence: &DateTime<FixedOffset>,
) -> Option<String> {
    let hhmm = occurrence.format("%H%M").to_string();
    guide
        .find_program_title(&hhmm, &entry.day_of_week)
        .map(str::to_string)
        .ok()
}
