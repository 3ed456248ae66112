//! Validate command: check a schedule file without contacting the service

use crate::schedule::load_schedule;
use clap::Args;
use serde_json::json;
use std::path::PathBuf;

use super::record::DEFAULT_SCHEDULE_FILE;
use super::{Cli, CliError, OutputFormat};

/// Arguments of `validate`
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schedule file (JSON array of entries)
    #[arg(long, short, default_value = DEFAULT_SCHEDULE_FILE)]
    pub file: PathBuf,
}

impl ValidateArgs {
    /// Execute the validation command
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let entries = load_schedule(&self.file)?;

        let mut results = Vec::with_capacity(entries.len());
        let mut invalid_count = 0;

        for entry in &entries {
            let error = entry.validate().err().map(|e| e.to_string());
            if error.is_some() {
                invalid_count += 1;
            }
            results.push(json!({
                "program_name": entry.program_name,
                "day_of_week": entry.day_of_week,
                "start_time": entry.start_time,
                "station_id": entry.station_id,
                "valid": error.is_none(),
                "error": error,
            }));
        }

        match cli.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
            OutputFormat::Human => {
                println!("Schedule: {} ({} entries)", self.file.display(), entries.len());
                for (entry, result) in entries.iter().zip(&results) {
                    match result["error"].as_str() {
                        None => println!(
                            "  - {} [{}] {} {} (valid)",
                            entry.program_name, entry.station_id, entry.day_of_week, entry.start_time
                        ),
                        Some(e) => println!("  - {} [{}] ({e})", entry.program_name, entry.station_id),
                    }
                }
                println!("\nSummary:");
                println!("  Valid entries: {}", entries.len() - invalid_count);
                if invalid_count > 0 {
                    println!("  Invalid entries: {invalid_count}");
                }
            }
        }

        if invalid_count > 0 {
            return Err(CliError::InvalidEntries(invalid_count));
        }
        Ok(())
    }
}
