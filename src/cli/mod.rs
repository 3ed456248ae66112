//! CLI command implementations

pub mod error;
pub mod record;
pub mod resolve;
pub mod validate;

pub use error::CliError;
pub use record::{Cli, Commands, OutputFormat, RecordArgs};
pub use resolve::ResolveArgs;
pub use validate::ValidateArgs;

use crate::schedule::reference_offset;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Parse a `--now` override.
///
/// Accepts RFC3339 with an explicit offset ("2026-01-13T10:00:00+09:00",
/// "2026-01-13T01:00:00Z") or a naive "YYYY-MM-DDTHH:MM:SS", which is taken
/// as reference (JST) local time. `None` means the current time.
pub fn parse_now(input: Option<&str>) -> Result<DateTime<FixedOffset>, CliError> {
    let Some(input) = input.map(str::trim) else {
        return Ok(Utc::now().with_timezone(&reference_offset()));
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt);
    }

    NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .and_then(|naive| reference_offset().from_local_datetime(&naive).single())
        .ok_or_else(|| CliError::InvalidArgument(format!("Invalid --now value: {input}")))
}
