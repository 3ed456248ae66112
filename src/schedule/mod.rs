//! Weekly schedule entries and the schedule file loader
//!
//! A schedule file is a JSON array of entries:
//!
//! ```json
//! [
//!   {
//!     "program_name": "Late Night Talk",
//!     "day_of_week": "火",
//!     "start_time": "010000",
//!     "station_id": "TBS"
//!   }
//! ]
//! ```
//!
//! Entries are validated lazily: a malformed weekday or start time only
//! surfaces when the entry is resolved, so one bad entry never prevents the
//! rest of the schedule from loading.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod recurrence;

pub use recurrence::{reference_offset, resolve, REFERENCE_UTC_OFFSET_SECS};

/// Schedule errors
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// Day-of-week symbol does not name a weekday
    #[error("invalid day of week: {0}")]
    InvalidDayOfWeek(String),

    /// Start time is not a valid HHMMSS clock value
    #[error("invalid start time format '{0}': expected HHMMSS")]
    InvalidStartTime(String),

    /// Schedule file could not be read
    #[error("error reading schedule file '{}': {source}", path.display())]
    Io {
        /// Schedule file path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Schedule file is not a JSON array of entries
    #[error("error parsing JSON from '{}': {source}", path.display())]
    Parse {
        /// Schedule file path
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },
}

impl ScheduleError {
    /// Whether the error concerns a single entry rather than the whole file.
    pub fn is_entry_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDayOfWeek(_) | Self::InvalidStartTime(_)
        )
    }
}

/// One weekly-recurring program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Program name (used for logging and the output file name)
    pub program_name: String,
    /// Day-of-week symbol (e.g. "火", "Tue", "tuesday")
    pub day_of_week: String,
    /// Start time as HHMMSS in the reference timezone
    pub start_time: String,
    /// Station identifier understood by the streaming API
    pub station_id: String,
}

impl ScheduleEntry {
    /// Create a new schedule entry
    pub fn new(
        program_name: impl Into<String>,
        day_of_week: impl Into<String>,
        start_time: impl Into<String>,
        station_id: impl Into<String>,
    ) -> Self {
        Self {
            program_name: program_name.into(),
            day_of_week: day_of_week.into(),
            start_time: start_time.into(),
            station_id: station_id.into(),
        }
    }

    /// Weekday this program airs on
    pub fn weekday(&self) -> Result<Weekday, ScheduleError> {
        parse_day_of_week(&self.day_of_week)
    }

    /// Civil start time of the program
    pub fn start_time(&self) -> Result<NaiveTime, ScheduleError> {
        parse_start_time(&self.start_time)
    }

    /// Validate weekday and start time
    pub fn validate(&self) -> Result<(), ScheduleError> {
        self.weekday()?;
        self.start_time()?;
        Ok(())
    }
}

/// Map a day-of-week symbol to a [`Weekday`].
///
/// Accepts the single-character Japanese names (`日月火水木金土`) as well as
/// English three-letter and full names, case-insensitively.
pub fn parse_day_of_week(symbol: &str) -> Result<Weekday, ScheduleError> {
    let trimmed = symbol.trim();
    let weekday = match trimmed {
        "日" => Some(Weekday::Sun),
        "月" => Some(Weekday::Mon),
        "火" => Some(Weekday::Tue),
        "水" => Some(Weekday::Wed),
        "木" => Some(Weekday::Thu),
        "金" => Some(Weekday::Fri),
        "土" => Some(Weekday::Sat),
        _ => match trimmed.to_lowercase().as_str() {
            "sun" | "sunday" => Some(Weekday::Sun),
            "mon" | "monday" => Some(Weekday::Mon),
            "tue" | "tuesday" => Some(Weekday::Tue),
            "wed" | "wednesday" => Some(Weekday::Wed),
            "thu" | "thursday" => Some(Weekday::Thu),
            "fri" | "friday" => Some(Weekday::Fri),
            "sat" | "saturday" => Some(Weekday::Sat),
            _ => None,
        },
    };

    weekday.ok_or_else(|| ScheduleError::InvalidDayOfWeek(symbol.to_string()))
}

/// Parse a 24-hour `HHMMSS` start time.
pub fn parse_start_time(value: &str) -> Result<NaiveTime, ScheduleError> {
    let invalid = || ScheduleError::InvalidStartTime(value.to_string());

    if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let field = |range: std::ops::Range<usize>| value[range].parse::<u32>().map_err(|_| invalid());
    let (hour, minute, second) = (field(0..2)?, field(2..4)?, field(4..6)?);

    NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(invalid)
}

/// Read and parse the schedule file at `path`.
pub fn load_schedule(path: impl AsRef<Path>) -> Result<Vec<ScheduleEntry>, ScheduleError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ScheduleError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| ScheduleError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
