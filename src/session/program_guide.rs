//! Weekly program guide XML
//!
//! The guide lists, per station, the programs of the surrounding week. Each
//! `<prog>` carries its start (`ft`) and end (`to`) as `YYYYMMDDHHMMSS` in the
//! reference timezone. The end time is what the time-shift playlist endpoint
//! needs; the title is used for diagnostics.
//!
//! ```xml
//! <radiko>
//!   <stations>
//!     <station id="TBS">
//!       <name>TBS RADIO</name>
//!       <progs>
//!         <date>20240115</date>
//!         <prog ft="20240115180000" to="20240115210000" ftl="1800" tol="2100" dur="10800">
//!           <title>Evening Show</title>
//!         </prog>
//!       </progs>
//!     </station>
//!   </stations>
//! </radiko>
//! ```

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, TimeZone, Weekday};
use serde::Deserialize;

use crate::schedule::{parse_day_of_week, reference_offset};

/// Timestamp layout used by the guide and the playlist endpoint
pub const GUIDE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Program guide errors
#[derive(Debug, thiserror::Error)]
pub enum GuideError {
    /// XML could not be deserialized
    #[error("failed to parse program guide: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// No program matched the lookup
    #[error("program not found: {0}")]
    ProgramNotFound(String),
}

/// Root `<radiko>` element
#[derive(Debug, Clone, Deserialize)]
pub struct ProgramGuide {
    /// Stations in the guide
    pub stations: Stations,
}

/// `<stations>` element
#[derive(Debug, Clone, Deserialize)]
pub struct Stations {
    /// Station list
    #[serde(rename = "station", default)]
    pub station: Vec<Station>,
}

/// `<station>` element
#[derive(Debug, Clone, Deserialize)]
pub struct Station {
    /// Station identifier
    #[serde(rename = "@id")]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// One `<progs>` block per broadcast day
    #[serde(rename = "progs", default)]
    pub progs: Vec<Progs>,
}

/// `<progs>` element
#[derive(Debug, Clone, Deserialize)]
pub struct Progs {
    /// Broadcast day (YYYYMMDD)
    #[serde(default)]
    pub date: Option<String>,
    /// Programs of that day
    #[serde(rename = "prog", default)]
    pub prog: Vec<Program>,
}

/// `<prog>` element
#[derive(Debug, Clone, Deserialize)]
pub struct Program {
    /// Start time (YYYYMMDDHHMMSS)
    #[serde(rename = "@ft")]
    pub ft: String,
    /// End time (YYYYMMDDHHMMSS)
    #[serde(rename = "@to")]
    pub to: String,
    /// Duration in seconds
    #[serde(rename = "@dur", default)]
    pub dur: Option<String>,
    /// Program title
    #[serde(default)]
    pub title: String,
    /// Performers
    #[serde(default)]
    pub pfm: Option<String>,
}

impl Program {
    /// Start instant in the reference timezone, if `ft` is well-formed
    pub fn start(&self) -> Option<DateTime<FixedOffset>> {
        parse_guide_timestamp(&self.ft)
    }

    /// End instant in the reference timezone, if `to` is well-formed
    pub fn end(&self) -> Option<DateTime<FixedOffset>> {
        parse_guide_timestamp(&self.to)
    }
}

/// Parse a `YYYYMMDDHHMMSS` guide timestamp in the reference timezone.
pub fn parse_guide_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(value, GUIDE_TIMESTAMP_FORMAT).ok()?;
    reference_offset().from_local_datetime(&naive).single()
}

/// Format an instant as a `YYYYMMDDHHMMSS` guide timestamp.
pub fn format_guide_timestamp<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    instant
        .with_timezone(&reference_offset())
        .format(GUIDE_TIMESTAMP_FORMAT)
        .to_string()
}

impl ProgramGuide {
    /// Parse guide XML
    pub fn parse(xml: &str) -> Result<Self, GuideError> {
        Ok(quick_xml::de::from_str(xml)?)
    }

    /// All programs of a station, in document order
    pub fn station_programs<'a>(&'a self, station_id: &str) -> impl Iterator<Item = &'a Program> + 'a {
        let station_id = station_id.to_owned();
        self.stations
            .station
            .iter()
            .filter(move |station| station.id == station_id)
            .flat_map(|station| station.progs.iter())
            .flat_map(|progs| progs.prog.iter())
    }

    /// Program of `station_id` starting exactly at `start`
    pub fn find_by_start(
        &self,
        station_id: &str,
        start: &DateTime<FixedOffset>,
    ) -> Option<&Program> {
        let ft = format_guide_timestamp(start);
        self.station_programs(station_id).find(|prog| prog.ft == ft)
    }

    /// Title of the first program starting at `hhmm` on `day_of_week`.
    ///
    /// Programs with malformed start times are skipped.
    pub fn find_program_title(&self, hhmm: &str, day_of_week: &str) -> Result<&str, GuideError> {
        let not_found = || GuideError::ProgramNotFound(format!("time {hhmm} on {day_of_week}"));
        let weekday: Weekday = parse_day_of_week(day_of_week).map_err(|_| not_found())?;

        self.stations
            .station
            .iter()
            .flat_map(|station| station.progs.iter())
            .flat_map(|progs| progs.prog.iter())
            .find(|prog| {
                prog.start().is_some_and(|start| {
                    start.format("%H%M").to_string() == hhmm && start.weekday() == weekday
                })
            })
            .map(|prog| prog.title.as_str())
            .ok_or_else(not_found)
    }
}
