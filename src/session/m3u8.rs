//! Minimal M3U8 reader
//!
//! Only URI lines matter here: every non-blank line that is not a tag or
//! comment is a media (or variant) URI, and relative URIs are resolved
//! against the playlist's own URL. Line order is preserved.

use url::Url;

/// Playlist parse errors
#[derive(Debug, thiserror::Error)]
pub enum M3u8Error {
    /// Body does not start with `#EXTM3U`
    #[error("missing #EXTM3U header")]
    MissingHeader,

    /// A URI line could not be resolved
    #[error("invalid URI '{line}': {source}")]
    InvalidUri {
        /// Offending line
        line: String,
        /// Parse failure
        source: url::ParseError,
    },
}

/// Extract the URI lines of an M3U8 body, in order.
pub fn parse_uris(body: &str, base: &Url) -> Result<Vec<String>, M3u8Error> {
    let mut lines = body
        .lines()
        .map(|line| line.trim().trim_start_matches('\u{feff}'))
        .filter(|line| !line.is_empty());

    match lines.next() {
        Some(first) if first.starts_with("#EXTM3U") => {}
        _ => return Err(M3u8Error::MissingHeader),
    }

    lines
        .filter(|line| !line.starts_with('#'))
        .map(|line| {
            base.join(line)
                .map(String::from)
                .map_err(|source| M3u8Error::InvalidUri {
                    line: line.to_string(),
                    source,
                })
        })
        .collect()
}
