//! Segment assembly
//!
//! Concatenates staged segments byte for byte, in the given order, into a
//! newly created output file. No container framing is added: ADTS AAC
//! segments concatenate into a playable stream as-is.

use super::{OutputError, OutputResult};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::Path;
use tracing::debug;

/// Concatenate `inputs` into `output` and return the number of bytes written.
///
/// The output must not already exist. Assembly stops at the first failing
/// input and leaves any partial output in place for the caller to remove.
pub fn assemble<P: AsRef<Path>>(inputs: &[P], output: &Path) -> OutputResult<u64> {
    if inputs.is_empty() {
        return Err(OutputError::NoSegments);
    }

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(output)
        .map_err(|source| OutputError::CreateOutput {
            path: output.to_path_buf(),
            source,
        })?;
    let mut writer = BufWriter::new(file);

    let mut total: u64 = 0;
    for input in inputs {
        let input = input.as_ref();
        let mut segment = File::open(input).map_err(|source| OutputError::OpenSegment {
            path: input.to_path_buf(),
            source,
        })?;
        total += io::copy(&mut segment, &mut writer).map_err(|source| OutputError::Copy {
            path: input.to_path_buf(),
            source,
        })?;
    }

    let file = writer.into_inner().map_err(|e| OutputError::Io {
        path: output.to_path_buf(),
        source: e.into_error(),
    })?;
    file.sync_all().map_err(|source| OutputError::Io {
        path: output.to_path_buf(),
        source,
    })?;

    debug!(
        output = %output.display(),
        segments = inputs.len(),
        bytes = total,
        "Assembled recording"
    );
    Ok(total)
}
