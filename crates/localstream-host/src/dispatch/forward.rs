//! Side-channel dumps for `forward_to_native`.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::macros::format_description;

const FILE_PREFIX: &str = "forwarded_data_";
const MAX_SUFFIX: u32 = 1000;

/// Writes each forwarded message to its own timestamp-named file.
///
/// Files are created with `create_new`, so an existing dump is never
/// overwritten; a clash within the same millisecond gets a `-<n>` suffix.
#[derive(Debug, Clone)]
pub struct ForwardSink {
    dir: PathBuf,
}

impl ForwardSink {
    /// Creates a sink writing into `dir`, which must already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory receiving the dumps.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Dumps `message` stamped with the current UTC time.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if no file could be created or written.
    pub fn write(&self, message: &Map<String, Value>) -> io::Result<PathBuf> {
        self.write_at(message, OffsetDateTime::now_utc())
    }

    /// Dumps `message` under a name derived from `at`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if no file could be created or written.
    pub fn write_at(&self, message: &Map<String, Value>, at: OffsetDateTime) -> io::Result<PathBuf> {
        let stem = format!("{FILE_PREFIX}{}", file_stamp(at)?);
        let (path, file) = self.create_unique(&stem)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, message)?;
        writer.flush()?;
        Ok(path)
    }

    fn create_unique(&self, stem: &str) -> io::Result<(PathBuf, File)> {
        for attempt in 0..=MAX_SUFFIX {
            let name = if attempt == 0 {
                format!("{stem}.json")
            } else {
                format!("{stem}-{attempt}.json")
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {}
                Err(error) => return Err(error),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free file name for '{stem}'"),
        ))
    }
}

/// `YYYYMMDD_HHMMSS_mmm`
fn file_stamp(at: OffsetDateTime) -> io::Result<String> {
    at.format(format_description!(
        "[year][month][day]_[hour][minute][second]_[subsecond digits:3]"
    ))
    .map_err(io::Error::other)
}
