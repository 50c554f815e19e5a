use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Destination for the host's debug log.
///
/// Standard output is never a valid destination: it carries the framed
/// protocol, so a stray log line would corrupt the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Append to the file at the given path, creating it when absent.
    File(PathBuf),
    /// Write to the process's standard error stream.
    Stderr,
}

impl LogTarget {
    /// Interprets a configured log destination; `-` selects stderr.
    #[must_use]
    pub fn from_setting(value: &Path) -> Self {
        if value.as_os_str() == "-" {
            Self::Stderr
        } else {
            Self::File(value.to_path_buf())
        }
    }
}

impl fmt::Display for LogTarget {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(formatter, "{}", path.display()),
            Self::Stderr => formatter.write_str("stderr"),
        }
    }
}
