//! TOML configuration file layer.
//!
//! File values sit between the environment and the built-in defaults: a key
//! applies only when neither a flag nor an environment variable set it.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ArgMatches;
use clap::parser::ValueSource;
use serde::Deserialize;

use crate::{Config, ConfigError, LogFormat};

/// Settings read from a configuration file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    database: Option<PathBuf>,
    forward_dir: Option<PathBuf>,
    log_file: Option<PathBuf>,
    log_filter: Option<String>,
    log_format: Option<LogFormat>,
    max_frame_bytes: Option<usize>,
    max_response_bytes: Option<usize>,
}

impl FileConfig {
    /// Reads and parses `path`. Relative paths inside the file resolve
    /// against the file's own directory, since the browser picks the
    /// working directory.
    pub(crate) fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(parsed.anchored(base))
    }

    /// Copies file values into every setting still at its default.
    pub(crate) fn apply(self, config: &mut Config, matches: &ArgMatches) {
        let unset = |id: &str| {
            matches!(
                matches.value_source(id),
                None | Some(ValueSource::DefaultValue)
            )
        };
        fill(&mut config.database, self.database.map(Some), unset("database"));
        fill(
            &mut config.forward_dir,
            self.forward_dir.map(Some),
            unset("forward_dir"),
        );
        fill(&mut config.log_file, self.log_file.map(Some), unset("log_file"));
        fill(&mut config.log_filter, self.log_filter, unset("log_filter"));
        fill(&mut config.log_format, self.log_format, unset("log_format"));
        fill(
            &mut config.max_frame_bytes,
            self.max_frame_bytes,
            unset("max_frame_bytes"),
        );
        fill(
            &mut config.max_response_bytes,
            self.max_response_bytes,
            unset("max_response_bytes"),
        );
    }

    fn anchored(self, base: &Path) -> Self {
        let anchor = |path: PathBuf| {
            if path.is_relative() && path.as_os_str() != "-" {
                base.join(path)
            } else {
                path
            }
        };
        Self {
            database: self.database.map(anchor),
            forward_dir: self.forward_dir.map(anchor),
            log_file: self.log_file.map(anchor),
            ..self
        }
    }
}

fn fill<T>(slot: &mut T, value: Option<T>, unset: bool) {
    if let (true, Some(value)) = (unset, value) {
        *slot = value;
    }
}
