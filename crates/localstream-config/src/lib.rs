//! Configuration for the localstream native messaging host.
//!
//! The host is launched by a browser, which controls its argument vector and
//! working directory, so every setting can also come from the environment or
//! from a TOML file named by `--config-path`. Values resolve in the order
//! command-line flag, environment variable, configuration file, built-in
//! default.
//!
//! Browsers append their own launch arguments: Chromium passes the caller's
//! origin as a positional argument (plus `--parent-window` on Windows) and
//! Firefox passes the manifest path and extension id. These are accepted and
//! recorded so the host never refuses to start because of them.

mod defaults;
mod file;
mod logging;

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches, Parser};
use thiserror::Error;

pub use defaults::{
    DEFAULT_DATABASE_FILE_NAME, DEFAULT_LOG_FILE_NAME, DEFAULT_LOG_FILTER,
    DEFAULT_MAX_FRAME_BYTES, DEFAULT_MAX_RESPONSE_BYTES, default_database_path,
    default_forward_dir, default_log_filter, default_log_format, default_log_path,
};
pub use logging::{LogFormat, LogFormatParseError, LogTarget};

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command-line parsing failed, or help/version output was requested.
    #[error("{0}")]
    Cli(#[source] clap::Error),
    /// A setting parsed but holds an unusable value.
    #[error("invalid value for {field}: {message}")]
    Invalid {
        /// Name of the offending setting.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },
    /// The configuration file could not be read.
    #[error("failed to read configuration file {}: {source}", path.display())]
    File {
        /// File named by `--config-path`.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The configuration file is not valid TOML for this host.
    #[error("invalid configuration file {}: {source}", path.display())]
    Parse {
        /// File named by `--config-path`.
        path: PathBuf,
        /// Parser diagnostic.
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Returns true when the "error" is a help or version request.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        match self {
            Self::Cli(error) => matches!(
                error.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ),
            Self::Invalid { .. } | Self::File { .. } | Self::Parse { .. } => false,
        }
    }

    /// Writes the error the way clap formats it: help and version output go
    /// to stdout, genuine failures to stderr.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while writing.
    pub fn print(&self) -> io::Result<()> {
        match self {
            Self::Cli(error) => error.print(),
            Self::Invalid { .. } | Self::File { .. } | Self::Parse { .. } => {
                writeln!(io::stderr(), "error: {self}")
            }
        }
    }

    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

impl From<clap::Error> for ConfigError {
    fn from(error: clap::Error) -> Self {
        Self::Cli(error)
    }
}

/// Resolved host configuration.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "localstream-host",
    version,
    about = "Native messaging host that persists intercepted timeline records"
)]
pub struct Config {
    /// TOML file supplying settings not given as flags or environment
    /// variables.
    #[arg(long, env = "LOCALSTREAM_CONFIG_PATH", value_name = "PATH")]
    pub config_path: Option<PathBuf>,

    /// Path of the record store.
    #[arg(long, env = "LOCALSTREAM_DATABASE", value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Directory receiving `forward_to_native` dumps.
    #[arg(long, env = "LOCALSTREAM_FORWARD_DIR", value_name = "DIR")]
    pub forward_dir: Option<PathBuf>,

    /// Debug log file; `-` writes to stderr.
    #[arg(long, env = "LOCALSTREAM_LOG_FILE", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log filter expression.
    #[arg(long, env = "LOCALSTREAM_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,

    /// Log line format.
    #[arg(long, env = "LOCALSTREAM_LOG_FORMAT", default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// Largest accepted inbound payload in bytes.
    #[arg(
        long,
        env = "LOCALSTREAM_MAX_FRAME_BYTES",
        default_value_t = DEFAULT_MAX_FRAME_BYTES
    )]
    pub max_frame_bytes: usize,

    /// Largest outbound payload in bytes.
    #[arg(
        long,
        env = "LOCALSTREAM_MAX_RESPONSE_BYTES",
        default_value_t = DEFAULT_MAX_RESPONSE_BYTES
    )]
    pub max_response_bytes: usize,

    /// Launch arguments appended by the browser (caller origin, or manifest
    /// path and extension id).
    #[arg(value_name = "CALLER")]
    pub caller: Vec<String>,

    /// Native window handle passed by Chromium on Windows.
    #[arg(long, hide = true, value_name = "HANDLE")]
    pub parent_window: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: None,
            database: None,
            forward_dir: None,
            log_file: None,
            log_filter: default_log_filter().to_owned(),
            log_format: default_log_format(),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            caller: Vec::new(),
            parent_window: None,
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument vector (the first item
    /// is the program name), the process environment and the configuration
    /// file, if one is named.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing, reading the file or validation
    /// fails.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        let mut config = Self::from_arg_matches(&matches)?;
        if let Some(path) = config.config_path.clone() {
            file::FileConfig::read(&path)?.apply(&mut config, &matches);
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks that the frame limits can be expressed on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a limit is zero or exceeds the
    /// 32-bit length prefix.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_frame_limit("max_frame_bytes", self.max_frame_bytes)?;
        check_frame_limit("max_response_bytes", self.max_response_bytes)
    }

    /// Location of the record store.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(default_database_path)
    }

    /// Directory receiving `forward_to_native` dumps.
    #[must_use]
    pub fn forward_dir(&self) -> PathBuf {
        self.forward_dir.clone().unwrap_or_else(default_forward_dir)
    }

    /// Destination of the debug log.
    #[must_use]
    pub fn log_target(&self) -> LogTarget {
        match self.log_file.as_deref() {
            Some(path) => LogTarget::from_setting(path),
            None => LogTarget::File(default_log_path()),
        }
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log line format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// First launch argument supplied by the browser, when present.
    #[must_use]
    pub fn caller_origin(&self) -> Option<&str> {
        self.caller.first().map(String::as_str)
    }
}

fn check_frame_limit(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::invalid(field, "must be greater than zero"));
    }
    if u32::try_from(value).is_err() {
        return Err(ConfigError::invalid(
            field,
            format!("{value} exceeds the 32-bit length prefix"),
        ));
    }
    Ok(())
}
