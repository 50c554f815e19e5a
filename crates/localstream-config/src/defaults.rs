use std::env;
use std::path::PathBuf;

/// File name of the record store.
pub const DEFAULT_DATABASE_FILE_NAME: &str = "tweets.db";

/// File name of the debug log, relative to the working directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "localstream-host.log";

/// Default log filter expression used by the host.
///
/// The debug log exists to reconstruct what the parent sent and what the
/// host replied, so per-message events are on unless the filter says
/// otherwise.
pub const DEFAULT_LOG_FILTER: &str = "debug";

/// Largest inbound payload accepted from the parent, in bytes.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// Largest outbound payload sent to the parent, in bytes.
///
/// Browsers refuse host messages above 1 MiB.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Default log filter expression used by the host.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the host.
#[must_use]
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default log destination.
#[must_use]
pub fn default_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE_NAME)
}

/// Computes the default store location: next to the running executable.
///
/// Browsers launch hosts with an arbitrary working directory, so the store
/// follows the binary rather than the caller. When the executable path
/// cannot be resolved the store falls back to the working directory.
#[must_use]
pub fn default_database_path() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_DATABASE_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE_NAME))
}

/// Default directory for `forward_to_native` dumps: the working directory.
#[must_use]
pub fn default_forward_dir() -> PathBuf {
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_defaults_to_store_file_name() {
        let path = default_database_path();
        assert_eq!(
            path.file_name().and_then(|name| name.to_str()),
            Some(DEFAULT_DATABASE_FILE_NAME)
        );
    }

    #[test]
    fn response_limit_fits_inside_frame_limit() {
        assert!(DEFAULT_MAX_RESPONSE_BYTES <= DEFAULT_MAX_FRAME_BYTES);
        assert!(u32::try_from(DEFAULT_MAX_FRAME_BYTES).is_ok());
    }
}
