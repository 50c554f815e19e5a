//! Host bootstrap orchestration.

use std::io::{Read, Write};
use std::sync::Arc;

use thiserror::Error;

use localstream_config::{Config, ConfigError};

use crate::dispatch::{Dispatcher, ForwardSink};
use crate::health::HealthReporter;
use crate::session::{Session, Termination};
use crate::store::{SqliteStore, StoreError};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::FramedChannel;

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the host configuration.
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load()
    }
}

/// Loader that hands out a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config` so every load returns a copy of it.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        #[source]
        source: TelemetryError,
    },
    /// The record store could not be opened.
    #[error("failed to open record store: {source}")]
    Store {
        #[source]
        source: StoreError,
    },
}

impl BootstrapError {
    /// Returns the underlying configuration error, if loading failed.
    pub fn configuration(&self) -> Option<&ConfigError> {
        match self {
            Self::Configuration { source } => Some(source),
            Self::Telemetry { .. } | Self::Store { .. } => None,
        }
    }
}

/// Result of a successful bootstrap invocation.
pub struct Host {
    config: Config,
    store: SqliteStore,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Host {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Serves one parent over `reader`/`writer` until the session ends.
    pub fn serve<R: Read, W: Write>(self, reader: R, writer: W) -> Termination {
        let channel = FramedChannel::new(reader, writer, self.config.max_frame_bytes);
        let dispatcher = Dispatcher::new(self.store, ForwardSink::new(self.config.forward_dir()));
        Session::new(
            channel,
            dispatcher,
            self.reporter,
            self.config.max_response_bytes,
        )
        .run()
    }
}

/// Bootstraps the host using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration, telemetry or the store
/// cannot be brought up; the failure is reported before returning.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Host, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let store = match SqliteStore::open(&config.database_path()) {
        Ok(store) => store,
        Err(source) => {
            let error = BootstrapError::Store { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    reporter.bootstrap_succeeded(&config);
    Ok(Host {
        config,
        store,
        telemetry,
        reporter,
    })
}
