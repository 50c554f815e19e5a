//! Structured health reporting for host lifecycle events.

use std::sync::Arc;

use localstream_config::Config;

use crate::bootstrap::BootstrapError;
use crate::session::Termination;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after configuration, telemetry and the store are ready.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the startup message has reached the parent.
    fn session_started(&self);

    /// Invoked when the session loop stops, whatever the cause.
    fn session_terminated(&self, termination: Termination);

    /// Invoked after the store handle has been released.
    fn store_closed(&self);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn session_started(&self) {
        (**self).session_started();
    }

    fn session_terminated(&self, termination: Termination) {
        (**self).session_terminated(termination);
    }

    fn store_closed(&self) {
        (**self).store_closed();
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting host bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            config_file = ?config.config_path,
            database = %config.database_path().display(),
            forward_dir = %config.forward_dir().display(),
            log_target = %config.log_target(),
            log_filter = %config.log_filter(),
            caller = config.caller_origin().unwrap_or_default(),
            "host bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "host bootstrap failed"
        );
    }

    fn session_started(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_started",
            "session running"
        );
    }

    fn session_terminated(&self, termination: Termination) {
        if termination.is_clean() {
            tracing::info!(
                target: HEALTH_TARGET,
                event = "session_terminated",
                reason = %termination,
                "session terminated"
            );
        } else {
            tracing::error!(
                target: HEALTH_TARGET,
                event = "session_terminated",
                reason = %termination,
                "session terminated"
            );
        }
    }

    fn store_closed(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "store_closed",
            "store closed"
        );
    }
}
