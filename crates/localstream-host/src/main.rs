use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use localstream_host::{
    BootstrapError, StructuredHealthReporter, SystemConfigLoader, bootstrap_with,
};

fn main() -> ExitCode {
    let reporter = Arc::new(StructuredHealthReporter::new());
    match bootstrap_with(&SystemConfigLoader, reporter) {
        Ok(host) => {
            let termination = host.serve(io::stdin().lock(), io::stdout().lock());
            ExitCode::from(termination.exit_code())
        }
        Err(error) => report_bootstrap_failure(&error),
    }
}

/// Telemetry may not be running yet, so failures also go to stderr, which
/// browsers capture in their own logs.
fn report_bootstrap_failure(error: &BootstrapError) -> ExitCode {
    if let Some(config_error) = error.configuration() {
        let printed = config_error.print();
        if config_error.is_informational() && printed.is_ok() {
            return ExitCode::SUCCESS;
        }
        return ExitCode::FAILURE;
    }
    let _ = writeln!(io::stderr(), "localstream-host: {error}");
    ExitCode::FAILURE
}
