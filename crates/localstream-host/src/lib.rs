//! Native messaging host that persists intercepted timeline records.
//!
//! A browser extension launches the host and talks to it over stdin and
//! stdout using length-prefixed JSON frames. The host stores records in a
//! local SQLite file, answers ad-hoc queries and statistics requests, and
//! dumps forwarded messages to disk.
//!
//! The crate is split leaf-first: [`transport`] frames bytes, [`store`]
//! persists records, [`dispatch`] maps actions to handlers, and
//! [`session`] drives the read, dispatch and reply loop. [`bootstrap`] wires
//! them to configuration and telemetry.

pub mod bootstrap;
pub mod dispatch;
pub mod health;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Host, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use session::{Session, Termination};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
