//! Action handlers and the dispatcher that owns session state.
//!
//! The dispatcher never fails: each handler runs to completion and any
//! error it raises becomes an error reply for that message alone.

use serde_json::Value;
use tracing::{debug, warn};

use crate::store::RecordStore;

use super::errors::ActionError;
use super::forward::ForwardSink;
use super::record::{RECORD_KEY, record_from_value};
use super::request::InboundMessage;
use super::response::{HostMessage, StatsReport};
use super::router::{Action, DISPATCH_TARGET};

/// Routes inbound messages to handlers.
///
/// Owns the store handle and the stats call counter for the lifetime of the
/// session; the counter is never persisted.
#[derive(Debug)]
pub struct Dispatcher<S> {
    store: S,
    forward: ForwardSink,
    stats_calls: u64,
}

impl<S: RecordStore> Dispatcher<S> {
    /// Creates a dispatcher over `store` with a zeroed stats counter.
    pub fn new(store: S, forward: ForwardSink) -> Self {
        Self {
            store,
            forward,
            stats_calls: 0,
        }
    }

    /// Handles one decoded frame and returns the reply to send.
    pub fn dispatch(&mut self, value: Value) -> HostMessage {
        let outcome = InboundMessage::parse(value).and_then(|message| self.handle(&message));
        outcome.unwrap_or_else(|error| {
            warn!(target: DISPATCH_TARGET, %error, "action failed");
            HostMessage::error(error.to_string())
        })
    }

    /// Number of successful `get_stats` calls so far.
    pub fn stats_calls(&self) -> u64 {
        self.stats_calls
    }

    /// Mutable access for the session's schema setup and shutdown.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn handle(&mut self, message: &InboundMessage) -> Result<HostMessage, ActionError> {
        let action = Action::parse(message.action())?;
        debug!(target: DISPATCH_TARGET, action = action.as_str(), "dispatching action");
        match action {
            Action::Store => self.store_record(message),
            Action::Query => self.run_query(message),
            Action::GetStats => self.report_stats(),
            Action::Ping => Ok(HostMessage::action("pong")),
            Action::ForwardToNative => Ok(self.forward_message(message)),
        }
    }

    fn store_record(&mut self, message: &InboundMessage) -> Result<HostMessage, ActionError> {
        let record = record_from_value(message.field(RECORD_KEY))?;
        self.store.upsert(&record)?;
        debug!(target: DISPATCH_TARGET, id = %record.originator_id, "record stored");
        Ok(HostMessage::stored(record.originator_id))
    }

    fn run_query(&mut self, message: &InboundMessage) -> Result<HostMessage, ActionError> {
        let statement = match message.field("sql") {
            None | Some(Value::Null) => return Err(ActionError::EmptyQuery),
            Some(Value::String(sql)) => sql,
            Some(_) => return Err(ActionError::invalid_field("sql", "expected a string")),
        };
        if statement.trim().is_empty() {
            return Err(ActionError::EmptyQuery);
        }
        let rows = self.store.query(statement)?;
        debug!(target: DISPATCH_TARGET, rows = rows.len(), "query completed");
        Ok(HostMessage::results(rows))
    }

    fn report_stats(&mut self) -> Result<HostMessage, ActionError> {
        let stats = self.store.stats()?;
        self.stats_calls += 1;
        Ok(HostMessage::stats(StatsReport::new(stats, self.stats_calls)))
    }

    /// A failed dump is logged and still acknowledged.
    fn forward_message(&self, message: &InboundMessage) -> HostMessage {
        match self.forward.write(message.fields()) {
            Ok(path) => {
                debug!(target: DISPATCH_TARGET, path = %path.display(), "message forwarded");
            }
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    %error,
                    dir = %self.forward.dir().display(),
                    "failed to write forwarded message"
                );
            }
        }
        HostMessage::action(Action::ForwardToNative.as_str())
    }
}
