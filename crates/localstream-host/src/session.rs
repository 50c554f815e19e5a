//! Read, dispatch and reply loop for one parent connection.
//!
//! The session owns the channel and the dispatcher (and through it the
//! store) until the loop stops. It moves from `Running` to `Terminated`
//! only on a stream-level failure; every per-message failure is answered
//! with an error reply and the loop continues. The store is closed on every
//! exit path.

use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::dispatch::{ActionError, Dispatcher, HostMessage};
use crate::health::HealthReporter;
use crate::store::RecordStore;
use crate::transport::{FrameError, FramedChannel, decode_message, encode_message};

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The parent closed the input stream.
    EndOfStream,
    /// A reply could not be written; the parent is gone.
    WriteFailed,
    /// The input stream failed for a reason other than closing.
    ReadFailed,
    /// The record table could not be created at startup.
    SchemaFailed,
}

impl Termination {
    /// Returns true when the parent ended the session.
    pub fn is_clean(self) -> bool {
        matches!(self, Self::EndOfStream | Self::WriteFailed)
    }

    /// Process exit status for this outcome.
    pub fn exit_code(self) -> u8 {
        if self.is_clean() { 0 } else { 1 }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::EndOfStream => "end of stream",
            Self::WriteFailed => "parent unreachable",
            Self::ReadFailed => "input failed",
            Self::SchemaFailed => "schema unavailable",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Running,
    Terminated(Termination),
}

/// A running host session.
pub struct Session<R, W, S> {
    channel: FramedChannel<R, W>,
    dispatcher: Dispatcher<S>,
    reporter: Arc<dyn HealthReporter>,
    max_response_bytes: usize,
}

impl<R, W, S> Session<R, W, S>
where
    R: Read,
    W: Write,
    S: RecordStore,
{
    /// Builds a session; replies larger than `max_response_bytes` are
    /// replaced by an error reply.
    pub fn new(
        channel: FramedChannel<R, W>,
        dispatcher: Dispatcher<S>,
        reporter: Arc<dyn HealthReporter>,
        max_response_bytes: usize,
    ) -> Self {
        Self {
            channel,
            dispatcher,
            reporter,
            max_response_bytes,
        }
    }

    /// Runs the session to completion and releases the store.
    pub fn run(mut self) -> Termination {
        let termination = self.drive();
        self.dispatcher.store_mut().close();
        self.reporter.store_closed();
        self.reporter.session_terminated(termination);
        termination
    }

    fn drive(&mut self) -> Termination {
        if let Err(failure) = self.dispatcher.store_mut().ensure_schema() {
            error!(target: SESSION_TARGET, error = %failure, "failed to ensure schema");
            if let Err(write_error) = self.send(&HostMessage::error(failure.to_string())) {
                debug!(target: SESSION_TARGET, error = %write_error, "schema error not delivered");
            }
            return Termination::SchemaFailed;
        }

        if let LoopState::Terminated(termination) = self.reply(&HostMessage::startup()) {
            return termination;
        }
        self.reporter.session_started();

        loop {
            if let LoopState::Terminated(termination) = self.step() {
                return termination;
            }
        }
    }

    /// Reads one frame and answers it.
    fn step(&mut self) -> LoopState {
        let reply = match self.channel.read_frame() {
            Ok(Some(payload)) => self.handle_payload(&payload),
            Ok(None) => {
                debug!(target: SESSION_TARGET, "parent closed the stream");
                return LoopState::Terminated(Termination::EndOfStream);
            }
            Err(failure) if failure.is_fatal() => {
                error!(target: SESSION_TARGET, error = %failure, "failed to read frame");
                return LoopState::Terminated(Termination::ReadFailed);
            }
            Err(failure) => {
                warn!(target: SESSION_TARGET, error = %failure, "rejected frame");
                HostMessage::error(ActionError::frame(failure).to_string())
            }
        };
        self.reply(&reply)
    }

    fn handle_payload(&mut self, payload: &[u8]) -> HostMessage {
        match decode_message(payload) {
            Ok(value) => {
                debug!(target: SESSION_TARGET, message = %value, "message received");
                self.dispatcher.dispatch(value)
            }
            Err(failure) => {
                warn!(
                    target: SESSION_TARGET,
                    error = %failure,
                    bytes = payload.len(),
                    "malformed frame"
                );
                HostMessage::error(ActionError::frame(failure).to_string())
            }
        }
    }

    fn reply(&mut self, message: &HostMessage) -> LoopState {
        match self.send(message) {
            Ok(()) => LoopState::Running,
            Err(failure) if failure.is_fatal() => {
                warn!(target: SESSION_TARGET, error = %failure, "failed to write reply");
                LoopState::Terminated(Termination::WriteFailed)
            }
            Err(failure) => {
                warn!(target: SESSION_TARGET, error = %failure, "reply dropped");
                LoopState::Running
            }
        }
    }

    fn send(&mut self, message: &HostMessage) -> Result<(), FrameError> {
        let mut payload = encode_message(message)?;
        if payload.len() > self.max_response_bytes {
            warn!(
                target: SESSION_TARGET,
                bytes = payload.len(),
                limit = self.max_response_bytes,
                "reply exceeds size limit"
            );
            payload = encode_message(&HostMessage::error(format!(
                "response of {} bytes exceeds the {} byte limit",
                payload.len(),
                self.max_response_bytes
            )))?;
        }
        debug!(
            target: SESSION_TARGET,
            message = %String::from_utf8_lossy(&payload),
            "message sent"
        );
        self.channel.write_frame(&payload)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Termination::EndOfStream, 0)]
    #[case(Termination::WriteFailed, 0)]
    #[case(Termination::ReadFailed, 1)]
    #[case(Termination::SchemaFailed, 1)]
    fn exit_codes(#[case] termination: Termination, #[case] expected: u8) {
        assert_eq!(termination.exit_code(), expected);
    }
}
