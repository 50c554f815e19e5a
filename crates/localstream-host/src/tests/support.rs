//! Test harness utilities for the session and bootstrap suites.

use std::io::{self, Cursor, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tempfile::TempDir;

use localstream_config::{Config, ConfigError};

use crate::bootstrap::{BootstrapError, ConfigLoader};
use crate::dispatch::{Dispatcher, ForwardSink};
use crate::health::HealthReporter;
use crate::session::{Session, Termination};
use crate::store::{QueryRow, Record, RecordStore, SqliteStore, StoreError, StoreStats};
use crate::transport::{FramedChannel, decode_message, encode_frame, encode_message};

/// Frame limits applied to a scripted session.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_frame_bytes: usize,
    pub max_response_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_frame_bytes: 64 * 1024,
            max_response_bytes: 64 * 1024,
        }
    }
}

/// Outcome of a scripted session.
pub struct SessionRun {
    pub termination: Termination,
    /// Raw reply payloads, prefixes stripped.
    pub frames: Vec<Vec<u8>>,
    pub events: Vec<HealthEvent>,
    /// Number of times the session closed its store.
    pub closes: usize,
}

impl SessionRun {
    /// Replies decoded as JSON.
    pub fn replies(&self) -> Vec<Value> {
        self.frames
            .iter()
            .map(|frame| decode_message(frame).expect("reply should be JSON"))
            .collect()
    }
}

/// Encodes `messages` as consecutive frames.
pub fn frames_of(messages: &[Value]) -> Vec<u8> {
    messages
        .iter()
        .flat_map(|message| encode_frame(&encode_message(message).expect("encode")).expect("frame"))
        .collect()
}

/// Prefixes raw bytes without checking they are JSON.
pub fn raw_frame(payload: &[u8]) -> Vec<u8> {
    encode_frame(payload).expect("frame")
}

/// Runs a session over a scripted input against a fresh in-memory store.
pub fn run_scripted(input: Vec<u8>, limits: Limits) -> SessionRun {
    let store = SqliteStore::open_in_memory().expect("in-memory store");
    run_with_store(store, input, limits)
}

/// Runs a session over a scripted input against `store`.
pub fn run_with_store<S: RecordStore>(store: S, input: Vec<u8>, limits: Limits) -> SessionRun {
    let output = SharedBuffer::default();
    let (termination, events, closes) =
        run_over_with(store, Cursor::new(input), output.clone(), limits);
    SessionRun {
        termination,
        frames: split_frames(&output.contents()),
        events,
        closes,
    }
}

/// Runs a session over arbitrary streams against an in-memory store.
pub fn run_over<R: Read, W: Write>(reader: R, writer: W) -> (Termination, Vec<HealthEvent>, usize) {
    let store = SqliteStore::open_in_memory().expect("in-memory store");
    run_over_with(store, reader, writer, Limits::default())
}

fn run_over_with<S, R, W>(
    store: S,
    reader: R,
    writer: W,
    limits: Limits,
) -> (Termination, Vec<HealthEvent>, usize)
where
    S: RecordStore,
    R: Read,
    W: Write,
{
    let forward_dir = TempDir::new().expect("forward dir");
    let reporter = Arc::new(RecordingHealthReporter::default());
    let closes = Arc::new(AtomicUsize::new(0));
    let store = CloseCountingStore {
        inner: store,
        closes: Arc::clone(&closes),
    };
    let channel = FramedChannel::new(reader, writer, limits.max_frame_bytes);
    let dispatcher = Dispatcher::new(store, ForwardSink::new(forward_dir.path()));

    let termination = Session::new(
        channel,
        dispatcher,
        reporter.clone(),
        limits.max_response_bytes,
    )
    .run();
    (termination, reporter.events(), closes.load(Ordering::SeqCst))
}

/// Splits concatenated frames back into payloads.
pub fn split_frames(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut channel = FramedChannel::new(Cursor::new(bytes), io::sink(), usize::MAX);
    let mut frames = Vec::new();
    while let Some(frame) = channel.read_frame().expect("well-formed output") {
        frames.push(frame);
    }
    frames
}

/// Writer whose contents stay readable after the session consumes it.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().expect("buffer mutex poisoned").clone()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .expect("buffer mutex poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer for a parent that has already exited.
pub struct ClosedPipe;

impl Write for ClosedPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }
}

/// Reader whose underlying device fails.
pub struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("device failure"))
    }
}

/// Store wrapper that counts close calls.
struct CloseCountingStore<S> {
    inner: S,
    closes: Arc<AtomicUsize>,
}

impl<S: RecordStore> RecordStore for CloseCountingStore<S> {
    fn ensure_schema(&mut self) -> Result<(), StoreError> {
        self.inner.ensure_schema()
    }

    fn upsert(&mut self, record: &Record) -> Result<(), StoreError> {
        self.inner.upsert(record)
    }

    fn query(&mut self, statement: &str) -> Result<Vec<QueryRow>, StoreError> {
        self.inner.query(statement)
    }

    fn stats(&mut self) -> Result<StoreStats, StoreError> {
        self.inner.stats()
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close();
    }
}

/// Store whose table can never be created.
pub struct SchemaRejectingStore;

impl RecordStore for SchemaRejectingStore {
    fn ensure_schema(&mut self) -> Result<(), StoreError> {
        Err(StoreError::Closed)
    }

    fn upsert(&mut self, _record: &Record) -> Result<(), StoreError> {
        Err(StoreError::Closed)
    }

    fn query(&mut self, _statement: &str) -> Result<Vec<QueryRow>, StoreError> {
        Err(StoreError::Closed)
    }

    fn stats(&mut self) -> Result<StoreStats, StoreError> {
        Err(StoreError::Closed)
    }

    fn close(&mut self) {}
}

/// Loader that places every file the host touches under a temporary
/// directory.
pub struct TestConfigLoader {
    dir: TempDir,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temporary directory"),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.dir.path().join("data").join("tweets.db")
    }

    pub fn forward_dir(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(Config {
            database: Some(self.database_path()),
            forward_dir: Some(self.forward_dir()),
            log_file: Some(self.dir.path().join("host.log")),
            ..Config::default()
        })
    }
}

/// Loader that fails validation.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load_from_iter(["localstream-host", "--max-frame-bytes", "0"])
    }
}

/// Records health events for assertions.
#[derive(Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn session_started(&self) {
        self.record(HealthEvent::SessionStarted);
    }

    fn session_terminated(&self, termination: Termination) {
        self.record(HealthEvent::SessionTerminated(termination));
    }

    fn store_closed(&self) {
        self.record(HealthEvent::StoreClosed);
    }
}

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    SessionStarted,
    SessionTerminated(Termination),
    StoreClosed,
}
