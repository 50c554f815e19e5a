//! Length-prefixed frame codec over a reader/writer pair.

use std::io::{self, Read, Write};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::TRANSPORT_TARGET;
use super::errors::FrameError;

/// Width of the little-endian length prefix in bytes.
pub const PREFIX_LEN: usize = 4;

/// Bidirectional framed channel to the parent process.
///
/// Every frame is a 4-byte little-endian payload length followed by that
/// many bytes of UTF-8 JSON. Reads block until a full frame or end of
/// stream is available; writes flush before returning so the parent never
/// waits on buffered output.
#[derive(Debug)]
pub struct FramedChannel<R, W> {
    reader: R,
    writer: W,
    max_frame_bytes: usize,
}

impl<R: Read, W: Write> FramedChannel<R, W> {
    /// Creates a channel that rejects inbound payloads above `max_frame_bytes`.
    pub fn new(reader: R, writer: W, max_frame_bytes: usize) -> Self {
        Self {
            reader,
            writer,
            max_frame_bytes,
        }
    }

    /// Reads the next frame payload.
    ///
    /// Returns `Ok(None)` when the parent closed the stream: no bytes, a
    /// short prefix, a zero-length prefix, or a payload cut off before its
    /// announced length all count as a closed stream.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooLarge`] after discarding an oversized payload
    /// (the stream stays aligned on the next prefix), or
    /// [`FrameError::Read`] when the input fails outright.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        let mut prefix = [0_u8; PREFIX_LEN];
        if !read_exact_or_closed(&mut self.reader, &mut prefix)? {
            debug!(target: TRANSPORT_TARGET, "input closed before length prefix");
            return Ok(None);
        }

        let announced = u32::from_le_bytes(prefix);
        if announced == 0 {
            debug!(target: TRANSPORT_TARGET, "zero-length prefix treated as end of stream");
            return Ok(None);
        }

        let size = usize::try_from(announced).unwrap_or(usize::MAX);
        if size > self.max_frame_bytes {
            return self.discard_oversized(announced, size);
        }

        let mut payload = vec![0_u8; size];
        if !read_exact_or_closed(&mut self.reader, &mut payload)? {
            debug!(
                target: TRANSPORT_TARGET,
                announced = size,
                "input closed before payload completed"
            );
            return Ok(None);
        }
        Ok(Some(payload))
    }

    /// Writes one frame and flushes the output.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooLarge`] if the payload cannot be described
    /// by the prefix, or [`FrameError::Write`] if the output is closed.
    pub fn write_frame(&mut self, payload: &[u8]) -> Result<(), FrameError> {
        let frame = encode_frame(payload)?;
        self.writer.write_all(&frame).map_err(FrameError::write)?;
        self.writer.flush().map_err(FrameError::write)
    }

    /// Serializes `message` as compact JSON and writes it as one frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Encode`] if serialization fails, otherwise the
    /// errors of [`Self::write_frame`].
    pub fn send<T: Serialize>(&mut self, message: &T) -> Result<(), FrameError> {
        let payload = encode_message(message)?;
        self.write_frame(&payload)
    }

    /// Releases the underlying reader and writer.
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    fn discard_oversized(
        &mut self,
        announced: u32,
        size: usize,
    ) -> Result<Option<Vec<u8>>, FrameError> {
        let expected = u64::from(announced);
        let discarded = io::copy(&mut self.reader.by_ref().take(expected), &mut io::sink())
            .map_err(FrameError::read)?;
        if discarded < expected {
            debug!(
                target: TRANSPORT_TARGET,
                announced = size,
                discarded,
                "input closed while discarding oversized frame"
            );
            return Ok(None);
        }
        Err(FrameError::too_large(size, self.max_frame_bytes))
    }
}

/// Prepends the little-endian length prefix to `payload`.
///
/// # Errors
///
/// Returns [`FrameError::TooLarge`] when the payload exceeds `u32::MAX` bytes.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let size = u32::try_from(payload.len())
        .map_err(|_| FrameError::too_large(payload.len(), u32::MAX as usize))?;
    let mut frame = Vec::with_capacity(PREFIX_LEN + payload.len());
    frame.extend_from_slice(&size.to_le_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Serializes a message to compact JSON bytes.
///
/// # Errors
///
/// Returns [`FrameError::Encode`] if serialization fails.
pub fn encode_message<T: Serialize>(message: &T) -> Result<Vec<u8>, FrameError> {
    serde_json::to_vec(message).map_err(FrameError::Encode)
}

/// Decodes a frame payload into a JSON value.
///
/// # Errors
///
/// Returns [`FrameError::Malformed`] when the payload is not UTF-8 or not a
/// JSON document.
pub fn decode_message(payload: &[u8]) -> Result<Value, FrameError> {
    let text = std::str::from_utf8(payload)
        .map_err(|error| FrameError::malformed(format!("payload is not valid UTF-8: {error}")))?;
    serde_json::from_str(text).map_err(FrameError::from_json_error)
}

/// Fills `buf` completely, reporting `false` when the stream ends first.
fn read_exact_or_closed<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool, FrameError> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(error) => Err(FrameError::read(error)),
    }
}
