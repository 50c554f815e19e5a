//! Error types for frame encoding and decoding.

use std::io;

use thiserror::Error;

/// Errors surfaced while reading, decoding, or writing frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The input stream failed for a reason other than closing.
    #[error("failed to read from parent: {source}")]
    Read {
        #[source]
        source: io::Error,
    },

    /// The output stream rejected a write; the parent is gone.
    #[error("failed to write to parent: {source}")]
    Write {
        #[source]
        source: io::Error,
    },

    /// A frame announced more bytes than the configured limit.
    #[error("frame of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    /// A complete frame arrived but its payload is not a UTF-8 JSON document.
    #[error("malformed message: {message}")]
    Malformed {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// An outbound message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

impl FrameError {
    /// Creates a read error.
    pub fn read(source: io::Error) -> Self {
        Self::Read { source }
    }

    /// Creates a write error.
    pub fn write(source: io::Error) -> Self {
        Self::Write { source }
    }

    /// Creates a frame size error.
    pub fn too_large(size: usize, limit: usize) -> Self {
        Self::TooLarge { size, limit }
    }

    /// Creates a malformed payload error from a serde error.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed payload error with a custom message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true when the stream can no longer carry frames.
    ///
    /// Size and payload errors are contained to a single frame; stream
    /// failures end the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Write { .. })
    }
}
