//! Framed channel to the parent process.
//!
//! The parent and the host exchange length-prefixed JSON documents over the
//! host's standard input and output. No other module touches those streams
//! directly.

mod channel;
mod errors;

pub use self::channel::{
    FramedChannel, PREFIX_LEN, decode_message, encode_frame, encode_message,
};
pub use self::errors::FrameError;

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
