//! Action dispatch for inbound messages.
//!
//! Each decoded frame must be an object with a string `action`:
//!
//! ```json
//! {"action":"query","sql":"SELECT COUNT(*) FROM tweets"}
//! ```
//!
//! and produces exactly one reply whose `status` is `success` or `error`:
//!
//! ```json
//! {"status":"success","results":[[1]]}
//! ```
//!
//! ## Actions
//!
//! `store` (alias `store_tweet`), `query`, `get_stats`, `ping` and
//! `forward_to_native`. Any other name is answered with
//! `Unknown action: <name>`.

mod errors;
mod forward;
mod handler;
mod record;
mod request;
mod response;
mod router;

pub use self::errors::ActionError;
pub use self::forward::ForwardSink;
pub use self::handler::Dispatcher;
pub use self::record::record_from_value;
pub use self::request::InboundMessage;
pub use self::response::{HostMessage, MessageBody, StatsReport, Status};
pub use self::router::Action;
