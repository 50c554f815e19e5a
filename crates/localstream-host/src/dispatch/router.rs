//! Action name routing.

use super::errors::ActionError;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Actions the host understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Upsert one record; `store_tweet` is accepted as an alias.
    Store,
    Query,
    GetStats,
    Ping,
    ForwardToNative,
}

impl Action {
    /// Parses an action name. Matching is exact.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::UnknownAction`] for any other name.
    pub fn parse(value: &str) -> Result<Self, ActionError> {
        match value {
            "store" | "store_tweet" => Ok(Self::Store),
            "query" => Ok(Self::Query),
            "get_stats" => Ok(Self::GetStats),
            "ping" => Ok(Self::Ping),
            "forward_to_native" => Ok(Self::ForwardToNative),
            _ => Err(ActionError::unknown_action(value)),
        }
    }

    /// Returns the canonical action name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Query => "query",
            Self::GetStats => "get_stats",
            Self::Ping => "ping",
            Self::ForwardToNative => "forward_to_native",
        }
    }
}
