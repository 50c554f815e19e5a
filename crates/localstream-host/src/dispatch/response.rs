//! Outbound message shapes.
//!
//! Every reply is a flat JSON object whose first key is `status`; the
//! remaining keys depend on the action that produced it.

use serde::Serialize;

use crate::store::{QueryRow, StoreStats};

/// Value of the `status` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Sent once, before the first request is read.
    Ready,
    Success,
    Error,
}

/// Stats block carried by `get_stats` replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub total: u64,
    pub size: u64,
    pub call_count: u64,
}

impl StatsReport {
    /// Combines store figures with the session's stats call counter.
    pub fn new(stats: StoreStats, call_count: u64) -> Self {
        Self {
            total: stats.total,
            size: stats.size,
            call_count,
        }
    }
}

/// Action-specific keys of a reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageBody {
    Startup {
        #[serde(rename = "type")]
        kind: &'static str,
    },
    Stored {
        id: String,
    },
    Results {
        results: Vec<QueryRow>,
    },
    Stats {
        #[serde(rename = "type")]
        kind: &'static str,
        stats: StatsReport,
    },
    Action {
        action: &'static str,
    },
    Error {
        error: String,
    },
}

/// A message written to the parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostMessage {
    status: Status,
    #[serde(flatten)]
    body: MessageBody,
}

impl HostMessage {
    /// `{"status":"ready","type":"startup"}`
    pub fn startup() -> Self {
        Self {
            status: Status::Ready,
            body: MessageBody::Startup { kind: "startup" },
        }
    }

    /// Reply to a successful `store`.
    pub fn stored(id: impl Into<String>) -> Self {
        Self::success(MessageBody::Stored { id: id.into() })
    }

    /// Reply to a successful `query`.
    pub fn results(results: Vec<QueryRow>) -> Self {
        Self::success(MessageBody::Results { results })
    }

    /// Reply to a successful `get_stats`.
    pub fn stats(stats: StatsReport) -> Self {
        Self::success(MessageBody::Stats {
            kind: "periodic_update",
            stats,
        })
    }

    /// Reply naming an action, as sent for `ping` and `forward_to_native`.
    pub fn action(action: &'static str) -> Self {
        Self::success(MessageBody::Action { action })
    }

    /// An error reply carrying `message` verbatim.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            body: MessageBody::Error {
                error: message.into(),
            },
        }
    }

    /// Outcome carried in the `status` member.
    pub fn status(&self) -> Status {
        self.status
    }

    fn success(body: MessageBody) -> Self {
        Self {
            status: Status::Success,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn encoded(message: &HostMessage) -> String {
        serde_json::to_string(message).expect("serialize")
    }

    #[rstest]
    fn startup_is_byte_exact() {
        assert_eq!(
            encoded(&HostMessage::startup()),
            r#"{"status":"ready","type":"startup"}"#
        );
    }

    #[rstest]
    fn pong_is_byte_exact() {
        assert_eq!(
            encoded(&HostMessage::action("pong")),
            r#"{"status":"success","action":"pong"}"#
        );
    }

    #[rstest]
    fn stats_carry_type_and_counter() {
        let report = StatsReport::new(StoreStats { total: 3, size: 8192 }, 2);
        assert_eq!(
            serde_json::to_value(HostMessage::stats(report)).expect("serialize"),
            json!({
                "status": "success",
                "type": "periodic_update",
                "stats": {"total": 3, "size": 8192, "call_count": 2}
            })
        );
    }

    #[rstest]
    fn results_nest_rows_as_arrays() {
        let message = HostMessage::results(vec![vec![json!(1), json!("a")]]);
        assert_eq!(
            encoded(&message),
            r#"{"status":"success","results":[[1,"a"]]}"#
        );
    }

    #[rstest]
    fn errors_keep_message_verbatim() {
        let message = HostMessage::error("Unknown action: bogus");
        assert_eq!(message.status(), Status::Error);
        assert_eq!(
            encoded(&message),
            r#"{"status":"error","error":"Unknown action: bogus"}"#
        );
    }
}
