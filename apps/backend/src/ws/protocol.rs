use serde::{Deserialize, Serialize};

use crate::feed::MatchChange;
use crate::repos::matches::Match;

pub const PROTOCOL_VERSION: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    Hello { protocol: i32 },
    /// Subscribe to the caller's own match feed. Re-sent after every
    /// reconnect; the server answers with a full snapshot first.
    Subscribe,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    HelloAck {
        protocol: i32,
        user_id: i64,
    },

    Ack {
        message: String,
    },

    /// Full authoritative state at (re)subscribe time - the reconnect
    /// recovery backstop. Always sent before any incremental change.
    Snapshot {
        matches: Vec<Match>,
    },

    /// One committed transition, full row contents.
    MatchChanged {
        change: MatchChange,
    },

    /// The session fell behind the feed and rows were dropped; the client
    /// must re-fetch instead of trusting its incremental state.
    Lagged,

    Error {
        code: ErrorCode,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadProtocol,
    BadRequest,
}
