//! Channel messages crossing the driver/page execution-context boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::CommandPayload;

/// Version of the message contract.
///
/// Both sides stamp outgoing messages with this value; the executor refuses
/// commands carrying a different version with a `ProtocolMismatch` error
/// reply rather than guessing at their shape.
pub const PROTOCOL_VERSION: u32 = 1;

fn protocol_version() -> u32 {
    PROTOCOL_VERSION
}

/// Error body carried by an `error` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable error message.
    pub message: String,
    /// Error kind name (e.g. "ElementNotFound", "UnknownAction").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Discriminated union of channel messages.
///
/// Every `command` eventually produces exactly one `response` or `error`
/// with the same `id`, or the sender times out and synthesizes a local error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChannelMessage {
    /// Driver → page: perform a command.
    Command {
        id: u32,
        #[serde(default = "protocol_version")]
        v: u32,
        command: CommandPayload,
    },
    /// Page → driver: the command succeeded.
    Response {
        id: u32,
        #[serde(default = "protocol_version")]
        v: u32,
        result: Value,
    },
    /// Page → driver: the command failed in the page.
    Error {
        id: u32,
        #[serde(default = "protocol_version")]
        v: u32,
        error: ErrorPayload,
    },
}

impl ChannelMessage {
    /// Builds a `command` message stamped with the current protocol version.
    pub fn command(id: u32, command: CommandPayload) -> Self {
        ChannelMessage::Command {
            id,
            v: PROTOCOL_VERSION,
            command,
        }
    }

    /// Returns the correlation id of this message.
    pub fn id(&self) -> u32 {
        match self {
            ChannelMessage::Command { id, .. }
            | ChannelMessage::Response { id, .. }
            | ChannelMessage::Error { id, .. } => *id,
        }
    }
}
