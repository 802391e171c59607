//! Command and response envelopes
//!
//! Requests are JSON objects with a mandatory `cmd` field drawn from a closed
//! vocabulary. Responses carry a result code (`"0"` success, `"1"` failure)
//! and a human-readable message.

use serde::{Deserialize, Serialize};

/// Result code for a successful command
pub const RES_OK: &str = "0";
/// Result code for a failed command
pub const RES_FAIL: &str = "1";

/// Inbound command envelope
///
/// `cmd` is mandatory. The remaining fields are reserved parameter slots for
/// future motor power/duration control; the dispatcher currently ignores them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub cmd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl Request {
    /// Build a bare request carrying only a command name
    pub fn new(cmd: &str) -> Self {
        Self {
            cmd: cmd.to_string(),
            power: None,
            duration_ms: None,
        }
    }
}

/// Closed command vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Quit,
    Echo,
    Connect,
    Disconnect,
    IsConnected,
    Up,
    Down,
    Left,
    Right,
    Distance,
}

impl CommandKind {
    /// Parse a `cmd` field value; `None` for anything outside the vocabulary
    pub fn parse(cmd: &str) -> Option<Self> {
        match cmd {
            "quit" => Some(Self::Quit),
            "echo" => Some(Self::Echo),
            "connect" => Some(Self::Connect),
            "disconnect" => Some(Self::Disconnect),
            "is_connected" => Some(Self::IsConnected),
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "distance" => Some(Self::Distance),
            _ => None,
        }
    }
}

/// Outbound response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Result code: `"0"` success, `"1"` failure
    pub res: String,
    /// Human-readable outcome message
    pub msg: String,
}

impl Response {
    /// Build a success response
    pub fn ok(msg: impl Into<String>) -> Self {
        Self {
            res: RES_OK.to_string(),
            msg: msg.into(),
        }
    }

    /// Build a failure response
    pub fn fail(msg: impl Into<String>) -> Self {
        Self {
            res: RES_FAIL.to_string(),
            msg: msg.into(),
        }
    }

    /// Whether this response reports success
    pub fn is_ok(&self) -> bool {
        self.res == RES_OK
    }
}
