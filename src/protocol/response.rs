//! Response definitions
//!
//! Represents responses to clients.

use std::collections::BTreeMap;

use super::HELP_LINES;

/// A response to send to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Mutation or checkpoint succeeded
    Ok,

    /// Raw value (GET)
    Value(String),

    /// Key absent (GET, DELETE)
    NotFound,

    /// Multi-line payload (SCAN, HELP), framed by a trailing `END`
    Lines(Vec<String>),

    /// Reply to PING
    Pong,

    /// Session ends after this response
    Bye,

    /// Command failed
    Error(String),
}

impl Response {
    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Response::Error(message.to_string())
    }

    /// One `key value` line per entry, in key order
    pub fn entries(entries: &BTreeMap<String, String>) -> Self {
        Response::Lines(
            entries
                .iter()
                .map(|(key, value)| format!("{} {}", key, value))
                .collect(),
        )
    }

    /// The help listing
    pub fn help() -> Self {
        Response::Lines(HELP_LINES.iter().map(|line| line.to_string()).collect())
    }

    /// Whether the session should close after this response
    pub fn ends_session(&self) -> bool {
        matches!(self, Response::Bye)
    }
}
