//! Command definitions
//!
//! Represents commands from clients and parses them from text lines.

use crate::error::{KvError, Result};

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store or overwrite a key (`PUT`, `SET`)
    Put { key: String, value: String },

    /// Get a value by key
    Get { key: String },

    /// Delete a key (`DELETE`, `DEL`, `RM`)
    Delete { key: String },

    /// List all entries whose key starts with `prefix` (empty = everything)
    Scan { prefix: String },

    /// Checkpoint: write the snapshot and reset the WAL
    Save,

    /// Reload the snapshot without touching the WAL
    Load,

    /// Ping (health check)
    Ping,

    /// Show available commands
    Help,

    /// End the session (`EXIT`, `QUIT`, `Q`)
    Quit,
}

impl Command {
    /// Parse one command line
    ///
    /// The verb is case-insensitive; tokens are whitespace separated. A PUT
    /// value is every token after the key, joined with single spaces.
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| KvError::Protocol("empty command".to_string()))?
            .to_ascii_uppercase();
        let args: Vec<&str> = parts.collect();

        match name.as_str() {
            "PUT" | "SET" => {
                if args.len() < 2 {
                    return Err(KvError::Protocol(
                        "PUT requires at least 2 arguments: PUT <key> <value>".to_string(),
                    ));
                }
                Ok(Command::Put {
                    key: args[0].to_string(),
                    value: args[1..].join(" "),
                })
            }
            "GET" => {
                expect_args(&name, &args, 1, "GET <key>")?;
                Ok(Command::Get {
                    key: args[0].to_string(),
                })
            }
            "DELETE" | "DEL" | "RM" => {
                expect_args(&name, &args, 1, "DELETE <key>")?;
                Ok(Command::Delete {
                    key: args[0].to_string(),
                })
            }
            "SCAN" => {
                if args.len() > 1 {
                    return Err(KvError::Protocol(
                        "SCAN takes at most 1 argument: SCAN [prefix]".to_string(),
                    ));
                }
                Ok(Command::Scan {
                    prefix: args.first().map(|p| p.to_string()).unwrap_or_default(),
                })
            }
            "SAVE" => no_args(&name, &args).map(|_| Command::Save),
            "LOAD" => no_args(&name, &args).map(|_| Command::Load),
            "PING" => no_args(&name, &args).map(|_| Command::Ping),
            "HELP" => no_args(&name, &args).map(|_| Command::Help),
            "EXIT" | "QUIT" | "Q" => no_args(&name, &args).map(|_| Command::Quit),
            _ => Err(KvError::Protocol(format!(
                "unknown command: {} (type HELP)",
                name
            ))),
        }
    }
}

fn expect_args(name: &str, args: &[&str], count: usize, usage: &str) -> Result<()> {
    if args.len() != count {
        return Err(KvError::Protocol(format!(
            "{} requires exactly {} argument: {}",
            name, count, usage
        )));
    }
    Ok(())
}

fn no_args(name: &str, args: &[&str]) -> Result<()> {
    if !args.is_empty() {
        return Err(KvError::Protocol(format!("{} takes no arguments", name)));
    }
    Ok(())
}

/// Help text, one line per entry
pub const HELP_LINES: &[&str] = &[
    "PUT <key> <value>      Store or overwrite a key-value pair",
    "SET <key> <value>      Alias for PUT",
    "GET <key>              Retrieve a value",
    "DELETE <key>           Delete a key (aliases: DEL, RM)",
    "SCAN [prefix]          List entries whose key starts with prefix",
    "SAVE                   Persist snapshot and reset WAL",
    "LOAD                   Reload snapshot (does NOT clear WAL)",
    "PING                   Check the connection",
    "HELP                   Show this help message",
    "EXIT | QUIT | Q        End the session",
];
