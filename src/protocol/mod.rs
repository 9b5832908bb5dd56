//! Protocol Module
//!
//! Defines the text protocol shared by the REPL and the TCP server.
//!
//! ## Commands
//! - `PUT|SET <key> <value...>`
//! - `GET <key>`
//! - `DELETE|DEL|RM <key>`
//! - `SCAN [prefix]`
//! - `SAVE`, `LOAD`, `PING`, `HELP`, `EXIT|QUIT|Q`
//!
//! Verbs are case-insensitive. Keys are single whitespace-free tokens;
//! a value is the rest of the line with tokens joined by one space.

mod command;
mod response;
mod codec;

pub use command::{Command, HELP_LINES};
pub use response::Response;
pub use codec::{
    decode_command, encode_command, encode_response, read_command, read_response,
    write_response, END_MARKER, MAX_LINE_LEN,
};
