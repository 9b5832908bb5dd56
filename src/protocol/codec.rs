//! Protocol codec
//!
//! Line framing for commands and responses.
//!
//! ## Wire Format
//!
//! ### Request
//! One command per `\n`-terminated line. Blank lines are ignored.
//!
//! ### Response
//! ```text
//! OK                       mutation / checkpoint succeeded
//! <value>                  GET hit
//! not found                GET / DELETE miss
//! PONG                     PING
//! goodbye                  QUIT
//! error: <message>         failure
//! <line>... END            SCAN / HELP (zero or more lines, then END)
//! ```

use std::io::{BufRead, ErrorKind, Read, Write};

use crate::error::{KvError, Result};

use super::{Command, Response};

/// Terminator of multi-line responses
pub const END_MARKER: &str = "END";

/// Maximum accepted line length (1 MB)
pub const MAX_LINE_LEN: usize = 1024 * 1024;

const OK: &str = "OK";
const NOT_FOUND: &str = "not found";
const PONG: &str = "PONG";
const BYE: &str = "goodbye";
const ERROR_PREFIX: &str = "error: ";

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command as one line
pub fn encode_command(command: &Command) -> String {
    let line = match command {
        Command::Put { key, value } => format!("PUT {} {}", key, value),
        Command::Get { key } => format!("GET {}", key),
        Command::Delete { key } => format!("DELETE {}", key),
        Command::Scan { prefix } if prefix.is_empty() => "SCAN".to_string(),
        Command::Scan { prefix } => format!("SCAN {}", prefix),
        Command::Save => "SAVE".to_string(),
        Command::Load => "LOAD".to_string(),
        Command::Ping => "PING".to_string(),
        Command::Help => "HELP".to_string(),
        Command::Quit => "QUIT".to_string(),
    };
    line + "\n"
}

/// Decode a command from one line
pub fn decode_command(line: &str) -> Result<Command> {
    Command::parse(line.trim())
}

/// Read the next non-blank line
///
/// Returns `UnexpectedEof` when the peer closed the stream. An overlong line
/// is consumed through its terminator before the error is returned, so the
/// next read starts at a fresh line.
fn read_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .by_ref()
            .take(MAX_LINE_LEN as u64 + 1)
            .read_until(b'\n', &mut buf)?;

        if read == 0 {
            return Err(KvError::Io(ErrorKind::UnexpectedEof.into()));
        }

        let terminated = buf.last() == Some(&b'\n');
        let content_len = if terminated { buf.len() - 1 } else { buf.len() };
        if content_len > MAX_LINE_LEN {
            if !terminated {
                discard_line(reader)?;
            }
            return Err(KvError::Protocol(format!(
                "line too long (max {} bytes)",
                MAX_LINE_LEN
            )));
        }

        let line = std::str::from_utf8(&buf)
            .map_err(|_| KvError::Protocol("line is not valid UTF-8".to_string()))?;
        let trimmed = line.trim_end_matches(&['\r', '\n'][..]);
        if !trimmed.trim().is_empty() {
            return Ok(trimmed.to_string());
        }
    }
}

/// Skip input up to and including the next `\n` (or EOF)
fn discard_line<R: BufRead>(reader: &mut R) -> Result<()> {
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}

/// Read and parse the next command
///
/// I/O errors (including `UnexpectedEof` on disconnect) and protocol errors
/// are both returned as `Err`; callers tell them apart by variant.
pub fn read_command<R: BufRead>(reader: &mut R) -> Result<Command> {
    let line = read_line(reader)?;
    decode_command(&line)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to its text form (including line terminators)
pub fn encode_response(response: &Response) -> String {
    match response {
        Response::Ok => format!("{}\n", OK),
        Response::Value(value) => format!("{}\n", value),
        Response::NotFound => format!("{}\n", NOT_FOUND),
        Response::Pong => format!("{}\n", PONG),
        Response::Bye => format!("{}\n", BYE),
        Response::Error(message) => format!("{}{}\n", ERROR_PREFIX, message),
        Response::Lines(lines) => {
            let mut out = String::new();
            for line in lines {
                out.push_str(line);
                out.push('\n');
            }
            out.push_str(END_MARKER);
            out.push('\n');
            out
        }
    }
}

/// Write a response and flush it
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(encode_response(response).as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Read a response to `command`
///
/// The text form alone is ambiguous (a stored value may read `OK`), so the
/// command decides how the reply is framed. `GET`, `SCAN` and `HELP` reply
/// with data lines, which are returned verbatim even if they start with
/// `error: `; those commands cannot fail once the server has parsed them.
pub fn read_response<R: BufRead>(reader: &mut R, command: &Command) -> Result<Response> {
    let first = read_line(reader)?;

    let response = match command {
        Command::Scan { .. } | Command::Help => {
            let mut lines = Vec::new();
            let mut line = first;
            while line != END_MARKER {
                lines.push(line);
                line = read_line(reader)?;
            }
            Response::Lines(lines)
        }
        Command::Get { .. } if first == NOT_FOUND => Response::NotFound,
        Command::Get { .. } => Response::Value(first),
        _ => match first.strip_prefix(ERROR_PREFIX) {
            Some(message) => Response::Error(message.to_string()),
            None => match command {
                Command::Delete { .. } if first == NOT_FOUND => Response::NotFound,
                Command::Ping if first == PONG => Response::Pong,
                Command::Quit if first == BYE => Response::Bye,
                _ if first == OK => Response::Ok,
                _ => {
                    return Err(KvError::Protocol(format!(
                        "unexpected response: {:?}",
                        first
                    )))
                }
            },
        },
    };

    Ok(response)
}
