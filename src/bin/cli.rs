//! LocalKV CLI
//!
//! Interactive REPL over an embedded engine, or a one-shot client for a
//! running server.

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use localkv::protocol::{self, Command, Response};
use localkv::{Engine, KvError};
use tracing_subscriber::{fmt, EnvFilter};

/// LocalKV CLI
#[derive(Parser, Debug)]
#[command(name = "localkv-cli")]
#[command(about = "CLI for the LocalKV key-value store")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Open the data directory directly and read commands from stdin
    Repl {
        /// Data directory
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,
    },

    /// Send one command to a running server and print the reply
    Send {
        /// Server address
        #[arg(short, long, default_value = "127.0.0.1:4000")]
        server: String,

        /// The command, e.g. `PUT greeting hello world`
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },
}

fn main() {
    // Logs go to stderr so they never mix with command output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let args = Args::parse();
    let mode = args.mode.unwrap_or(Mode::Repl {
        data_dir: PathBuf::from("./data"),
    });

    let result = match mode {
        Mode::Repl { data_dir } => repl(&data_dir),
        Mode::Send { server, command } => send(&server, &command.join(" ")),
    };

    if let Err(e) = result {
        eprintln!("fatal: {}", e);
        std::process::exit(1);
    }
}

/// Run the interactive loop until EOF or QUIT
fn repl(data_dir: &Path) -> localkv::Result<()> {
    let engine = Engine::open_path(data_dir)?;
    let report = engine.recovery_report();
    if report.snapshot_keys.is_some() {
        println!("snapshot loaded");
    }
    if report.wal.is_some() {
        println!("WAL replayed");
    }

    println!("localkv REPL (type HELP for commands)");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = BufWriter::new(io::stdout());
    let mut line = String::new();

    loop {
        write!(out, "> ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out, "\nexiting")?;
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let response = match protocol::decode_command(&line) {
            Ok(command) => engine
                .execute(command)
                .unwrap_or_else(|e| Response::error(&e.to_string())),
            Err(e) => Response::error(&e.to_string()),
        };

        protocol::write_response(&mut out, &response)?;
        if response.ends_session() {
            break;
        }
    }

    out.flush()?;
    drop(out);
    engine.close()
}

/// Send a single command line to `server` and print the response
fn send(server: &str, line: &str) -> localkv::Result<()> {
    let command = Command::parse(line)?;

    let stream = TcpStream::connect(server)
        .map_err(|e| KvError::Network(format!("cannot connect to {}: {}", server, e)))?;
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);

    writer.write_all(protocol::encode_command(&command).as_bytes())?;
    writer.flush()?;

    let response = protocol::read_response(&mut reader, &command)?;
    print!("{}", protocol::encode_response(&response));

    if let Response::Error(_) = response {
        std::process::exit(2);
    }
    Ok(())
}
