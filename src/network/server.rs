//! TCP Server
//!
//! Accepts connections and serves each one on its own thread.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;
use parking_lot::Mutex;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{KvError, Result};
use crate::protocol::{write_response, Response};

use super::Connection;

/// How often the acceptor re-checks the shutdown flag
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Open connections by id; the stream is a clone used to unblock reads
type ConnectionTable = Arc<Mutex<HashMap<u64, TcpStream>>>;

/// TCP server for LocalKV
///
/// One acceptor loop; every accepted client gets a dedicated thread, up to
/// `max_connections` at once. Clients beyond the limit receive an error line
/// and are disconnected.
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
    connections: ConnectionTable,
}

/// Cloneable handle that stops a running server
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal the server to shut down gracefully
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown has been requested
    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Removes a connection from the table when its thread ends
struct Registration {
    id: u64,
    connections: ConnectionTable,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.connections.lock().remove(&self.id);
    }
}

impl Server {
    /// Bind the listen address from `config`
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            KvError::Network(format!("failed to bind {}: {}", config.listen_addr, e))
        })?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
            connections: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for stopping the server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Run the accept loop (blocking until shutdown)
    ///
    /// On shutdown, open connections stop reading; a command already in
    /// progress still completes and gets its response before the call returns.
    pub fn run(&self) -> Result<()> {
        let done = WaitGroup::new();
        let mut next_id: u64 = 0;

        tracing::info!(
            addr = %self.local_addr()?,
            max_connections = self.config.max_connections,
            "Server listening"
        );

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    tracing::debug!("Accepted connection from {}", addr);
                    // Accepted sockets may inherit non-blocking mode.
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Dropping connection from {}: {}", addr, e);
                        continue;
                    }
                    next_id += 1;
                    self.serve(next_id, stream, addr, done.clone());
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                }
            }
        }

        let open = self.stop_reading();
        if open > 0 {
            tracing::info!(connections = open, "Waiting for open connections");
        }
        done.wait();

        tracing::info!("Server stopped");
        Ok(())
    }

    fn serve(&self, id: u64, stream: TcpStream, addr: SocketAddr, done: WaitGroup) {
        let registration = match self.register(id, &stream) {
            Ok(Some(registration)) => registration,
            Ok(None) => {
                reject(stream, addr);
                return;
            }
            Err(e) => {
                tracing::warn!("Dropping connection from {}: {}", addr, e);
                return;
            }
        };

        let engine = Arc::clone(&self.engine);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        let spawned = thread::Builder::new()
            .name(format!("localkv-conn-{}", id))
            .spawn(move || {
                // Dropped in reverse order: deregister, then signal done
                let _done = done;
                let _registration = registration;

                let result = Connection::new(stream, engine).and_then(|mut conn| {
                    conn.set_timeouts(read_ms, write_ms)?;
                    conn.handle()
                });

                if let Err(e) = result {
                    tracing::warn!(connection = id, "Connection ended with error: {}", e);
                }
            });

        if let Err(e) = spawned {
            tracing::warn!("Failed to spawn thread for {}: {}", addr, e);
        }
    }

    /// Record a new connection, or `None` when the limit is reached
    fn register(&self, id: u64, stream: &TcpStream) -> Result<Option<Registration>> {
        let mut connections = self.connections.lock();
        if connections.len() >= self.config.max_connections {
            return Ok(None);
        }
        connections.insert(id, stream.try_clone()?);

        Ok(Some(Registration {
            id,
            connections: Arc::clone(&self.connections),
        }))
    }

    /// Shut down the read half of every open connection
    ///
    /// Blocked reads return EOF, so idle clients cannot hold up shutdown.
    fn stop_reading(&self) -> usize {
        let connections = self.connections.lock();
        for stream in connections.values() {
            let _ = stream.shutdown(Shutdown::Read);
        }
        connections.len()
    }
}

fn reject(mut stream: TcpStream, addr: SocketAddr) {
    tracing::warn!("Connection limit reached; rejecting {}", addr);
    let _ = write_response(&mut stream, &Response::error("too many connections"));
}
