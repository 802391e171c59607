//! UDP command server engine
//!
//! Lifecycle of one server run:
//!
//! ```text
//! 1. Broadcast one discovery advertisement
//! 2. Listening: block until a HELLO handshake pins a peer
//! 3. SessionActive: framed request/response exchange with that peer
//! 4. Back to Listening on a bounded-read timeout, or stop on quit
//! ```
//!
//! Single-threaded and fully synchronous: the advertisement, the handshake
//! wait, and the per-command read/dispatch/respond cycle run in sequence on
//! one control thread. Exactly one session is live at a time; datagrams from
//! any other sender are dropped by the bounded reader before they reach the
//! dispatcher.

pub mod advertise;
pub mod dispatch;
pub mod reader;

pub use dispatch::{Dispatcher, Flow, Timings};

use crate::error::{Error, Result};
use crate::protocol::{frame, Response};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Exact handshake payload expected from a prospective controller
pub const HANDSHAKE: &[u8] = b"HELLO";

/// Receive buffer size for handshake datagrams
const HANDSHAKE_BUFFER_SIZE: usize = 16;

/// UDP command server bound to a single endpoint
pub struct CncServer {
    socket: UdpSocket,
    local_addr: SocketAddr,
    dispatcher: Dispatcher,
    read_timeout: Duration,
    running: Arc<AtomicBool>,
}

impl CncServer {
    /// Bind the listening socket and assemble the engine
    ///
    /// The socket serves both advertisement-era and session traffic; the
    /// address is immutable after bind.
    pub fn bind(
        addr: SocketAddr,
        dispatcher: Dispatcher,
        read_timeout: Duration,
        running: Arc<AtomicBool>,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        let local_addr = socket.local_addr()?;
        Ok(Self {
            socket,
            local_addr,
            dispatcher,
            read_timeout,
            running,
        })
    }

    /// Address the listening socket actually bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run the engine until `quit` or the running flag clears
    pub fn run(&mut self) -> Result<()> {
        // Discovery is best-effort; a node without a broadcast route still serves
        if let Err(e) = advertise::advertise(self.local_addr, self.local_addr.port()) {
            log::warn!("Advertisement broadcast failed: {}", e);
        }

        while self.running.load(Ordering::Relaxed) {
            log::info!("Listening for handshake on {}", self.local_addr);
            let Some(peer) = self.accept_session()? else {
                break;
            };
            log::info!("Session established with {}", peer);

            match self.serve_session(peer) {
                Ok(()) => {}
                Err(Error::ReadTimeout) => {
                    // Session abandoned; the peer cannot be reached to tell it
                    log::warn!("Session with {} timed out, back to listening", peer);
                }
                Err(e) => return Err(e),
            }
        }

        log::info!("Server stopped");
        Ok(())
    }

    /// Block until a `HELLO` datagram arrives from any sender
    ///
    /// The sender address becomes the new peer session. This is the only
    /// unbounded wait in the system ("idle, waiting for a controller").
    /// Returns `Ok(None)` when the running flag clears during the wait.
    fn accept_session(&self) -> Result<Option<SocketAddr>> {
        self.socket.set_read_timeout(None)?;
        let mut buf = [0u8; HANDSHAKE_BUFFER_SIZE];
        loop {
            if !self.running.load(Ordering::Relaxed) {
                return Ok(None);
            }
            match self.socket.recv_from(&mut buf) {
                Ok((n, addr)) if &buf[..n] == HANDSHAKE => return Ok(Some(addr)),
                Ok((n, addr)) => {
                    log::debug!("Ignoring non-handshake datagram from {} ({} bytes)", addr, n);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    /// Serve framed requests from the pinned peer until quit or timeout
    ///
    /// Strict request/response alternation: each well-formed request gets
    /// exactly one response before the next read. The length prefix and the
    /// payload may arrive as separate datagrams, each under its own read
    /// budget. A `ReadTimeout` from either read aborts the session.
    fn serve_session(&mut self, peer: SocketAddr) -> Result<()> {
        loop {
            let prefix = reader::read_from(
                &self.socket,
                peer,
                frame::LEN_PREFIX_SIZE,
                self.read_timeout,
            )?;

            let (response, flow) = if prefix.len() != frame::LEN_PREFIX_SIZE {
                log::warn!("Short length prefix from {} ({} bytes)", peer, prefix.len());
                (
                    Response::fail(format!(
                        "invalid request: short length prefix ({} bytes)",
                        prefix.len()
                    )),
                    Flow::Continue,
                )
            } else {
                let len = frame::decode_length([prefix[0], prefix[1]]) as usize;
                log::debug!("Expecting {} byte payload from {}", len, peer);
                let payload = reader::read_from(&self.socket, peer, len, self.read_timeout)?;
                self.dispatcher.dispatch_raw(&payload)
            };

            self.send_response(peer, &response)?;

            if flow == Flow::Shutdown {
                self.running.store(false, Ordering::Relaxed);
                log::info!("Session with {} ended by quit", peer);
                return Ok(());
            }
        }
    }

    /// Frame and send one response to the peer
    fn send_response(&self, peer: SocketAddr, response: &Response) -> Result<()> {
        let payload =
            serde_json::to_vec(response).map_err(|e| Error::Serialization(e.to_string()))?;
        self.socket.send_to(&frame::encode(&payload), peer)?;
        Ok(())
    }
}
