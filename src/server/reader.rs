//! Bounded peer-filtered datagram reads
//!
//! On a shared broadcast-capable network the listening socket can observe
//! datagrams from peers other than the active session. Those must be
//! silently dropped rather than corrupt frame parsing, so every receive
//! here filters on the sender address and only the elapsed-time budget
//! decides when to give up. The deadline comes from a monotonic clock
//! ([`Instant`]) and is immune to wall-clock adjustments.

use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

/// Receive up to `size` bytes from `expected_peer` within `timeout`
///
/// Performs blocking receives with the remaining budget as the per-call
/// timeout. Datagrams from other senders are discarded and the deadline is
/// re-checked after every discard; a matching datagram returns immediately,
/// truncated to `size` bytes. Fails with [`Error::ReadTimeout`] once the
/// budget measured from call entry is exhausted.
pub fn read_from(
    socket: &UdpSocket,
    expected_peer: SocketAddr,
    size: usize,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let deadline = Instant::now() + timeout;
    let mut buf = vec![0u8; size];

    loop {
        let remaining = match deadline.checked_duration_since(Instant::now()) {
            Some(d) if !d.is_zero() => d,
            _ => return Err(Error::ReadTimeout),
        };
        socket.set_read_timeout(Some(remaining))?;

        match socket.recv_from(&mut buf) {
            Ok((n, addr)) if addr == expected_peer => {
                buf.truncate(n);
                return Ok(buf);
            }
            Ok((n, addr)) => {
                log::debug!("Discarding {} byte datagram from foreign sender {}", n, addr);
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                return Err(Error::ReadTimeout);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::Io(e)),
        }
    }
}
