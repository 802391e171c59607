//! One-shot broadcast self-advertisement
//!
//! A discovering controller sniffs broadcast traffic on the service port and
//! parses the `ip=<addr>, port=<port>` pattern out of the announcement text.

use crate::error::Result;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

/// Broadcast one discovery announcement for the given endpoint
///
/// Opens a throwaway datagram socket on the local interface, sends a single
/// human-readable announcement to the network broadcast address on
/// `broadcast_port`, and releases the socket. Fire-and-forget: no
/// acknowledgement is expected. Called exactly once per server start, before
/// the listening socket begins accepting handshakes.
pub fn advertise(endpoint: SocketAddr, broadcast_port: u16) -> Result<()> {
    // Ephemeral source port; discovery matches on the destination port and
    // the announcement text, not the sender.
    let socket = UdpSocket::bind(SocketAddr::new(endpoint.ip(), 0))?;
    socket.set_broadcast(true)?;

    let msg = announcement(endpoint);
    socket.send_to(msg.as_bytes(), (Ipv4Addr::BROADCAST, broadcast_port))?;
    log::info!(
        "Advertised endpoint {} to broadcast port {}",
        endpoint,
        broadcast_port
    );
    Ok(())
}

/// Announcement text carrying the endpoint clients should connect to
fn announcement(endpoint: SocketAddr) -> String {
    format!(
        "Hello from CNC, listening on UDP socket ip={}, port={}",
        endpoint.ip(),
        endpoint.port()
    )
}
