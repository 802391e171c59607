//! Length-prefixed frame codec
//!
//! Every message in both directions travels as a 2-byte little-endian
//! unsigned length followed by exactly that many payload bytes:
//!
//! ```text
//! ┌───────────────────┬────────────────────┐
//! │ Length (2 bytes)  │ Payload (variable) │
//! │ Little-endian u16 │ UTF-8 JSON object  │
//! └───────────────────┴────────────────────┘
//! ```
//!
//! The prefix value always equals the payload byte length. No size limit is
//! enforced here; callers must stay within the transport's datagram size.

/// Byte width of the length prefix
pub const LEN_PREFIX_SIZE: usize = 2;

/// Encode a payload as a length-prefixed frame
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(LEN_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Decode a length prefix into the payload byte length
pub fn decode_length(prefix: [u8; LEN_PREFIX_SIZE]) -> u16 {
    u16::from_le_bytes(prefix)
}
