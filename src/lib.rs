//! SanketaCNC - UDP command-and-control endpoint for hobby robot actuators
//!
//! This library provides the discovery and framed-command protocol engine
//! for a single-peer remote-control node:
//!
//! - One-shot broadcast advertisement announcing the endpoint
//! - `HELLO` handshake pinning a single controlling peer
//! - 2-byte little-endian length-prefixed JSON request/response frames
//! - Bounded, peer-filtered reads that tolerate foreign datagrams

pub mod config;
pub mod drivers;
pub mod error;
pub mod protocol;
pub mod server;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Error, Result};
pub use server::CncServer;
