//! Wire protocol: frame codec and command/response envelopes

pub mod frame;
pub mod message;

pub use message::{CommandKind, Request, Response};
