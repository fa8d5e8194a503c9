//! Client-side SMB2 handshake engine
//!
//! Negotiates a dialect with an SMB2 server and runs the two-leg session setup,
//! leaving the security tokens to a pluggable [`TokenProvider`] and the wire to
//! a pluggable [`PacketDispatcher`].

#![allow(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod error;
pub mod protocol;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;

pub use auth::{Credentials, TokenProvider};
pub use client::{Client, ClientConfig, ClientState};
pub use error::{Error, Result};
pub use protocol::NtStatus;
pub use transport::{PacketDispatcher, TcpDispatcher};
