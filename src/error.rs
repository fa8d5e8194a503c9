//! Error types for the SMB2 handshake engine

use crate::protocol::smb2_constants::Smb2Command;
use crate::protocol::status::NtStatus;
use std::io;
use thiserror::Error;

/// Result type for SMB2 handshake operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the handshake engine
///
/// Protocol status outcomes such as a logon failure are *not* errors; they are
/// returned as [`NtStatus`] values. This type only carries faults.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error on the underlying connection
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport failure reported by a dispatcher
    #[error("Transport error: {0}")]
    Transport(String),

    /// Connection closed by the peer
    #[error("Connection closed")]
    ConnectionClosed,

    /// A packet could not be decoded
    #[error("Malformed packet: {field} at offset {offset}: {reason}")]
    MalformedPacket {
        field: &'static str,
        offset: usize,
        reason: String,
    },

    /// Buffer too small
    #[error("Buffer too small: need {need} bytes, have {have}")]
    BufferTooSmall { need: usize, have: usize },

    /// The server answered a request with an error response
    #[error("Server rejected {command:?}: {status}")]
    Rejected {
        command: Smb2Command,
        status: NtStatus,
    },

    /// Security token provider failure
    #[error("Security token provider error: {0}")]
    Provider(String),

    /// Operation attempted from the wrong client state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Build a [`Error::MalformedPacket`]
    pub fn malformed(field: &'static str, offset: usize, reason: impl Into<String>) -> Self {
        Error::MalformedPacket {
            field,
            offset,
            reason: reason.into(),
        }
    }

    /// True for faults raised by the connection itself
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Transport(_) | Error::ConnectionClosed
        )
    }

    /// True for decode failures
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::MalformedPacket { .. } | Error::BufferTooSmall { .. }
        )
    }

    /// Re-class any error raised inside a token provider as a provider error
    pub(crate) fn into_provider(self) -> Self {
        match self {
            Error::Provider(_) => self,
            other => Error::Provider(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        let io_err = Error::from(io::Error::new(io::ErrorKind::BrokenPipe, "pipe"));
        assert!(io_err.is_transport());
        assert!(!io_err.is_malformed());

        assert!(Error::ConnectionClosed.is_transport());
        assert!(Error::malformed("command", 12, "bad").is_malformed());
        assert!(Error::BufferTooSmall { need: 64, have: 3 }.is_malformed());
        assert!(!Error::Provider("x".into()).is_transport());
    }

    #[test]
    fn test_malformed_display_names_field_and_offset() {
        let err = Error::malformed("protocol_id", 0, "expected 0xFE 'SMB'");
        let display = format!("{}", err);
        assert!(display.contains("protocol_id"));
        assert!(display.contains("offset 0"));
    }

    #[test]
    fn test_into_provider_keeps_provider_errors() {
        let err = Error::Provider("no ticket".into()).into_provider();
        assert!(matches!(err, Error::Provider(ref m) if m == "no ticket"));

        let err = Error::InvalidState("bad".into()).into_provider();
        assert!(matches!(err, Error::Provider(_)));
    }
}
