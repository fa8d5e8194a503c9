//! Interpretation of the server's negotiate response

use crate::protocol::messages::Smb2NegotiateResponse;
use crate::protocol::{SecurityMode, Smb2Capabilities, Smb2Dialect};
use uuid::Uuid;

/// Parameters fixed by a successful negotiate
///
/// Every value is copied verbatim from the server's response. No downgrade or
/// intersection with the client's own capabilities is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedParameters {
    pub dialect: Smb2Dialect,
    pub capabilities: Smb2Capabilities,
    pub security_mode: SecurityMode,
    pub server_guid: Uuid,
    pub max_transact_size: u32,
    pub max_read_size: u32,
    pub max_write_size: u32,
    /// Server's initial security blob (usually a SPNEGO mechanism list)
    pub security_blob: Vec<u8>,
}

impl NegotiatedParameters {
    /// Server requires every message to be signed
    pub fn signing_required(&self) -> bool {
        self.security_mode.contains(SecurityMode::SIGNING_REQUIRED)
    }

    pub fn supports(&self, capability: Smb2Capabilities) -> bool {
        self.capabilities.contains(capability)
    }
}

/// Extract the negotiated parameters from a negotiate response
pub fn negotiate_parameters(response: &Smb2NegotiateResponse) -> NegotiatedParameters {
    NegotiatedParameters {
        dialect: response.dialect_revision,
        capabilities: response.capabilities,
        security_mode: response.security_mode,
        server_guid: response.server_guid,
        max_transact_size: response.max_transact_size,
        max_read_size: response.max_read_size,
        max_write_size: response.max_write_size,
        security_blob: response.security_blob.clone(),
    }
}
