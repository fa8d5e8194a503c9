//! Client configuration

use crate::protocol::messages::Smb2NegotiateRequest;
use crate::protocol::{SecurityMode, Smb2Capabilities, Smb2Dialect};
use uuid::Uuid;

/// SMB2 client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Client GUID
    pub client_guid: Uuid,
    /// Dialects offered in the negotiate request
    pub dialects: Vec<Smb2Dialect>,
    /// Security mode
    pub security_mode: SecurityMode,
    /// Capabilities advertised by the client
    pub capabilities: Smb2Capabilities,
    /// Credits requested on every request
    pub credit_request: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_guid: Uuid::new_v4(),
            dialects: vec![
                Smb2Dialect::Smb202,
                Smb2Dialect::Smb210,
                Smb2Dialect::Smb300,
                Smb2Dialect::Smb302,
            ],
            security_mode: SecurityMode::SIGNING_ENABLED,
            capabilities: Smb2Capabilities::DFS | Smb2Capabilities::LARGE_MTU,
            credit_request: 31,
        }
    }
}

impl ClientConfig {
    /// Build the negotiate request body for this configuration
    pub fn negotiate_request(&self) -> Smb2NegotiateRequest {
        Smb2NegotiateRequest {
            security_mode: self.security_mode,
            reserved: 0,
            capabilities: self.capabilities,
            client_guid: self.client_guid,
            client_start_time: 0,
            dialects: self.dialects.clone(),
        }
    }
}
