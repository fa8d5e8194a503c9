//! In-memory collaborators for driving the handshake without a socket
//!
//! [`ScriptedDispatcher`] replays a queue of canned responses and records every
//! packet sent to it. [`RecordingProvider`] hands out fixed tokens and records
//! each call together with the challenge it was given.

use crate::auth::{Credentials, TokenProvider};
use crate::error::{Error, Result};
use crate::protocol::messages::{
    Smb2ErrorResponse, Smb2NegotiateResponse, Smb2SessionSetupResponse,
};
use crate::protocol::{NtStatus, Packet, PacketBody, Smb2Command, Smb2Header};
use crate::transport::PacketDispatcher;
use async_trait::async_trait;
use std::collections::VecDeque;

/// Dispatcher answering from a fixed script
///
/// Once the script runs dry every receive fails with
/// [`Error::ConnectionClosed`].
#[derive(Debug, Default)]
pub struct ScriptedDispatcher {
    sent: Vec<Packet>,
    responses: VecDeque<Result<Packet>>,
    fail_sends: bool,
}

impl ScriptedDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response packet
    pub fn respond_with(mut self, packet: Packet) -> Self {
        self.responses.push_back(Ok(packet));
        self
    }

    /// Queue a receive failure
    pub fn fail_with(mut self, err: Error) -> Self {
        self.responses.push_back(Err(err));
        self
    }

    /// Make every send fail with a transport error
    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub fn sent(&self) -> &[Packet] {
        &self.sent
    }

    /// Responses not consumed yet
    pub fn pending(&self) -> usize {
        self.responses.len()
    }
}

#[async_trait]
impl PacketDispatcher for ScriptedDispatcher {
    async fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        if self.fail_sends {
            return Err(Error::Transport("scripted send failure".to_string()));
        }
        self.sent.push(packet.clone());
        Ok(())
    }

    async fn recv_packet(&mut self) -> Result<Packet> {
        self.responses
            .pop_front()
            .unwrap_or(Err(Error::ConnectionClosed))
    }
}

/// One call observed by a [`RecordingProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    NegotiateToken { username: String },
    AuthToken { username: String, challenge: Vec<u8> },
}

/// Token provider returning fixed tokens
#[derive(Debug, Clone)]
pub struct RecordingProvider {
    calls: Vec<ProviderCall>,
    negotiate_token: Vec<u8>,
    auth_token: Vec<u8>,
    session_key: Option<Vec<u8>>,
    fail_auth: bool,
}

impl Default for RecordingProvider {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            negotiate_token: b"NTLMSSP\0\x01\0\0\0".to_vec(),
            auth_token: b"NTLMSSP\0\x03\0\0\0".to_vec(),
            session_key: Some(vec![0x5a; 16]),
            fail_auth: false,
        }
    }
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider whose second step always fails
    pub fn failing() -> Self {
        Self {
            fail_auth: true,
            ..Self::default()
        }
    }

    pub fn with_session_key(mut self, key: Option<Vec<u8>>) -> Self {
        self.session_key = key;
        self
    }

    pub fn calls(&self) -> &[ProviderCall] {
        &self.calls
    }

    pub fn negotiate_token_bytes(&self) -> &[u8] {
        &self.negotiate_token
    }

    pub fn auth_token_bytes(&self) -> &[u8] {
        &self.auth_token
    }
}

impl TokenProvider for RecordingProvider {
    fn negotiate_token(&mut self, credentials: &Credentials) -> Result<Vec<u8>> {
        self.calls.push(ProviderCall::NegotiateToken {
            username: credentials.username.clone(),
        });
        Ok(self.negotiate_token.clone())
    }

    fn auth_token(&mut self, credentials: &Credentials, challenge: &[u8]) -> Result<Vec<u8>> {
        self.calls.push(ProviderCall::AuthToken {
            username: credentials.username.clone(),
            challenge: challenge.to_vec(),
        });
        if self.fail_auth {
            return Err(Error::Provider("challenge rejected".to_string()));
        }
        Ok(self.auth_token.clone())
    }

    fn session_key(&self) -> Option<Vec<u8>> {
        self.session_key.clone()
    }
}

/// Negotiate response packet with message ID 0
pub fn negotiate_response(body: Smb2NegotiateResponse) -> Packet {
    Packet::new(
        Smb2Header::response(Smb2Command::Negotiate, NtStatus::Success),
        PacketBody::NegotiateResponse(body),
    )
}

/// SessionSetup response carrying `status`
///
/// Error statuses get an ERROR body, as a server would send.
pub fn session_setup_response(status: NtStatus, session_id: u64, message_id: u64) -> Packet {
    let mut header = Smb2Header::response(Smb2Command::SessionSetup, status);
    header.session_id = session_id;
    header.message_id = message_id;

    let body = if status.is_error() && status != NtStatus::MoreProcessingRequired {
        PacketBody::Error(Smb2ErrorResponse::default())
    } else {
        PacketBody::SessionSetupResponse(Smb2SessionSetupResponse::new())
    };
    Packet::new(header, body)
}

/// MORE_PROCESSING_REQUIRED response carrying a challenge blob
pub fn challenge_response(session_id: u64, message_id: u64, blob: Vec<u8>) -> Packet {
    let mut header = Smb2Header::response(
        Smb2Command::SessionSetup,
        NtStatus::MoreProcessingRequired,
    );
    header.session_id = session_id;
    header.message_id = message_id;
    Packet::new(
        header,
        PacketBody::SessionSetupResponse(Smb2SessionSetupResponse::new().with_security_blob(blob)),
    )
}
