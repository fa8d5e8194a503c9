//! Two-leg SMB2 session setup
//!
//! Leg one sends the provider's initial token and treats whatever comes back as
//! the challenge, whatever its status. Leg two sends the provider's answer to
//! that challenge; only the status of this second response decides the outcome.

use super::config::ClientConfig;
use super::exchange;
use crate::auth::{Credentials, TokenProvider};
use crate::error::{Error, Result};
use crate::protocol::messages::Smb2SessionSetupRequest;
use crate::protocol::smb2_constants::SessionSetupRequestFlags;
use crate::protocol::{
    NtStatus, Packet, PacketBody, SessionFlags, Smb2Capabilities, Smb2Command, Smb2Header,
};
use crate::transport::PacketDispatcher;
use tracing::debug;

/// Result of a completed session-setup exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSetupOutcome {
    /// Translated status of the final response
    pub status: NtStatus,
    /// Session ID from the final response header, on success only
    pub session_id: Option<u64>,
    pub session_flags: SessionFlags,
    /// Session key from the provider, on success only
    pub session_key: Option<Vec<u8>>,
}

/// Drives one session-setup exchange over a borrowed dispatcher and provider
///
/// The sequence counter is borrowed from the caller and advanced as each
/// request is built, so it never falls behind a message ID already handed to
/// the dispatcher, even when the exchange fails partway.
pub struct AuthenticationSequencer<'a, D: ?Sized, P: ?Sized> {
    dispatcher: &'a mut D,
    provider: &'a mut P,
    credentials: &'a Credentials,
    config: &'a ClientConfig,
    sequence_number: &'a mut u64,
    session_id: u64,
}

impl<'a, D, P> AuthenticationSequencer<'a, D, P>
where
    D: PacketDispatcher + ?Sized,
    P: TokenProvider + ?Sized,
{
    pub fn new(
        dispatcher: &'a mut D,
        provider: &'a mut P,
        credentials: &'a Credentials,
        config: &'a ClientConfig,
        sequence_number: &'a mut u64,
    ) -> Self {
        Self {
            dispatcher,
            provider,
            credentials,
            config,
            sequence_number,
            session_id: 0,
        }
    }

    pub fn sequence_number(&self) -> u64 {
        *self.sequence_number
    }

    /// Session ID the server assigned in the challenge response
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Run both legs and translate the final status
    pub async fn run(mut self) -> Result<SessionSetupOutcome> {
        let challenge = self.negotiate_step().await?;
        let response = self.auth_step(&challenge).await?;

        let status = response.status();
        let session_flags = match &response.body {
            PacketBody::SessionSetupResponse(body) => body.session_flags,
            _ => SessionFlags::empty(),
        };

        let (session_id, session_key) = if status == NtStatus::Success {
            (Some(response.header.session_id), self.provider.session_key())
        } else {
            (None, None)
        };

        debug!("Session setup finished with {}", status);

        Ok(SessionSetupOutcome {
            status,
            session_id,
            session_flags,
            session_key,
        })
    }

    /// First leg: send the initial token and return the challenge packet
    pub async fn negotiate_step(&mut self) -> Result<Packet> {
        let token = self
            .provider
            .negotiate_token(self.credentials)
            .map_err(Error::into_provider)?;

        let request = self.session_setup_request(token);
        let challenge = exchange(&mut *self.dispatcher, &request).await?;

        self.session_id = challenge.header.session_id;
        debug!(
            "Challenge received with {} (session 0x{:016x})",
            challenge.status(),
            self.session_id
        );

        Ok(challenge)
    }

    /// Second leg: answer the challenge and return the final response packet
    pub async fn auth_step(&mut self, challenge: &Packet) -> Result<Packet> {
        let challenge_blob: &[u8] = match &challenge.body {
            PacketBody::SessionSetupResponse(body) => &body.security_blob,
            other => {
                debug!("Challenge carried a {} body, no security buffer", other.name());
                &[]
            }
        };

        let token = self
            .provider
            .auth_token(self.credentials, challenge_blob)
            .map_err(Error::into_provider)?;

        let request = self.session_setup_request(token);
        exchange(&mut *self.dispatcher, &request).await
    }

    fn session_setup_request(&mut self, token: Vec<u8>) -> Packet {
        let message_id = *self.sequence_number + 1;
        *self.sequence_number = message_id;

        let mut header = Smb2Header::new(Smb2Command::SessionSetup);
        header.message_id = message_id;
        header.credits = self.config.credit_request;
        header.session_id = self.session_id;

        let body = Smb2SessionSetupRequest {
            flags: SessionSetupRequestFlags::empty(),
            security_mode: self.config.security_mode,
            // Only DFS is defined for SessionSetup
            capabilities: self.config.capabilities & Smb2Capabilities::DFS,
            channel: 0,
            previous_session_id: 0,
            security_blob: token,
        };

        Packet::new(header, PacketBody::SessionSetupRequest(body))
    }
}
