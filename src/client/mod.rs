//! SMB2 client handshake
//!
//! [`Client`] runs the negotiate exchange followed by the two-leg session
//! setup over any [`PacketDispatcher`], delegating security tokens to a
//! [`TokenProvider`]. State only moves forward:
//!
//! ```text
//! Initial --negotiate--> Negotiated --authenticate--> Authenticated
//!                                   \--------------> AuthenticationFailed
//! ```
//!
//! A fault (transport, decode, provider) leaves the state where it was before
//! the failing call. The sequence counter still moves past every message ID
//! already handed to the dispatcher, so a retry never reuses one.

use crate::auth::{Credentials, TokenProvider};
use crate::error::{Error, Result};
use crate::protocol::messages::Smb2NegotiateResponse;
use crate::protocol::smb2_constants::header_offsets;
use crate::protocol::{
    NtStatus, Packet, PacketBody, SessionFlags, Smb2Capabilities, Smb2Command, Smb2Dialect,
    Smb2Header,
};
use crate::transport::PacketDispatcher;
use tracing::{debug, info, warn};

pub mod capabilities;
pub mod config;
pub mod session_setup;

pub use capabilities::{negotiate_parameters, NegotiatedParameters};
pub use config::ClientConfig;
pub use session_setup::{AuthenticationSequencer, SessionSetupOutcome};

/// Handshake progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Initial,
    Negotiated,
    Authenticated,
    AuthenticationFailed,
}

/// SMB2 handshake client
pub struct Client<D, P> {
    dispatcher: D,
    provider: P,
    config: ClientConfig,
    credentials: Credentials,
    state: ClientState,
    sequence_number: Option<u64>,
    negotiated: Option<NegotiatedParameters>,
    session_id: Option<u64>,
    session_key: Option<Vec<u8>>,
    session_flags: SessionFlags,
}

impl<D: PacketDispatcher, P: TokenProvider> Client<D, P> {
    /// Create a client with default configuration
    pub fn new(
        dispatcher: D,
        provider: P,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::with_config(
            dispatcher,
            provider,
            Credentials::new(username, password),
            ClientConfig::default(),
        )
    }

    pub fn with_config(
        dispatcher: D,
        provider: P,
        credentials: Credentials,
        config: ClientConfig,
    ) -> Self {
        Self {
            dispatcher,
            provider,
            config,
            credentials,
            state: ClientState::Initial,
            sequence_number: None,
            negotiated: None,
            session_id: None,
            session_key: None,
            session_flags: SessionFlags::empty(),
        }
    }

    /// Negotiate dialect and capabilities with the server
    ///
    /// The request always uses message ID 0. On success the sequence counter
    /// starts at 0 and the server's capabilities are recorded verbatim.
    pub async fn negotiate(&mut self) -> Result<Smb2NegotiateResponse> {
        if self.state != ClientState::Initial {
            return Err(Error::InvalidState(format!(
                "negotiate called in state {:?}",
                self.state
            )));
        }

        let mut header = Smb2Header::new(Smb2Command::Negotiate);
        header.message_id = 0;
        header.credits = self.config.credit_request;
        let request = Packet::new(
            header,
            PacketBody::NegotiateRequest(self.config.negotiate_request()),
        );

        debug!("Offering dialects {:?}", self.config.dialects);
        let response = exchange(&mut self.dispatcher, &request).await?;

        let body = match response.body {
            PacketBody::NegotiateResponse(body) => body,
            PacketBody::Error(_) => {
                return Err(Error::Rejected {
                    command: Smb2Command::Negotiate,
                    status: response.header.nt_status(),
                })
            }
            other => {
                return Err(Error::malformed(
                    "command",
                    header_offsets::COMMAND,
                    format!("expected NegotiateResponse, got {}", other.name()),
                ))
            }
        };

        let params = negotiate_parameters(&body);
        info!(
            "Negotiated {} with capabilities {:?}",
            params.dialect, params.capabilities
        );
        if params.signing_required() {
            debug!("Server requires signing");
        }

        self.negotiated = Some(params);
        self.sequence_number = Some(0);
        self.state = ClientState::Negotiated;

        Ok(body)
    }

    /// Run the two-leg session setup
    ///
    /// Returns the status of the final response. Only `Success` moves the
    /// client to [`ClientState::Authenticated`]; every other status, known or
    /// not, is terminal.
    pub async fn authenticate(&mut self) -> Result<NtStatus> {
        if self.state != ClientState::Negotiated {
            return Err(Error::InvalidState(format!(
                "authenticate called in state {:?}",
                self.state
            )));
        }
        let sequence_number = self
            .sequence_number
            .as_mut()
            .ok_or_else(|| Error::InvalidState("sequence number not initialised".to_string()))?;

        info!("Authenticating as {}", self.credentials.username);
        // The counter advances even if the exchange fails; state does not
        let outcome = AuthenticationSequencer::new(
            &mut self.dispatcher,
            &mut self.provider,
            &self.credentials,
            &self.config,
            sequence_number,
        )
        .run()
        .await?;

        if outcome.status == NtStatus::Success {
            self.state = ClientState::Authenticated;
            self.session_id = outcome.session_id;
            self.session_key = outcome.session_key;
            self.session_flags = outcome.session_flags;
            info!(
                "Session established (id 0x{:016x}, flags {:?})",
                self.session_id.unwrap_or_default(),
                self.session_flags
            );
        } else {
            self.state = ClientState::AuthenticationFailed;
            if outcome.status.is_unknown() {
                warn!("Session setup ended with unrecognised status {}", outcome.status);
            } else {
                warn!("Authentication failed: {}", outcome.status);
            }
        }

        Ok(outcome.status)
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == ClientState::Authenticated
    }

    /// Message ID of the most recent request, once negotiated
    pub fn sequence_number(&self) -> Option<u64> {
        self.sequence_number
    }

    /// Message ID the next request will carry
    pub fn message_id(&self) -> Option<u64> {
        self.sequence_number.map(|seq| seq + 1)
    }

    /// Server capabilities from the negotiate response
    pub fn capabilities(&self) -> Option<Smb2Capabilities> {
        self.negotiated.as_ref().map(|params| params.capabilities)
    }

    pub fn dialect(&self) -> Option<Smb2Dialect> {
        self.negotiated.as_ref().map(|params| params.dialect)
    }

    pub fn negotiated(&self) -> Option<&NegotiatedParameters> {
        self.negotiated.as_ref()
    }

    pub fn session_id(&self) -> Option<u64> {
        self.session_id
    }

    pub fn session_key(&self) -> Option<&[u8]> {
        self.session_key.as_deref()
    }

    pub fn session_flags(&self) -> SessionFlags {
        self.session_flags
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Give back the dispatcher and provider
    pub fn into_parts(self) -> (D, P) {
        (self.dispatcher, self.provider)
    }
}

/// Send one request and wait for its response
pub(crate) async fn exchange<D>(dispatcher: &mut D, request: &Packet) -> Result<Packet>
where
    D: PacketDispatcher + ?Sized,
{
    debug!(
        "Sending {} (message {})",
        request.body.name(),
        request.header.message_id
    );
    dispatcher.send_packet(request).await?;

    let response = dispatcher.recv_packet().await?;
    if response.header.message_id != request.header.message_id {
        warn!(
            "Response message ID {} does not match request {}",
            response.header.message_id, request.header.message_id
        );
    }
    debug!("Received {} with {}", response.body.name(), response.status());

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::Smb2SessionSetupResponse;
    use crate::protocol::SecurityMode;
    use crate::testing::{
        challenge_response, negotiate_response, session_setup_response, ProviderCall,
        RecordingProvider, ScriptedDispatcher,
    };

    type TestClient = Client<ScriptedDispatcher, RecordingProvider>;

    fn client(dispatcher: ScriptedDispatcher) -> TestClient {
        Client::new(dispatcher, RecordingProvider::new(), "administrator", "P@ssword1")
    }

    fn negotiated_script() -> ScriptedDispatcher {
        ScriptedDispatcher::new().respond_with(negotiate_response(Smb2NegotiateResponse::default()))
    }

    #[tokio::test]
    async fn test_negotiate_default_response() {
        let mut client = client(negotiated_script());
        assert_eq!(client.state(), ClientState::Initial);
        assert_eq!(client.sequence_number(), None);
        assert_eq!(client.capabilities(), None);

        client.negotiate().await.unwrap();

        assert_eq!(client.state(), ClientState::Negotiated);
        assert_eq!(client.sequence_number(), Some(0));
        assert_eq!(client.message_id(), Some(1));
        assert_eq!(client.capabilities(), Some(Smb2Capabilities::empty()));
    }

    #[tokio::test]
    async fn test_negotiate_request_contents() {
        let mut client = client(negotiated_script());
        client.negotiate().await.unwrap();

        let sent = client.dispatcher().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header.message_id, 0);
        assert_eq!(sent[0].header.credits, 31);
        match &sent[0].body {
            PacketBody::NegotiateRequest(body) => {
                assert_eq!(body.dialects, client.config().dialects);
                assert_eq!(body.client_guid, client.config().client_guid);
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_negotiate_records_server_parameters() {
        let mut body = Smb2NegotiateResponse::new(Smb2Dialect::Smb302);
        body.capabilities = Smb2Capabilities::DFS | Smb2Capabilities::LEASING;
        body.security_mode = SecurityMode::SIGNING_ENABLED | SecurityMode::SIGNING_REQUIRED;
        body.max_read_size = 65536;
        let dispatcher = ScriptedDispatcher::new().respond_with(negotiate_response(body.clone()));

        let mut client = client(dispatcher);
        let response = client.negotiate().await.unwrap();

        assert_eq!(response, body);
        assert_eq!(client.dialect(), Some(Smb2Dialect::Smb302));
        assert_eq!(
            client.capabilities(),
            Some(Smb2Capabilities::DFS | Smb2Capabilities::LEASING)
        );
        let params = client.negotiated().unwrap();
        assert!(params.signing_required());
        assert_eq!(params.max_read_size, 65536);
    }

    #[tokio::test]
    async fn test_negotiate_transport_failure_keeps_initial_state() {
        let mut client = client(ScriptedDispatcher::new());

        let err = client.negotiate().await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(client.state(), ClientState::Initial);
        assert_eq!(client.sequence_number(), None);
        assert_eq!(client.capabilities(), None);
    }

    #[tokio::test]
    async fn test_negotiate_send_failure() {
        let mut client = client(ScriptedDispatcher::new().failing_sends());
        assert!(matches!(
            client.negotiate().await.unwrap_err(),
            Error::Transport(_)
        ));
        assert_eq!(client.state(), ClientState::Initial);
    }

    #[tokio::test]
    async fn test_negotiate_rejected_by_server() {
        let mut header = Smb2Header::response(Smb2Command::Negotiate, NtStatus::NotSupported);
        header.message_id = 0;
        let dispatcher = ScriptedDispatcher::new().respond_with(Packet::new(
            header,
            PacketBody::Error(Default::default()),
        ));

        let mut client = client(dispatcher);
        let err = client.negotiate().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Rejected {
                command: Smb2Command::Negotiate,
                status: NtStatus::NotSupported
            }
        ));
        assert_eq!(client.state(), ClientState::Initial);
    }

    #[tokio::test]
    async fn test_negotiate_wrong_response_command() {
        let dispatcher =
            ScriptedDispatcher::new().respond_with(session_setup_response(NtStatus::Success, 0, 0));
        let mut client = client(dispatcher);

        let err = client.negotiate().await.unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(client.state(), ClientState::Initial);
    }

    #[tokio::test]
    async fn test_negotiate_twice_is_rejected() {
        let mut client = client(negotiated_script());
        client.negotiate().await.unwrap();

        let err = client.negotiate().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(client.dispatcher().sent().len(), 1);
        assert_eq!(client.state(), ClientState::Negotiated);
    }

    #[tokio::test]
    async fn test_authenticate_before_negotiate() {
        let mut client = client(ScriptedDispatcher::new());
        let err = client.authenticate().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert!(client.dispatcher().sent().is_empty());
        assert!(client.provider().calls().is_empty());
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let dispatcher = negotiated_script()
            .respond_with(challenge_response(0x4000_0001, 1, b"NTLMSSP\0\x02".to_vec()))
            .respond_with(session_setup_response(NtStatus::Success, 0x4000_0001, 2));
        let mut client = client(dispatcher);
        client.negotiate().await.unwrap();

        let status = client.authenticate().await.unwrap();

        assert_eq!(status, NtStatus::Success);
        assert_eq!(client.state(), ClientState::Authenticated);
        assert!(client.is_authenticated());
        assert_eq!(client.session_id(), Some(0x4000_0001));
        assert_eq!(client.session_key(), Some(&[0x5a; 16][..]));
        assert_eq!(client.sequence_number(), Some(2));

        let sent = client.dispatcher().sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1].header.message_id, 1);
        assert_eq!(sent[2].header.message_id, 2);
        assert_eq!(sent[2].header.session_id, 0x4000_0001);
        match &sent[2].body {
            PacketBody::SessionSetupRequest(body) => {
                assert_eq!(body.security_blob, client.provider().auth_token_bytes())
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_authenticate_with_default_responses() {
        // Minimal default-initialised responses, message IDs left at 0
        let dispatcher = negotiated_script()
            .respond_with(session_setup_response(NtStatus::Success, 0, 0))
            .respond_with(session_setup_response(NtStatus::Success, 0, 0));
        let mut client = client(dispatcher);
        client.negotiate().await.unwrap();

        assert_eq!(client.authenticate().await.unwrap(), NtStatus::Success);
        assert_eq!(client.state(), ClientState::Authenticated);
    }

    #[tokio::test]
    async fn test_authenticate_records_session_flags() {
        let mut last = session_setup_response(NtStatus::Success, 7, 2);
        last.body = PacketBody::SessionSetupResponse(Smb2SessionSetupResponse {
            session_flags: SessionFlags::IS_GUEST,
            security_blob: Vec::new(),
        });
        let dispatcher = negotiated_script()
            .respond_with(challenge_response(7, 1, Vec::new()))
            .respond_with(last);
        let mut client = client(dispatcher);
        client.negotiate().await.unwrap();
        client.authenticate().await.unwrap();

        assert_eq!(client.session_flags(), SessionFlags::IS_GUEST);
    }

    #[tokio::test]
    async fn test_authenticate_logon_failure() {
        let dispatcher = negotiated_script()
            .respond_with(challenge_response(0x11, 1, Vec::new()))
            .respond_with(Packet {
                header: Smb2Header {
                    status: 0xC000006D,
                    message_id: 2,
                    ..Smb2Header::response(Smb2Command::SessionSetup, NtStatus::Success)
                },
                body: PacketBody::Error(Default::default()),
            });
        let mut client = client(dispatcher);
        client.negotiate().await.unwrap();

        let status = client.authenticate().await.unwrap();

        assert_eq!(status, NtStatus::LogonFailure);
        assert!(status.is_logon_failure());
        assert_eq!(client.state(), ClientState::AuthenticationFailed);
        assert_eq!(client.session_id(), None);
        assert_eq!(client.session_key(), None);
        assert_eq!(client.sequence_number(), Some(2));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_status() {
        let dispatcher = negotiated_script()
            .respond_with(challenge_response(0x11, 1, Vec::new()))
            .respond_with(session_setup_response(NtStatus::from_u32(0xC0DE_0001), 0x11, 2));
        let mut client = client(dispatcher);
        client.negotiate().await.unwrap();

        let status = client.authenticate().await.unwrap();

        assert_eq!(status, NtStatus::Unknown(0xC0DE_0001));
        assert_eq!(status.to_u32(), 0xC0DE_0001);
        assert_eq!(client.state(), ClientState::AuthenticationFailed);
    }

    #[tokio::test]
    async fn test_authenticate_after_failure_is_rejected() {
        let dispatcher = negotiated_script()
            .respond_with(challenge_response(0x11, 1, Vec::new()))
            .respond_with(session_setup_response(NtStatus::AccessDenied, 0x11, 2));
        let mut client = client(dispatcher);
        client.negotiate().await.unwrap();
        client.authenticate().await.unwrap();

        let err = client.authenticate().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(client.dispatcher().sent().len(), 3);
    }

    #[tokio::test]
    async fn test_authenticate_calls_provider_in_order() {
        let dispatcher = negotiated_script()
            .respond_with(challenge_response(0x11, 1, b"challenge".to_vec()))
            .respond_with(session_setup_response(NtStatus::Success, 0x11, 2));
        let mut client = client(dispatcher);
        client.negotiate().await.unwrap();
        client.authenticate().await.unwrap();

        assert_eq!(
            client.provider().calls(),
            &[
                ProviderCall::NegotiateToken {
                    username: "administrator".into()
                },
                ProviderCall::AuthToken {
                    username: "administrator".into(),
                    challenge: b"challenge".to_vec()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_authenticate_transport_failure_keeps_negotiated_state() {
        let dispatcher =
            negotiated_script().respond_with(challenge_response(0x11, 1, Vec::new()));
        let mut client = client(dispatcher);
        client.negotiate().await.unwrap();

        let err = client.authenticate().await.unwrap_err();

        assert!(err.is_transport());
        assert_eq!(client.state(), ClientState::Negotiated);
        // Both session-setup requests reached the dispatcher
        assert_eq!(client.sequence_number(), Some(2));
        assert_eq!(client.session_id(), None);
    }

    #[tokio::test]
    async fn test_authenticate_provider_failure_keeps_negotiated_state() {
        let dispatcher =
            negotiated_script().respond_with(challenge_response(0x11, 1, Vec::new()));
        let mut client = Client::new(
            dispatcher,
            RecordingProvider::failing(),
            "administrator",
            "P@ssword1",
        );
        client.negotiate().await.unwrap();

        let err = client.authenticate().await.unwrap_err();

        assert!(matches!(err, Error::Provider(_)));
        assert_eq!(client.state(), ClientState::Negotiated);
        assert_eq!(client.sequence_number(), Some(1));
        assert_eq!(client.message_id(), Some(2));
    }

    #[tokio::test]
    async fn test_retry_after_provider_failure_uses_fresh_message_ids() {
        let dispatcher = negotiated_script()
            .respond_with(challenge_response(0x11, 1, Vec::new()))
            .respond_with(challenge_response(0x12, 2, Vec::new()));
        let mut client = Client::new(
            dispatcher,
            RecordingProvider::failing(),
            "administrator",
            "P@ssword1",
        );
        client.negotiate().await.unwrap();

        assert!(client.authenticate().await.is_err());
        assert!(client.authenticate().await.is_err());

        let ids: Vec<u64> = client
            .dispatcher()
            .sent()
            .iter()
            .map(|packet| packet.header.message_id)
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(client.sequence_number(), Some(2));
    }

    #[tokio::test]
    async fn test_retry_after_transport_failure_succeeds() {
        let dispatcher = negotiated_script()
            .respond_with(challenge_response(0x11, 1, Vec::new()))
            .fail_with(Error::ConnectionClosed)
            .respond_with(challenge_response(0x22, 3, Vec::new()))
            .respond_with(session_setup_response(NtStatus::Success, 0x22, 4));
        let mut client = client(dispatcher);
        client.negotiate().await.unwrap();

        assert!(client.authenticate().await.unwrap_err().is_transport());
        assert_eq!(client.authenticate().await.unwrap(), NtStatus::Success);

        let ids: Vec<u64> = client
            .dispatcher()
            .sent()
            .iter()
            .map(|packet| packet.header.message_id)
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(client.session_id(), Some(0x22));
        assert_eq!(client.state(), ClientState::Authenticated);
    }

    #[tokio::test]
    async fn test_success_without_session_key() {
        let dispatcher = negotiated_script()
            .respond_with(challenge_response(0x11, 1, Vec::new()))
            .respond_with(session_setup_response(NtStatus::Success, 0x11, 2));
        let mut client = Client::new(
            dispatcher,
            RecordingProvider::new().with_session_key(None),
            "guest",
            "",
        );
        client.negotiate().await.unwrap();

        assert_eq!(client.authenticate().await.unwrap(), NtStatus::Success);
        assert_eq!(client.session_key(), None);
        assert_eq!(client.session_id(), Some(0x11));
    }

    #[tokio::test]
    async fn test_client_over_borrowed_collaborators() {
        let mut dispatcher = negotiated_script()
            .respond_with(challenge_response(0x11, 1, Vec::new()))
            .respond_with(session_setup_response(NtStatus::Success, 0x11, 2));
        let mut provider = RecordingProvider::new();

        {
            let mut client = Client::new(&mut dispatcher, &mut provider, "administrator", "pw");
            client.negotiate().await.unwrap();
            client.authenticate().await.unwrap();
        }

        assert_eq!(dispatcher.sent().len(), 3);
        assert_eq!(dispatcher.pending(), 0);
        assert_eq!(provider.calls().len(), 2);
    }
}
