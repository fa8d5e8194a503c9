//! Whole SMB2 packets: header plus a body selected by command code

use super::header::Smb2Header;
use super::messages::{
    Smb2ErrorResponse, Smb2NegotiateRequest, Smb2NegotiateResponse, Smb2SessionSetupRequest,
    Smb2SessionSetupResponse, SmbMessage,
};
use super::smb2_constants::{header_offsets, Smb2Command};
use super::status::NtStatus;
use crate::error::{Error, Result};

/// Body of an SMB2 packet
///
/// Commands outside the handshake decode to [`PacketBody::Generic`] with the raw
/// body bytes, so a packet never fails to decode just because of its command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketBody {
    NegotiateRequest(Smb2NegotiateRequest),
    NegotiateResponse(Smb2NegotiateResponse),
    SessionSetupRequest(Smb2SessionSetupRequest),
    SessionSetupResponse(Smb2SessionSetupResponse),
    Error(Smb2ErrorResponse),
    Generic(Vec<u8>),
}

impl PacketBody {
    /// Decode `body` according to the header's command, direction and status
    pub fn decode(header: &Smb2Header, body: &[u8]) -> Result<Self> {
        let status = header.nt_status();
        if header.is_response() && status.is_error() && status != NtStatus::MoreProcessingRequired
        {
            return Ok(PacketBody::Error(Smb2ErrorResponse::parse(body)?));
        }

        let decoded = match (header.command, header.is_response()) {
            (Smb2Command::Negotiate, false) => {
                PacketBody::NegotiateRequest(Smb2NegotiateRequest::parse(body)?)
            }
            (Smb2Command::Negotiate, true) => {
                PacketBody::NegotiateResponse(Smb2NegotiateResponse::parse(body)?)
            }
            (Smb2Command::SessionSetup, false) => {
                PacketBody::SessionSetupRequest(Smb2SessionSetupRequest::parse(body)?)
            }
            (Smb2Command::SessionSetup, true) => {
                PacketBody::SessionSetupResponse(Smb2SessionSetupResponse::parse(body)?)
            }
            _ => PacketBody::Generic(body.to_vec()),
        };
        Ok(decoded)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        match self {
            PacketBody::NegotiateRequest(body) => body.serialize(),
            PacketBody::NegotiateResponse(body) => body.serialize(),
            PacketBody::SessionSetupRequest(body) => body.serialize(),
            PacketBody::SessionSetupResponse(body) => body.serialize(),
            PacketBody::Error(body) => body.serialize(),
            PacketBody::Generic(bytes) => Ok(bytes.clone()),
        }
    }

    /// Short name for log lines
    pub fn name(&self) -> &'static str {
        match self {
            PacketBody::NegotiateRequest(_) => "NegotiateRequest",
            PacketBody::NegotiateResponse(_) => "NegotiateResponse",
            PacketBody::SessionSetupRequest(_) => "SessionSetupRequest",
            PacketBody::SessionSetupResponse(_) => "SessionSetupResponse",
            PacketBody::Error(_) => "ErrorResponse",
            PacketBody::Generic(_) => "Generic",
        }
    }
}

/// A single SMB2 message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Smb2Header,
    pub body: PacketBody,
}

impl Packet {
    pub fn new(header: Smb2Header, body: PacketBody) -> Self {
        Self { header, body }
    }

    /// Encode header and body into wire bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = self.header.serialize()?;
        buf.extend_from_slice(&self.body.serialize()?);
        Ok(buf)
    }

    /// Decode the first message in `buf`
    ///
    /// For compounded responses only the first message is decoded; the body is
    /// bounded by `NextCommand`.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let header = Smb2Header::parse(buf)?;

        let end = if header.next_command == 0 {
            buf.len()
        } else {
            let next = header.next_command as usize;
            if next < Smb2Header::SIZE || next > buf.len() {
                return Err(Error::malformed(
                    "next_command",
                    header_offsets::NEXT_COMMAND,
                    format!("next command offset {} outside {} byte packet", next, buf.len()),
                ));
            }
            next
        };

        let body = PacketBody::decode(&header, &buf[Smb2Header::SIZE..end])?;
        Ok(Self { header, body })
    }

    pub fn command(&self) -> Smb2Command {
        self.header.command
    }

    /// Translated header status
    pub fn status(&self) -> NtStatus {
        self.header.nt_status()
    }
}
