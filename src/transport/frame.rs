//! Direct-TCP session framing
//!
//! Every SMB2 message on port 445 is prefixed by a 4-byte NetBIOS session
//! service header: one type byte (0x00 for a session message) followed by a
//! 24-bit big-endian length.

use crate::error::{Error, Result};
use bytes::{BufMut, BytesMut};

/// Largest frame we are willing to buffer (8 MB)
pub const MAX_FRAME_SIZE: usize = 8 * 1024 * 1024;

/// Largest length the 24-bit field can carry
const MAX_LENGTH_FIELD: usize = 0x00FF_FFFF;

/// Session service message types seen on a direct-TCP connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    SessionMessage = 0x00,
    Keepalive = 0x85,
}

impl TryFrom<u8> for FrameType {
    type Error = Error;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0x00 => Ok(FrameType::SessionMessage),
            0x85 => Ok(FrameType::Keepalive),
            _ => Err(Error::Transport(format!(
                "unexpected session service frame type: 0x{:02x}",
                value
            ))),
        }
    }
}

/// Session service frame header (4 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub frame_type: FrameType,
    pub length: usize,
}

impl FrameHeader {
    /// Header size in bytes
    pub const SIZE: usize = 4;

    /// Parse a frame header from bytes
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(Error::BufferTooSmall {
                need: Self::SIZE,
                have: buf.len(),
            });
        }

        let frame_type = FrameType::try_from(buf[0])?;
        let length = ((buf[1] as usize) << 16) | ((buf[2] as usize) << 8) | (buf[3] as usize);

        if length > MAX_FRAME_SIZE {
            return Err(Error::Transport(format!(
                "frame too large: {} bytes",
                length
            )));
        }

        Ok(Self { frame_type, length })
    }
}

/// Prefix an encoded packet with a session message header
pub fn encode_frame(payload: &[u8]) -> Result<BytesMut> {
    if payload.len() > MAX_LENGTH_FIELD {
        return Err(Error::Transport(format!(
            "packet of {} bytes does not fit in a session frame",
            payload.len()
        )));
    }

    let mut buf = BytesMut::with_capacity(FrameHeader::SIZE + payload.len());
    buf.put_u8(FrameType::SessionMessage as u8);
    buf.put_u8(((payload.len() >> 16) & 0xFF) as u8);
    buf.put_u8(((payload.len() >> 8) & 0xFF) as u8);
    buf.put_u8((payload.len() & 0xFF) as u8);
    buf.put_slice(payload);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_roundtrip() {
        let payload = b"\xfeSMB payload".to_vec();
        let frame = encode_frame(&payload).unwrap();

        let header = FrameHeader::parse(&frame).unwrap();
        assert_eq!(header.frame_type, FrameType::SessionMessage);
        assert_eq!(header.length, payload.len());
        assert_eq!(&frame[FrameHeader::SIZE..], payload.as_slice());
    }

    #[test]
    fn test_24_bit_length() {
        let header = FrameHeader::parse(&[0x00, 0x01, 0x00, 0x00]).unwrap();
        assert_eq!(header.length, 0x10000);
    }

    #[test]
    fn test_keepalive_frame() {
        let header = FrameHeader::parse(&[0x85, 0, 0, 0]).unwrap();
        assert_eq!(header.frame_type, FrameType::Keepalive);
        assert_eq!(header.length, 0);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        assert!(FrameHeader::parse(&[0x00, 0xFF, 0xFF, 0xFF]).is_err());
    }

    #[test]
    fn test_bad_frame_type() {
        let err = FrameHeader::parse(&[0x81, 0, 0, 4]).unwrap_err();
        assert!(err.is_transport());
    }
}
