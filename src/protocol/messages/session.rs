//! SMB2 Session Setup messages

use super::common::{
    ensure_len, read_security_buffer, read_structure_size, wire_len_u16, SmbMessage,
};
use crate::error::Result;
use crate::protocol::smb2_constants::{
    structure_size, SecurityMode, SessionFlags, SessionSetupRequestFlags, Smb2Capabilities,
    SMB2_HEADER_SIZE,
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Write};

const SESSION_SETUP_REQUEST_FIXED: usize = 24;
const SESSION_SETUP_RESPONSE_FIXED: usize = 8;

/// SMB2 SessionSetup Request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Smb2SessionSetupRequest {
    pub flags: SessionSetupRequestFlags,
    pub security_mode: SecurityMode,
    pub capabilities: Smb2Capabilities,
    pub channel: u32,
    pub previous_session_id: u64,
    pub security_blob: Vec<u8>,
}

impl Default for Smb2SessionSetupRequest {
    fn default() -> Self {
        Self {
            flags: SessionSetupRequestFlags::empty(),
            security_mode: SecurityMode::SIGNING_ENABLED,
            capabilities: Smb2Capabilities::DFS,
            channel: 0,
            previous_session_id: 0,
            security_blob: Vec::new(),
        }
    }
}

impl Smb2SessionSetupRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_security_blob(mut self, blob: Vec<u8>) -> Self {
        self.security_blob = blob;
        self
    }
}

impl SmbMessage for Smb2SessionSetupRequest {
    fn parse(buf: &[u8]) -> Result<Self> {
        ensure_len(buf, SESSION_SETUP_REQUEST_FIXED)?;

        let mut cursor = io::Cursor::new(buf);
        read_structure_size(
            &mut cursor,
            structure_size::SESSION_SETUP_REQUEST,
            "SessionSetup request",
        )?;

        let flags = SessionSetupRequestFlags::from_bits_retain(cursor.read_u8()?);
        let security_mode = SecurityMode::from_bits_retain(cursor.read_u8()? as u16);
        let capabilities = Smb2Capabilities::from_bits_retain(cursor.read_u32::<LittleEndian>()?);
        let channel = cursor.read_u32::<LittleEndian>()?;
        let security_buffer_offset = cursor.read_u16::<LittleEndian>()?;
        let security_buffer_length = cursor.read_u16::<LittleEndian>()?;
        let previous_session_id = cursor.read_u64::<LittleEndian>()?;

        let security_blob =
            read_security_buffer(buf, security_buffer_offset, security_buffer_length, 12)?;

        Ok(Self {
            flags,
            security_mode,
            capabilities,
            channel,
            previous_session_id,
            security_blob,
        })
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size());
        buf.write_u16::<LittleEndian>(structure_size::SESSION_SETUP_REQUEST)?;
        buf.write_u8(self.flags.bits())?;
        buf.write_u8(self.security_mode.bits() as u8)?;
        buf.write_u32::<LittleEndian>(self.capabilities.bits())?;
        buf.write_u32::<LittleEndian>(self.channel)?;

        let security_buffer_offset = (SMB2_HEADER_SIZE + SESSION_SETUP_REQUEST_FIXED) as u16;
        buf.write_u16::<LittleEndian>(security_buffer_offset)?;
        buf.write_u16::<LittleEndian>(wire_len_u16(
            self.security_blob.len(),
            "security_buffer_length",
            SMB2_HEADER_SIZE + 14,
        )?)?;
        buf.write_u64::<LittleEndian>(self.previous_session_id)?;

        if self.security_blob.is_empty() {
            buf.write_u8(0)?;
        } else {
            buf.write_all(&self.security_blob)?;
        }

        Ok(buf)
    }

    fn size(&self) -> usize {
        SESSION_SETUP_REQUEST_FIXED + self.security_blob.len().max(1)
    }
}

/// SMB2 SessionSetup Response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Smb2SessionSetupResponse {
    pub session_flags: SessionFlags,
    pub security_blob: Vec<u8>,
}

impl Default for Smb2SessionSetupResponse {
    fn default() -> Self {
        Self {
            session_flags: SessionFlags::empty(),
            security_blob: Vec::new(),
        }
    }
}

impl Smb2SessionSetupResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_security_blob(mut self, blob: Vec<u8>) -> Self {
        self.security_blob = blob;
        self
    }
}

impl SmbMessage for Smb2SessionSetupResponse {
    fn parse(buf: &[u8]) -> Result<Self> {
        ensure_len(buf, SESSION_SETUP_RESPONSE_FIXED)?;

        let mut cursor = io::Cursor::new(buf);
        read_structure_size(
            &mut cursor,
            structure_size::SESSION_SETUP_RESPONSE,
            "SessionSetup response",
        )?;

        let session_flags = SessionFlags::from_bits_retain(cursor.read_u16::<LittleEndian>()?);
        let security_buffer_offset = cursor.read_u16::<LittleEndian>()?;
        let security_buffer_length = cursor.read_u16::<LittleEndian>()?;

        let security_blob =
            read_security_buffer(buf, security_buffer_offset, security_buffer_length, 4)?;

        Ok(Self {
            session_flags,
            security_blob,
        })
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size());
        buf.write_u16::<LittleEndian>(structure_size::SESSION_SETUP_RESPONSE)?;
        buf.write_u16::<LittleEndian>(self.session_flags.bits())?;

        let security_buffer_offset = (SMB2_HEADER_SIZE + SESSION_SETUP_RESPONSE_FIXED) as u16;
        buf.write_u16::<LittleEndian>(security_buffer_offset)?;
        buf.write_u16::<LittleEndian>(wire_len_u16(
            self.security_blob.len(),
            "security_buffer_length",
            SMB2_HEADER_SIZE + 6,
        )?)?;

        if self.security_blob.is_empty() {
            buf.write_u8(0)?;
        } else {
            buf.write_all(&self.security_blob)?;
        }

        Ok(buf)
    }

    fn size(&self) -> usize {
        SESSION_SETUP_RESPONSE_FIXED + self.security_blob.len().max(1)
    }
}
