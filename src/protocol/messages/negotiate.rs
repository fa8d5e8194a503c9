//! SMB2 Negotiate messages

use super::common::{
    ensure_len, read_security_buffer, read_structure_size, wire_len_u16, SmbMessage,
};
use crate::error::{Error, Result};
use crate::protocol::smb2_constants::{
    structure_size, SecurityMode, Smb2Capabilities, Smb2Dialect, SMB2_HEADER_SIZE,
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use uuid::Uuid;

/// Fixed part of the negotiate request, before the dialect array
const NEGOTIATE_REQUEST_FIXED: usize = 36;

/// Fixed part of the negotiate response, before the security buffer
const NEGOTIATE_RESPONSE_FIXED: usize = 64;

/// SMB2 Negotiate Request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Smb2NegotiateRequest {
    pub security_mode: SecurityMode,
    pub reserved: u16,
    pub capabilities: Smb2Capabilities,
    pub client_guid: Uuid,
    /// ClientStartTime; carries the negotiate context offset/count for 3.1.1
    pub client_start_time: u64,
    pub dialects: Vec<Smb2Dialect>,
}

impl Smb2NegotiateRequest {
    pub fn new(dialects: Vec<Smb2Dialect>) -> Self {
        Self {
            security_mode: SecurityMode::SIGNING_ENABLED,
            reserved: 0,
            capabilities: Smb2Capabilities::DFS,
            client_guid: Uuid::new_v4(),
            client_start_time: 0,
            dialects,
        }
    }
}

impl SmbMessage for Smb2NegotiateRequest {
    fn parse(buf: &[u8]) -> Result<Self> {
        ensure_len(buf, NEGOTIATE_REQUEST_FIXED)?;

        let mut cursor = io::Cursor::new(buf);
        read_structure_size(
            &mut cursor,
            structure_size::NEGOTIATE_REQUEST,
            "negotiate request",
        )?;

        let dialect_count = cursor.read_u16::<LittleEndian>()?;
        let security_mode = SecurityMode::from_bits_retain(cursor.read_u16::<LittleEndian>()?);
        let reserved = cursor.read_u16::<LittleEndian>()?;
        let capabilities = Smb2Capabilities::from_bits_retain(cursor.read_u32::<LittleEndian>()?);

        let mut guid_bytes = [0u8; 16];
        cursor.read_exact(&mut guid_bytes)?;
        let client_guid = Uuid::from_bytes(guid_bytes);

        let client_start_time = cursor.read_u64::<LittleEndian>()?;

        let dialects_end = NEGOTIATE_REQUEST_FIXED + dialect_count as usize * 2;
        if buf.len() < dialects_end {
            return Err(Error::malformed(
                "dialect_count",
                SMB2_HEADER_SIZE + 2,
                format!(
                    "{} dialects do not fit in a {} byte body",
                    dialect_count,
                    buf.len()
                ),
            ));
        }

        let mut dialects = Vec::with_capacity(dialect_count as usize);
        for _ in 0..dialect_count {
            dialects.push(Smb2Dialect::from_u16(cursor.read_u16::<LittleEndian>()?));
        }

        Ok(Self {
            security_mode,
            reserved,
            capabilities,
            client_guid,
            client_start_time,
            dialects,
        })
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size());
        buf.write_u16::<LittleEndian>(structure_size::NEGOTIATE_REQUEST)?;
        buf.write_u16::<LittleEndian>(wire_len_u16(
            self.dialects.len(),
            "dialect_count",
            SMB2_HEADER_SIZE + 2,
        )?)?;
        buf.write_u16::<LittleEndian>(self.security_mode.bits())?;
        buf.write_u16::<LittleEndian>(self.reserved)?;
        buf.write_u32::<LittleEndian>(self.capabilities.bits())?;
        buf.write_all(self.client_guid.as_bytes())?;
        buf.write_u64::<LittleEndian>(self.client_start_time)?;

        for dialect in &self.dialects {
            buf.write_u16::<LittleEndian>(dialect.to_u16())?;
        }

        Ok(buf)
    }

    fn size(&self) -> usize {
        NEGOTIATE_REQUEST_FIXED + self.dialects.len() * 2
    }
}

/// SMB2 Negotiate Response
///
/// Negotiate contexts (3.1.1) are not parsed; their count and offset are kept
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Smb2NegotiateResponse {
    pub security_mode: SecurityMode,
    pub dialect_revision: Smb2Dialect,
    pub negotiate_context_count: u16,
    pub server_guid: Uuid,
    pub capabilities: Smb2Capabilities,
    pub max_transact_size: u32,
    pub max_read_size: u32,
    pub max_write_size: u32,
    pub system_time: u64,
    pub server_start_time: u64,
    pub negotiate_context_offset: u32,
    pub security_blob: Vec<u8>,
}

impl Default for Smb2NegotiateResponse {
    fn default() -> Self {
        Self {
            security_mode: SecurityMode::empty(),
            dialect_revision: Smb2Dialect::Unknown(0),
            negotiate_context_count: 0,
            server_guid: Uuid::nil(),
            capabilities: Smb2Capabilities::empty(),
            max_transact_size: 0,
            max_read_size: 0,
            max_write_size: 0,
            system_time: 0,
            server_start_time: 0,
            negotiate_context_offset: 0,
            security_blob: Vec::new(),
        }
    }
}

impl Smb2NegotiateResponse {
    pub fn new(dialect: Smb2Dialect) -> Self {
        Self {
            security_mode: SecurityMode::SIGNING_ENABLED,
            dialect_revision: dialect,
            capabilities: Smb2Capabilities::DFS,
            max_transact_size: 1048576,
            max_read_size: 1048576,
            max_write_size: 1048576,
            ..Self::default()
        }
    }
}

impl SmbMessage for Smb2NegotiateResponse {
    fn parse(buf: &[u8]) -> Result<Self> {
        ensure_len(buf, NEGOTIATE_RESPONSE_FIXED)?;

        let mut cursor = io::Cursor::new(buf);
        read_structure_size(
            &mut cursor,
            structure_size::NEGOTIATE_RESPONSE,
            "negotiate response",
        )?;

        let security_mode = SecurityMode::from_bits_retain(cursor.read_u16::<LittleEndian>()?);
        let dialect_revision = Smb2Dialect::from_u16(cursor.read_u16::<LittleEndian>()?);
        let negotiate_context_count = cursor.read_u16::<LittleEndian>()?;

        let mut guid_bytes = [0u8; 16];
        cursor.read_exact(&mut guid_bytes)?;
        let server_guid = Uuid::from_bytes(guid_bytes);

        let capabilities = Smb2Capabilities::from_bits_retain(cursor.read_u32::<LittleEndian>()?);
        let max_transact_size = cursor.read_u32::<LittleEndian>()?;
        let max_read_size = cursor.read_u32::<LittleEndian>()?;
        let max_write_size = cursor.read_u32::<LittleEndian>()?;
        let system_time = cursor.read_u64::<LittleEndian>()?;
        let server_start_time = cursor.read_u64::<LittleEndian>()?;
        let security_buffer_offset = cursor.read_u16::<LittleEndian>()?;
        let security_buffer_length = cursor.read_u16::<LittleEndian>()?;
        let negotiate_context_offset = cursor.read_u32::<LittleEndian>()?;

        let security_blob =
            read_security_buffer(buf, security_buffer_offset, security_buffer_length, 56)?;

        Ok(Self {
            security_mode,
            dialect_revision,
            negotiate_context_count,
            server_guid,
            capabilities,
            max_transact_size,
            max_read_size,
            max_write_size,
            system_time,
            server_start_time,
            negotiate_context_offset,
            security_blob,
        })
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size());
        buf.write_u16::<LittleEndian>(structure_size::NEGOTIATE_RESPONSE)?;
        buf.write_u16::<LittleEndian>(self.security_mode.bits())?;
        buf.write_u16::<LittleEndian>(self.dialect_revision.to_u16())?;
        buf.write_u16::<LittleEndian>(self.negotiate_context_count)?;
        buf.write_all(self.server_guid.as_bytes())?;
        buf.write_u32::<LittleEndian>(self.capabilities.bits())?;
        buf.write_u32::<LittleEndian>(self.max_transact_size)?;
        buf.write_u32::<LittleEndian>(self.max_read_size)?;
        buf.write_u32::<LittleEndian>(self.max_write_size)?;
        buf.write_u64::<LittleEndian>(self.system_time)?;
        buf.write_u64::<LittleEndian>(self.server_start_time)?;

        // Buffer starts right after header + fixed body
        let security_buffer_offset = (SMB2_HEADER_SIZE + NEGOTIATE_RESPONSE_FIXED) as u16;
        buf.write_u16::<LittleEndian>(security_buffer_offset)?;
        buf.write_u16::<LittleEndian>(wire_len_u16(
            self.security_blob.len(),
            "security_buffer_length",
            SMB2_HEADER_SIZE + 58,
        )?)?;
        buf.write_u32::<LittleEndian>(self.negotiate_context_offset)?;

        if self.security_blob.is_empty() {
            // StructureSize 65 counts one byte of variable buffer
            buf.write_u8(0)?;
        } else {
            buf.write_all(&self.security_blob)?;
        }

        Ok(buf)
    }

    fn size(&self) -> usize {
        NEGOTIATE_RESPONSE_FIXED + self.security_blob.len().max(1)
    }
}
