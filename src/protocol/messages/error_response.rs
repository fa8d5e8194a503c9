//! SMB2 ERROR response body

use super::common::{ensure_len, read_structure_size, SmbMessage};
use crate::error::{Error, Result};
use crate::protocol::smb2_constants::{structure_size, SMB2_HEADER_SIZE};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Write};

const ERROR_RESPONSE_FIXED: usize = 8;

/// Body the server sends in place of the command response when the header
/// status is an error
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Smb2ErrorResponse {
    pub error_context_count: u8,
    pub error_data: Vec<u8>,
}

impl SmbMessage for Smb2ErrorResponse {
    fn parse(buf: &[u8]) -> Result<Self> {
        ensure_len(buf, ERROR_RESPONSE_FIXED)?;

        let mut cursor = io::Cursor::new(buf);
        read_structure_size(&mut cursor, structure_size::ERROR_RESPONSE, "error response")?;

        let error_context_count = cursor.read_u8()?;
        let _reserved = cursor.read_u8()?;
        let byte_count = cursor.read_u32::<LittleEndian>()? as usize;

        let end = ERROR_RESPONSE_FIXED + byte_count;
        if end > buf.len() {
            return Err(Error::malformed(
                "byte_count",
                SMB2_HEADER_SIZE + 4,
                format!("error data of {} bytes exceeds message", byte_count),
            ));
        }

        Ok(Self {
            error_context_count,
            error_data: buf[ERROR_RESPONSE_FIXED..end].to_vec(),
        })
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size());
        buf.write_u16::<LittleEndian>(structure_size::ERROR_RESPONSE)?;
        buf.write_u8(self.error_context_count)?;
        buf.write_u8(0)?;
        buf.write_u32::<LittleEndian>(self.error_data.len() as u32)?;
        if self.error_data.is_empty() {
            buf.write_u8(0)?;
        } else {
            buf.write_all(&self.error_data)?;
        }
        Ok(buf)
    }

    fn size(&self) -> usize {
        ERROR_RESPONSE_FIXED + self.error_data.len().max(1)
    }
}
