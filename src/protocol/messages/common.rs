//! Common types and helpers for SMB2 message bodies

use crate::error::{Error, Result};
use crate::protocol::smb2_constants::SMB2_HEADER_SIZE;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io;

/// Trait for SMB2 message bodies that can be parsed from and serialized to bytes
///
/// `parse` receives the body only (everything after the 64-byte header).
/// Offsets inside bodies are relative to the start of the header, as on the wire.
pub trait SmbMessage: Sized {
    /// Parse message from bytes
    fn parse(buf: &[u8]) -> Result<Self>;

    /// Serialize message to bytes
    fn serialize(&self) -> Result<Vec<u8>>;

    /// Get the size of the message when serialized
    fn size(&self) -> usize;
}

/// Check the body is at least `need` bytes long
pub(crate) fn ensure_len(buf: &[u8], need: usize) -> Result<()> {
    if buf.len() < need {
        return Err(Error::BufferTooSmall {
            need: SMB2_HEADER_SIZE + need,
            have: SMB2_HEADER_SIZE + buf.len(),
        });
    }
    Ok(())
}

/// Read and validate the leading StructureSize field
pub(crate) fn read_structure_size(
    cursor: &mut io::Cursor<&[u8]>,
    expected: u16,
    message: &str,
) -> Result<u16> {
    let structure_size = cursor.read_u16::<LittleEndian>()?;
    if structure_size != expected {
        return Err(Error::malformed(
            "structure_size",
            SMB2_HEADER_SIZE,
            format!(
                "invalid {} structure size: {} (expected {})",
                message, structure_size, expected
            ),
        ));
    }
    Ok(structure_size)
}

/// Convert a variable-length count into its 16-bit wire field
///
/// `field_offset` is the position of the field from the start of the header.
pub(crate) fn wire_len_u16(len: usize, field: &'static str, field_offset: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| {
        Error::malformed(
            field,
            field_offset,
            format!("{} does not fit in a 16-bit field", len),
        )
    })
}

/// Copy a security buffer out of a body
///
/// `offset` is measured from the start of the SMB2 header; `field_offset` is the
/// position of the offset field itself and is reported when the buffer is bad.
pub(crate) fn read_security_buffer(
    body: &[u8],
    offset: u16,
    length: u16,
    field_offset: usize,
) -> Result<Vec<u8>> {
    if length == 0 {
        return Ok(Vec::new());
    }

    let start = (offset as usize)
        .checked_sub(SMB2_HEADER_SIZE)
        .ok_or_else(|| {
            Error::malformed(
                "security_buffer_offset",
                SMB2_HEADER_SIZE + field_offset,
                format!("offset {} points inside the header", offset),
            )
        })?;
    let end = start + length as usize;

    if end > body.len() {
        return Err(Error::malformed(
            "security_buffer_length",
            SMB2_HEADER_SIZE + field_offset + 2,
            format!(
                "security buffer extends beyond message ({} > {})",
                SMB2_HEADER_SIZE + end,
                SMB2_HEADER_SIZE + body.len()
            ),
        ));
    }

    Ok(body[start..end].to_vec())
}
