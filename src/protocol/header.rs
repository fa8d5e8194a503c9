//! SMB2 packet header

use super::smb2_constants::*;
use super::status::NtStatus;
use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read};

/// SMB2 sync header (64 bytes)
///
/// The protocol identifier is not stored; it is always `0xFE 'SMB'` and is
/// checked on parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Smb2Header {
    pub structure_size: u16,
    pub credit_charge: u16,
    pub status: u32,
    pub command: Smb2Command,
    pub credits: u16,
    pub flags: Smb2HeaderFlags,
    pub next_command: u32,
    pub message_id: u64,
    pub process_id: u32,
    pub tree_id: u32,
    pub session_id: u64,
    pub signature: [u8; 16],
}

impl Smb2Header {
    pub const SIZE: usize = SMB2_HEADER_SIZE;

    pub fn new(command: Smb2Command) -> Self {
        Self {
            structure_size: structure_size::HEADER,
            credit_charge: 0,
            status: 0,
            command,
            credits: 1,
            flags: Smb2HeaderFlags::empty(),
            next_command: 0,
            message_id: 0,
            process_id: 0,
            tree_id: 0,
            session_id: 0,
            signature: [0; 16],
        }
    }

    /// A response header for `command`, as a server would send it
    pub fn response(command: Smb2Command, status: NtStatus) -> Self {
        let mut header = Self::new(command);
        header.flags = Smb2HeaderFlags::SERVER_TO_REDIR;
        header.status = status.to_u32();
        header
    }

    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(Error::BufferTooSmall {
                need: Self::SIZE,
                have: buf.len(),
            });
        }

        if buf[0..4] != SMB2_MAGIC {
            return Err(Error::malformed(
                "protocol_id",
                header_offsets::PROTOCOL_ID,
                format!("expected FE 53 4D 42, found {:02x?}", &buf[0..4]),
            ));
        }

        let mut cursor = io::Cursor::new(&buf[header_offsets::STRUCTURE_SIZE..Self::SIZE]);
        let structure_size = cursor.read_u16::<LittleEndian>()?;
        if structure_size != structure_size::HEADER {
            return Err(Error::malformed(
                "structure_size",
                header_offsets::STRUCTURE_SIZE,
                format!("expected 64, found {}", structure_size),
            ));
        }

        let credit_charge = cursor.read_u16::<LittleEndian>()?;
        let status = cursor.read_u32::<LittleEndian>()?;
        let command = Smb2Command::from_u16(cursor.read_u16::<LittleEndian>()?);
        let credits = cursor.read_u16::<LittleEndian>()?;
        let flags = Smb2HeaderFlags::from_bits_retain(cursor.read_u32::<LittleEndian>()?);
        let next_command = cursor.read_u32::<LittleEndian>()?;
        let message_id = cursor.read_u64::<LittleEndian>()?;
        let process_id = cursor.read_u32::<LittleEndian>()?;
        let tree_id = cursor.read_u32::<LittleEndian>()?;
        let session_id = cursor.read_u64::<LittleEndian>()?;

        let mut signature = [0u8; 16];
        cursor.read_exact(&mut signature)?;

        Ok(Self {
            structure_size,
            credit_charge,
            status,
            command,
            credits,
            flags,
            next_command,
            message_id,
            process_id,
            tree_id,
            session_id,
            signature,
        })
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.extend_from_slice(&SMB2_MAGIC);
        buf.write_u16::<LittleEndian>(self.structure_size)?;
        buf.write_u16::<LittleEndian>(self.credit_charge)?;
        buf.write_u32::<LittleEndian>(self.status)?;
        buf.write_u16::<LittleEndian>(self.command.to_u16())?;
        buf.write_u16::<LittleEndian>(self.credits)?;
        buf.write_u32::<LittleEndian>(self.flags.bits())?;
        buf.write_u32::<LittleEndian>(self.next_command)?;
        buf.write_u64::<LittleEndian>(self.message_id)?;
        buf.write_u32::<LittleEndian>(self.process_id)?;
        buf.write_u32::<LittleEndian>(self.tree_id)?;
        buf.write_u64::<LittleEndian>(self.session_id)?;
        buf.extend_from_slice(&self.signature);
        Ok(buf)
    }

    pub fn is_response(&self) -> bool {
        self.flags.contains(Smb2HeaderFlags::SERVER_TO_REDIR)
    }

    pub fn is_async(&self) -> bool {
        self.flags.contains(Smb2HeaderFlags::ASYNC_COMMAND)
    }

    /// Async ID; the async header reuses the process and tree ID slots
    pub fn async_id(&self) -> Option<u64> {
        self.is_async()
            .then(|| (u64::from(self.tree_id) << 32) | u64::from(self.process_id))
    }

    /// Translated header status
    pub fn nt_status(&self) -> NtStatus {
        NtStatus::from_u32(self.status)
    }
}
