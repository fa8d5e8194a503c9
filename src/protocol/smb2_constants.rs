//! SMB2 protocol constants

use bitflags::bitflags;
use std::fmt;
use std::hash::{Hash, Hasher};

/// SMB2 magic as bytes
pub const SMB2_MAGIC: [u8; 4] = [0xFE, b'S', b'M', b'B'];

/// SMB2 header size
pub const SMB2_HEADER_SIZE: usize = 64;

/// Structure sizes for SMB2 messages
pub mod structure_size {
    pub const HEADER: u16 = 64;
    pub const NEGOTIATE_REQUEST: u16 = 36;
    pub const NEGOTIATE_RESPONSE: u16 = 65;
    pub const SESSION_SETUP_REQUEST: u16 = 25;
    pub const SESSION_SETUP_RESPONSE: u16 = 9;
    pub const ERROR_RESPONSE: u16 = 9;
}

/// Byte offsets of the fixed SMB2 header fields
pub mod header_offsets {
    pub const PROTOCOL_ID: usize = 0;
    pub const STRUCTURE_SIZE: usize = 4;
    pub const CREDIT_CHARGE: usize = 6;
    pub const STATUS: usize = 8;
    pub const COMMAND: usize = 12;
    pub const CREDITS: usize = 14;
    pub const FLAGS: usize = 16;
    pub const NEXT_COMMAND: usize = 20;
    pub const MESSAGE_ID: usize = 24;
    pub const PROCESS_ID: usize = 32;
    pub const TREE_ID: usize = 36;
    pub const SESSION_ID: usize = 40;
    pub const SIGNATURE: usize = 48;
}

/// SMB2 commands (opcodes)
///
/// Codes outside the published table decode to [`Smb2Command::Unknown`].
/// Equality and hashing follow the wire code, so `Unknown(0) == Negotiate`.
#[derive(Debug, Clone, Copy)]
pub enum Smb2Command {
    Negotiate,
    SessionSetup,
    Logoff,
    TreeConnect,
    TreeDisconnect,
    Create,
    Close,
    Flush,
    Read,
    Write,
    Lock,
    Ioctl,
    Cancel,
    KeepAlive,
    QueryDirectory,
    ChangeNotify,
    QueryInfo,
    SetInfo,
    OplockBreak,
    Unknown(u16),
}

impl PartialEq for Smb2Command {
    fn eq(&self, other: &Self) -> bool {
        self.to_u16() == other.to_u16()
    }
}

impl Eq for Smb2Command {}

impl Hash for Smb2Command {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_u16().hash(state);
    }
}

impl From<u16> for Smb2Command {
    fn from(value: u16) -> Self {
        match value {
            0x00 => Self::Negotiate,
            0x01 => Self::SessionSetup,
            0x02 => Self::Logoff,
            0x03 => Self::TreeConnect,
            0x04 => Self::TreeDisconnect,
            0x05 => Self::Create,
            0x06 => Self::Close,
            0x07 => Self::Flush,
            0x08 => Self::Read,
            0x09 => Self::Write,
            0x0A => Self::Lock,
            0x0B => Self::Ioctl,
            0x0C => Self::Cancel,
            0x0D => Self::KeepAlive,
            0x0E => Self::QueryDirectory,
            0x0F => Self::ChangeNotify,
            0x10 => Self::QueryInfo,
            0x11 => Self::SetInfo,
            0x12 => Self::OplockBreak,
            other => Self::Unknown(other),
        }
    }
}

impl Smb2Command {
    pub fn from_u16(value: u16) -> Self {
        value.into()
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Self::Negotiate => 0x00,
            Self::SessionSetup => 0x01,
            Self::Logoff => 0x02,
            Self::TreeConnect => 0x03,
            Self::TreeDisconnect => 0x04,
            Self::Create => 0x05,
            Self::Close => 0x06,
            Self::Flush => 0x07,
            Self::Read => 0x08,
            Self::Write => 0x09,
            Self::Lock => 0x0A,
            Self::Ioctl => 0x0B,
            Self::Cancel => 0x0C,
            Self::KeepAlive => 0x0D,
            Self::QueryDirectory => 0x0E,
            Self::ChangeNotify => 0x0F,
            Self::QueryInfo => 0x10,
            Self::SetInfo => 0x11,
            Self::OplockBreak => 0x12,
            Self::Unknown(value) => value,
        }
    }
}

bitflags! {
    /// SMB2 header flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Smb2HeaderFlags: u32 {
        const SERVER_TO_REDIR = 0x00000001;
        const ASYNC_COMMAND = 0x00000002;
        const RELATED_OPERATIONS = 0x00000004;
        const SIGNED = 0x00000008;
        const PRIORITY_MASK = 0x00000070;
        const DFS_OPERATIONS = 0x10000000;
        const REPLAY_OPERATION = 0x20000000;
    }
}

bitflags! {
    /// SMB2 negotiate security mode
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SecurityMode: u16 {
        const SIGNING_ENABLED = 0x0001;
        const SIGNING_REQUIRED = 0x0002;
    }
}

bitflags! {
    /// SMB2 capabilities
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Smb2Capabilities: u32 {
        const DFS = 0x00000001;
        const LEASING = 0x00000002;
        const LARGE_MTU = 0x00000004;
        const MULTI_CHANNEL = 0x00000008;
        const PERSISTENT_HANDLES = 0x00000010;
        const DIRECTORY_LEASING = 0x00000020;
        const ENCRYPTION = 0x00000040;
    }
}

bitflags! {
    /// SessionSetup request flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SessionSetupRequestFlags: u8 {
        const BINDING = 0x01;
    }
}

bitflags! {
    /// SMB2 session flags returned by SessionSetup
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SessionFlags: u16 {
        const IS_GUEST = 0x0001;
        const IS_NULL = 0x0002;
        const ENCRYPT_DATA = 0x0004;
    }
}

/// SMB2 dialect revisions
///
/// Any value outside the published set is kept as [`Smb2Dialect::Unknown`],
/// so the dialect a server picks is always recorded verbatim. Equality and
/// hashing follow the wire value.
#[derive(Debug, Clone, Copy)]
pub enum Smb2Dialect {
    Smb202,
    Smb210,
    /// "SMB 2.???" wildcard returned to multi-protocol negotiates
    Smb2Wildcard,
    Smb224,
    Smb300,
    Smb302,
    Smb311,
    Unknown(u16),
}

impl PartialEq for Smb2Dialect {
    fn eq(&self, other: &Self) -> bool {
        self.to_u16() == other.to_u16()
    }
}

impl Eq for Smb2Dialect {}

impl Hash for Smb2Dialect {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_u16().hash(state);
    }
}

impl From<u16> for Smb2Dialect {
    fn from(value: u16) -> Self {
        match value {
            0x0202 => Self::Smb202,
            0x0210 => Self::Smb210,
            0x02FF => Self::Smb2Wildcard,
            0x0224 => Self::Smb224,
            0x0300 => Self::Smb300,
            0x0302 => Self::Smb302,
            0x0311 => Self::Smb311,
            other => Self::Unknown(other),
        }
    }
}

impl Smb2Dialect {
    pub fn from_u16(value: u16) -> Self {
        value.into()
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Self::Smb202 => 0x0202,
            Self::Smb210 => 0x0210,
            Self::Smb2Wildcard => 0x02FF,
            Self::Smb224 => 0x0224,
            Self::Smb300 => 0x0300,
            Self::Smb302 => 0x0302,
            Self::Smb311 => 0x0311,
            Self::Unknown(value) => value,
        }
    }

    /// True for the SMB 3.x family
    pub fn is_smb3(self) -> bool {
        matches!(self, Self::Smb300 | Self::Smb302 | Self::Smb311)
    }
}

impl fmt::Display for Smb2Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Smb202 => write!(f, "SMB 2.0.2"),
            Self::Smb210 => write!(f, "SMB 2.1"),
            Self::Smb2Wildcard => write!(f, "SMB 2.???"),
            Self::Smb224 => write!(f, "SMB 2.2.4"),
            Self::Smb300 => write!(f, "SMB 3.0"),
            Self::Smb302 => write!(f, "SMB 3.0.2"),
            Self::Smb311 => write!(f, "SMB 3.1.1"),
            Self::Unknown(value) => write!(f, "unknown dialect 0x{:04x}", value),
        }
    }
}
