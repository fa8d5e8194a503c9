//! SMB2 protocol definitions

pub mod header;
pub mod messages;
pub mod packet;
pub mod smb2_constants;
pub mod status;

pub use header::Smb2Header;
pub use packet::{Packet, PacketBody};
pub use smb2_constants::{
    SecurityMode, SessionFlags, Smb2Capabilities, Smb2Command, Smb2Dialect, Smb2HeaderFlags,
};
pub use status::NtStatus;
