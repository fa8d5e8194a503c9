//! SMB2 message bodies used by the negotiate and session-setup handshake

pub mod common;
pub mod error_response;
pub mod negotiate;
pub mod session;

pub use common::SmbMessage;
pub use error_response::Smb2ErrorResponse;
pub use negotiate::{Smb2NegotiateRequest, Smb2NegotiateResponse};
pub use session::{Smb2SessionSetupRequest, Smb2SessionSetupResponse};
