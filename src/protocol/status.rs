//! NTSTATUS translation
//!
//! Every 32-bit status value maps to exactly one [`NtStatus`]. Values outside the
//! table below become [`NtStatus::Unknown`] carrying the raw code, so nothing is
//! ever coerced into a success or a known failure.

use std::fmt;
use std::hash::{Hash, Hasher};

const SEVERITY_MASK: u32 = 0xC000_0000;

/// SMB protocol status codes (subset of NTSTATUS)
///
/// Build values from the wire with [`NtStatus::from_u32`]. Equality and hashing
/// follow the wire value, so `Unknown(0xC000006D) == LogonFailure`.
#[derive(Debug, Clone, Copy)]
pub enum NtStatus {
    /// The operation completed successfully
    Success,
    /// The operation is still in progress
    Pending,
    /// More processing required (intermediate SessionSetup leg)
    MoreProcessingRequired,
    /// The data was too large to fit into the buffer
    BufferOverflow,
    /// No more files
    NoMoreFiles,
    /// The specified handle is invalid
    InvalidHandle,
    /// The parameter is incorrect
    InvalidParameter,
    /// Access denied
    AccessDenied,
    /// The buffer is too small
    BufferTooSmall,
    /// The object name is not found
    ObjectNameNotFound,
    /// Cannot create a file that already exists
    ObjectNameCollision,
    /// The named user does not exist
    NoSuchUser,
    /// The password is wrong
    WrongPassword,
    /// The user name or password is incorrect
    LogonFailure,
    /// Account restrictions prevent this logon
    AccountRestriction,
    /// Logon outside the permitted hours
    InvalidLogonHours,
    /// Logon from a workstation that is not permitted
    InvalidWorkstation,
    /// The password has expired
    PasswordExpired,
    /// Account is disabled
    AccountDisabled,
    /// Insufficient resources
    InsufficientResources,
    /// The request timed out
    IoTimeout,
    /// The request is not supported
    NotSupported,
    /// Bad network path
    BadNetworkPath,
    /// The specified network name is no longer available
    NetworkNameDeleted,
    /// Bad network name
    BadNetworkName,
    /// The server is not accepting new sessions
    RequestNotAccepted,
    /// The session was deleted by the server
    UserSessionDeleted,
    /// The password must be changed before first logon
    PasswordMustChange,
    /// The account is locked out
    AccountLockedOut,
    /// The session has expired
    NetworkSessionExpired,
    /// A status value this table does not name
    Unknown(u32),
}

impl From<u32> for NtStatus {
    fn from(value: u32) -> Self {
        match value {
            0x00000000 => NtStatus::Success,
            0x00000103 => NtStatus::Pending,
            0xC0000016 => NtStatus::MoreProcessingRequired,
            0x80000005 => NtStatus::BufferOverflow,
            0x80000006 => NtStatus::NoMoreFiles,
            0xC0000008 => NtStatus::InvalidHandle,
            0xC000000D => NtStatus::InvalidParameter,
            0xC0000022 => NtStatus::AccessDenied,
            0xC0000023 => NtStatus::BufferTooSmall,
            0xC0000034 => NtStatus::ObjectNameNotFound,
            0xC0000035 => NtStatus::ObjectNameCollision,
            0xC0000064 => NtStatus::NoSuchUser,
            0xC000006A => NtStatus::WrongPassword,
            0xC000006D => NtStatus::LogonFailure,
            0xC000006E => NtStatus::AccountRestriction,
            0xC000006F => NtStatus::InvalidLogonHours,
            0xC0000070 => NtStatus::InvalidWorkstation,
            0xC0000071 => NtStatus::PasswordExpired,
            0xC0000072 => NtStatus::AccountDisabled,
            0xC000009A => NtStatus::InsufficientResources,
            0xC00000B5 => NtStatus::IoTimeout,
            0xC00000BB => NtStatus::NotSupported,
            0xC00000BE => NtStatus::BadNetworkPath,
            0xC00000C9 => NtStatus::NetworkNameDeleted,
            0xC00000CC => NtStatus::BadNetworkName,
            0xC00000D0 => NtStatus::RequestNotAccepted,
            0xC0000203 => NtStatus::UserSessionDeleted,
            0xC0000224 => NtStatus::PasswordMustChange,
            0xC0000234 => NtStatus::AccountLockedOut,
            0xC000035C => NtStatus::NetworkSessionExpired,
            other => NtStatus::Unknown(other),
        }
    }
}

impl PartialEq for NtStatus {
    fn eq(&self, other: &Self) -> bool {
        self.to_u32() == other.to_u32()
    }
}

impl Eq for NtStatus {}

impl Hash for NtStatus {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_u32().hash(state);
    }
}

impl From<NtStatus> for u32 {
    fn from(status: NtStatus) -> u32 {
        status.to_u32()
    }
}

impl NtStatus {
    /// Create from a raw u32 value
    pub fn from_u32(value: u32) -> Self {
        value.into()
    }

    /// The raw wire value
    pub fn to_u32(self) -> u32 {
        match self {
            NtStatus::Success => 0x00000000,
            NtStatus::Pending => 0x00000103,
            NtStatus::MoreProcessingRequired => 0xC0000016,
            NtStatus::BufferOverflow => 0x80000005,
            NtStatus::NoMoreFiles => 0x80000006,
            NtStatus::InvalidHandle => 0xC0000008,
            NtStatus::InvalidParameter => 0xC000000D,
            NtStatus::AccessDenied => 0xC0000022,
            NtStatus::BufferTooSmall => 0xC0000023,
            NtStatus::ObjectNameNotFound => 0xC0000034,
            NtStatus::ObjectNameCollision => 0xC0000035,
            NtStatus::NoSuchUser => 0xC0000064,
            NtStatus::WrongPassword => 0xC000006A,
            NtStatus::LogonFailure => 0xC000006D,
            NtStatus::AccountRestriction => 0xC000006E,
            NtStatus::InvalidLogonHours => 0xC000006F,
            NtStatus::InvalidWorkstation => 0xC0000070,
            NtStatus::PasswordExpired => 0xC0000071,
            NtStatus::AccountDisabled => 0xC0000072,
            NtStatus::InsufficientResources => 0xC000009A,
            NtStatus::IoTimeout => 0xC00000B5,
            NtStatus::NotSupported => 0xC00000BB,
            NtStatus::BadNetworkPath => 0xC00000BE,
            NtStatus::NetworkNameDeleted => 0xC00000C9,
            NtStatus::BadNetworkName => 0xC00000CC,
            NtStatus::RequestNotAccepted => 0xC00000D0,
            NtStatus::UserSessionDeleted => 0xC0000203,
            NtStatus::PasswordMustChange => 0xC0000224,
            NtStatus::AccountLockedOut => 0xC0000234,
            NtStatus::NetworkSessionExpired => 0xC000035C,
            NtStatus::Unknown(value) => value,
        }
    }

    /// Symbolic name, `STATUS_UNKNOWN` for unmapped values
    pub fn name(self) -> &'static str {
        match self {
            NtStatus::Success => "STATUS_SUCCESS",
            NtStatus::Pending => "STATUS_PENDING",
            NtStatus::MoreProcessingRequired => "STATUS_MORE_PROCESSING_REQUIRED",
            NtStatus::BufferOverflow => "STATUS_BUFFER_OVERFLOW",
            NtStatus::NoMoreFiles => "STATUS_NO_MORE_FILES",
            NtStatus::InvalidHandle => "STATUS_INVALID_HANDLE",
            NtStatus::InvalidParameter => "STATUS_INVALID_PARAMETER",
            NtStatus::AccessDenied => "STATUS_ACCESS_DENIED",
            NtStatus::BufferTooSmall => "STATUS_BUFFER_TOO_SMALL",
            NtStatus::ObjectNameNotFound => "STATUS_OBJECT_NAME_NOT_FOUND",
            NtStatus::ObjectNameCollision => "STATUS_OBJECT_NAME_COLLISION",
            NtStatus::NoSuchUser => "STATUS_NO_SUCH_USER",
            NtStatus::WrongPassword => "STATUS_WRONG_PASSWORD",
            NtStatus::LogonFailure => "STATUS_LOGON_FAILURE",
            NtStatus::AccountRestriction => "STATUS_ACCOUNT_RESTRICTION",
            NtStatus::InvalidLogonHours => "STATUS_INVALID_LOGON_HOURS",
            NtStatus::InvalidWorkstation => "STATUS_INVALID_WORKSTATION",
            NtStatus::PasswordExpired => "STATUS_PASSWORD_EXPIRED",
            NtStatus::AccountDisabled => "STATUS_ACCOUNT_DISABLED",
            NtStatus::InsufficientResources => "STATUS_INSUFFICIENT_RESOURCES",
            NtStatus::IoTimeout => "STATUS_IO_TIMEOUT",
            NtStatus::NotSupported => "STATUS_NOT_SUPPORTED",
            NtStatus::BadNetworkPath => "STATUS_BAD_NETWORK_PATH",
            NtStatus::NetworkNameDeleted => "STATUS_NETWORK_NAME_DELETED",
            NtStatus::BadNetworkName => "STATUS_BAD_NETWORK_NAME",
            NtStatus::RequestNotAccepted => "STATUS_REQUEST_NOT_ACCEPTED",
            NtStatus::UserSessionDeleted => "STATUS_USER_SESSION_DELETED",
            NtStatus::PasswordMustChange => "STATUS_PASSWORD_MUST_CHANGE",
            NtStatus::AccountLockedOut => "STATUS_ACCOUNT_LOCKED_OUT",
            NtStatus::NetworkSessionExpired => "STATUS_NETWORK_SESSION_EXPIRED",
            NtStatus::Unknown(_) => "STATUS_UNKNOWN",
        }
    }

    /// Success severity (top two bits clear)
    pub fn is_success(self) -> bool {
        self.to_u32() & SEVERITY_MASK == 0
    }

    /// Error severity
    pub fn is_error(self) -> bool {
        self.to_u32() & SEVERITY_MASK == SEVERITY_MASK
    }

    /// Warning severity
    pub fn is_warning(self) -> bool {
        self.to_u32() & SEVERITY_MASK == 0x8000_0000
    }

    /// True when the value fell outside the translation table
    pub fn is_unknown(self) -> bool {
        matches!(self, NtStatus::Unknown(_))
    }

    /// True for the logon-rejection family returned by SessionSetup
    pub fn is_logon_failure(self) -> bool {
        matches!(
            self,
            NtStatus::LogonFailure
                | NtStatus::NoSuchUser
                | NtStatus::WrongPassword
                | NtStatus::AccountRestriction
                | NtStatus::InvalidLogonHours
                | NtStatus::InvalidWorkstation
                | NtStatus::PasswordExpired
                | NtStatus::AccountDisabled
                | NtStatus::PasswordMustChange
                | NtStatus::AccountLockedOut
        )
    }
}

impl fmt::Display for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08X})", self.name(), self.to_u32())
    }
}
