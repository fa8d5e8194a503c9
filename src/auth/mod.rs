//! Security-token providers for SMB2 session setup
//!
//! The handshake engine never looks inside a security token. A provider turns
//! credentials into the first token, then turns the server's challenge into the
//! final token. NTLM or Kerberos mechanics live entirely behind this trait.

use crate::error::Result;
use std::fmt;

/// Credentials handed to a token provider
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub domain: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            domain: String::new(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }
}

// Never print the password
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("domain", &self.domain)
            .finish()
    }
}

/// Security-token provider driven by the session-setup exchange
///
/// Errors returned from either step surface as [`crate::Error::Provider`].
pub trait TokenProvider: Send {
    /// Produce the initial security token
    fn negotiate_token(&mut self, credentials: &Credentials) -> Result<Vec<u8>>;

    /// Consume the server's challenge and produce the final token
    fn auth_token(&mut self, credentials: &Credentials, challenge: &[u8]) -> Result<Vec<u8>>;

    /// Session key established by the exchange, if the mechanism yields one
    fn session_key(&self) -> Option<Vec<u8>>;
}

impl<P: TokenProvider + ?Sized> TokenProvider for &mut P {
    fn negotiate_token(&mut self, credentials: &Credentials) -> Result<Vec<u8>> {
        (**self).negotiate_token(credentials)
    }

    fn auth_token(&mut self, credentials: &Credentials, challenge: &[u8]) -> Result<Vec<u8>> {
        (**self).auth_token(credentials, challenge)
    }

    fn session_key(&self) -> Option<Vec<u8>> {
        (**self).session_key()
    }
}

impl<P: TokenProvider + ?Sized> TokenProvider for Box<P> {
    fn negotiate_token(&mut self, credentials: &Credentials) -> Result<Vec<u8>> {
        (**self).negotiate_token(credentials)
    }

    fn auth_token(&mut self, credentials: &Credentials, challenge: &[u8]) -> Result<Vec<u8>> {
        (**self).auth_token(credentials, challenge)
    }

    fn session_key(&self) -> Option<Vec<u8>> {
        (**self).session_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("administrator", "P@ssword1").with_domain("CORP");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("administrator"));
        assert!(debug.contains("CORP"));
        assert!(!debug.contains("P@ssword1"));
    }
}
