//! Authentication: Basic credentials, JWT bearer tokens and the
//! initializer that turns them into per-request options.

pub mod initializer;
pub mod jwt;
pub mod token;

use base64::Engine;

pub use initializer::CredentialInitializer;
pub use token::TokenState;

/// Username/password pair for HTTP Basic authentication.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Basic auth needs both a username and a password.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// `Basic base64(username:password)`
    pub fn basic_header_value(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.username, self.password));
        format!("Basic {}", encoded)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Whether requests are sent with credentials attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialsMode {
    #[default]
    Omit,
    Include,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_header_encodes_user_and_password() {
        let credentials = Credentials::new("Aladdin", "open sesame");
        assert_eq!(
            credentials.basic_header_value(),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn empty_username_or_password_is_incomplete() {
        assert!(Credentials::new("user", "pass").is_complete());
        assert!(!Credentials::new("", "pass").is_complete());
        assert!(!Credentials::new("user", "").is_complete());
        assert!(!Credentials::new("", "").is_complete());
    }

    #[test]
    fn debug_output_hides_password() {
        let credentials = Credentials::new("user", "hunter2");
        let printed = format!("{:?}", credentials);
        assert!(printed.contains("user"));
        assert!(!printed.contains("hunter2"));
    }
}
