//! Process-wide invocation context.

use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Login/password pair sent as HTTP basic credentials on every call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    pub fn authorization(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.login, self.password));
        format!("Basic {token}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

/// Built once from the global command-line options and read by every command.
#[derive(Debug, Clone)]
pub struct Session {
    base_url: String,
    pub credentials: Credentials,
    /// Display name forwarded as the `username` parameter by the ISAC commands.
    pub username: Option<String>,
    pub pretty: bool,
    pub timeout: Option<Duration>,
}

impl Session {
    pub fn new(base_url: &str, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            username: None,
            pretty: false,
            timeout: None,
        }
    }

    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_stripped() {
        let session = Session::new("http://localhost:8080/g3/", Credentials::new("amis", "amis"));
        assert_eq!(session.base_url(), "http://localhost:8080/g3");
    }

    #[test]
    fn authorization_is_basic() {
        let creds = Credentials::new("amis", "amis");
        assert_eq!(creds.authorization(), "Basic YW1pczphbWlz");
    }

    #[test]
    fn debug_hides_password() {
        let creds = Credentials::new("amis", "secret");
        let text = format!("{creds:?}");
        assert!(text.contains("amis"));
        assert!(!text.contains("secret"));
    }
}
