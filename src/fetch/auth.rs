// src/fetch/auth.rs
// =============================================================================
// Credentials for sites behind HTTP basic auth.
//
// The fetcher only asks for credentials when a server challenges it with a
// 401 and a realm. A CredentialProvider maps that realm (or the host, when
// the server names no realm) to a username and password.
// =============================================================================

use std::fmt;

#[derive(Clone, PartialEq, Eq)]
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
}

// Never print the password, not even in debug logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

pub trait CredentialProvider: Send + Sync {
    fn credentials_for(&self, realm: &str) -> Option<Credentials>;
}

// Answers every realm with the same username and password
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials_for(&self, _realm: &str) -> Option<Credentials> {
        Some(self.credentials.clone())
    }
}

// For crawls that have no credentials at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn credentials_for(&self, _realm: &str) -> Option<Credentials> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_answers_any_realm() {
        let provider = StaticCredentials::new(Credentials::new("bob", "hunter2"));
        assert_eq!(
            provider.credentials_for("Admin Area"),
            Some(Credentials::new("bob", "hunter2"))
        );
        assert!(provider.credentials_for("example.com").is_some());
        assert!(NoCredentials.credentials_for("Admin Area").is_none());
    }

    #[test]
    fn test_debug_hides_password() {
        let printed = format!("{:?}", Credentials::new("bob", "hunter2"));
        assert!(printed.contains("bob"));
        assert!(!printed.contains("hunter2"));
    }
}
