//! Credential handling

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

/// An opaque provider credential (API token)
///
/// The raw value is kept in a `SecretString` so it never shows up in
/// `Debug` output or logs.
pub struct Credential {
    inner: SecretString,
}

impl Credential {
    /// Wrap a raw token
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            inner: SecretString::from(raw.into()),
        }
    }

    /// Raw token value, for building request headers
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }

    /// Check if the token is blank
    pub fn is_blank(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for Credential {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl From<String> for Credential {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for Credential {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Credential::new(raw))
    }
}

/// The hosting credential chosen for one deployment request
#[derive(Debug, Clone)]
pub struct CredentialSelection {
    /// Token to use against the hosting provider
    pub token: Credential,

    /// Whether the shared system credential was chosen
    pub is_system_credential: bool,

    /// Deployments left on the shared credential for this user
    pub remaining_system_deployments: u32,
}
