//! Settings file management

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::authn::credential::Credential;
use crate::errors::PublishError;
use crate::logs::LogLevel;

/// Environment fallback for the platform repository token
pub const REPOSITORY_TOKEN_ENV: &str = "PUBLISHER_REPOSITORY_TOKEN";

/// Environment fallback for the shared hosting token
pub const HOSTING_TOKEN_ENV: &str = "PUBLISHER_HOSTING_TOKEN";

/// Publisher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,

    /// Also write logs to daily files in this directory
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Repository provider configuration
    #[serde(default)]
    pub repository: RepositorySettings,

    /// Hosting provider configuration
    #[serde(default)]
    pub hosting: HostingSettings,

    /// Shared credential quota
    #[serde(default)]
    pub quota: QuotaSettings,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpSettings,

    /// JSON store location; defaults to the storage layout's store file
    #[serde(default)]
    pub data_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_dir: None,
            repository: RepositorySettings::default(),
            hosting: HostingSettings::default(),
            quota: QuotaSettings::default(),
            http: HttpSettings::default(),
            data_file: None,
        }
    }
}

impl Settings {
    /// Validate the settings
    pub fn validate(&self) -> Result<(), PublishError> {
        Url::parse(&self.repository.base_url).map_err(|e| {
            PublishError::ConfigError(format!(
                "Invalid repository base_url {}: {}",
                self.repository.base_url, e
            ))
        })?;
        Url::parse(&self.hosting.base_url).map_err(|e| {
            PublishError::ConfigError(format!(
                "Invalid hosting base_url {}: {}",
                self.hosting.base_url, e
            ))
        })?;

        if self.quota.system_deployment_limit == 0 {
            return Err(PublishError::ConfigError(
                "quota.system_deployment_limit must be at least 1".to_string(),
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(PublishError::ConfigError(
                "http.timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Platform repository credential, from the file or the environment
    pub fn repository_token(&self) -> Option<Credential> {
        resolve_secret(self.repository.token.as_ref(), REPOSITORY_TOKEN_ENV)
    }

    /// Shared hosting credential, from the file or the environment
    pub fn hosting_system_token(&self) -> Option<Credential> {
        resolve_secret(self.hosting.system_token.as_ref(), HOSTING_TOKEN_ENV)
    }
}

fn resolve_secret(value: Option<&Credential>, env_key: &str) -> Option<Credential> {
    value
        .filter(|c| !c.is_blank())
        .cloned()
        .or_else(|| std::env::var(env_key).ok().map(Credential::new))
        .filter(|c| !c.is_blank())
}

/// Repository provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySettings {
    /// Base URL of the REST API
    #[serde(default = "default_repository_url")]
    pub base_url: String,

    /// Platform token used when the caller supplies none
    #[serde(default, skip_serializing)]
    pub token: Option<Credential>,

    /// Organization for requests that name none; unset means the
    /// token owner's personal account
    #[serde(default)]
    pub default_organization: Option<String>,
}

fn default_repository_url() -> String {
    "https://api.github.com".to_string()
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            base_url: default_repository_url(),
            token: None,
            default_organization: None,
        }
    }
}

/// Hosting provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostingSettings {
    /// Base URL of the REST API
    #[serde(default = "default_hosting_url")]
    pub base_url: String,

    /// Shared system token
    #[serde(default, skip_serializing)]
    pub system_token: Option<Credential>,

    /// Team scope for every request
    #[serde(default)]
    pub team_id: Option<String>,
}

fn default_hosting_url() -> String {
    "https://api.vercel.com".to_string()
}

impl Default for HostingSettings {
    fn default() -> Self {
        Self {
            base_url: default_hosting_url(),
            system_token: None,
            team_id: None,
        }
    }
}

/// Shared credential quota
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuotaSettings {
    /// Deployments per user on the shared credential
    #[serde(default = "default_system_deployment_limit")]
    pub system_deployment_limit: u32,

    /// Prompt for a personal credential at or below this many remaining
    #[serde(default = "default_upgrade_prompt_threshold")]
    pub upgrade_prompt_threshold: u32,
}

fn default_system_deployment_limit() -> u32 {
    3
}

fn default_upgrade_prompt_threshold() -> u32 {
    1
}

impl Default for QuotaSettings {
    fn default() -> Self {
        Self {
            system_deployment_limit: default_system_deployment_limit(),
            upgrade_prompt_threshold: default_upgrade_prompt_threshold(),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent to the providers
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("publisher/{}", env!("CARGO_PKG_VERSION"))
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}
