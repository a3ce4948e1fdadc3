//! Project and usage records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::PublishError;

/// A persisted project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Unique project ID
    pub id: String,

    /// Owner user ID
    pub user_id: String,

    /// Project name
    pub name: String,

    /// Template the project was generated from
    #[serde(default)]
    pub template_key: Option<String>,

    #[serde(default)]
    pub repository_url: Option<String>,

    #[serde(default)]
    pub repository_created: bool,

    #[serde(default)]
    pub hosting_project_id: Option<String>,

    #[serde(default)]
    pub hosting_connected: bool,

    #[serde(default)]
    pub deployment_url: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl ProjectRecord {
    /// Create a new, not yet deployed project
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            name: name.into(),
            template_key: None,
            repository_url: None,
            repository_created: false,
            hosting_project_id: None,
            hosting_connected: false,
            deployment_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the deployment fields with the outputs of a run
    pub fn apply(&mut self, fields: &ProjectDeploymentFields) {
        self.repository_url = fields.repository_url.clone();
        self.repository_created = fields.repository_created;
        self.hosting_project_id = fields.hosting_project_id.clone();
        self.hosting_connected = fields.hosting_connected;
        self.deployment_url = fields.deployment_url.clone();
        self.updated_at = fields.updated_at;
    }
}

/// Subset of the project record written after a successful run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDeploymentFields {
    pub repository_url: Option<String>,
    pub repository_created: bool,
    pub hosting_project_id: Option<String>,
    pub hosting_connected: bool,
    pub deployment_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user usage of the shared hosting credential
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUsage {
    pub user_id: String,

    /// Shared-credential deployments, counted when reserved and given back
    /// when the run fails
    #[serde(default)]
    pub system_deployments: u32,

    /// Whether the user's last deployment used the shared credential
    #[serde(default)]
    pub last_used_system_credential: bool,

    #[serde(default)]
    pub last_project_id: Option<String>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserUsage {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Take one shared-credential slot if the quota allows it
    pub fn reserve(&mut self, limit: u32) -> Result<(), PublishError> {
        if self.system_deployments >= limit {
            return Err(PublishError::QuotaExceeded {
                limit,
                used: self.system_deployments,
            });
        }
        self.system_deployments += 1;
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Give back a slot taken by [`UserUsage::reserve`]
    pub fn release(&mut self) {
        self.system_deployments = self.system_deployments.saturating_sub(1);
        self.updated_at = Some(Utc::now());
    }

    /// Record the credential kind and project of a finished deployment
    pub fn record(&mut self, project_id: &str, system_credential: bool) {
        self.last_used_system_credential = system_credential;
        self.last_project_id = Some(project_id.to_string());
        self.updated_at = Some(Utc::now());
    }
}
