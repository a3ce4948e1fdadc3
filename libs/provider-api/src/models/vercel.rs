//! Vercel REST models

use serde::{Deserialize, Serialize};

/// Git repository reference attached to a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitRepository {
    #[serde(rename = "type")]
    pub kind: String,
    pub repo: String,
}

impl GitRepository {
    pub fn github(full_name: impl Into<String>) -> Self {
        Self {
            kind: "github".to_string(),
            repo: full_name.into(),
        }
    }
}

/// Create project request (`POST /v10/projects`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    /// `None` selects the "Other" preset
    pub framework: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_repository: Option<GitRepository>,
}

/// Project link state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLink {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub production_branch: Option<String>,
}

/// Project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub link: Option<ProjectLink>,
}

/// Link repository request (`POST /v9/projects/{id}/link`)
pub type LinkRepositoryRequest = GitRepository;

/// Git source of a deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub org: String,
    pub repo: String,
    #[serde(rename = "ref")]
    pub reference: String,
}

/// Create deployment request (`POST /v13/deployments`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeploymentRequest {
    pub name: String,
    pub project: String,
    pub target: String,
    pub git_source: GitSource,
}

/// Deployment (`/v13/deployments`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    /// Hostname without scheme
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ready_state: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Deployment list entry (`GET /v6/deployments`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentSummary {
    pub uid: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub created: Option<i64>,
}

/// Deployment list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentList {
    pub deployments: Vec<DeploymentSummary>,
}
