//! GitHub REST models

use serde::{Deserialize, Serialize};

/// Create repository request (`POST /user/repos`, `POST /orgs/{org}/repos`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRepositoryRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub private: bool,
    pub auto_init: bool,
}

/// Repository owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// Repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub owner: Owner,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default)]
    pub private: bool,
}

fn default_branch() -> String {
    "main".to_string()
}

/// Organization membership (`GET /user/memberships/orgs/{org}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgMembership {
    /// "active" or "pending"
    pub state: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Git object pointer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitObject {
    pub sha: String,
}

/// Git reference (`GET /repos/{owner}/{repo}/git/ref/heads/{branch}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub reference: String,
    pub object: GitObject,
}

/// Git commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitCommit {
    pub sha: String,
    pub tree: GitObject,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Tree entry with inline content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

impl TreeEntry {
    /// Regular (non-executable) file blob
    pub fn file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: "100644".to_string(),
            kind: "blob".to_string(),
            content: content.into(),
        }
    }
}

/// Create tree request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTreeRequest {
    pub base_tree: String,
    pub tree: Vec<TreeEntry>,
}

/// Create commit request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommitRequest {
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
}

/// Update reference request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRefRequest {
    pub sha: String,
    pub force: bool,
}
