//! Provider value types
//!
//! Provider-neutral shapes exchanged between the pipeline and the
//! repository / hosting provider interfaces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySpec {
    pub name: String,
    pub description: Option<String>,
    pub private: bool,
    pub auto_init: bool,
}

/// Identity of a created repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryIdentity {
    pub owner: String,
    pub name: String,
    /// "owner/name"
    pub full_name: String,
    pub url: String,
    pub default_branch: String,
}

/// A file to commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub content: String,
}

/// Result of an atomic multi-file commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitResult {
    pub sha: String,
    pub url: Option<String>,
    pub files_committed: usize,
}

/// Framework preset on the hosting provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    NextJs,
    Vite,
    Vue,
    SvelteKit,
    Nuxt,
    Astro,
    Angular,
    Other,
}

impl Framework {
    /// Provider preset slug; `None` means no preset
    pub fn preset(&self) -> Option<&'static str> {
        match self {
            Framework::NextJs => Some("nextjs"),
            Framework::Vite => Some("vite"),
            Framework::Vue => Some("vue"),
            Framework::SvelteKit => Some("sveltekit"),
            Framework::Nuxt => Some("nuxtjs"),
            Framework::Astro => Some("astro"),
            Framework::Angular => Some("angular"),
            Framework::Other => None,
        }
    }
}

/// Hosting project to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostingProjectSpec {
    pub name: String,
    pub framework: Framework,
    pub repository_full_name: String,
}

/// A created hosting project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostingProject {
    pub project_id: String,
    pub name: String,
}

/// Result of linking a repository to a hosting project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkResult {
    pub project_id: String,
    pub repository_full_name: String,
}

/// Deployment to trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub project_id: String,
    pub project_name: String,
    pub repository_full_name: String,
    /// Git ref to build
    pub reference: String,
}

/// Build state reported by the hosting provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentState {
    Queued,
    Initializing,
    Building,
    Ready,
    Error,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl DeploymentState {
    /// Parse the provider's state string
    pub fn from_provider(state: &str) -> Self {
        match state.to_ascii_uppercase().as_str() {
            "QUEUED" => DeploymentState::Queued,
            "INITIALIZING" => DeploymentState::Initializing,
            "BUILDING" => DeploymentState::Building,
            "READY" => DeploymentState::Ready,
            "ERROR" => DeploymentState::Error,
            "CANCELED" | "CANCELLED" => DeploymentState::Canceled,
            _ => DeploymentState::Unknown,
        }
    }

    /// Whether the build has finished one way or another
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeploymentState::Ready | DeploymentState::Error | DeploymentState::Canceled
        )
    }
}

/// A triggered deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentHandle {
    pub deployment_id: String,
    pub deployment_url: Option<String>,
    pub state: DeploymentState,
}

/// Deployment status as reported by the hosting provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentInfo {
    pub deployment_id: String,
    pub url: Option<String>,
    pub state: DeploymentState,
    pub created_at: Option<DateTime<Utc>>,
}
