//! Deployment models

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::authn::credential::Credential;
use crate::models::provider::{DeploymentInfo, DeploymentState};

/// A request to publish a generated application
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentRequest {
    /// Project ID in the persistence store
    pub project_id: String,

    /// Human project name, at least 3 characters
    pub project_name: String,

    /// Template the application was generated from (e.g. "nextjs", "static")
    pub template_key: String,

    /// Relative path -> file content
    pub files: BTreeMap<String, String>,

    /// Requesting user
    pub user_id: String,

    /// Create the repository as private
    #[serde(default)]
    pub is_private: bool,

    /// Create the repository inside this organization
    #[serde(default)]
    pub organization_name: Option<String>,

    /// Caller-supplied repository provider token
    #[serde(default)]
    pub repository_credential: Option<Credential>,

    /// Caller-supplied hosting provider token
    #[serde(default)]
    pub hosting_credential: Option<Credential>,
}

/// Pipeline step, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Validate,
    CreateRepository,
    PushFiles,
    CreateHostingProject,
    LinkRepository,
    TriggerDeployment,
    MonitorDeployment,
}

impl Step {
    /// All steps in execution order
    pub const ALL: [Step; 7] = [
        Step::Validate,
        Step::CreateRepository,
        Step::PushFiles,
        Step::CreateHostingProject,
        Step::LinkRepository,
        Step::TriggerDeployment,
        Step::MonitorDeployment,
    ];

    /// Zero-based position in the pipeline
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Step that follows this one, if any
    pub fn next(&self) -> Option<Step> {
        Step::ALL.get(self.index() + 1).copied()
    }
}

/// Status of a step record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    InProgress,
    Completed,
    Failed,
}

/// One entry of the audit trail of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: Step,
    pub status: StepStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of one orchestration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentResult {
    /// Per-run identifier, also present in log lines
    pub run_id: String,

    pub success: bool,

    pub repository_url: Option<String>,
    pub repository_full_name: Option<String>,
    pub hosting_project_id: Option<String>,
    pub deployment_id: Option<String>,
    pub deployment_url: Option<String>,

    /// State seen by the single monitor poll
    pub deployment_state: Option<DeploymentState>,

    /// Error detail of the failing step
    pub error: Option<String>,

    /// Ordered step trail
    pub steps: Vec<StepRecord>,

    /// Whether the outputs were written to the project record
    pub persisted: bool,
}

impl DeploymentResult {
    /// Step that failed, if the run failed
    pub fn failed_step(&self) -> Option<Step> {
        self.steps
            .last()
            .filter(|record| record.status == StepStatus::Failed)
            .map(|record| record.step)
    }
}

/// Repository half of a status snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryStatus {
    pub created: bool,
    pub url: Option<String>,
}

/// Hosting half of a status snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostingStatus {
    pub connected: bool,
    pub project_id: Option<String>,
}

/// Deployment status snapshot for a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentStatus {
    pub project_id: String,
    pub repository: RepositoryStatus,
    pub hosting: HostingStatus,
    pub deployment_url: Option<String>,
    pub latest_deployment: Option<DeploymentInfo>,
}
