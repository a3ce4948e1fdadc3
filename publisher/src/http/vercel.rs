//! Vercel hosting provider

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use provider_api::vercel::{
    CreateDeploymentRequest, CreateProjectRequest, Deployment, DeploymentList, GitRepository,
    GitSource, Project,
};
use tracing::info;

use crate::authn::credential::Credential;
use crate::deploy::providers::HostingProvider;
use crate::errors::PublishError;
use crate::http::client::{encode, HttpClient};
use crate::models::provider::{
    DeploymentHandle, DeploymentInfo, DeploymentSpec, DeploymentState, HostingProject,
    HostingProjectSpec, LinkResult,
};

/// Vercel REST client bound to one token
pub struct VercelClient {
    http: HttpClient,
    team_id: Option<String>,
}

impl VercelClient {
    pub fn new(http: HttpClient, team_id: Option<String>) -> Self {
        Self {
            http,
            team_id: team_id.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Append the team scope to a path
    fn scoped(&self, path: &str) -> String {
        match &self.team_id {
            Some(team_id) => {
                let separator = if path.contains('?') { '&' } else { '?' };
                format!("{}{}teamId={}", path, separator, encode(team_id))
            }
            None => path.to_string(),
        }
    }
}

fn https_url(host: Option<String>) -> Option<String> {
    host.map(|h| {
        if h.starts_with("http://") || h.starts_with("https://") {
            h
        } else {
            format!("https://{}", h)
        }
    })
}

fn timestamp(millis: Option<i64>) -> Option<DateTime<Utc>> {
    millis.and_then(DateTime::from_timestamp_millis)
}

fn deployment_info(deployment: Deployment) -> DeploymentInfo {
    DeploymentInfo {
        deployment_id: deployment.id,
        url: https_url(deployment.url),
        state: deployment
            .ready_state
            .as_deref()
            .map(DeploymentState::from_provider)
            .unwrap_or(DeploymentState::Unknown),
        created_at: timestamp(deployment.created_at),
    }
}

#[async_trait]
impl HostingProvider for VercelClient {
    async fn create_project(
        &self,
        spec: &HostingProjectSpec,
    ) -> Result<HostingProject, PublishError> {
        let body = CreateProjectRequest {
            name: spec.name.clone(),
            framework: spec.framework.preset().map(str::to_string),
            git_repository: Some(GitRepository::github(&spec.repository_full_name)),
        };
        let project: Project = self.http.post(&self.scoped("/v10/projects"), &body).await?;
        info!("Created hosting project {} ({})", project.name, project.id);

        Ok(HostingProject {
            project_id: project.id,
            name: project.name,
        })
    }

    async fn link_repository(
        &self,
        project_id: &str,
        repository_full_name: &str,
    ) -> Result<LinkResult, PublishError> {
        let path = self.scoped(&format!("/v9/projects/{}/link", encode(project_id)));
        let project: Project = self
            .http
            .post(&path, &GitRepository::github(repository_full_name))
            .await?;

        let linked_repo = project
            .link
            .and_then(|link| match (link.org, link.repo) {
                (Some(org), Some(repo)) if !repo.contains('/') => Some(format!("{}/{}", org, repo)),
                (_, repo) => repo,
            })
            .unwrap_or_else(|| repository_full_name.to_string());

        Ok(LinkResult {
            project_id: project.id,
            repository_full_name: linked_repo,
        })
    }

    async fn create_deployment(
        &self,
        spec: &DeploymentSpec,
    ) -> Result<DeploymentHandle, PublishError> {
        let (org, repo) = spec
            .repository_full_name
            .split_once('/')
            .ok_or_else(|| {
                PublishError::Internal(format!(
                    "Repository name is not owner/name: {}",
                    spec.repository_full_name
                ))
            })?;

        let body = CreateDeploymentRequest {
            name: spec.project_name.clone(),
            project: spec.project_id.clone(),
            target: "production".to_string(),
            git_source: GitSource {
                kind: "github".to_string(),
                org: org.to_string(),
                repo: repo.to_string(),
                reference: spec.reference.clone(),
            },
        };
        let deployment: Deployment = self
            .http
            .post(&self.scoped("/v13/deployments"), &body)
            .await?;
        info!("Triggered deployment {}", deployment.id);

        let state = deployment
            .ready_state
            .as_deref()
            .map(DeploymentState::from_provider)
            .unwrap_or(DeploymentState::Queued);

        Ok(DeploymentHandle {
            deployment_id: deployment.id,
            deployment_url: https_url(deployment.url),
            state,
        })
    }

    async fn get_deployment(&self, deployment_id: &str) -> Result<DeploymentInfo, PublishError> {
        let path = self.scoped(&format!("/v13/deployments/{}", encode(deployment_id)));
        let deployment: Deployment = self.http.get(&path).await?;
        Ok(deployment_info(deployment))
    }

    async fn list_project_deployments(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<DeploymentInfo>, PublishError> {
        let path = self.scoped(&format!(
            "/v6/deployments?projectId={}&limit={}",
            encode(project_id),
            limit
        ));
        let list: DeploymentList = self.http.get(&path).await?;

        Ok(list
            .deployments
            .into_iter()
            .map(|d| DeploymentInfo {
                deployment_id: d.uid,
                url: https_url(d.url),
                state: d
                    .state
                    .as_deref()
                    .map(DeploymentState::from_provider)
                    .unwrap_or(DeploymentState::Unknown),
                created_at: timestamp(d.created),
            })
            .collect())
    }

    async fn cancel_deployment(&self, deployment_id: &str) -> Result<bool, PublishError> {
        let path = self.scoped(&format!("/v12/deployments/{}/cancel", encode(deployment_id)));
        let deployment: Deployment = self.http.patch(&path, &serde_json::json!({})).await?;
        let info = deployment_info(deployment);
        info!("Cancel requested for {}: {:?}", deployment_id, info.state);
        Ok(info.state == DeploymentState::Canceled)
    }

    async fn validate_credential(&self, token: &Credential) -> Result<bool, PublishError> {
        self.http.check_credential("/v2/user", token).await
    }
}
