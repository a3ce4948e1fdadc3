//! Provider interfaces consumed by the pipeline

use std::sync::Arc;

use async_trait::async_trait;

use crate::authn::credential::Credential;
use crate::errors::PublishError;
use crate::models::provider::{
    CommitResult, DeploymentHandle, DeploymentInfo, DeploymentSpec, FileEntry, HostingProject,
    HostingProjectSpec, LinkResult, RepositoryIdentity, RepositorySpec,
};

/// Source-control provider bound to one credential
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    /// Whether the credential can create repositories in the organization
    async fn organization_accessible(&self, organization: &str) -> Result<bool, PublishError>;

    /// Create a repository owned by the credential's user
    async fn create_repository(
        &self,
        spec: &RepositorySpec,
    ) -> Result<RepositoryIdentity, PublishError>;

    /// Create a repository inside an organization
    async fn create_repository_in_organization(
        &self,
        organization: &str,
        spec: &RepositorySpec,
    ) -> Result<RepositoryIdentity, PublishError>;

    /// Commit all files as a single commit on the default branch
    async fn commit_files(
        &self,
        owner: &str,
        name: &str,
        files: &[FileEntry],
        message: &str,
    ) -> Result<CommitResult, PublishError>;
}

/// Hosting provider bound to one credential
#[async_trait]
pub trait HostingProvider: Send + Sync {
    /// Create a hosting project
    async fn create_project(
        &self,
        spec: &HostingProjectSpec,
    ) -> Result<HostingProject, PublishError>;

    /// Connect a project to a repository
    async fn link_repository(
        &self,
        project_id: &str,
        repository_full_name: &str,
    ) -> Result<LinkResult, PublishError>;

    /// Trigger a deployment
    async fn create_deployment(
        &self,
        spec: &DeploymentSpec,
    ) -> Result<DeploymentHandle, PublishError>;

    /// Get a deployment
    async fn get_deployment(&self, deployment_id: &str) -> Result<DeploymentInfo, PublishError>;

    /// Most recent deployments of a project, newest first
    async fn list_project_deployments(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<DeploymentInfo>, PublishError>;

    /// Cancel a running deployment
    async fn cancel_deployment(&self, deployment_id: &str) -> Result<bool, PublishError>;

    /// Check whether a token is accepted by the provider
    async fn validate_credential(&self, token: &Credential) -> Result<bool, PublishError>;
}

/// Builds provider handles for the credentials of one request
pub trait ProviderConnector: Send + Sync {
    /// Repository provider for the caller's credential, or the platform credential
    fn repository(
        &self,
        credential: Option<&Credential>,
    ) -> Result<Arc<dyn RepositoryProvider>, PublishError>;

    /// Hosting provider for the selected credential
    fn hosting(&self, credential: &Credential) -> Result<Arc<dyn HostingProvider>, PublishError>;
}
