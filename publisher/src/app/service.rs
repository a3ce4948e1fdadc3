//! Deployment service
//!
//! Entry point for callers: checks project ownership, picks the hosting
//! credential (reserving a shared-credential slot), runs the orchestrator
//! and records or releases that usage.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::authn::credential::Credential;
use crate::authn::token_mngr::{TokenManager, TokenManagerExt, UpgradePrompt};
use crate::deploy::orchestrator::Orchestrator;
use crate::deploy::providers::ProviderConnector;
use crate::errors::PublishError;
use crate::models::deployment::{DeploymentRequest, DeploymentResult, DeploymentStatus};
use crate::models::project::ProjectRecord;
use crate::storage::ProjectStore;

pub struct DeploymentService {
    projects: Arc<dyn ProjectStore>,
    connector: Arc<dyn ProviderConnector>,
    token_mngr: Arc<TokenManager>,
    orchestrator: Orchestrator,
}

impl DeploymentService {
    pub fn new(
        projects: Arc<dyn ProjectStore>,
        connector: Arc<dyn ProviderConnector>,
        token_mngr: Arc<TokenManager>,
    ) -> Self {
        let orchestrator = Orchestrator::new(connector.clone(), projects.clone());
        Self {
            projects,
            connector,
            token_mngr,
            orchestrator,
        }
    }

    /// Create repositories under this organization when a request names none
    pub fn with_default_organization(mut self, organization: Option<String>) -> Self {
        self.orchestrator = self.orchestrator.with_default_organization(organization);
        self
    }

    /// Register a new project for a user
    pub async fn create_project(
        &self,
        user_id: &str,
        name: &str,
        template_key: Option<&str>,
    ) -> Result<ProjectRecord, PublishError> {
        if user_id.trim().is_empty() || name.trim().is_empty() {
            return Err(PublishError::ValidationError(
                "A user and a project name are required".to_string(),
            ));
        }

        let mut project = ProjectRecord::new(Uuid::new_v4().to_string(), user_id, name);
        project.template_key = template_key.map(str::to_string);
        self.projects.insert_project(project.clone()).await?;
        info!("Registered project {} for user {}", project.id, user_id);
        Ok(project)
    }

    /// Publish a generated application
    ///
    /// Errors are returned only when the run cannot start: unknown or
    /// foreign project, or no usable hosting credential. Failures inside
    /// the pipeline are reported in the result.
    pub async fn publish(
        &self,
        request: &DeploymentRequest,
    ) -> Result<DeploymentResult, PublishError> {
        self.owned_project(&request.user_id, &request.project_id)
            .await?;

        let selection = self
            .token_mngr
            .select_credential(&request.user_id, request.hosting_credential.as_ref())
            .await?;

        let result = self.orchestrator.deploy(request, &selection).await;

        if result.success {
            if let Err(e) = self
                .token_mngr
                .track_deployment(
                    &request.user_id,
                    &request.project_id,
                    selection.is_system_credential,
                )
                .await
            {
                warn!(
                    "Failed to record usage of user {}: {}",
                    request.user_id, e
                );
            }
        } else if selection.is_system_credential {
            // Failed runs do not count against the quota
            if let Err(e) = self
                .token_mngr
                .release_system_deployment(&request.user_id)
                .await
            {
                warn!(
                    "Failed to release the quota slot of user {}: {}",
                    request.user_id, e
                );
            }
        }

        Ok(result)
    }

    /// Deployment status of one of the user's projects
    pub async fn status(
        &self,
        user_id: &str,
        project_id: &str,
        explicit: Option<&Credential>,
    ) -> Result<DeploymentStatus, PublishError> {
        self.owned_project(user_id, project_id).await?;
        let credential = self.token_mngr.lookup_credential(user_id, explicit).await?;
        self.orchestrator
            .get_deployment_status(project_id, credential.as_ref())
            .await
    }

    /// Cancel a running deployment
    pub async fn cancel(
        &self,
        user_id: &str,
        deployment_id: &str,
        explicit: Option<&Credential>,
    ) -> Result<bool, PublishError> {
        let credential = self
            .token_mngr
            .lookup_credential(user_id, explicit)
            .await?
            .ok_or_else(|| {
                PublishError::CredentialError(
                    "No hosting token available to cancel the deployment".to_string(),
                )
            })?;
        self.orchestrator
            .cancel_deployment(deployment_id, &credential)
            .await
    }

    /// Shared-credential quota of a user
    pub async fn quota(&self, user_id: &str) -> Result<UpgradePrompt, PublishError> {
        self.token_mngr.should_prompt_upgrade(user_id).await
    }

    /// Validate and save a user's personal hosting credential
    pub async fn connect_credential(
        &self,
        user_id: &str,
        credential: &Credential,
    ) -> Result<(), PublishError> {
        let hosting = self.connector.hosting(credential)?;
        self.token_mngr
            .connect_personal_credential(user_id, credential, hosting.as_ref())
            .await
    }

    async fn owned_project(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<ProjectRecord, PublishError> {
        // A foreign project reads as missing
        match self.projects.get_project(project_id).await? {
            Some(project) if project.user_id == user_id => Ok(project),
            _ => Err(PublishError::NotFound(format!(
                "Project {} for user {}",
                project_id, user_id
            ))),
        }
    }
}
