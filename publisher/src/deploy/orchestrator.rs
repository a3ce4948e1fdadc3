//! Deployment orchestrator
//!
//! Runs the seven-step publish pipeline for one request: validate, create
//! the repository, push the files, create the hosting project, link it,
//! trigger a deployment and poll its status once. Steps run strictly in
//! order; the first failure ends the run and is recorded in the returned
//! step trail instead of being raised.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::authn::credential::{Credential, CredentialSelection};
use crate::deploy::fsm::{step_message, StepTrail};
use crate::deploy::naming::{detect_framework, sanitize_repository_name};
use crate::deploy::providers::{HostingProvider, ProviderConnector, RepositoryProvider};
use crate::errors::PublishError;
use crate::models::deployment::{
    DeploymentRequest, DeploymentResult, DeploymentStatus, HostingStatus, RepositoryStatus, Step,
    StepStatus,
};
use crate::models::project::ProjectDeploymentFields;
use crate::models::provider::{
    DeploymentHandle, DeploymentInfo, DeploymentSpec, FileEntry, HostingProject,
    HostingProjectSpec, RepositoryIdentity, RepositorySpec,
};
use crate::storage::ProjectStore;

/// Minimum project name length, in characters
pub const MIN_PROJECT_NAME_LEN: usize = 3;

/// Message of the single commit carrying the generated files
pub const COMMIT_MESSAGE: &str = "Initial commit: generated application files";

/// Outputs collected while the pipeline runs
#[derive(Default)]
struct RunOutputs {
    repository: Option<RepositoryIdentity>,
    hosting_project: Option<HostingProject>,
    deployment: Option<DeploymentHandle>,
    status: Option<DeploymentInfo>,
}

/// Deployment orchestrator
pub struct Orchestrator {
    connector: Arc<dyn ProviderConnector>,
    store: Arc<dyn ProjectStore>,
    default_organization: Option<String>,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(connector: Arc<dyn ProviderConnector>, store: Arc<dyn ProjectStore>) -> Self {
        Self {
            connector,
            store,
            default_organization: None,
        }
    }

    /// Organization used for requests that name none
    pub fn with_default_organization(mut self, organization: Option<String>) -> Self {
        self.default_organization = organization.filter(|org| !org.trim().is_empty());
        self
    }

    /// Run the pipeline
    ///
    /// Never fails: provider and validation errors end up in the failing
    /// step record, and a failed write of the project record is reported
    /// through `persisted`.
    pub async fn deploy(
        &self,
        request: &DeploymentRequest,
        selection: &CredentialSelection,
    ) -> DeploymentResult {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("deploy", run_id = %run_id, project_id = %request.project_id);

        async move {
            info!(
                "Deploying project {} ({} files, system credential: {})",
                request.project_name,
                request.files.len(),
                selection.is_system_credential
            );

            let mut trail = StepTrail::new();
            let mut outputs = RunOutputs::default();
            let outcome = self
                .run_steps(request, selection, &mut trail, &mut outputs)
                .await;

            let deployment_url = outputs
                .deployment
                .as_ref()
                .and_then(|d| d.deployment_url.clone())
                .or_else(|| outputs.status.as_ref().and_then(|s| s.url.clone()));

            let mut result = DeploymentResult {
                run_id: run_id.clone(),
                success: outcome.is_ok() && trail.is_complete(),
                repository_url: outputs.repository.as_ref().map(|r| r.url.clone()),
                repository_full_name: outputs.repository.as_ref().map(|r| r.full_name.clone()),
                hosting_project_id: outputs
                    .hosting_project
                    .as_ref()
                    .map(|p| p.project_id.clone()),
                deployment_id: outputs
                    .deployment
                    .as_ref()
                    .map(|d| d.deployment_id.clone()),
                deployment_url,
                deployment_state: outputs.status.as_ref().map(|s| s.state),
                error: outcome.err().map(|e| e.to_string()),
                steps: trail.into_records(),
                persisted: false,
            };

            if result.success {
                result.persisted = self.persist(&request.project_id, &result).await;
                info!("Deployment triggered for project {}", request.project_id);
            } else {
                error!(
                    "Deployment of project {} failed: {}",
                    request.project_id,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn run_steps(
        &self,
        request: &DeploymentRequest,
        selection: &CredentialSelection,
        trail: &mut StepTrail,
        outputs: &mut RunOutputs,
    ) -> Result<(), PublishError> {
        let organization = self.organization(request);

        // 1. Validate
        let (repositories, hosting) =
            run_step(trail, Step::Validate, self.validate(request, selection)).await?;

        // 2. Create repository
        let spec = RepositorySpec {
            name: sanitize_repository_name(&request.project_name),
            description: Some(format!(
                "{} (generated from the {} template)",
                request.project_name, request.template_key
            )),
            private: request.is_private,
            auto_init: true,
        };
        let repository = run_step(trail, Step::CreateRepository, async {
            match organization {
                Some(org) => repositories.create_repository_in_organization(org, &spec).await,
                None => repositories.create_repository(&spec).await,
            }
        })
        .await?;
        outputs.repository = Some(repository.clone());

        // 3. Push files
        let files: Vec<FileEntry> = request
            .files
            .iter()
            .map(|(path, content)| FileEntry {
                path: path.clone(),
                content: content.clone(),
            })
            .collect();
        let commit = run_step(
            trail,
            Step::PushFiles,
            repositories.commit_files(&repository.owner, &repository.name, &files, COMMIT_MESSAGE),
        )
        .await?;
        info!("Pushed {} files as {}", commit.files_committed, commit.sha);

        // 4. Create hosting project
        let project_spec = HostingProjectSpec {
            name: spec.name.clone(),
            framework: detect_framework(&request.template_key),
            repository_full_name: repository.full_name.clone(),
        };
        let project = run_step(
            trail,
            Step::CreateHostingProject,
            hosting.create_project(&project_spec),
        )
        .await?;
        outputs.hosting_project = Some(project.clone());

        // 5. Link repository
        run_step(
            trail,
            Step::LinkRepository,
            hosting.link_repository(&project.project_id, &repository.full_name),
        )
        .await?;

        // 6. Trigger deployment
        let deployment_spec = DeploymentSpec {
            project_id: project.project_id.clone(),
            project_name: spec.name.clone(),
            repository_full_name: repository.full_name.clone(),
            reference: repository.default_branch.clone(),
        };
        let deployment = run_step(
            trail,
            Step::TriggerDeployment,
            hosting.create_deployment(&deployment_spec),
        )
        .await?;
        outputs.deployment = Some(deployment.clone());

        // 7. Monitor deployment: one poll, the build is not awaited
        let status = run_step(
            trail,
            Step::MonitorDeployment,
            hosting.get_deployment(&deployment.deployment_id),
        )
        .await?;
        if status.state.is_terminal() {
            info!(
                "Deployment {} finished as {:?}",
                deployment.deployment_id, status.state
            );
        } else {
            info!(
                "Deployment {} is {:?}; poll its status for the outcome",
                deployment.deployment_id, status.state
            );
        }
        outputs.status = Some(status);

        Ok(())
    }

    async fn validate(
        &self,
        request: &DeploymentRequest,
        selection: &CredentialSelection,
    ) -> Result<(Arc<dyn RepositoryProvider>, Arc<dyn HostingProvider>), PublishError> {
        validate_request(request)?;

        let repositories = self
            .connector
            .repository(request.repository_credential.as_ref())?;
        let hosting = self.connector.hosting(&selection.token)?;

        if let Some(org) = self.organization(request) {
            if !repositories.organization_accessible(org).await? {
                return Err(PublishError::ValidationError(format!(
                    "Organization '{}' is not accessible with the supplied repository token",
                    org
                )));
            }
        }

        Ok((repositories, hosting))
    }

    fn organization<'a>(&'a self, request: &'a DeploymentRequest) -> Option<&'a str> {
        request
            .organization_name
            .as_deref()
            .map(str::trim)
            .filter(|org| !org.is_empty())
            .or_else(|| self.default_organization.as_deref().map(str::trim))
    }

    async fn persist(&self, project_id: &str, result: &DeploymentResult) -> bool {
        let fields = ProjectDeploymentFields {
            repository_url: result.repository_url.clone(),
            repository_created: result.repository_url.is_some(),
            hosting_project_id: result.hosting_project_id.clone(),
            hosting_connected: result.hosting_project_id.is_some(),
            deployment_url: result.deployment_url.clone(),
            updated_at: Utc::now(),
        };

        match self.store.update_deployment_fields(project_id, &fields).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to record deployment of project {}: {}", project_id, e);
                false
            }
        }
    }

    /// Status snapshot of a project's deployment
    ///
    /// The hosting provider is only contacted when a hosting project is
    /// recorded for the project.
    pub async fn get_deployment_status(
        &self,
        project_id: &str,
        hosting_credential: Option<&Credential>,
    ) -> Result<DeploymentStatus, PublishError> {
        let project = self
            .store
            .get_project(project_id)
            .await?
            .ok_or_else(|| PublishError::NotFound(format!("Project {}", project_id)))?;

        let mut status = DeploymentStatus {
            project_id: project.id.clone(),
            repository: RepositoryStatus {
                created: project.repository_created,
                url: project.repository_url.clone(),
            },
            hosting: HostingStatus {
                connected: project.hosting_connected && project.hosting_project_id.is_some(),
                project_id: project.hosting_project_id.clone(),
            },
            deployment_url: project.deployment_url.clone(),
            latest_deployment: None,
        };

        if let Some(hosting_project_id) = &project.hosting_project_id {
            let credential = hosting_credential.ok_or_else(|| {
                PublishError::CredentialError(
                    "A hosting token is required to read deployment status".to_string(),
                )
            })?;
            let hosting = self.connector.hosting(credential)?;
            status.latest_deployment = hosting
                .list_project_deployments(hosting_project_id, 1)
                .await?
                .into_iter()
                .next();
        }

        Ok(status)
    }

    /// Cancel a running deployment
    pub async fn cancel_deployment(
        &self,
        deployment_id: &str,
        hosting_credential: &Credential,
    ) -> Result<bool, PublishError> {
        let hosting = self.connector.hosting(hosting_credential)?;
        let cancelled = hosting.cancel_deployment(deployment_id).await?;
        info!("Cancel deployment {}: {}", deployment_id, cancelled);
        Ok(cancelled)
    }
}

/// Run one step against the trail
async fn run_step<T, F>(trail: &mut StepTrail, step: Step, action: F) -> Result<T, PublishError>
where
    F: Future<Output = Result<T, PublishError>>,
{
    trail.begin(step).map_err(PublishError::Internal)?;
    info!("{}", step_message(step, StepStatus::InProgress));

    match action.await {
        Ok(value) => {
            trail.complete().map_err(PublishError::Internal)?;
            info!("{}", step_message(step, StepStatus::Completed));
            Ok(value)
        }
        Err(e) => {
            error!("{}: {}", step_message(step, StepStatus::Failed), e);
            trail.fail(e.to_string()).map_err(PublishError::Internal)?;
            Err(e)
        }
    }
}

/// Check the caller-supplied fields of a request
pub fn validate_request(request: &DeploymentRequest) -> Result<(), PublishError> {
    if request.project_name.trim().chars().count() < MIN_PROJECT_NAME_LEN {
        return Err(PublishError::ValidationError(format!(
            "Project name must be at least {} characters long",
            MIN_PROJECT_NAME_LEN
        )));
    }

    if sanitize_repository_name(&request.project_name)
        .trim_matches('-')
        .is_empty()
    {
        return Err(PublishError::ValidationError(
            "Project name must contain at least one letter or digit".to_string(),
        ));
    }

    if request.template_key.trim().is_empty() {
        return Err(PublishError::ValidationError(
            "Template key is required".to_string(),
        ));
    }

    if request.files.is_empty() {
        return Err(PublishError::ValidationError(
            "At least one file is required".to_string(),
        ));
    }

    if let Some(path) = request.files.keys().find(|p| !is_relative_path(p)) {
        return Err(PublishError::ValidationError(format!(
            "File path must be relative and stay inside the repository: '{}'",
            path
        )));
    }

    Ok(())
}

fn is_relative_path(path: &str) -> bool {
    !path.trim().is_empty()
        && !path.starts_with('/')
        && !path.starts_with('\\')
        && path.split(['/', '\\']).all(|segment| segment != "..")
}
