//! Shared test doubles

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use publisher::authn::credential::Credential;
use publisher::deploy::providers::{HostingProvider, ProviderConnector, RepositoryProvider};
use publisher::errors::PublishError;
use publisher::models::deployment::DeploymentRequest;
use publisher::models::project::{ProjectDeploymentFields, ProjectRecord};
use publisher::models::provider::{
    CommitResult, DeploymentHandle, DeploymentInfo, DeploymentSpec, DeploymentState, FileEntry,
    HostingProject, HostingProjectSpec, LinkResult, RepositoryIdentity, RepositorySpec,
};
use publisher::storage::{MemoryStore, ProjectStore};

pub const ORGANIZATION_ACCESSIBLE: &str = "organization_accessible";
pub const CREATE_REPOSITORY: &str = "create_repository";
pub const CREATE_REPOSITORY_IN_ORGANIZATION: &str = "create_repository_in_organization";
pub const COMMIT_FILES: &str = "commit_files";
pub const CREATE_PROJECT: &str = "create_project";
pub const LINK_REPOSITORY: &str = "link_repository";
pub const CREATE_DEPLOYMENT: &str = "create_deployment";
pub const GET_DEPLOYMENT: &str = "get_deployment";
pub const LIST_PROJECT_DEPLOYMENTS: &str = "list_project_deployments";
pub const CANCEL_DEPLOYMENT: &str = "cancel_deployment";
pub const VALIDATE_CREDENTIAL: &str = "validate_credential";

/// Provider calls made in a pipeline run, in order
pub const PIPELINE_CALLS: [&str; 6] = [
    CREATE_REPOSITORY,
    COMMIT_FILES,
    CREATE_PROJECT,
    LINK_REPOSITORY,
    CREATE_DEPLOYMENT,
    GET_DEPLOYMENT,
];

/// Call-counting fake of both providers
#[derive(Default)]
pub struct MockCloud {
    calls: Mutex<HashMap<&'static str, usize>>,
    fail_on: Mutex<Option<&'static str>>,
    failing_project: Mutex<Option<String>>,
    delays: Mutex<HashMap<&'static str, Duration>>,
    org_accessible: Mutex<bool>,
    pub repository_specs: Mutex<Vec<RepositorySpec>>,
    pub commits: Mutex<Vec<(String, String, Vec<FileEntry>)>>,
    pub project_specs: Mutex<Vec<HostingProjectSpec>>,
    pub deployment_specs: Mutex<Vec<DeploymentSpec>>,
}

impl MockCloud {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            org_accessible: Mutex::new(true),
            ..Default::default()
        })
    }

    /// Make one provider method fail with a provider error
    pub fn fail_on(&self, method: &'static str) {
        *self.fail_on.lock().unwrap() = Some(method);
    }

    pub fn set_org_accessible(&self, accessible: bool) {
        *self.org_accessible.lock().unwrap() = accessible;
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// Stop failing
    pub fn recover(&self) {
        *self.fail_on.lock().unwrap() = None;
        *self.failing_project.lock().unwrap() = None;
    }

    /// Make `create_project` fail for one hosting project name only
    pub fn fail_project_named(&self, name: &str) {
        *self.failing_project.lock().unwrap() = Some(name.to_string());
    }

    /// Sleep inside a provider method, yielding to other tasks
    pub fn delay_on(&self, method: &'static str, delay: Duration) {
        self.delays.lock().unwrap().insert(method, delay);
    }

    async fn enter(&self, method: &'static str) -> Result<(), PublishError> {
        *self.calls.lock().unwrap().entry(method).or_insert(0) += 1;
        let delay = self.delays.lock().unwrap().get(method).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_on.lock().unwrap() == Some(method) {
            return Err(PublishError::provider("Mock", format!("{} exploded", method)));
        }
        Ok(())
    }
}

fn identity(owner: &str, name: &str) -> RepositoryIdentity {
    RepositoryIdentity {
        owner: owner.to_string(),
        name: name.to_string(),
        full_name: format!("{}/{}", owner, name),
        url: format!("https://github.com/{}/{}", owner, name),
        default_branch: "main".to_string(),
    }
}

#[async_trait]
impl RepositoryProvider for MockCloud {
    async fn organization_accessible(&self, _organization: &str) -> Result<bool, PublishError> {
        self.enter(ORGANIZATION_ACCESSIBLE).await?;
        Ok(*self.org_accessible.lock().unwrap())
    }

    async fn create_repository(
        &self,
        spec: &RepositorySpec,
    ) -> Result<RepositoryIdentity, PublishError> {
        self.enter(CREATE_REPOSITORY).await?;
        self.repository_specs.lock().unwrap().push(spec.clone());
        Ok(identity("octo", &spec.name))
    }

    async fn create_repository_in_organization(
        &self,
        organization: &str,
        spec: &RepositorySpec,
    ) -> Result<RepositoryIdentity, PublishError> {
        self.enter(CREATE_REPOSITORY_IN_ORGANIZATION).await?;
        self.repository_specs.lock().unwrap().push(spec.clone());
        Ok(identity(organization, &spec.name))
    }

    async fn commit_files(
        &self,
        owner: &str,
        name: &str,
        files: &[FileEntry],
        _message: &str,
    ) -> Result<CommitResult, PublishError> {
        self.enter(COMMIT_FILES).await?;
        self.commits
            .lock()
            .unwrap()
            .push((owner.to_string(), name.to_string(), files.to_vec()));
        Ok(CommitResult {
            sha: "abc123".to_string(),
            url: None,
            files_committed: files.len(),
        })
    }
}

#[async_trait]
impl HostingProvider for MockCloud {
    async fn create_project(
        &self,
        spec: &HostingProjectSpec,
    ) -> Result<HostingProject, PublishError> {
        self.enter(CREATE_PROJECT).await?;
        if self.failing_project.lock().unwrap().as_deref() == Some(spec.name.as_str()) {
            return Err(PublishError::provider("Mock", format!("{} exploded", spec.name)));
        }
        self.project_specs.lock().unwrap().push(spec.clone());
        Ok(HostingProject {
            project_id: "prj_1".to_string(),
            name: spec.name.clone(),
        })
    }

    async fn link_repository(
        &self,
        project_id: &str,
        repository_full_name: &str,
    ) -> Result<LinkResult, PublishError> {
        self.enter(LINK_REPOSITORY).await?;
        Ok(LinkResult {
            project_id: project_id.to_string(),
            repository_full_name: repository_full_name.to_string(),
        })
    }

    async fn create_deployment(
        &self,
        spec: &DeploymentSpec,
    ) -> Result<DeploymentHandle, PublishError> {
        self.enter(CREATE_DEPLOYMENT).await?;
        self.deployment_specs.lock().unwrap().push(spec.clone());
        Ok(DeploymentHandle {
            deployment_id: "dpl_1".to_string(),
            deployment_url: Some(format!("https://{}.vercel.app", spec.project_name)),
            state: DeploymentState::Queued,
        })
    }

    async fn get_deployment(&self, deployment_id: &str) -> Result<DeploymentInfo, PublishError> {
        self.enter(GET_DEPLOYMENT).await?;
        Ok(DeploymentInfo {
            deployment_id: deployment_id.to_string(),
            url: None,
            state: DeploymentState::Building,
            created_at: None,
        })
    }

    async fn list_project_deployments(
        &self,
        _project_id: &str,
        _limit: usize,
    ) -> Result<Vec<DeploymentInfo>, PublishError> {
        self.enter(LIST_PROJECT_DEPLOYMENTS).await?;
        Ok(vec![DeploymentInfo {
            deployment_id: "dpl_1".to_string(),
            url: Some("https://my-app-.vercel.app".to_string()),
            state: DeploymentState::Ready,
            created_at: None,
        }])
    }

    async fn cancel_deployment(&self, _deployment_id: &str) -> Result<bool, PublishError> {
        self.enter(CANCEL_DEPLOYMENT).await?;
        Ok(true)
    }

    async fn validate_credential(&self, token: &Credential) -> Result<bool, PublishError> {
        self.enter(VALIDATE_CREDENTIAL).await?;
        Ok(token.expose() != "rejected")
    }
}

/// Connector handing out the mock, remembering the hosting tokens used
pub struct MockConnector {
    pub cloud: Arc<MockCloud>,
    pub hosting_tokens: Mutex<Vec<String>>,
}

impl MockConnector {
    pub fn new(cloud: Arc<MockCloud>) -> Arc<Self> {
        Arc::new(Self {
            cloud,
            hosting_tokens: Mutex::new(Vec::new()),
        })
    }
}

impl ProviderConnector for MockConnector {
    fn repository(
        &self,
        _credential: Option<&Credential>,
    ) -> Result<Arc<dyn RepositoryProvider>, PublishError> {
        let cloud: Arc<dyn RepositoryProvider> = self.cloud.clone();
        Ok(cloud)
    }

    fn hosting(&self, credential: &Credential) -> Result<Arc<dyn HostingProvider>, PublishError> {
        if credential.is_blank() {
            return Err(PublishError::CredentialError("Hosting token is empty".to_string()));
        }
        self.hosting_tokens
            .lock()
            .unwrap()
            .push(credential.expose().to_string());
        let cloud: Arc<dyn HostingProvider> = self.cloud.clone();
        Ok(cloud)
    }
}

/// Project store whose writes of deployment fields always fail
#[derive(Default)]
pub struct ReadOnlyProjectStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl ProjectStore for ReadOnlyProjectStore {
    async fn get_project(&self, project_id: &str) -> Result<Option<ProjectRecord>, PublishError> {
        self.inner.get_project(project_id).await
    }

    async fn insert_project(&self, project: ProjectRecord) -> Result<(), PublishError> {
        self.inner.insert_project(project).await
    }

    async fn update_deployment_fields(
        &self,
        _project_id: &str,
        _fields: &ProjectDeploymentFields,
    ) -> Result<(), PublishError> {
        Err(PublishError::PersistenceError("disk full".to_string()))
    }
}

/// A valid request for project "p1" of user "u1"
pub fn request(project_name: &str) -> DeploymentRequest {
    let mut files = BTreeMap::new();
    files.insert("index.html".to_string(), "<h1>Hello</h1>".to_string());
    files.insert("src/app.js".to_string(), "console.log('hi')".to_string());

    DeploymentRequest {
        project_id: "p1".to_string(),
        project_name: project_name.to_string(),
        template_key: "nextjs".to_string(),
        files,
        user_id: "u1".to_string(),
        is_private: false,
        organization_name: None,
        repository_credential: None,
        hosting_credential: None,
    }
}

pub fn project(user_id: &str) -> ProjectRecord {
    ProjectRecord::new("p1", user_id, "My App!")
}
