//! JSON file store
//!
//! Keeps every project and user record in one JSON document. Each write
//! rewrites the whole document through a temp file and rename, and writers
//! are serialized through a mutex so read-modify-write cycles never
//! interleave inside one process.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::authn::credential::Credential;
use crate::errors::PublishError;
use crate::filesys::file::File;
use crate::models::project::{ProjectDeploymentFields, ProjectRecord, UserUsage};
use crate::storage::{ProjectStore, UsageStore};

/// Stored user account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserAccount {
    #[serde(flatten)]
    usage: UserUsage,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    personal_token: Option<String>,
}

/// On-disk document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    projects: BTreeMap<String, ProjectRecord>,

    #[serde(default)]
    users: BTreeMap<String, UserAccount>,
}

impl StoreDocument {
    /// Account of a user, created on first use
    fn account(&mut self, user_id: &str) -> &mut UserAccount {
        self.users
            .entry(user_id.to_string())
            .or_insert_with(|| UserAccount {
                usage: UserUsage::new(user_id),
                personal_token: None,
            })
    }
}

/// Store backed by a single JSON file
pub struct JsonFileStore {
    file: File,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store; the file is created on first write
    pub fn new(file: File) -> Self {
        Self {
            file,
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<StoreDocument, PublishError> {
        if !self.file.exists().await {
            return Ok(StoreDocument::default());
        }
        self.file
            .read_json()
            .await
            .map_err(|e| persistence_error(&self.file, e))
    }

    async fn save(&self, document: &StoreDocument) -> Result<(), PublishError> {
        self.file
            .write_json_atomic(document)
            .await
            .map_err(|e| persistence_error(&self.file, e))?;
        // The document holds personal tokens
        self.file
            .set_permissions_600()
            .await
            .map_err(|e| persistence_error(&self.file, e))?;
        debug!("Store written to {}", self.file.path().display());
        Ok(())
    }
}

fn persistence_error(file: &File, err: PublishError) -> PublishError {
    PublishError::PersistenceError(format!("{}: {}", file.path().display(), err))
}

#[async_trait]
impl ProjectStore for JsonFileStore {
    async fn get_project(&self, project_id: &str) -> Result<Option<ProjectRecord>, PublishError> {
        let _guard = self.lock.lock().await;
        let document = self.load().await?;
        Ok(document.projects.get(project_id).cloned())
    }

    async fn insert_project(&self, project: ProjectRecord) -> Result<(), PublishError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        document.projects.insert(project.id.clone(), project);
        self.save(&document).await
    }

    async fn update_deployment_fields(
        &self,
        project_id: &str,
        fields: &ProjectDeploymentFields,
    ) -> Result<(), PublishError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        let project = document
            .projects
            .get_mut(project_id)
            .ok_or_else(|| PublishError::NotFound(format!("Project {}", project_id)))?;
        project.apply(fields);
        self.save(&document).await
    }
}

#[async_trait]
impl UsageStore for JsonFileStore {
    async fn user_usage(&self, user_id: &str) -> Result<UserUsage, PublishError> {
        let _guard = self.lock.lock().await;
        let document = self.load().await?;
        Ok(document
            .users
            .get(user_id)
            .map(|account| account.usage.clone())
            .unwrap_or_else(|| UserUsage::new(user_id)))
    }

    async fn reserve_system_deployment(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<UserUsage, PublishError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        let account = document.account(user_id);
        account.usage.reserve(limit)?;

        let usage = account.usage.clone();
        self.save(&document).await?;
        Ok(usage)
    }

    async fn release_system_deployment(&self, user_id: &str) -> Result<UserUsage, PublishError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        let account = document.account(user_id);
        account.usage.release();

        let usage = account.usage.clone();
        self.save(&document).await?;
        Ok(usage)
    }

    async fn record_deployment(
        &self,
        user_id: &str,
        project_id: &str,
        system_credential: bool,
    ) -> Result<UserUsage, PublishError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        let account = document.account(user_id);
        account.usage.record(project_id, system_credential);

        let usage = account.usage.clone();
        self.save(&document).await?;
        Ok(usage)
    }

    async fn personal_credential(
        &self,
        user_id: &str,
    ) -> Result<Option<Credential>, PublishError> {
        let _guard = self.lock.lock().await;
        let document = self.load().await?;
        Ok(document
            .users
            .get(user_id)
            .and_then(|account| account.personal_token.as_deref())
            .filter(|token| !token.trim().is_empty())
            .map(Credential::new))
    }

    async fn save_personal_credential(
        &self,
        user_id: &str,
        credential: &Credential,
    ) -> Result<(), PublishError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        let account = document.account(user_id);
        account.personal_token = Some(credential.expose().to_string());
        self.save(&document).await
    }
}
