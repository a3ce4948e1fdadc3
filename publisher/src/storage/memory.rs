//! In-memory store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::authn::credential::Credential;
use crate::errors::PublishError;
use crate::models::project::{ProjectDeploymentFields, ProjectRecord, UserUsage};
use crate::storage::{ProjectStore, UsageStore};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    projects: Arc<RwLock<HashMap<String, ProjectRecord>>>,
    usage: Arc<RwLock<HashMap<String, UserUsage>>>,
    credentials: Arc<RwLock<HashMap<String, Credential>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn get_project(&self, project_id: &str) -> Result<Option<ProjectRecord>, PublishError> {
        let projects = self.projects.read().await;
        Ok(projects.get(project_id).cloned())
    }

    async fn insert_project(&self, project: ProjectRecord) -> Result<(), PublishError> {
        let mut projects = self.projects.write().await;
        projects.insert(project.id.clone(), project);
        Ok(())
    }

    async fn update_deployment_fields(
        &self,
        project_id: &str,
        fields: &ProjectDeploymentFields,
    ) -> Result<(), PublishError> {
        let mut projects = self.projects.write().await;
        match projects.get_mut(project_id) {
            Some(project) => {
                project.apply(fields);
                Ok(())
            }
            None => Err(PublishError::NotFound(format!("Project {}", project_id))),
        }
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn user_usage(&self, user_id: &str) -> Result<UserUsage, PublishError> {
        let usage = self.usage.read().await;
        Ok(usage
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserUsage::new(user_id)))
    }

    async fn reserve_system_deployment(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<UserUsage, PublishError> {
        let mut usage = self.usage.write().await;
        let entry = usage
            .entry(user_id.to_string())
            .or_insert_with(|| UserUsage::new(user_id));
        entry.reserve(limit)?;
        Ok(entry.clone())
    }

    async fn release_system_deployment(&self, user_id: &str) -> Result<UserUsage, PublishError> {
        let mut usage = self.usage.write().await;
        let entry = usage
            .entry(user_id.to_string())
            .or_insert_with(|| UserUsage::new(user_id));
        entry.release();
        Ok(entry.clone())
    }

    async fn record_deployment(
        &self,
        user_id: &str,
        project_id: &str,
        system_credential: bool,
    ) -> Result<UserUsage, PublishError> {
        let mut usage = self.usage.write().await;
        let entry = usage
            .entry(user_id.to_string())
            .or_insert_with(|| UserUsage::new(user_id));
        entry.record(project_id, system_credential);
        Ok(entry.clone())
    }

    async fn personal_credential(
        &self,
        user_id: &str,
    ) -> Result<Option<Credential>, PublishError> {
        let credentials = self.credentials.read().await;
        Ok(credentials.get(user_id).cloned())
    }

    async fn save_personal_credential(
        &self,
        user_id: &str,
        credential: &Credential,
    ) -> Result<(), PublishError> {
        let mut credentials = self.credentials.write().await;
        credentials.insert(user_id.to_string(), credential.clone());
        Ok(())
    }
}
