//! Persistence
//!
//! The pipeline and the credential policy only see the [`ProjectStore`]
//! and [`UsageStore`] traits. Two implementations ship with the crate: an
//! in-memory store and a single-document JSON file store.

pub mod json_store;
pub mod layout;
pub mod memory;
pub mod settings;

use async_trait::async_trait;

use crate::authn::credential::Credential;
use crate::errors::PublishError;
use crate::models::project::{ProjectDeploymentFields, ProjectRecord, UserUsage};

pub use json_store::JsonFileStore;
pub use memory::MemoryStore;

/// Project records
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Get a project by ID
    async fn get_project(&self, project_id: &str) -> Result<Option<ProjectRecord>, PublishError>;

    /// Insert or replace a project
    async fn insert_project(&self, project: ProjectRecord) -> Result<(), PublishError>;

    /// Write the outputs of a deployment run; unknown IDs are `NotFound`
    async fn update_deployment_fields(
        &self,
        project_id: &str,
        fields: &ProjectDeploymentFields,
    ) -> Result<(), PublishError>;
}

/// Per-user credential usage
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Usage of a user, zeroed if never recorded
    async fn user_usage(&self, user_id: &str) -> Result<UserUsage, PublishError>;

    /// Take one shared-credential slot for a user
    ///
    /// The limit check and the increment happen under one lock, so
    /// concurrent runs of one user can never exceed `limit`. Fails with
    /// `QuotaExceeded` when every slot is taken.
    async fn reserve_system_deployment(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<UserUsage, PublishError>;

    /// Give back a slot whose run did not succeed
    async fn release_system_deployment(&self, user_id: &str) -> Result<UserUsage, PublishError>;

    /// Record the credential kind and project of a successful deployment
    async fn record_deployment(
        &self,
        user_id: &str,
        project_id: &str,
        system_credential: bool,
    ) -> Result<UserUsage, PublishError>;

    /// The user's saved personal hosting credential
    async fn personal_credential(&self, user_id: &str)
        -> Result<Option<Credential>, PublishError>;

    /// Save the user's personal hosting credential
    async fn save_personal_credential(
        &self,
        user_id: &str,
        credential: &Credential,
    ) -> Result<(), PublishError>;
}
