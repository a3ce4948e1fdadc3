//! Token manager: hosting credential selection and shared-credential quota

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::authn::credential::{Credential, CredentialSelection};
use crate::deploy::providers::HostingProvider;
use crate::errors::PublishError;
use crate::storage::settings::QuotaSettings;
use crate::storage::UsageStore;

/// Recommendation to ask the user for a personal credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpgradePrompt {
    pub should_prompt: bool,
    /// Deployments left on the shared credential
    pub remaining: u32,
}

/// Token manager trait for testability
#[async_trait]
pub trait TokenManagerExt: Send + Sync {
    /// Choose the hosting credential for a request
    ///
    /// Choosing the shared credential takes one quota slot up front; give
    /// it back with `release_system_deployment` if the run fails.
    async fn select_credential(
        &self,
        user_id: &str,
        explicit: Option<&Credential>,
    ) -> Result<CredentialSelection, PublishError>;

    /// Return a slot taken by `select_credential`
    async fn release_system_deployment(&self, user_id: &str) -> Result<(), PublishError>;

    /// Record the credential kind and project of a successful deployment
    async fn track_deployment(
        &self,
        user_id: &str,
        project_id: &str,
        was_system_credential: bool,
    ) -> Result<(), PublishError>;

    /// Whether to suggest connecting a personal credential
    async fn should_prompt_upgrade(&self, user_id: &str) -> Result<UpgradePrompt, PublishError>;
}

/// Token manager implementation
pub struct TokenManager {
    store: Arc<dyn UsageStore>,
    system_credential: Option<Credential>,
    quota: QuotaSettings,
}

impl TokenManager {
    /// Create a new token manager
    pub fn new(
        store: Arc<dyn UsageStore>,
        system_credential: Option<Credential>,
        quota: QuotaSettings,
    ) -> Self {
        Self {
            store,
            system_credential: system_credential.filter(|c| !c.is_blank()),
            quota,
        }
    }

    /// Shared-credential deployments a user has left
    pub async fn remaining_system_deployments(&self, user_id: &str) -> Result<u32, PublishError> {
        let usage = self.store.user_usage(user_id).await?;
        Ok(self
            .quota
            .system_deployment_limit
            .saturating_sub(usage.system_deployments))
    }

    /// Hosting credential for read and cancel calls; the quota does not apply
    pub async fn lookup_credential(
        &self,
        user_id: &str,
        explicit: Option<&Credential>,
    ) -> Result<Option<Credential>, PublishError> {
        if let Some(token) = explicit.filter(|c| !c.is_blank()) {
            return Ok(Some(token.clone()));
        }
        if let Some(token) = self.store.personal_credential(user_id).await? {
            return Ok(Some(token));
        }
        Ok(self.system_credential.clone())
    }

    /// Validate a personal credential with the hosting provider and save it
    pub async fn connect_personal_credential(
        &self,
        user_id: &str,
        credential: &Credential,
        hosting: &dyn HostingProvider,
    ) -> Result<(), PublishError> {
        if credential.is_blank() {
            return Err(PublishError::CredentialError(
                "Hosting token is empty".to_string(),
            ));
        }

        if !hosting.validate_credential(credential).await? {
            warn!("Hosting provider rejected the personal token of user {}", user_id);
            return Err(PublishError::CredentialError(
                "The hosting provider rejected this token".to_string(),
            ));
        }

        self.store
            .save_personal_credential(user_id, credential)
            .await?;
        info!("Saved personal hosting token for user {}", user_id);
        Ok(())
    }
}

#[async_trait]
impl TokenManagerExt for TokenManager {
    async fn select_credential(
        &self,
        user_id: &str,
        explicit: Option<&Credential>,
    ) -> Result<CredentialSelection, PublishError> {
        let limit = self.quota.system_deployment_limit;

        // An explicit token always wins and never touches the quota
        if let Some(token) = explicit.filter(|c| !c.is_blank()) {
            debug!("Using explicit hosting token for user {}", user_id);
            return Ok(CredentialSelection {
                token: token.clone(),
                is_system_credential: false,
                remaining_system_deployments: self.remaining_system_deployments(user_id).await?,
            });
        }

        if let Some(token) = self.store.personal_credential(user_id).await? {
            debug!("Using saved personal hosting token for user {}", user_id);
            return Ok(CredentialSelection {
                token,
                is_system_credential: false,
                remaining_system_deployments: self.remaining_system_deployments(user_id).await?,
            });
        }

        let Some(system) = &self.system_credential else {
            return Err(PublishError::CredentialError(
                "No hosting token supplied and no system token is configured".to_string(),
            ));
        };

        let usage = self
            .store
            .reserve_system_deployment(user_id, limit)
            .await
            .inspect_err(|e| {
                if matches!(e, PublishError::QuotaExceeded { .. }) {
                    info!(
                        "User {} exhausted the system credential quota ({} deployments)",
                        user_id, limit
                    );
                }
            })?;

        // Slots left before this run took one
        let remaining = limit.saturating_sub(usage.system_deployments) + 1;
        debug!(
            "Using system hosting token for user {} ({} left)",
            user_id, remaining
        );
        Ok(CredentialSelection {
            token: system.clone(),
            is_system_credential: true,
            remaining_system_deployments: remaining,
        })
    }

    async fn release_system_deployment(&self, user_id: &str) -> Result<(), PublishError> {
        let usage = self.store.release_system_deployment(user_id).await?;
        debug!(
            "Released a system deployment slot of user {} ({} used)",
            user_id, usage.system_deployments
        );
        Ok(())
    }

    async fn track_deployment(
        &self,
        user_id: &str,
        project_id: &str,
        was_system_credential: bool,
    ) -> Result<(), PublishError> {
        let usage = self
            .store
            .record_deployment(user_id, project_id, was_system_credential)
            .await?;

        if was_system_credential {
            info!(
                "User {} has used {}/{} system deployments",
                user_id, usage.system_deployments, self.quota.system_deployment_limit
            );
        }
        Ok(())
    }

    async fn should_prompt_upgrade(&self, user_id: &str) -> Result<UpgradePrompt, PublishError> {
        let remaining = self.remaining_system_deployments(user_id).await?;
        let has_personal = self.store.personal_credential(user_id).await?.is_some();

        Ok(UpgradePrompt {
            should_prompt: !has_personal && remaining <= self.quota.upgrade_prompt_threshold,
            remaining,
        })
    }
}
