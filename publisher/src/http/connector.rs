//! Provider connector backed by the HTTP clients

use std::sync::Arc;

use crate::authn::credential::Credential;
use crate::deploy::providers::{HostingProvider, ProviderConnector, RepositoryProvider};
use crate::errors::PublishError;
use crate::http::client::HttpClient;
use crate::http::github::{GitHubClient, GITHUB_HEADERS};
use crate::http::vercel::VercelClient;
use crate::storage::settings::{HttpSettings, Settings};

/// Builds GitHub and Vercel clients per request credential
pub struct HttpConnector {
    repository_base_url: String,
    hosting_base_url: String,
    team_id: Option<String>,
    platform_repository_token: Option<Credential>,
    http: HttpSettings,
}

impl HttpConnector {
    /// Create a connector from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            repository_base_url: settings.repository.base_url.clone(),
            hosting_base_url: settings.hosting.base_url.clone(),
            team_id: settings.hosting.team_id.clone(),
            platform_repository_token: settings.repository_token(),
            http: settings.http.clone(),
        }
    }
}

impl ProviderConnector for HttpConnector {
    fn repository(
        &self,
        credential: Option<&Credential>,
    ) -> Result<Arc<dyn RepositoryProvider>, PublishError> {
        let token = credential
            .filter(|c| !c.is_blank())
            .cloned()
            .or_else(|| self.platform_repository_token.clone())
            .ok_or_else(|| {
                PublishError::CredentialError(
                    "No repository token supplied and no platform token is configured"
                        .to_string(),
                )
            })?;

        let http = HttpClient::new(
            "GitHub",
            &self.repository_base_url,
            token,
            &self.http,
            GITHUB_HEADERS,
        )?;
        Ok(Arc::new(GitHubClient::new(http)))
    }

    fn hosting(&self, credential: &Credential) -> Result<Arc<dyn HostingProvider>, PublishError> {
        if credential.is_blank() {
            return Err(PublishError::CredentialError(
                "Hosting token is empty".to_string(),
            ));
        }

        let http = HttpClient::new(
            "Vercel",
            &self.hosting_base_url,
            credential.clone(),
            &self.http,
            &[("accept", "application/json")],
        )?;
        Ok(Arc::new(VercelClient::new(http, self.team_id.clone())))
    }
}
