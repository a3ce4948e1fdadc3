//! Application state management

use std::sync::Arc;

use tracing::{info, warn};

use crate::app::service::DeploymentService;
use crate::authn::token_mngr::TokenManager;
use crate::errors::PublishError;
use crate::filesys::file::File;
use crate::http::connector::HttpConnector;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;
use crate::storage::JsonFileStore;

/// Main application state
pub struct AppState {
    /// Deployment service
    pub service: DeploymentService,
}

impl AppState {
    /// Wire the stores, provider connector and service from settings
    pub fn init(settings: Settings, layout: &StorageLayout) -> Result<Self, PublishError> {
        info!("Initializing application state...");
        settings.validate()?;

        let store_file = match &settings.data_file {
            Some(path) => File::new(path.clone()),
            None => layout.store_file(),
        };
        let store = Arc::new(JsonFileStore::new(store_file));

        let system_credential = settings.hosting_system_token();
        if system_credential.is_none() {
            warn!("No system hosting token configured; users need a personal token");
        }
        let token_mngr = Arc::new(TokenManager::new(
            store.clone(),
            system_credential,
            settings.quota,
        ));

        let connector = Arc::new(HttpConnector::from_settings(&settings));
        let service = DeploymentService::new(store, connector, token_mngr)
            .with_default_organization(settings.repository.default_organization);

        Ok(Self { service })
    }
}
