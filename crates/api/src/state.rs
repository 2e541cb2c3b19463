use std::sync::Arc;

use lapublica_core::service::ResourceService;
use lapublica_core::store::ResourceStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (JWT settings, platform profile).
    pub config: Arc<ServerConfig>,
    /// Resource operations over the configured store.
    pub resources: Arc<ResourceService>,
}

impl AppState {
    pub fn new(config: ServerConfig, store: Arc<dyn ResourceStore>) -> Self {
        let resources = ResourceService::new(store, config.profile.clone());
        Self {
            config: Arc::new(config),
            resources: Arc::new(resources),
        }
    }
}
