//! Business logic services

pub mod catalog;
pub mod identity;
pub mod sessions;

use crate::{config::AppConfig, repository::Repository};

pub use identity::Session;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub catalog: catalog::CatalogService,
    pub identity: identity::IdentityService,
    pub sessions: sessions::SessionStore,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            identity: identity::IdentityService::new(repository.clone()),
            sessions: sessions::SessionStore::new(config.auth.session_ttl()),
            repository,
        }
    }
}
