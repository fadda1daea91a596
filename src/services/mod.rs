//! Business logic services

pub mod catalog;
pub mod loans;
pub mod sessions;

use std::sync::Arc;

use crate::{config::AppConfig, forms::RenewalPolicy, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub sessions: sessions::SessionService,
}

impl Services {
    /// Create all services with the given repository and session store
    pub fn new(
        repository: Repository,
        config: &AppConfig,
        session_store: Arc<dyn sessions::SessionStore>,
    ) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository, RenewalPolicy::from(&config.loans)),
            sessions: sessions::SessionService::new(session_store, config.session.ttl_seconds),
        }
    }
}
