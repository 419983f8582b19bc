//! Bookstore Server
//!
//! A role-based access controlled REST JSON API for a bookstore: catalog,
//! loans, ratings and accounts, with every entity route gated by a
//! role / endpoint / method grant table.

use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use auth::{AccessControl, AccessStore, AccountStore, Clock};
use repository::Repository;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub access: Arc<AccessControl>,
}

impl AppState {
    /// Build the state over explicit stores; `main` passes the repository
    /// for all three
    pub fn new(
        config: AppConfig,
        repository: Repository,
        store: Arc<dyn AccessStore>,
        accounts: Arc<dyn AccountStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let access = AccessControl::new(&config, store.clone(), clock.clone());
        let services = services::Services::new(&config, repository, accounts, store, &access, clock);

        Self {
            config: Arc::new(config),
            services: Arc::new(services),
            access: Arc::new(access),
        }
    }
}
