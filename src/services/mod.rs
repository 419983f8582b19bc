//! Business logic services

pub mod password_reset;
pub mod users;

use std::sync::Arc;

use crate::{
    auth::{
        clock::Clock,
        middleware::AccessControl,
        store::{AccessStore, AccountStore},
    },
    config::AppConfig,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub password_reset: password_reset::PasswordResetService,
    /// Entity CRUD goes straight to the repositories
    pub repository: Repository,
}

impl Services {
    /// Wire the services over the given stores.
    ///
    /// Tokens and sessions are shared with `access` so that a session created
    /// at login is the one the middleware checks.
    pub fn new(
        config: &AppConfig,
        repository: Repository,
        accounts: Arc<dyn AccountStore>,
        store: Arc<dyn AccessStore>,
        access: &AccessControl,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let query_timeout = config.database.query_timeout();

        Self {
            users: users::UsersService::new(
                accounts.clone(),
                store.clone(),
                access.tokens().clone(),
                access.sessions().clone(),
                query_timeout,
            ),
            password_reset: password_reset::PasswordResetService::new(
                accounts,
                store,
                clock,
                &config.auth,
                query_timeout,
            ),
            repository,
        }
    }
}
