//! Account service: registration, login, logout and password changes

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{
        password::{hash_password, verify_password},
        session::SessionManager,
        store::{bounded, AccessStore, AccountStore},
        token::TokenService,
    },
    error::{AppError, AppResult},
    models::user::{ChangePassword, Credentials, LoginResponse, User},
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Clone)]
pub struct UsersService {
    accounts: Arc<dyn AccountStore>,
    access: Arc<dyn AccessStore>,
    tokens: TokenService,
    sessions: SessionManager,
    query_timeout: Duration,
}

impl UsersService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        access: Arc<dyn AccessStore>,
        tokens: TokenService,
        sessions: SessionManager,
        query_timeout: Duration,
    ) -> Self {
        Self {
            accounts,
            access,
            tokens,
            sessions,
            query_timeout,
        }
    }

    /// Create an account; it starts with the guest role
    pub async fn register(&self, credentials: &Credentials) -> AppResult<User> {
        credentials.validate()?;

        let hash = hash_password(&credentials.password)?;
        let user = bounded(
            self.query_timeout,
            "register user",
            self.accounts.register_user(&credentials.username, &hash),
        )
        .await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Check credentials, then issue a token backed by a new session
    pub async fn login(&self, credentials: &Credentials) -> AppResult<LoginResponse> {
        let stored = bounded(
            self.query_timeout,
            "credentials lookup",
            self.access.user_credentials(&credentials.username),
        )
        .await?
        .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&credentials.password, &stored.password)? {
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        let issued = self.tokens.issue_token(stored.id)?;
        self.sessions
            .create_session(stored.id, &issued.token, issued.expires_at)
            .await?;

        tracing::info!(user_id = %stored.id, "User logged in");
        Ok(LoginResponse {
            access_token: issued.token,
            expires_at: issued.expires_at.timestamp(),
        })
    }

    /// End the session bound to `token`; other sessions of the user stay valid
    pub async fn logout(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        self.sessions.revoke_session(token).await?;
        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    pub async fn change_password(&self, user_id: Uuid, request: &ChangePassword) -> AppResult<()> {
        request.validate()?;
        if request.new_password != request.confirm_password {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }

        let stored = bounded(
            self.query_timeout,
            "credentials lookup",
            self.accounts.user_credentials_by_id(user_id),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

        if !verify_password(&request.current_password, &stored.password)? {
            return Err(AppError::Validation("Current password is incorrect".to_string()));
        }

        let hash = hash_password(&request.new_password)?;
        bounded(
            self.query_timeout,
            "update password",
            self.accounts.update_password(user_id, &hash),
        )
        .await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{
            clock::ManualClock,
            store::{MockAccessStore, MockAccountStore},
        },
        config::AuthConfig,
        models::UserCredentials,
    };
    use chrono::Utc;
    use mockall::predicate::eq;

    fn service(accounts: MockAccountStore, access: MockAccessStore) -> UsersService {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let access: Arc<dyn AccessStore> = Arc::new(access);
        UsersService::new(
            Arc::new(accounts),
            access.clone(),
            TokenService::new(&AuthConfig::default(), clock.clone()),
            SessionManager::new(access, clock, Duration::from_secs(1)),
            Duration::from_secs(1),
        )
    }

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let mut accounts = MockAccountStore::new();
        accounts
            .expect_register_user()
            .withf(|username, hash| username == "reader" && hash.starts_with("$argon2"))
            .times(1)
            .returning(|username, hash| {
                Ok(User {
                    id: Uuid::new_v4(),
                    username: username.to_string(),
                    password: hash.to_string(),
                    created_at: Utc::now(),
                    created_by: Uuid::nil(),
                    updated_at: None,
                    updated_by: None,
                })
            });

        let user = service(accounts, MockAccessStore::new())
            .register(&credentials("reader", "long-enough"))
            .await
            .unwrap();
        assert_eq!(user.username, "reader");
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let result = service(MockAccountStore::new(), MockAccessStore::new())
            .register(&credentials("reader", "short"))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_creates_session_for_token() {
        let user_id = Uuid::new_v4();
        let hash = hash_password("long-enough").unwrap();

        let mut access = MockAccessStore::new();
        access
            .expect_user_credentials()
            .with(eq("reader"))
            .returning(move |_| {
                Ok(Some(UserCredentials {
                    id: user_id,
                    password: hash.clone(),
                }))
            });
        access
            .expect_create_session()
            .withf(move |s| s.user_id == user_id && !s.token.is_empty())
            .times(1)
            .returning(|_| Ok(()));

        let response = service(MockAccountStore::new(), access)
            .login(&credentials("reader", "long-enough"))
            .await
            .unwrap();
        assert!(!response.access_token.is_empty());
        assert!(response.expires_at > Utc::now().timestamp());
    }

    #[tokio::test]
    async fn test_login_failures_look_the_same() {
        let hash = hash_password("long-enough").unwrap();

        let mut access = MockAccessStore::new();
        access
            .expect_user_credentials()
            .with(eq("reader"))
            .returning(move |_| {
                Ok(Some(UserCredentials {
                    id: Uuid::new_v4(),
                    password: hash.clone(),
                }))
            });
        access.expect_user_credentials().returning(|_| Ok(None));
        access.expect_create_session().never();

        let users = service(MockAccountStore::new(), access);

        let wrong_password = users.login(&credentials("reader", "wrong-password")).await;
        let unknown_user = users.login(&credentials("nobody", "long-enough")).await;

        match (wrong_password, unknown_user) {
            (Err(AppError::Authentication(a)), Err(AppError::Authentication(b))) => assert_eq!(a, b),
            other => panic!("unexpected results: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_change_password_checks_confirmation_and_current() {
        let user_id = Uuid::new_v4();
        let hash = hash_password("old-password").unwrap();

        let mut accounts = MockAccountStore::new();
        accounts
            .expect_user_credentials_by_id()
            .returning(move |id| {
                Ok(Some(UserCredentials {
                    id,
                    password: hash.clone(),
                }))
            });
        accounts
            .expect_update_password()
            .withf(move |id, hash| *id == user_id && verify_password("new-password", hash).unwrap())
            .times(1)
            .returning(|_, _| Ok(()));

        let users = service(accounts, MockAccessStore::new());

        let mismatch = ChangePassword {
            current_password: "old-password".to_string(),
            new_password: "new-password".to_string(),
            confirm_password: "other-password".to_string(),
        };
        assert!(users.change_password(user_id, &mismatch).await.is_err());

        let wrong_current = ChangePassword {
            current_password: "not-the-password".to_string(),
            new_password: "new-password".to_string(),
            confirm_password: "new-password".to_string(),
        };
        assert!(users.change_password(user_id, &wrong_current).await.is_err());

        let valid = ChangePassword {
            current_password: "old-password".to_string(),
            new_password: "new-password".to_string(),
            confirm_password: "new-password".to_string(),
        };
        users.change_password(user_id, &valid).await.unwrap();
    }

    #[tokio::test]
    async fn test_logout_revokes_only_presented_token() {
        let mut access = MockAccessStore::new();
        access
            .expect_delete_session()
            .with(eq("this-token"))
            .times(1)
            .returning(|_| Ok(()));

        service(MockAccountStore::new(), access)
            .logout(Uuid::new_v4(), "this-token")
            .await
            .unwrap();
    }
}
