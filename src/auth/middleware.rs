//! Request-time access control
//!
//! Every protected request walks the same pipeline: bearer header, token
//! signature and validity, live session, user, role, canonical endpoint and
//! finally the role grant. The first failing step rejects the request and
//! the rejection remembers how far the request got.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::{
    auth::{
        clock::Clock,
        endpoint,
        permission::PermissionResolver,
        session::SessionManager,
        store::{bounded, AccessStore},
        token::{AccessClaims, TokenService},
    },
    config::AppConfig,
    error::AppError,
};

const BEARER_PREFIX: &str = "Bearer ";

/// Pipeline position, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccessStage {
    Start,
    HeaderPresent,
    TokenExtracted,
    TokenVerified,
    SessionActive,
    UserIdResolved,
    RoleResolved,
    EndpointNormalized,
    AccessChecked,
    Allowed,
}

/// A refused request: the last stage it reached and the error to answer with
#[derive(Debug)]
pub struct AccessRejection {
    pub stage: AccessStage,
    pub error: AppError,
}

impl AccessRejection {
    fn at(stage: AccessStage, error: AppError) -> Self {
        Self { stage, error }
    }
}

impl IntoResponse for AccessRejection {
    fn into_response(self) -> Response {
        self.error.into_response()
    }
}

/// Outcome of the authentication half of the pipeline
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub claims: AccessClaims,
    pub user_id: Uuid,
    pub token: String,
}

/// Inserted into request extensions once access is allowed
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub claims: AccessClaims,
    pub user_id: Uuid,
    pub role_id: Uuid,
    /// Canonical endpoint the grant was checked against
    pub endpoint: String,
}

#[derive(Clone)]
pub struct AccessControl {
    tokens: TokenService,
    sessions: SessionManager,
    permissions: PermissionResolver,
    store: Arc<dyn AccessStore>,
    query_timeout: Duration,
}

impl AccessControl {
    pub fn new(config: &AppConfig, store: Arc<dyn AccessStore>, clock: Arc<dyn Clock>) -> Self {
        let query_timeout = config.database.query_timeout();

        Self {
            tokens: TokenService::new(&config.auth, clock.clone()),
            sessions: SessionManager::new(store.clone(), clock, query_timeout),
            permissions: PermissionResolver::new(
                store.clone(),
                query_timeout,
                Duration::from_secs(config.access.cache_ttl_secs),
                config.access.cache_capacity,
            ),
            store,
            query_timeout,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Header, token, session and user checks
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Authenticated, AccessRejection> {
        use AccessStage::*;

        let header = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .filter(|value| value.starts_with(BEARER_PREFIX))
            .ok_or_else(|| {
                AccessRejection::at(
                    Start,
                    AppError::Authentication("Missing or invalid authorization header".to_string()),
                )
            })?;

        let token = header[BEARER_PREFIX.len()..].trim();
        if token.is_empty() {
            return Err(AccessRejection::at(
                HeaderPresent,
                AppError::Authentication("Missing token".to_string()),
            ));
        }

        let claims = self
            .tokens
            .verify_token(token)
            .map_err(|e| AccessRejection::at(TokenExtracted, e))?;

        let active = self
            .sessions
            .session_active(token)
            .await
            .map_err(|e| AccessRejection::at(TokenVerified, e))?;
        if !active {
            return Err(AccessRejection::at(
                TokenVerified,
                AppError::Authentication("Session expired, login again".to_string()),
            ));
        }

        let user_id = claims
            .user_id()
            .map_err(|e| AccessRejection::at(SessionActive, e))?;

        Ok(Authenticated {
            claims,
            user_id,
            token: token.to_string(),
        })
    }

    /// Role, endpoint and grant checks for an authenticated caller
    pub async fn authorize(
        &self,
        authenticated: Authenticated,
        path: &str,
        method: &Method,
    ) -> Result<AccessGrant, AccessRejection> {
        use AccessStage::*;

        let role_id = bounded(
            self.query_timeout,
            "role lookup",
            self.store.role_id_for_user(authenticated.user_id),
        )
        .await
        .map_err(|e| AccessRejection::at(UserIdResolved, e))?
        .ok_or_else(|| {
            AccessRejection::at(
                UserIdResolved,
                AppError::Internal(format!("No role assigned to user {}", authenticated.user_id)),
            )
        })?;

        let endpoint = endpoint::normalize(path);

        let allowed = self
            .permissions
            .resolve(role_id, &endpoint, method.as_str())
            .await
            .map_err(|e| AccessRejection::at(EndpointNormalized, e))?;
        if !allowed {
            return Err(AccessRejection::at(
                AccessChecked,
                AppError::Authorization("Access denied".to_string()),
            ));
        }

        Ok(AccessGrant {
            claims: authenticated.claims,
            user_id: authenticated.user_id,
            role_id,
            endpoint,
        })
    }

    /// Full pipeline
    pub async fn evaluate(
        &self,
        headers: &HeaderMap,
        path: &str,
        method: &Method,
    ) -> Result<AccessGrant, AccessRejection> {
        let authenticated = self.authenticate(headers).await?;
        self.authorize(authenticated, path, method).await
    }
}

/// Middleware guarding the protected routes.
///
/// Mount with `route_layer` on the router nested under `/api/v1` so the
/// path seen here is relative to it, e.g. `/books/{id}`.
pub async fn check_access(
    State(access): State<Arc<AccessControl>>,
    mut request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let outcome = access.evaluate(request.headers(), &path, &method).await;
    match outcome {
        Ok(grant) => {
            let user_id = grant.user_id;
            let endpoint = grant.endpoint.clone();
            request.extensions_mut().insert(grant.claims.clone());
            request.extensions_mut().insert(grant);

            let response = next.run(request).await;

            tracing::info!(
                target: "bookstore_server::access",
                user_id = %user_id,
                endpoint = %endpoint,
                method = %method,
                status = response.status().as_u16(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "access granted"
            );
            response
        }
        Err(rejection) => {
            tracing::debug!(
                target: "bookstore_server::access",
                stage = ?rejection.stage,
                path = %path,
                method = %method,
                "access rejected: {}",
                rejection.error
            );
            rejection.into_response()
        }
    }
}
