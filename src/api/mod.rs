//! API handlers for the bookstore REST endpoints

pub mod auth;
pub mod crud;
pub mod health;
pub mod openapi;
pub mod password_reset;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query},
    http::request::Parts,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    auth::middleware::{check_access, AccessGrant, AccessRejection, Authenticated},
    error::AppError,
    repository::{
        authors::AuthorsRepository, books::BooksRepository, categories::CategoriesRepository,
        loans::LoansRepository, publishers::PublishersRepository, ratings::RatingsRepository,
        resources::ResourcesRepository, role_resources::RoleResourcesRepository,
        roles::RolesRepository, user_requests::UserRequestsRepository,
        user_roles::UserRolesRepository,
    },
    AppState,
};

/// Success envelope shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            status: "success".to_string(),
            data,
        })
    }
}

/// Plain confirmation payload
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Caller that passed the access-control middleware
pub struct AuthenticatedUser(pub AccessGrant);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessGrant>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(|| AppError::Authentication("Not authenticated".to_string()))
    }
}

/// Caller holding a live session, with no permission check.
/// Used by routes every logged-in user may call.
pub struct AuthenticatedSession(pub Authenticated);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedSession {
    type Rejection = AccessRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state
            .access
            .authenticate(&parts.headers)
            .await
            .map(AuthenticatedSession)
    }
}

/// `Query` whose rejection is answered with the JSON error envelope
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ValidQuery(value))
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
    }
}

/// `Path` whose rejection is answered with the JSON error envelope
pub struct ValidPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| ValidPath(value))
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Entity routes, each checked against the caller's role grants
    let protected = Router::new()
        .merge(crud::routes::<RolesRepository>("/roles"))
        .merge(crud::routes::<ResourcesRepository>("/resource"))
        .merge(crud::routes::<RoleResourcesRepository>("/role-resources"))
        .merge(crud::routes::<UserRolesRepository>("/user-roles"))
        .merge(crud::routes::<UserRequestsRepository>("/user-request"))
        .merge(crud::routes::<AuthorsRepository>("/authors"))
        .merge(crud::routes::<PublishersRepository>("/publisher"))
        .merge(crud::routes::<CategoriesRepository>("/categories"))
        .merge(crud::routes::<BooksRepository>("/books"))
        .merge(crud::routes::<LoansRepository>("/loans"))
        .merge(crud::routes::<RatingsRepository>("/ratings"))
        .route_layer(from_fn_with_state(state.access.clone(), check_access));

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Accounts
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/change-password", post(auth::change_password))
        // Password reset
        .route("/request-reset-password", post(password_reset::request_reset))
        .route("/validate-reset-token", get(password_reset::validate_token))
        .route("/reset-password", post(password_reset::reset_password))
        .merge(protected)
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
