//! Account endpoints: register, login, logout, change password

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::user::{ChangePassword, Credentials, LoginResponse, User},
    AppState,
};

use super::{ApiResponse, AuthenticatedSession, MessageResponse};

/// Register a new account (starts with the guest role)
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = Credentials,
    responses(
        (status = 200, description = "Account created", body = User),
        (status = 400, description = "Invalid username or password", body = crate::error::ErrorResponse),
        (status = 409, description = "Username already taken", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<Credentials>,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = state.services.users.register(&request).await?;
    Ok(ApiResponse::success(user))
}

/// Login and receive an access token
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = Credentials,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<Credentials>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let response = state.services.users.login(&request).await?;
    Ok(ApiResponse::success(response))
}

/// End the current session
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    AuthenticatedSession(session): AuthenticatedSession,
) -> AppResult<Json<ApiResponse<MessageResponse>>> {
    state
        .services
        .users
        .logout(session.user_id, &session.token)
        .await?;
    Ok(ApiResponse::success(MessageResponse::new("Logged out")))
}

/// Change the caller's password
#[utoipa::path(
    post,
    path = "/change-password",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = ChangePassword,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthenticatedSession(session): AuthenticatedSession,
    Json(request): Json<ChangePassword>,
) -> AppResult<Json<ApiResponse<MessageResponse>>> {
    state
        .services
        .users
        .change_password(session.user_id, &request)
        .await?;
    Ok(ApiResponse::success(MessageResponse::new("Password changed")))
}
