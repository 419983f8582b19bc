//! Password reset endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::password_reset::{PasswordResetIssued, RequestPasswordReset, ResetPassword, ResetTokenQuery},
    AppState,
};

use super::{ApiResponse, MessageResponse, ValidQuery};

/// Issue a short-lived reset token for a username
#[utoipa::path(
    post,
    path = "/request-reset-password",
    tag = "auth",
    request_body = RequestPasswordReset,
    responses(
        (status = 200, description = "Reset token issued", body = PasswordResetIssued),
        (status = 404, description = "Unknown username", body = crate::error::ErrorResponse)
    )
)]
pub async fn request_reset(
    State(state): State<AppState>,
    Json(request): Json<RequestPasswordReset>,
) -> AppResult<Json<ApiResponse<PasswordResetIssued>>> {
    let issued = state.services.password_reset.request(&request).await?;
    Ok(ApiResponse::success(issued))
}

/// Check that a reset token is still usable
#[utoipa::path(
    get,
    path = "/validate-reset-token",
    tag = "auth",
    params(ResetTokenQuery),
    responses(
        (status = 200, description = "Token is valid", body = MessageResponse),
        (status = 400, description = "Invalid or expired token", body = crate::error::ErrorResponse)
    )
)]
pub async fn validate_token(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ResetTokenQuery>,
) -> AppResult<Json<ApiResponse<MessageResponse>>> {
    state.services.password_reset.validate(&query.token).await?;
    Ok(ApiResponse::success(MessageResponse::new("Token is valid")))
}

/// Set a new password using a reset token
#[utoipa::path(
    post,
    path = "/reset-password",
    tag = "auth",
    request_body = ResetPassword,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid or expired token", body = crate::error::ErrorResponse)
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPassword>,
) -> AppResult<Json<ApiResponse<MessageResponse>>> {
    state.services.password_reset.reset(&request).await?;
    Ok(ApiResponse::success(MessageResponse::new("Password has been reset")))
}
