//! Password reset tokens and request bodies

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RequestPasswordReset {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
}

/// Returned by the reset request; the raw token is only ever shown here
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PasswordResetIssued {
    pub token: String,
    pub expires_at: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResetTokenQuery {
    pub token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPassword {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}
