//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, health, password_reset, MessageResponse};

/// Registers the bearer scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookstore API",
        version = "1.0.0",
        description = "Role-based access controlled bookstore REST API. Entity routes \
                       (roles, resource, role-resources, user-roles, user-request, authors, \
                       publisher, categories, books, loans, ratings) accept GET list, GET by id, \
                       POST and PUT by id, and require a role grant for the endpoint and method."
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Accounts
        auth::register,
        auth::login,
        auth::logout,
        auth::change_password,
        // Password reset
        password_reset::request_reset,
        password_reset::validate_token,
        password_reset::reset_password,
    ),
    components(
        schemas(
            // Accounts
            crate::models::user::User,
            crate::models::user::Credentials,
            crate::models::user::ChangePassword,
            crate::models::user::LoginResponse,
            crate::models::password_reset::RequestPasswordReset,
            crate::models::password_reset::PasswordResetIssued,
            crate::models::password_reset::ResetPassword,
            // Access control
            crate::models::role::Role,
            crate::models::role::CreateRole,
            crate::models::role::UpdateRole,
            crate::models::resource::Resource,
            crate::models::resource::CreateResource,
            crate::models::resource::UpdateResource,
            crate::models::role_resource::RoleResource,
            crate::models::role_resource::CreateRoleResource,
            crate::models::role_resource::UpdateRoleResource,
            crate::models::user_role::UserRole,
            crate::models::user_role::CreateUserRole,
            crate::models::user_role::UpdateUserRole,
            crate::models::user_request::UserRequest,
            crate::models::user_request::RequestStatus,
            crate::models::user_request::CreateUserRequest,
            crate::models::user_request::UpdateUserRequest,
            // Catalog
            crate::models::author::Author,
            crate::models::author::CreateAuthor,
            crate::models::author::UpdateAuthor,
            crate::models::publisher::Publisher,
            crate::models::publisher::CreatePublisher,
            crate::models::publisher::UpdatePublisher,
            crate::models::category::Category,
            crate::models::category::CreateCategory,
            crate::models::category::UpdateCategory,
            crate::models::book::Book,
            crate::models::book::BookStatus,
            crate::models::book::AccessLevel,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::loan::Loan,
            crate::models::loan::LoanStatus,
            crate::models::loan::CreateLoan,
            crate::models::loan::UpdateLoan,
            crate::models::rating::Rating,
            crate::models::rating::CreateRating,
            crate::models::rating::UpdateRating,
            // Misc
            MessageResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Accounts, sessions and password reset")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
