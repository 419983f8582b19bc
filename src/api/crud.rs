//! Generic list / detail / create / update handlers
//!
//! One set of handlers serves every entity; the entity is picked by the
//! `CrudRepository` type parameter.

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::ListQuery,
    repository::CrudRepository,
    AppState,
};

use super::{ApiResponse, AuthenticatedUser, ValidPath, ValidQuery};

/// One page of a listing
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of rows matching the filters, ignoring pagination
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// `GET /x`, `POST /x`, `GET /x/:id` and `PUT /x/:id` for one entity
pub fn routes<R: CrudRepository>(path: &str) -> Router<AppState> {
    Router::new()
        .route(path, get(list::<R>).post(create::<R>))
        .route(&format!("{}/:id", path), get(detail::<R>).put(update::<R>))
}

pub async fn list<R: CrudRepository>(
    State(state): State<AppState>,
    AuthenticatedUser(_grant): AuthenticatedUser,
    ValidQuery(query): ValidQuery<ListQuery>,
    ValidQuery(filter): ValidQuery<R::Filter>,
) -> AppResult<Json<ApiResponse<Page<R::Entity>>>> {
    let (items, total) = R::select(&state.services.repository)
        .list(&query, &filter)
        .await?;

    Ok(ApiResponse::success(Page {
        items,
        total,
        limit: query.limit(),
        offset: query.offset(),
    }))
}

pub async fn detail<R: CrudRepository>(
    State(state): State<AppState>,
    AuthenticatedUser(_grant): AuthenticatedUser,
    ValidPath(id): ValidPath<Uuid>,
) -> AppResult<Json<ApiResponse<R::Entity>>> {
    let entity = R::select(&state.services.repository).detail(id).await?;
    Ok(ApiResponse::success(entity))
}

pub async fn create<R: CrudRepository>(
    State(state): State<AppState>,
    AuthenticatedUser(grant): AuthenticatedUser,
    Json(input): Json<R::Create>,
) -> AppResult<(StatusCode, Json<ApiResponse<R::Entity>>)> {
    input.validate()?;

    let entity = R::select(&state.services.repository)
        .create(&input, grant.user_id)
        .await?;

    tracing::info!(user_id = %grant.user_id, "{} created", R::NAME);
    Ok((StatusCode::CREATED, ApiResponse::success(entity)))
}

pub async fn update<R: CrudRepository>(
    State(state): State<AppState>,
    AuthenticatedUser(grant): AuthenticatedUser,
    ValidPath(id): ValidPath<Uuid>,
    Json(input): Json<R::Update>,
) -> AppResult<Json<ApiResponse<R::Entity>>> {
    input.validate()?;

    let entity = R::select(&state.services.repository)
        .update(id, &input, grant.user_id)
        .await?;

    tracing::info!(user_id = %grant.user_id, id = %id, "{} updated", R::NAME);
    Ok(ApiResponse::success(entity))
}
