//! Sub-account route handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};

use handset_core::UserId;

use super::JsonPayload;
use crate::error::Result;
use crate::middleware::RequireCustomer;
use crate::models::{CreateUserRequest, Pagination, User};
use crate::state::AppState;

/// `GET /api/users`
pub async fn index(
    State(state): State<AppState>,
    RequireCustomer(caller): RequireCustomer,
    query: std::result::Result<Query<Pagination>, QueryRejection>,
) -> Result<JsonPayload> {
    let Query(page) = query?;
    Ok(JsonPayload(state.users().list(&caller, page).await?))
}

/// `GET /api/users/{id}`
pub async fn show(
    State(state): State<AppState>,
    RequireCustomer(caller): RequireCustomer,
    id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<User>> {
    let Path(id) = id?;
    Ok(Json(state.users().get(&caller, UserId::new(id)).await?))
}

/// `POST /api/users`
///
/// Responds 201 with the created user and a `Location` header.
pub async fn create(
    State(state): State<AppState>,
    RequireCustomer(caller): RequireCustomer,
    body: std::result::Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = body?;
    let user = state.users().create(&caller, request).await?;
    let location = state
        .config()
        .resource_url(&format!("/api/users/{}", user.id));

    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(user)).into_response())
}

/// `DELETE /api/users/{id}`
pub async fn destroy(
    State(state): State<AppState>,
    RequireCustomer(caller): RequireCustomer,
    id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = id?;
    state.users().delete(&caller, UserId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
