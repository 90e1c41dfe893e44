//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::PathRejection, rejection::QueryRejection},
};

use handset_core::PhoneId;

use super::JsonPayload;
use crate::error::Result;
use crate::middleware::RequireCustomer;
use crate::models::{Pagination, Phone};
use crate::state::AppState;

/// `GET /api/phones`
pub async fn index(
    State(state): State<AppState>,
    RequireCustomer(_caller): RequireCustomer,
    query: std::result::Result<Query<Pagination>, QueryRejection>,
) -> Result<JsonPayload> {
    let Query(page) = query?;
    Ok(JsonPayload(state.phones().list(page).await?))
}

/// `GET /api/phones/{id}`
pub async fn show(
    State(state): State<AppState>,
    RequireCustomer(_caller): RequireCustomer,
    id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<Phone>> {
    let Path(id) = id?;
    Ok(Json(state.phones().get(PhoneId::new(id)).await?))
}
