//! Service catalog endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use super::{actor_id, require, ApiError, AppState, PageParams, Paged};
use crate::auth::{models::Claims, Permission};
use crate::models::{Service, ServiceStatus};
use crate::store::services::ServiceInput;

#[derive(Debug, Deserialize)]
pub struct ServicePayload {
    pub name: String,
    pub unit: String,
    pub price: f64,
    pub description: Option<String>,
    pub status: Option<ServiceStatus>,
}

impl ServicePayload {
    fn validate(&self) -> Result<ServiceInput, ApiError> {
        if self.name.trim().is_empty() || self.unit.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Service name and unit are required".to_string(),
            ));
        }
        if self.price < 0.0 {
            return Err(ApiError::BadRequest("Price must be non-negative".to_string()));
        }

        Ok(ServiceInput {
            name: self.name.trim().to_string(),
            unit: self.unit.trim().to_string(),
            price: self.price,
            description: self.description.clone(),
            status: self.status.unwrap_or(ServiceStatus::Active),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ServiceListQuery {
    pub status: Option<ServiceStatus>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/services
pub async fn list_services(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ServiceListQuery>,
) -> Result<Json<Paged<Service>>, ApiError> {
    require(&claims, Permission::ServiceRead)?;

    let (skip, limit) = PageParams {
        skip: params.skip,
        limit: params.limit,
    }
    .resolve(20, 200);
    let total = state.db.count_services(params.status)?;
    let items = state.db.list_services(params.status, skip, limit)?;

    Ok(Json(Paged {
        total,
        skip,
        limit,
        items,
    }))
}

/// GET /api/services/:id
pub async fn get_service(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<Service>, ApiError> {
    require(&claims, Permission::ServiceRead)?;

    state
        .db
        .get_service(id)?
        .map(Json)
        .ok_or(ApiError::NotFound("Service not found"))
}

/// POST /api/services (Manager, Receptionist)
pub async fn create_service(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ServicePayload>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    require(&claims, Permission::ServiceWrite)?;
    let input = payload.validate()?;

    let created = state.db.create_service(&input, actor_id(&claims)?)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/services/:id (Manager, Receptionist)
pub async fn update_service(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<ServicePayload>,
) -> Result<Json<Service>, ApiError> {
    require(&claims, Permission::ServiceWrite)?;
    let input = payload.validate()?;

    state
        .db
        .update_service(id, &input, actor_id(&claims)?)?
        .map(Json)
        .ok_or(ApiError::NotFound("Service not found"))
}

#[derive(Debug, Deserialize)]
pub struct ChangePricePayload {
    pub price: f64,
}

/// PATCH /api/services/:id/change-price (Manager)
pub async fn change_service_price(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<ChangePricePayload>,
) -> Result<Json<Service>, ApiError> {
    require(&claims, Permission::ServicePriceChange)?;

    if payload.price < 0.0 {
        return Err(ApiError::BadRequest("Price must be non-negative".to_string()));
    }

    state
        .db
        .change_service_price(id, payload.price, actor_id(&claims)?)?
        .map(Json)
        .ok_or(ApiError::NotFound("Service not found"))
}

/// DELETE /api/services/:id (Manager)
pub async fn delete_service(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require(&claims, Permission::ServiceDelete)?;

    if state.db.count_details_for_service(id)? > 0 {
        return Err(ApiError::Conflict(
            "Service is still referenced by booking details",
        ));
    }

    if !state.db.delete_service(id)? {
        return Err(ApiError::NotFound("Service not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
