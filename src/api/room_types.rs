//! Room type endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use super::{actor_id, require, ApiError, AppState};
use crate::auth::{models::Claims, Permission};
use crate::models::RoomType;
use crate::store::room_types::RoomTypeInput;

#[derive(Debug, Deserialize)]
pub struct RoomTypePayload {
    pub code: String,
    pub name: String,
    pub base_occupancy: i64,
    pub max_occupancy: i64,
    pub base_rate: f64,
    pub hour_rate: f64,
    #[serde(default)]
    pub extra_adult_fee: f64,
    #[serde(default)]
    pub extra_child_fee: f64,
    pub description: Option<String>,
}

impl RoomTypePayload {
    fn validate(&self) -> Result<RoomTypeInput, ApiError> {
        if self.code.trim().is_empty() || self.name.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Room type code and name are required".to_string(),
            ));
        }
        if self.base_occupancy < 1 || self.max_occupancy < self.base_occupancy {
            return Err(ApiError::BadRequest(
                "Occupancy bounds are invalid".to_string(),
            ));
        }
        if self.base_rate < 0.0 || self.hour_rate < 0.0 {
            return Err(ApiError::BadRequest("Rates must be non-negative".to_string()));
        }

        Ok(RoomTypeInput {
            code: self.code.trim().to_string(),
            name: self.name.trim().to_string(),
            base_occupancy: self.base_occupancy,
            max_occupancy: self.max_occupancy,
            base_rate: self.base_rate,
            hour_rate: self.hour_rate,
            extra_adult_fee: self.extra_adult_fee,
            extra_child_fee: self.extra_child_fee,
            description: self.description.clone(),
        })
    }
}

/// GET /api/room-types
pub async fn list_room_types(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<RoomType>>, ApiError> {
    require(&claims, Permission::RoomTypeRead)?;
    Ok(Json(state.db.list_room_types()?))
}

/// GET /api/room-types/:id
pub async fn get_room_type(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<RoomType>, ApiError> {
    require(&claims, Permission::RoomTypeRead)?;

    state
        .db
        .get_room_type(id)?
        .map(Json)
        .ok_or(ApiError::NotFound("Room type not found"))
}

/// POST /api/room-types (Manager)
pub async fn create_room_type(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RoomTypePayload>,
) -> Result<(StatusCode, Json<RoomType>), ApiError> {
    require(&claims, Permission::RoomTypeWrite)?;
    let input = payload.validate()?;

    if state.db.get_room_type_by_code(&input.code)?.is_some() {
        return Err(ApiError::Conflict("Room type code already exists"));
    }

    let created = state.db.create_room_type(&input, actor_id(&claims)?)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/room-types/:id (Manager)
pub async fn update_room_type(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<RoomTypePayload>,
) -> Result<Json<RoomType>, ApiError> {
    require(&claims, Permission::RoomTypeWrite)?;
    let input = payload.validate()?;

    if let Some(existing) = state.db.get_room_type_by_code(&input.code)? {
        if existing.id != id {
            return Err(ApiError::Conflict("Room type code already exists"));
        }
    }

    state
        .db
        .update_room_type(id, &input, actor_id(&claims)?)?
        .map(Json)
        .ok_or(ApiError::NotFound("Room type not found"))
}

/// DELETE /api/room-types/:id (Manager)
pub async fn delete_room_type(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require(&claims, Permission::RoomTypeWrite)?;

    if state.db.count_rooms_of_type(id)? > 0 {
        return Err(ApiError::Conflict(
            "Room type is still referenced by rooms",
        ));
    }
    if state.db.count_bookings_for_room_type(id)? > 0 {
        return Err(ApiError::Conflict(
            "Room type is still referenced by bookings",
        ));
    }

    if !state.db.delete_room_type(id)? {
        return Err(ApiError::NotFound("Room type not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
