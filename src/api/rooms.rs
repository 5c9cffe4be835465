//! Room endpoints: inventory, status patches and availability search.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{actor_id, require, ApiError, AppState, PageParams, Paged};
use crate::auth::{models::Claims, Permission};
use crate::models::{AvailableRoom, HousekeepingStatus, Room, RoomStatus};
use crate::store::rooms::{AvailabilityQuery, RoomFilters, RoomInput};

#[derive(Debug, Deserialize)]
pub struct RoomPayload {
    pub name: String,
    pub room_type_id: i64,
    pub description: Option<String>,
}

impl RoomPayload {
    fn validate(&self) -> Result<RoomInput, ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::BadRequest("Room name is required".to_string()));
        }
        Ok(RoomInput {
            name: self.name.trim().to_string(),
            room_type_id: self.room_type_id,
            description: self.description.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RoomListQuery {
    pub name: Option<String>,
    pub room_type_id: Option<i64>,
    pub status: Option<RoomStatus>,
    pub housekeeping_status: Option<HousekeepingStatus>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/rooms
pub async fn list_rooms(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<RoomListQuery>,
) -> Result<Json<Paged<Room>>, ApiError> {
    require(&claims, Permission::RoomRead)?;

    let filters = RoomFilters {
        name: params.name,
        room_type_id: params.room_type_id,
        status: params.status,
        housekeeping_status: params.housekeeping_status,
    };
    let (skip, limit) = PageParams {
        skip: params.skip,
        limit: params.limit,
    }
    .resolve(20, 200);

    let total = state.db.count_rooms(&filters)?;
    let items = state.db.list_rooms(&filters, skip, limit)?;

    Ok(Json(Paged {
        total,
        skip,
        limit,
        items,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub room_id: Option<i64>,
    pub room_type_id: Option<i64>,
    pub occupancy: Option<i64>,
    pub min_base_rate: Option<f64>,
    pub max_base_rate: Option<f64>,
}

/// GET /api/rooms/available
pub async fn list_available_rooms(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<Vec<AvailableRoom>>, ApiError> {
    require(&claims, Permission::RoomRead)?;

    if let (Some(from), Some(to)) = (params.from_date, params.to_date) {
        if from >= to {
            return Err(ApiError::BadRequest(
                "from_date must be before to_date".to_string(),
            ));
        }
    }

    let query = AvailabilityQuery {
        from: params.from_date,
        to: params.to_date,
        room_id: params.room_id,
        room_type_id: params.room_type_id,
        occupancy: params.occupancy,
        min_base_rate: params.min_base_rate,
        max_base_rate: params.max_base_rate,
    };

    Ok(Json(state.db.available_rooms(&query)?))
}

/// GET /api/rooms/:id
pub async fn get_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<Room>, ApiError> {
    require(&claims, Permission::RoomRead)?;

    state
        .db
        .get_room(id)?
        .map(Json)
        .ok_or(ApiError::NotFound("Room not found"))
}

/// POST /api/rooms (Manager)
pub async fn create_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RoomPayload>,
) -> Result<(StatusCode, Json<Room>), ApiError> {
    require(&claims, Permission::RoomWrite)?;
    let input = payload.validate()?;

    if state.db.get_room_type(input.room_type_id)?.is_none() {
        return Err(ApiError::BadRequest("Unknown room type".to_string()));
    }
    if state.db.get_room_by_name(&input.name)?.is_some() {
        return Err(ApiError::Conflict("Room name already exists"));
    }

    let created = state.db.create_room(&input, actor_id(&claims)?)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/rooms/:id (Manager)
pub async fn update_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<RoomPayload>,
) -> Result<Json<Room>, ApiError> {
    require(&claims, Permission::RoomWrite)?;
    let input = payload.validate()?;

    if state.db.get_room_type(input.room_type_id)?.is_none() {
        return Err(ApiError::BadRequest("Unknown room type".to_string()));
    }
    if let Some(existing) = state.db.get_room_by_name(&input.name)? {
        if existing.id != id {
            return Err(ApiError::Conflict("Room name already exists"));
        }
    }

    state
        .db
        .update_room(id, &input, actor_id(&claims)?)?
        .map(Json)
        .ok_or(ApiError::NotFound("Room not found"))
}

/// DELETE /api/rooms/:id (Manager)
pub async fn delete_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require(&claims, Permission::RoomWrite)?;

    if state.db.count_bookings_for_room(id)? > 0 {
        return Err(ApiError::Conflict("Room is still referenced by bookings"));
    }

    if !state.db.delete_room(id)? {
        return Err(ApiError::NotFound("Room not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct RoomStatusPayload {
    pub status: RoomStatus,
}

/// PATCH /api/rooms/:id/status (Manager, Receptionist)
pub async fn update_room_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<RoomStatusPayload>,
) -> Result<Json<Room>, ApiError> {
    require(&claims, Permission::RoomStatusUpdate)?;

    state
        .db
        .set_room_status(id, payload.status, actor_id(&claims)?)?
        .map(Json)
        .ok_or(ApiError::NotFound("Room not found"))
}

#[derive(Debug, Deserialize)]
pub struct HousekeepingPayload {
    pub housekeeping_status: HousekeepingStatus,
}

/// PATCH /api/rooms/:id/housekeeping (Manager, Receptionist, Housekeeping)
pub async fn update_room_housekeeping(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<HousekeepingPayload>,
) -> Result<Json<Room>, ApiError> {
    require(&claims, Permission::RoomHousekeepingUpdate)?;

    state
        .db
        .set_housekeeping_status(id, payload.housekeeping_status, actor_id(&claims)?)?
        .map(Json)
        .ok_or(ApiError::NotFound("Room not found"))
}
