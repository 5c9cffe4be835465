//! Guest endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use super::{actor_id, require, ApiError, AppState, PageParams, Paged};
use crate::auth::{models::Claims, Permission};
use crate::models::{Gender, Guest};
use crate::store::guests::{GuestFilters, GuestInput};

#[derive(Debug, Deserialize)]
pub struct GuestPayload {
    pub name: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<String>,
    pub nationality: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

impl GuestPayload {
    fn validate(&self) -> Result<GuestInput, ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::BadRequest("Guest name is required".to_string()));
        }
        if let Some(email) = self.email.as_deref() {
            if !email.contains('@') {
                return Err(ApiError::BadRequest("Invalid email address".to_string()));
            }
        }

        Ok(GuestInput {
            name: self.name.trim().to_string(),
            gender: self.gender,
            date_of_birth: self.date_of_birth.clone(),
            nationality: self.nationality.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
            description: self.description.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct GuestListQuery {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub nationality: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/guests
pub async fn list_guests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<GuestListQuery>,
) -> Result<Json<Paged<Guest>>, ApiError> {
    require(&claims, Permission::GuestRead)?;

    let filters = GuestFilters {
        name: params.name,
        phone: params.phone,
        nationality: params.nationality,
    };
    let (skip, limit) = PageParams {
        skip: params.skip,
        limit: params.limit,
    }
    .resolve(20, 200);

    let total = state.db.count_guests(&filters)?;
    let items = state.db.list_guests(&filters, skip, limit)?;

    Ok(Json(Paged {
        total,
        skip,
        limit,
        items,
    }))
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

/// GET /api/guests/search/name
pub async fn search_by_name(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<NameQuery>,
) -> Result<Json<Vec<Guest>>, ApiError> {
    require(&claims, Permission::GuestRead)?;
    Ok(Json(state.db.search_guests_by_name(&params.name)?))
}

#[derive(Debug, Deserialize)]
pub struct PhoneQuery {
    pub phone: String,
}

/// GET /api/guests/search/phone
pub async fn search_by_phone(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PhoneQuery>,
) -> Result<Json<Vec<Guest>>, ApiError> {
    require(&claims, Permission::GuestRead)?;
    Ok(Json(state.db.search_guests_by_phone(&params.phone)?))
}

/// GET /api/guests/:id
pub async fn get_guest(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<Guest>, ApiError> {
    require(&claims, Permission::GuestRead)?;

    state
        .db
        .get_guest(id)?
        .map(Json)
        .ok_or(ApiError::NotFound("Guest not found"))
}

/// POST /api/guests (Manager, Receptionist)
pub async fn create_guest(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<GuestPayload>,
) -> Result<(StatusCode, Json<Guest>), ApiError> {
    require(&claims, Permission::GuestWrite)?;
    let input = payload.validate()?;

    let created = state.db.create_guest(&input, actor_id(&claims)?)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/guests/:id (Manager, Receptionist)
pub async fn update_guest(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<GuestPayload>,
) -> Result<Json<Guest>, ApiError> {
    require(&claims, Permission::GuestWrite)?;
    let input = payload.validate()?;

    state
        .db
        .update_guest(id, &input, actor_id(&claims)?)?
        .map(Json)
        .ok_or(ApiError::NotFound("Guest not found"))
}
