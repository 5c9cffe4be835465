//! Booking endpoints: reservations, the stay lifecycle, folio details
//! and payments.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use super::{actor_id, require, ApiError, AppState, PageParams, Paged};
use crate::auth::{models::Claims, Permission};
use crate::models::{
    Booking, BookingDetail, BookingHistoryEntry, BookingStatus, ChargeType, DetailType, Payment,
    PaymentMethod, TodayBooking,
};
use crate::store::bookings::{BookingInput, DetailInput, HistoryFilters, PaymentInput};

#[derive(Debug, Deserialize)]
pub struct BookingPayload {
    pub charge_type: ChargeType,
    pub checkin: DateTime<Utc>,
    pub checkout: Option<DateTime<Utc>>,
    pub room_id: i64,
    pub room_type_id: i64,
    pub primary_guest_id: i64,
    pub num_adults: i64,
    pub num_children: i64,
    pub notes: Option<String>,
}

/// Shared validation for create and update. `existing` is the booking
/// being edited, if any; its own room hold is ignored in the overlap
/// check and its unchanged checkin may stay in the past.
fn validate_booking(
    state: &AppState,
    payload: &BookingPayload,
    existing: Option<&Booking>,
) -> Result<BookingInput, ApiError> {
    if state.db.get_room(payload.room_id)?.is_none() {
        return Err(ApiError::BadRequest("Unknown room".to_string()));
    }

    let Some(room_type) = state.db.get_room_type(payload.room_type_id)? else {
        return Err(ApiError::BadRequest("Unknown room type".to_string()));
    };

    if state.db.get_guest(payload.primary_guest_id)?.is_none() {
        return Err(ApiError::BadRequest("Unknown primary guest".to_string()));
    }

    let checkin_unchanged = existing.is_some_and(|b| b.checkin == payload.checkin);
    if !checkin_unchanged && payload.checkin < Utc::now() {
        return Err(ApiError::BadRequest(
            "Checkin must not be in the past".to_string(),
        ));
    }

    if let Some(checkout) = payload.checkout {
        if payload.checkin >= checkout {
            return Err(ApiError::BadRequest(
                "Checkout must be after checkin".to_string(),
            ));
        }
    }

    if payload.num_adults < 0 || payload.num_children < 0 {
        return Err(ApiError::BadRequest(
            "Guest counts must be non-negative".to_string(),
        ));
    }
    let total_guests = payload.num_adults + payload.num_children;
    if total_guests == 0 {
        return Err(ApiError::BadRequest(
            "At least one guest is required".to_string(),
        ));
    }
    if total_guests > room_type.max_occupancy {
        return Err(ApiError::BadRequest(format!(
            "Total guests ({}) exceed the room type's maximum occupancy ({})",
            total_guests, room_type.max_occupancy
        )));
    }

    let window_changed = existing.is_none_or(|b| {
        b.room_id != payload.room_id
            || b.checkin != payload.checkin
            || b.checkout != payload.checkout
    });
    if window_changed
        && state.db.is_room_booked(
            payload.room_id,
            payload.checkin,
            payload.checkout,
            existing.map(|b| b.id),
        )?
    {
        return Err(ApiError::Conflict("Room is already booked for this window"));
    }

    Ok(BookingInput {
        charge_type: payload.charge_type,
        checkin: payload.checkin,
        checkout: payload.checkout,
        room_id: payload.room_id,
        room_type_id: payload.room_type_id,
        primary_guest_id: payload.primary_guest_id,
        num_adults: payload.num_adults,
        num_children: payload.num_children,
        notes: payload.notes.clone(),
    })
}

fn fetch_booking(state: &AppState, id: i64) -> Result<Booking, ApiError> {
    state
        .db
        .get_booking(id)?
        .ok_or(ApiError::NotFound("Booking not found"))
}

fn fetch_open_booking(state: &AppState, id: i64) -> Result<Booking, ApiError> {
    let booking = fetch_booking(state, id)?;
    if !booking.status.is_open() {
        return Err(ApiError::BadRequest(
            "Only reserved or checked-in bookings can be modified".to_string(),
        ));
    }
    Ok(booking)
}

/// GET /api/bookings/today
pub async fn list_today_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(page): Query<PageParams>,
) -> Result<Json<Paged<TodayBooking>>, ApiError> {
    require(&claims, Permission::BookingRead)?;

    let (skip, limit) = page.resolve(100, 500);
    let total = state.db.count_today_bookings()?;
    let items = state.db.today_bookings(skip, limit)?;

    Ok(Json(Paged {
        total,
        skip,
        limit,
        items,
    }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub booking_no: Option<String>,
    pub guest_name: Option<String>,
    pub room_id: Option<i64>,
    pub status: Option<BookingStatus>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/bookings/histories
pub async fn list_booking_histories(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Paged<BookingHistoryEntry>>, ApiError> {
    require(&claims, Permission::BookingRead)?;

    let filters = HistoryFilters {
        booking_no: params.booking_no,
        guest_name: params.guest_name,
        room_id: params.room_id,
        status: params.status,
        from: params.from_date,
        to: params.to_date,
    };
    let (skip, limit) = PageParams {
        skip: params.skip,
        limit: params.limit,
    }
    .resolve(20, 200);

    let total = state.db.count_booking_histories(&filters)?;
    let items = state.db.booking_histories(&filters, skip, limit)?;

    Ok(Json(Paged {
        total,
        skip,
        limit,
        items,
    }))
}

/// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, ApiError> {
    require(&claims, Permission::BookingRead)?;
    fetch_booking(&state, id).map(Json)
}

/// POST /api/bookings (Manager, Receptionist)
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BookingPayload>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    require(&claims, Permission::BookingWrite)?;

    let input = validate_booking(&state, &payload, None)?;
    let created = state.db.create_booking(&input, actor_id(&claims)?)?;

    info!(
        "🛎️  Booking {} created for room {}",
        created.booking_no, created.room_id
    );

    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/bookings/:id (Manager, Receptionist)
pub async fn update_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<BookingPayload>,
) -> Result<Json<Booking>, ApiError> {
    require(&claims, Permission::BookingWrite)?;

    let existing = fetch_open_booking(&state, id)?;
    let input = validate_booking(&state, &payload, Some(&existing))?;

    state
        .db
        .update_booking(id, &input, actor_id(&claims)?)?
        .map(Json)
        .ok_or(ApiError::NotFound("Booking not found"))
}

/// PUT /api/bookings/:id/checkin (Manager, Receptionist)
pub async fn checkin_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, ApiError> {
    require(&claims, Permission::BookingWrite)?;

    let booking = fetch_booking(&state, id)?;
    if !booking.status.is_open() {
        return Err(ApiError::BadRequest(
            "Only reserved bookings can be checked in".to_string(),
        ));
    }

    state
        .db
        .checkin_booking(id, actor_id(&claims)?)?
        .map(Json)
        .ok_or(ApiError::NotFound("Booking not found"))
}

/// PUT /api/bookings/:id/checkout (Manager, Receptionist)
pub async fn checkout_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, ApiError> {
    require(&claims, Permission::BookingWrite)?;

    let booking = fetch_booking(&state, id)?;
    if booking.status != BookingStatus::CheckedIn {
        return Err(ApiError::BadRequest(
            "Only checked-in bookings can be checked out".to_string(),
        ));
    }

    let done = state
        .db
        .checkout_booking(id, actor_id(&claims)?)?
        .ok_or(ApiError::NotFound("Booking not found"))?;

    info!("🧾 Booking {} checked out", done.booking_no);

    Ok(Json(done))
}

/// PUT /api/bookings/:id/cancel (Manager, Receptionist)
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, ApiError> {
    require(&claims, Permission::BookingWrite)?;

    fetch_open_booking(&state, id)?;

    state
        .db
        .set_booking_status(id, BookingStatus::Cancelled, actor_id(&claims)?)?
        .map(Json)
        .ok_or(ApiError::NotFound("Booking not found"))
}

/// PUT /api/bookings/:id/no-show (Manager, Receptionist)
pub async fn no_show_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, ApiError> {
    require(&claims, Permission::BookingWrite)?;

    fetch_open_booking(&state, id)?;

    state
        .db
        .set_booking_status(id, BookingStatus::NoShow, actor_id(&claims)?)?
        .map(Json)
        .ok_or(ApiError::NotFound("Booking not found"))
}

/// DELETE /api/bookings/:id (Manager)
pub async fn delete_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require(&claims, Permission::BookingDelete)?;

    fetch_booking(&state, id)?;
    if state.db.count_payments_for_booking(id)? > 0 {
        return Err(ApiError::Conflict(
            "Booking has recorded payments and cannot be deleted",
        ));
    }

    if !state.db.delete_booking(id)? {
        return Err(ApiError::NotFound("Booking not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ===== Folio details =====

#[derive(Debug, Deserialize)]
pub struct DetailPayload {
    pub detail_type: DetailType,
    pub service_id: Option<i64>,
    pub description: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub discount_amount: f64,
}

fn default_quantity() -> f64 {
    1.0
}

/// GET /api/bookings/:id/details
pub async fn list_booking_details(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<BookingDetail>>, ApiError> {
    require(&claims, Permission::BookingRead)?;

    fetch_booking(&state, id)?;
    Ok(Json(state.db.list_booking_details(id)?))
}

/// POST /api/bookings/:id/details (Manager, Receptionist)
pub async fn add_booking_detail(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<DetailPayload>,
) -> Result<(StatusCode, Json<BookingDetail>), ApiError> {
    require(&claims, Permission::BookingWrite)?;

    fetch_open_booking(&state, id)?;

    if payload.quantity <= 0.0 {
        return Err(ApiError::BadRequest("Quantity must be positive".to_string()));
    }

    let service_id = match payload.detail_type {
        DetailType::Service => {
            let Some(service_id) = payload.service_id else {
                return Err(ApiError::BadRequest(
                    "Service lines must reference a service".to_string(),
                ));
            };
            if state.db.get_service(service_id)?.is_none() {
                return Err(ApiError::BadRequest("Unknown service".to_string()));
            }
            Some(service_id)
        }
        _ => None,
    };

    let input = DetailInput {
        detail_type: payload.detail_type,
        service_id,
        description: payload.description.clone(),
        quantity: payload.quantity,
        unit_price: payload.unit_price,
        discount_amount: payload.discount_amount,
    };

    let created = state.db.add_booking_detail(id, &input, actor_id(&claims)?)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/bookings/:id/details/:detail_id (Manager, Receptionist)
pub async fn remove_booking_detail(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((id, detail_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    require(&claims, Permission::BookingWrite)?;

    fetch_open_booking(&state, id)?;

    if !state.db.delete_booking_detail(id, detail_id)? {
        return Err(ApiError::NotFound("Booking detail not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ===== Payments =====

#[derive(Debug, Deserialize)]
pub struct PaymentPayload {
    pub payment_method: PaymentMethod,
    pub reference_no: Option<String>,
    pub amount: f64,
    pub payer_name: Option<String>,
    pub notes: Option<String>,
}

/// GET /api/bookings/:id/payments
pub async fn list_booking_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    require(&claims, Permission::BookingRead)?;

    fetch_booking(&state, id)?;
    Ok(Json(state.db.list_payments(id)?))
}

/// POST /api/bookings/:id/payments (Manager, Receptionist)
pub async fn add_booking_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentPayload>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    require(&claims, Permission::BookingWrite)?;

    fetch_open_booking(&state, id)?;

    if payload.amount <= 0.0 {
        return Err(ApiError::BadRequest(
            "Payment amount must be positive".to_string(),
        ));
    }

    let input = PaymentInput {
        payment_method: payload.payment_method,
        reference_no: payload.reference_no.clone(),
        amount: payload.amount,
        payer_name: payload.payer_name.clone(),
        notes: payload.notes.clone(),
    };

    let created = state.db.add_payment(id, &input, actor_id(&claims)?)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/bookings/:id/payments/:payment_id (Manager)
pub async fn remove_booking_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((id, payment_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    require(&claims, Permission::PaymentDelete)?;

    fetch_open_booking(&state, id)?;

    if !state.db.delete_payment(id, payment_id)? {
        return Err(ApiError::NotFound("Payment not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
