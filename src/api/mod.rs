//! HTTP API layer: routers, shared state and error mapping.

pub mod bookings;
pub mod guests;
pub mod reports;
pub mod room_types;
pub mod rooms;
pub mod services;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::auth::{
    api as auth_api,
    auth_middleware,
    models::Claims,
    rbac::{self, Permission},
    AuthState, JwtHandler,
};
use crate::middleware::rate_limit::{login_rate_limit, LoginRateLimiter, RateLimitConfig};
use crate::store::Db;

/// Shared application state for the hotel endpoints.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
}

/// Assemble the full application router: public health check, throttled
/// credential endpoints, and the JWT-guarded API surface.
pub fn create_router(
    db: Db,
    auth_state: AuthState,
    jwt_handler: Arc<JwtHandler>,
    rate_limit: RateLimitConfig,
) -> Router {
    let app_state = AppState { db };
    let limiter = LoginRateLimiter::new(rate_limit);

    let public_routes = Router::new().route("/health", get(health_check));

    // Credential endpoints sit behind the per-IP throttle.
    let credential_routes = Router::new()
        .route("/api/auth/register", post(auth_api::register))
        .route("/api/auth/login", post(auth_api::login))
        .route_layer(middleware::from_fn_with_state(limiter, login_rate_limit))
        .with_state(auth_state.clone());

    let user_routes = Router::new()
        .route("/api/auth/me", get(auth_api::me))
        .route(
            "/api/users",
            get(auth_api::list_users).post(auth_api::create_user),
        )
        .route(
            "/api/users/:id",
            get(auth_api::get_user)
                .put(auth_api::update_user)
                .delete(auth_api::deactivate_user),
        )
        .route("/api/users/:id/password", patch(auth_api::change_password))
        .route_layer(middleware::from_fn_with_state(
            jwt_handler.clone(),
            auth_middleware,
        ))
        .with_state(auth_state);

    let hotel_routes = Router::new()
        .route(
            "/api/room-types",
            get(room_types::list_room_types).post(room_types::create_room_type),
        )
        .route(
            "/api/room-types/:id",
            get(room_types::get_room_type)
                .put(room_types::update_room_type)
                .delete(room_types::delete_room_type),
        )
        .route("/api/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route("/api/rooms/available", get(rooms::list_available_rooms))
        .route(
            "/api/rooms/:id",
            get(rooms::get_room)
                .put(rooms::update_room)
                .delete(rooms::delete_room),
        )
        .route("/api/rooms/:id/status", patch(rooms::update_room_status))
        .route(
            "/api/rooms/:id/housekeeping",
            patch(rooms::update_room_housekeeping),
        )
        .route("/api/guests", get(guests::list_guests).post(guests::create_guest))
        .route("/api/guests/search/name", get(guests::search_by_name))
        .route("/api/guests/search/phone", get(guests::search_by_phone))
        .route(
            "/api/guests/:id",
            get(guests::get_guest).put(guests::update_guest),
        )
        .route(
            "/api/services",
            get(services::list_services).post(services::create_service),
        )
        .route(
            "/api/services/:id",
            get(services::get_service)
                .put(services::update_service)
                .delete(services::delete_service),
        )
        .route(
            "/api/services/:id/change-price",
            patch(services::change_service_price),
        )
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/bookings/today", get(bookings::list_today_bookings))
        .route("/api/bookings/histories", get(bookings::list_booking_histories))
        .route(
            "/api/bookings/:id",
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .delete(bookings::delete_booking),
        )
        .route("/api/bookings/:id/checkin", put(bookings::checkin_booking))
        .route("/api/bookings/:id/checkout", put(bookings::checkout_booking))
        .route("/api/bookings/:id/cancel", put(bookings::cancel_booking))
        .route("/api/bookings/:id/no-show", put(bookings::no_show_booking))
        .route(
            "/api/bookings/:id/details",
            get(bookings::list_booking_details).post(bookings::add_booking_detail),
        )
        .route(
            "/api/bookings/:id/details/:detail_id",
            axum::routing::delete(bookings::remove_booking_detail),
        )
        .route(
            "/api/bookings/:id/payments",
            get(bookings::list_booking_payments).post(bookings::add_booking_payment),
        )
        .route(
            "/api/bookings/:id/payments/:payment_id",
            axum::routing::delete(bookings::remove_booking_payment),
        )
        .route("/api/reports/summary", get(reports::summary))
        .route(
            "/api/reports/revenue-by-room-type",
            get(reports::revenue_by_room_type),
        )
        .route("/api/reports/service-revenue", get(reports::service_revenue))
        .route("/api/reports/bookings-per-day", get(reports::bookings_per_day))
        .route_layer(middleware::from_fn_with_state(jwt_handler, auth_middleware))
        .with_state(app_state);

    Router::new()
        .merge(public_routes)
        .merge(credential_routes)
        .merge(user_routes)
        .merge(hotel_routes)
        .layer(middleware::from_fn(crate::middleware::request_logging))
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Common paging query parameters.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Clamp to sane bounds; over-large limits are capped, not rejected.
    pub fn resolve(&self, default_limit: i64, max_limit: i64) -> (i64, i64) {
        let skip = self.skip.unwrap_or(0).max(0);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, max_limit);
        (skip, limit)
    }
}

/// Paged listing envelope.
#[derive(Debug, Serialize)]
pub struct Paged<T> {
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
    pub items: Vec<T>,
}

// ===== Error Handling =====

#[derive(Debug)]
pub enum ApiError {
    Database(anyhow::Error),
    NotFound(&'static str),
    BadRequest(String),
    Conflict(&'static str),
    Forbidden,
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Database(err)
    }
}

impl From<rbac::Forbidden> for ApiError {
    fn from(_: rbac::Forbidden) -> Self {
        ApiError::Forbidden
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, (*msg).to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, (*msg).to_string()),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Insufficient permissions".to_string(),
            ),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Gate a handler on the static permission table.
pub(crate) fn require(claims: &Claims, permission: Permission) -> Result<(), ApiError> {
    rbac::authorize(claims.role, permission)?;
    Ok(())
}

/// The acting user's id, for audit columns.
pub(crate) fn actor_id(claims: &Claims) -> Result<i64, ApiError> {
    claims.sub.parse().map_err(|_| ApiError::Forbidden)
}
