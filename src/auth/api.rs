//! Authentication API Endpoints
//! Mission: Provide login, bootstrap registration and user management

use crate::auth::{
    jwt::JwtHandler,
    models::{
        validate_credentials, validate_password, validate_username, ChangePasswordRequest, Claims,
        CreateUserRequest, LoginRequest, LoginResponse, RegisterRequest, Role, UpdateUserRequest,
        UserResponse, UserStatus,
    },
    rbac::{authorize, Permission},
    user_store::UserStore,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub user_store: Arc<UserStore>,
    pub jwt_handler: Arc<JwtHandler>,
}

impl AuthState {
    pub fn new(user_store: Arc<UserStore>, jwt_handler: Arc<JwtHandler>) -> Self {
        Self {
            user_store,
            jwt_handler,
        }
    }
}

fn subject_id(claims: &Claims) -> Result<i64, AuthApiError> {
    claims.sub.parse().map_err(|_| AuthApiError::Unauthorized)
}

/// Bootstrap registration - POST /api/auth/register
///
/// Only honored while the user table is empty; afterwards accounts are
/// created by a Manager through /api/users.
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AuthApiError> {
    validate_credentials(&payload.username, &payload.password)
        .map_err(AuthApiError::InvalidInput)?;

    let count = state
        .user_store
        .count_users()
        .map_err(|_| AuthApiError::InternalError)?;
    if count > 0 {
        return Err(AuthApiError::Forbidden);
    }

    // bcrypt is CPU-bound; keep it off the serving threads.
    let store = state.user_store.clone();
    let username = payload.username.trim().to_string();
    let user = tokio::task::spawn_blocking(move || {
        store.create_user(&username, &payload.password, payload.role, None)
    })
    .await
    .map_err(|_| AuthApiError::InternalError)?
    .map_err(|e| {
        warn!("Failed to register bootstrap user: {}", e);
        AuthApiError::InternalError
    })?;

    info!("✅ Bootstrap user registered: {} ({})", user.username, user.role.as_str());

    Ok((StatusCode::CREATED, Json(UserResponse::from_user(&user))))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    let LoginRequest { username, password } = payload;
    info!("🔐 Login attempt: {}", username);

    let store = state.user_store.clone();
    let lookup = username.clone();
    let user = tokio::task::spawn_blocking(move || store.verify_login(&lookup, &password))
        .await
        .map_err(|_| AuthApiError::InternalError)?
        .map_err(|_| AuthApiError::InternalError)?;

    let Some(user) = user else {
        warn!("❌ Failed login attempt: {}", username);
        return Err(AuthApiError::InvalidCredentials);
    };

    if user.status != UserStatus::Active {
        warn!("❌ Login attempt on locked account: {}", username);
        return Err(AuthApiError::AccountLocked);
    }

    state
        .user_store
        .update_last_login(user.id)
        .map_err(|_| AuthApiError::InternalError)?;

    let (token, expires_in) = state
        .jwt_handler
        .issue_token(&user)
        .map_err(|_| AuthApiError::InternalError)?;

    info!("✅ Login successful: {} ({})", user.username, user.role.as_str());

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in,
        user: UserResponse::from_user(&user),
    }))
}

/// Get current user info - GET /api/auth/me
pub async fn me(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>, AuthApiError> {
    let user_id = subject_id(&claims)?;

    let user = state
        .user_store
        .get_by_id(user_id)
        .map_err(|_| AuthApiError::InternalError)?
        .ok_or(AuthApiError::Unauthorized)?;

    if user.status != UserStatus::Active {
        return Err(AuthApiError::AccountLocked);
    }

    Ok(Json(UserResponse::from_user(&user)))
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    /// Filter by username substring
    pub q: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// List users - GET /api/users (Manager only)
pub async fn list_users(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<UserListQuery>,
) -> Result<Json<Vec<UserResponse>>, AuthApiError> {
    authorize(claims.role, Permission::UserManage).map_err(|_| AuthApiError::Forbidden)?;

    let skip = params.skip.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(50).clamp(1, 200);

    let users = state
        .user_store
        .list_users(params.q.as_deref(), skip, limit)
        .map_err(|_| AuthApiError::InternalError)?;

    let response: Vec<UserResponse> = users.iter().map(UserResponse::from_user).collect();

    Ok(Json(response))
}

/// Get a single user - GET /api/users/:id (Manager only)
pub async fn get_user(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, AuthApiError> {
    authorize(claims.role, Permission::UserManage).map_err(|_| AuthApiError::Forbidden)?;

    let user = state
        .user_store
        .get_by_id(user_id)
        .map_err(|_| AuthApiError::InternalError)?
        .ok_or(AuthApiError::UserNotFound)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Create user - POST /api/users (Manager only)
pub async fn create_user(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AuthApiError> {
    authorize(claims.role, Permission::UserManage).map_err(|_| AuthApiError::Forbidden)?;

    validate_credentials(&payload.username, &payload.password)
        .map_err(AuthApiError::InvalidInput)?;

    let creator_id = subject_id(&claims)?;
    let username = payload.username.trim().to_string();

    if state
        .user_store
        .get_by_username(&username)
        .map_err(|_| AuthApiError::InternalError)?
        .is_some()
    {
        return Err(AuthApiError::UserAlreadyExists);
    }

    let store = state.user_store.clone();
    let user = tokio::task::spawn_blocking(move || {
        store.create_user(&username, &payload.password, payload.role, Some(creator_id))
    })
    .await
    .map_err(|_| AuthApiError::InternalError)?
    .map_err(|e| {
        warn!("Failed to create user: {}", e);
        AuthApiError::UserAlreadyExists
    })?;

    Ok((StatusCode::CREATED, Json(UserResponse::from_user(&user))))
}

/// Update user - PUT /api/users/:id (Manager only)
pub async fn update_user(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AuthApiError> {
    authorize(claims.role, Permission::UserManage).map_err(|_| AuthApiError::Forbidden)?;
    let updater_id = subject_id(&claims)?;

    if let Some(new_username) = payload.username.as_deref() {
        validate_username(new_username).map_err(AuthApiError::InvalidInput)?;

        let existing = state
            .user_store
            .get_by_username(new_username.trim())
            .map_err(|_| AuthApiError::InternalError)?;
        if existing.is_some_and(|u| u.id != user_id) {
            return Err(AuthApiError::UserAlreadyExists);
        }
    }

    let user = state
        .user_store
        .update_user(
            user_id,
            payload.username.as_deref().map(str::trim),
            payload.role,
            payload.status,
            updater_id,
        )
        .map_err(|_| AuthApiError::InternalError)?
        .ok_or(AuthApiError::UserNotFound)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Change password - PATCH /api/users/:id/password (Manager or self)
pub async fn change_password(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AuthApiError> {
    let caller_id = subject_id(&claims)?;
    if claims.role != Role::Manager && caller_id != user_id {
        return Err(AuthApiError::Forbidden);
    }

    validate_password(&payload.password).map_err(AuthApiError::InvalidInput)?;

    let store = state.user_store.clone();
    let changed =
        tokio::task::spawn_blocking(move || store.set_password(user_id, &payload.password, caller_id))
            .await
            .map_err(|_| AuthApiError::InternalError)?
            .map_err(|_| AuthApiError::InternalError)?;

    if !changed {
        return Err(AuthApiError::UserNotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Deactivate user - DELETE /api/users/:id (Manager only)
///
/// Accounts are locked, never removed, so the audit trail keeps its
/// references.
pub async fn deactivate_user(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AuthApiError> {
    authorize(claims.role, Permission::UserManage).map_err(|_| AuthApiError::Forbidden)?;

    let caller_id = subject_id(&claims)?;
    if caller_id == user_id {
        return Err(AuthApiError::CannotDeactivateSelf);
    }

    let locked = state
        .user_store
        .set_status(user_id, UserStatus::Locked, caller_id)
        .map_err(|_| AuthApiError::InternalError)?;

    if !locked {
        return Err(AuthApiError::UserNotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    InvalidInput(&'static str),
    InvalidCredentials,
    AccountLocked,
    Unauthorized,
    Forbidden,
    UserNotFound,
    UserAlreadyExists,
    CannotDeactivateSelf,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password")
            }
            AuthApiError::AccountLocked => (StatusCode::UNAUTHORIZED, "Account is locked"),
            AuthApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthApiError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions"),
            AuthApiError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AuthApiError::UserAlreadyExists => (StatusCode::CONFLICT, "Username already exists"),
            AuthApiError::CannotDeactivateSelf => {
                (StatusCode::BAD_REQUEST, "Cannot deactivate your own account")
            }
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({ "error": message }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::User;
    use chrono::Utc;

    #[test]
    fn test_user_response_from_user() {
        let user = User {
            id: 3,
            username: "frontdesk".to_string(),
            password_hash: "hash123".to_string(),
            role: Role::Receptionist,
            status: UserStatus::Active,
            last_login_at: None,
            created_at: Utc::now().to_rfc3339(),
            created_by: Some(1),
            updated_at: None,
            updated_by: None,
        };

        let response = UserResponse::from_user(&user);
        assert_eq!(response.id, 3);
        assert_eq!(response.username, "frontdesk");
        assert_eq!(response.role, Role::Receptionist);
    }

    #[test]
    fn test_auth_api_error_responses() {
        let invalid_creds = AuthApiError::InvalidCredentials.into_response();
        assert_eq!(invalid_creds.status(), StatusCode::UNAUTHORIZED);

        let forbidden = AuthApiError::Forbidden.into_response();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let not_found = AuthApiError::UserNotFound.into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let conflict = AuthApiError::UserAlreadyExists.into_response();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let bad_input = AuthApiError::InvalidInput("too short").into_response();
        assert_eq!(bad_input.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_subject_id_parses() {
        let claims = Claims {
            sub: "42".to_string(),
            username: "x".to_string(),
            role: Role::Manager,
            iat: 0,
            exp: 0,
        };
        assert_eq!(subject_id(&claims).unwrap(), 42);

        let bad = Claims {
            sub: "not-a-number".to_string(),
            username: "x".to_string(),
            role: Role::Manager,
            iat: 0,
            exp: 0,
        };
        assert!(subject_id(&bad).is_err());
    }
}
