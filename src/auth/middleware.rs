//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation

use crate::auth::jwt::{JwtHandler, TokenError};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Auth middleware that validates bearer tokens and stores the verified
/// claims in request extensions for the handlers downstream.
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.to_string())
        .ok_or(AuthError::MissingToken)?;

    // Expired and invalid tokens are reported distinctly so clients know
    // whether re-login will help.
    let claims = jwt_handler.verify_token(&token).map_err(|e| match e {
        TokenError::Expired => AuthError::TokenExpired,
        TokenError::Invalid => AuthError::TokenInvalid,
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Auth middleware error types
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    TokenExpired,
    TokenInvalid,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "missing_token",
                "Missing authorization token. Use: Bearer {token}",
            ),
            AuthError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "token_expired",
                "Token has expired, please log in again",
            ),
            AuthError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "token_invalid",
                "Invalid authorization token",
            ),
        };

        let body = Json(json!({
            "error": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_responses() {
        let missing = AuthError::MissingToken.into_response();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let expired = AuthError::TokenExpired.into_response();
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);

        let invalid = AuthError::TokenInvalid.into_response();
        assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
    }
}
