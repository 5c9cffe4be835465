//! JWT Token Handler
//! Mission: Generate and validate JWT tokens securely

use crate::auth::models::{Claims, User};
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Why a token was rejected. Expiry is reported separately so the caller
/// can distinguish "re-login" from "reject outright".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

/// JWT Handler for token operations
pub struct JwtHandler {
    secret: String,
    ttl_minutes: i64,
}

impl JwtHandler {
    /// Create a new JWT handler with a signing secret and token lifetime.
    pub fn new(secret: String, ttl_minutes: i64) -> Self {
        Self {
            secret,
            ttl_minutes,
        }
    }

    /// Generate a signed token for a user. Returns the token and its
    /// lifetime in seconds.
    pub fn issue_token(&self, user: &User) -> Result<(String, i64)> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(chrono::Duration::minutes(self.ttl_minutes))
            .context("Invalid timestamp")?
            .timestamp() as usize;

        let expires_in = self.ttl_minutes * 60;

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp() as usize,
            exp: expiration,
        };

        debug!(
            "Issuing JWT for user {} ({}), expires in {}m",
            user.username, user.id, self.ttl_minutes
        );

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to generate JWT")?;

        Ok((token, expires_in))
    }

    /// Validate a token's signature and expiry and extract its claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        debug!("Validated JWT for user {}", decoded.claims.username);

        Ok(decoded.claims)
    }
}
