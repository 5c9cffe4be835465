//! Authentication Models
//! Mission: Define user, role and token data structures

use serde::{Deserialize, Serialize};

/// Staff account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub role: Role,
    pub status: UserStatus,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub created_by: Option<i64>,
    pub updated_at: Option<String>,
    pub updated_by: Option<i64>,
}

/// Staff roles for RBAC
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Manager,      // Full access to all endpoints
    Receptionist, // Front-desk operations: guests, bookings, payments
    Housekeeping, // Room housekeeping status only
    Accountant,   // Revenue reports
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Manager => "Manager",
            Role::Receptionist => "Receptionist",
            Role::Housekeeping => "Housekeeping",
            Role::Accountant => "Accountant",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Manager" => Some(Role::Manager),
            "Receptionist" => Some(Role::Receptionist),
            "Housekeeping" => Some(Role::Housekeeping),
            "Accountant" => Some(Role::Accountant),
            _ => None,
        }
    }
}

/// Accounts are deactivated, never deleted, so audit references stay intact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Locked,
}

impl UserStatus {
    pub fn as_str(&self) -> &str {
        match self {
            UserStatus::Active => "Active",
            UserStatus::Locked => "Locked",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Active" => Some(UserStatus::Active),
            "Locked" => Some(UserStatus::Locked),
            _ => None,
        }
    }
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (user id)
    pub username: String,
    pub role: Role,
    pub iat: usize, // issued-at timestamp
    pub exp: usize, // expiration timestamp
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Bootstrap registration request (only honored while no users exist)
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64, // seconds until expiration
    pub user: UserResponse,
}

/// User response (sanitized)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub status: UserStatus,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            status: user.status,
            last_login_at: user.last_login_at.clone(),
            created_at: user.created_at.clone(),
            updated_at: user.updated_at.clone(),
        }
    }
}

/// User creation request (Manager only)
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Partial user update (Manager only)
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
}

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let username = username.trim();
    if username.len() < 3 || username.len() > 100 {
        return Err("Username must be between 3 and 100 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
    {
        return Err("Username may only contain letters, digits, '.', '_' and '-'");
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 6 || password.len() > 100 {
        return Err("Password must be between 6 and 100 characters");
    }
    Ok(())
}

/// Validate registration input before any hashing work is done.
pub fn validate_credentials(username: &str, password: &str) -> Result<(), &'static str> {
    validate_username(username)?;
    validate_password(password)
}
